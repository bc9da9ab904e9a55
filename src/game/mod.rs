// Public API
pub use combo::Combo;
pub use countdown::{Countdown, CountdownHandle, RoundEnd};
pub use engine::{
    ranked_scores, GameEngine, GameError, GameSnapshot, GameStatus, GameSummary, GuessOutcome,
    SkipOutcome,
};
pub use round::{Round, RoundState};

// Internal modules
mod combo;
mod countdown;
mod engine;
mod round;
