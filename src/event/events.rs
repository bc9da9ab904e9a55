use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{sample::Sample, stats::GameStatistics};

/// Names subscribers register under, one per [`QuizEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    NewSample,
    CorrectGuess,
    IncorrectGuess,
    SampleTimeout,
    SampleSkipped,
    GameFinished,
}

/// Things that happened during a game
///
/// Events are facts: the engine has already applied the corresponding state
/// change when they are emitted.
#[derive(Debug, Clone)]
pub enum QuizEvent {
    /// A new round started
    NewSample {
        sample_number: usize,
        total_samples: usize,
        sample: Arc<Sample>,
    },

    /// A guess scored at least the correctness threshold and ended the round
    CorrectGuess {
        player_id: String,
        player_name: String,
        matched_title: String,
        points: u32,
        combo: u32,
        /// Multiplier the player's next correct guess would earn
        next_multiplier: u32,
        /// Score table after the points were awarded, best first
        scores: Vec<(String, u32)>,
    },

    IncorrectGuess {
        player_id: String,
        player_name: String,
        guess: String,
    },

    /// Nobody found the answer in time
    SampleTimeout { track_title: String },

    /// Enough players voted to skip
    SampleSkipped { track_title: String },

    /// The last round is over
    GameFinished {
        scores: Vec<(String, u32)>,
        statistics: GameStatistics,
    },
}

impl QuizEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            QuizEvent::NewSample { .. } => EventKind::NewSample,
            QuizEvent::CorrectGuess { .. } => EventKind::CorrectGuess,
            QuizEvent::IncorrectGuess { .. } => EventKind::IncorrectGuess,
            QuizEvent::SampleTimeout { .. } => EventKind::SampleTimeout,
            QuizEvent::SampleSkipped { .. } => EventKind::SampleSkipped,
            QuizEvent::GameFinished { .. } => EventKind::GameFinished,
        }
    }
}
