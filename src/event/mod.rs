// Event-driven decoupling between the game engine and its presentation
//
// The engine emits named events; presentation and persistence subscribe
// to the names they care about.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::{EventKind, QuizEvent};
pub use handler::{EventError, EventHandler};

// Internal modules
mod bus;
mod events;
mod handler;
