pub mod actions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::author;
#[allow(unused_imports)]
pub use mocks::{sample, MockConnectionManager, ScriptedProvider};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder, CHANNEL, MENTION};
