// Public API
pub use announcer::ChannelAnnouncer;
pub use commands::{parse_command, Command, CommandError, CommandType};
pub use service::{render_ranking, Author, BotError, QuizBot};
pub use table::{Heading, Justify, Table};

// Internal modules
mod announcer;
mod commands;
mod service;
mod table;
