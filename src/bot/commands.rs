use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum CommandType {
    Start,
    Help,
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub command_type: CommandType,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. {}", available_commands())]
    Unknown(String),
}

/// "Available commands are: start, help, stats."
pub fn available_commands() -> String {
    let names: Vec<String> = CommandType::iter().map(|c| c.to_string()).collect();
    format!("Available commands are: {}.", names.join(", "))
}

/// Parse a chat message addressed to the bot
///
/// Returns `Ok(None)` when the message does not start with `mention`.
pub fn parse_command(content: &str, mention: &str) -> Result<Option<Command>, CommandError> {
    let Some(rest) = content.trim_start().strip_prefix(mention) else {
        return Ok(None);
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let command_type = CommandType::from_str(name).map_err(|_| CommandError::Unknown(name.to_string()))?;

    Ok(Some(Command {
        command_type,
        args: words.map(str::to_string).collect(),
    }))
}

/// Messages in parentheses are table talk, never guesses
pub fn is_chatter(content: &str) -> bool {
    let content = content.trim();
    content.starts_with('(') && content.ends_with(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MENTION: &str = "@MusicQuiz";

    #[rstest]
    #[case("@MusicQuiz start", CommandType::Start, &[])]
    #[case("@MusicQuiz   help  ", CommandType::Help, &[])]
    #[case("@MusicQuiz stats all time", CommandType::Stats, &["all", "time"])]
    #[case("  @MusicQuiz start", CommandType::Start, &[])]
    fn parses_known_commands(#[case] content: &str, #[case] expected: CommandType, #[case] args: &[&str]) {
        let command = parse_command(content, MENTION).unwrap().unwrap();
        assert_eq!(command.command_type, expected);
        assert_eq!(command.args, args.iter().map(|a| a.to_string()).collect::<Vec<_>>());
    }

    #[rstest]
    #[case("bohemian rhapsody")]
    #[case("start")]
    #[case("hey @MusicQuiz start")]
    fn ignores_messages_without_mention(#[case] content: &str) {
        assert_eq!(parse_command(content, MENTION), Ok(None));
    }

    #[rstest]
    #[case("@MusicQuiz dance", "dance")]
    #[case("@MusicQuiz START", "START")]
    #[case("@MusicQuiz", "")]
    fn rejects_unknown_commands(#[case] content: &str, #[case] name: &str) {
        assert_eq!(
            parse_command(content, MENTION),
            Err(CommandError::Unknown(name.to_string()))
        );
    }

    #[test]
    fn unknown_command_message_lists_commands() {
        let message = CommandError::Unknown("dance".to_string()).to_string();
        assert_eq!(
            message,
            "Unknown command 'dance'. Available commands are: start, help, stats."
        );
    }

    #[rstest]
    #[case("(brb)", true)]
    #[case("  (no idea) ", true)]
    #[case("queen (live)", false)]
    #[case("(queen", false)]
    fn detects_chatter(#[case] content: &str, #[case] expected: bool) {
        assert_eq!(is_chatter(content), expected);
    }
}
