use lan_blackjack::Decision;
use std::fmt;

/// Errors that can occur while parsing player input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Not a hit or stand command.
    UnrecognizedDecision(String),
    /// Not a number, or outside the range a request can carry.
    InvalidRounds(String),
    /// Not a number, or not one of the listed choices.
    InvalidChoice(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedDecision(input) => write!(
                f,
                "Unrecognized command '{input}'. Enter 'h' to hit or 's' to stand"
            ),
            Self::InvalidRounds(input) => {
                write!(f, "Invalid round count '{input}'. Enter a number between 1 and 255")
            }
            Self::InvalidChoice(input) => write!(f, "Invalid choice '{input}'"),
        }
    }
}

impl std::error::Error for ParseError {}

/// A pick from the server menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Rescan,
    /// Zero-based index into the listed servers.
    Server(usize),
}

/// Parse a hit or stand command.
///
/// # Examples
///
/// ```
/// use bj_client::commands::parse_decision;
/// use lan_blackjack::Decision;
///
/// assert_eq!(parse_decision("h"), Ok(Decision::Hit));
/// assert_eq!(parse_decision(" Stand "), Ok(Decision::Stand));
/// assert!(parse_decision("double").is_err());
/// ```
pub fn parse_decision(input: &str) -> Result<Decision, ParseError> {
    match input.trim().to_lowercase().as_str() {
        "h" | "hit" => Ok(Decision::Hit),
        "s" | "stand" => Ok(Decision::Stand),
        _ => Err(ParseError::UnrecognizedDecision(input.trim().to_string())),
    }
}

/// Parse the number of rounds to request.
pub fn parse_rounds(input: &str) -> Result<u8, ParseError> {
    let trimmed = input.trim();
    match trimmed.parse::<u8>() {
        Ok(rounds) if rounds > 0 => Ok(rounds),
        _ => Err(ParseError::InvalidRounds(trimmed.to_string())),
    }
}

/// Parse a server menu choice. `0` asks for a rescan; `1..=count` picks a
/// server.
pub fn parse_menu_choice(input: &str, count: usize) -> Result<MenuChoice, ParseError> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(0) => Ok(MenuChoice::Rescan),
        Ok(n) if n <= count => Ok(MenuChoice::Server(n - 1)),
        _ => Err(ParseError::InvalidChoice(trimmed.to_string())),
    }
}

/// Whether the answer to a yes/no question is yes. Anything else is no.
pub fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
