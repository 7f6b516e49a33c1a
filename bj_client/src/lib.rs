//! Terminal player for LAN blackjack.

/// Parsing of typed player input.
pub mod commands;
/// Prompts, the table printer, and the session report.
pub mod terminal;
