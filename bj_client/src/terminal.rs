//! Line-oriented terminal front-end.
//!
//! Everything here is generic over its input and output so the prompts can
//! be driven from byte buffers in tests.

use lan_blackjack::{
    Decision, DecisionSource, EventSink, Hand, Outcome, Owner, RoundEvent, ServerMap,
    SessionStats, TurnView,
};
use log::warn;
use std::io::{self, BufRead, Write};

use crate::commands::{MenuChoice, is_yes, parse_decision, parse_menu_choice, parse_rounds};

/// Questions asked on one input, answered on one output.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `question` and reads one line. `None` means the input is
    /// closed.
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        match self.input.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line.trim().to_string())),
        }
    }

    /// Asks until a round count in `1..=255` is given.
    pub fn ask_rounds(&mut self) -> io::Result<Option<u8>> {
        loop {
            let Some(line) = self.ask("How many rounds would you like to play? (1-255): ")? else {
                return Ok(None);
            };
            match parse_rounds(&line) {
                Ok(rounds) => return Ok(Some(rounds)),
                Err(error) => writeln!(self.output, "{error}")?,
            }
        }
    }

    /// A closed input counts as no.
    pub fn ask_yes(&mut self, question: &str) -> io::Result<bool> {
        Ok(self
            .ask(&format!("{question} (y/n): "))?
            .is_some_and(|line| is_yes(&line)))
    }

    /// Lists `servers` and asks until one is picked or a rescan is asked
    /// for.
    pub fn choose_server(&mut self, servers: &ServerMap) -> io::Result<Option<MenuChoice>> {
        writeln!(self.output, "\nAvailable servers:")?;
        for (i, (name, info)) in servers.iter().enumerate() {
            writeln!(self.output, "  {}. {name} ({})", i + 1, info.socket_addr())?;
        }
        writeln!(self.output, "  0. Scan again")?;
        loop {
            let Some(line) = self.ask("Choose a server: ")? else {
                return Ok(None);
            };
            match parse_menu_choice(&line, servers.len()) {
                Ok(choice) => return Ok(Some(choice)),
                Err(error) => writeln!(self.output, "{error}")?,
            }
        }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }
}

impl<R: BufRead, W: Write> DecisionSource for Prompter<R, W> {
    /// Asks until hit or stand is entered. A closed input stands.
    fn decide(&mut self, view: &TurnView<'_>) -> Decision {
        loop {
            let question = format!(
                "Your hand: {} | Dealer shows {}. Hit or stand? (h/s): ",
                view.player, view.dealer_up
            );
            let line = match self.ask(&question) {
                Ok(Some(line)) => line,
                Ok(None) => return Decision::Stand,
                Err(error) => {
                    warn!("couldn't read a decision, standing: {error}");
                    return Decision::Stand;
                }
            };
            match parse_decision(&line) {
                Ok(decision) => return decision,
                Err(error) => {
                    if writeln!(self.output, "{error}").is_err() {
                        return Decision::Stand;
                    }
                }
            }
        }
    }
}

/// Prints the table as events come in and keeps both hands for the
/// round summary.
pub struct TablePrinter<W> {
    output: W,
    player: Hand,
    dealer: Hand,
    round: u32,
}

impl<W: Write> TablePrinter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            player: Hand::new(),
            dealer: Hand::new(),
            round: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.output
    }

    fn print(&mut self, event: RoundEvent) -> io::Result<()> {
        match event {
            RoundEvent::CardDealt { owner, card, .. } => {
                if self.player.is_empty() && self.dealer.is_empty() {
                    self.round += 1;
                    writeln!(self.output, "\n--- Round {} ---", self.round)?;
                }
                match owner {
                    Owner::Player => {
                        self.player.push(card);
                        writeln!(self.output, "You got {card}, your hand: {}", self.player)?;
                    }
                    Owner::Dealer if self.dealer.is_empty() => {
                        self.dealer.push(card);
                        writeln!(self.output, "Dealer shows {card}")?;
                    }
                    Owner::Dealer => {
                        self.dealer.push(card);
                        writeln!(self.output, "Dealer draws {card}, dealer hand: {}", self.dealer)?;
                    }
                }
            }
            RoundEvent::TurnPrompt => {}
            RoundEvent::RoundResult {
                outcome,
                player_total,
                dealer_total,
            } => {
                let headline = match outcome {
                    Outcome::Win => "You win!",
                    Outcome::Loss => "You lose.",
                    Outcome::Tie => "It's a tie.",
                };
                writeln!(
                    self.output,
                    "{headline} You {player_total}, dealer {dealer_total}"
                )?;
                self.player = Hand::new();
                self.dealer = Hand::new();
            }
        }
        Ok(())
    }
}

impl<W: Write> EventSink for TablePrinter<W> {
    fn emit(&mut self, event: RoundEvent) {
        if let Err(error) = self.print(event) {
            warn!("couldn't print table event: {error}");
        }
    }
}

/// Prints the end-of-session summary.
pub fn print_stats<W: Write>(output: &mut W, stats: &SessionStats) -> io::Result<()> {
    writeln!(output, "\n=== Session stats ===")?;
    writeln!(output, "{stats}")?;
    writeln!(
        output,
        "Longest streaks: {} wins, {} losses",
        stats.longest_win_streak, stats.longest_losing_streak
    )?;
    writeln!(
        output,
        "Naturals: {}, dealer busts: {}",
        stats.naturals, stats.dealer_busts
    )?;
    if stats.biggest_bust > 0 {
        writeln!(output, "Biggest bust: {}", stats.biggest_bust)?;
    }
    writeln!(
        output,
        "Hits: {}, stands: {}, average hand: {:.1}",
        stats.total_hits,
        stats.total_stands,
        stats.average_hand_value()
    )?;
    writeln!(
        output,
        "Finished playing {} rounds, win rate {:.1}%",
        stats.rounds_played(),
        stats.win_rate()
    )
}
