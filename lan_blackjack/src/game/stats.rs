use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::{Outcome, Value},
    round::RoundReport,
};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
enum Streak {
    #[default]
    None,
    Wins(u32),
    Losses(u32),
}

/// Running totals over every round of a session, from the player's side.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SessionStats {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub longest_win_streak: u32,
    pub longest_losing_streak: u32,
    /// Highest total the player busted with; zero if they never did.
    pub biggest_bust: Value,
    /// Two-card 21s dealt to the player.
    pub naturals: u32,
    pub dealer_busts: u32,
    pub total_hits: u32,
    pub total_stands: u32,
    hand_value_sum: u64,
    streak: Streak,
}

impl SessionStats {
    pub fn record(&mut self, report: &RoundReport) {
        match report.outcome {
            Outcome::Win => {
                self.wins += 1;
                let run = match self.streak {
                    Streak::Wins(run) => run + 1,
                    _ => 1,
                };
                self.streak = Streak::Wins(run);
                self.longest_win_streak = self.longest_win_streak.max(run);
            }
            Outcome::Loss => {
                self.losses += 1;
                let run = match self.streak {
                    Streak::Losses(run) => run + 1,
                    _ => 1,
                };
                self.streak = Streak::Losses(run);
                self.longest_losing_streak = self.longest_losing_streak.max(run);
            }
            Outcome::Tie => {
                self.ties += 1;
                self.streak = Streak::None;
            }
        }

        if report.player.is_bust() {
            self.biggest_bust = self.biggest_bust.max(report.player_total());
        }
        if report.player.is_natural() {
            self.naturals += 1;
        }
        if report.dealer.is_bust() {
            self.dealer_busts += 1;
        }
        self.total_hits += report.hits;
        self.total_stands += report.stands;
        self.hand_value_sum += u64::from(report.player_total());
    }

    #[must_use]
    pub fn rounds_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    /// Percentage of rounds won, zero before any round.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        match self.rounds_played() {
            0 => 0.0,
            played => f64::from(self.wins) * 100.0 / f64::from(played),
        }
    }

    /// Mean final player total, zero before any round.
    #[must_use]
    pub fn average_hand_value(&self) -> f64 {
        match self.rounds_played() {
            0 => 0.0,
            played => self.hand_value_sum as f64 / f64::from(played),
        }
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rounds: {} wins, {} losses, {} ties ({:.1}% win rate)",
            self.rounds_played(),
            self.wins,
            self.losses,
            self.ties,
            self.win_rate()
        )
    }
}
