use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Outcome of an even-money bet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Win,
    Loss,
}

impl BetResult {
    pub fn is_win(&self) -> bool {
        matches!(self, BetResult::Win)
    }
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetResult::Win => write!(f, "win"),
            BetResult::Loss => write!(f, "loss"),
        }
    }
}

/// One settled round. Never modified after it is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetRecord {
    pub round: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub bet_amount: Decimal,
    pub result: BetResult,
    /// `+bet_amount` on a win, `-bet_amount` on a loss
    #[serde(with = "rust_decimal::serde::str")]
    pub profit_loss: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub bankroll_after: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub suggested_next_bet: Decimal,
    /// Whether the stake matched the suggestion shown before this round
    pub followed_suggestion: bool,
    pub recorded_at: DateTime<Utc>,
}

/// A single user's betting session.
///
/// `starting_bankroll`, `base_bet` and `profit_target` are fixed at creation.
/// `bet_history` is ordered most recent first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BettingSession {
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) starting_bankroll: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) current_bankroll: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) highest_bankroll: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) base_bet: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) profit_target: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub(crate) current_bet: Decimal,
    pub(crate) round_number: u64,
    pub(crate) bet_history: VecDeque<BetRecord>,
    #[serde(default)]
    pub(crate) tally: RoundTally,
    pub(crate) started_at: DateTime<Utc>,
}

impl BettingSession {
    pub fn starting_bankroll(&self) -> Decimal {
        self.starting_bankroll
    }

    pub fn current_bankroll(&self) -> Decimal {
        self.current_bankroll
    }

    pub fn highest_bankroll(&self) -> Decimal {
        self.highest_bankroll
    }

    pub fn base_bet(&self) -> Decimal {
        self.base_bet
    }

    pub fn profit_target(&self) -> Decimal {
        self.profit_target
    }

    /// Suggested stake for the next round
    pub fn current_bet(&self) -> Decimal {
        self.current_bet
    }

    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    pub fn bet_history(&self) -> impl Iterator<Item = &BetRecord> {
        self.bet_history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.bet_history.len()
    }

    /// Most recently recorded round, if any
    pub fn last_record(&self) -> Option<&BetRecord> {
        self.bet_history.front()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Saturates at the decimal range when the bankroll has gone deeply
    /// negative with the bankroll limit disabled
    pub fn net_profit(&self) -> Decimal {
        self.current_bankroll.saturating_sub(self.starting_bankroll)
    }
}

/// Running counts kept alongside the history so they survive history caps
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundTally {
    pub wins: u64,
    pub losses: u64,
    pub suggestions_followed: u64,
}

/// Advisory notices for the presentation layer. They never block betting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Milestone {
    /// Net profit has reached the profit target
    TargetReached {
        #[serde(with = "rust_decimal::serde::str")]
        net_profit: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        profit_target: Decimal,
    },
    /// Bankroll can no longer cover one base unit
    LowBankroll {
        #[serde(with = "rust_decimal::serde::str")]
        bankroll: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        base_bet: Decimal,
    },
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Milestone::TargetReached { profit_target, .. } => {
                write!(f, "Congratulations! You have reached your profit target of {:.2}.", profit_target)
            }
            Milestone::LowBankroll { bankroll, .. } => {
                write!(f, "Bankroll {:.2} is below one base unit.", bankroll)
            }
        }
    }
}

/// Aggregate view of a session for display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub rounds_played: u64,
    pub wins: u64,
    pub losses: u64,
    pub win_rate: f64,
    pub suggestions_followed: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub net_profit: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub remaining_to_target: Decimal,
}
