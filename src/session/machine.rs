//! Session lifecycle: create, record bets, check milestones, reset.
//!
//! The machine owns at most one [`BettingSession`]. It performs no I/O and no
//! locking; callers that share a session across requests must serialize
//! access per session (see [`crate::store::SessionStore::update`]).

use super::types::{BetRecord, BettingSession, Milestone, RoundTally, SessionSummary};
use super::validation::{whole_units, BetInput, SetupInput};
use super::BetResult;
use crate::errors::SessionError;
use crate::staking::{compute_next_bet, LastBet};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Rules that vary between deployments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionPolicy {
    /// Reject bets larger than the current bankroll
    pub enforce_bankroll_limit: bool,
    /// Keep at most this many history records; `None` keeps everything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_history: Option<usize>,
    /// Reject a base bet larger than the starting bankroll at setup
    pub reject_base_bet_above_bankroll: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            enforce_bankroll_limit: true,
            max_history: None,
            reject_base_bet_above_bankroll: true,
        }
    }
}

impl BettingSession {
    /// Start a fresh session from validated setup values.
    pub fn new(setup: SetupInput) -> Self {
        Self {
            starting_bankroll: setup.starting_bankroll,
            current_bankroll: setup.starting_bankroll,
            highest_bankroll: setup.starting_bankroll,
            base_bet: setup.base_bet,
            profit_target: setup.profit_target,
            current_bet: setup.base_bet,
            round_number: 1,
            bet_history: VecDeque::new(),
            tally: RoundTally::default(),
            started_at: Utc::now(),
        }
    }

    /// Apply one settled bet. Every check runs before any field changes, so
    /// a rejected bet leaves the session exactly as it was.
    ///
    /// An amount accepted within the multiple tolerance is snapped to the
    /// nearest whole number of base units before it is applied.
    pub fn apply_bet(&mut self, bet: BetInput, policy: &SessionPolicy) -> Result<BetRecord, SessionError> {
        let non_multiple = || SessionError::NonMultipleBet {
            bet: bet.amount,
            base_bet: self.base_bet,
        };
        let amount = whole_units(bet.amount, self.base_bet)
            .ok_or_else(non_multiple)?
            .checked_mul(self.base_bet)
            .ok_or_else(non_multiple)?;

        if policy.enforce_bankroll_limit && amount > self.current_bankroll {
            return Err(SessionError::InsufficientBankroll {
                bet: amount,
                bankroll: self.current_bankroll,
            });
        }

        let profit_loss = match bet.result {
            BetResult::Win => amount,
            BetResult::Loss => -amount,
        };
        let bankroll_after = self
            .current_bankroll
            .checked_add(profit_loss)
            .ok_or_else(out_of_range)?;
        // Watermark first: the next bet is measured against the new peak
        let highest_bankroll = self.highest_bankroll.max(bankroll_after);
        let suggested_next_bet = compute_next_bet(
            bankroll_after,
            highest_bankroll,
            self.base_bet,
            Some(LastBet::new(amount, bet.result)),
        )
        .ok_or_else(out_of_range)?;

        self.current_bankroll = bankroll_after;
        self.highest_bankroll = highest_bankroll;
        let followed_suggestion = amount == self.current_bet;

        let record = BetRecord {
            round: self.round_number,
            bet_amount: amount,
            result: bet.result,
            profit_loss,
            bankroll_after: self.current_bankroll,
            suggested_next_bet,
            followed_suggestion,
            recorded_at: Utc::now(),
        };

        self.bet_history.push_front(record.clone());
        if let Some(cap) = policy.max_history {
            self.bet_history.truncate(cap);
        }

        match bet.result {
            BetResult::Win => self.tally.wins += 1,
            BetResult::Loss => self.tally.losses += 1,
        }
        if followed_suggestion {
            self.tally.suggestions_followed += 1;
        }

        self.round_number += 1;
        self.current_bet = suggested_next_bet;

        Ok(record)
    }

    pub fn milestones(&self) -> Vec<Milestone> {
        check_milestones(self)
    }

    pub fn summary(&self) -> SessionSummary {
        let rounds_played = self.round_number - 1;
        let win_rate = if rounds_played == 0 {
            0.0
        } else {
            self.tally.wins as f64 / rounds_played as f64
        };

        SessionSummary {
            rounds_played,
            wins: self.tally.wins,
            losses: self.tally.losses,
            win_rate,
            suggestions_followed: self.tally.suggestions_followed,
            net_profit: self.net_profit(),
            remaining_to_target: self
                .profit_target
                .saturating_sub(self.net_profit())
                .max(Decimal::ZERO),
        }
    }

    /// Progress towards the profit target as a fraction, clamped to `[0, 1]`
    pub fn target_progress(&self) -> f64 {
        let net_profit = self.net_profit();
        let ratio = match net_profit.checked_div(self.profit_target) {
            Some(ratio) => ratio.max(Decimal::ZERO).min(Decimal::ONE),
            // quotient too large to represent
            None if net_profit > Decimal::ZERO => Decimal::ONE,
            None => Decimal::ZERO,
        };
        ratio.to_f64().unwrap_or(0.0)
    }
}

fn out_of_range() -> SessionError {
    SessionError::invalid_input("bet_amount", "bet or bankroll out of range")
}

/// Read-only advisory check; never changes the session.
pub fn check_milestones(session: &BettingSession) -> Vec<Milestone> {
    let mut notices = Vec::new();

    let net_profit = session.net_profit();
    if net_profit >= session.profit_target {
        notices.push(Milestone::TargetReached {
            net_profit,
            profit_target: session.profit_target,
        });
    }
    if session.current_bankroll < session.base_bet {
        notices.push(Milestone::LowBankroll {
            bankroll: session.current_bankroll,
            base_bet: session.base_bet,
        });
    }

    notices
}

/// Whether a session exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    NoSession,
    Active(BettingSession),
}

/// Owns one user's session and drives it through its lifecycle
#[derive(Debug, Clone, Default)]
pub struct SessionStateMachine {
    policy: SessionPolicy,
    state: SessionState,
}

impl SessionStateMachine {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            state: SessionState::NoSession,
        }
    }

    /// Rehydrate a machine around a session loaded from storage
    pub fn with_session(policy: SessionPolicy, session: Option<BettingSession>) -> Self {
        let state = match session {
            Some(session) => SessionState::Active(session),
            None => SessionState::NoSession,
        };
        Self { policy, state }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn session(&self) -> Option<&BettingSession> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            SessionState::NoSession => None,
        }
    }

    pub fn into_session(self) -> Option<BettingSession> {
        match self.state {
            SessionState::Active(session) => Some(session),
            SessionState::NoSession => None,
        }
    }

    /// Validate setup values and start a new session, replacing any current
    /// one. On failure the machine is left as it was.
    pub fn create(
        &mut self,
        starting_bankroll: Decimal,
        base_bet: Decimal,
        profit_target: Decimal,
    ) -> Result<&BettingSession, SessionError> {
        let setup = SetupInput::new(starting_bankroll, base_bet, profit_target)?;
        self.create_from(setup)
    }

    pub fn create_from(&mut self, setup: SetupInput) -> Result<&BettingSession, SessionError> {
        if self.policy.reject_base_bet_above_bankroll && setup.base_bet > setup.starting_bankroll {
            return Err(SessionError::invalid_input(
                "base_bet",
                "base bet cannot be larger than bankroll",
            ));
        }

        self.state = SessionState::Active(BettingSession::new(setup));
        self.session().ok_or(SessionError::NoActiveSession)
    }

    /// Record the outcome of a bet and advance to the next round.
    ///
    /// Checks run in order: active session, positive amount, whole multiple
    /// of the base bet, then the bankroll limit when the policy enforces it.
    pub fn record_bet(&mut self, bet_amount: Decimal, result: BetResult) -> Result<BetRecord, SessionError> {
        let SessionState::Active(session) = &mut self.state else {
            return Err(SessionError::NoActiveSession);
        };
        let bet = BetInput::new(bet_amount, result)?;
        session.apply_bet(bet, &self.policy)
    }

    pub fn check_milestones(&self) -> Result<Vec<Milestone>, SessionError> {
        self.session()
            .map(check_milestones)
            .ok_or(SessionError::NoActiveSession)
    }

    /// Discard the session. Resetting with no session is a no-op.
    pub fn reset(&mut self) {
        self.state = SessionState::NoSession;
    }
}
