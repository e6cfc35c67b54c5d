//! API Request and Response Models

use crate::{
    session::{BetRecord, BettingSession, Milestone, SessionSummary},
    store::SessionId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Numeric form field as sent by a client: a JSON string or a JSON number.
/// Both are parsed as decimals by the validation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

impl RawAmount {
    pub fn as_text(&self) -> String {
        match self {
            RawAmount::Text(s) => s.clone(),
            RawAmount::Number(n) => n.to_string(),
        }
    }
}

/// Text of an optional field; missing fields validate as empty input
pub fn field_text(value: &Option<RawAmount>) -> String {
    value.as_ref().map(RawAmount::as_text).unwrap_or_default()
}

/// POST /sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub bankroll: Option<RawAmount>,
    #[serde(default)]
    pub base_bet: Option<RawAmount>,
    #[serde(default)]
    pub profit_target: Option<RawAmount>,
}

/// POST /sessions/:id/bets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordBetRequest {
    #[serde(default)]
    pub bet_amount: Option<RawAmount>,
    #[serde(default)]
    pub result: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
}

/// Milestone with its display message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneNotice {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub message: String,
}

impl From<Milestone> for MilestoneNotice {
    fn from(milestone: Milestone) -> Self {
        let message = milestone.to_string();
        Self { milestone, message }
    }
}

/// Full session state as rendered to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    #[serde(with = "rust_decimal::serde::str")]
    pub starting_bankroll: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_bankroll: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub highest_bankroll: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_bet: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub profit_target: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub current_bet: Decimal,
    pub round_number: u64,
    pub target_progress: f64,
    pub started_at: DateTime<Utc>,
    pub summary: SessionSummary,
    pub milestones: Vec<MilestoneNotice>,
    pub bet_history: Vec<BetRecord>,
}

impl SessionView {
    pub fn new(session_id: SessionId, session: &BettingSession) -> Self {
        Self {
            session_id,
            starting_bankroll: session.starting_bankroll(),
            current_bankroll: session.current_bankroll(),
            highest_bankroll: session.highest_bankroll(),
            base_bet: session.base_bet(),
            profit_target: session.profit_target(),
            current_bet: session.current_bet(),
            round_number: session.round_number(),
            target_progress: session.target_progress(),
            started_at: session.started_at(),
            summary: session.summary(),
            milestones: session.milestones().into_iter().map(MilestoneNotice::from).collect(),
            bet_history: session.bet_history().cloned().collect(),
        }
    }
}

/// Response to a recorded bet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordBetResponse {
    pub record: BetRecord,
    pub session: SessionView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_amount_accepts_strings_and_numbers() {
        let req: CreateSessionRequest =
            serde_json::from_str(r#"{"bankroll": "1000", "base_bet": 10, "profit_target": 12.5}"#).unwrap();
        assert_eq!(field_text(&req.bankroll), "1000");
        assert_eq!(field_text(&req.base_bet), "10");
        assert_eq!(field_text(&req.profit_target), "12.5");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let req: RecordBetRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(field_text(&req.bet_amount), "");
        assert_eq!(req.result, "");
    }
}
