//! Betting session model and lifecycle

pub mod machine;
pub mod types;
pub mod validation;

pub use machine::{check_milestones, SessionPolicy, SessionState, SessionStateMachine};
pub use types::{BetRecord, BetResult, BettingSession, Milestone, RoundTally, SessionSummary};
pub use validation::{BetInput, SetupInput};
