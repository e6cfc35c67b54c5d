//! Oscar's Grind - betting progression tracker
//!
//! A user sets a starting bankroll, a base bet unit and a profit target, then
//! reports each even-money bet as it settles. The tracker keeps the bankroll,
//! its peak and the round history, and suggests the next stake under the
//! Oscar's Grind rule.
//!
//! - [`staking`]: the pure next-bet rule
//! - [`session`]: session record, input validation and lifecycle
//! - [`store`]: session persistence capability for hosting layers
//! - [`api`]: JSON HTTP adapter

pub mod api;
pub mod config;
pub mod errors;
pub mod session;
pub mod staking;
pub mod store;

pub use errors::{GrindError, GrindResult, SessionError};
pub use session::{
    BetRecord, BetResult, BettingSession, Milestone, SessionPolicy, SessionState, SessionStateMachine,
};
pub use staking::{compute_next_bet, LastBet};
pub use store::{InMemorySessionStore, SessionId, SessionStore};
