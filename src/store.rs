//! Session persistence capability
//!
//! The core never touches storage. Hosting layers map an opaque session id to
//! a [`BettingSession`] through a [`SessionStore`] and persist whatever the
//! state machine hands back.

use crate::{
    errors::{GrindResult, StorageError},
    session::BettingSession,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::debug;
use uuid::Uuid;

/// Opaque identifier handed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Get/put access to stored sessions.
///
/// `update` must run its closure exactly once while holding exclusive access
/// to that one session, so concurrent requests against the same id cannot
/// lose updates.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &SessionId) -> Option<BettingSession>;

    /// Store a brand-new session under a fresh id
    fn insert(&self, session: BettingSession) -> GrindResult<SessionId>;

    fn put(&self, id: SessionId, session: BettingSession);

    /// Remove a session. Returns whether one was present.
    fn remove(&self, id: &SessionId) -> bool;

    /// Run `f` against the stored session (or `None`) and store what it
    /// leaves behind. Leaving `None` in the slot deletes the entry.
    fn update(&self, id: &SessionId, f: &mut dyn FnMut(&mut Option<BettingSession>));

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl dyn SessionStore {
    /// [`SessionStore::update`] for closures that produce a value
    pub fn update_with<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut Option<BettingSession>) -> R,
    ) -> GrindResult<R> {
        let mut f = Some(f);
        let mut out = None;
        self.update(id, &mut |slot: &mut Option<BettingSession>| {
            if let Some(f) = f.take() {
                out = Some(f(slot));
            }
        });
        out.ok_or_else(|| StorageError::WriteFailed(format!("update of {} did not run", id)).into())
    }
}

/// Process-local store backed by a sharded concurrent map
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, BettingSession>,
    max_sessions: Option<usize>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions: Some(max_sessions),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &SessionId) -> Option<BettingSession> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    fn insert(&self, session: BettingSession) -> GrindResult<SessionId> {
        if let Some(max) = self.max_sessions {
            if self.sessions.len() >= max {
                return Err(StorageError::WriteFailed(format!(
                    "session limit of {} reached",
                    max
                ))
                .into());
            }
        }

        let id = SessionId::new();
        self.sessions.insert(id, session);
        debug!(session_id = %id, "session created");
        Ok(id)
    }

    fn put(&self, id: SessionId, session: BettingSession) {
        self.sessions.insert(id, session);
        debug!(session_id = %id, "session stored");
    }

    fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        debug!(session_id = %id, removed, "session removed");
        removed
    }

    fn update(&self, id: &SessionId, f: &mut dyn FnMut(&mut Option<BettingSession>)) {
        use dashmap::mapref::entry::Entry;

        // The entry holds the shard write lock until it is dropped
        match self.sessions.entry(*id) {
            Entry::Occupied(mut occupied) => {
                let mut slot = Some(occupied.get().clone());
                f(&mut slot);
                match slot {
                    Some(session) => {
                        occupied.insert(session);
                    }
                    None => {
                        occupied.remove();
                        debug!(session_id = %id, "session removed");
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let mut slot = None;
                f(&mut slot);
                if let Some(session) = slot {
                    vacant.insert(session);
                    debug!(session_id = %id, "session stored");
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{BetResult, SessionPolicy, SessionStateMachine, SetupInput};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn new_session() -> BettingSession {
        BettingSession::new(SetupInput::new(dec!(1000), dec!(10), dec!(100)).unwrap())
    }

    fn record_loss(slot: &mut Option<BettingSession>) -> Result<(), crate::errors::SessionError> {
        let mut machine = SessionStateMachine::with_session(SessionPolicy::default(), slot.take());
        let result = machine.record_bet(dec!(10), BetResult::Loss).map(|_| ());
        *slot = machine.into_session();
        result
    }

    #[test]
    fn test_put_get_remove() {
        let store = InMemorySessionStore::new();
        let id = store.insert(new_session()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap().current_bankroll(), dec!(1000));

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_replaces_existing_session() {
        let store = InMemorySessionStore::new();
        let id = store.insert(new_session()).unwrap();

        let replacement = BettingSession::new(SetupInput::new(dec!(50), dec!(5), dec!(20)).unwrap());
        store.put(id, replacement.clone());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&id).unwrap(), replacement);

        let other = SessionId::new();
        store.put(other, new_session());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&other).unwrap().base_bet(), dec!(10));
    }

    #[test]
    fn test_capacity_limit() {
        let store = InMemorySessionStore::with_capacity_limit(1);
        store.insert(new_session()).unwrap();
        assert!(store.insert(new_session()).is_err());
    }

    #[test]
    fn test_update_applies_and_discards() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let id = store.insert(new_session()).unwrap();

        let outcome = store.update_with(&id, record_loss).unwrap();
        assert!(outcome.is_ok());
        assert_eq!(store.get(&id).unwrap().current_bankroll(), dec!(990));

        store.update_with(&id, |slot| *slot = None).unwrap();
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_update_on_missing_session() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let outcome = store.update_with(&SessionId::new(), record_loss).unwrap();
        assert!(outcome.is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_serializes_writers() {
        let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        let id = store.insert(new_session()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        store.update_with(&id, record_loss).unwrap().unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let session = store.get(&id).unwrap();
        assert_eq!(session.round_number(), 81);
        assert_eq!(session.current_bankroll(), dec!(200));
    }

    #[test]
    fn test_session_id_round_trips_through_string() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
