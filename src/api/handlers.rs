//! Request Handlers
//!
//! Each handler parses raw input, drives a [`SessionStateMachine`] against
//! the stored session and persists the result through the session store.

use super::{
    errors::ApiError,
    middleware::RequestId,
    models::*,
};
use crate::{
    errors::SessionError,
    session::{BetInput, BetRecord, SessionPolicy, SessionStateMachine, SetupInput},
    store::{SessionId, SessionStore},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn SessionStore>,
    pub policy: SessionPolicy,
    pub version: String,
}

/// Unknown or malformed ids are reported the same way as a missing session
fn parse_session_id(request_id: &RequestId, raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::session(request_id.0.clone(), SessionError::NoActiveSession))
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
        active_sessions: state.store.len(),
    })
}

/// POST /sessions
pub async fn create_session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let setup = SetupInput::parse(
        &field_text(&req.bankroll),
        &field_text(&req.base_bet),
        &field_text(&req.profit_target),
    )
    .map_err(|e| ApiError::session(request_id.0.clone(), e))?;

    let mut machine = SessionStateMachine::new(state.policy.clone());
    machine
        .create_from(setup)
        .map_err(|e| ApiError::session(request_id.0.clone(), e))?;
    let session = machine
        .into_session()
        .ok_or_else(|| ApiError::session(request_id.0.clone(), SessionError::NoActiveSession))?;

    let view_source = session.clone();
    let session_id = state
        .store
        .insert(session)
        .map_err(|e| ApiError::from_grind(request_id.0.clone(), e))?;

    info!(
        %session_id,
        bankroll = %setup.starting_bankroll,
        base_bet = %setup.base_bet,
        profit_target = %setup.profit_target,
        "session started"
    );

    Ok((StatusCode::CREATED, Json(SessionView::new(session_id, &view_source))))
}

/// GET /sessions/:id
pub async fn get_session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session_id = parse_session_id(&request_id, &id)?;
    let session = state
        .store
        .get(&session_id)
        .ok_or_else(|| ApiError::session(request_id.0.clone(), SessionError::NoActiveSession))?;

    Ok(Json(SessionView::new(session_id, &session)))
}

fn apply_submission(machine: &mut SessionStateMachine, req: &RecordBetRequest) -> Result<BetRecord, SessionError> {
    if !machine.is_active() {
        return Err(SessionError::NoActiveSession);
    }
    let bet = BetInput::parse(&field_text(&req.bet_amount), &req.result)?;
    machine.record_bet(bet.amount, bet.result)
}

/// POST /sessions/:id/bets
pub async fn record_bet_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RecordBetRequest>,
) -> Result<Json<RecordBetResponse>, ApiError> {
    let session_id = parse_session_id(&request_id, &id)?;

    // The whole load/apply/store cycle runs under the session's lock
    let outcome = state
        .store
        .update_with(&session_id, |slot| {
            let mut machine = SessionStateMachine::with_session(state.policy.clone(), slot.take());
            let outcome = apply_submission(&mut machine, &req);
            *slot = machine.into_session();
            outcome.and_then(|record| {
                slot.as_ref()
                    .map(|session| (record, SessionView::new(session_id, session)))
                    .ok_or(SessionError::NoActiveSession)
            })
        })
        .map_err(|e| ApiError::from_grind(request_id.0.clone(), e))?;

    match outcome {
        Ok((record, session)) => {
            info!(
                %session_id,
                round = record.round,
                result = %record.result,
                bet = %record.bet_amount,
                bankroll = %record.bankroll_after,
                next_bet = %record.suggested_next_bet,
                "bet recorded"
            );
            Ok(Json(RecordBetResponse { record, session }))
        }
        Err(e) => {
            debug!(%session_id, error = %e, "bet rejected");
            Err(ApiError::session(request_id.0, e))
        }
    }
}

/// GET /sessions/:id/milestones
pub async fn milestones_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MilestoneNotice>>, ApiError> {
    let session_id = parse_session_id(&request_id, &id)?;
    let machine = SessionStateMachine::with_session(state.policy.clone(), state.store.get(&session_id));
    let notices = machine
        .check_milestones()
        .map_err(|e| ApiError::session(request_id.0.clone(), e))?;

    Ok(Json(notices.into_iter().map(MilestoneNotice::from).collect()))
}

/// DELETE /sessions/:id
///
/// Always 204: resetting a session that does not exist is a no-op.
pub async fn reset_session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let Ok(session_id) = id.parse::<SessionId>() else {
        return Ok(StatusCode::NO_CONTENT);
    };

    let was_active = state
        .store
        .update_with(&session_id, |slot| {
            let mut machine = SessionStateMachine::with_session(state.policy.clone(), slot.take());
            let was_active = machine.is_active();
            machine.reset();
            *slot = machine.into_session();
            was_active
        })
        .map_err(|e| ApiError::from_grind(request_id.0.clone(), e))?;

    if was_active {
        info!(%session_id, "session reset");
    }
    Ok(StatusCode::NO_CONTENT)
}
