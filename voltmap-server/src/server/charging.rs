use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use voltmap_shared::api::{ChargingSessionDto, EndChargingReq, StartChargingReq};
use voltmap_shared::domain::SessionStatus;

use super::auth::AuthCtx;
use super::{ApiJson, AppError, AppState, parse_id, rfc3339};
use crate::storage::models::ChargingSession;

const INVALID_SESSION: &str = "Invalid session ID";

fn session_dto(s: ChargingSession) -> Result<ChargingSessionDto, AppError> {
    let status = s
        .status
        .parse::<SessionStatus>()
        .map_err(AppError::internal)?;
    Ok(ChargingSessionDto {
        id: s.id,
        user_id: s.user_id,
        station_id: s.station_id,
        start_time: rfc3339(s.start_time),
        end_time: s.end_time.map(rfc3339),
        kwh_charged: s.kwh_charged,
        points_earned: s.points_earned,
        total_price: s.total_price,
        status,
    })
}

/// Loads a session and checks that the caller owns it.
async fn owned_session(state: &AppState, raw_id: &str, auth: &AuthCtx) -> Result<i32, AppError> {
    let id = parse_id(raw_id, INVALID_SESSION)?;
    let session = state
        .store
        .get_charging_session(id)
        .await?
        .ok_or_else(|| AppError::not_found("Charging session not found"))?;
    if session.user_id != auth.user_id() {
        tracing::warn!(session_id = id, owner = session.user_id, "charging: not owner");
        return Err(AppError::forbidden("Not authorized to modify this session"));
    }
    Ok(id)
}

pub(super) async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<StartChargingReq>,
) -> Result<(StatusCode, Json<ChargingSessionDto>), AppError> {
    if body.station_id <= 0 {
        return Err(AppError::bad_request("Invalid station ID"));
    }
    let session = state
        .store
        .start_charging_session(auth.user_id(), body.station_id)
        .await?;
    tracing::info!(session_id = session.id, station_id = body.station_id, "charging started");
    Ok((StatusCode::CREATED, Json(session_dto(session)?)))
}

pub(super) async fn end(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<EndChargingReq>,
) -> Result<Json<ChargingSessionDto>, AppError> {
    if !body.kwh_charged.is_finite() || body.kwh_charged <= 0.0 {
        return Err(AppError::bad_request("Invalid kWh value"));
    }
    let id = owned_session(&state, &id, &auth).await?;
    let session = state.store.end_charging_session(id, body.kwh_charged).await?;
    tracing::info!(
        session_id = id,
        kwh = body.kwh_charged,
        points = session.points_earned,
        "charging completed"
    );
    Ok(Json(session_dto(session)?))
}

pub(super) async fn cancel(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
) -> Result<Json<ChargingSessionDto>, AppError> {
    let id = owned_session(&state, &id, &auth).await?;
    let session = state.store.cancel_charging_session(id).await?;
    Ok(Json(session_dto(session)?))
}

pub(super) async fn history(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<ChargingSessionDto>>, AppError> {
    let rows = state.store.list_sessions_for_user(auth.user_id()).await?;
    let items = rows
        .into_iter()
        .map(session_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}
