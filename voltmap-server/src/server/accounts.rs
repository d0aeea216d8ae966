use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use bcrypt::{DEFAULT_COST, hash, verify};
use voltmap_shared::api::{AuthReq, AuthResp, RegisterReq, ReviewDto, StationDto, UserDto};

use super::auth::{self, AuthCtx};
use super::social::review_dto;
use super::stations::station_dtos;
use super::{ApiJson, AppError, AppState, rfc3339};
use crate::storage::models::User;

const MIN_PASSWORD_LEN: usize = 6;

async fn user_dto(state: &AppState, user: User) -> Result<UserDto, AppError> {
    let totals = state.store.user_totals(user.id).await?;
    Ok(UserDto {
        id: user.id,
        username: user.username,
        email: user.email,
        name: user.name,
        created_at: rfc3339(user.created_at),
        total_points: totals.total_points,
        total_charges: totals.total_charges,
        total_kwh: totals.total_kwh,
    })
}

fn validate_registration(req: &RegisterReq) -> Result<(), AppError> {
    if req.username.trim().is_empty() {
        return Err(AppError::bad_request("username is required"));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("name is required"));
    }
    if !req.email.contains('@') {
        return Err(AppError::bad_request("email is invalid"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub(super) async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterReq>,
) -> Result<(StatusCode, Json<AuthResp>), AppError> {
    validate_registration(&body)?;
    let cost = state.config.bcrypt_cost.unwrap_or(DEFAULT_COST);
    let password_hash = hash(&body.password, cost).map_err(|e| {
        tracing::error!(username=%body.username, error=%e, "register: bcrypt hash failed");
        AppError::internal(e)
    })?;
    let user = state
        .store
        .create_user(
            body.username.trim(),
            body.email.trim(),
            body.name.trim(),
            &password_hash,
        )
        .await?;
    tracing::info!(user_id = user.id, username = %user.username, "register: user created");
    let token = auth::issue_jwt_for_user(&state, user.id, &user.username).await?;
    let user = user_dto(&state, user).await?;
    Ok((StatusCode::CREATED, Json(AuthResp { token, user })))
}

pub(super) async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AuthReq>,
) -> Result<Json<AuthResp>, AppError> {
    let user = state
        .store
        .get_user_by_username(body.username.trim())
        .await?
        .ok_or_else(|| {
            tracing::warn!(username=%body.username, "login: unknown username");
            AppError::unauthorized()
        })?;
    if !verify(&body.password, &user.password_hash).map_err(|e| {
        tracing::error!(username=%body.username, error=%e, "login: bcrypt verify failed");
        AppError::internal(e)
    })? {
        tracing::warn!(username=%body.username, "login: invalid password");
        return Err(AppError::unauthorized());
    }
    let token = auth::issue_jwt_for_user(&state, user.id, &user.username).await?;
    let user = user_dto(&state, user).await?;
    Ok(Json(AuthResp { token, user }))
}

pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<StatusCode, AppError> {
    state.store.delete_session(&auth.claims.jti).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<UserDto>, AppError> {
    let user = state
        .store
        .get_user(auth.user_id())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user_dto(&state, user).await?))
}

pub(super) async fn my_stations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<StationDto>>, AppError> {
    let rows = state.store.list_stations_by_owner(auth.user_id()).await?;
    Ok(Json(station_dtos(rows)?))
}

pub(super) async fn my_reviews(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<ReviewDto>>, AppError> {
    let rows = state.store.list_reviews_for_user(auth.user_id()).await?;
    Ok(Json(rows.into_iter().map(review_dto).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: &str, email: &str, password: &str) -> RegisterReq {
        RegisterReq {
            username: username.into(),
            password: password.into(),
            email: email.into(),
            name: "Ada".into(),
        }
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration(&req("ada", "ada@example.com", "secret")).is_ok());
        for bad in [
            req(" ", "ada@example.com", "secret"),
            req("ada", "ada.example.com", "secret"),
            req("ada", "ada@example.com", "12345"),
        ] {
            assert!(matches!(
                validate_registration(&bad),
                Err(AppError::BadRequest(_))
            ));
        }
    }
}
