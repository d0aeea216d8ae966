use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use voltmap_shared::api::{RewardDto, UserRewardDto, UserRewardWithRewardDto};

use super::auth::AuthCtx;
use super::{AppError, AppState, parse_id, rfc3339};
use crate::storage::models::{Reward, UserReward};

fn reward_dto(r: Reward) -> RewardDto {
    RewardDto {
        id: r.id,
        name: r.name,
        description: r.description,
        points_required: r.points_required,
        kind: r.kind,
        value: r.value,
        created_at: rfc3339(r.created_at),
    }
}

fn user_reward_dto(u: UserReward) -> UserRewardDto {
    UserRewardDto {
        id: u.id,
        user_id: u.user_id,
        reward_id: u.reward_id,
        points_spent: u.points_spent,
        is_used: u.is_used,
        used_at: u.used_at.map(rfc3339),
        created_at: rfc3339(u.created_at),
    }
}

pub(super) async fn catalog(
    State(state): State<AppState>,
) -> Result<Json<Vec<RewardDto>>, AppError> {
    let rows = state.store.list_rewards().await?;
    Ok(Json(rows.into_iter().map(reward_dto).collect()))
}

pub(super) async fn claim(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<UserRewardDto>), AppError> {
    let reward_id = parse_id(&id, "Invalid reward ID")?;
    let claimed = state.store.claim_reward(auth.user_id(), reward_id).await?;
    tracing::info!(
        reward_id,
        user_reward_id = claimed.id,
        points = claimed.points_spent,
        "reward claimed"
    );
    Ok((StatusCode::CREATED, Json(user_reward_dto(claimed))))
}

pub(super) async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<UserRewardWithRewardDto>>, AppError> {
    let rows = state.store.list_user_rewards(auth.user_id()).await?;
    let items = rows
        .into_iter()
        .map(|(ur, r)| UserRewardWithRewardDto {
            user_reward: user_reward_dto(ur),
            reward: reward_dto(r),
        })
        .collect();
    Ok(Json(items))
}

pub(super) async fn use_reward(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
) -> Result<Json<UserRewardDto>, AppError> {
    let id = parse_id(&id, "Invalid user reward ID")?;
    let row = state
        .store
        .get_user_reward(id)
        .await?
        .ok_or_else(|| AppError::not_found("User reward not found"))?;
    if row.user_id != auth.user_id() {
        tracing::warn!(user_reward_id = id, owner = row.user_id, "rewards: not owner");
        return Err(AppError::forbidden("Not authorized to use this reward"));
    }
    let used = state.store.use_reward(id).await?;
    Ok(Json(user_reward_dto(used)))
}
