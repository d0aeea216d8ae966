use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use voltmap_shared::api::{
    FavoriteCheckDto, FavoriteDto, FavoriteReq, PromotionDto, PromotionReq, ReviewDto, ReviewReq,
    StationDto,
};

use super::auth::AuthCtx;
use super::stations::{ensure_owner, station_dtos};
use super::{ApiJson, AppError, AppState, parse_id, rfc3339};
use crate::storage::models::{Promotion, Review};

const INVALID_STATION: &str = "Invalid station ID";

pub(super) fn review_dto(r: Review) -> ReviewDto {
    ReviewDto {
        id: r.id,
        station_id: r.station_id,
        user_id: r.user_id,
        rating: r.rating,
        comment: r.comment,
        created_at: rfc3339(r.created_at),
    }
}

fn promotion_dto(p: Promotion) -> PromotionDto {
    PromotionDto {
        id: p.id,
        station_id: p.station_id,
        description: p.description,
        points_value: p.points_value,
        start_date: rfc3339(p.start_date),
        end_date: rfc3339(p.end_date),
        created_at: rfc3339(p.created_at),
    }
}

pub(super) async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewDto>>, AppError> {
    let id = parse_id(&id, INVALID_STATION)?;
    let rows = state.store.list_reviews_for_station(id).await?;
    Ok(Json(rows.into_iter().map(review_dto).collect()))
}

pub(super) async fn create_review(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReviewReq>,
) -> Result<(StatusCode, Json<ReviewDto>), AppError> {
    let id = parse_id(&id, INVALID_STATION)?;
    if !(1..=5).contains(&body.rating) {
        return Err(AppError::bad_request("Rating must be between 1 and 5"));
    }
    let comment = body
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let review = state
        .store
        .create_review(id, auth.user_id(), body.rating, comment)
        .await?;
    Ok((StatusCode::CREATED, Json(review_dto(review))))
}

pub(super) async fn list_favorites(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<StationDto>>, AppError> {
    let rows = state.store.list_favorite_stations(auth.user_id()).await?;
    Ok(Json(station_dtos(rows)?))
}

pub(super) async fn add_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<FavoriteReq>,
) -> Result<(StatusCode, Json<FavoriteDto>), AppError> {
    if body.station_id <= 0 {
        return Err(AppError::bad_request(INVALID_STATION));
    }
    let fav = state
        .store
        .add_favorite(auth.user_id(), body.station_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(FavoriteDto {
            user_id: fav.user_id,
            station_id: fav.station_id,
            created_at: rfc3339(fav.created_at),
        }),
    ))
}

pub(super) async fn remove_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(station_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let station_id = parse_id(&station_id, INVALID_STATION)?;
    state.store.remove_favorite(auth.user_id(), station_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn check_favorite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(station_id): Path<String>,
) -> Result<Json<FavoriteCheckDto>, AppError> {
    let station_id = parse_id(&station_id, INVALID_STATION)?;
    let is_favorite = state.store.is_favorite(auth.user_id(), station_id).await?;
    Ok(Json(FavoriteCheckDto { is_favorite }))
}

pub(super) async fn list_promotions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PromotionDto>>, AppError> {
    let id = parse_id(&id, INVALID_STATION)?;
    let rows = state.store.list_promotions_for_station(id).await?;
    Ok(Json(rows.into_iter().map(promotion_dto).collect()))
}

pub(super) async fn create_promotion(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PromotionReq>,
) -> Result<(StatusCode, Json<PromotionDto>), AppError> {
    let id = parse_id(&id, INVALID_STATION)?;
    ensure_owner(
        &state,
        id,
        &auth,
        "Not authorized to add promotions to this station",
    )
    .await?;
    let description = body.description.trim();
    if description.is_empty() {
        return Err(AppError::bad_request("description is required"));
    }
    if body.points_value < 0 {
        return Err(AppError::bad_request("pointsValue must not be negative"));
    }
    let promo = state
        .store
        .create_promotion(
            id,
            description,
            body.points_value,
            body.start_date.naive_utc(),
            body.end_date.naive_utc(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(promotion_dto(promo))))
}
