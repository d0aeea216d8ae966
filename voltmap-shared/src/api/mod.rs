use serde::{Deserialize, Serialize};

use crate::domain::{SessionStatus, StationStatus};

pub mod endpoints;
pub mod filter;
#[cfg(feature = "rest-client")]
pub mod rest;

pub use filter::{FilterError, StationFilter, StationQuery};

pub const API_PREFIX: &str = "/api";

// Accounts
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterReq {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResp {
    pub token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub name: String,
    pub created_at: String, // RFC3339 UTC
    pub total_points: i64,
    pub total_charges: i64,
    pub total_kwh: f64,
}

// Stations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub connector_types: Vec<String>,
    pub price_per_kwh: Option<f64>,
    pub is_free: bool,
    pub power: i32,
    pub opening_hours: String,
    pub status: StationStatus,
    pub has_wifi: bool,
    pub has_free_parking: bool,
    pub has_restaurant: bool,
    pub has_waiting_area: bool,
    pub owner_id: Option<i32>,
    pub created_at: String,
}

/// Body of `POST /stations` and `PUT /stations/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReq {
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub connector_types: Vec<String>,
    #[serde(default)]
    pub price_per_kwh: Option<f64>,
    #[serde(default)]
    pub is_free: bool,
    pub power: i32,
    pub opening_hours: String,
    #[serde(default = "default_station_status")]
    pub status: StationStatus,
    #[serde(default)]
    pub has_wifi: bool,
    #[serde(default)]
    pub has_free_parking: bool,
    #[serde(default)]
    pub has_restaurant: bool,
    #[serde(default)]
    pub has_waiting_area: bool,
}

fn default_station_status() -> StationStatus {
    StationStatus::Available
}

// Reviews
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: i32,
    pub station_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewReq {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

// Favorites
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteReq {
    pub station_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteDto {
    pub user_id: i32,
    pub station_id: i32,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCheckDto {
    pub is_favorite: bool,
}

// Promotions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionDto {
    pub id: i32,
    pub station_id: i32,
    pub description: String,
    pub points_value: i32,
    pub start_date: String,
    pub end_date: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionReq {
    pub description: String,
    #[serde(default)]
    pub points_value: i32,
    pub start_date: chrono::DateTime<chrono::Utc>,
    pub end_date: chrono::DateTime<chrono::Utc>,
}

// Charging sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSessionDto {
    pub id: i32,
    pub user_id: i32,
    pub station_id: i32,
    pub start_time: String,
    pub end_time: Option<String>,
    pub kwh_charged: Option<f64>,
    pub points_earned: i32,
    pub total_price: Option<f64>,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartChargingReq {
    pub station_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndChargingReq {
    pub kwh_charged: f64,
}

// Rewards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub points_required: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRewardDto {
    pub id: i32,
    pub user_id: i32,
    pub reward_id: i32,
    pub points_spent: i32,
    pub is_used: bool,
    pub used_at: Option<String>,
    pub created_at: String,
}

/// A claimed reward together with its catalog entry, as listed by
/// `GET /user/rewards`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRewardWithRewardDto {
    #[serde(flatten)]
    pub user_reward: UserRewardDto,
    pub reward: RewardDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDto {
    pub message: String,
}
