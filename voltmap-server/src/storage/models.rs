use crate::storage::schema::{
    auth_sessions, charging_sessions, favorites, promotions, reviews, rewards,
    station_connectors, stations, user_rewards, users,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
}

/// Aggregates derived from a user's completed sessions and claimed rewards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UserTotals {
    pub total_points: i64,
    pub total_charges: i64,
    pub total_kwh: f64,
}

#[derive(Insertable)]
#[diesel(table_name = auth_sessions)]
pub struct NewAuthSession<'a> {
    pub jti: &'a str,
    pub user_id: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = stations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StationRow {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub price_per_kwh: Option<f64>,
    pub is_free: bool,
    pub power: i32,
    pub opening_hours: String,
    pub status: String,
    pub has_wifi: bool,
    pub has_free_parking: bool,
    pub has_restaurant: bool,
    pub has_waiting_area: bool,
    pub owner_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// A station row together with its connector set.
#[derive(Debug, Clone)]
pub struct Station {
    pub row: StationRow,
    pub connector_types: Vec<String>,
}

/// Editable station columns, shared by insert and full update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = stations)]
#[diesel(treat_none_as_null = true)]
pub struct StationFields {
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub price_per_kwh: Option<f64>,
    pub is_free: bool,
    pub power: i32,
    pub opening_hours: String,
    pub status: String,
    pub has_wifi: bool,
    pub has_free_parking: bool,
    pub has_restaurant: bool,
    pub has_waiting_area: bool,
}

#[derive(Insertable)]
#[diesel(table_name = stations)]
pub struct NewStation {
    #[diesel(embed)]
    pub fields: StationFields,
    pub owner_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = station_connectors)]
pub struct NewStationConnector<'a> {
    pub station_id: i32,
    pub connector_type: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations)]
#[diesel(table_name = reviews)]
#[diesel(belongs_to(StationRow, foreign_key = station_id))]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Review {
    pub id: i32,
    pub station_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview<'a> {
    pub station_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = favorites)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Favorite {
    pub user_id: i32,
    pub station_id: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub user_id: i32,
    pub station_id: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = promotions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Promotion {
    pub id: i32,
    pub station_id: i32,
    pub description: String,
    pub points_value: i32,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = promotions)]
pub struct NewPromotion<'a> {
    pub station_id: i32,
    pub description: &'a str,
    pub points_value: i32,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = charging_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChargingSession {
    pub id: i32,
    pub user_id: i32,
    pub station_id: i32,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub kwh_charged: Option<f64>,
    pub points_earned: i32,
    pub total_price: Option<f64>,
    pub status: String,
}

#[derive(Insertable)]
#[diesel(table_name = charging_sessions)]
pub struct NewChargingSession<'a> {
    pub user_id: i32,
    pub station_id: i32,
    pub start_time: NaiveDateTime,
    pub status: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = rewards)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Reward {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub points_required: i32,
    pub kind: String,
    pub value: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = rewards)]
pub struct NewReward<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub points_required: i32,
    pub kind: &'a str,
    pub value: f64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Associations)]
#[diesel(table_name = user_rewards)]
#[diesel(belongs_to(Reward, foreign_key = reward_id))]
#[diesel(belongs_to(User, foreign_key = user_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserReward {
    pub id: i32,
    pub user_id: i32,
    pub reward_id: i32,
    pub points_spent: i32,
    pub is_used: bool,
    pub used_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = user_rewards)]
pub struct NewUserReward {
    pub user_id: i32,
    pub reward_id: i32,
    pub points_spent: i32,
}
