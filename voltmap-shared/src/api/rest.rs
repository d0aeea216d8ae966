//! Minimal REST client helpers for consumers (scripts, mobile shells).

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serde: {0}")]
    Serde(String),
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client")
});

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    res.json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

async fn send_json<T: for<'de> serde::Deserialize<'de>>(
    req: reqwest::RequestBuilder,
) -> Result<T, RestError> {
    let res = req
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn login(base: &str, req: &AuthReq) -> Result<AuthResp, RestError> {
    send_json(HTTP_CLIENT.post(ep::login(base)).json(req)).await
}

pub async fn register(base: &str, req: &RegisterReq) -> Result<AuthResp, RestError> {
    send_json(HTTP_CLIENT.post(ep::register(base)).json(req)).await
}

pub async fn me(base: &str, bearer: &str) -> Result<UserDto, RestError> {
    send_json(HTTP_CLIENT.get(ep::me(base)).bearer_auth(bearer)).await
}

pub async fn list_stations(
    base: &str,
    filter: &StationFilter,
) -> Result<Vec<StationDto>, RestError> {
    send_json(HTTP_CLIENT.get(ep::stations(base, filter))).await
}

pub async fn start_charging(
    base: &str,
    bearer: &str,
    station_id: i32,
) -> Result<ChargingSessionDto, RestError> {
    let body = StartChargingReq { station_id };
    send_json(
        HTTP_CLIENT
            .post(ep::charging_start(base))
            .bearer_auth(bearer)
            .json(&body),
    )
    .await
}

pub async fn end_charging(
    base: &str,
    bearer: &str,
    session_id: i32,
    kwh_charged: f64,
) -> Result<ChargingSessionDto, RestError> {
    let body = EndChargingReq { kwh_charged };
    send_json(
        HTTP_CLIENT
            .post(ep::charging_end(base, session_id))
            .bearer_auth(bearer)
            .json(&body),
    )
    .await
}

pub async fn charging_history(
    base: &str,
    bearer: &str,
) -> Result<Vec<ChargingSessionDto>, RestError> {
    send_json(HTTP_CLIENT.get(ep::charging_history(base)).bearer_auth(bearer)).await
}

pub async fn list_rewards(base: &str) -> Result<Vec<RewardDto>, RestError> {
    send_json(HTTP_CLIENT.get(ep::rewards(base))).await
}

pub async fn claim_reward(
    base: &str,
    bearer: &str,
    reward_id: i32,
) -> Result<UserRewardDto, RestError> {
    send_json(
        HTTP_CLIENT
            .post(ep::reward_claim(base, reward_id))
            .bearer_auth(bearer),
    )
    .await
}

pub async fn use_reward(
    base: &str,
    bearer: &str,
    user_reward_id: i32,
) -> Result<UserRewardDto, RestError> {
    send_json(
        HTTP_CLIENT
            .post(ep::user_reward_use(base, user_reward_id))
            .bearer_auth(bearer),
    )
    .await
}
