use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use super::{API_PREFIX, StationFilter};

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

pub fn register(base: &str) -> String {
    base_join(base, &format!("{}/register", API_PREFIX))
}
pub fn login(base: &str) -> String {
    base_join(base, &format!("{}/login", API_PREFIX))
}
pub fn logout(base: &str) -> String {
    base_join(base, &format!("{}/logout", API_PREFIX))
}
pub fn me(base: &str) -> String {
    base_join(base, &format!("{}/user", API_PREFIX))
}

/// `GET /api/stations` with the filter encoded as a query string.
pub fn stations(base: &str, filter: &StationFilter) -> String {
    let url = base_join(base, &format!("{}/stations", API_PREFIX));
    let q = filter.to_query();
    let pairs: Vec<String> = [
        ("status", q.status),
        ("connectorTypes", q.connector_types),
        ("isFree", q.is_free),
        ("minPower", q.min_power),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.map(|v| format!("{}={}", k, enc(&v))))
    .collect();
    if pairs.is_empty() {
        url
    } else {
        format!("{}?{}", url, pairs.join("&"))
    }
}
pub fn station(base: &str, station_id: i32) -> String {
    base_join(base, &format!("{}/stations/{}", API_PREFIX, station_id))
}
pub fn station_reviews(base: &str, station_id: i32) -> String {
    base_join(
        base,
        &format!("{}/stations/{}/reviews", API_PREFIX, station_id),
    )
}
pub fn station_promotions(base: &str, station_id: i32) -> String {
    base_join(
        base,
        &format!("{}/stations/{}/promotions", API_PREFIX, station_id),
    )
}

pub fn favorites(base: &str) -> String {
    base_join(base, &format!("{}/favorites", API_PREFIX))
}
pub fn favorite(base: &str, station_id: i32) -> String {
    base_join(base, &format!("{}/favorites/{}", API_PREFIX, station_id))
}
pub fn favorite_check(base: &str, station_id: i32) -> String {
    base_join(
        base,
        &format!("{}/favorites/check/{}", API_PREFIX, station_id),
    )
}

pub fn charging_start(base: &str) -> String {
    base_join(base, &format!("{}/charging/start", API_PREFIX))
}
pub fn charging_end(base: &str, session_id: i32) -> String {
    base_join(base, &format!("{}/charging/{}/end", API_PREFIX, session_id))
}
pub fn charging_cancel(base: &str, session_id: i32) -> String {
    base_join(
        base,
        &format!("{}/charging/{}/cancel", API_PREFIX, session_id),
    )
}
pub fn charging_history(base: &str) -> String {
    base_join(base, &format!("{}/charging/history", API_PREFIX))
}

pub fn rewards(base: &str) -> String {
    base_join(base, &format!("{}/rewards", API_PREFIX))
}
pub fn reward_claim(base: &str, reward_id: i32) -> String {
    base_join(base, &format!("{}/rewards/{}/claim", API_PREFIX, reward_id))
}
pub fn user_rewards(base: &str) -> String {
    base_join(base, &format!("{}/user/rewards", API_PREFIX))
}
pub fn user_reward_use(base: &str, user_reward_id: i32) -> String {
    base_join(
        base,
        &format!("{}/user/rewards/{}/use", API_PREFIX, user_reward_id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StationStatus;

    #[test]
    fn joins_without_double_slashes() {
        assert_eq!(
            charging_end("http://localhost:5151/", 3),
            "http://localhost:5151/api/charging/3/end"
        );
    }

    #[test]
    fn encodes_station_filter() {
        let filter = StationFilter {
            statuses: vec![StationStatus::Available, StationStatus::Busy],
            min_power: Some(50),
            ..Default::default()
        };
        assert_eq!(
            stations("http://h", &filter),
            "http://h/api/stations?status=available%2Cbusy&minPower=50"
        );
        assert_eq!(
            stations("http://h", &StationFilter::default()),
            "http://h/api/stations"
        );
    }
}
