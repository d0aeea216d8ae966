use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Points awarded per kWh delivered in a completed session.
pub const POINTS_PER_KWH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Available,
    Busy,
    Offline,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Available => "available",
            StationStatus::Busy => "busy",
            StationStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for StationStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(StationStatus::Available),
            "busy" => Ok(StationStatus::Busy),
            "offline" => Ok(StationStatus::Offline),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A reward catalog entry as declared in the server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardDefinition {
    pub name: String,
    pub description: String,
    pub points_required: i32,
    /// e.g. `discount`, `free_charge`
    #[serde(rename = "type")]
    pub kind: String,
    /// Percentage or fixed amount, depending on `kind`.
    pub value: f64,
}

/// Price of a charge. Free stations cost nothing; a priced station without a
/// per-kWh rate is treated as rate 0. Returns `None` when the product is not
/// a finite number.
pub fn charge_price(is_free: bool, price_per_kwh: Option<f64>, kwh: f64) -> Option<f64> {
    let price = if is_free {
        0.0
    } else {
        price_per_kwh.unwrap_or(0.0) * kwh
    };
    price.is_finite().then_some(price)
}

/// Points for delivered energy, `floor(kwh * POINTS_PER_KWH)`.
/// Returns `None` when the result does not fit in an `i32`.
pub fn points_for_kwh(kwh: f64) -> Option<i32> {
    let points = (kwh * POINTS_PER_KWH).floor();
    if points.is_finite() && points >= i32::MIN as f64 && points <= i32::MAX as f64 {
        Some(points as i32)
    } else {
        None
    }
}

/// A reward claim that would be created with the given balance and cost.
/// Returns `None` when the balance cannot cover the cost.
pub fn balance_after_claim(balance: i64, cost: i32) -> Option<i64> {
    if balance < cost as i64 {
        None
    } else {
        Some(balance - cost as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priced_station_charges_rate_times_kwh() {
        assert_eq!(charge_price(false, Some(2.5), 10.0), Some(25.0));
        assert_eq!(points_for_kwh(10.0), Some(100));
    }

    #[test]
    fn free_station_ignores_rate() {
        assert_eq!(charge_price(true, Some(9.99), 42.0), Some(0.0));
    }

    #[test]
    fn missing_rate_is_zero() {
        assert_eq!(charge_price(false, None, 7.0), Some(0.0));
    }

    #[test]
    fn points_are_floored() {
        assert_eq!(points_for_kwh(0.05), Some(0));
        assert_eq!(points_for_kwh(1.29), Some(12));
        assert_eq!(points_for_kwh(3.999), Some(39));
    }

    #[test]
    fn oversized_charges_do_not_saturate() {
        assert_eq!(points_for_kwh(214_748_364.0), Some(2_147_483_640));
        assert_eq!(points_for_kwh(214_748_365.0), None);
        assert_eq!(points_for_kwh(1e308), None);
        assert_eq!(charge_price(false, Some(2.5), 1e308), None);
        assert_eq!(charge_price(true, Some(2.5), 1e308), Some(0.0));
    }

    #[test]
    fn claim_requires_enough_balance() {
        assert_eq!(balance_after_claim(99, 100), None);
        assert_eq!(balance_after_claim(100, 100), Some(0));
        assert_eq!(balance_after_claim(250, 100), Some(150));
    }

    #[test]
    fn statuses_round_trip_through_strings() {
        for s in ["available", "busy", "offline"] {
            assert_eq!(s.parse::<StationStatus>().unwrap().as_str(), s);
        }
        assert!("broken".parse::<StationStatus>().is_err());
        assert_eq!(
            "in_progress".parse::<SessionStatus>().unwrap(),
            SessionStatus::InProgress
        );
    }
}
