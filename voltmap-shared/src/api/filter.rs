//! Typed station filter for `GET /api/stations`.
//!
//! The raw query string is captured as [`StationQuery`] and parsed exactly
//! once into a [`StationFilter`]; everything past the HTTP boundary works
//! with the typed form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::StationStatus;

/// Query string as it arrives on the wire. Lists are comma separated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationQuery {
    pub status: Option<String>,
    pub connector_types: Option<String>,
    pub is_free: Option<String>,
    pub min_power: Option<String>,
}

/// All constraints are optional and combined with AND. Empty lists mean no
/// constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationFilter {
    pub statuses: Vec<StationStatus>,
    pub connector_types: Vec<String>,
    pub is_free: Option<bool>,
    pub min_power: Option<i32>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Invalid status filter: {0}")]
    Status(String),
    #[error("Invalid minPower filter: {0}")]
    MinPower(String),
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl StationFilter {
    pub fn from_query(q: &StationQuery) -> Result<Self, FilterError> {
        let mut statuses = Vec::new();
        if let Some(raw) = &q.status {
            for item in split_list(raw) {
                let st = item
                    .parse::<StationStatus>()
                    .map_err(|_| FilterError::Status(item.to_string()))?;
                if !statuses.contains(&st) {
                    statuses.push(st);
                }
            }
        }
        let mut connector_types: Vec<String> = Vec::new();
        if let Some(raw) = &q.connector_types {
            for item in split_list(raw) {
                if !connector_types.iter().any(|c| c == item) {
                    connector_types.push(item.to_string());
                }
            }
        }
        let is_free = q.is_free.as_deref().map(|v| v == "true");
        let min_power = match q.min_power.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .map_err(|_| FilterError::MinPower(raw.to_string()))?,
            ),
        };
        Ok(Self {
            statuses,
            connector_types,
            is_free,
            min_power,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.connector_types.is_empty()
            && self.is_free.is_none()
            && self.min_power.is_none()
    }

    /// Inverse of [`StationFilter::from_query`], used by clients.
    pub fn to_query(&self) -> StationQuery {
        let join = |items: Vec<&str>| {
            if items.is_empty() {
                None
            } else {
                Some(items.join(","))
            }
        };
        StationQuery {
            status: join(self.statuses.iter().map(|s| s.as_str()).collect()),
            connector_types: join(self.connector_types.iter().map(String::as_str).collect()),
            is_free: self.is_free.map(|b| b.to_string()),
            min_power: self.min_power.map(|p| p.to_string()),
        }
    }
}
