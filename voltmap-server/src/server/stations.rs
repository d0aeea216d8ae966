use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use voltmap_shared::api::{StationDto, StationFilter, StationQuery, StationReq};
use voltmap_shared::domain::StationStatus;

use super::auth::AuthCtx;
use super::{ApiJson, ApiQuery, AppError, AppState, parse_id, rfc3339};
use crate::storage::models::{Station, StationFields};

pub(super) fn station_dto(s: Station) -> Result<StationDto, AppError> {
    let status = s
        .row
        .status
        .parse::<StationStatus>()
        .map_err(AppError::internal)?;
    Ok(StationDto {
        id: s.row.id,
        name: s.row.name,
        address: s.row.address,
        city: s.row.city,
        lat: s.row.lat,
        lng: s.row.lng,
        connector_types: s.connector_types,
        price_per_kwh: s.row.price_per_kwh,
        is_free: s.row.is_free,
        power: s.row.power,
        opening_hours: s.row.opening_hours,
        status,
        has_wifi: s.row.has_wifi,
        has_free_parking: s.row.has_free_parking,
        has_restaurant: s.row.has_restaurant,
        has_waiting_area: s.row.has_waiting_area,
        owner_id: s.row.owner_id,
        created_at: rfc3339(s.row.created_at),
    })
}

pub(super) fn station_dtos(rows: Vec<Station>) -> Result<Vec<StationDto>, AppError> {
    rows.into_iter().map(station_dto).collect()
}

fn validate(req: &StationReq) -> Result<(), AppError> {
    let required = [
        ("name", &req.name),
        ("address", &req.address),
        ("city", &req.city),
        ("openingHours", &req.opening_hours),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::bad_request(format!("{field} is required")));
        }
    }
    if !(-90.0..=90.0).contains(&req.lat) {
        return Err(AppError::bad_request("lat must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&req.lng) {
        return Err(AppError::bad_request("lng must be between -180 and 180"));
    }
    if req.connector_types.is_empty() {
        return Err(AppError::bad_request("At least one connector type is required"));
    }
    if req.connector_types.iter().any(|c| c.trim().is_empty()) {
        return Err(AppError::bad_request("Connector types must not be blank"));
    }
    if req.power <= 0 {
        return Err(AppError::bad_request("power must be positive"));
    }
    if let Some(price) = req.price_per_kwh
        && !(price.is_finite() && price >= 0.0)
    {
        return Err(AppError::bad_request("pricePerKwh must not be negative"));
    }
    Ok(())
}

fn into_fields(req: StationReq) -> (StationFields, Vec<String>) {
    let fields = StationFields {
        name: req.name.trim().to_string(),
        address: req.address.trim().to_string(),
        city: req.city.trim().to_string(),
        lat: req.lat,
        lng: req.lng,
        price_per_kwh: req.price_per_kwh,
        is_free: req.is_free,
        power: req.power,
        opening_hours: req.opening_hours.trim().to_string(),
        status: req.status.as_str().to_string(),
        has_wifi: req.has_wifi,
        has_free_parking: req.has_free_parking,
        has_restaurant: req.has_restaurant,
        has_waiting_area: req.has_waiting_area,
    };
    (fields, req.connector_types)
}

pub(super) async fn list_stations(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StationQuery>,
) -> Result<Json<Vec<StationDto>>, AppError> {
    let filter =
        StationFilter::from_query(&query).map_err(|e| AppError::bad_request(e.to_string()))?;
    let rows = state.store.list_stations(&filter).await?;
    Ok(Json(station_dtos(rows)?))
}

pub(super) async fn get_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StationDto>, AppError> {
    let id = parse_id(&id, "Invalid station ID")?;
    let station = state
        .store
        .get_station(id)
        .await?
        .ok_or_else(|| AppError::not_found("Station not found"))?;
    Ok(Json(station_dto(station)?))
}

pub(super) async fn create_station(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<StationReq>,
) -> Result<(StatusCode, Json<StationDto>), AppError> {
    validate(&body)?;
    let (fields, connectors) = into_fields(body);
    let station = state
        .store
        .create_station(fields, connectors, auth.user_id())
        .await?;
    tracing::info!(station_id = station.row.id, "station created");
    Ok((StatusCode::CREATED, Json(station_dto(station)?)))
}

pub(super) async fn update_station(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StationReq>,
) -> Result<Json<StationDto>, AppError> {
    let id = parse_id(&id, "Invalid station ID")?;
    ensure_owner(&state, id, &auth, "Not authorized to update this station").await?;
    validate(&body)?;
    let (fields, connectors) = into_fields(body);
    let station = state.store.update_station(id, fields, connectors).await?;
    Ok(Json(station_dto(station)?))
}

/// 404 for a missing station, 403 unless the caller created it.
pub(super) async fn ensure_owner(
    state: &AppState,
    station_id: i32,
    auth: &AuthCtx,
    denied: &'static str,
) -> Result<(), AppError> {
    let station = state
        .store
        .get_station(station_id)
        .await?
        .ok_or_else(|| AppError::not_found("Station not found"))?;
    if station.row.owner_id != Some(auth.user_id()) {
        tracing::warn!(station_id, owner = ?station.row.owner_id, "station: not owner");
        return Err(AppError::forbidden(denied));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req() -> StationReq {
        StationReq {
            name: "Central".into(),
            address: "1 Main St".into(),
            city: "Lisbon".into(),
            lat: 38.7,
            lng: -9.1,
            connector_types: vec!["CCS".into()],
            price_per_kwh: Some(0.3),
            is_free: false,
            power: 50,
            opening_hours: "24/7".into(),
            status: StationStatus::Available,
            has_wifi: false,
            has_free_parking: false,
            has_restaurant: false,
            has_waiting_area: false,
        }
    }

    #[test]
    fn accepts_valid_station() {
        assert!(validate(&req()).is_ok());
    }

    #[test]
    fn rejects_invalid_fields() {
        let cases: Vec<Box<dyn Fn(&mut StationReq)>> = vec![
            Box::new(|r| r.name = "  ".into()),
            Box::new(|r| r.opening_hours.clear()),
            Box::new(|r| r.lat = 91.0),
            Box::new(|r| r.lng = -180.5),
            Box::new(|r| r.connector_types.clear()),
            Box::new(|r| r.connector_types.push(" ".into())),
            Box::new(|r| r.power = 0),
            Box::new(|r| r.price_per_kwh = Some(-0.01)),
        ];
        for mutate in cases {
            let mut r = req();
            mutate(&mut r);
            assert!(matches!(validate(&r), Err(AppError::BadRequest(_))), "{r:?}");
        }
    }

    #[test]
    fn fields_are_trimmed() {
        let mut r = req();
        r.name = "  Central  ".into();
        let (fields, connectors) = into_fields(r);
        assert_eq!(fields.name, "Central");
        assert_eq!(fields.status, "available");
        assert_eq!(connectors, vec!["CCS"]);
    }
}
