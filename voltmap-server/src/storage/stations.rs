use std::collections::{BTreeSet, HashMap};

use diesel::prelude::*;
use tracing::trace;
use voltmap_shared::api::StationFilter;

use super::models::{NewStation, NewStationConnector, Station, StationFields, StationRow};
use super::schema::{station_connectors, stations};
use super::{StorageError, Store};

impl Store {
    pub async fn create_station(
        &self,
        fields: StationFields,
        connector_types: Vec<String>,
        owner_id: i32,
    ) -> Result<Station, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let row = diesel::insert_into(stations::table)
                    .values(NewStation {
                        fields,
                        owner_id: Some(owner_id),
                    })
                    .returning(StationRow::as_returning())
                    .get_result(conn)?;
                let connector_types = replace_connectors(conn, row.id, &connector_types)?;
                Ok(Station {
                    row,
                    connector_types,
                })
            })
        })
        .await
    }

    pub async fn get_station(&self, station_id: i32) -> Result<Option<Station>, StorageError> {
        self.with_conn(move |conn| Ok(load_station(conn, station_id)?))
            .await
    }

    /// Replaces every editable column and the connector set of a station.
    pub async fn update_station(
        &self,
        station_id: i32,
        fields: StationFields,
        connector_types: Vec<String>,
    ) -> Result<Station, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let row = diesel::update(stations::table.find(station_id))
                    .set(&fields)
                    .returning(StationRow::as_returning())
                    .get_result(conn)
                    .optional()?
                    .ok_or(StorageError::NotFound("Station not found"))?;
                let connector_types = replace_connectors(conn, station_id, &connector_types)?;
                Ok(Station {
                    row,
                    connector_types,
                })
            })
        })
        .await
    }

    pub async fn list_stations(
        &self,
        filter: &StationFilter,
    ) -> Result<Vec<Station>, StorageError> {
        let filter = filter.clone();
        trace!(?filter, "list_stations");
        self.with_conn(move |conn| {
            let mut query = stations::table
                .select(StationRow::as_select())
                .order(stations::id.asc())
                .into_boxed();
            if !filter.statuses.is_empty() {
                let statuses: Vec<&'static str> =
                    filter.statuses.iter().map(|s| s.as_str()).collect();
                query = query.filter(stations::status.eq_any(statuses));
            }
            if !filter.connector_types.is_empty() {
                // Sets intersect when any of the requested types is present
                let matching = station_connectors::table
                    .filter(station_connectors::connector_type.eq_any(filter.connector_types))
                    .select(station_connectors::station_id);
                query = query.filter(stations::id.eq_any(matching));
            }
            if let Some(is_free) = filter.is_free {
                query = query.filter(stations::is_free.eq(is_free));
            }
            if let Some(min_power) = filter.min_power {
                query = query.filter(stations::power.ge(min_power));
            }
            let rows = query.load::<StationRow>(conn)?;
            Ok(attach_connectors(conn, rows)?)
        })
        .await
    }

    pub async fn list_stations_by_owner(
        &self,
        owner_id: i32,
    ) -> Result<Vec<Station>, StorageError> {
        self.with_conn(move |conn| {
            let rows = stations::table
                .filter(stations::owner_id.eq(owner_id))
                .order(stations::id.asc())
                .select(StationRow::as_select())
                .load(conn)?;
            Ok(attach_connectors(conn, rows)?)
        })
        .await
    }
}

pub(super) fn load_station(
    conn: &mut SqliteConnection,
    station_id: i32,
) -> Result<Option<Station>, diesel::result::Error> {
    let row = stations::table
        .find(station_id)
        .select(StationRow::as_select())
        .first(conn)
        .optional()?;
    match row {
        Some(row) => Ok(attach_connectors(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

pub(super) fn attach_connectors(
    conn: &mut SqliteConnection,
    rows: Vec<StationRow>,
) -> Result<Vec<Station>, diesel::result::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let pairs: Vec<(i32, String)> = station_connectors::table
        .filter(station_connectors::station_id.eq_any(ids))
        .order((
            station_connectors::station_id.asc(),
            station_connectors::connector_type.asc(),
        ))
        .select((
            station_connectors::station_id,
            station_connectors::connector_type,
        ))
        .load(conn)?;
    let mut by_station: HashMap<i32, Vec<String>> = HashMap::new();
    for (sid, connector) in pairs {
        by_station.entry(sid).or_default().push(connector);
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let connector_types = by_station.remove(&row.id).unwrap_or_default();
            Station {
                row,
                connector_types,
            }
        })
        .collect())
}

fn replace_connectors(
    conn: &mut SqliteConnection,
    station_id: i32,
    connector_types: &[String],
) -> Result<Vec<String>, diesel::result::Error> {
    diesel::delete(
        station_connectors::table.filter(station_connectors::station_id.eq(station_id)),
    )
    .execute(conn)?;
    let unique: BTreeSet<&str> = connector_types.iter().map(|c| c.trim()).collect();
    let rows: Vec<NewStationConnector> = unique
        .iter()
        .map(|c| NewStationConnector {
            station_id,
            connector_type: *c,
        })
        .collect();
    diesel::insert_into(station_connectors::table)
        .values(&rows)
        .execute(conn)?;
    Ok(unique.into_iter().map(str::to_string).collect())
}
