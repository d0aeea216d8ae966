use chrono::Utc;
use diesel::prelude::*;
use tracing::debug;
use voltmap_shared::domain::{SessionStatus, StationStatus, charge_price, points_for_kwh};

use super::models::{ChargingSession, NewChargingSession, StationRow};
use super::schema::{charging_sessions, stations};
use super::{StorageError, Store};

fn load_session(
    conn: &mut SqliteConnection,
    session_id: i32,
) -> Result<ChargingSession, StorageError> {
    charging_sessions::table
        .find(session_id)
        .select(ChargingSession::as_select())
        .first(conn)
        .optional()?
        .ok_or(StorageError::NotFound("Charging session not found"))
}

fn require_in_progress(session: &ChargingSession) -> Result<(), StorageError> {
    if session.status != SessionStatus::InProgress.as_str() {
        return Err(StorageError::InvalidState(
            "Charging session is not in progress",
        ));
    }
    Ok(())
}

impl Store {
    pub async fn start_charging_session(
        &self,
        user_id: i32,
        station_id: i32,
    ) -> Result<ChargingSession, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let status: String = stations::table
                    .find(station_id)
                    .select(stations::status)
                    .first(conn)
                    .optional()?
                    .ok_or(StorageError::NotFound("Station not found"))?;
                if status != StationStatus::Available.as_str() {
                    return Err(StorageError::InvalidState("Station is not available"));
                }
                let open: i64 = charging_sessions::table
                    .filter(charging_sessions::user_id.eq(user_id))
                    .filter(charging_sessions::status.eq(SessionStatus::InProgress.as_str()))
                    .count()
                    .get_result(conn)?;
                if open > 0 {
                    return Err(StorageError::InvalidState(
                        "Charging session already in progress",
                    ));
                }
                let row = NewChargingSession {
                    user_id,
                    station_id,
                    start_time: Utc::now().naive_utc(),
                    status: SessionStatus::InProgress.as_str(),
                };
                Ok(diesel::insert_into(charging_sessions::table)
                    .values(&row)
                    .returning(ChargingSession::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }

    pub async fn get_charging_session(
        &self,
        session_id: i32,
    ) -> Result<Option<ChargingSession>, StorageError> {
        self.with_conn(move |conn| {
            Ok(charging_sessions::table
                .find(session_id)
                .select(ChargingSession::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Completes an in-progress session, pricing it against the station's
    /// current rate and awarding points for the delivered energy.
    pub async fn end_charging_session(
        &self,
        session_id: i32,
        kwh_charged: f64,
    ) -> Result<ChargingSession, StorageError> {
        if !kwh_charged.is_finite() || kwh_charged <= 0.0 {
            return Err(StorageError::InvalidInput("Invalid kWh value".to_string()));
        }
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let session = load_session(conn, session_id)?;
                require_in_progress(&session)?;
                let station = stations::table
                    .find(session.station_id)
                    .select(StationRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or(StorageError::NotFound("Station not found"))?;

                let invalid = || StorageError::InvalidInput("Invalid kWh value".to_string());
                let total_price = charge_price(station.is_free, station.price_per_kwh, kwh_charged)
                    .ok_or_else(invalid)?;
                let points_earned = points_for_kwh(kwh_charged).ok_or_else(invalid)?;
                debug!(session_id, kwh_charged, total_price, points_earned, "completing session");

                Ok(diesel::update(
                    charging_sessions::table
                        .find(session_id)
                        .filter(charging_sessions::status.eq(SessionStatus::InProgress.as_str())),
                )
                .set((
                    charging_sessions::end_time.eq(Some(Utc::now().naive_utc())),
                    charging_sessions::kwh_charged.eq(Some(kwh_charged)),
                    charging_sessions::points_earned.eq(points_earned),
                    charging_sessions::total_price.eq(Some(total_price)),
                    charging_sessions::status.eq(SessionStatus::Completed.as_str()),
                ))
                .returning(ChargingSession::as_returning())
                .get_result(conn)?)
            })
        })
        .await
    }

    pub async fn cancel_charging_session(
        &self,
        session_id: i32,
    ) -> Result<ChargingSession, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let session = load_session(conn, session_id)?;
                require_in_progress(&session)?;
                Ok(diesel::update(charging_sessions::table.find(session_id))
                    .set((
                        charging_sessions::end_time.eq(Some(Utc::now().naive_utc())),
                        charging_sessions::status.eq(SessionStatus::Cancelled.as_str()),
                    ))
                    .returning(ChargingSession::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }

    pub async fn list_sessions_for_user(
        &self,
        user_id: i32,
    ) -> Result<Vec<ChargingSession>, StorageError> {
        self.with_conn(move |conn| {
            Ok(charging_sessions::table
                .filter(charging_sessions::user_id.eq(user_id))
                .order((
                    charging_sessions::start_time.desc(),
                    charging_sessions::id.desc(),
                ))
                .select(ChargingSession::as_select())
                .load(conn)?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::models::UserTotals;
    use super::super::test_support::{self, station_fields};
    use super::*;

    async fn station(store: &Store, owner: i32, status: StationStatus, free: bool) -> i32 {
        store
            .create_station(station_fields(status, 50, free), vec!["CCS".into()], owner)
            .await
            .unwrap()
            .row
            .id
    }

    #[tokio::test]
    async fn completing_prices_and_awards_points() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "driver").await;
        let sid = station(&t.store, user.id, StationStatus::Available, false).await;

        let started = t.store.start_charging_session(user.id, sid).await.unwrap();
        assert_eq!(started.status, "in_progress");
        assert!(started.end_time.is_none());
        assert!(started.kwh_charged.is_none());
        assert!(started.total_price.is_none());

        let ended = t.store.end_charging_session(started.id, 10.0).await.unwrap();
        assert_eq!(ended.status, "completed");
        assert_eq!(ended.total_price, Some(25.0));
        assert_eq!(ended.points_earned, 100);
        assert_eq!(ended.kwh_charged, Some(10.0));
        assert!(ended.end_time.is_some());

        let totals = t.store.user_totals(user.id).await.unwrap();
        assert_eq!(
            totals,
            UserTotals {
                total_points: 100,
                total_charges: 1,
                total_kwh: 10.0,
            }
        );
    }

    #[tokio::test]
    async fn free_station_costs_nothing_but_still_earns() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "driver").await;
        let sid = station(&t.store, user.id, StationStatus::Available, true).await;
        let started = t.store.start_charging_session(user.id, sid).await.unwrap();
        let ended = t.store.end_charging_session(started.id, 4.25).await.unwrap();
        assert_eq!(ended.total_price, Some(0.0));
        assert_eq!(ended.points_earned, 42);
    }

    #[tokio::test]
    async fn ending_twice_is_rejected_and_totals_hold() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "driver").await;
        let sid = station(&t.store, user.id, StationStatus::Available, false).await;
        let started = t.store.start_charging_session(user.id, sid).await.unwrap();
        t.store.end_charging_session(started.id, 2.0).await.unwrap();
        let before = t.store.user_totals(user.id).await.unwrap();

        let err = t
            .store
            .end_charging_session(started.id, 5.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidState("Charging session is not in progress")
        ));
        assert_eq!(t.store.user_totals(user.id).await.unwrap(), before);

        let err = t.store.end_charging_session(9999, 1.0).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejects_bad_kwh() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "driver").await;
        let sid = station(&t.store, user.id, StationStatus::Available, false).await;
        let started = t.store.start_charging_session(user.id, sid).await.unwrap();
        for kwh in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = t
                .store
                .end_charging_session(started.id, kwh)
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn oversized_kwh_leaves_session_open() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "driver").await;
        let priced = station(&t.store, user.id, StationStatus::Available, false).await;
        let started = t
            .store
            .start_charging_session(user.id, priced)
            .await
            .unwrap();
        for kwh in [1e308, 214_748_365.0] {
            let err = t
                .store
                .end_charging_session(started.id, kwh)
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidInput(_)));
        }
        let still_open = t
            .store
            .get_charging_session(started.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(still_open.status, "in_progress");
        assert_eq!(t.store.user_totals(user.id).await.unwrap().total_points, 0);

        let ended = t
            .store
            .end_charging_session(started.id, 214_748_364.0)
            .await
            .unwrap();
        assert_eq!(ended.points_earned, 2_147_483_640);
        assert_eq!(ended.total_price, Some(536_870_910.0));
    }

    #[tokio::test]
    async fn start_requires_available_station_and_no_open_session() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "driver").await;
        let busy = station(&t.store, user.id, StationStatus::Busy, false).await;
        let free = station(&t.store, user.id, StationStatus::Available, false).await;

        let err = t.store.start_charging_session(user.id, busy).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidState("Station is not available")));
        let err = t.store.start_charging_session(user.id, 9999).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound("Station not found")));

        t.store.start_charging_session(user.id, free).await.unwrap();
        let err = t.store.start_charging_session(user.id, free).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::InvalidState("Charging session already in progress")
        ));
    }

    #[tokio::test]
    async fn cancel_closes_without_totals() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "driver").await;
        let sid = station(&t.store, user.id, StationStatus::Available, false).await;
        let first = t.store.start_charging_session(user.id, sid).await.unwrap();
        let cancelled = t.store.cancel_charging_session(first.id).await.unwrap();
        assert_eq!(cancelled.status, "cancelled");
        assert!(cancelled.end_time.is_some());
        assert_eq!(cancelled.points_earned, 0);
        assert!(t.store.cancel_charging_session(first.id).await.is_err());
        assert_eq!(
            t.store.user_totals(user.id).await.unwrap(),
            UserTotals::default()
        );

        // a new session may start once the previous one is closed
        let second = t.store.start_charging_session(user.id, sid).await.unwrap();
        let history = t.store.list_sessions_for_user(user.id).await.unwrap();
        assert_eq!(
            history.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }
}
