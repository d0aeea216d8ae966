//! Reviews, favorites and promotions: the user-facing extras hanging off a
//! station.

use diesel::prelude::*;

use super::models::{
    Favorite, NewFavorite, NewPromotion, NewReview, Promotion, Review, Station, StationRow,
};
use super::schema::{favorites, promotions, reviews, stations};
use super::stations::attach_connectors;
use super::{StorageError, Store};

fn ensure_station(conn: &mut SqliteConnection, station_id: i32) -> Result<(), StorageError> {
    let count: i64 = stations::table
        .filter(stations::id.eq(station_id))
        .count()
        .get_result(conn)?;
    if count == 0 {
        return Err(StorageError::NotFound("Station not found"));
    }
    Ok(())
}

impl Store {
    pub async fn list_reviews_for_station(
        &self,
        station_id: i32,
    ) -> Result<Vec<Review>, StorageError> {
        self.with_conn(move |conn| {
            Ok(reviews::table
                .filter(reviews::station_id.eq(station_id))
                .order((reviews::created_at.desc(), reviews::id.desc()))
                .select(Review::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn list_reviews_for_user(&self, user_id: i32) -> Result<Vec<Review>, StorageError> {
        self.with_conn(move |conn| {
            Ok(reviews::table
                .filter(reviews::user_id.eq(user_id))
                .order((reviews::created_at.desc(), reviews::id.desc()))
                .select(Review::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn create_review(
        &self,
        station_id: i32,
        user_id: i32,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                ensure_station(conn, station_id)?;
                let row = NewReview {
                    station_id,
                    user_id,
                    rating,
                    comment: comment.as_deref(),
                };
                Ok(diesel::insert_into(reviews::table)
                    .values(&row)
                    .returning(Review::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }

    pub async fn list_favorite_stations(&self, user_id: i32) -> Result<Vec<Station>, StorageError> {
        self.with_conn(move |conn| {
            let rows = favorites::table
                .inner_join(stations::table)
                .filter(favorites::user_id.eq(user_id))
                .order((favorites::created_at.asc(), stations::id.asc()))
                .select(StationRow::as_select())
                .load(conn)?;
            Ok(attach_connectors(conn, rows)?)
        })
        .await
    }

    /// Fails with [`StorageError::Duplicate`] when the pair is already saved.
    pub async fn add_favorite(
        &self,
        user_id: i32,
        station_id: i32,
    ) -> Result<Favorite, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                ensure_station(conn, station_id)?;
                let inserted = diesel::insert_into(favorites::table)
                    .values(&NewFavorite {
                        user_id,
                        station_id,
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                if inserted == 0 {
                    return Err(StorageError::Duplicate("Already in favorites"));
                }
                Ok(favorites::table
                    .find((user_id, station_id))
                    .select(Favorite::as_select())
                    .first(conn)?)
            })
        })
        .await
    }

    pub async fn remove_favorite(&self, user_id: i32, station_id: i32) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            diesel::delete(favorites::table.find((user_id, station_id))).execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn is_favorite(&self, user_id: i32, station_id: i32) -> Result<bool, StorageError> {
        self.with_conn(move |conn| {
            let count: i64 = favorites::table
                .find((user_id, station_id))
                .count()
                .get_result(conn)?;
            Ok(count > 0)
        })
        .await
    }

    pub async fn list_promotions_for_station(
        &self,
        station_id: i32,
    ) -> Result<Vec<Promotion>, StorageError> {
        self.with_conn(move |conn| {
            Ok(promotions::table
                .filter(promotions::station_id.eq(station_id))
                .order((promotions::created_at.desc(), promotions::id.desc()))
                .select(Promotion::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn create_promotion(
        &self,
        station_id: i32,
        description: &str,
        points_value: i32,
        start_date: chrono::NaiveDateTime,
        end_date: chrono::NaiveDateTime,
    ) -> Result<Promotion, StorageError> {
        if end_date < start_date {
            return Err(StorageError::InvalidInput(
                "endDate must not precede startDate".to_string(),
            ));
        }
        let description = description.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                ensure_station(conn, station_id)?;
                let row = NewPromotion {
                    station_id,
                    description: &description,
                    points_value,
                    start_date,
                    end_date,
                };
                Ok(diesel::insert_into(promotions::table)
                    .values(&row)
                    .returning(Promotion::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{self, station_fields};
    use super::*;
    use chrono::{Duration, Utc};
    use voltmap_shared::domain::StationStatus;

    async fn station(store: &Store, owner: i32) -> i32 {
        store
            .create_station(
                station_fields(StationStatus::Available, 50, false),
                vec!["CCS".into()],
                owner,
            )
            .await
            .unwrap()
            .row
            .id
    }

    #[tokio::test]
    async fn favorites_reject_duplicates_and_missing_stations() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "fan").await;
        let sid = station(&t.store, user.id).await;

        let fav = t.store.add_favorite(user.id, sid).await.unwrap();
        assert_eq!((fav.user_id, fav.station_id), (user.id, sid));
        assert!(t.store.is_favorite(user.id, sid).await.unwrap());

        let err = t.store.add_favorite(user.id, sid).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate("Already in favorites")));

        let err = t.store.add_favorite(user.id, sid + 1).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound("Station not found")));

        let listed = t.store.list_favorite_stations(user.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].connector_types, vec!["CCS"]);

        t.store.remove_favorite(user.id, sid).await.unwrap();
        assert!(!t.store.is_favorite(user.id, sid).await.unwrap());
        // removing twice is not an error
        t.store.remove_favorite(user.id, sid).await.unwrap();
    }

    #[tokio::test]
    async fn reviews_are_listed_newest_first() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "critic").await;
        let sid = station(&t.store, user.id).await;
        t.store.create_review(sid, user.id, 3, None).await.unwrap();
        t.store
            .create_review(sid, user.id, 5, Some("fast".into()))
            .await
            .unwrap();

        let listed = t.store.list_reviews_for_station(sid).await.unwrap();
        assert_eq!(
            listed.iter().map(|r| r.rating).collect::<Vec<_>>(),
            vec![5, 3]
        );
        assert_eq!(t.store.list_reviews_for_user(user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn promotion_dates_must_be_ordered() {
        let t = test_support::open().await;
        let user = test_support::user(&t.store, "owner").await;
        let sid = station(&t.store, user.id).await;
        let start = Utc::now().naive_utc();
        let end = start + Duration::days(7);

        let promo = t
            .store
            .create_promotion(sid, "Double points", 20, start, end)
            .await
            .unwrap();
        assert_eq!(promo.points_value, 20);
        assert_eq!(
            t.store.list_promotions_for_station(sid).await.unwrap().len(),
            1
        );

        let err = t
            .store
            .create_promotion(sid, "Backwards", 0, end, start)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput(_)));
    }
}
