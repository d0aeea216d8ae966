use chrono::Utc;
use diesel::dsl::{count_star, sum};
use diesel::prelude::*;
use voltmap_shared::domain::SessionStatus;

use super::models::{NewAuthSession, NewUser, User, UserTotals};
use super::schema::{auth_sessions, charging_sessions, user_rewards, users};
use super::{StorageError, Store};

impl Store {
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, StorageError> {
        let username = username.to_string();
        let email = email.to_string();
        let name = name.to_string();
        let password_hash = password_hash.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let taken: i64 = users::table
                    .filter(users::username.eq(&username))
                    .count()
                    .get_result(conn)?;
                if taken > 0 {
                    return Err(StorageError::Duplicate("Username already exists"));
                }
                let taken: i64 = users::table
                    .filter(users::email.eq(&email))
                    .count()
                    .get_result(conn)?;
                if taken > 0 {
                    return Err(StorageError::Duplicate("Email already registered"));
                }
                let row = NewUser {
                    username: &username,
                    email: &email,
                    name: &name,
                    password_hash: &password_hash,
                };
                Ok(diesel::insert_into(users::table)
                    .values(&row)
                    .returning(User::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }

    pub async fn get_user(&self, user_id: i32) -> Result<Option<User>, StorageError> {
        self.with_conn(move |conn| {
            Ok(users::table
                .find(user_id)
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            Ok(users::table
                .filter(users::username.eq(&username))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Totals are summed from history on every call; nothing is cached.
    pub async fn user_totals(&self, user_id: i32) -> Result<UserTotals, StorageError> {
        self.with_conn(move |conn| Ok(user_totals(conn, user_id)?))
            .await
    }

    // Session helpers for JWT inactivity windows
    pub async fn create_session(&self, jti: &str, user_id: i32) -> Result<(), StorageError> {
        let jti = jti.to_string();
        self.with_conn(move |conn| {
            let new = NewAuthSession {
                jti: &jti,
                user_id,
            };
            diesel::insert_into(auth_sessions::table)
                .values(&new)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn delete_session(&self, jti: &str) -> Result<bool, StorageError> {
        let jti = jti.to_string();
        self.with_conn(move |conn| {
            let deleted = diesel::delete(auth_sessions::table.filter(auth_sessions::jti.eq(&jti)))
                .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Touch session atomically, but only if it hasn't expired.
    /// Returns `true` if the session was found and updated, `false` otherwise.
    pub async fn touch_session_with_cutoff(
        &self,
        jti: &str,
        cutoff: chrono::NaiveDateTime,
    ) -> Result<bool, StorageError> {
        let jti = jti.to_string();
        self.with_conn(move |conn| {
            let now = Utc::now().naive_utc();
            let updated = diesel::update(
                auth_sessions::table
                    .filter(auth_sessions::jti.eq(&jti))
                    .filter(auth_sessions::last_used_at.ge(cutoff)),
            )
            .set(auth_sessions::last_used_at.eq(now))
            .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }
}

pub(super) fn user_totals(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<UserTotals, diesel::result::Error> {
    let completed = charging_sessions::table
        .filter(charging_sessions::user_id.eq(user_id))
        .filter(charging_sessions::status.eq(SessionStatus::Completed.as_str()));
    let (charges, earned, kwh): (i64, Option<i64>, Option<f64>) = completed
        .select((
            count_star(),
            sum(charging_sessions::points_earned),
            sum(charging_sessions::kwh_charged),
        ))
        .first(conn)?;
    let spent: Option<i64> = user_rewards::table
        .filter(user_rewards::user_id.eq(user_id))
        .select(sum(user_rewards::points_spent))
        .first(conn)?;
    Ok(UserTotals {
        total_points: earned.unwrap_or(0) - spent.unwrap_or(0),
        total_charges: charges,
        total_kwh: kwh.unwrap_or(0.0),
    })
}
