use chrono::Utc;
use diesel::prelude::*;
use diesel::upsert::excluded;
use tracing::info;
use voltmap_shared::domain::{RewardDefinition, balance_after_claim};

use super::models::{NewReward, NewUserReward, Reward, UserReward};
use super::schema::{rewards, user_rewards, users};
use super::users::user_totals;
use super::{StorageError, Store};

impl Store {
    /// Inserts or refreshes catalog entries keyed by name. Entries missing
    /// from `defs` are left alone so existing claims keep their reward.
    pub async fn seed_rewards(&self, defs: &[RewardDefinition]) -> Result<usize, StorageError> {
        let defs = defs.to_vec();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let mut n = 0;
                for def in &defs {
                    if def.points_required < 0 {
                        return Err(StorageError::InvalidInput(format!(
                            "reward {} has negative points_required",
                            def.name
                        )));
                    }
                    let row = NewReward {
                        name: &def.name,
                        description: &def.description,
                        points_required: def.points_required,
                        kind: &def.kind,
                        value: def.value,
                    };
                    n += diesel::insert_into(rewards::table)
                        .values(&row)
                        .on_conflict(rewards::name)
                        .do_update()
                        .set((
                            rewards::description.eq(excluded(rewards::description)),
                            rewards::points_required.eq(excluded(rewards::points_required)),
                            rewards::kind.eq(excluded(rewards::kind)),
                            rewards::value.eq(excluded(rewards::value)),
                        ))
                        .execute(conn)?;
                }
                info!(count = n, "reward catalog seeded");
                Ok(n)
            })
        })
        .await
    }

    pub async fn list_rewards(&self) -> Result<Vec<Reward>, StorageError> {
        self.with_conn(|conn| {
            Ok(rewards::table
                .order((rewards::points_required.asc(), rewards::id.asc()))
                .select(Reward::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn get_reward(&self, reward_id: i32) -> Result<Option<Reward>, StorageError> {
        self.with_conn(move |conn| {
            Ok(rewards::table
                .find(reward_id)
                .select(Reward::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Spends the reward's cost from the user's balance. The balance check
    /// and the insert share one write lock, so two concurrent claims cannot
    /// both pass against the same points.
    pub async fn claim_reward(
        &self,
        user_id: i32,
        reward_id: i32,
    ) -> Result<UserReward, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let user_found: i64 = users::table
                    .filter(users::id.eq(user_id))
                    .count()
                    .get_result(conn)?;
                if user_found == 0 {
                    return Err(StorageError::NotFound("User not found"));
                }
                let reward = rewards::table
                    .find(reward_id)
                    .select(Reward::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or(StorageError::NotFound("Reward not found"))?;

                let balance = user_totals(conn, user_id)?.total_points;
                if balance_after_claim(balance, reward.points_required).is_none() {
                    return Err(StorageError::InsufficientPoints {
                        balance,
                        required: reward.points_required,
                    });
                }
                Ok(diesel::insert_into(user_rewards::table)
                    .values(&NewUserReward {
                        user_id,
                        reward_id,
                        points_spent: reward.points_required,
                    })
                    .returning(UserReward::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }

    pub async fn get_user_reward(
        &self,
        user_reward_id: i32,
    ) -> Result<Option<UserReward>, StorageError> {
        self.with_conn(move |conn| {
            Ok(user_rewards::table
                .find(user_reward_id)
                .select(UserReward::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    /// Marks a claimed reward as used. Already-used rows come back untouched.
    pub async fn use_reward(&self, user_reward_id: i32) -> Result<UserReward, StorageError> {
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| {
                let row = user_rewards::table
                    .find(user_reward_id)
                    .select(UserReward::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or(StorageError::NotFound("User reward not found"))?;
                if row.is_used {
                    return Ok(row);
                }
                Ok(diesel::update(user_rewards::table.find(user_reward_id))
                    .set((
                        user_rewards::is_used.eq(true),
                        user_rewards::used_at.eq(Some(Utc::now().naive_utc())),
                    ))
                    .returning(UserReward::as_returning())
                    .get_result(conn)?)
            })
        })
        .await
    }

    pub async fn list_user_rewards(
        &self,
        user_id: i32,
    ) -> Result<Vec<(UserReward, Reward)>, StorageError> {
        self.with_conn(move |conn| {
            Ok(user_rewards::table
                .inner_join(rewards::table)
                .filter(user_rewards::user_id.eq(user_id))
                .order((user_rewards::created_at.desc(), user_rewards::id.desc()))
                .select((UserReward::as_select(), Reward::as_select()))
                .load(conn)?)
        })
        .await
    }
}
