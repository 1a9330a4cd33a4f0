//! PostgreSQL store.
//!
//! `cast_vote` serializes attempts from the same address with a
//! transaction-scoped advisory lock, so the duplicate and limit checks see
//! every committed vote for that address. The `(idea_id, ip_address)` unique
//! constraint backs up the duplicate check.

use std::net::IpAddr;

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};

use super::{StoreError, VoteStore};
use crate::{
    admission::{self, Rejection},
    models::{CastVote, Idea, Vote},
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Id of the idea with exactly this name, retired ones included.
    pub async fn find_idea_by_name(&self, name: &str) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM ideas WHERE idea_name = $1 ORDER BY id LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn add_idea(&self, name: &str) -> Result<Idea, sqlx::Error> {
        sqlx::query_as(
            r#"INSERT INTO ideas (idea_name) VALUES ($1)
               RETURNING id, idea_name, "deletedAt""#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Rejected(Rejection::Duplicate)
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl VoteStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn active_ideas(&self) -> Result<Vec<Idea>, StoreError> {
        let ideas = sqlx::query_as(
            r#"SELECT id, idea_name, "deletedAt" FROM ideas
               WHERE "deletedAt" IS NULL
               ORDER BY id ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ideas)
    }

    async fn voted_idea_ids(&self, ip: IpAddr) -> Result<Vec<i32>, StoreError> {
        let ids = sqlx::query_scalar(
            "SELECT DISTINCT idea_id FROM votes WHERE ip_address = $1 ORDER BY idea_id",
        )
        .bind(ip.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn cast_vote(&self, idea_id: i32, ip: IpAddr) -> Result<CastVote, StoreError> {
        let ip = ip.to_string();
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&ip)
            .execute(&mut *tx)
            .await?;

        let idea: Option<Idea> =
            sqlx::query_as(r#"SELECT id, idea_name, "deletedAt" FROM ideas WHERE id = $1"#)
                .bind(idea_id)
                .fetch_optional(&mut *tx)
                .await?;
        let idea = admission::require_active(idea)?;

        let already_voted: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM votes WHERE idea_id = $1 AND ip_address = $2)",
        )
        .bind(idea_id)
        .bind(&ip)
        .fetch_one(&mut *tx)
        .await?;
        admission::require_first_vote(already_voted)?;

        let votes_cast: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE ip_address = $1")
            .bind(&ip)
            .fetch_one(&mut *tx)
            .await?;
        admission::require_under_limit(votes_cast)?;

        let vote: Vote = sqlx::query_as(
            r#"INSERT INTO votes (idea_id, ip_address) VALUES ($1, $2)
               RETURNING id, idea_id, ip_address, "createdAt""#,
        )
        .bind(idea_id)
        .bind(&ip)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        let idea_votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE idea_id = $1")
            .bind(idea_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CastVote {
            vote,
            idea,
            idea_votes,
        })
    }
}
