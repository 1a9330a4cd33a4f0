//! Idea and vote persistence.
//!
//! Handlers only see [`VoteStore`]; the server wires in [`PgStore`], tests and
//! local demos use [`MemoryStore`].

use std::net::IpAddr;

use thiserror::Error;

use crate::{
    admission::Rejection,
    models::{CastVote, Idea},
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait VoteStore: Send + Sync {
    /// Checks the backing storage is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Ideas without a soft-delete marker, ordered by id.
    async fn active_ideas(&self) -> Result<Vec<Idea>, StoreError>;

    /// Ids of every idea `ip` has voted for, ascending.
    async fn voted_idea_ids(&self, ip: IpAddr) -> Result<Vec<i32>, StoreError>;

    /// Runs the admission checks and records the vote as one atomic step.
    ///
    /// A rejected attempt leaves the store untouched and comes back as
    /// [`StoreError::Rejected`].
    async fn cast_vote(&self, idea_id: i32, ip: IpAddr) -> Result<CastVote, StoreError>;
}
