use std::{
    net::IpAddr,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{StoreError, VoteStore};
use crate::{
    admission,
    models::{CastVote, Idea, Vote},
};

/// In-process store with the same admission behavior as [`super::PgStore`].
/// Holding the lock across the checks and the insert makes `cast_vote` atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    ideas: Vec<Idea>,
    votes: Vec<Vote>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ideas<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        for name in names {
            store.add_idea(name);
        }
        store
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_idea(&self, name: impl Into<String>) -> Idea {
        let mut tables = self.tables();
        let idea = Idea {
            id: tables.ideas.len() as i32 + 1,
            idea_name: name.into(),
            deleted_at: None,
        };
        tables.ideas.push(idea.clone());
        idea
    }

    /// Soft-deletes an idea. Returns false if no such idea exists.
    pub fn retire_idea(&self, id: i32) -> bool {
        let mut tables = self.tables();
        match tables.ideas.iter_mut().find(|idea| idea.id == id) {
            Some(idea) => {
                idea.deleted_at.get_or_insert_with(Utc::now);
                true
            }
            None => false,
        }
    }

    pub fn votes(&self) -> Vec<Vote> {
        self.tables().votes.clone()
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn active_ideas(&self) -> Result<Vec<Idea>, StoreError> {
        let mut ideas: Vec<Idea> = self
            .tables()
            .ideas
            .iter()
            .filter(|idea| idea.is_active())
            .cloned()
            .collect();
        ideas.sort_by_key(|idea| idea.id);
        Ok(ideas)
    }

    async fn voted_idea_ids(&self, ip: IpAddr) -> Result<Vec<i32>, StoreError> {
        let ip = ip.to_string();
        let mut ids: Vec<i32> = self
            .tables()
            .votes
            .iter()
            .filter(|vote| vote.ip_address == ip)
            .map(|vote| vote.idea_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn cast_vote(&self, idea_id: i32, ip: IpAddr) -> Result<CastVote, StoreError> {
        let ip = ip.to_string();
        let mut tables = self.tables();

        let idea = tables.ideas.iter().find(|idea| idea.id == idea_id).cloned();
        let idea = admission::require_active(idea)?;

        let already_voted = tables
            .votes
            .iter()
            .any(|vote| vote.idea_id == idea_id && vote.ip_address == ip);
        admission::require_first_vote(already_voted)?;

        let votes_cast = tables.votes.iter().filter(|vote| vote.ip_address == ip).count();
        admission::require_under_limit(votes_cast as i64)?;

        let vote = Vote {
            id: tables.votes.len() as i32 + 1,
            idea_id,
            ip_address: ip,
            created_at: Utc::now(),
        };
        tables.votes.push(vote.clone());

        let idea_votes = tables.votes.iter().filter(|v| v.idea_id == idea_id).count() as i64;

        Ok(CastVote {
            vote,
            idea,
            idea_votes,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::admission::{MAX_VOTES_PER_IP, Rejection};

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn rejection(result: Result<CastVote, StoreError>) -> Rejection {
        match result {
            Err(StoreError::Rejected(rejection)) => rejection,
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_vote_keeps_a_single_row() {
        let store = MemoryStore::with_ideas(["A"]);

        let cast = store.cast_vote(1, ip("9.9.9.9")).await.unwrap();
        assert_eq!(cast.idea_votes, 1);
        assert_eq!(
            rejection(store.cast_vote(1, ip("9.9.9.9")).await),
            Rejection::Duplicate
        );
        assert_eq!(store.votes().len(), 1);
    }

    #[tokio::test]
    async fn eleventh_idea_hits_the_limit() {
        let store = MemoryStore::with_ideas((1..=12).map(|n| format!("idea {n}")));
        let voter = ip("2001:db8::7");

        for id in 1..=MAX_VOTES_PER_IP as i32 {
            store.cast_vote(id, voter).await.unwrap();
        }
        assert_eq!(
            rejection(store.cast_vote(11, voter).await),
            Rejection::LimitExceeded
        );
        assert_eq!(
            rejection(store.cast_vote(12, voter).await),
            Rejection::LimitExceeded
        );
        assert_eq!(store.votes().len(), MAX_VOTES_PER_IP as usize);

        // another address is unaffected
        store.cast_vote(11, ip("9.9.9.9")).await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_is_reported_before_limit() {
        let store = MemoryStore::with_ideas((1..=11).map(|n| format!("idea {n}")));
        let voter = ip("9.9.9.9");
        for id in 1..=10 {
            store.cast_vote(id, voter).await.unwrap();
        }
        assert_eq!(
            rejection(store.cast_vote(3, voter).await),
            Rejection::Duplicate
        );
    }

    #[tokio::test]
    async fn retired_and_unknown_ideas_are_not_found() {
        let store = MemoryStore::with_ideas(["A", "B"]);
        assert!(store.retire_idea(2));
        assert!(!store.retire_idea(99));

        assert_eq!(
            rejection(store.cast_vote(2, ip("9.9.9.9")).await),
            Rejection::NotFound
        );
        assert_eq!(
            rejection(store.cast_vote(99, ip("9.9.9.9")).await),
            Rejection::NotFound
        );
        assert!(store.votes().is_empty());

        let active = store.active_ideas().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].idea_name, "A");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_attempts_for_one_idea_store_one_vote() {
        let store = Arc::new(MemoryStore::with_ideas(["A"]));

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.cast_vote(1, ip("9.9.9.9")).await })
            })
            .collect();

        let mut accepted = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert!(matches!(err, StoreError::Rejected(Rejection::Duplicate))),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.votes().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_attempts_never_pass_the_limit() {
        let store = Arc::new(MemoryStore::with_ideas((1..=20).map(|n| format!("idea {n}"))));

        let attempts: Vec<_> = (1..=20)
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move { store.cast_vote(id, ip("9.9.9.9")).await })
            })
            .collect();

        let mut accepted = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => {
                    assert!(matches!(err, StoreError::Rejected(Rejection::LimitExceeded)))
                }
            }
        }
        assert_eq!(accepted, MAX_VOTES_PER_IP);
        assert_eq!(store.votes().len(), MAX_VOTES_PER_IP as usize);
    }

    #[tokio::test]
    async fn voted_ids_include_retired_ideas() {
        let store = MemoryStore::with_ideas(["A", "B", "C"]);
        let voter = ip("9.9.9.9");
        store.cast_vote(3, voter).await.unwrap();
        store.cast_vote(1, voter).await.unwrap();
        store.retire_idea(3);

        assert_eq!(store.voted_idea_ids(voter).await.unwrap(), vec![1, 3]);
        assert!(store.voted_idea_ids(ip("1.1.1.1")).await.unwrap().is_empty());
    }
}
