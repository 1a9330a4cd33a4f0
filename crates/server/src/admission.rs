//! Vote admission rules.
//!
//! Each check is a pure function over what the store has already looked up.
//! Stores run them in order and stop at the first rejection, so a rejected
//! attempt never reaches the insert.

use thiserror::Error;

use crate::models::Idea;

/// Votes a single client address may hold across all ideas.
pub const MAX_VOTES_PER_IP: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Idea not found")]
    NotFound,
    #[error("You have already voted for this idea")]
    Duplicate,
    #[error("Vote limit exceeded")]
    LimitExceeded,
}

/// The idea must exist and must not be soft-deleted.
pub fn require_active(idea: Option<Idea>) -> Result<Idea, Rejection> {
    match idea {
        Some(idea) if idea.is_active() => Ok(idea),
        _ => Err(Rejection::NotFound),
    }
}

pub fn require_first_vote(already_voted: bool) -> Result<(), Rejection> {
    if already_voted {
        Err(Rejection::Duplicate)
    } else {
        Ok(())
    }
}

/// `votes_cast` is the number of votes this address holds before the insert.
pub fn require_under_limit(votes_cast: i64) -> Result<(), Rejection> {
    if votes_cast >= MAX_VOTES_PER_IP {
        Err(Rejection::LimitExceeded)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn idea(deleted: bool) -> Idea {
        Idea {
            id: 3,
            idea_name: "Offline mode".into(),
            deleted_at: deleted.then(Utc::now),
        }
    }

    #[test]
    fn missing_and_retired_ideas_are_not_found() {
        assert_eq!(require_active(None), Err(Rejection::NotFound));
        assert_eq!(require_active(Some(idea(true))), Err(Rejection::NotFound));
        assert_eq!(require_active(Some(idea(false))), Ok(idea(false)));
    }

    #[test]
    fn second_vote_for_same_idea_is_a_duplicate() {
        assert_eq!(require_first_vote(false), Ok(()));
        assert_eq!(require_first_vote(true), Err(Rejection::Duplicate));
    }

    #[test]
    fn tenth_vote_is_allowed_eleventh_is_not() {
        assert_eq!(require_under_limit(0), Ok(()));
        assert_eq!(require_under_limit(MAX_VOTES_PER_IP - 1), Ok(()));
        assert_eq!(
            require_under_limit(MAX_VOTES_PER_IP),
            Err(Rejection::LimitExceeded)
        );
        assert_eq!(
            require_under_limit(MAX_VOTES_PER_IP + 5),
            Err(Rejection::LimitExceeded)
        );
    }
}
