use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::admission::Rejection;

/// Longest idea name the `ideas.idea_name` column accepts.
pub const MAX_IDEA_NAME_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Idea {
    pub id: i32,
    pub idea_name: String,
    #[serde(rename = "deletedAt")]
    #[sqlx(rename = "deletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Idea {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: i32,
    pub idea_id: i32,
    pub ip_address: String,
    #[serde(rename = "createdAt")]
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// What a successful `cast_vote` hands back to the handler.
#[derive(Debug, Clone)]
pub struct CastVote {
    pub vote: Vote,
    pub idea: Idea,
    /// Votes recorded for `idea`, including this one.
    pub idea_votes: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub idea_id: Option<Number>,
}

impl VoteRequest {
    /// `None` when the id is absent, null or zero. A number that cannot name
    /// an `ideas` row (fractional, or outside `i32`) is reported as a missing
    /// idea rather than a malformed request.
    pub fn idea_id(&self) -> Option<Result<i32, Rejection>> {
        let number = self.idea_id.as_ref()?;

        if let Some(n) = number.as_i64() {
            if n == 0 {
                return None;
            }
            return Some(i32::try_from(n).map_err(|_| Rejection::NotFound));
        }
        if number.is_u64() {
            return Some(Err(Rejection::NotFound));
        }

        let f = number.as_f64()?;
        if f == 0.0 {
            return None;
        }
        if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
            Some(Ok(f as i32))
        } else {
            Some(Err(Rejection::NotFound))
        }
    }
}

// ===== Responses =====

#[derive(Debug, Serialize)]
pub struct IdeasResponse {
    pub success: bool,
    pub data: Vec<Idea>,
}

#[derive(Debug, Serialize)]
pub struct IdeaWithVote {
    pub id: i32,
    pub idea_name: String,
    #[serde(rename = "deletedAt")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub user_has_voted: bool,
}

#[derive(Debug, Serialize)]
pub struct IdeasVotesResponse {
    pub success: bool,
    pub data: Vec<IdeaWithVote>,
    pub voted_idea_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct VoteSummary {
    pub id: i32,
    pub idea_id: i32,
    pub ip_address: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct IdeaSummary {
    pub id: i32,
    pub idea_name: String,
    /// Total votes for this idea, the new one included. Earlier versions of
    /// the API put the voter's own prior vote count here.
    pub votes_count: i64,
}

#[derive(Debug, Serialize)]
pub struct VoteCreatedResponse {
    pub success: bool,
    pub message: String,
    pub vote: VoteSummary,
    pub idea: IdeaSummary,
}

impl From<CastVote> for VoteCreatedResponse {
    fn from(cast: CastVote) -> Self {
        Self {
            success: true,
            message: "Vote accepted".to_string(),
            vote: VoteSummary {
                id: cast.vote.id,
                idea_id: cast.vote.idea_id,
                ip_address: cast.vote.ip_address,
                created_at: cast.vote.created_at,
            },
            idea: IdeaSummary {
                id: cast.idea.id,
                idea_name: cast.idea.idea_name,
                votes_count: cast.idea_votes,
            },
        }
    }
}

/// Trims an idea name and checks it fits the column.
pub fn normalize_idea_name(raw: &str) -> Result<&str, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("idea name is empty".to_string());
    }
    let chars = name.chars().count();
    if chars > MAX_IDEA_NAME_CHARS {
        return Err(format!(
            "idea name is {chars} characters, the limit is {MAX_IDEA_NAME_CHARS}"
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idea_names_are_trimmed_and_bounded() {
        assert_eq!(normalize_idea_name("  Dark mode \n"), Ok("Dark mode"));
        assert!(normalize_idea_name("   ").is_err());
        assert!(normalize_idea_name(&"x".repeat(MAX_IDEA_NAME_CHARS)).is_ok());
        assert!(normalize_idea_name(&"x".repeat(MAX_IDEA_NAME_CHARS + 1)).is_err());
    }

    #[test]
    fn multibyte_names_are_counted_in_chars() {
        let name = "ё".repeat(MAX_IDEA_NAME_CHARS);
        assert_eq!(normalize_idea_name(&name), Ok(name.as_str()));
    }

    #[test]
    fn idea_serializes_with_camel_case_soft_delete_marker() {
        let idea = Idea {
            id: 1,
            idea_name: "A".into(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&idea).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 1, "idea_name": "A", "deletedAt": null })
        );
    }

    #[test]
    fn vote_request_reads_camel_case_idea_id() {
        let req: VoteRequest = serde_json::from_str(r#"{"ideaId": 7}"#).unwrap();
        assert_eq!(req.idea_id(), Some(Ok(7)));
        let req: VoteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.idea_id(), None);
    }

    fn idea_id_of(body: &str) -> Option<Result<i32, Rejection>> {
        serde_json::from_str::<VoteRequest>(body).unwrap().idea_id()
    }

    #[test]
    fn null_and_zero_idea_ids_count_as_missing() {
        assert_eq!(idea_id_of(r#"{"ideaId": null}"#), None);
        assert_eq!(idea_id_of(r#"{"ideaId": 0}"#), None);
        assert_eq!(idea_id_of(r#"{"ideaId": 0.0}"#), None);
    }

    #[test]
    fn integral_floats_name_the_same_idea() {
        assert_eq!(idea_id_of(r#"{"ideaId": 1.0}"#), Some(Ok(1)));
        assert_eq!(idea_id_of(r#"{"ideaId": -1}"#), Some(Ok(-1)));
    }

    #[test]
    fn unrepresentable_idea_ids_are_not_found() {
        for body in [
            r#"{"ideaId": 3000000000}"#,
            r#"{"ideaId": -3000000000}"#,
            r#"{"ideaId": 18446744073709551615}"#,
            r#"{"ideaId": 1.5}"#,
            r#"{"ideaId": 1e300}"#,
        ] {
            assert_eq!(idea_id_of(body), Some(Err(Rejection::NotFound)), "{body}");
        }
    }
}
