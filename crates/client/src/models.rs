use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Idea {
    pub id: i32,
    pub idea_name: String,
    #[serde(default)]
    pub user_has_voted: bool,
}

#[derive(Debug, Deserialize)]
pub struct IdeasResponse {
    pub data: Vec<Idea>,
    #[serde(default)]
    pub voted_idea_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub idea_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct VoteResponse {
    pub message: String,
    pub idea: VotedIdea,
}

#[derive(Debug, Deserialize)]
pub struct VotedIdea {
    pub idea_name: String,
    pub votes_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
