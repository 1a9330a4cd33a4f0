use std::{collections::HashSet, net::IpAddr};

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    AppState,
    client_ip::{ClientIp, FORWARDED_FOR, REAL_IP, header_str},
    error::AppError,
    models::{IdeaWithVote, IdeasResponse, IdeasVotesResponse, VoteCreatedResponse, VoteRequest},
    store::StoreError,
};

impl AppState {
    fn admit_ip(&self, ip: IpAddr) -> Result<IpAddr, AppError> {
        if self.reject_loopback && ip.is_loopback() {
            return Err(AppError::unresolved_ip());
        }
        Ok(ip)
    }
}

// ===== Ideas =====

pub async fn get_ideas(State(state): State<AppState>) -> Result<Json<IdeasResponse>, AppError> {
    let ideas = state.store.active_ideas().await?;

    Ok(Json(IdeasResponse {
        success: true,
        data: ideas,
    }))
}

pub async fn get_ideas_with_votes(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
) -> Result<Json<IdeasVotesResponse>, AppError> {
    let ip = state.admit_ip(ip)?;

    let ideas = state.store.active_ideas().await?;
    let voted_idea_ids = state.store.voted_idea_ids(ip).await?;
    let voted: HashSet<i32> = voted_idea_ids.iter().copied().collect();

    let data = ideas
        .into_iter()
        .map(|idea| IdeaWithVote {
            user_has_voted: voted.contains(&idea.id),
            id: idea.id,
            idea_name: idea.idea_name,
            deleted_at: idea.deleted_at,
        })
        .collect();

    Ok(Json(IdeasVotesResponse {
        success: true,
        data,
        voted_idea_ids,
    }))
}

// ===== Votes =====

pub async fn create_vote(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteCreatedResponse>), AppError> {
    let ip = state.admit_ip(ip)?;
    let Json(request) = payload?;

    let idea_id = request
        .idea_id()
        .ok_or_else(|| AppError::BadRequest("Idea ID is required".into()))?
        .map_err(StoreError::from)?;

    let cast = state.store.cast_vote(idea_id, ip).await.inspect_err(|err| {
        tracing::debug!(idea_id, %ip, "Vote rejected: {err}");
    })?;
    tracing::info!(idea_id, %ip, vote_id = cast.vote.id, "Vote recorded");

    Ok((StatusCode::CREATED, Json(cast.into())))
}

// ===== Diagnostics =====

pub async fn ip_info(client: Option<ClientIp>, headers: HeaderMap) -> impl IntoResponse {
    Json(json!({
        "ip": client.map(|ClientIp(ip)| ip.to_string()),
        "headers": {
            "x-forwarded-for": header_str(&headers, FORWARDED_FOR),
            "x-real-ip": header_str(&headers, REAL_IP),
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": "connected"
            })),
        ),
        Err(err) => {
            tracing::warn!("Health check failed: {err}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "database": "disconnected"
                })),
            )
        }
    }
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })))
}
