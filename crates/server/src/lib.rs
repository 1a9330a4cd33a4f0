//! Idea voting backend.
//!
//! Anonymous visitors vote for ideas, keyed by client address: one vote per
//! idea and at most [`admission::MAX_VOTES_PER_IP`] votes per address.

pub mod admission;
pub mod client_ip;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use store::VoteStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn VoteStore>,
    pub reject_loopback: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self {
            store,
            reject_loopback: false,
        }
    }

    pub fn with_loopback_rejected(mut self, reject: bool) -> Self {
        self.reject_loopback = reject;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/ideas/get", get(routes::get_ideas))
        .route("/api/ideas-votes/get", get(routes::get_ideas_with_votes))
        .route("/api/vote/create", post(routes::create_vote))
        .route("/api/debug/ip", get(routes::ip_info))
        .fallback(routes::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
