//! HTTP server setup and routing.
pub mod handlers;
pub mod identity;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use meme_arena_engine::ArenaService;
use tracing::info;

use self::handlers::{battle, comments, events, memes, profile};
use self::state::AppState;
use crate::config::create_cors_layer;

/// Create the Axum application router with all routes and middleware.
pub fn create_app(service: Arc<ArenaService>, cors_origins: Vec<HeaderValue>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/memes", get(memes::list_memes).post(memes::create_meme))
        .route("/api/memes/leaderboard", get(memes::leaderboard))
        .route("/api/memes/today", get(memes::item_of_the_day))
        .route("/api/memes/today/recompute", post(memes::recompute_item_of_the_day))
        .route("/api/memes/:id", get(memes::get_meme).delete(memes::delete_meme))
        .route("/api/memes/:id/vote", post(memes::vote_meme))
        .route(
            "/api/memes/:id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route("/api/comments/:id/vote", post(comments::vote_comment))
        .route("/api/battle", get(battle::battle_pair))
        .route("/api/battle/vote", post(battle::battle_vote))
        .route("/api/battle/skip", post(battle::battle_skip))
        .route("/api/users/me/title", get(profile::voter_title))
        .route("/api/admin/reconcile", post(profile::reconcile))
        .route("/api/events", get(events::vote_events))
        .layer(create_cors_layer(cors_origins))
        .with_state(state)
}

/// Run the server on the specified address until Ctrl-C.
pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Server listening on {}", addr);
    info!("- API: http://{}/api/memes", addr);
    info!("- Health endpoint: http://{}/api/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
