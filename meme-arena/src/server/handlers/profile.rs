use axum::Json;
use axum::extract::State;
use meme_arena_shared::types::CounterDrift;
use serde::Serialize;

use crate::errors::ApiResult;
use crate::server::identity::Identity;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct TitleResponse {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub repaired: Vec<CounterDrift>,
}

pub async fn voter_title(State(state): State<AppState>, identity: Identity) -> ApiResult<Json<TitleResponse>> {
    let title = state.service.voter_title(identity.caller()).await?;
    Ok(Json(TitleResponse { title }))
}

pub async fn reconcile(State(state): State<AppState>, identity: Identity) -> ApiResult<Json<ReconcileResponse>> {
    let repaired = state.service.reconcile_counters(identity.caller()).await?;
    Ok(Json(ReconcileResponse { repaired }))
}
