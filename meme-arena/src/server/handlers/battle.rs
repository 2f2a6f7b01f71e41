use axum::Json;
use axum::extract::State;
use meme_arena_shared::types::Meme;
use serde::{Deserialize, Serialize};

use crate::errors::ApiResult;
use crate::server::identity::Identity;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct BattlePair {
    pub left: Meme,
    pub right: Meme,
}

#[derive(Debug, Deserialize)]
pub struct BattleVoteBody {
    pub winner_id: String,
    pub loser_id: String,
}

async fn next_pair(state: &AppState, identity: &Identity) -> ApiResult<Json<BattlePair>> {
    let (left, right) = state.service.battle_pair(identity.caller()).await?;
    Ok(Json(BattlePair { left, right }))
}

pub async fn battle_pair(State(state): State<AppState>, identity: Identity) -> ApiResult<Json<BattlePair>> {
    next_pair(&state, &identity).await
}

/// Judges the presented pair and returns the winner with its new counters.
pub async fn battle_vote(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<BattleVoteBody>,
) -> ApiResult<Json<Meme>> {
    Ok(Json(
        state
            .service
            .battle_vote(identity.caller(), &body.winner_id, &body.loser_id)
            .await?,
    ))
}

/// Skips the presented pair and draws a new one.
pub async fn battle_skip(State(state): State<AppState>, identity: Identity) -> ApiResult<Json<BattlePair>> {
    state.service.battle_skip(identity.caller()).await?;
    next_pair(&state, &identity).await
}
