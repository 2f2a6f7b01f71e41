use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use meme_arena_shared::types::Comment;
use serde::Deserialize;

use super::memes::VoteBody;
use crate::errors::ApiResult;
use crate::server::identity::Identity;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentBody {
    pub text: String,
}

pub async fn list_comments(
    State(state): State<AppState>,
    identity: Identity,
    Path(meme_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(
        state
            .service
            .list_comments(&meme_id, identity.caller())
            .await?,
    ))
}

pub async fn create_comment(
    State(state): State<AppState>,
    identity: Identity,
    Path(meme_id): Path<String>,
    Json(body): Json<CreateCommentBody>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .service
        .create_comment(identity.caller(), &meme_id, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn vote_comment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<Comment>> {
    Ok(Json(
        state
            .service
            .vote_comment(&id, identity.caller(), body.direction)
            .await?,
    ))
}
