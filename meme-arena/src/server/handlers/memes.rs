use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use meme_arena_engine::daily::local_date;
use meme_arena_engine::ranking::{self, DEFAULT_LEADERBOARD_LIMIT, LeaderboardEntry};
use meme_arena_engine::service::CreateMemeRequest;
use meme_arena_shared::types::{MediaRef, Meme, VoteDirection};
use serde::{Deserialize, Serialize};

use crate::errors::ApiResult;
use crate::server::identity::Identity;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateMemeBody {
    pub title: String,
    pub media: Option<MediaRef>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteBody {
    pub direction: VoteDirection,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// Caller's offset east of UTC, in minutes.
    pub tz_offset_minutes: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct DailyResponse {
    pub date: NaiveDate,
    pub meme: Option<Meme>,
}

pub async fn list_memes(State(state): State<AppState>, identity: Identity) -> ApiResult<Json<Vec<Meme>>> {
    Ok(Json(state.service.list_memes(identity.caller()).await?))
}

pub async fn create_meme(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreateMemeBody>,
) -> ApiResult<(StatusCode, Json<Meme>)> {
    let request = CreateMemeRequest {
        title: body.title,
        media: body.media,
        tags: body.tags,
    };
    let meme = state.service.create_meme(identity.caller(), request).await?;
    Ok((StatusCode::CREATED, Json(meme)))
}

pub async fn get_meme(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<Meme>> {
    Ok(Json(state.service.get_meme(&id, identity.caller()).await?))
}

pub async fn delete_meme(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<Meme>> {
    Ok(Json(state.service.delete_meme(identity.caller(), &id).await?))
}

pub async fn vote_meme(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<Meme>> {
    Ok(Json(
        state
            .service
            .vote_meme(&id, identity.caller(), body.direction)
            .await?,
    ))
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let ranked = state.service.leaderboard(limit).await?;
    Ok(Json(ranking::entries(ranked)))
}

pub async fn item_of_the_day(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> ApiResult<Json<DailyResponse>> {
    let date = local_date(Utc::now(), query.tz_offset_minutes)?;
    let meme = state.service.item_of_the_day(date).await?;
    Ok(Json(DailyResponse { date, meme }))
}

pub async fn recompute_item_of_the_day(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<DailyQuery>,
) -> ApiResult<Json<DailyResponse>> {
    let date = local_date(Utc::now(), query.tz_offset_minutes)?;
    let meme = state.service.recompute_item_of_the_day(identity.caller(), date).await?;
    Ok(Json(DailyResponse { date, meme }))
}
