//! HTTP integration tests over the in-memory store.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use meme_arena::server::create_app;
use meme_arena::server::identity::{USER_ID_HEADER, USER_NAME_HEADER};
use meme_arena::{ArenaConfig, Dependencies};
use meme_arena_engine::policy::DeletePolicyKind;
use meme_arena_repository::InMemoryArenaRepository;
use serde_json::{Value, json};

fn create_test_server_with(config: ArenaConfig) -> TestServer {
    let dependencies = Dependencies::with_repository(Arc::new(InMemoryArenaRepository::new()), &config);
    TestServer::new(create_app(dependencies.service, config.cors_origins)).unwrap()
}

fn create_test_server() -> TestServer {
    create_test_server_with(ArenaConfig::default())
}

fn as_user(request: TestRequest, user_id: &str) -> TestRequest {
    request
        .add_header(
            HeaderName::from_static(USER_ID_HEADER),
            HeaderValue::from_str(user_id).unwrap(),
        )
        .add_header(
            HeaderName::from_static(USER_NAME_HEADER),
            HeaderValue::from_str(&format!("{user_id} name")).unwrap(),
        )
}

async fn upload(server: &TestServer, user_id: &str, title: &str) -> Value {
    let response = as_user(server.post("/api/memes"), user_id)
        .json(&json!({
            "title": title,
            "media": {
                "url": format!("https://media.example/{title}.png"),
                "content_type": "image/png",
                "size_bytes": 2048
            },
            "tags": ["dev"]
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

async fn vote(server: &TestServer, user_id: &str, meme_id: &str, direction: &str) -> Value {
    let response = as_user(server.post(&format!("/api/memes/{meme_id}/vote")), user_id)
        .json(&json!({ "direction": direction }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

// ============ Health ============

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();

    let response = server.get("/api/health").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

// ============ Memes ============

#[tokio::test]
async fn test_upload_then_list() {
    let server = create_test_server();
    let created = upload(&server, "u1", "first").await;
    upload(&server, "u1", "second").await;

    assert_eq!(created["owner_id"], "u1");
    assert_eq!(created["author"], "u1 name");
    assert_eq!(created["upvotes"], 0);

    let listed = server.get("/api/memes").await.json::<Value>();
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "first"]);
}

#[tokio::test]
async fn test_upload_requires_identity() {
    let server = create_test_server();

    let response = server
        .post("/api/memes")
        .json(&json!({ "title": "t", "media": null }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Authentication required");
}

#[tokio::test]
async fn test_upload_rejects_unsupported_media() {
    let server = create_test_server();

    let response = as_user(server.post("/api/memes"), "u1")
        .json(&json!({
            "title": "doc",
            "media": { "url": "https://media.example/doc.pdf", "content_type": "application/pdf", "size_bytes": 10 }
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_vote_toggle_and_switch() {
    let server = create_test_server();
    let meme = upload(&server, "owner", "votes").await;
    let id = meme["id"].as_str().unwrap();

    let up = vote(&server, "u1", id, "up").await;
    assert_eq!((up["upvotes"].as_i64(), up["downvotes"].as_i64()), (Some(1), Some(0)));
    assert_eq!(up["user_vote"], "up");

    let off = vote(&server, "u1", id, "up").await;
    assert_eq!((off["upvotes"].as_i64(), off["downvotes"].as_i64()), (Some(0), Some(0)));
    assert!(off.get("user_vote").is_none());

    vote(&server, "u1", id, "up").await;
    let switched = vote(&server, "u1", id, "down").await;
    assert_eq!(
        (switched["upvotes"].as_i64(), switched["downvotes"].as_i64()),
        (Some(0), Some(1))
    );
    assert_eq!(switched["user_vote"], "down");
}

#[tokio::test]
async fn test_vote_errors() {
    let server = create_test_server();
    let meme = upload(&server, "owner", "errors").await;
    let id = meme["id"].as_str().unwrap();

    server
        .post(&format!("/api/memes/{id}/vote"))
        .json(&json!({ "direction": "up" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    as_user(server.post("/api/memes/missing/vote"), "u1")
        .json(&json!({ "direction": "up" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_missing_meme() {
    let server = create_test_server();

    let response = server.get("/api/memes/nope").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_delete_open_policy() {
    let server = create_test_server();
    let meme = upload(&server, "owner", "doomed").await;
    let id = meme["id"].as_str().unwrap();

    server
        .delete(&format!("/api/memes/{id}"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    as_user(server.delete(&format!("/api/memes/{id}")), "stranger")
        .await
        .assert_status_ok();
    server
        .get(&format!("/api/memes/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_owner_only_policy() {
    let server = create_test_server_with(ArenaConfig {
        delete_policy: DeletePolicyKind::OwnerOnly,
        ..ArenaConfig::default()
    });
    let meme = upload(&server, "owner", "guarded").await;
    let id = meme["id"].as_str().unwrap();

    as_user(server.delete(&format!("/api/memes/{id}")), "stranger")
        .await
        .assert_status(StatusCode::FORBIDDEN);
    as_user(server.delete(&format!("/api/memes/{id}")), "owner")
        .await
        .assert_status_ok();
}

// ============ Ranking ============

#[tokio::test]
async fn test_leaderboard_ranks_by_net_score() {
    let server = create_test_server();
    let low = upload(&server, "owner", "low").await;
    let high = upload(&server, "owner", "high").await;
    let high_id = high["id"].as_str().unwrap();
    vote(&server, "u1", high_id, "up").await;
    vote(&server, "u2", high_id, "up").await;
    vote(&server, "u3", low["id"].as_str().unwrap(), "down").await;

    let board = server
        .get("/api/memes/leaderboard")
        .add_query_param("limit", 1)
        .await
        .json::<Value>();

    let rows = board.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["rank"], 1);
    assert_eq!(rows[0]["id"], high_id);
    assert_eq!(rows[0]["net_score"], 2);
    assert_eq!(rows[0]["approval_percentage"], 100);
}

#[tokio::test]
async fn test_item_of_the_day() {
    let server = create_test_server();

    let empty = server.get("/api/memes/today").await;
    empty.assert_status_ok();
    assert!(empty.json::<Value>()["meme"].is_null());

    let meme = upload(&server, "owner", "daily").await;
    let today = server
        .get("/api/memes/today")
        .add_query_param("tz_offset_minutes", 120)
        .await
        .json::<Value>();
    assert_eq!(today["meme"]["id"], meme["id"]);

    server
        .get("/api/memes/today")
        .add_query_param("tz_offset_minutes", 100000)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let recomputed = as_user(server.post("/api/memes/today/recompute"), "ops").await;
    recomputed.assert_status_ok();
    assert_eq!(recomputed.json::<Value>()["meme"]["id"], meme["id"]);
}

#[tokio::test]
async fn test_anonymous_recompute_keeps_todays_item() {
    let server = create_test_server();
    let first = upload(&server, "owner", "first").await;
    let today = server.get("/api/memes/today").await.json::<Value>();
    assert_eq!(today["meme"]["id"], first["id"]);

    let second = upload(&server, "owner", "second").await;
    let second_id = second["id"].as_str().unwrap();
    vote(&server, "u1", second_id, "up").await;
    vote(&server, "u2", second_id, "up").await;

    server
        .post("/api/memes/today/recompute")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    let today = server.get("/api/memes/today").await.json::<Value>();
    assert_eq!(today["meme"]["id"], first["id"]);

    let recomputed = as_user(server.post("/api/memes/today/recompute"), "u1").await;
    recomputed.assert_status_ok();
    assert_eq!(recomputed.json::<Value>()["meme"]["id"], second["id"]);
}

#[tokio::test]
async fn test_maintenance_restricted_to_configured_admins() {
    let server = create_test_server_with(ArenaConfig {
        admin_user_ids: vec!["ops".to_string()],
        ..ArenaConfig::default()
    });
    upload(&server, "owner", "only").await;

    as_user(server.post("/api/memes/today/recompute"), "u1")
        .await
        .assert_status(StatusCode::FORBIDDEN);
    as_user(server.post("/api/admin/reconcile"), "u1")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    as_user(server.post("/api/memes/today/recompute"), "ops")
        .await
        .assert_status_ok();
    as_user(server.post("/api/admin/reconcile"), "ops")
        .await
        .assert_status_ok();
}

// ============ Battles ============

#[tokio::test]
async fn test_battle_flow() {
    let server = create_test_server();
    let a = upload(&server, "owner", "a").await;
    let b = upload(&server, "owner", "b").await;

    let pair = as_user(server.get("/api/battle"), "u1").await.json::<Value>();
    let mut ids = vec![
        pair["left"]["id"].as_str().unwrap().to_string(),
        pair["right"]["id"].as_str().unwrap().to_string(),
    ];
    ids.sort();
    let mut expected = vec![a["id"].as_str().unwrap().to_string(), b["id"].as_str().unwrap().to_string()];
    expected.sort();
    assert_eq!(ids, expected);

    let winner = as_user(server.post("/api/battle/vote"), "u1")
        .json(&json!({ "winner_id": a["id"], "loser_id": b["id"] }))
        .await;
    winner.assert_status_ok();
    assert_eq!(winner.json::<Value>()["upvotes"], 1);

    let loser = server.get(&format!("/api/memes/{}", b["id"].as_str().unwrap())).await.json::<Value>();
    assert_eq!(loser["upvotes"], 0);

    let again = as_user(server.post("/api/battle/vote"), "u1")
        .json(&json!({ "winner_id": b["id"], "loser_id": a["id"] }))
        .await;
    again.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_battle_vote_rejects_pair_not_shown() {
    let server = create_test_server();
    let ids: Vec<String> = [
        upload(&server, "owner", "a").await,
        upload(&server, "owner", "b").await,
        upload(&server, "owner", "c").await,
    ]
    .iter()
    .map(|meme| meme["id"].as_str().unwrap().to_string())
    .collect();

    let pair = as_user(server.get("/api/battle"), "u1").await.json::<Value>();
    let left = pair["left"]["id"].as_str().unwrap();
    let right = pair["right"]["id"].as_str().unwrap();
    let outsider = ids.iter().find(|id| *id != left && *id != right).unwrap();

    as_user(server.post("/api/battle/vote"), "u1")
        .json(&json!({ "winner_id": outsider, "loser_id": left }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    as_user(server.post("/api/battle/vote"), "u1")
        .json(&json!({ "winner_id": left, "loser_id": right }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_battle_needs_two_memes() {
    let server = create_test_server();
    upload(&server, "owner", "lonely").await;

    server.get("/api/battle").await.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_battle_skip_returns_new_pair() {
    let server = create_test_server();
    upload(&server, "owner", "a").await;
    upload(&server, "owner", "b").await;

    let response = as_user(server.post("/api/battle/skip"), "u1").await;

    response.assert_status_ok();
    let pair = response.json::<Value>();
    assert_ne!(pair["left"]["id"], pair["right"]["id"]);
}

// ============ Comments ============

#[tokio::test]
async fn test_comments() {
    let server = create_test_server();
    let meme = upload(&server, "owner", "talked-about").await;
    let id = meme["id"].as_str().unwrap();

    let created = as_user(server.post(&format!("/api/memes/{id}/comments")), "u1")
        .json(&json!({ "text": "this is me" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let comment = created.json::<Value>();
    let comment_id = comment["id"].as_str().unwrap();

    let voted = as_user(server.post(&format!("/api/comments/{comment_id}/vote")), "u2")
        .json(&json!({ "direction": "down" }))
        .await
        .json::<Value>();
    assert_eq!(voted["downvotes"], 1);

    let listed = as_user(server.get(&format!("/api/memes/{id}/comments")), "u2")
        .await
        .json::<Value>();
    assert_eq!(listed[0]["text"], "this is me");
    assert_eq!(listed[0]["user_vote"], "down");

    server
        .get("/api/memes/missing/comments")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============ Profile & maintenance ============

#[tokio::test]
async fn test_voter_title() {
    let server = create_test_server();
    let meme = upload(&server, "owner", "Frontend on Fridays").await;

    let anonymous = server.get("/api/users/me/title").await.json::<Value>();
    assert_eq!(anonymous["title"], "Cyber Warrior");

    vote(&server, "u1", meme["id"].as_str().unwrap(), "up").await;
    let titled = as_user(server.get("/api/users/me/title"), "u1").await.json::<Value>();
    assert_eq!(titled["title"], "UI Ninja");
}

#[tokio::test]
async fn test_reconcile_after_votes_reports_nothing() {
    let server = create_test_server();
    let meme = upload(&server, "owner", "steady").await;
    let id = meme["id"].as_str().unwrap();
    vote(&server, "u1", id, "up").await;
    vote(&server, "u2", id, "down").await;
    vote(&server, "u1", id, "down").await;

    server
        .post("/api/admin/reconcile")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    let response = as_user(server.post("/api/admin/reconcile"), "ops").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["repaired"], json!([]));
}
