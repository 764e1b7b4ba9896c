//! End-to-end flow over HTTP against an in-process server. Skipped cleanly
//! when DATABASE_URL is not set.

mod common;

use uuid::Uuid;

macro_rules! require_pool {
    () => {
        match common::try_pool().await {
            Some(pool) => pool,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn first_contact_send_and_read_flow() {
    let pool = require_pool!();
    let u1 = common::insert_user(&pool, "Bu Sari", "staff").await;
    let u2 = common::insert_user(&pool, "Pak Budi", "teacher").await;
    let (state, _blobs, registry) = common::make_state(pool.clone());
    let base = common::start_app(state).await;
    let client = reqwest::Client::new();

    // Both participants are subscribed to the change feed.
    let mut events_u2 = registry.subscribe(u2).await;

    // U1 opens a conversation with U2.
    let resp = client
        .post(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(u1))
        .json(&serde_json::json!({"other_user": u2}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let v: serde_json::Value = resp.json().await.unwrap();
    let conv = Uuid::parse_str(v["id"].as_str().unwrap()).unwrap();

    // U1 sends "halo".
    let resp = client
        .post(format!("{base}/api/v1/conversations/{conv}/messages"))
        .header("Authorization", common::bearer(u1))
        .json(&serde_json::json!({"body": "halo"}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let msg: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(msg["body"], "halo");
    assert_eq!(msg["type"], "text");
    assert_eq!(msg["is_read"], false);

    // U2 was notified at least once (conversation insert, message insert).
    assert!(events_u2.try_recv().is_ok());

    // U2's list shows one unread for the conversation.
    let resp = client
        .get(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(u2))
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = resp.json().await.unwrap();
    let entry = list["conversations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == conv.to_string())
        .unwrap();
    assert_eq!(entry["unread_count"], 1);
    assert_eq!(entry["last_message_preview"], "halo");

    // U2 opens the conversation and marks it read.
    let resp = client
        .post(format!("{base}/api/v1/conversations/{conv}/read"))
        .header("Authorization", common::bearer(u2))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = client
        .get(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(u2))
        .send()
        .await
        .unwrap();
    let list: serde_json::Value = resp.json().await.unwrap();
    let entry = list["conversations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == conv.to_string())
        .unwrap();
    assert_eq!(entry["unread_count"], 0);
}

#[tokio::test]
async fn concurrent_get_or_create_over_http_returns_one_id() {
    let pool = require_pool!();
    let u1 = common::insert_user(&pool, "A", "staff").await;
    let u2 = common::insert_user(&pool, "B", "staff").await;
    let (state, _blobs, _registry) = common::make_state(pool.clone());
    let base = common::start_app(state).await;
    let client = reqwest::Client::new();

    let req_a = client
        .post(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(u1))
        .json(&serde_json::json!({"other_user": u2}))
        .send();
    let req_b = client
        .post(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(u2))
        .json(&serde_json::json!({"other_user": u1}))
        .send();

    let (ra, rb) = tokio::join!(req_a, req_b);
    let va: serde_json::Value = ra.unwrap().json().await.unwrap();
    let vb: serde_json::Value = rb.unwrap().json().await.unwrap();
    assert_eq!(va["id"], vb["id"]);
}

#[tokio::test]
async fn attachment_staging_then_send_image() {
    let pool = require_pool!();
    let u1 = common::insert_user(&pool, "A", "staff").await;
    let u2 = common::insert_user(&pool, "B", "staff").await;
    let (state, blobs, _registry) = common::make_state(pool.clone());
    let base = common::start_app(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(u1))
        .json(&serde_json::json!({"other_user": u2}))
        .send()
        .await
        .unwrap();
    let v: serde_json::Value = resp.json().await.unwrap();
    let conv = Uuid::parse_str(v["id"].as_str().unwrap()).unwrap();

    // Stage a 2 MB png.
    let resp = client
        .post(format!("{base}/api/v1/attachments?filename=foto.png"))
        .header("Authorization", common::bearer(u1))
        .header("Content-Type", "image/png")
        .body(vec![0u8; 2 * 1024 * 1024])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let staged: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(staged["mime"], "image/png");
    assert_eq!(blobs.len().await, 1);

    // Empty body plus the staged attachment is a valid image message.
    let resp = client
        .post(format!("{base}/api/v1/conversations/{conv}/messages"))
        .header("Authorization", common::bearer(u1))
        .json(&serde_json::json!({"attachment": staged}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let msg: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(msg["type"], "image");
}

#[tokio::test]
async fn oversize_attachment_fails_before_any_persistence() {
    let pool = require_pool!();
    let u1 = common::insert_user(&pool, "A", "staff").await;
    let (state, blobs, _registry) = common::make_state(pool.clone());
    let base = common::start_app(state).await;

    // 15 MB against the 10 MB cap.
    let resp = reqwest::Client::new()
        .post(format!("{base}/api/v1/attachments?filename=big.pdf"))
        .header("Authorization", common::bearer(u1))
        .header("Content-Type", "application/pdf")
        .body(vec![0u8; 15 * 1024 * 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn validation_and_permission_errors_over_http() {
    let pool = require_pool!();
    let u1 = common::insert_user(&pool, "A", "staff").await;
    let u2 = common::insert_user(&pool, "B", "staff").await;
    let u3 = common::insert_user(&pool, "C", "staff").await;
    let (state, _blobs, _registry) = common::make_state(pool.clone());
    let base = common::start_app(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(u1))
        .json(&serde_json::json!({"other_user": u2}))
        .send()
        .await
        .unwrap();
    let v: serde_json::Value = resp.json().await.unwrap();
    let conv = Uuid::parse_str(v["id"].as_str().unwrap()).unwrap();

    // Empty body, no attachment.
    let resp = client
        .post(format!("{base}/api/v1/conversations/{conv}/messages"))
        .header("Authorization", common::bearer(u1))
        .json(&serde_json::json!({"body": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Non-participant listing.
    let resp = client
        .get(format!("{base}/api/v1/conversations/{conv}/messages"))
        .header("Authorization", common::bearer(u3))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // Non-participant sending.
    let resp = client
        .post(format!("{base}/api/v1/conversations/{conv}/messages"))
        .header("Authorization", common::bearer(u3))
        .json(&serde_json::json!({"body": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);

    // No token at all.
    let resp = client
        .get(format!("{base}/api/v1/conversations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn directory_annotates_existing_conversations() {
    let pool = require_pool!();
    let viewer = common::insert_user(&pool, "Admin Satu", "admin").await;
    let known = common::insert_user(&pool, "Bu Sari", "staff").await;
    let unknown = common::insert_user(&pool, "Pak Budi", "teacher").await;
    let (state, _blobs, _registry) = common::make_state(pool.clone());
    let base = common::start_app(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/v1/conversations"))
        .header("Authorization", common::bearer(viewer))
        .json(&serde_json::json!({"other_user": known}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let resp = client
        .get(format!("{base}/api/v1/contacts"))
        .header("Authorization", common::bearer(viewer))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let entries: serde_json::Value = resp.json().await.unwrap();
    let entries = entries.as_array().unwrap();

    let known_entry = entries
        .iter()
        .find(|e| e["user_id"] == known.to_string())
        .expect("known contact listed");
    assert_eq!(known_entry["has_conversation"], true);

    let unknown_entry = entries
        .iter()
        .find(|e| e["user_id"] == unknown.to_string())
        .expect("unknown contact listed");
    assert_eq!(unknown_entry["has_conversation"], false);
}

#[tokio::test]
async fn healthz_is_public() {
    let pool = require_pool!();
    let (state, _blobs, _registry) = common::make_state(pool);
    let base = common::start_app(state).await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/healthz"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
}
