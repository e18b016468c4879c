use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use vigil::{Config, Moderator};
use vigil_store::MemoryStore;

fn server() -> TestServer {
    let moderator = Moderator::new(Config::builtin().unwrap(), MemoryStore::new());
    TestServer::new(vigil_axum::router(moderator)).unwrap()
}

fn author(name: &str) -> Value {
    json!({
        "id": name,
        "created_at": (chrono::Utc::now() - chrono::Duration::days(60)).to_rfc3339(),
    })
}

async fn publish(server: &TestServer, text: &str) -> Value {
    let check: Value = server
        .post("/admission/check")
        .json(&json!({ "author": author("poster"), "text": text }))
        .await
        .json();
    let response = server
        .post("/admission/commit")
        .json(&json!({ "ticket": check["ticket"], "confirmed": true }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn report(server: &TestServer, content_id: &str, reporter: &str) -> Value {
    let response = server
        .post("/reports")
        .json(&json!({ "content": content_id, "reporter": reporter, "reason": "spam" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn blocked_check_has_no_ticket() {
    let server = server();
    let response = server
        .post("/admission/check")
        .json(&json!({
            "author": author("scammer"),
            "text": "Send money to this bank account now, sort code 12-34-56",
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["decision"], "blocked");
    assert_eq!(body["score"], 85);
    assert!(body["ticket"].is_null());
}

#[tokio::test]
async fn review_ticket_needs_confirmation() {
    let server = server();
    let check: Value = server
        .post("/admission/check")
        .json(&json!({
            "author": author("poster"),
            "text": "Feeling a bit lonely today, anyone fancy a chat?",
        }))
        .await
        .json();
    assert_eq!(check["decision"], "needs-review");

    let response = server
        .post("/admission/commit")
        .json(&json!({ "ticket": check["ticket"] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Validation");

    let response = server
        .post("/admission/commit")
        .json(&json!({ "ticket": check["ticket"], "confirmed": true }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let item: Value = response.json();
    assert_eq!(item["visibility"], "flagged");

    let response = server
        .post("/admission/commit")
        .json(&json!({ "ticket": check["ticket"], "confirmed": true }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn empty_submission_is_a_bad_request() {
    let server = server();
    let response = server
        .post("/admission/check")
        .json(&json!({ "author": author("poster"), "text": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reports_queue_and_resolve() {
    let server = server();
    let item = publish(&server, "Car boot sale this weekend").await;
    let id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["visibility"], "visible");

    report(&server, &id, "a").await;
    report(&server, &id, "b").await;
    let third = report(&server, &id, "c").await;
    assert_eq!(third["auto_hidden"], true);
    assert_eq!(third["content"]["visibility"], "hidden");

    let queue: Value = server.get("/queue").await.json();
    assert_eq!(queue.as_array().unwrap().len(), 1);
    assert_eq!(queue[0]["pending_reports"].as_array().unwrap().len(), 3);

    let response = server
        .post(&format!("/queue/{}/resolve", id))
        .json(&json!({ "action": "approve", "reviewer": "admin", "notes": "false alarm" }))
        .await;
    response.assert_status_ok();
    let resolution: Value = response.json();
    assert_eq!(resolution["content"]["visibility"], "visible");

    let reports: Value = server.get(&format!("/content/{}/reports", id)).await.json();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r["status"] == "denied"));

    let report_id = reports[0]["id"].as_str().unwrap();
    let single: Value = server.get(&format!("/reports/{}", report_id)).await.json();
    assert_eq!(single["resolver"], "admin");

    let response = server
        .post(&format!("/queue/{}/resolve", id))
        .json(&json!({ "action": "hide", "reviewer": "admin" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "InvalidState");
    assert!(body.get("retryable").is_none());
}

#[tokio::test]
async fn unknown_content_is_not_found() {
    let server = server();
    let ghost = vigil_common::ContentId::generate();

    let response = server.get(&format!("/content/{}", ghost)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "NotFound");

    let response = server
        .post("/reports")
        .json(&json!({ "content": ghost.as_str(), "reporter": "a", "reason": "scam" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let server = server();
    let response = server.get("/content/not-a-valid-id").await;
    assert!(response.status_code().is_client_error());
}
