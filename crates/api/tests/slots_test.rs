
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use test_utils::{MONDAY, TestContext};

fn local_times(slots: &[Value]) -> Vec<&str> {
    slots
        .iter()
        .map(|slot| slot["local_time"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_generated_day_lists_every_slot() {
    let ctx = TestContext::new();
    ctx.create_rule(1, "08:00", "09:00", 30).await;
    ctx.create_rule(1, "14:00", "15:00", 30).await;
    ctx.generate(MONDAY).await;

    let slots: Vec<Value> = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", MONDAY)
        .await
        .json();

    assert_eq!(local_times(&slots), vec!["08:00", "08:30", "14:00", "14:30"]);
    assert_eq!(slots[0]["local_date"], json!(MONDAY));
    assert_eq!(slots[0]["date_time"], json!("2026-10-19T11:00:00Z"));
    assert_eq!(slots[0]["available"], json!(true));
}

#[tokio::test]
async fn test_period_filter() {
    let ctx = TestContext::new();
    ctx.create_rule(1, "08:00", "09:00", 30).await;
    ctx.create_rule(1, "14:00", "15:00", 30).await;
    ctx.generate(MONDAY).await;

    let afternoon: Vec<Value> = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", MONDAY)
        .add_query_param("period", "afternoon")
        .await
        .json();
    assert_eq!(local_times(&afternoon), vec!["14:00", "14:30"]);

    // Labels from the previous deployment still work.
    let morning: Vec<Value> = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", MONDAY)
        .add_query_param("period", "manha")
        .await
        .json();
    assert_eq!(local_times(&morning), vec!["08:00", "08:30"]);
}

#[tokio::test]
async fn test_available_filter_hides_reserved_slots() {
    let ctx = TestContext::new();
    ctx.create_rule(1, "08:00", "09:00", 30).await;
    let day = ctx.generate(MONDAY).await;
    let first = day["created"][0]["id"].as_str().unwrap().to_string();

    ctx.server
        .post(&format!("/api/slots/{first}/reservations"))
        .json(&json!({ "user_id": "user-1", "user_name": "Alice" }))
        .await;

    let all: Vec<Value> = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", MONDAY)
        .await
        .json();
    assert_eq!(all.len(), 2);

    let open: Vec<Value> = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", MONDAY)
        .add_query_param("available", "true")
        .await
        .json();
    assert_eq!(local_times(&open), vec!["08:30"]);
}

#[tokio::test]
async fn test_day_without_slots_is_empty() {
    let ctx = TestContext::new();
    let slots: Vec<Value> = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", "2026-10-20")
        .await
        .json();
    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_malformed_query_is_bad_request() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", "19/10/2026")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", MONDAY)
        .add_query_param("period", "evening")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unrepresentable_date_is_bad_request() {
    let ctx = TestContext::new();
    let last_day = chrono::NaiveDate::MAX.to_string();

    let response = ctx
        .server
        .get("/api/slots")
        .add_query_param("date", &last_day)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
