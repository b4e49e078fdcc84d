
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use test_utils::TestContext;

#[tokio::test]
async fn test_health_reports_local_date() {
    let ctx = TestContext::new();
    let body: Value = ctx.server.get("/health").await.json();

    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["today"], json!(ctx.booking.clock().today()));
}

#[tokio::test]
async fn test_version() {
    let ctx = TestContext::new();
    let body: Value = ctx.server.get("/version").await.json();
    assert_eq!(body["name"], json!("slotbook-api"));
}
