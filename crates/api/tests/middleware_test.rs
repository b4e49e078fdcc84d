use axum::http::StatusCode;
use rstest::rstest;
use slotbook_api::middleware::error_handling::map_error;
use slotbook_core::errors::BookingError;
use uuid::Uuid;

#[rstest]
#[case(BookingError::Validation("Invalid input".to_string()), StatusCode::BAD_REQUEST)]
#[case(BookingError::NotFound("Slot missing".to_string()), StatusCode::NOT_FOUND)]
#[case(BookingError::SlotUnavailable(Uuid::nil()), StatusCode::CONFLICT)]
#[case(BookingError::Persistence(eyre::eyre!("Database error")), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(BookingError::Notification("smtp down".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(
    BookingError::Internal(Box::new(std::io::Error::other("Internal error"))),
    StatusCode::INTERNAL_SERVER_ERROR
)]
fn test_error_status_mapping(#[case] error: BookingError, #[case] expected: StatusCode) {
    assert_eq!(map_error(error).status(), expected);
}

#[tokio::test]
async fn test_server_error_body_is_generic() {
    let response = map_error(BookingError::Persistence(eyre::eyre!(
        "relation \"slots\" does not exist"
    )));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(
        body,
        serde_json::json!({ "error": "Could not complete the action, please try again" })
    );
}
