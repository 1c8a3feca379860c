//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a valid PNG image
pub fn assert_png(response: &TestResponse) {
    assert_ok(response);
    assert!(
        response.is_png(),
        "Expected PNG image, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );
    assert_eq!(
        response.header("content-type"),
        Some("image/png"),
        "Expected Content-Type: image/png"
    );
}

/// Assert a JSON error body `{status, error}` matching the HTTP status
pub fn assert_json_error(response: &TestResponse, expected: StatusCode) {
    assert_status(response, expected);
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["status"].as_u64(),
        Some(expected.as_u16() as u64),
        "Expected JSON status {}, got {}",
        expected.as_u16(),
        serde_json::to_string_pretty(&json).unwrap()
    );
    assert!(json["error"].is_string(), "Expected an error message");
}

/// Assert a file download with the given content type and file extension
pub fn assert_attachment(response: &TestResponse, content_type: &str, extension: &str) {
    assert_ok(response);
    assert_eq!(response.header("content-type"), Some(content_type));

    let disposition = response.header("content-disposition").unwrap_or_default();
    assert!(
        disposition.starts_with("attachment;"),
        "Expected attachment, got {disposition:?}"
    );
    assert!(
        disposition.ends_with(&format!(".{extension}\"")),
        "Expected .{extension} filename, got {disposition:?}"
    );
}

/// Decoded dimensions of an image response body
pub fn image_dimensions(response: &TestResponse) -> (u32, u32) {
    let image = image::load_from_memory(&response.body).expect("Failed to decode image");
    (image.width(), image.height())
}
