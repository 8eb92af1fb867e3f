//! Transport-level behaviour: body limits, headers and routing errors.

use super::harness::{App, raw_request};

#[tokio::test]
async fn oversized_content_length_is_rejected() {
    let app = App::start().await;
    let request = "POST /api/plans HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\
                   Content-Type: application/json\r\nContent-Length: 10485760\r\n\r\n";
    let raw = raw_request(app.addr(), request.as_bytes()).await;
    app.stop().await;

    let text = String::from_utf8_lossy(&raw);
    assert!(text.starts_with("HTTP/1.1 413"), "unexpected response:\n{text}");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = App::start().await;
    let health = app.call("GET", "/health", None, None).await;
    app.stop().await;

    assert_eq!(health.status, 200);
    assert!(health.headers.contains("x-content-type-options: nosniff"));
    assert!(health.headers.contains("x-frame-options: deny"));
    assert!(health.headers.contains("cache-control: no-store"));
}

#[tokio::test]
async fn routing_errors_are_json() {
    let app = App::start().await;
    let unknown = app.call("GET", "/api/nothing-here", None, None).await;
    let wrong_method = app.call("POST", "/health", None, None).await;
    app.stop().await;

    assert_eq!(unknown.status, 404);
    assert_eq!(unknown.body["error"], "Not found");
    assert_eq!(wrong_method.status, 405);
    assert!(wrong_method.headers.contains("x-frame-options: deny"));
}
