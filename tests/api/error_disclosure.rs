//! Server errors never reach the client verbatim.

use planroom::Error;

fn body_of(err: Error) -> (u16, String) {
    let resp = err.into_response();
    let status = resp.status().as_u16();
    let bytes = tokio_test::block_on(http_body_util::BodyExt::collect(resp.into_body()))
        .unwrap()
        .to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

#[test]
fn internal_error_hides_sql() {
    let (status, body) = body_of(Error::Internal(
        "Failed to query SELECT * FROM users WHERE id = 'x'".into(),
    ));
    assert_eq!(status, 500);
    assert!(!body.contains("SELECT"), "SQL fragment leaked to client: {body}");
    assert!(body.contains("Internal server error"));
}

#[test]
fn io_error_hides_paths() {
    let io_err = std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "No such file: /etc/secret/planroom.toml",
    );
    let (status, body) = body_of(Error::Io(io_err));
    assert_eq!(status, 500);
    assert!(!body.contains("/etc/secret"), "Filesystem path leaked to client: {body}");
    assert!(body.contains("Internal server error"));
}

/// Client errors keep their message so callers can act on it.
#[test]
fn forbidden_names_the_refused_action() {
    let (status, body) = body_of(Error::Forbidden {
        resource: "team".to_string(),
        action: "delete".to_string(),
    });
    assert_eq!(status, 403);
    assert!(body.contains("Forbidden: cannot delete team"));
}
