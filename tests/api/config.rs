//! Secret handling across config layers.

use std::io::Write;

use planroom::config::{Auth, Loader, Overrides};

/// The signing secret is never read from the config file.
#[test]
fn jwt_secret_stripped_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[auth]
jwt_secret = "should_be_stripped"
token_expiry_days = 7
"#
    )
    .unwrap();

    let loader = Loader::new("PLANROOM_CFGTEST_STRIP");
    let config = loader
        .load(
            Some(file.path()),
            &Overrides {
                jwt_secret: Some("cli_override_secret"),
                database_url: Some("stripped.db"),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(config.auth.jwt_secret, "cli_override_secret");
    assert_eq!(config.auth.token_expiry_days, 7);
    assert_eq!(config.database.url, "stripped.db");

    let only_file = loader.load(Some(file.path()), &Overrides::default());
    assert!(only_file.is_err(), "file secret alone must not satisfy the loader");
}

#[test]
fn debug_output_redacts_jwt_secret() {
    let auth = Auth {
        jwt_secret: "SUPER_SECRET_VALUE".to_string(),
        token_expiry_days: 30,
    };
    let debug_output = format!("{auth:?}");
    assert!(
        !debug_output.contains("SUPER_SECRET_VALUE"),
        "Debug output leaks the JWT secret: {debug_output}"
    );
}

#[test]
fn serialized_config_omits_jwt_secret() {
    let config = planroom::Config {
        auth: Auth {
            jwt_secret: "not_for_disk".to_string(),
            token_expiry_days: 30,
        },
        ..Default::default()
    };
    let rendered = toml::to_string(&config).unwrap();
    assert!(!rendered.contains("not_for_disk"));
}
