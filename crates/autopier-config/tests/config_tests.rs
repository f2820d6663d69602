// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the AutoPier configuration system.

use autopier_config::diagnostic::suggest_key;
use autopier_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[service]
name = "autopier-test"
log_level = "debug"

[server]
host = "0.0.0.0"
port = 9000

[storage]
database_path = "/tmp/autopier-test.db"
wal_mode = false

[chat]
preview_length = 80
typing_stale_ms = 3000
typing_sweep_secs = 5
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "autopier-test");
    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.storage.database_path, "/tmp/autopier-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.chat.preview_length, 80);
    assert_eq!(config.chat.typing_stale_ms, 3000);
    assert_eq!(config.chat.typing_sweep_secs, 5);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.service.name, "autopier");
    assert_eq!(config.service.log_level, "info");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert!(config.storage.wal_mode);
    assert_eq!(config.chat.preview_length, 100);
    assert_eq!(config.chat.typing_stale_ms, 5000);
    assert_eq!(config.chat.typing_sweep_secs, 10);
}

/// Unknown field in a section produces an error mentioning the key.
#[test]
fn unknown_field_in_server_produces_error() {
    let toml = r#"
[server]
prot = 9000
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_produces_error() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// Semantic validation runs after deserialization.
#[test]
fn semantic_validation_rejects_zero_port() {
    let toml = r#"
[server]
port = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("port 0 should fail validation");
    assert!(errors.iter().any(|e| e.to_string().contains("server.port")));
}

/// The diagnostic layer suggests close key names.
#[test]
fn typo_suggestions_use_jaro_winkler() {
    assert_eq!(
        suggest_key("preview_lenght", &["preview_length", "typing_stale_ms"]),
        Some("preview_length".to_string())
    );
    assert_eq!(suggest_key("qqqq", &["preview_length"]), None);
}

/// Wrong value types surface as figment errors.
#[test]
fn wrong_type_produces_error() {
    let toml = r#"
[chat]
preview_length = "long"
"#;

    assert!(load_config_from_str(toml).is_err());
}
