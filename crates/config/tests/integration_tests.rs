//! Integration tests for the config crate

use slotrace_config::{validate_config, AppConfig, ConfigError, ConfigLoader};
use slotrace_types::{CartMode, PayType};
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_file(suffix: &str) -> NamedTempFile {
    tempfile::Builder::new().suffix(suffix).tempfile().unwrap()
}

#[test]
fn test_load_sample_config() {
    let config = ConfigLoader::from_file(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../config/slotrace.toml")
            .as_path(),
    )
    .expect("Failed to load sample config");

    let defaults = AppConfig::default();
    assert_eq!(config.session.api_base_url, defaults.session.api_base_url);
    assert_eq!(config.race.start_gate, defaults.race.start_gate);
    assert_eq!(config.race.launch_at, defaults.race.launch_at);
    assert_eq!(config.notify.attempts, defaults.notify.attempts);
    assert_eq!(config.session.pay_type, PayType::Wechat);
    assert_eq!(config.session.cart_mode, CartMode::All);

    // the shipped sample carries no credential
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_config_validation_valid() {
    let mut config = AppConfig::default();
    config.session.cookie = "abc".to_string();
    config.race.slot_multiplier = 4;
    config.race.parallelism = 2;

    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_invalid_times() {
    let mut config = AppConfig::default();
    config.session.cookie = "abc".to_string();
    config.race.launch_at = Some("5:59".to_string());

    match validate_config(&config) {
        Err(ConfigError::ValidationError(msg)) => {
            assert!(msg.contains("race.launch_at"));
            assert!(!msg.contains("race.start_gate"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_config_builder() {
    let mut file = temp_file(".yaml");
    writeln!(
        file,
        r#"
session:
  cookie: from-file
race:
  parallelism: 3
"#
    )
    .unwrap();

    let config = ConfigLoader::builder()
        .set_default("race.slot_multiplier", "5")
        .unwrap()
        .add_file(file.path(), true)
        .build()
        .unwrap();

    assert_eq!(config.session.cookie, "from-file");
    assert_eq!(config.race.parallelism, 3);
    assert_eq!(config.race.slot_multiplier, 5);
    assert_eq!(config.race.interval_ms, 200);
}

#[test]
fn test_env_only_config() {
    std::env::set_var("SLOTRACE_ENVONLY_SESSION__COOKIE", "from-env");
    std::env::set_var("SLOTRACE_ENVONLY_NOTIFY__BARK_KEY", "device");
    let config = ConfigLoader::from_env_with_prefix("SLOTRACE_ENVONLY").unwrap();
    std::env::remove_var("SLOTRACE_ENVONLY_SESSION__COOKIE");
    std::env::remove_var("SLOTRACE_ENVONLY_NOTIFY__BARK_KEY");

    assert_eq!(config.session.cookie, "from-env");
    assert_eq!(config.notify.bark_key.as_deref(), Some("device"));
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_json_format() {
    let mut file = temp_file(".json");
    writeln!(
        file,
        r#"{{
  "session": {{ "cookie": "abc", "pay_type": "alipay" }},
  "race": {{ "max_run_secs": 60 }},
  "log": {{ "level": "warn", "json": true }}
}}"#
    )
    .unwrap();

    let config = ConfigLoader::from_file(file.path()).unwrap();
    assert_eq!(config.session.pay_type, PayType::Alipay);
    assert_eq!(config.race.max_run_secs, 60);
    assert_eq!(config.log.level, "warn");
    assert!(config.log.json);
}
