//! Configuration validation

use crate::{parse_time_of_day, AppConfig, ConfigError, Result};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Session
    if config.session.cookie.trim().is_empty() {
        errors.push(ValidationError::new(
            "session.cookie",
            "session cookie is required",
        ));
    }

    if let Err(e) = validate_url(&config.session.api_base_url) {
        errors.push(ValidationError::new("session.api_base_url", e));
    }

    if let Err(e) = validate_url(&config.session.user_base_url) {
        errors.push(ValidationError::new("session.user_base_url", e));
    }

    // Race
    if config.race.interval_ms == 0 {
        errors.push(ValidationError::new(
            "race.interval_ms",
            "must be greater than 0",
        ));
    }

    if config.race.slot_multiplier == 0 {
        errors.push(ValidationError::new(
            "race.slot_multiplier",
            "must be greater than 0",
        ));
    }

    if config.race.parallelism == 0 {
        errors.push(ValidationError::new(
            "race.parallelism",
            "must be greater than 0",
        ));
    }

    if config.race.max_in_flight_submissions == 0 {
        errors.push(ValidationError::new(
            "race.max_in_flight_submissions",
            "must be greater than 0",
        ));
    }

    if config.race.max_run_secs == 0 {
        errors.push(ValidationError::new(
            "race.max_run_secs",
            "must be greater than 0",
        ));
    }

    if let Some(gate) = &config.race.start_gate {
        if let Err(e) = parse_time_of_day(gate) {
            errors.push(ValidationError::new("race.start_gate", e));
        }
    }

    if let Some(launch) = &config.race.launch_at {
        if let Err(e) = parse_time_of_day(launch) {
            errors.push(ValidationError::new("race.launch_at", e));
        }
    }

    // Daemons
    if config.daemon.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "daemon.poll_interval_ms",
            "must be greater than 0",
        ));
    }

    // Notification
    if config.notify.bark_key.is_some() {
        if let Err(e) = validate_url(&config.notify.bark_url) {
            errors.push(ValidationError::new("notify.bark_url", e));
        }
    }

    if let Err(e) = validate_log_level(&config.log.level) {
        errors.push(e);
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate an http(s) URL
pub fn validate_url(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    let parsed = url::Url::parse(value).map_err(|e| format!("invalid URL '{value}': {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("URL scheme must be http or https, got '{other}'")),
    }
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "log.level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.session.cookie = "DDXQSESSID=abc".to_string();
        config
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_cookie() {
        let result = validate_config(&AppConfig::default());
        match result {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("session.cookie")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_collects_every_violation() {
        let mut config = valid_config();
        config.race.interval_ms = 0;
        config.race.slot_multiplier = 0;
        config.race.start_gate = Some("6 o'clock".to_string());
        config.log.level = "loud".to_string();

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("race.interval_ms"));
        assert!(err.contains("race.slot_multiplier"));
        assert!(err.contains("race.start_gate"));
        assert!(err.contains("log.level"));
    }

    #[test]
    fn test_bark_url_only_checked_with_key() {
        let mut config = valid_config();
        config.notify.bark_url = "not a url".to_string();
        assert!(validate_config(&config).is_ok());

        config.notify.bark_key = Some("device".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://maicai.api.ddxq.mobi").is_ok());
        assert!(validate_url("http://127.0.0.1:8080").is_ok());
        assert!(validate_url("").is_err());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("maicai.api.ddxq.mobi").is_err());
    }
}
