use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `level` when set. With `json` every event is emitted
/// as one JSON object per line.
pub fn init_tracing(level: &str, json: bool) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(level)))
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry
            .with(fmt::layer().with_target(true).with_level(true).json())
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_thread_ids(true))
            .try_init()
    };

    result.map_err(|e| TracingError::InitError(e.to_string()))
}

/// The configured level for slotrace crates, `warn` for everything else
fn filter_directive(level: &str) -> String {
    let level = level.to_lowercase();
    format!(
        "warn,slotrace={level},slotrace_orchestrator={level},slotrace_api={level},slotrace_config={level}"
    )
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_targets_workspace_crates() {
        let directive = filter_directive("DEBUG");
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("slotrace_orchestrator=debug"));
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
