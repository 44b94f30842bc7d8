use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_level`.
///
/// Returns `false` when a subscriber was already installed, which makes
/// repeated calls from tests or embedding applications harmless.
pub fn init_tracing(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Install the subscriber using the level from a loaded [`Config`](crate::config::Config).
pub fn init_from_config(config: &crate::config::Config) -> bool {
    init_tracing(&config.logging.level)
}
