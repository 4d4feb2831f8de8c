//! `tracing` subscriber setup for the cockpit binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{CockpitConfig, DEFAULT_LOG_FILTER};

/// Builds the filter from `COCKPIT_LOG`, falling back to the default directive
/// when the configured one does not parse.
#[must_use]
pub fn env_filter(config: &CockpitConfig) -> EnvFilter {
    EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. Returns false when one is already installed.
pub fn init_logging(config: &CockpitConfig) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialization_is_a_no_op() {
        let config = CockpitConfig::default();
        let _ = init_logging(&config);

        assert!(!init_logging(&config));
    }

    #[test]
    fn invalid_directive_falls_back_to_default() {
        let config = CockpitConfig {
            log_filter: "cockpit=notalevel".to_string(),
            ..CockpitConfig::default()
        };

        assert_eq!(
            env_filter(&config).to_string(),
            EnvFilter::new(DEFAULT_LOG_FILTER).to_string()
        );
    }
}
