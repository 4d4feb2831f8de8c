//! Environment configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use project_store::storage_root;

use crate::providers::DEFAULT_PROVIDER_ID;

pub const PROVIDER_ENV_VAR: &str = "COCKPIT_PROVIDER";
pub const STORAGE_DIR_ENV_VAR: &str = "COCKPIT_STORAGE_DIR";
pub const SETTLE_MS_ENV_VAR: &str = "COCKPIT_SETTLE_MS";
pub const SYSTEM_INSTRUCTIONS_ENV_VAR: &str = "COCKPIT_SYSTEM_INSTRUCTIONS";
pub const LOG_ENV_VAR: &str = "COCKPIT_LOG";

pub const DEFAULT_SETTLE_MS: u64 = 1_000;
pub const DEFAULT_LOG_FILTER: &str = "cockpit=info,project_store=info";
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str =
    "You are the build assistant inside a coding cockpit. Put every file in its own fenced code block tagged with its language, and mark each block with a `// Category: frontend|backend|database|config` comment. Frontend blocks must render into #root with React.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CockpitConfig {
    pub provider_id: String,
    pub storage_dir: Option<PathBuf>,
    /// Cosmetic pause between `building` and `idle`.
    pub settle_delay: Duration,
    pub system_instructions: String,
    pub log_filter: String,
}

impl Default for CockpitConfig {
    fn default() -> Self {
        Self {
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            storage_dir: None,
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            system_instructions: DEFAULT_SYSTEM_INSTRUCTIONS.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl CockpitConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            provider_id: env_string_opt(PROVIDER_ENV_VAR).unwrap_or(defaults.provider_id),
            storage_dir: env_string_opt(STORAGE_DIR_ENV_VAR).map(PathBuf::from),
            settle_delay: env_u64_opt(SETTLE_MS_ENV_VAR)
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay),
            system_instructions: env_string_opt(SYSTEM_INSTRUCTIONS_ENV_VAR)
                .unwrap_or(defaults.system_instructions),
            log_filter: env_string_opt(LOG_ENV_VAR).unwrap_or(defaults.log_filter),
        }
    }

    /// Directory backing `FileStorage`: the override, else `<cwd>/.cockpit/storage`.
    #[must_use]
    pub fn storage_root(&self, cwd: &Path) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| storage_root(cwd))
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u64_opt(key: &str) -> Option<u64> {
    env_string_opt(key).and_then(|value| value.parse().ok())
}
