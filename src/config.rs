use serde::{Deserialize, Serialize};

use crate::error::{Result, StacksError};

/// Tuning knobs for the indexing pipeline.
///
/// Defaults are sized for a single-writer archive run; every field can be
/// overridden from a toml document or from `STACKS_*` environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Pending documents above this count are flushed to the engine
    /// without committing.
    #[serde(default = "default_add_batch_size")]
    pub add_batch_size: usize,
    /// Flushed-but-uncommitted documents above this count trigger a
    /// commit.
    #[serde(default = "default_commit_threshold")]
    pub commit_threshold: usize,
    /// Page size used by the unbounded scroll iterator.
    #[serde(default = "default_scroll_page_size")]
    pub scroll_page_size: usize,
    /// Upper bound for a single search page; out-of-range limits are
    /// clamped to this.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_add_batch_size() -> usize {
    100
}

fn default_commit_threshold() -> usize {
    1000
}

fn default_scroll_page_size() -> usize {
    100
}

fn default_max_page_size() -> usize {
    1000
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            add_batch_size: default_add_batch_size(),
            commit_threshold: default_commit_threshold(),
            scroll_page_size: default_scroll_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl IndexConfig {
    /// Parse a config from a toml document, then apply environment
    /// overrides and validate.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)
            .map_err(|err| StacksError::Config(format!("parse config: {err}")))?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Default config with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_usize("STACKS_ADD_BATCH_SIZE")? {
            self.add_batch_size = value;
        }
        if let Some(value) = env_usize("STACKS_COMMIT_THRESHOLD")? {
            self.commit_threshold = value;
        }
        if let Some(value) = env_usize("STACKS_SCROLL_PAGE_SIZE")? {
            self.scroll_page_size = value;
        }
        if let Some(value) = env_usize("STACKS_MAX_PAGE_SIZE")? {
            self.max_page_size = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.add_batch_size == 0 {
            return Err(StacksError::Config("add_batch_size must be >= 1".to_string()));
        }
        if self.commit_threshold == 0 {
            return Err(StacksError::Config("commit_threshold must be >= 1".to_string()));
        }
        if self.scroll_page_size == 0 {
            return Err(StacksError::Config("scroll_page_size must be >= 1".to_string()));
        }
        if self.max_page_size == 0 {
            return Err(StacksError::Config("max_page_size must be >= 1".to_string()));
        }
        Ok(())
    }
}

fn env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| StacksError::Config(format!("{name} must be an integer, got {raw:?}")))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
