//! Conversion configuration
//!
//! [`ConvertConfig`] holds the plain, serializable knobs of a conversion run.
//! It can be built in code with the `with_*` methods or loaded from TOML:
//!
//! ```toml
//! theme = "obsidian"
//! transfer_concurrency = 8
//! enrich_scenes = true
//! id_strategy = "ulid"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use story_graph::IdStrategy;

/// Theme used when none is configured
pub const DEFAULT_THEME: &str = "summit";

/// Map size used when the classic media does not imply one
pub const DEFAULT_MAP_SIZE: &str = "standard";

/// Conversion configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Story theme identifier recorded in the story-theme resource
    pub theme: String,
    /// Maximum number of media transfers in flight
    pub transfer_concurrency: usize,
    /// Copy the camera of web scenes into the webmap resource viewpoint
    pub enrich_scenes: bool,
    /// Identifier generation strategy
    pub id_strategy: IdStrategy,
    /// `config.size` for map nodes
    pub default_map_size: String,
    /// Add a navigation node after the cover
    pub include_navigation: bool,
}

impl ConvertConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With theme
    #[inline]
    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    /// With transfer concurrency
    #[inline]
    #[must_use]
    pub fn with_transfer_concurrency(mut self, concurrency: usize) -> Self {
        self.transfer_concurrency = concurrency;
        self
    }

    /// With web scene enrichment
    #[inline]
    #[must_use]
    pub fn with_enrich_scenes(mut self, enrich: bool) -> Self {
        self.enrich_scenes = enrich;
        self
    }

    /// With identifier strategy
    #[inline]
    #[must_use]
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }

    /// With navigation node
    #[inline]
    #[must_use]
    pub fn with_navigation(mut self, include: bool) -> Self {
        self.include_navigation = include;
        self
    }

    /// Parse from TOML text and validate
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transfer_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transfer_concurrency",
                reason: "must be at least 1".into(),
            });
        }
        if self.theme.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "theme",
                reason: "must not be empty".into(),
            });
        }
        if self.default_map_size.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "default_map_size",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            transfer_concurrency: 4,
            enrich_scenes: false,
            id_strategy: IdStrategy::Sequential,
            default_map_size: DEFAULT_MAP_SIZE.to_string(),
            include_navigation: true,
        }
    }
}
