//! Options for loading persisted histograms.
//!
//! [`LoadConfig`] uses the `bon` crate for builder generation with validation
//! at build time.
//!
//! # Example
//!
//! ```
//! use hyperbin::{LoadConfig, Storage};
//!
//! // All defaults
//! let config = LoadConfig::builder().build().unwrap();
//! assert_eq!(config.storage, Storage::MemoryResident);
//!
//! let config = LoadConfig::builder()
//!     .max_depth(64)
//!     .validate(true)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_depth, 64);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::binning::DEFAULT_MAX_DEPTH;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The descent depth guard must allow at least one hop.
    InvalidMaxDepth(usize),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMaxDepth(v) => write!(f, "max_depth must be at least 1, got {}", v),
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// Storage
// =============================================================================

/// Where the volumes of a hierarchical binning live once loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    /// Every volume is read into memory up front.
    #[default]
    MemoryResident,
    /// Volumes are paged from disk on demand. Not implemented.
    DiskResident,
}

impl std::fmt::Display for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemoryResident => f.write_str("memory-resident"),
            Self::DiskResident => f.write_str("disk-resident"),
        }
    }
}

// =============================================================================
// LoadConfig
// =============================================================================

/// How a persisted histogram is turned back into memory.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct LoadConfig {
    /// Storage variant of the loaded binning. Default: memory-resident.
    #[builder(default)]
    pub storage: Storage,

    /// Bound on link hops while classifying. Default: 256.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Reject hierarchies with dangling links or cycles. Default: off.
    #[builder(default)]
    pub validate: bool,
}

impl<S: load_config_builder::IsComplete> LoadConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMaxDepth`] if `max_depth == 0`.
    pub fn build(self) -> Result<LoadConfig, ConfigError> {
        let config = self.__build_internal();
        config.check()?;
        Ok(config)
    }
}

impl LoadConfig {
    /// Check the invariants `build` enforces. Useful after deserializing.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidMaxDepth(self.max_depth));
        }
        Ok(())
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            storage: Storage::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            validate: false,
        }
    }
}
