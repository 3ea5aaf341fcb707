//! # Ingest Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! document is a valid configuration.
//!
//! ```toml
//! verbose = false
//! default_category = "player"
//! object_categories = ["solidObject"]
//! frame_budget = 10000
//! completion_grace_secs = 0.5
//! ```

use std::path::Path;
use std::time::Duration;

use rigstream_shared::constants::{
    COMPLETION_GRACE_SECS, DEFAULT_CATEGORY, DEFAULT_FRAME_BUDGET, REFEREE_SUFFIX,
    SOLID_OBJECT_CATEGORY, VERBOSE_BOUNDS_BUDGET, VERBOSE_ERROR_BUDGET, VERBOSE_FRAME_BUDGET,
};
use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// Ingest pipeline configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Log every record and force small per-tick budgets.
    pub verbose: bool,
    /// Category used when an announced character is not recognized.
    pub default_category: String,
    /// Categories that are rigid objects rather than skeletons.
    pub object_categories: Vec<String>,
    /// Errors drained per tick (`None` = unlimited). Ignored when verbose.
    pub error_budget: Option<usize>,
    /// Bounds drained per tick (`None` = unlimited). Ignored when verbose.
    pub bounds_budget: Option<usize>,
    /// Frames drained per tick (`None` = unlimited). Ignored when verbose.
    pub frame_budget: Option<usize>,
    /// Idle seconds after the last progress before completion may fire.
    pub completion_grace_secs: f32,
    /// Character-id suffix that marks a referee.
    pub referee_suffix: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            default_category: DEFAULT_CATEGORY.to_string(),
            object_categories: vec![SOLID_OBJECT_CATEGORY.to_string()],
            error_budget: None,
            bounds_budget: None,
            frame_budget: Some(DEFAULT_FRAME_BUDGET),
            completion_grace_secs: COMPLETION_GRACE_SECS,
            referee_suffix: REFEREE_SUFFIX.to_string(),
        }
    }
}

/// Per-tick drain limits actually applied by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainBudgets {
    /// Max error records per tick.
    pub errors: usize,
    /// Max bounds records per tick.
    pub bounds: usize,
    /// Max frame records per tick.
    pub frames: usize,
}

impl DrainBudgets {
    /// No limits at all.
    pub const UNLIMITED: Self = Self {
        errors: usize::MAX,
        bounds: usize::MAX,
        frames: usize::MAX,
    };

    /// The small budgets used in verbose mode so ordering stays observable.
    pub const VERBOSE: Self = Self {
        errors: VERBOSE_ERROR_BUDGET,
        bounds: VERBOSE_BOUNDS_BUDGET,
        frames: VERBOSE_FRAME_BUDGET,
    };
}

impl IngestConfig {
    /// Parses a TOML document and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> StreamResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| StreamError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Io`] if the file cannot be read, otherwise as
    /// [`IngestConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> StreamResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidConfig`] describing the first bad field.
    pub fn validate(&self) -> StreamResult<()> {
        if !self.completion_grace_secs.is_finite() || self.completion_grace_secs < 0.0 {
            return Err(StreamError::InvalidConfig(format!(
                "completion_grace_secs must be a non-negative number, got {}",
                self.completion_grace_secs
            )));
        }
        if self.default_category.is_empty() {
            return Err(StreamError::InvalidConfig("default_category must not be empty".into()));
        }
        for (name, budget) in [
            ("error_budget", self.error_budget),
            ("bounds_budget", self.bounds_budget),
            ("frame_budget", self.frame_budget),
        ] {
            if budget == Some(0) {
                return Err(StreamError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }

    /// Budgets after applying the verbose override.
    #[must_use]
    pub fn effective_budgets(&self) -> DrainBudgets {
        if self.verbose {
            DrainBudgets::VERBOSE
        } else {
            DrainBudgets {
                errors: self.error_budget.unwrap_or(usize::MAX),
                bounds: self.bounds_budget.unwrap_or(usize::MAX),
                frames: self.frame_budget.unwrap_or(usize::MAX),
            }
        }
    }

    /// Completion grace period as a duration.
    #[must_use]
    pub fn completion_grace(&self) -> Duration {
        Duration::from_secs_f32(self.completion_grace_secs)
    }

    /// Whether `category` names a rigid object.
    #[must_use]
    pub fn is_object_category(&self, category: &str) -> bool {
        self.object_categories.iter().any(|c| c == category)
    }
}
