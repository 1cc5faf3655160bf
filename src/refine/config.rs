use serde::{Deserialize, Serialize};

use crate::core::types::{
    DEFAULT_DIFF_THRESHOLD, DEFAULT_MAX_ITERATION, LEGACY_DIFF_THRESHOLD, MIN_BIN_COUNT,
};
use crate::refine::RefineError;

/// Configuration for the refinement engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Iteration cap for label propagation (must be > 0)
    pub max_iteration: usize,

    /// Propagation stops once the summed change of one iteration drops below this
    pub diff_threshold: f64,

    /// Size floor: when set, a label is only removed while its bin still holds
    /// at least this many members (minus removals already scheduled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bin_count: Option<usize>,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_iteration: DEFAULT_MAX_ITERATION,
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            min_bin_count: None,
        }
    }
}

impl RefineConfig {
    /// Defaults of earlier releases (`diff_threshold = 1e-5`)
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            diff_threshold: LEGACY_DIFF_THRESHOLD,
            ..Self::default()
        }
    }

    /// Defaults with the size-floor guard enabled at [`MIN_BIN_COUNT`]
    #[must_use]
    pub fn long_read_safe() -> Self {
        Self {
            min_bin_count: Some(MIN_BIN_COUNT),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_iteration(mut self, max_iteration: usize) -> Self {
        self.max_iteration = max_iteration;
        self
    }

    #[must_use]
    pub fn with_diff_threshold(mut self, diff_threshold: f64) -> Self {
        self.diff_threshold = diff_threshold;
        self
    }

    #[must_use]
    pub fn with_min_bin_count(mut self, min_bin_count: Option<usize>) -> Self {
        self.min_bin_count = min_bin_count;
        self
    }

    /// Check the configuration before any graph work is done
    ///
    /// # Errors
    ///
    /// Returns `RefineError::InvalidConfiguration` if `max_iteration` is zero or
    /// `diff_threshold` is negative or not a number.
    pub fn validate(&self) -> Result<(), RefineError> {
        if self.max_iteration == 0 {
            return Err(RefineError::InvalidConfiguration(
                "max_iteration must be greater than 0".to_string(),
            ));
        }
        if self.diff_threshold.is_nan() || self.diff_threshold < 0.0 {
            return Err(RefineError::InvalidConfiguration(format!(
                "diff_threshold must be a non-negative number, got {}",
                self.diff_threshold
            )));
        }
        Ok(())
    }
}
