//! Refinement parameters

use super::MorseError;
use crate::map::FallbackPolicy;

/// Default spacing of "map unresolved" warnings.
pub const DEFAULT_FAILURE_LOG_INTERVAL: u64 = 1000;

/// Parameters of [`compute_morse_graph`](super::compute_morse_graph).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct MorseConfig {
    /// Resolution of the first decomposition.
    pub min_depth: usize,

    /// Resolution at which every Morse set is frozen.
    pub max_depth: usize,

    /// Morse sets with more cells than this are frozen where they are found.
    pub complexity_limit: usize,

    /// Region standing in for unresolved map images.
    pub fallback: FallbackPolicy,

    /// Log every n-th absorbed map failure (the first is always logged).
    pub failure_log_interval: u64,
}

impl MorseConfig {
    /// Create a configuration, rejecting `min_depth > max_depth`
    pub fn new(
        min_depth: usize,
        max_depth: usize,
        complexity_limit: usize,
    ) -> Result<Self, MorseError> {
        if min_depth > max_depth {
            return Err(MorseError::InvalidConfiguration {
                reason: format!("min_depth {min_depth} exceeds max_depth {max_depth}"),
            });
        }
        Ok(Self {
            min_depth,
            max_depth,
            complexity_limit,
            fallback: FallbackPolicy::default(),
            failure_log_interval: DEFAULT_FAILURE_LOG_INTERVAL,
        })
    }

    /// Replace the fallback policy
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replace the failure log interval (zero behaves as one)
    pub fn with_failure_log_interval(mut self, interval: u64) -> Self {
        self.failure_log_interval = interval;
        self
    }
}
