// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Propagation tuning and cooperative cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ImpactError, ImpactResult};

/// Traversal cutoffs and edge-type rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationOptions {
    /// Maximum traversal depth, within [1, 20].
    pub max_depth: usize,

    /// Branches whose propagated impact falls below this are pruned.
    /// Within [0, 1].
    pub impact_threshold: f64,

    /// Whether Indirect edges are traversed at all.
    pub include_indirect: bool,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            impact_threshold: 0.01,
            include_indirect: true,
        }
    }
}

impl PropagationOptions {
    /// Validate the recognized ranges.
    pub fn validate(&self) -> ImpactResult<()> {
        if !(1..=20).contains(&self.max_depth) {
            return Err(ImpactError::Invalid(format!(
                "max_depth {} outside [1, 20]",
                self.max_depth
            )));
        }
        if !(0.0..=1.0).contains(&self.impact_threshold) {
            return Err(ImpactError::Invalid(format!(
                "impact_threshold {} outside [0, 1]",
                self.impact_threshold
            )));
        }
        Ok(())
    }

    /// Options with a tighter depth cap, other settings default.
    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }
}

/// Cooperative cancellation signal shared between a caller and a running
/// propagation. Checked at every edge-examination boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        let options = PropagationOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.max_depth, 10);
        assert_eq!(options.impact_threshold, 0.01);
        assert!(options.include_indirect);
    }

    #[test]
    fn out_of_range_options_are_rejected() {
        assert!(PropagationOptions::with_depth(0).validate().is_err());
        assert!(PropagationOptions::with_depth(21).validate().is_err());
        assert!(PropagationOptions::with_depth(20).validate().is_ok());

        let mut options = PropagationOptions::default();
        options.impact_threshold = 1.5;
        assert!(options.validate().is_err());
        options.impact_threshold = -0.1;
        assert!(options.validate().is_err());
    }

    #[test]
    fn cancel_token_fires_once_set() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
    }
}
