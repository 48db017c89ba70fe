// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types emitted by the engine core

use thiserror::Error;

/// Errors surfaced by propagation, aggregation, caching, and the store seam.
///
/// Validation and `NotFound` conditions are returned to the caller without
/// retry. `Upstream` wraps store read/write failures; the caller owns retry
/// policy. Observer publication and display-name lookups never produce
/// errors at all - those failures are swallowed by design.
#[derive(Error, Debug, Clone)]
pub enum ImpactError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Upstream(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

pub type ImpactResult<T> = Result<T, ImpactError>;
