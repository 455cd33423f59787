// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures raised by the scheduling engine and the import pipeline.
/// Nothing here aborts the process; command handlers render these through
/// anyhow like any other error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unrecognized statement: {0}")]
    Format(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Batch write failed after {applied} of {attempted} rows; all rolled back")]
    PartialBatch { applied: usize, attempted: usize },

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        EngineError::Conflict(msg.into())
    }
}
