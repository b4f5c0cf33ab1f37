// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of PlexMail.
//
// PlexMail is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// PlexMail is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with PlexMail. If not, see <https://www.gnu.org/licenses/>.

//! Error types for blob store operations.

use thiserror::Error;

/// Result type for blob store operations.
pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// Errors that can occur during blob store operations.
///
/// Operation failures wrap the underlying [`BackendError`] so the original
/// cause stays visible in the error chain and in the display text.
#[derive(Error, Debug)]
pub enum BlobStoreError {
    /// Missing or invalid configuration at construction
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client or credential setup failure at construction
    #[error("Connection setup error: {0}")]
    ConnectionSetup(String),

    /// Operation invoked on a disabled store handle
    #[error("blob storage is not enabled")]
    NotEnabled,

    /// Backend failure other than not-found (existence probes, network, permissions)
    #[error("failed to check blob existence for {key}: {source}")]
    Backend {
        /// Object key the probe targeted
        key: String,
        /// Underlying backend failure
        source: BackendError,
    },

    /// Upload failure during store
    #[error("failed to upload blob {key}: {source}")]
    Upload {
        /// Object key the upload targeted
        key: String,
        /// Underlying backend failure
        source: BackendError,
    },

    /// Fetch failure during retrieve (including a missing blob)
    #[error("failed to retrieve blob {key}: {source}")]
    Retrieve {
        /// Object key the fetch targeted
        key: String,
        /// Underlying backend failure
        source: BackendError,
    },

    /// Body drain failure after a successful fetch
    #[error("failed to read blob data for {key}: {source}")]
    Read {
        /// Object key whose body could not be drained
        key: String,
        /// Underlying backend failure
        source: BackendError,
    },

    /// Delete failure
    #[error("failed to delete blob {key}: {source}")]
    Delete {
        /// Object key the delete targeted
        key: String,
        /// Underlying backend failure
        source: BackendError,
    },
}

/// Failure reported by the object-storage backend.
///
/// Absence is a first-class signal here so callers branch on
/// [`BackendError::is_not_found`] instead of matching message strings.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The requested object does not exist
    #[error("object not found: {key}")]
    NotFound {
        /// Object key that was requested
        key: String,
    },

    /// The call did not complete within the configured per-call timeout
    #[error("operation timed out after {secs}s")]
    Timeout {
        /// Configured timeout in seconds
        secs: u64,
    },

    /// Any other service or transport failure
    #[error("{message}")]
    Service {
        /// Rendered error chain from the backend client
        message: String,
    },
}

impl BackendError {
    /// Whether this failure is a definitive not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_enabled_display() {
        assert_eq!(
            BlobStoreError::NotEnabled.to_string(),
            "blob storage is not enabled"
        );
    }

    #[test]
    fn test_operation_wraps_preserve_cause_text() {
        let err = BlobStoreError::Retrieve {
            key: "blobs/abc".to_string(),
            source: BackendError::Service {
                message: "connection refused".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to retrieve blob"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(BackendError::NotFound {
            key: "blobs/abc".to_string()
        }
        .is_not_found());
        assert!(!BackendError::Timeout { secs: 30 }.is_not_found());
        assert!(!BackendError::Service {
            message: "boom".to_string()
        }
        .is_not_found());
    }
}
