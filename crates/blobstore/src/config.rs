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

//! Configuration for the blob store.

use serde::{Deserialize, Serialize};

/// Default bucket for attachment blobs.
pub const DEFAULT_BUCKET: &str = "email-attachments";

/// Default region when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the S3-backed blob store.
///
/// All fields are plain scalars so the struct can be embedded in an
/// application config file. Defaults are applied and credentials validated
/// when the store handle is constructed, not during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobStoreConfig {
    /// Whether blob storage is enabled. Disabled handles fail fast on every operation.
    pub enabled: bool,
    /// Endpoint URL override (for MinIO/LocalStack). `None` uses the provider default.
    pub endpoint: Option<String>,
    /// Region. Empty uses `us-east-1`.
    pub region: String,
    /// Bucket name. Empty uses `email-attachments`.
    pub bucket: String,
    /// Access key ID
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Per-call timeout in seconds. Zero uses 30.
    pub timeout_secs: u64,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            region: String::new(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            timeout_secs: 0,
        }
    }
}

impl BlobStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        use std::env;
        Self {
            enabled: env::var("PLEXMAIL_BLOB_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            endpoint: env::var("PLEXMAIL_BLOB_ENDPOINT").ok(),
            region: env::var("PLEXMAIL_BLOB_REGION").unwrap_or_default(),
            bucket: env::var("PLEXMAIL_BLOB_BUCKET").unwrap_or_default(),
            access_key: env::var("PLEXMAIL_BLOB_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .unwrap_or_default(),
            secret_key: env::var("PLEXMAIL_BLOB_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .unwrap_or_default(),
            timeout_secs: env::var("PLEXMAIL_BLOB_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Apply construction-time defaults to empty fields.
    pub(crate) fn normalized(mut self) -> Self {
        if self.bucket.is_empty() {
            self.bucket = DEFAULT_BUCKET.to_string();
        }
        if self.region.is_empty() {
            self.region = DEFAULT_REGION.to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
        if matches!(self.endpoint.as_deref(), Some("")) {
            self.endpoint = None;
        }
        self
    }
}
