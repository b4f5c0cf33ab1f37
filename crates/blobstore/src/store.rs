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

//! Content-addressable blob store over S3-compatible object storage.
//!
//! ## Purpose
//! Stores attachment content under its own SHA-256 digest so identical
//! payloads are uploaded once and addressed by a stable ID. The store is a
//! thin handle: no internal threads, no locks, a single bounded attempt per
//! backend call.
//!
//! ## Design
//! - **Content addressing**: BlobID = lowercase hex SHA-256 of the bytes;
//!   object key = `blobs/{blob_id}`
//! - **Dedup on write**: existence probe before upload; a probe hit skips the
//!   upload entirely
//! - **Disabled mode**: a handle constructed with `enabled: false` holds no
//!   client and fails every operation fast, without network calls
//! - **One deadline per operation**: multi-call operations (probe+upload,
//!   fetch+drain) share a single timeout budget

use crate::client::{S3Api, S3Client};
use crate::config::BlobStoreConfig;
use crate::error::{BackendError, BlobStoreError, BlobStoreResult};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Content type recorded for uploaded blobs.
const BLOB_CONTENT_TYPE: &str = "application/octet-stream";

/// Key prefix for blob objects.
const BLOB_KEY_PREFIX: &str = "blobs/";

/// Compute the blob ID for content: the lowercase hex SHA-256 digest of its
/// bytes. Identical content always maps to the same ID.
pub fn blob_id(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Derive the object key for a blob ID. Format: `blobs/{blob_id}`.
pub fn storage_key(blob_id: &str) -> String {
    format!("{}{}", BLOB_KEY_PREFIX, blob_id)
}

/// Content-addressable blob store backed by S3-compatible object storage.
///
/// ## Example
/// ```rust,no_run
/// use plexmail_blobstore::{BlobStoreConfig, S3BlobStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = BlobStoreConfig {
///     enabled: true,
///     endpoint: Some("http://localhost:9000".to_string()),
///     access_key: "minioadmin".to_string(),
///     secret_key: "minioadmin".to_string(),
///     ..Default::default()
/// };
/// let store = S3BlobStore::new(config).await?;
///
/// let blob_id = store.store(b"attachment bytes").await?;
/// let content = store.retrieve(&blob_id).await?;
/// assert_eq!(content, b"attachment bytes");
/// store.delete(&blob_id).await?;
/// # Ok(())
/// # }
/// ```
pub struct S3BlobStore {
    inner: Option<Inner>,
}

impl fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(inner) => f
                .debug_struct("S3BlobStore")
                .field("enabled", &true)
                .field("bucket", &inner.bucket)
                .field("timeout", &inner.timeout)
                .finish(),
            None => f
                .debug_struct("S3BlobStore")
                .field("enabled", &false)
                .finish(),
        }
    }
}

struct Inner {
    client: Arc<dyn S3Api>,
    bucket: String,
    timeout: Duration,
}

impl Inner {
    /// Bound a backend call by the operation deadline.
    async fn bounded<T>(
        &self,
        deadline: Instant,
        fut: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        match timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

impl S3BlobStore {
    /// Create a store handle from configuration.
    ///
    /// A disabled config yields a disabled handle immediately: no validation,
    /// no network calls, and every operation fails with
    /// [`BlobStoreError::NotEnabled`]. An enabled config requires non-empty
    /// credentials, applies defaults (bucket `email-attachments`, region
    /// `us-east-1`, timeout 30s), builds the client, and attempts an
    /// idempotent bucket create. A creation failure is logged and does not
    /// fail construction; a genuinely unreachable backend surfaces on the
    /// first operation instead.
    ///
    /// ## Returns
    /// The handle, or [`BlobStoreError::Config`] for missing credentials, or
    /// [`BlobStoreError::ConnectionSetup`] for a malformed endpoint.
    #[instrument(skip(config), fields(enabled = config.enabled))]
    pub async fn new(config: BlobStoreConfig) -> BlobStoreResult<Self> {
        if !config.enabled {
            debug!("blob storage disabled, operations will fail fast");
            return Ok(Self { inner: None });
        }

        if config.access_key.is_empty() || config.secret_key.is_empty() {
            return Err(BlobStoreError::Config(
                "S3 access key and secret key are required when blob storage is enabled"
                    .to_string(),
            ));
        }

        let config = config.normalized();
        let client = S3Client::connect(&config).await?;

        let store = Self {
            inner: Some(Inner {
                client: Arc::new(client),
                bucket: config.bucket.clone(),
                timeout: Duration::from_secs(config.timeout_secs),
            }),
        };
        store.ensure_bucket().await;

        info!(
            bucket = %config.bucket,
            region = %config.region,
            timeout_secs = config.timeout_secs,
            "blob store initialized"
        );
        Ok(store)
    }

    /// Create an enabled store over an injected client (for testing).
    pub fn with_client(client: Arc<dyn S3Api>, bucket: &str, timeout: Duration) -> Self {
        Self {
            inner: Some(Inner {
                client,
                bucket: bucket.to_string(),
                timeout,
            }),
        }
    }

    /// Whether this handle was constructed enabled.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    fn inner(&self) -> BlobStoreResult<&Inner> {
        self.inner.as_ref().ok_or(BlobStoreError::NotEnabled)
    }

    /// Idempotent bucket create. Failures are logged, never fatal: the bucket
    /// may already exist under restricted create permissions, and the first
    /// operation reports an unreachable backend anyway.
    async fn ensure_bucket(&self) {
        if let Some(inner) = &self.inner {
            let deadline = Instant::now() + inner.timeout;
            match timeout_at(deadline, inner.client.create_bucket(&inner.bucket)).await {
                Ok(Ok(())) => debug!(bucket = %inner.bucket, "bucket ready"),
                Ok(Err(err)) => warn!(
                    bucket = %inner.bucket,
                    error = %err,
                    "failed to ensure bucket exists, proceeding"
                ),
                Err(_) => warn!(
                    bucket = %inner.bucket,
                    "timed out ensuring bucket exists, proceeding"
                ),
            }
        }
    }

    /// Store content, returning its blob ID.
    ///
    /// Uploads are content-addressed and deduplicated: when an object with
    /// the same digest is already stored, the upload is skipped and the
    /// existing ID is returned. Probe and upload share one timeout budget.
    /// Concurrent stores of identical content may both upload; the bytes are
    /// identical, so the overwrite is harmless.
    ///
    /// ## Returns
    /// The blob ID (lowercase hex SHA-256 digest) the content is stored under.
    #[instrument(skip(self, content), fields(size_bytes = content.len()))]
    pub async fn store(&self, content: &[u8]) -> BlobStoreResult<String> {
        let inner = self.inner()?;
        let start = Instant::now();
        let blob_id = blob_id(content);
        let key = storage_key(&blob_id);
        let deadline = start + inner.timeout;

        match inner
            .bounded(deadline, inner.client.head_object(&inner.bucket, &key))
            .await
        {
            Ok(()) => {
                debug!(
                    blob_id = %blob_id,
                    duration_ms = start.elapsed().as_millis(),
                    "blob already stored, skipping upload"
                );
                return Ok(blob_id);
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => {
                error!(error = %err, key = %key, "existence probe failed");
                return Err(BlobStoreError::Backend { key, source: err });
            }
        }

        inner
            .bounded(
                deadline,
                inner.client.put_object(
                    &inner.bucket,
                    &key,
                    Bytes::copy_from_slice(content),
                    BLOB_CONTENT_TYPE,
                ),
            )
            .await
            .map_err(|err| {
                error!(error = %err, key = %key, "blob upload failed");
                BlobStoreError::Upload { key, source: err }
            })?;

        info!(
            blob_id = %blob_id,
            size_bytes = content.len(),
            duration_ms = start.elapsed().as_millis(),
            "blob stored"
        );
        Ok(blob_id)
    }

    /// Retrieve a blob's content by ID.
    ///
    /// The whole blob is drained into memory. A failed fetch (including a
    /// missing blob) and a failed drain after a successful fetch are distinct
    /// errors. Fetch and drain share one timeout budget.
    #[instrument(skip(self), fields(blob_id = %blob_id))]
    pub async fn retrieve(&self, blob_id: &str) -> BlobStoreResult<Vec<u8>> {
        let inner = self.inner()?;
        let start = Instant::now();
        let key = storage_key(blob_id);
        let deadline = start + inner.timeout;

        let body = inner
            .bounded(deadline, inner.client.get_object(&inner.bucket, &key))
            .await
            .map_err(|err| {
                error!(error = %err, key = %key, "blob fetch failed");
                BlobStoreError::Retrieve {
                    key: key.clone(),
                    source: err,
                }
            })?;

        let content = inner.bounded(deadline, body.collect()).await.map_err(|err| {
            error!(error = %err, key = %key, "blob body read failed");
            BlobStoreError::Read { key, source: err }
        })?;

        debug!(
            size_bytes = content.len(),
            duration_ms = start.elapsed().as_millis(),
            "blob retrieved"
        );
        Ok(content)
    }

    /// Check whether a blob exists without downloading it.
    ///
    /// ## Returns
    /// `Ok(false)` only for a definitive not-found; any other probe failure
    /// is an error, never mapped to `false`.
    #[instrument(skip(self), fields(blob_id = %blob_id))]
    pub async fn exists(&self, blob_id: &str) -> BlobStoreResult<bool> {
        let inner = self.inner()?;
        let key = storage_key(blob_id);
        let deadline = Instant::now() + inner.timeout;

        match inner
            .bounded(deadline, inner.client.head_object(&inner.bucket, &key))
            .await
        {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => {
                error!(error = %err, key = %key, "existence probe failed");
                Err(BlobStoreError::Backend { key, source: err })
            }
        }
    }

    /// Delete a blob by ID.
    ///
    /// Deleting an absent blob is success: the backend treats missing keys
    /// as already deleted.
    #[instrument(skip(self), fields(blob_id = %blob_id))]
    pub async fn delete(&self, blob_id: &str) -> BlobStoreResult<()> {
        let inner = self.inner()?;
        let start = Instant::now();
        let key = storage_key(blob_id);
        let deadline = start + inner.timeout;

        inner
            .bounded(deadline, inner.client.delete_object(&inner.bucket, &key))
            .await
            .map_err(|err| {
                error!(error = %err, key = %key, "blob delete failed");
                BlobStoreError::Delete { key, source: err }
            })?;

        debug!(duration_ms = start.elapsed().as_millis(), "blob deleted");
        Ok(())
    }
}
