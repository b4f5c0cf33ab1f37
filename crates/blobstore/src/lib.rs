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

//! Content-addressable blob storage for PlexMail attachments.
//!
//! ## Purpose
//! Stores attachment payloads in S3-compatible object storage (AWS S3, MinIO,
//! LocalStack) addressed by the SHA-256 digest of their bytes. Identical
//! attachments are uploaded once and shared by reference; callers hold only
//! the 64-char hex blob ID.
//!
//! ## Architecture
//! ```text
//! S3BlobStore          - dedup, digest addressing, per-call timeouts
//!     |  S3Api trait   - the five S3 calls the store consumes
//! S3Client             - aws-sdk-s3, path-style addressing, retries disabled
//!     |
//! S3-compatible backend (AWS S3 / MinIO / LocalStack)
//! ```
//!
//! A handle is constructed either enabled (live client) or disabled (every
//! operation fails fast with [`BlobStoreError::NotEnabled`], no network
//! calls); the mode is fixed at construction. There are no internal threads
//! or locks and no retry policy: one bounded attempt per backend call.
//!
//! ## Usage
//! ```rust,no_run
//! use plexmail_blobstore::{BlobStoreConfig, S3BlobStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = S3BlobStore::new(BlobStoreConfig::from_env()).await?;
//!
//! if store.is_enabled() {
//!     let blob_id = store.store(b"attachment payload").await?;
//!     assert!(store.exists(&blob_id).await?);
//!     let content = store.retrieve(&blob_id).await?;
//!     assert_eq!(content, b"attachment payload");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod store;

pub use client::{ObjectBody, S3Api, S3Client};
pub use config::{BlobStoreConfig, DEFAULT_BUCKET, DEFAULT_REGION, DEFAULT_TIMEOUT_SECS};
pub use error::{BackendError, BlobStoreError, BlobStoreResult};
pub use store::{blob_id, storage_key, S3BlobStore};
