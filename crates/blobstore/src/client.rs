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

//! S3 backend client for the blob store.
//!
//! ## Purpose
//! Defines [`S3Api`], the narrow set of S3 operations the store consumes, and
//! [`S3Client`], the real implementation over `aws-sdk-s3`. The trait keeps
//! store logic testable against in-memory mocks and keeps SDK error mapping
//! in one place: absence becomes [`BackendError::NotFound`], everything else
//! becomes [`BackendError::Service`] with the full rendered error chain.

use crate::config::BlobStoreConfig;
use crate::error::{BackendError, BlobStoreError, BlobStoreResult};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Builder, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use tracing::debug;

/// The S3 operations the blob store consumes.
///
/// Implemented by [`S3Client`] for real backends and by test mocks, so store
/// behavior (dedup, error wrapping, timeouts) can be exercised without a live
/// server.
#[async_trait]
pub trait S3Api: Send + Sync {
    /// Create a bucket. An already-existing bucket is success.
    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError>;

    /// Upload an object under `key` with the given content type.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), BackendError>;

    /// Fetch an object. The returned [`ObjectBody`] is drained separately so
    /// a connection dropped mid-body surfaces as a read failure, not a fetch
    /// failure.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, BackendError>;

    /// Metadata probe. Returns [`BackendError::NotFound`] for absent keys.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<(), BackendError>;

    /// Delete an object. Deleting an absent key is success at the backend.
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError>;
}

/// Byte stream of a fetched object.
pub struct ObjectBody {
    stream: BoxStream<'static, Result<Bytes, BackendError>>,
}

impl ObjectBody {
    /// Wrap a chunk stream.
    pub fn from_stream(stream: BoxStream<'static, Result<Bytes, BackendError>>) -> Self {
        Self { stream }
    }

    /// Wrap fully-buffered bytes as a single-chunk body.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            stream: futures::stream::iter([Ok(bytes)]).boxed(),
        }
    }

    /// Drain the stream fully into memory.
    pub async fn collect(mut self) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.stream.try_next().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

/// Real S3 client over the AWS SDK.
///
/// Uses path-style addressing (required for MinIO/LocalStack) and disables
/// SDK-level retries: the store contract is a single attempt per call, with
/// retry policy left to callers.
#[derive(Debug, Clone)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Build a client from configuration with defaults already applied.
    ///
    /// ## Arguments
    /// * `config` - Store configuration; `region` must be non-empty and
    ///   `endpoint`, when set, must be an http(s) URL
    ///
    /// ## Returns
    /// The connected client, or [`BlobStoreError::ConnectionSetup`] when the
    /// endpoint override is malformed.
    pub async fn connect(config: &BlobStoreConfig) -> BlobStoreResult<Self> {
        if let Some(endpoint) = config.endpoint.as_deref() {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(BlobStoreError::ConnectionSetup(format!(
                    "endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        let credentials = Credentials::new(&config.access_key, &config.secret_key, None, None, "static");

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = config.endpoint.as_deref() {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = Builder::from(&sdk_config).force_path_style(true).build();

        debug!(
            region = %config.region,
            endpoint = ?config.endpoint,
            "S3 client configured"
        );
        Ok(Self {
            client: Client::from_conf(s3_config),
        })
    }
}

/// Render an SDK error with its full cause chain.
///
/// `SdkError`'s own `Display` is truncated; the context wrapper keeps the
/// service/transport cause visible in our error messages.
fn sdk_error<E>(err: &SdkError<E>) -> BackendError
where
    E: std::error::Error + 'static,
{
    BackendError::Service {
        message: format!("{}", DisplayErrorContext(err)),
    }
}

#[async_trait]
impl S3Api for S3Client {
    async fn create_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let already_exists = err.as_service_error().map_or(false, |e| {
                    e.is_bucket_already_exists() || e.is_bucket_already_owned_by_you()
                });
                if already_exists {
                    debug!(bucket = %bucket, "bucket already exists");
                    Ok(())
                } else {
                    Err(sdk_error(&err))
                }
            }
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), BackendError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| sdk_error(&err))?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, BackendError> {
        match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => {
                let stream = futures::stream::try_unfold(output.body, |mut body| async move {
                    match body.try_next().await {
                        Ok(Some(chunk)) => Ok(Some((chunk, body))),
                        Ok(None) => Ok(None),
                        Err(err) => Err(BackendError::Service {
                            message: format!("{}", DisplayErrorContext(&err)),
                        }),
                    }
                });
                Ok(ObjectBody::from_stream(stream.boxed()))
            }
            Err(err) => {
                if err.as_service_error().map_or(false, |e| e.is_no_such_key()) {
                    Err(BackendError::NotFound {
                        key: key.to_string(),
                    })
                } else {
                    Err(sdk_error(&err))
                }
            }
        }
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                if err.as_service_error().map_or(false, |e| e.is_not_found()) {
                    Err(BackendError::NotFound {
                        key: key.to_string(),
                    })
                } else {
                    Err(sdk_error(&err))
                }
            }
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| sdk_error(&err))?;
        Ok(())
    }
}
