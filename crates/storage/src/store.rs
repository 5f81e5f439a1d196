// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

use crate::error::StorageError;
use crate::retry;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use shepherd_core::{BlobRef, StorageConfig};
use tracing::warn;

use crate::retry::MAX_ATTEMPTS;

/// Anything that can fetch and store job payload blobs.
///
/// Abstracted behind a trait so the engine can be exercised in tests
/// against an in-memory fake instead of a running object store.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn get(&self, blob: &BlobRef) -> Result<Bytes, StorageError>;
    async fn put(&self, blob: &BlobRef, data: Bytes) -> Result<(), StorageError>;
}

/// S3-compatible storage adapter, configured against a MinIO-style
/// endpoint with path-style addressing.
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Resolves credentials through `aws-config`'s static provider seeded
    /// from the loaded `StorageConfig`, then layers the MinIO-style
    /// endpoint override and path-style addressing on top via
    /// `aws-sdk-s3`'s own builder. Async because `aws-config` loads its
    /// shared config asynchronously even for a static provider.
    pub async fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "shepherd-storage-config",
        );
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .endpoint_url(&config.endpoint_url)
            .force_path_style(config.force_path_style)
            .build();
        Self {
            client: Client::from_conf(s3_config),
        }
    }

    fn classify_get_error(err: &aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::get_object::GetObjectError>) -> StorageError {
        use aws_sdk_s3::operation::get_object::GetObjectError;
        match err.as_service_error() {
            Some(GetObjectError::NoSuchKey(_)) => StorageError::Permanent(err.to_string()),
            Some(_) => StorageError::Transient(err.to_string()),
            None => StorageError::Transient(err.to_string()),
        }
    }

    fn classify_put_error(err: &aws_sdk_s3::error::SdkError<aws_sdk_s3::operation::put_object::PutObjectError>) -> StorageError {
        StorageError::Transient(err.to_string())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn get(&self, blob: &BlobRef) -> Result<Bytes, StorageError> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let result = self
                .client
                .get_object()
                .bucket(&blob.bucket)
                .key(&blob.key)
                .send()
                .await;
            match result {
                Ok(output) => {
                    let data = output
                        .body
                        .collect()
                        .await
                        .map_err(|e| StorageError::Transient(e.to_string()))?;
                    return Ok(data.into_bytes());
                }
                Err(err) => {
                    let classified = Self::classify_get_error(&err);
                    if !classified.is_retryable() {
                        return Err(classified);
                    }
                    warn!(attempt, bucket = %blob.bucket, key = %blob.key, "get_object failed, retrying");
                    last_err = Some(classified);
                    retry::sleep_for_attempt(attempt).await;
                }
            }
        }
        Err(StorageError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
            source: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }

    async fn put(&self, blob: &BlobRef, data: Bytes) -> Result<(), StorageError> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let body = ByteStream::from(data.clone());
            let result = self
                .client
                .put_object()
                .bucket(&blob.bucket)
                .key(&blob.key)
                .body(body)
                .send()
                .await;
            match result {
                Ok(_) => return Ok(()),
                Err(err) => {
                    let classified = Self::classify_put_error(&err);
                    if !classified.is_retryable() {
                        return Err(classified);
                    }
                    warn!(attempt, bucket = %blob.bucket, key = %blob.key, "put_object failed, retrying");
                    last_err = Some(classified);
                    retry::sleep_for_attempt(attempt).await;
                }
            }
        }
        Err(StorageError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
            source: last_err.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
