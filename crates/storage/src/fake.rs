// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! In-memory storage fake for engine/daemon tests.

use crate::error::StorageError;
use crate::store::Storage;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use shepherd_core::BlobRef;
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeStorage {
    blobs: Mutex<HashMap<(String, String), Bytes>>,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, blob: &BlobRef, data: impl Into<Bytes>) {
        self.blobs
            .lock()
            .insert((blob.bucket.clone(), blob.key.clone()), data.into());
    }

    pub fn contains(&self, blob: &BlobRef) -> bool {
        self.blobs
            .lock()
            .contains_key(&(blob.bucket.clone(), blob.key.clone()))
    }
}

#[async_trait]
impl Storage for FakeStorage {
    async fn get(&self, blob: &BlobRef) -> Result<Bytes, StorageError> {
        self.blobs
            .lock()
            .get(&(blob.bucket.clone(), blob.key.clone()))
            .cloned()
            .ok_or_else(|| StorageError::Permanent(format!("no such key: {}/{}", blob.bucket, blob.key)))
    }

    async fn put(&self, blob: &BlobRef, data: Bytes) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .insert((blob.bucket.clone(), blob.key.clone()), data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let storage = FakeStorage::new();
        let blob = BlobRef::new("bucket", "key");
        storage.put(&blob, Bytes::from_static(b"hello")).await.unwrap();
        let data = storage.get(&blob).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn get_missing_key_is_permanent_error() {
        let storage = FakeStorage::new();
        let blob = BlobRef::new("bucket", "missing");
        let err = storage.get(&blob).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
