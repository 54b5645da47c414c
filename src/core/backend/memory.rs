// src/core/backend/memory.rs

//! An in-process backend that keeps collection metadata in a shared map.
//!
//! It stands in for the relational document store so the gateway can run and be
//! tested without external services. An optional per-operation latency makes
//! cancellation and pool contention observable.

use super::{BackendConnection, ConnectionFactory};
use crate::core::errors::BackendError;
use crate::core::protocol::{Document, ErrorCode, Value};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Bytes reserved for a freshly created collection's heap.
const EMPTY_COLLECTION_STORAGE: u64 = 8192;
/// Bytes reserved for the default `_id_` index.
const ID_INDEX_SIZE: u64 = 8192;

/// Storage metadata for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionMeta {
    pub count: u64,
    pub data_size: u64,
    pub storage_size: u64,
    pub index_sizes: Vec<(String, u64)>,
}

impl Default for CollectionMeta {
    fn default() -> Self {
        Self {
            count: 0,
            data_size: 0,
            storage_size: EMPTY_COLLECTION_STORAGE,
            index_sizes: vec![("_id_".to_string(), ID_INDEX_SIZE)],
        }
    }
}

/// The shared state behind every connection of a `MemoryBackend`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<(String, String), CollectionMeta>,
}

impl MemoryStore {
    pub fn contains(&self, db: &str, collection: &str) -> bool {
        self.collections
            .contains_key(&(db.to_string(), collection.to_string()))
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Connection factory for the in-memory backend.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    store: Arc<MemoryStore>,
    latency: Duration,
    opened: Arc<AtomicU64>,
}

impl MemoryBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            store: Arc::new(MemoryStore::default()),
            latency,
            opened: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Total number of connections opened by this factory.
    pub fn connections_opened(&self) -> u64 {
        self.opened.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ConnectionFactory for MemoryBackend {
    async fn connect(&self) -> Result<Box<dyn BackendConnection>, BackendError> {
        let id = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Opened in-memory backend connection #{}", id);
        Ok(Box::new(MemoryConnection {
            id,
            store: self.store.clone(),
            latency: self.latency,
        }))
    }
}

#[derive(Debug)]
struct MemoryConnection {
    id: u64,
    store: Arc<MemoryStore>,
    latency: Duration,
}

impl MemoryConnection {
    /// Waits out the configured latency unless the token fires first.
    async fn round_trip(&self, cancel: &CancellationToken) -> Result<(), BackendError> {
        if cancel.is_cancelled() {
            return Err(BackendError::Canceled);
        }
        if self.latency.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Backend connection #{} aborted an in-flight operation.", self.id);
                Err(BackendError::Canceled)
            }
            _ = tokio::time::sleep(self.latency) => Ok(()),
        }
    }
}

#[async_trait]
impl BackendConnection for MemoryConnection {
    async fn create_collection(
        &mut self,
        cancel: &CancellationToken,
        db: &str,
        collection: &str,
    ) -> Result<(), BackendError> {
        self.round_trip(cancel).await?;
        let key = (db.to_string(), collection.to_string());
        match self.store.collections.entry(key) {
            Entry::Occupied(_) => Err(BackendError::Reported {
                code: ErrorCode::NamespaceExists.code(),
                message: format!("Collection {db}.{collection} already exists."),
            }),
            Entry::Vacant(slot) => {
                slot.insert(CollectionMeta::default());
                Ok(())
            }
        }
    }

    async fn drop_collection(
        &mut self,
        cancel: &CancellationToken,
        db: &str,
        collection: &str,
    ) -> Result<bool, BackendError> {
        self.round_trip(cancel).await?;
        Ok(self
            .store
            .collections
            .remove(&(db.to_string(), collection.to_string()))
            .is_some())
    }

    async fn coll_stats(
        &mut self,
        cancel: &CancellationToken,
        db: &str,
        collection: &str,
        scale: f64,
    ) -> Result<Document, BackendError> {
        self.round_trip(cancel).await?;
        if !scale.is_finite() || scale < 1.0 {
            return Err(BackendError::Reported {
                code: ErrorCode::BadValue.code(),
                message: format!("BSON field 'scale' value must be >= 1, actual value '{scale}'"),
            });
        }

        let meta = self
            .store
            .collections
            .get(&(db.to_string(), collection.to_string()))
            .map(|m| m.value().clone())
            .ok_or_else(|| BackendError::Reported {
                code: ErrorCode::NamespaceNotFound.code(),
                message: format!("Collection [{db}.{collection}] not found."),
            })?;

        let total_index_size: u64 = meta.index_sizes.iter().map(|(_, size)| size).sum();
        let index_sizes: Document = meta
            .index_sizes
            .iter()
            .map(|(name, size)| (name.clone(), scaled(*size, scale)))
            .collect();
        let avg_obj_size = meta.data_size.checked_div(meta.count).unwrap_or(0);

        let mut stats = Document::new()
            .with("ns", format!("{db}.{collection}"))
            .with("size", scaled(meta.data_size, scale))
            .with("count", int_value(meta.count));
        if meta.count > 0 {
            stats.insert("avgObjSize", int_value(avg_obj_size));
        }
        stats.insert("storageSize", scaled(meta.storage_size, scale));
        stats.insert("nindexes", int_value(meta.index_sizes.len() as u64));
        stats.insert("totalIndexSize", scaled(total_index_size, scale));
        stats.insert("totalSize", scaled(meta.storage_size + total_index_size, scale));
        stats.insert("indexSizes", index_sizes);
        stats.insert("scaleFactor", int_value(scale.trunc() as u64));
        Ok(stats)
    }
}

fn scaled(bytes: u64, scale: f64) -> Value {
    int_value((bytes as f64 / scale).trunc() as u64)
}

fn int_value(v: u64) -> Value {
    match i32::try_from(v) {
        Ok(small) => Value::Int32(small),
        Err(_) => Value::Int64(i64::try_from(v).unwrap_or(i64::MAX)),
    }
}
