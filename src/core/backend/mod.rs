// src/core/backend/mod.rs

//! The interface the gateway needs from the storage backend.
//!
//! Each pooled connection exposes one async method per backend operation. Every
//! method receives the request's cancellation token and is expected to abort
//! promptly once it fires.

pub mod memory;

use crate::core::errors::BackendError;
use crate::core::protocol::Document;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use memory::{MemoryBackend, MemoryStore};

/// One live connection to the backend.
#[async_trait]
pub trait BackendConnection: Send + Sync + std::fmt::Debug {
    /// Creates a collection. Fails with `NamespaceExists` if it already exists.
    async fn create_collection(
        &mut self,
        cancel: &CancellationToken,
        db: &str,
        collection: &str,
    ) -> Result<(), BackendError>;

    /// Drops a collection, returning whether anything was dropped.
    async fn drop_collection(
        &mut self,
        cancel: &CancellationToken,
        db: &str,
        collection: &str,
    ) -> Result<bool, BackendError>;

    /// Returns storage statistics for a collection, with sizes divided by `scale`.
    async fn coll_stats(
        &mut self,
        cancel: &CancellationToken,
        db: &str,
        collection: &str,
        scale: f64,
    ) -> Result<Document, BackendError>;

    /// Cheap liveness check used before handing out an idle connection.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Opens new backend connections on behalf of the pool.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BackendConnection>, BackendError>;
}
