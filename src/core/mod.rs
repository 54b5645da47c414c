// src/core/mod.rs

//! The central module containing the gateway's core logic: sessions, the
//! backend connection pool, error translation and command dispatch.

pub mod auth;
pub mod backend;
pub mod commands;
pub mod errors;
pub mod handler;
pub mod metrics;
pub mod pool;
pub mod protocol;
pub mod session;
pub mod state;
pub mod tasks;

pub use commands::Command;
pub use errors::{BackendError, GatewayError};
pub use protocol::{Document, ProtocolError, Value};
