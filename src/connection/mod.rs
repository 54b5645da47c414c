// src/connection/mod.rs

//! Manages the lifecycle of a single client TCP connection: framing, request
//! cancellation and sequential request processing.

mod guard;
mod handler;

pub use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
