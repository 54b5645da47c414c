// src/core/protocol/mod.rs

//! Protocol-level data types: documents, their payload codec, and the error
//! taxonomy reported to clients.

pub mod codec;
pub mod document;
pub mod error;

pub use codec::{decode, encode};
pub use document::{Document, Value};
pub use error::{ErrorCode, ProtocolError};
