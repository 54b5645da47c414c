// src/core/session/mod.rs

//! Logical session tracking.
//!
//! Sessions are keyed by the client-supplied `lsid.id` and are created
//! implicitly by the first command that references them.

mod registry;

pub use registry::SessionRegistry;

use bytes::Bytes;
use std::fmt;
use std::time::Instant;

/// The opaque binary identifier of a logical session.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Bytes);

impl SessionId {
    pub fn new(id: impl Into<Bytes>) -> Self {
        Self(id.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", hex::encode(&self.0))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// A user bound to a session by successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    /// The authentication database.
    pub db: String,
}

/// A snapshot of one session record.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub last_use: Instant,
    pub authenticated_user: Option<AuthenticatedUser>,
}
