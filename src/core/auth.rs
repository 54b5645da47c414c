// src/core/auth.rs

//! The static user store used by the `authenticate` command.

use crate::config::{AuthConfig, UserConfig};
use crate::core::session::AuthenticatedUser;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use std::time::Duration;
use tracing::debug;

/// Delay applied before reporting a failed authentication attempt.
pub const AUTH_FAILURE_DELAY: Duration = Duration::from_millis(100);

/// Users loaded from the `[auth]` configuration section.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    enabled: bool,
    users: Vec<UserConfig>,
}

impl UserStore {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            enabled: config.enabled,
            users: config.users.clone(),
        }
    }

    /// True if protected commands require an authenticated session.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Checks a username/password pair against the stored Argon2 hashes.
    ///
    /// `db` must match the user's authentication database.
    pub fn verify(&self, username: &str, db: &str, password: &str) -> Option<AuthenticatedUser> {
        let user = self
            .users
            .iter()
            .find(|u| u.username == username && u.db == db)?;
        let parsed_hash = match PasswordHash::new(&user.password_hash) {
            Ok(hash) => hash,
            Err(e) => {
                debug!("Stored hash for user '{}' is unreadable: {}", username, e);
                return None;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .ok()
            .map(|_| AuthenticatedUser {
                username: user.username.clone(),
                db: user.db.clone(),
            })
    }
}
