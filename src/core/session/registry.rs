// src/core/session/registry.rs

//! The `SessionRegistry`, the single owner of all logical session records.

use super::{AuthenticatedUser, Session, SessionId};
use crate::core::GatewayError;
use crate::core::protocol::{Document, ErrorCode, Value};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// The request field carrying the logical session id.
pub const LSID_FIELD: &str = "lsid";

#[derive(Debug)]
struct SessionRecord {
    last_use: Instant,
    authenticated_user: Option<AuthenticatedUser>,
}

/// A concurrent map of logical sessions.
///
/// Every operation locks only the shard holding the affected id and never
/// awaits, so records are always observed whole and per-id operations are
/// linearizable.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionRecord>,
    /// Number of live records, kept separately so the cap can be checked
    /// while a shard lock is held.
    live: AtomicUsize,
    /// `0` means unlimited.
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            live: AtomicUsize::new(0),
            max_sessions,
        }
    }

    /// Ensures a record exists for `id` and advances its last-use time to `now`.
    ///
    /// Returns a snapshot of the record and whether it was created by this
    /// call. The stored last-use time never moves backwards, so concurrent
    /// callers leave it at the latest `now` any of them passed.
    pub fn create_or_update(
        &self,
        id: &SessionId,
        now: Instant,
    ) -> Result<(Session, bool), GatewayError> {
        self.upsert(id, now, |_| {})
    }

    /// Extracts `lsid` from a request and touches the corresponding session.
    ///
    /// Requests without `lsid` have no session and yield `Ok(None)`.
    pub fn create_or_update_by_lsid(
        &self,
        request: &Document,
        now: Instant,
    ) -> Result<Option<(Session, bool)>, GatewayError> {
        let Some(lsid) = request.get(LSID_FIELD) else {
            return Ok(None);
        };
        let id = parse_lsid(lsid, LSID_FIELD)?;
        self.create_or_update(&id, now).map(Some)
    }

    /// Touches every well-formed session id in `ids`. Malformed entries are
    /// skipped. Returns the number of sessions refreshed.
    pub fn refresh_many(&self, ids: &[Value], now: Instant) -> usize {
        let mut refreshed = 0;
        for (i, value) in ids.iter().enumerate() {
            let touched = parse_lsid(value, &format!("refreshSessions.{i}"))
                .and_then(|id| self.create_or_update(&id, now));
            match touched {
                Ok(_) => refreshed += 1,
                Err(e) => debug!("Skipping session entry {} during refresh: {}", i, e),
            }
        }
        refreshed
    }

    /// Removes every well-formed session id in `ids`. Malformed and unknown
    /// entries are skipped. Returns the number of sessions removed.
    pub fn end_many(&self, ids: &[Value]) -> usize {
        let mut ended = 0;
        for (i, value) in ids.iter().enumerate() {
            match parse_lsid(value, &format!("endSessions.{i}")) {
                Ok(id) => {
                    if self.remove(&id) {
                        ended += 1;
                    }
                }
                Err(e) => debug!("Skipping session entry {} while ending sessions: {}", i, e),
            }
        }
        ended
    }

    /// Records a successful authentication, creating the session if needed.
    pub fn bind_authenticated_user(
        &self,
        id: &SessionId,
        user: AuthenticatedUser,
        now: Instant,
    ) -> Result<(), GatewayError> {
        self.upsert(id, now, move |record| {
            record.authenticated_user = Some(user);
        })
        .map(|_| ())
    }

    /// Clears the authenticated user. Unknown sessions and sessions that are
    /// not authenticated are left untouched. Returns whether a user was
    /// logged out.
    pub fn logout(&self, id: &SessionId) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut record) => record.authenticated_user.take().is_some(),
            None => false,
        }
    }

    pub fn authenticated_user(&self, id: &SessionId) -> Option<AuthenticatedUser> {
        self.sessions
            .get(id)
            .and_then(|record| record.authenticated_user.clone())
    }

    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|record| snapshot(id, &record))
    }

    /// Removes sessions whose last use is older than `now - idle_timeout`.
    /// Returns the number of sessions removed.
    pub fn expire(&self, now: Instant, idle_timeout: Duration) -> usize {
        let Some(cutoff) = now.checked_sub(idle_timeout) else {
            return 0;
        };
        let mut removed = 0;
        self.sessions.retain(|_, record| {
            let keep = record.last_use >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        self.live.fetch_sub(removed, Ordering::SeqCst);
        removed
    }

    pub fn len(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: &SessionId) -> bool {
        if self.sessions.remove(id).is_some() {
            self.live.fetch_sub(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    fn upsert(
        &self,
        id: &SessionId,
        now: Instant,
        update: impl FnOnce(&mut SessionRecord),
    ) -> Result<(Session, bool), GatewayError> {
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if now > record.last_use {
                    record.last_use = now;
                }
                update(record);
                Ok((snapshot(id, record), false))
            }
            Entry::Vacant(entry) => {
                if self.max_sessions > 0
                    && self.live.fetch_add(1, Ordering::SeqCst) >= self.max_sessions
                {
                    self.live.fetch_sub(1, Ordering::SeqCst);
                    return Err(GatewayError::protocol(
                        ErrorCode::TooManyLogicalSessions,
                        format!(
                            "Unable to add session into the cache because the number of active sessions is too high ({})",
                            self.max_sessions
                        ),
                    ));
                }
                if self.max_sessions == 0 {
                    self.live.fetch_add(1, Ordering::SeqCst);
                }
                let mut record = SessionRecord {
                    last_use: now,
                    authenticated_user: None,
                };
                update(&mut record);
                let session = snapshot(id, &record);
                entry.insert(record);
                debug!("Created logical session {}.", id);
                Ok((session, true))
            }
        }
    }
}

fn snapshot(id: &SessionId, record: &SessionRecord) -> Session {
    Session {
        id: id.clone(),
        last_use: record.last_use,
        authenticated_user: record.authenticated_user.clone(),
    }
}

/// Parses a `{id: <binary>}` session descriptor. `field` names the value in
/// error messages.
pub fn parse_lsid(value: &Value, field: &str) -> Result<SessionId, GatewayError> {
    let Some(doc) = value.as_document() else {
        return Err(GatewayError::with_argument(
            ErrorCode::TypeMismatch,
            format!(
                "BSON field '{field}' is the wrong type '{}', expected type 'object'",
                value.type_name()
            ),
            field,
        ));
    };
    let Some(id) = doc.get("id") else {
        return Err(GatewayError::with_argument(
            ErrorCode::MissingField,
            format!("BSON field '{field}.id' is missing but a required field"),
            field,
        ));
    };
    let Some(bytes) = id.as_binary() else {
        return Err(GatewayError::with_argument(
            ErrorCode::TypeMismatch,
            format!(
                "BSON field '{field}.id' is the wrong type '{}', expected type 'binData'",
                id.type_name()
            ),
            field,
        ));
    };
    if bytes.is_empty() {
        return Err(GatewayError::with_argument(
            ErrorCode::BadValue,
            format!("BSON field '{field}.id' must not be empty"),
            field,
        ));
    }
    Ok(SessionId::new(bytes.clone()))
}
