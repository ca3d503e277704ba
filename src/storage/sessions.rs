// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session registry.
//!
//! Tracks which participants joined a session, plus the committee the
//! initiator announces once discovery is over.

use tracing::{debug, warn};

use super::{decode_error, CacheKey, Entry, RelayCache, StorageError, StorageResult};
use crate::models::Session;

/// Typed access to session entries in the shared cache.
pub struct SessionRegistry<'a> {
    cache: &'a RelayCache,
    dedup_participants: bool,
}

impl<'a> SessionRegistry<'a> {
    pub fn new(cache: &'a RelayCache) -> Self {
        Self {
            cache,
            dedup_participants: false,
        }
    }

    /// Drop participants that are already registered when joining.
    pub fn dedup_participants(mut self, enabled: bool) -> Self {
        self.dedup_participants = enabled;
        self
    }

    /// Create the session or append `participants` to it.
    pub fn join(&self, session_id: &str, participants: Vec<String>) -> StorageResult<()> {
        let key = CacheKey::session(session_id);
        let dedup = self.dedup_participants;
        let id = session_id.to_string();

        debug!(session_id = %id, participants = ?participants, "Joining session");

        self.cache.update(key, move |current| {
            let session = match current {
                Some(Entry::Session(mut session)) => {
                    append_participants(&mut session.participants, participants, dedup);
                    session
                }
                other => {
                    if let Some(other) = other {
                        warn!(
                            session_id = %id,
                            kind = other.kind(),
                            "Replacing entry of unexpected kind with new session"
                        );
                    }
                    let mut initial = Vec::with_capacity(participants.len());
                    append_participants(&mut initial, participants, dedup);
                    Session::new(id, initial)
                }
            };
            Some(Entry::Session(session))
        })?;

        Ok(())
    }

    /// Current participant list, in join order.
    pub async fn get(&self, session_id: &str) -> StorageResult<Vec<String>> {
        let key = CacheKey::session(session_id);
        match self.cache.get(&key).await? {
            Some(Entry::Session(session)) => Ok(session.participants),
            Some(_) => Err(decode_error(&key, "session")),
            None => Err(StorageError::NotFound(format!("Session {session_id}"))),
        }
    }

    /// Remove the session and its start record. Deleting an absent session is
    /// not an error.
    pub fn delete(&self, session_id: &str) -> StorageResult<()> {
        self.cache.remove(CacheKey::session(session_id))?;
        self.cache.remove(CacheKey::start(session_id))?;
        Ok(())
    }

    /// Record the final committee for the session, replacing any earlier one.
    pub fn start(&self, session_id: &str, participants: Vec<String>) -> StorageResult<()> {
        debug!(session_id = %session_id, participants = ?participants, "Starting session");
        self.cache
            .set(CacheKey::start(session_id), Entry::Start(participants))?;
        Ok(())
    }

    /// Committee announced by [`start`](Self::start).
    pub async fn started(&self, session_id: &str) -> StorageResult<Vec<String>> {
        let key = CacheKey::start(session_id);
        match self.cache.get(&key).await? {
            Some(Entry::Start(participants)) => Ok(participants),
            Some(_) => Err(decode_error(&key, "start")),
            None => Err(StorageError::NotFound(format!(
                "Session {session_id} has not started"
            ))),
        }
    }
}

fn append_participants(existing: &mut Vec<String>, incoming: Vec<String>, dedup: bool) {
    if !dedup {
        existing.extend(incoming);
        return;
    }
    for participant in incoming {
        if !existing.contains(&participant) {
            existing.push(participant);
        }
    }
}
