// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Storage
//!
//! All relay state lives in one shared [`Cache`] owned by the process. There
//! is no persistence: a restart silently discards every session and mailbox.
//!
//! ## Key Layout
//!
//! ```text
//! session-{session_id}                          # participant registry
//! start-{session_id}                            # committee announced by the initiator
//! {session_id}-{recipient}                      # mailbox
//! {session_id}-{recipient}-{message_id}         # mailbox scoped to one keysign message
//! ```
//!
//! Keys are a typed [`CacheKey`], so entries of different kinds can never
//! collide even if identifiers contain the separator. The layout above is only
//! how keys are rendered in logs.
//!
//! ## Trust Boundary
//!
//! Nothing binds a caller to the participant or recipient identifier it
//! claims. Anyone who knows a session ID can read or inject messages in it.
//!
//! ## Memory
//!
//! The entry ceiling bounds stored state, not pending work. Writes go onto an
//! unbounded queue in front of the cache actor, so a burst of posts grows that
//! queue until the actor drains it.

use std::fmt;

use crate::models::{Message, Session};

pub mod cache;
pub mod mailbox;
pub mod sessions;

pub use cache::{Cache, CacheError, CacheResult, CacheStats, DEFAULT_CAPACITY};
pub use mailbox::MailboxRelay;
pub use sessions::SessionRegistry;

/// The cache shared by the session registry and the mailbox relay.
pub type RelayCache = Cache<CacheKey, Entry>;

/// Namespaced key into the shared cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Session(String),
    Start(String),
    Mailbox {
        session_id: String,
        recipient: String,
        message_id: Option<String>,
    },
}

impl CacheKey {
    pub fn session(session_id: &str) -> Self {
        CacheKey::Session(session_id.to_string())
    }

    pub fn start(session_id: &str) -> Self {
        CacheKey::Start(session_id.to_string())
    }

    pub fn mailbox(session_id: &str, recipient: &str, message_id: Option<&str>) -> Self {
        CacheKey::Mailbox {
            session_id: session_id.to_string(),
            recipient: recipient.to_string(),
            message_id: message_id.map(str::to_string),
        }
    }

    /// Session this key belongs to.
    pub fn session_id(&self) -> &str {
        match self {
            CacheKey::Session(id) | CacheKey::Start(id) => id,
            CacheKey::Mailbox { session_id, .. } => session_id,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Session(id) => write!(f, "session-{id}"),
            CacheKey::Start(id) => write!(f, "start-{id}"),
            CacheKey::Mailbox {
                session_id,
                recipient,
                message_id: None,
            } => write!(f, "{session_id}-{recipient}"),
            CacheKey::Mailbox {
                session_id,
                recipient,
                message_id: Some(message_id),
            } => write!(f, "{session_id}-{recipient}-{message_id}"),
        }
    }
}

/// Value stored in the shared cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Session(Session),
    Start(Vec<String>),
    Mailbox(Vec<Message>),
}

impl Entry {
    pub fn kind(&self) -> &'static str {
        match self {
            Entry::Session(_) => "session",
            Entry::Start(_) => "start",
            Entry::Mailbox(_) => "mailbox",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Build the error for an entry of the wrong kind at `key`.
pub(crate) fn decode_error(key: &CacheKey, expected: &'static str) -> StorageError {
    StorageError::Cache(CacheError::Decode {
        key: key.to_string(),
        expected,
    })
}
