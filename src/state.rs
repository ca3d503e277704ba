// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::RelayConfig;
use crate::storage::{MailboxRelay, RelayCache, SessionRegistry};

/// Relay service object, built once at startup and shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: RelayCache,
    pub config: Arc<RelayConfig>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Must be called from within a Tokio runtime; spawns the cache actor.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            cache: RelayCache::new(config.cache_capacity),
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }

    pub fn sessions(&self) -> SessionRegistry<'_> {
        SessionRegistry::new(&self.cache).dedup_participants(self.config.dedup_participants)
    }

    pub fn mailboxes(&self) -> MailboxRelay<'_> {
        MailboxRelay::new(&self.cache)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}
