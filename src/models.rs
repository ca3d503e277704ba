// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Wire types exchanged with ceremony peers. The relay never interprets a
//! message body; it is an opaque string produced and consumed by peers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Participants registered under a session ID.
///
/// The participant list is append-only and keeps join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: String,
    pub participants: Vec<String>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, participants: Vec<String>) -> Self {
        Self {
            session_id: session_id.into(),
            participants,
        }
    }
}

/// A ceremony message addressed to one or more participants.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Message {
    /// Session the message belongs to.
    pub session_id: String,
    /// Sender participant ID.
    pub from: String,
    /// Recipient participant IDs. Each gets its own copy.
    pub to: Vec<String>,
    /// Opaque protocol payload.
    pub body: String,
    /// Sender-computed digest of the body, used to acknowledge delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Sender-side counter so peers can reorder what they drain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_no: Option<i64>,
}
