// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Mediator - Session Relay for Signing Ceremonies
//!
//! Rendezvous and store-and-forward mailbox server. Peers running a
//! distributed key generation or threshold signing ceremony register in a
//! session, discover each other, and exchange opaque protocol messages through
//! per-recipient mailboxes. State is held in memory only.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `config` - Environment-driven runtime configuration
//! - `storage` - Concurrency-safe cache, session registry, mailbox relay

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
