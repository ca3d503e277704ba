// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-recipient message mailboxes.
//!
//! A posted message is copied into one mailbox per distinct recipient. Reading
//! a mailbox does not drain it; peers acknowledge individual messages by hash
//! once applied.

use tracing::{debug, warn};

use super::{decode_error, CacheKey, Entry, RelayCache, StorageError, StorageResult};
use crate::models::Message;

/// Typed access to mailbox entries in the shared cache.
pub struct MailboxRelay<'a> {
    cache: &'a RelayCache,
}

impl<'a> MailboxRelay<'a> {
    pub fn new(cache: &'a RelayCache) -> Self {
        Self { cache }
    }

    /// Fan `message` out to the mailbox of every recipient in `message.to`.
    ///
    /// Repeated recipients receive a single copy. Returns the number of
    /// mailboxes written.
    pub fn post(
        &self,
        session_id: &str,
        message: Message,
        message_id: Option<&str>,
    ) -> StorageResult<usize> {
        let recipients = distinct_recipients(&message.to);
        if recipients.len() != message.to.len() {
            warn!(
                session_id = %session_id,
                from = %message.from,
                to = ?message.to,
                "Message lists a recipient more than once, delivering one copy each"
            );
        }

        for recipient in &recipients {
            let key = CacheKey::mailbox(session_id, recipient, message_id);
            let copy = message.clone();
            let log_key = key.to_string();
            self.cache.update(key, move |current| {
                let mailbox = match current {
                    Some(Entry::Mailbox(mut mailbox)) => {
                        mailbox.push(copy);
                        mailbox
                    }
                    other => {
                        if let Some(other) = other {
                            warn!(
                                key = %log_key,
                                kind = other.kind(),
                                "Replacing entry of unexpected kind with new mailbox"
                            );
                        }
                        vec![copy]
                    }
                };
                Some(Entry::Mailbox(mailbox))
            })?;
        }

        debug!(
            session_id = %session_id,
            from = %message.from,
            recipients = recipients.len(),
            "Message relayed"
        );
        Ok(recipients.len())
    }

    /// Messages addressed to `recipient`, in arrival order.
    pub async fn get(
        &self,
        session_id: &str,
        recipient: &str,
        message_id: Option<&str>,
    ) -> StorageResult<Vec<Message>> {
        let key = CacheKey::mailbox(session_id, recipient, message_id);
        match self.cache.get(&key).await? {
            Some(Entry::Mailbox(messages)) => Ok(messages),
            Some(_) => Err(decode_error(&key, "mailbox")),
            None => Err(StorageError::NotFound(format!("Mailbox {key}"))),
        }
    }

    /// Remove every message with `hash` from one mailbox. The mailbox itself is
    /// dropped once empty.
    pub fn acknowledge(
        &self,
        session_id: &str,
        recipient: &str,
        message_id: Option<&str>,
        hash: &str,
    ) -> StorageResult<()> {
        let key = CacheKey::mailbox(session_id, recipient, message_id);
        let hash = hash.to_string();
        self.cache.update(key, move |current| match current {
            Some(Entry::Mailbox(mut mailbox)) => {
                mailbox.retain(|message| message.hash.as_deref() != Some(hash.as_str()));
                (!mailbox.is_empty()).then_some(Entry::Mailbox(mailbox))
            }
            other => other,
        })?;
        Ok(())
    }

    /// Remove every mailbox that belongs to `session_id`.
    pub fn purge_session(&self, session_id: &str) -> StorageResult<()> {
        let session_id = session_id.to_string();
        self.cache.remove_where(move |key| {
            matches!(key, CacheKey::Mailbox { .. }) && key.session_id() == session_id
        })?;
        Ok(())
    }
}

fn distinct_recipients(to: &[String]) -> Vec<&str> {
    let mut recipients: Vec<&str> = Vec::with_capacity(to.len());
    for recipient in to {
        if !recipients.contains(&recipient.as_str()) {
            recipients.push(recipient);
        }
    }
    recipients
}
