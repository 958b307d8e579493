//! Notification intents derived from finalized sync runs.
//!
//! The sync engine never talks to mail or push services. It derives intents
//! from the committed run row and hands them to a [`NotificationSink`].
//! Because derivation reads only committed state and every intent carries a
//! key built from the run id, re-deriving after a crash or retry produces
//! the same intents and sinks can dedup on the key.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::entity::prelude::{CollectionModel, SyncRunModel};

/// Event emitted to the collection's visitor when a sync adds listings.
pub const EVENT_NEW_MATCHES: &str = "new-matches";
/// Event emitted to the owning agent per listing that left the market.
pub const EVENT_LISTING_UNAVAILABLE: &str = "listing-unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    Visitor,
    Agent,
}

/// One notification to be delivered, with enough context to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub recipient_role: RecipientRole,
    pub event_type: String,
    pub collection_id: Uuid,
    pub run_id: Uuid,
    /// Set for per-listing events, absent for batch events.
    pub property_id: Option<Uuid>,
    /// Listings added by the run.
    pub added_count: u32,
    /// Active members after the run.
    pub total_count: u32,
}

impl NotificationIntent {
    /// Stable dedup key: the same run always yields the same keys.
    pub fn intent_key(&self) -> String {
        match self.property_id {
            Some(property_id) => format!(
                "{}:{}:{}:{}",
                self.event_type, self.collection_id, property_id, self.run_id
            ),
            None => format!("{}:{}:{}", self.event_type, self.collection_id, self.run_id),
        }
    }
}

/// Derive every intent a finalized run implies.
///
/// `unavailable_property_ids` are the properties the run marked
/// unavailable; they become per-listing agent events. Runs that changed
/// nothing, and collections without the matching recipient, yield nothing.
pub fn intents_for_run(
    collection: &CollectionModel,
    run: &SyncRunModel,
    unavailable_property_ids: &[Uuid],
) -> Vec<NotificationIntent> {
    let mut intents = Vec::new();

    if run.added > 0 && collection.visitor_email.is_some() {
        intents.push(NotificationIntent {
            recipient_role: RecipientRole::Visitor,
            event_type: EVENT_NEW_MATCHES.to_string(),
            collection_id: collection.id,
            run_id: run.id,
            property_id: None,
            added_count: run.added.max(0) as u32,
            total_count: run.total_active.max(0) as u32,
        });
    }

    if collection.agent_id.is_some() {
        for property_id in unavailable_property_ids {
            intents.push(NotificationIntent {
                recipient_role: RecipientRole::Agent,
                event_type: EVENT_LISTING_UNAVAILABLE.to_string(),
                collection_id: collection.id,
                run_id: run.id,
                property_id: Some(*property_id),
                added_count: run.added.max(0) as u32,
                total_count: run.total_active.max(0) as u32,
            });
        }
    }

    intents
}

/// Delivery boundary for notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, intent: &NotificationIntent) -> anyhow::Result<()>;
}

/// A sink that only logs. The default until a real mail/push sink is wired
/// in by the host application.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, intent: &NotificationIntent) -> anyhow::Result<()> {
        info!(
            key = %intent.intent_key(),
            event = %intent.event_type,
            collection_id = %intent.collection_id,
            added = intent.added_count,
            total = intent.total_count,
            "notification intent"
        );
        Ok(())
    }
}

/// Wraps any sink with in-process dedup on the intent key, so a run whose
/// intents get derived twice still delivers each notification once.
pub struct DedupSink<S> {
    inner: S,
    seen: Mutex<HashSet<String>>,
}

impl<S> DedupSink<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            seen: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl<S: NotificationSink> NotificationSink for DedupSink<S> {
    async fn deliver(&self, intent: &NotificationIntent) -> anyhow::Result<()> {
        let key = intent.intent_key();
        {
            let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
            if !seen.insert(key) {
                return Ok(());
            }
        }
        self.inner.deliver(intent).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records every delivered intent.
    #[derive(Default)]
    pub struct RecordingSink {
        pub delivered: Mutex<Vec<NotificationIntent>>,
    }

    impl RecordingSink {
        pub fn intents(&self) -> Vec<NotificationIntent> {
            self.delivered.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, intent: &NotificationIntent) -> anyhow::Result<()> {
            self.delivered
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(intent.clone());
            Ok(())
        }
    }
}
