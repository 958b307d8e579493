//! NestSync - a collection synchronization engine for saved property
//! searches.
//!
//! Each collection carries search preferences; the scheduler periodically
//! fetches matching listings from a provider, diffs them against the
//! collection's memberships, merges the changes in one transaction and
//! records the attempt in an append-only sync ledger. Visitor interactions
//! and agent curation survive every merge.
//!
//! # Features
//!
//! - `homescope` - Enables the HomeScope listing client and the reqwest
//!   transport backing it.
//! - `migrate` - Enables database migration support. When enabled, you can
//!   use [`connect_and_migrate`] to run migrations on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nestsync::provider::{ApiRateLimiter, ProviderAdapter, RateLimitedProvider};
//! use nestsync::sync::{Scheduler, SyncEngine, SyncOptions};
//! use nestsync::transport::reqwest_transport::ReqwestTransport;
//!
//! let db = nestsync::connect_and_migrate("sqlite://nestsync.db?mode=rwc").await?;
//! let transport = ReqwestTransport::with_timeout(std::time::Duration::from_secs(30))?;
//! let client = nestsync::HomeScopeClient::new(transport, api_key, base_url)?;
//! let limited = RateLimitedProvider::new(client, ApiRateLimiter::new(2));
//! let adapter = Arc::new(ProviderAdapter::new(Arc::new(limited)));
//! let engine = Arc::new(SyncEngine::new(db, adapter));
//! Scheduler::new(engine, SyncOptions::default()).run().await;
//! ```

pub mod db;
pub mod detail_cache;
pub mod entity;
pub mod notify;
pub mod provider;
pub mod retry;
pub mod store;
pub mod sync;
pub mod transport;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
#[cfg(feature = "homescope")]
pub use provider::HomeScopeClient;
pub use provider::{
    ApiRateLimiter, Listing, ListingProvider, ProviderAdapter, ProviderError, RateLimitedProvider,
};
pub use store::StoreError;
pub use sync::{Scheduler, SyncEngine, SyncError, SyncOptions};
