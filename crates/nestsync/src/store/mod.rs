//! Storage queries for collections, memberships, properties, and the ledger.
//!
//! Functions that participate in the per-collection merge transaction are
//! generic over [`sea_orm::ConnectionTrait`] so they can run against either
//! the pooled connection or an open transaction.

pub mod collections;
mod errors;
pub mod memberships;
pub mod properties;

pub use errors::{Result, StoreError};
