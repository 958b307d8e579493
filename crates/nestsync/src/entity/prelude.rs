//! Common re-exports for convenient entity usage.

pub use super::collection::{
    ActiveModel as CollectionActiveModel, Column as CollectionColumn, CollectionStatus,
    Entity as Collection, Model as CollectionModel,
};
pub use super::membership::{
    ActiveModel as MembershipActiveModel, Column as MembershipColumn, Entity as Membership,
    MembershipSource, MembershipStatus, Model as MembershipModel,
};
pub use super::preference::{
    ActiveModel as PreferenceActiveModel, Column as PreferenceColumn, Entity as Preference,
    Model as PreferenceModel,
};
pub use super::property::{
    ActiveModel as PropertyActiveModel, Column as PropertyColumn, Entity as Property,
    ListingStatus, Model as PropertyModel,
};
pub use super::sync_run::{
    ActiveModel as SyncRunActiveModel, Column as SyncRunColumn, Entity as SyncRun,
    Model as SyncRunModel, SyncOutcome,
};
