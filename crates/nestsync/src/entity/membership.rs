//! CollectionMembership entity - the link between a collection and a property.
//!
//! Membership rows carry visitor interaction state. The sync engine may only
//! insert auto-sourced rows and flip `status`; interaction fields and
//! `removed_by_agent` belong to the visitor/agent paths and are never
//! written by sync. Agent-initiated removal is the only row deletion path.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a membership row came to exist.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum MembershipSource {
    /// Added by the sync engine from a provider match.
    #[sea_orm(string_value = "auto")]
    #[default]
    Auto,
    /// Added manually by the agent.
    #[sea_orm(string_value = "manual")]
    Manual,
}

/// Current availability of a member within its collection.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum MembershipStatus {
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    /// No longer matching preferences or no longer listed. History is kept;
    /// the UI renders a "no longer available" state.
    #[sea_orm(string_value = "unavailable")]
    Unavailable,
}

/// CollectionMembership model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collection_properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub property_id: Uuid,

    pub added_at: DateTimeWithTimeZone,
    pub source: MembershipSource,
    pub status: MembershipStatus,

    /// Set when an agent curates this property out of the collection. Sync
    /// must never resurrect such a row.
    #[sea_orm(default_value = false)]
    pub removed_by_agent: bool,

    // ─── Visitor interaction state (immutable to sync) ──────────────────────
    #[sea_orm(default_value = false)]
    pub liked: bool,
    #[sea_orm(default_value = false)]
    pub disliked: bool,
    #[sea_orm(default_value = false)]
    pub viewed: bool,
    #[sea_orm(default_value = false)]
    pub commented: bool,
    pub interacted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id"
    )]
    Property,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collection.def()
    }
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the row counts toward the collection's active total.
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active && !self.removed_by_agent
    }
}
