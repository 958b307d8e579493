//! Collection entity - a visitor-scoped, agent-curated set of property matches.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a collection.
///
/// Collections are never physically deleted; deactivation removes them from
/// scheduling while keeping visitor history intact.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum CollectionStatus {
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

impl std::fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionStatus::Active => write!(f, "active"),
            CollectionStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Collection model - one curated property collection per visitor.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "collections")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name shown to the visitor.
    pub name: String,

    /// Agent who curates this collection, if any.
    pub agent_id: Option<Uuid>,

    // ─── Visitor identity (for notification intents) ─────────────────────────
    pub visitor_email: Option<String>,
    pub visitor_name: Option<String>,
    /// Opaque token used by the delivery collaborator to build share links.
    pub share_token: Option<String>,

    /// Lifecycle status; inactive collections are excluded from scheduling.
    pub status: CollectionStatus,

    /// When the last sync attempt for this collection finalized.
    ///
    /// Advanced only by the sync ledger; `None` means never synced, which
    /// sorts first in the fairness order.
    pub last_synced_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::preference::Entity")]
    Preference,
    #[sea_orm(has_many = "super::membership::Entity")]
    Membership,
    #[sea_orm(has_many = "super::sync_run::Entity")]
    SyncRun,
}

impl Related<super::preference::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Preference.def()
    }
}

impl Related<super::membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Membership.def()
    }
}

impl Related<super::sync_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SyncRun.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this collection is eligible for scheduling.
    pub fn is_schedulable(&self) -> bool {
        self.status == CollectionStatus::Active
    }
}
