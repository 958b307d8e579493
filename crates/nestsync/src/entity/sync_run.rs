//! SyncRun entity - the append-only sync ledger.
//!
//! One row per scheduling attempt per collection. Created at attempt start,
//! finalized exactly once at its end, and never mutated afterwards.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of a finalized sync attempt.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SyncOutcome {
    /// Attempt created but not yet finalized.
    #[sea_orm(string_value = "running")]
    #[default]
    Running,
    #[sea_orm(string_value = "success")]
    Success,
    /// Fetch succeeded with degraded match quality (dropped filters).
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncOutcome::Running => write!(f, "running"),
            SyncOutcome::Success => write!(f, "success"),
            SyncOutcome::Partial => write!(f, "partial"),
            SyncOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// SyncRun model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_runs")]
pub struct Model {
    /// Internal UUID primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub collection_id: Uuid,

    pub started_at: DateTimeWithTimeZone,
    pub finished_at: Option<DateTimeWithTimeZone>,
    pub outcome: SyncOutcome,

    // ─── Committed diff counts ──────────────────────────────────────────────
    pub added: i32,
    pub marked_unavailable: i32,
    pub reactivated: i32,
    /// Active members after the merge (excludes unavailable and
    /// agent-removed rows).
    pub total_active: i32,

    /// Error detail for failed attempts.
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collection::Entity",
        from = "Column::CollectionId",
        to = "super::collection::Column::Id"
    )]
    Collection,
}

impl Related<super::collection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this attempt changed any membership state.
    pub fn changed_membership(&self) -> bool {
        self.added > 0 || self.marked_unavailable > 0 || self.reactivated > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn changed_membership_reflects_counts() {
        let mut model = Model {
            id: Uuid::new_v4(),
            collection_id: Uuid::new_v4(),
            started_at: Utc::now().fixed_offset(),
            finished_at: Some(Utc::now().fixed_offset()),
            outcome: SyncOutcome::Success,
            added: 0,
            marked_unavailable: 0,
            reactivated: 0,
            total_active: 4,
            error: None,
        };
        assert!(!model.changed_membership());
        model.added = 1;
        assert!(model.changed_membership());
    }

    #[test]
    fn outcome_display_matches_db_values() {
        assert_eq!(SyncOutcome::Success.to_string(), "success");
        assert_eq!(SyncOutcome::Partial.to_string(), "partial");
        assert_eq!(SyncOutcome::Failed.to_string(), "failed");
    }
}
