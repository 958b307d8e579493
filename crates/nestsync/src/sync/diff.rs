//! Pure membership diff.
//!
//! Given the memberships a collection has and the properties the provider
//! just returned, compute what the merge transaction should do. No IO here;
//! the engine owns persistence and ordering around it.

use std::collections::HashSet;

use uuid::Uuid;

use crate::entity::prelude::{MembershipModel, MembershipSource, MembershipStatus};

/// The three membership changes a sync may make.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MembershipDiff {
    /// Properties with no membership row yet, in provider result order.
    pub additions: Vec<Uuid>,
    /// Active members whose property vanished from the result set.
    pub unavailable: Vec<Uuid>,
    /// Unavailable members whose property came back.
    pub reactivations: Vec<Uuid>,
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.unavailable.is_empty() && self.reactivations.is_empty()
    }
}

/// Diff fetched property ids (provider order) against existing memberships.
///
/// Rows flagged `removed_by_agent` are invisible to the sync: they are
/// never re-added, never reactivated, and their status is never touched.
/// Manually added members are exempt from status flips too: they need not
/// match the search preferences, so their absence from the result set
/// means nothing. An empty `fetched` set is a legitimate zero-match answer
/// and marks every auto member unavailable.
pub fn diff_memberships(existing: &[MembershipModel], fetched: &[Uuid]) -> MembershipDiff {
    let known: HashSet<Uuid> = existing.iter().map(|m| m.property_id).collect();
    let fetched_set: HashSet<Uuid> = fetched.iter().copied().collect();

    let additions = fetched
        .iter()
        .filter(|id| !known.contains(id))
        .copied()
        .collect();

    let mut unavailable = Vec::new();
    let mut reactivations = Vec::new();
    for membership in existing {
        if membership.removed_by_agent || membership.source == MembershipSource::Manual {
            continue;
        }
        let present = fetched_set.contains(&membership.property_id);
        match membership.status {
            MembershipStatus::Active if !present => unavailable.push(membership.property_id),
            MembershipStatus::Unavailable if present => reactivations.push(membership.property_id),
            _ => {}
        }
    }

    MembershipDiff {
        additions,
        unavailable,
        reactivations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn membership(
        property_id: Uuid,
        status: MembershipStatus,
        removed_by_agent: bool,
    ) -> MembershipModel {
        MembershipModel {
            collection_id: Uuid::new_v4(),
            property_id,
            added_at: Utc::now().fixed_offset(),
            source: MembershipSource::Auto,
            status,
            removed_by_agent,
            liked: false,
            disliked: false,
            viewed: false,
            commented: false,
            interacted_at: None,
        }
    }

    #[test]
    fn new_properties_are_added_in_provider_order() {
        let known = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let existing = vec![membership(known, MembershipStatus::Active, false)];

        let diff = diff_memberships(&existing, &[first, known, second]);
        assert_eq!(diff.additions, vec![first, second]);
        assert!(diff.unavailable.is_empty());
        assert!(diff.reactivations.is_empty());
    }

    #[test]
    fn vanished_members_are_marked_unavailable() {
        let gone = Uuid::new_v4();
        let existing = vec![membership(gone, MembershipStatus::Active, false)];

        let diff = diff_memberships(&existing, &[]);
        assert_eq!(diff.unavailable, vec![gone]);
        assert!(diff.additions.is_empty());
    }

    #[test]
    fn returning_members_are_reactivated() {
        let back = Uuid::new_v4();
        let existing = vec![membership(back, MembershipStatus::Unavailable, false)];

        let diff = diff_memberships(&existing, &[back]);
        assert_eq!(diff.reactivations, vec![back]);
        assert!(diff.additions.is_empty(), "a membership row already exists");
    }

    #[test]
    fn agent_removed_rows_are_never_resurrected() {
        let removed = Uuid::new_v4();
        let existing = vec![membership(removed, MembershipStatus::Active, true)];

        // Present in the feed: no re-add, no status change.
        let diff = diff_memberships(&existing, &[removed]);
        assert!(diff.is_empty());

        // Absent from the feed: still untouched.
        let diff = diff_memberships(&existing, &[]);
        assert!(diff.is_empty());
    }

    #[test]
    fn agent_removed_unavailable_rows_stay_down_when_listing_returns() {
        let removed = Uuid::new_v4();
        let existing = vec![membership(removed, MembershipStatus::Unavailable, true)];

        let diff = diff_memberships(&existing, &[removed]);
        assert!(diff.reactivations.is_empty());
    }

    #[test]
    fn manual_members_keep_their_status_when_absent() {
        let handpicked = Uuid::new_v4();
        let mut manual = membership(handpicked, MembershipStatus::Active, false);
        manual.source = MembershipSource::Manual;

        // A manually curated property need not match the preferences, so
        // its absence from the result set is not an unavailability.
        let diff = diff_memberships(&[manual.clone()], &[]);
        assert!(diff.is_empty(), "manual member must not go unavailable");

        // And sync never marked it unavailable, so it never reactivates it.
        manual.status = MembershipStatus::Unavailable;
        let diff = diff_memberships(&[manual], &[handpicked]);
        assert!(diff.is_empty());
    }

    #[test]
    fn steady_state_produces_an_empty_diff() {
        let stable = Uuid::new_v4();
        let existing = vec![membership(stable, MembershipStatus::Active, false)];

        let diff = diff_memberships(&existing, &[stable]);
        assert!(diff.is_empty());
    }

    #[test]
    fn interaction_flags_do_not_affect_the_diff() {
        let liked_id = Uuid::new_v4();
        let mut liked = membership(liked_id, MembershipStatus::Active, false);
        liked.liked = true;
        liked.viewed = true;

        let diff = diff_memberships(&[liked], &[]);
        assert_eq!(diff.unavailable, vec![liked_id]);
    }
}
