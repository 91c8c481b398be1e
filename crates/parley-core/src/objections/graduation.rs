//! Per-contact graduation state.
//!
//! Each `(contact, objection type)` pair climbs the ladder
//! `validate -> data -> social_proof -> market_test` one rung per detection
//! and stays on `market_test` once it gets there. Only [`GraduationTracker::reset`]
//! moves a contact back down.

use std::collections::{BTreeMap, HashMap};

use crate::types::{ObjectionType, ResponseGraduation};

/// Graduation levels keyed by contact, then objection type.
///
/// Not synchronized. Callers serialize turns for a given contact.
#[derive(Debug, Clone, Default)]
pub struct GraduationTracker {
    levels: HashMap<String, HashMap<ObjectionType, usize>>,
}

impl GraduationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level index, 0 for an unseen pair.
    pub fn graduation_level_for(&self, contact_id: &str, objection_type: ObjectionType) -> usize {
        self.levels
            .get(contact_id)
            .and_then(|types| types.get(&objection_type))
            .copied()
            .unwrap_or(0)
    }

    pub fn graduation_for(&self, contact_id: &str, objection_type: ObjectionType) -> ResponseGraduation {
        ResponseGraduation::from_index(self.graduation_level_for(contact_id, objection_type))
    }

    /// Return the level before advancing, then step up one rung.
    ///
    /// Idempotent at the top rung.
    pub fn advance(&mut self, contact_id: &str, objection_type: ObjectionType) -> usize {
        let level = self
            .levels
            .entry(contact_id.to_string())
            .or_default()
            .entry(objection_type)
            .or_insert(0);

        let before = *level;
        *level = (before + 1).min(ResponseGraduation::COUNT - 1);
        before
    }

    /// Drop every objection type for `contact_id`. Unknown contacts are ignored.
    pub fn reset(&mut self, contact_id: &str) {
        if self.levels.remove(contact_id).is_some() {
            tracing::debug!(contact_id, "Graduation state reset");
        }
    }

    /// Contacts with any recorded state, sorted.
    pub fn tracked_contacts(&self) -> Vec<&str> {
        let mut contacts: Vec<&str> = self.levels.keys().map(String::as_str).collect();
        contacts.sort_unstable();
        contacts
    }

    /// Current level for every objection type seen for `contact_id`.
    pub fn levels_for(&self, contact_id: &str) -> BTreeMap<ObjectionType, ResponseGraduation> {
        self.levels
            .get(contact_id)
            .map(|types| {
                types
                    .iter()
                    .map(|(t, level)| (*t, ResponseGraduation::from_index(*level)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unseen_pair_starts_at_zero() {
        let tracker = GraduationTracker::new();
        assert_eq!(tracker.graduation_level_for("c1", ObjectionType::Anchoring), 0);
        assert_eq!(
            tracker.graduation_for("c1", ObjectionType::Anchoring),
            ResponseGraduation::Validate
        );
    }

    #[test]
    fn test_advance_returns_pre_advance_level_and_clamps() {
        let mut tracker = GraduationTracker::new();
        let returned: Vec<usize> = (0..6)
            .map(|_| tracker.advance("c1", ObjectionType::LossAversion))
            .collect();

        assert_eq!(returned, vec![0, 1, 2, 3, 3, 3]);
        assert_eq!(tracker.graduation_level_for("c1", ObjectionType::LossAversion), 3);
    }

    #[test]
    fn test_types_are_independent() {
        let mut tracker = GraduationTracker::new();
        tracker.advance("c1", ObjectionType::LossAversion);
        tracker.advance("c1", ObjectionType::LossAversion);

        assert_eq!(tracker.graduation_level_for("c1", ObjectionType::Anchoring), 0);
    }

    #[test]
    fn test_contacts_are_independent() {
        let mut tracker = GraduationTracker::new();
        tracker.advance("a", ObjectionType::MarketDenial);
        tracker.advance("a", ObjectionType::MarketDenial);

        assert_eq!(tracker.graduation_level_for("b", ObjectionType::MarketDenial), 0);
        assert_eq!(tracker.tracked_contacts(), vec!["a"]);
    }

    #[test]
    fn test_reset_unknown_contact_is_noop() {
        let mut tracker = GraduationTracker::new();
        tracker.reset("nobody");
        assert!(tracker.tracked_contacts().is_empty());
    }

    #[test]
    fn test_reset_returns_to_validate() {
        let mut tracker = GraduationTracker::new();
        tracker.advance("c1", ObjectionType::NeighborComp);
        tracker.advance("c1", ObjectionType::Anchoring);
        tracker.reset("c1");

        assert!(tracker.levels_for("c1").is_empty());
        assert_eq!(tracker.advance("c1", ObjectionType::NeighborComp), 0);
    }

    #[test]
    fn test_levels_for_reports_current_rungs() {
        let mut tracker = GraduationTracker::new();
        tracker.advance("c1", ObjectionType::Anchoring);
        tracker.advance("c1", ObjectionType::TrustCredibility);
        tracker.advance("c1", ObjectionType::TrustCredibility);

        let levels = tracker.levels_for("c1");
        assert_eq!(levels[&ObjectionType::Anchoring], ResponseGraduation::Data);
        assert_eq!(levels[&ObjectionType::TrustCredibility], ResponseGraduation::SocialProof);
    }

    proptest! {
        #[test]
        fn prop_graduation_is_monotonic(steps in proptest::collection::vec(0usize..3, 1..40)) {
            let contacts = ["a", "b", "c"];
            let mut tracker = GraduationTracker::new();
            let mut last = [0usize; 3];

            for step in steps {
                let returned = tracker.advance(contacts[step], ObjectionType::Anchoring);
                prop_assert!(returned >= last[step]);
                prop_assert!(returned < ResponseGraduation::COUNT);
                last[step] = returned;
            }
        }
    }
}
