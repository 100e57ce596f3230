use std::collections::HashSet;

use proptest::prelude::*;

use skillrepo::reconcile::reconcile_document;
use skillrepo::storage::{Preset, RepositoryDocument, SkillMetadata};

fn arb_id() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}"
}

fn arb_document() -> impl Strategy<Value = (RepositoryDocument, HashSet<String>)> {
    (
        prop::collection::vec(arb_id(), 0..12),
        prop::collection::vec(prop::collection::vec(arb_id(), 0..6), 0..4),
        prop::collection::hash_set(arb_id(), 0..12),
    )
        .prop_map(|(metadata_ids, presets, valid)| {
            let mut doc = RepositoryDocument::default();
            for id in metadata_ids {
                doc.skills.insert(id, SkillMetadata::default());
            }
            for (index, skill_ids) in presets.into_iter().enumerate() {
                doc.presets.push(Preset {
                    id: format!("p{index}"),
                    name: format!("preset {index}"),
                    description: None,
                    skill_ids,
                });
            }
            (doc, valid)
        })
}

proptest! {
    #[test]
    fn second_pass_changes_nothing((mut doc, valid) in arb_document()) {
        reconcile_document(&mut doc, &valid);
        let settled = doc.clone();

        let report = reconcile_document(&mut doc, &valid);

        prop_assert!(!report.changed());
        prop_assert_eq!(doc, settled);
    }

    #[test]
    fn only_valid_ids_survive((mut doc, valid) in arb_document()) {
        reconcile_document(&mut doc, &valid);

        prop_assert!(doc.skills.keys().all(|id| valid.contains(id)));
        prop_assert!(doc.presets.iter().flat_map(|p| &p.skill_ids).all(|id| valid.contains(id)));
    }
}
