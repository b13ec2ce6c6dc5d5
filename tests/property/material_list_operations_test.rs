//! Property-based tests for list-level view-model operations.
//!
//! Deleting preserves the order and field values of the remaining materials,
//! and deleting a category moves exactly its materials to "general".

#[path = "../common/mod.rs"]
mod common;

use common::{category, harness, record, FakeMaterialsApi};
use learnshelf::managers::materials_manager::MaterialsManagerTrait;
use learnshelf::types::material::{Material, MaterialRecord, GENERAL_CATEGORY};
use proptest::prelude::*;

fn arb_records() -> impl Strategy<Value = Vec<MaterialRecord>> {
    proptest::collection::vec(
        (proptest::option::of(prop_oneof![Just("1"), Just("2"), Just("3")]), any::<bool>()),
        1..12,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (cat, bookmarked))| {
                record(&format!("m{}", i), &format!("Material {}", i), cat, &[], bookmarked)
            })
            .collect()
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn delete_preserves_remaining_order(
        records in arb_records(),
        pick in any::<prop::sample::Index>(),
    ) {
        let target = records[pick.index(records.len())].id.clone();
        let expected: Vec<Material> = records
            .iter()
            .cloned()
            .map(Material::from)
            .filter(|m| m.id != target)
            .collect();

        let after = runtime().block_on(async {
            let h = harness(FakeMaterialsApi::with_documents(records), vec![], true);
            h.manager.activate().await;
            h.manager.delete_material(&target).await.unwrap();
            h.manager.materials()
        });

        prop_assert_eq!(after, expected);
    }

    #[test]
    fn category_delete_moves_only_its_materials(
        records in arb_records(),
        doomed in prop_oneof![Just("1"), Just("2"), Just("3")],
    ) {
        let before: Vec<(String, String)> = records
            .iter()
            .map(|r| (r.id.clone(), r.category_id.clone().unwrap_or_else(|| GENERAL_CATEGORY.to_string())))
            .collect();
        let categories = vec![category("1", "One"), category("2", "Two"), category("3", "Three")];

        let (after, counts) = runtime().block_on(async {
            let h = harness(FakeMaterialsApi::with_documents(records), categories, true);
            h.manager.activate().await;
            h.manager.delete_category(doomed).await.unwrap();
            let after = h
                .manager
                .materials()
                .into_iter()
                .map(|m| (m.id, m.category))
                .collect::<Vec<_>>();
            (after, h.manager.category_counts())
        });

        for ((id_before, cat_before), (id_after, cat_after)) in before.iter().zip(after.iter()) {
            prop_assert_eq!(id_before, id_after);
            if cat_before == doomed {
                prop_assert_eq!(cat_after.as_str(), GENERAL_CATEGORY);
            } else {
                prop_assert_eq!(cat_after, cat_before);
            }
        }
        prop_assert!(after.iter().all(|(_, c)| c != doomed));
        prop_assert_eq!(counts.values().sum::<usize>(), after.len());
        prop_assert!(!counts.contains_key(doomed));
    }
}
