use std::rc::Rc;

use chrono::{TimeZone, Utc};
use profitplate_core::errors::CoreError;
use profitplate_core::models::purchase::PurchasePatch;
use profitplate_core::models::recipe::{Recipe, RecipeIngredient};
use profitplate_core::storage::file::FileStorage;
use profitplate_core::storage::memory::MemoryStorage;
use profitplate_core::storage::traits::{FixedClock, KeyValueStorage, SequentialIds, StorageKeys};
use profitplate_core::ProfitPlate;

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn in_memory() -> ProfitPlate {
    ProfitPlate::open_with(
        Rc::new(MemoryStorage::new()),
        Rc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())),
        Rc::new(SequentialIds::new()),
        StorageKeys::default(),
    )
    .unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ═══════════════════════════════════════════════════════════════════
// Persistence across sessions
// ═══════════════════════════════════════════════════════════════════

mod file_backed {
    use super::*;

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let (purchase_id, recipe_id) = {
            let mut pp = ProfitPlate::open(FileStorage::new(dir.path())).unwrap();
            let p = pp
                .upsert_purchase(
                    PurchasePatch::new("Olive oil")
                        .with_category("Oils")
                        .with_unit("l")
                        .with_price("9,80"),
                )
                .unwrap();
            let r = pp
                .upsert_recipe(
                    Recipe::new("Aioli", 4.0)
                        .with_selling_price(2.5)
                        .with_ingredient(RecipeIngredient::new(&p.id, 200.0, "ml")),
                )
                .unwrap();
            pp.set_currency("chf").unwrap();
            (p.id, r.id)
        };

        let pp = ProfitPlate::open(FileStorage::new(dir.path())).unwrap();
        let oil = pp.get_purchase(&purchase_id).unwrap();
        assert_eq!(oil.price_per_unit, 9.8);
        assert_eq!(oil.price_history.len(), 1);
        assert_eq!(pp.settings().currency, "CHF");

        let costs = pp.compute_costs(&recipe_id).unwrap();
        assert!(approx(costs.batch_cost, 1.96));
        assert!(approx(costs.cost_per_portion, 0.49));
    }

    #[test]
    fn ids_are_prefixed_and_unique() {
        let dir = tempfile::tempdir().unwrap();
        let mut pp = ProfitPlate::open(FileStorage::new(dir.path())).unwrap();
        let a = pp.upsert_purchase(PurchasePatch::new("A")).unwrap();
        let b = pp.upsert_purchase(PurchasePatch::new("B")).unwrap();
        let r = pp.upsert_recipe(Recipe::new("R", 1.0)).unwrap();
        assert!(a.id.starts_with("p_"));
        assert!(r.id.starts_with("r_"));
        assert_ne!(a.id, b.id);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Demo data
// ═══════════════════════════════════════════════════════════════════

mod sample_data {
    use super::*;

    #[test]
    fn loads_demo_catalogue() {
        let mut pp = in_memory();
        assert!(!pp.has_demo_data());
        pp.load_sample_data().unwrap();

        assert_eq!(pp.list_purchases().len(), 5);
        assert_eq!(pp.list_recipes(false).len(), 2);
        assert!(pp.has_demo_data());
        assert!(pp.settings().show_advanced);
    }

    #[test]
    fn carbonara_costs() {
        let mut pp = in_memory();
        pp.load_sample_data().unwrap();

        let costs = pp.compute_costs("r_carbonara").unwrap();
        assert_eq!(costs.lines.len(), 4);
        assert!(approx(costs.batch_cost, 0.84));
        assert!(approx(costs.cost_per_portion, 0.084));
        assert!(approx(costs.margin_per_portion.unwrap(), 15.916));
        assert!(!costs.has_missing_references());
        assert!(!costs.has_unit_mismatches());
    }

    #[test]
    fn editing_demo_butter_extends_history() {
        let mut pp = in_memory();
        pp.load_sample_data().unwrap();

        let butter = pp
            .upsert_purchase(PurchasePatch::for_id("p_butter_1kg").with_price(17.0))
            .unwrap();
        let prices: Vec<f64> = butter.price_history.iter().map(|e| e.price_per_unit).collect();
        assert_eq!(prices, vec![15.5, 16.0, 17.0]);
        assert!(!butter.is_demo);
        assert!(pp.has_demo_data());
    }

    #[test]
    fn reloading_resets_user_changes() {
        let mut pp = in_memory();
        pp.load_sample_data().unwrap();
        pp.delete_purchase("p_eggs_30pcs").unwrap();
        assert!(pp
            .compute_costs("r_carbonara")
            .unwrap()
            .has_missing_references());

        pp.load_sample_data().unwrap();
        assert_eq!(pp.list_purchases().len(), 5);
        assert!(!pp
            .compute_costs("r_carbonara")
            .unwrap()
            .has_missing_references());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Export / Import
// ═══════════════════════════════════════════════════════════════════

mod backup {
    use super::*;

    #[test]
    fn export_then_import_into_fresh_store() {
        let mut source = in_memory();
        source.load_sample_data().unwrap();
        source.set_recipe_archived("r_butter_pasta", true).unwrap();
        source.set_auto_recalc(false).unwrap();
        let json = source.export_json().unwrap();

        let mut target = in_memory();
        let summary = target.import_json(&json).unwrap();
        assert_eq!(summary.purchases, 5);
        assert_eq!(summary.recipes, 2);

        assert_eq!(target.list_purchases(), source.list_purchases());
        assert_eq!(target.list_recipes(false).len(), 1);
        assert!(!target.settings().auto_recalc);
        assert!(target.has_demo_data());
        assert!(approx(
            target.compute_costs("r_carbonara").unwrap().batch_cost,
            0.84
        ));
    }

    #[test]
    fn export_uses_camel_case_keys() {
        let mut pp = in_memory();
        pp.load_sample_data().unwrap();
        let doc: serde_json::Value = serde_json::from_str(&pp.export_json().unwrap()).unwrap();
        assert!(doc["purchases"][0].get("pricePerUnit").is_some());
        assert!(doc["recipes"][0].get("sellingPricePerPortion").is_some());
        assert!(doc["settings"].get("autoRecalc").is_some());
    }

    #[test]
    fn invalid_document_changes_nothing() {
        let mut pp = in_memory();
        pp.load_sample_data().unwrap();
        let before = pp.list_purchases();

        assert!(matches!(
            pp.import_json("[1, 2, 3]"),
            Err(CoreError::Deserialization(_))
        ));
        assert!(matches!(
            pp.import_json("{broken"),
            Err(CoreError::Deserialization(_))
        ));
        assert_eq!(pp.list_purchases(), before);
        assert_eq!(pp.list_recipes(true).len(), 2);
    }

    #[test]
    fn failed_import_puts_previous_data_back() {
        let storage = Rc::new(MemoryStorage::new());
        let mut pp = ProfitPlate::open_with(
            storage.clone(),
            Rc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap())),
            Rc::new(SequentialIds::new()),
            StorageKeys::default(),
        )
        .unwrap();
        pp.upsert_purchase(PurchasePatch::new("Salt").with_price(0.5))
            .unwrap();
        let before = pp.list_purchases();

        storage.set_quota(Some(storage.used_bytes() + 2_000));
        let doc = serde_json::json!({
            "purchases": [{"id": "x", "name": "Pepper", "pricePerUnit": 3}],
            "recipes": [{"id": "r", "name": "Long", "portions": 1, "notes": "x".repeat(5_000)}]
        })
        .to_string();

        let err = pp.import_json(&doc).unwrap_err();
        assert!(matches!(err, CoreError::StorageWrite(_)));
        assert_eq!(pp.list_purchases(), before);
        assert!(pp.list_recipes(true).is_empty());

        let stored: serde_json::Value =
            serde_json::from_str(&storage.get_item("pp_purchases").unwrap().unwrap()).unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 1);
        assert_eq!(stored[0]["name"], serde_json::json!("Salt"));
    }

    #[test]
    fn partial_document_salvages_what_it_can() {
        let mut pp = in_memory();
        pp.load_sample_data().unwrap();
        let summary = pp
            .import_json(r#"{"purchases": [{"id": "x", "name": "Salt", "pricePerUnit": "0,5"}, 7]}"#)
            .unwrap();
        assert_eq!(summary.purchases, 1);
        assert_eq!(summary.recipes, 0);
        assert_eq!(pp.get_purchase("x").unwrap().price_per_unit, 0.5);
        assert!(pp.list_recipes(true).is_empty());
        assert_eq!(pp.settings().currency, "EUR");
    }
}
