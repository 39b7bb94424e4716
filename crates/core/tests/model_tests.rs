use chrono::{DateTime, TimeZone, Utc};
use profitplate_core::errors::CoreError;
use profitplate_core::models::costing::PriceSource;
use profitplate_core::models::number::{parse_decimal, NumberInput};
use profitplate_core::models::purchase::{PriceEntry, Purchase, PurchasePatch, MAX_PRICE_HISTORY};
use profitplate_core::models::recipe::{Recipe, RecipeIngredient};
use profitplate_core::models::settings::Settings;
use profitplate_core::models::unit::{Dimension, Unit};
use serde_json::json;

fn t(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
}

fn purchase(price: f64, history: Vec<PriceEntry>) -> Purchase {
    Purchase {
        id: "p1".into(),
        name: "Butter".into(),
        category: "Dairy & Eggs".into(),
        subtype: String::new(),
        supplier: "Metro".into(),
        unit: "kg".into(),
        price_per_unit: price,
        notes: String::new(),
        currency: None,
        invoice_number: None,
        invoice_date: None,
        created_at: t(1),
        updated_at: t(2),
        price_history: history,
        is_demo: false,
        extra: serde_json::Map::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Unit
// ═══════════════════════════════════════════════════════════════════

mod unit {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Unit::parse("KG"), Some(Unit::Kilogram));
        assert_eq!(Unit::parse(" Ml "), Some(Unit::Milliliter));
        assert_eq!(Unit::parse("L"), Some(Unit::Liter));
    }

    #[test]
    fn gr_is_grams() {
        assert_eq!(Unit::parse("gr"), Some(Unit::Gram));
        assert_eq!(Unit::parse("g"), Some(Unit::Gram));
    }

    #[test]
    fn unknown_and_empty() {
        assert_eq!(Unit::parse(""), None);
        assert_eq!(Unit::parse("bag"), None);
    }

    #[test]
    fn dimensions() {
        assert_eq!(Unit::Gram.dimension(), Dimension::Mass);
        assert_eq!(Unit::Liter.dimension(), Dimension::Volume);
        assert_eq!(Unit::Piece.dimension(), Dimension::Count);
    }

    #[test]
    fn display_uses_symbol() {
        assert_eq!(Unit::Kilogram.to_string(), "kg");
        assert_eq!(Unit::Piece.to_string(), "pcs");
    }
}

// ═══════════════════════════════════════════════════════════════════
//  NumberInput
// ═══════════════════════════════════════════════════════════════════

mod number_input {
    use super::*;

    #[test]
    fn coerce_accepts_comma() {
        assert_eq!(NumberInput::from("6,40").coerce(), 6.4);
    }

    #[test]
    fn coerce_never_fails() {
        assert_eq!(NumberInput::from("abc").coerce(), 0.0);
        assert_eq!(NumberInput::from(f64::INFINITY).coerce(), 0.0);
    }

    #[test]
    fn parse_reports_validation_error() {
        assert!(matches!(
            NumberInput::from("abc").parse(),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(parse_decimal("  "), Err(CoreError::ValidationError(_))));
        assert_eq!(parse_decimal("-5").unwrap(), -5.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Purchase
// ═══════════════════════════════════════════════════════════════════

mod purchase_model {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let p = purchase(6.4, vec![PriceEntry::new(t(2), 6.4)]);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["pricePerUnit"], json!(6.4));
        assert_eq!(v["priceHistory"][0]["pricePerUnit"], json!(6.4));
        assert!(v.get("createdAt").is_some());
        assert!(v.get("updatedAt").is_some());
        assert!(v.get("isDemo").is_none());
        assert!(v.get("invoiceNumber").is_none());
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let mut p = purchase(1.0, vec![]);
        p.extra.insert("storageZone".into(), json!("cold room"));
        let text = serde_json::to_string(&p).unwrap();
        let back: Purchase = serde_json::from_str(&text).unwrap();
        assert_eq!(back.extra.get("storageZone"), Some(&json!("cold room")));
        assert_eq!(back, p);
    }

    #[test]
    fn history_accepts_price_alias() {
        let e: PriceEntry =
            serde_json::from_value(json!({"date": "2025-03-01T00:00:00Z", "price": 3.5})).unwrap();
        assert_eq!(e.price_per_unit, 3.5);
    }

    #[test]
    fn normalize_clamps_negative_price() {
        let mut p = purchase(-3.0, vec![]);
        p.normalize();
        assert_eq!(p.price_per_unit, 0.0);
        assert!(p.price_history.is_empty());
    }

    #[test]
    fn normalize_seeds_history_from_price() {
        let mut p = purchase(4.0, vec![]);
        p.normalize();
        assert_eq!(p.price_history, vec![PriceEntry::new(t(2), 4.0)]);
    }

    #[test]
    fn normalize_drops_non_positive_entries_and_caps_length() {
        let mut history: Vec<PriceEntry> = (1..=12).map(|i| PriceEntry::new(t(i), i as f64)).collect();
        history.insert(3, PriceEntry::new(t(3), 0.0));
        history.insert(5, PriceEntry::new(t(4), f64::NAN));
        let mut p = purchase(12.0, history);
        p.normalize();
        assert_eq!(p.price_history.len(), MAX_PRICE_HISTORY);
        assert_eq!(p.price_history[0].price_per_unit, 3.0);
        assert_eq!(p.last_recorded_price(), Some(12.0));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  PurchasePatch
// ═══════════════════════════════════════════════════════════════════

mod purchase_patch {
    use super::*;

    fn complete() -> PurchasePatch {
        PurchasePatch::new("Butter")
            .with_category("Dairy & Eggs")
            .with_unit("kg")
            .with_price("6,40")
    }

    #[test]
    fn complete_form_validates() {
        assert!(complete().validate_for_form().is_ok());
    }

    #[test]
    fn missing_category_is_rejected() {
        let mut patch = complete();
        patch.category = Some("  ".into());
        let err = patch.validate_for_form().unwrap_err();
        assert!(err.to_string().contains("category"));
    }

    #[test]
    fn missing_or_bad_price_is_rejected() {
        let mut patch = complete();
        patch.price_per_unit = None;
        assert!(patch.validate_for_form().is_err());
        assert!(complete().with_price("abc").validate_for_form().is_err());
        assert!(complete().with_price(-1.0).validate_for_form().is_err());
    }

    #[test]
    fn deserializes_form_json_with_text_price() {
        let patch: PurchasePatch = serde_json::from_value(json!({
            "name": "Flour",
            "unit": "kg",
            "pricePerUnit": "0,89",
            "invoiceNumber": "INV-7",
            "shelf": "B2"
        }))
        .unwrap();
        assert_eq!(patch.price_per_unit.unwrap().coerce(), 0.89);
        assert_eq!(patch.invoice_number.as_deref(), Some("INV-7"));
        assert_eq!(patch.extra.get("shelf"), Some(&json!("B2")));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Recipe
// ═══════════════════════════════════════════════════════════════════

mod recipe_model {
    use super::*;

    #[test]
    fn builder() {
        let r = Recipe::new("Carbonara", 5.0)
            .with_id("r1")
            .with_selling_price(9.5)
            .with_ingredient(RecipeIngredient::new("p1", 0.2, "kg"))
            .with_ingredient(RecipeIngredient::new("p2", 50.0, "g").with_snapshot(6.4));
        assert_eq!(r.ingredients.len(), 2);
        assert_eq!(r.purchase_ids().collect::<Vec<_>>(), vec!["p1", "p2"]);
        assert_eq!(r.ingredients[1].price_per_unit_snapshot, Some(6.4));
        assert!(!r.archived);
    }

    #[test]
    fn legacy_selling_price_alias() {
        let r: Recipe = serde_json::from_value(json!({
            "id": "r_carbonara",
            "name": "Pasta Carbonara",
            "portions": 10,
            "sellingPrice": 16.0,
            "ingredients": []
        }))
        .unwrap();
        assert_eq!(r.selling_price_per_portion, Some(16.0));
        let out = serde_json::to_value(&r).unwrap();
        assert_eq!(out["sellingPricePerPortion"], json!(16.0));
        assert!(out.get("sellingPrice").is_none());
    }

    #[test]
    fn snapshot_omitted_when_absent() {
        let line = serde_json::to_value(RecipeIngredient::new("p1", 1.0, "pcs")).unwrap();
        assert!(line.get("pricePerUnitSnapshot").is_none());
        assert_eq!(line["purchaseId"], json!("p1"));
    }

    #[test]
    fn form_validation() {
        let ok = Recipe::new("Soup", 4.0).with_ingredient(RecipeIngredient::new("p1", 1.0, "l"));
        assert!(ok.validate_for_form().is_ok());
        assert!(Recipe::new("", 4.0).validate_for_form().is_err());
        assert!(Recipe::new("Soup", 0.0)
            .with_ingredient(RecipeIngredient::new("p1", 1.0, "l"))
            .validate_for_form()
            .is_err());
        assert!(Recipe::new("Soup", 4.0).validate_for_form().is_err());
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Settings & costing enums
// ═══════════════════════════════════════════════════════════════════

mod settings_model {
    use super::*;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert_eq!(s.currency, "EUR");
        assert_eq!(s.locale, "eu");
        assert!(s.auto_recalc);
        assert!(!s.show_advanced);
    }

    #[test]
    fn partial_object_fills_defaults() {
        let s: Settings = serde_json::from_value(json!({"autoRecalc": false})).unwrap();
        assert!(!s.auto_recalc);
        assert_eq!(s.currency, "EUR");
        assert_eq!(s.language, "en");
    }

    #[test]
    fn price_source_display() {
        assert_eq!(PriceSource::Live.to_string(), "Live");
        assert_eq!(PriceSource::Snapshot.to_string(), "Snapshot");
        assert_eq!(PriceSource::None.to_string(), "None");
    }
}
