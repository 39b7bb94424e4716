//! Built-in demo catalogue: a handful of priced purchases and two recipes
//! using them, every record flagged as demo data.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::purchase::{PriceEntry, Purchase};
use crate::models::recipe::{Recipe, RecipeIngredient};
use crate::models::settings::Settings;

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

struct SamplePurchase {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    subtype: &'static str,
    supplier: &'static str,
    invoice: (&'static str, &'static str),
    unit: &'static str,
    price: f64,
    notes: &'static str,
    history: &'static [((i32, u32, u32), f64)],
}

const PURCHASES: [SamplePurchase; 5] = [
    SamplePurchase {
        id: "p_butter_1kg",
        name: "Butter 82% 1kg",
        category: "Dairy & Eggs",
        subtype: "Butter",
        supplier: "Nicolas",
        invoice: ("INV-2025-001", "2025-01-10"),
        unit: "kg",
        price: 16.0,
        notes: "Keep refrigerated. For sauces, baking.",
        history: &[((2025, 1, 10), 15.5), ((2025, 2, 1), 16.0)],
    },
    SamplePurchase {
        id: "p_pasta_spaghetti_5kg",
        name: "Spaghetti 5kg",
        category: "Dry Goods",
        subtype: "Pasta",
        supplier: "Metro",
        invoice: ("INV-2025-002", "2025-02-05"),
        unit: "kg",
        price: 1.4,
        notes: "Dry storage.",
        history: &[((2025, 2, 5), 1.4)],
    },
    SamplePurchase {
        id: "p_parmigiano_1kg",
        name: "Parmigiano Reggiano 1kg",
        category: "Dairy & Eggs",
        subtype: "Cheese",
        supplier: "Italian supplier",
        invoice: ("INV-2025-003", "2025-02-08"),
        unit: "kg",
        price: 18.0,
        notes: "Use for grating & finishing.",
        history: &[((2025, 2, 8), 18.0)],
    },
    SamplePurchase {
        id: "p_bacon_3kg",
        name: "Smoked bacon 3kg",
        category: "Meat & Fish",
        subtype: "Pork",
        supplier: "Metro",
        invoice: ("INV-2025-004", "2025-02-10"),
        unit: "kg",
        price: 8.0,
        notes: "",
        history: &[((2025, 2, 10), 8.0)],
    },
    SamplePurchase {
        id: "p_eggs_30pcs",
        name: "Eggs L – tray 30 pcs",
        category: "Dairy & Eggs",
        subtype: "Eggs",
        supplier: "Local farm",
        invoice: ("INV-2025-005", "2025-02-12"),
        unit: "pcs",
        price: 0.23,
        notes: "",
        history: &[((2025, 2, 12), 0.23)],
    },
];

/// Demo purchases, stamped `now`.
pub fn sample_purchases(now: DateTime<Utc>) -> Vec<Purchase> {
    PURCHASES
        .iter()
        .map(|s| Purchase {
            id: s.id.to_string(),
            name: s.name.to_string(),
            category: s.category.to_string(),
            subtype: s.subtype.to_string(),
            supplier: s.supplier.to_string(),
            unit: s.unit.to_string(),
            price_per_unit: s.price,
            notes: s.notes.to_string(),
            currency: None,
            invoice_number: Some(s.invoice.0.to_string()),
            invoice_date: Some(s.invoice.1.to_string()),
            created_at: now,
            updated_at: now,
            price_history: s
                .history
                .iter()
                .map(|&((y, m, d), price)| PriceEntry::new(day(y, m, d), price))
                .collect(),
            is_demo: true,
            extra: serde_json::Map::new(),
        })
        .collect()
}

/// Demo recipes built from [`sample_purchases`].
pub fn sample_recipes(now: DateTime<Utc>) -> Vec<Recipe> {
    let mut carbonara = Recipe::new("Pasta Carbonara", 10.0)
        .with_id("r_carbonara")
        .with_selling_price(16.0)
        .with_notes("Classic carbonara, no cream.")
        .with_ingredients(vec![
            RecipeIngredient::new("p_pasta_spaghetti_5kg", 0.10, "kg"),
            RecipeIngredient::new("p_bacon_3kg", 0.025, "kg"),
            RecipeIngredient::new("p_parmigiano_1kg", 0.015, "kg"),
            RecipeIngredient::new("p_eggs_30pcs", 1.0, "pcs"),
        ]);

    let mut butter_pasta = Recipe::new("Butter pasta (kids)", 8.0)
        .with_id("r_butter_pasta")
        .with_selling_price(9.0)
        .with_notes("Simple kid-friendly pasta.")
        .with_ingredients(vec![
            RecipeIngredient::new("p_pasta_spaghetti_5kg", 0.09, "kg"),
            RecipeIngredient::new("p_butter_1kg", 0.012, "kg"),
            RecipeIngredient::new("p_parmigiano_1kg", 0.012, "kg"),
        ]);

    for recipe in [&mut carbonara, &mut butter_pasta] {
        recipe.created_at = Some(now);
        recipe.updated_at = Some(now);
        recipe.is_demo = true;
    }
    vec![carbonara, butter_pasta]
}

pub fn sample_settings() -> Settings {
    Settings {
        language: "en".to_string(),
        currency: "EUR".to_string(),
        locale: "eu".to_string(),
        auto_recalc: true,
        show_advanced: true,
    }
}
