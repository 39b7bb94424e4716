use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CoreError;

/// Stored names of the modelled `Recipe` fields, legacy alias included.
pub const RECIPE_FIELD_KEYS: [&str; 12] = [
    "id",
    "name",
    "portions",
    "sellingPricePerPortion",
    "sellingPrice",
    "archived",
    "ingredients",
    "notes",
    "currency",
    "createdAt",
    "updatedAt",
    "isDemo",
];

/// One line of a recipe: a quantity of a purchase, in some unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub purchase_id: String,

    #[serde(default)]
    pub quantity: f64,

    /// Unit of `quantity`; converted to the purchase unit when costing.
    #[serde(default)]
    pub unit: String,

    /// Frozen price per purchase unit, used when auto-recalculation is off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_unit_snapshot: Option<f64>,
}

impl RecipeIngredient {
    pub fn new(purchase_id: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            purchase_id: purchase_id.into(),
            quantity,
            unit: unit.into(),
            price_per_unit_snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, price_per_unit: f64) -> Self {
        self.price_per_unit_snapshot = Some(price_per_unit);
        self
    }
}

/// A sellable dish made from purchases, yielding `portions` per batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Assigned by the store when empty.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub portions: f64,

    #[serde(
        default,
        alias = "sellingPrice",
        skip_serializing_if = "Option::is_none"
    )]
    pub selling_price_per_portion: Option<f64>,

    /// Archived recipes are hidden from default listings but kept.
    #[serde(default)]
    pub archived: bool,

    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,

    #[serde(default)]
    pub notes: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_demo: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, portions: f64) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            portions,
            selling_price_per_portion: None,
            archived: false,
            ingredients: Vec::new(),
            notes: String::new(),
            currency: None,
            created_at: None,
            updated_at: None,
            is_demo: false,
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_selling_price(mut self, price_per_portion: f64) -> Self {
        self.selling_price_per_portion = Some(price_per_portion);
        self
    }

    pub fn with_ingredient(mut self, ingredient: RecipeIngredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn with_ingredients(mut self, ingredients: Vec<RecipeIngredient>) -> Self {
        self.ingredients = ingredients;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Ids of every purchase this recipe references, in line order.
    pub fn purchase_ids(&self) -> impl Iterator<Item = &str> {
        self.ingredients.iter().map(|i| i.purchase_id.as_str())
    }

    /// Drop `extra` entries that would duplicate a modelled field when serialized.
    pub fn strip_shadowed_extra(&mut self) {
        self.extra
            .retain(|key, _| !RECIPE_FIELD_KEYS.contains(&key.as_str()));
    }

    /// Form-level checks: a name, positive portions and at least one ingredient.
    pub fn validate_for_form(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError("recipe name is required".into()));
        }
        if !(self.portions.is_finite() && self.portions > 0.0) {
            return Err(CoreError::ValidationError(
                "portions must be a positive number".into(),
            ));
        }
        if self.ingredients.is_empty() {
            return Err(CoreError::ValidationError(
                "add at least one ingredient".into(),
            ));
        }
        Ok(())
    }
}
