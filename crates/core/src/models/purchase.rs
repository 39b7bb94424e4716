use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::number::NumberInput;
use crate::errors::CoreError;

/// Maximum number of price observations kept per purchase.
pub const MAX_PRICE_HISTORY: usize = 10;

/// Stored names of the fields `Purchase` models itself. An `extra` entry
/// under one of these would be serialized a second time and win on reload.
pub const PURCHASE_FIELD_KEYS: [&str; 15] = [
    "id",
    "name",
    "category",
    "subtype",
    "supplier",
    "unit",
    "pricePerUnit",
    "notes",
    "currency",
    "invoiceNumber",
    "invoiceDate",
    "createdAt",
    "updatedAt",
    "priceHistory",
    "isDemo",
];

/// Whether `key` names a modelled `Purchase` field.
pub fn is_purchase_field(key: &str) -> bool {
    PURCHASE_FIELD_KEYS.contains(&key)
}

/// One observed price of a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub date: DateTime<Utc>,

    #[serde(alias = "price")]
    pub price_per_unit: f64,
}

impl PriceEntry {
    pub fn new(date: DateTime<Utc>, price_per_unit: f64) -> Self {
        Self {
            date,
            price_per_unit,
        }
    }
}

/// An ingredient as bought from a supplier, priced per `unit`.
///
/// Serialized camelCase so stored collections stay readable by older
/// front-ends. Fields this crate does not model are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Stable identifier, assigned once.
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub subtype: String,

    #[serde(default)]
    pub supplier: String,

    /// Base unit the price refers to (e.g. "kg", "l", "pcs").
    #[serde(default)]
    pub unit: String,

    /// Current price per `unit`. Never negative, never NaN.
    #[serde(default)]
    pub price_per_unit: f64,

    #[serde(default)]
    pub notes: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,

    /// Immutable after the first write.
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Oldest first, at most [`MAX_PRICE_HISTORY`] entries.
    #[serde(default)]
    pub price_history: Vec<PriceEntry>,

    /// Set on seeded demo records; cleared by the first user edit.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_demo: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Purchase {
    /// Most recently recorded history price, if any.
    #[must_use]
    pub fn last_recorded_price(&self) -> Option<f64> {
        self.price_history.last().map(|e| e.price_per_unit)
    }

    /// Repair numeric and history invariants in place:
    /// price clamped to `>= 0`, bad history entries dropped,
    /// a seed entry added for a priced item without history,
    /// the history capped to the newest [`MAX_PRICE_HISTORY`] entries,
    /// and `extra` entries shadowing a modelled field removed.
    pub fn normalize(&mut self) {
        self.extra.retain(|key, _| !is_purchase_field(key));

        if !self.price_per_unit.is_finite() || self.price_per_unit < 0.0 {
            self.price_per_unit = 0.0;
        }

        self.price_history
            .retain(|e| e.price_per_unit.is_finite() && e.price_per_unit > 0.0);

        if self.price_history.is_empty() && self.price_per_unit > 0.0 {
            self.price_history
                .push(PriceEntry::new(self.updated_at, self.price_per_unit));
        }

        truncate_history(&mut self.price_history);
    }
}

/// Drop the oldest entries beyond [`MAX_PRICE_HISTORY`].
pub fn truncate_history(history: &mut Vec<PriceEntry>) {
    if history.len() > MAX_PRICE_HISTORY {
        let overflow = history.len() - MAX_PRICE_HISTORY;
        history.drain(..overflow);
    }
}

/// A partial purchase as submitted by a form or an import.
///
/// `None` fields keep whatever the stored record already has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_unit: Option<NumberInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,

    /// Only honoured when the purchase does not exist yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PurchasePatch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A patch that only targets an existing id.
    pub fn for_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_price(mut self, price: impl Into<NumberInput>) -> Self {
        self.price_per_unit = Some(price.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_invoice(mut self, number: impl Into<String>, date: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self.invoice_date = Some(date.into());
        self
    }

    /// Form-level checks run before a patch reaches the store:
    /// name, category and unit present, price numeric and not negative.
    ///
    /// The store itself never calls this.
    pub fn validate_for_form(&self) -> Result<(), CoreError> {
        fn required(field: &str, value: &Option<String>) -> Result<(), CoreError> {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => Ok(()),
                _ => Err(CoreError::ValidationError(format!("{field} is required"))),
            }
        }

        required("name", &self.name)?;
        required("category", &self.category)?;
        required("unit", &self.unit)?;

        let price = self
            .price_per_unit
            .as_ref()
            .ok_or_else(|| CoreError::ValidationError("price is required".into()))?
            .parse()?;
        if price < 0.0 {
            return Err(CoreError::ValidationError(
                "price must not be negative".into(),
            ));
        }
        Ok(())
    }
}
