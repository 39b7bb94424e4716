use serde::{Deserialize, Serialize};

/// Where the unit price of a costed line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    /// The purchase's current `price_per_unit`.
    Live,
    /// The line's frozen `price_per_unit_snapshot`.
    Snapshot,
    /// Nothing to price with; the line costs 0.
    None,
}

impl std::fmt::Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceSource::Live => write!(f, "Live"),
            PriceSource::Snapshot => write!(f, "Snapshot"),
            PriceSource::None => write!(f, "None"),
        }
    }
}

/// Cost detail of a single ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineCost {
    /// Position of the line in the recipe.
    pub index: usize,

    pub purchase_id: String,

    /// Name of the referenced purchase, if it still exists.
    pub purchase_name: Option<String>,

    /// Quantity as written in the recipe.
    pub quantity: f64,

    pub unit: String,

    /// Quantity expressed in the purchase's unit.
    pub converted_quantity: f64,

    /// Base unit of the referenced purchase.
    pub purchase_unit: Option<String>,

    /// Price per purchase unit actually used.
    pub unit_price: f64,

    pub price_source: PriceSource,

    /// `converted_quantity × unit_price`.
    pub cost: f64,

    /// The referenced purchase does not exist.
    pub missing: bool,

    /// Units differ and cannot be converted; the quantity was used as-is.
    pub unit_mismatch: bool,

    /// Auto-recalculation is off, the line has no snapshot, and a live
    /// price exists that the caller may freeze with a backfill.
    pub needs_snapshot: bool,
}

/// Result of costing one recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Total cost of all ingredients for one batch.
    pub batch_cost: f64,

    /// `batch_cost / portions`, or 0 when portions is not positive.
    pub cost_per_portion: f64,

    /// Selling price minus cost per portion. `None` without a selling price.
    pub margin_per_portion: Option<f64>,

    /// Margin as a percentage of the selling price. `None` without a selling price.
    pub margin_percent: Option<f64>,

    pub lines: Vec<LineCost>,
}

impl CostBreakdown {
    /// Lines whose purchase no longer exists.
    pub fn missing_lines(&self) -> impl Iterator<Item = &LineCost> {
        self.lines.iter().filter(|l| l.missing)
    }

    #[must_use]
    pub fn has_missing_references(&self) -> bool {
        self.lines.iter().any(|l| l.missing)
    }

    #[must_use]
    pub fn has_unit_mismatches(&self) -> bool {
        self.lines.iter().any(|l| l.unit_mismatch)
    }
}

/// A costed recipe as shown in the recipe list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeCostSummary {
    pub recipe_id: String,
    pub recipe_name: String,
    pub portions: f64,
    pub archived: bool,
    pub costs: CostBreakdown,
}
