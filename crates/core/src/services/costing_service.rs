use std::collections::HashMap;

use crate::models::costing::{CostBreakdown, LineCost, PriceSource};
use crate::models::purchase::Purchase;
use crate::models::recipe::{Recipe, RecipeIngredient};

use super::conversion_service::ConversionService;

/// Computes batch cost, cost per portion and margin of a recipe.
///
/// Pure business logic over a snapshot of the catalogue: no storage access,
/// no mutation. A line whose purchase is gone costs nothing and is flagged
/// `missing`; the computation itself never fails.
pub struct CostingService {
    converter: ConversionService,
}

impl CostingService {
    pub fn new() -> Self {
        Self {
            converter: ConversionService::new(),
        }
    }

    /// Cost `recipe` against `purchases`.
    ///
    /// With `auto_recalc` every line uses the purchase's live price. Without
    /// it a line's `price_per_unit_snapshot` wins, falling back to the live
    /// price. Quantities are converted into the purchase's unit first.
    pub fn compute_costs(
        &self,
        recipe: &Recipe,
        purchases: &[Purchase],
        auto_recalc: bool,
    ) -> CostBreakdown {
        let by_id: HashMap<&str, &Purchase> =
            purchases.iter().map(|p| (p.id.as_str(), p)).collect();

        let lines: Vec<LineCost> = recipe
            .ingredients
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let purchase = by_id.get(line.purchase_id.as_str()).copied();
                self.cost_line(index, line, purchase, auto_recalc)
            })
            .collect();

        let batch_cost: f64 = lines.iter().map(|l| l.cost).sum();
        let cost_per_portion = if recipe.portions.is_finite() && recipe.portions > 0.0 {
            batch_cost / recipe.portions
        } else {
            0.0
        };

        let (margin_per_portion, margin_percent) = match recipe
            .selling_price_per_portion
            .filter(|p| p.is_finite() && *p > 0.0)
        {
            Some(selling) => {
                let margin = selling - cost_per_portion;
                (Some(margin), Some(margin / selling * 100.0))
            }
            None => (None, None),
        };

        CostBreakdown {
            batch_cost,
            cost_per_portion,
            margin_per_portion,
            margin_percent,
            lines,
        }
    }

    fn cost_line(
        &self,
        index: usize,
        line: &RecipeIngredient,
        purchase: Option<&Purchase>,
        auto_recalc: bool,
    ) -> LineCost {
        let snapshot = line
            .price_per_unit_snapshot
            .filter(|p| p.is_finite() && *p >= 0.0);

        let (unit_price, price_source) = match (auto_recalc, purchase, snapshot) {
            (true, Some(p), _) => (p.price_per_unit, PriceSource::Live),
            (false, _, Some(frozen)) => (frozen, PriceSource::Snapshot),
            (false, Some(p), None) => (p.price_per_unit, PriceSource::Live),
            (true, None, _) | (false, None, None) => (0.0, PriceSource::None),
        };

        let quantity = if line.quantity.is_finite() { line.quantity } else { 0.0 };
        let (converted_quantity, unit_mismatch) = match purchase {
            Some(p) => (
                self.converter.convert(quantity, &line.unit, &p.unit),
                !self.converter.are_compatible(&line.unit, &p.unit),
            ),
            None => (quantity, false),
        };

        if purchase.is_none() {
            tracing::debug!(
                index,
                purchase_id = %line.purchase_id,
                has_snapshot = snapshot.is_some(),
                "ingredient references a missing purchase"
            );
        }

        let needs_snapshot = !auto_recalc
            && snapshot.is_none()
            && purchase.is_some_and(|p| p.price_per_unit > 0.0);

        LineCost {
            index,
            purchase_id: line.purchase_id.clone(),
            purchase_name: purchase.map(|p| p.name.clone()),
            quantity,
            unit: line.unit.clone(),
            converted_quantity,
            purchase_unit: purchase.map(|p| p.unit.clone()),
            unit_price,
            price_source,
            cost: converted_quantity * unit_price,
            missing: purchase.is_none(),
            unit_mismatch,
            needs_snapshot,
        }
    }
}

impl Default for CostingService {
    fn default() -> Self {
        Self::new()
    }
}
