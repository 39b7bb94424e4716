pub mod errors;
pub mod models;
pub mod sample_data;
pub mod services;
pub mod storage;

use std::rc::Rc;

use models::{
    backup::{Backup, ImportSummary},
    costing::{CostBreakdown, RecipeCostSummary},
    purchase::{PriceEntry, Purchase, PurchasePatch},
    recipe::Recipe,
    settings::Settings,
};
use services::{
    conversion_service::ConversionService, costing_service::CostingService,
    purchase_store::PurchaseStore, recipe_store::RecipeStore, settings_store::SettingsStore,
};
use storage::manager::StorageManager;
use storage::sanitize::{sanitize_purchases, sanitize_recipes, sanitize_settings};
use storage::traits::{
    Clock, IdGenerator, KeyValueStorage, StorageKeys, SystemClock, UuidIdGenerator,
};

use errors::CoreError;

/// Main entry point for the ProfitPlate core library.
///
/// Owns the purchase catalogue, the recipes and the settings, all read from
/// one key-value storage at open time and written back on every change.
/// Costing is computed on demand from the current state.
#[must_use]
pub struct ProfitPlate {
    manager: StorageManager,
    purchases: PurchaseStore,
    recipes: RecipeStore,
    settings: SettingsStore,
    costing_service: CostingService,
    conversion_service: ConversionService,
}

impl std::fmt::Debug for ProfitPlate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfitPlate")
            .field("purchases", &self.purchases.len())
            .field("recipes", &self.recipes.len())
            .field("settings", self.settings.get())
            .finish()
    }
}

impl ProfitPlate {
    /// Open the stores kept in `storage` using wall-clock time, UUID ids
    /// and the default `pp_*` keys.
    pub fn open(storage: impl KeyValueStorage + 'static) -> Result<Self, CoreError> {
        Self::open_with(
            Rc::new(storage),
            Rc::new(SystemClock),
            Rc::new(UuidIdGenerator),
            StorageKeys::default(),
        )
    }

    /// Open with every collaborator injected.
    pub fn open_with(
        storage: Rc<dyn KeyValueStorage>,
        clock: Rc<dyn Clock>,
        ids: Rc<dyn IdGenerator>,
        keys: StorageKeys,
    ) -> Result<Self, CoreError> {
        let manager = StorageManager::new(storage, clock, ids, keys);
        let purchases = PurchaseStore::load(manager.clone())?;
        let recipes = RecipeStore::load(manager.clone())?;
        let settings = SettingsStore::load(manager.clone())?;

        Ok(Self {
            manager,
            purchases,
            recipes,
            settings,
            costing_service: CostingService::new(),
            conversion_service: ConversionService::new(),
        })
    }

    // ── Purchases ───────────────────────────────────────────────────

    /// All purchases, in stored order. The returned records are copies.
    #[must_use]
    pub fn list_purchases(&self) -> Vec<Purchase> {
        self.purchases.list()
    }

    #[must_use]
    pub fn get_purchase(&self, id: &str) -> Option<Purchase> {
        self.purchases.get(id)
    }

    /// Recorded prices of a purchase, oldest first.
    pub fn price_history(&self, purchase_id: &str) -> Result<Vec<PriceEntry>, CoreError> {
        self.purchases
            .as_slice()
            .iter()
            .find(|p| p.id == purchase_id)
            .map(|p| p.price_history.clone())
            .ok_or_else(|| CoreError::PurchaseNotFound(purchase_id.to_string()))
    }

    /// Create or update a purchase; see [`PurchaseStore::upsert`].
    pub fn upsert_purchase(&mut self, patch: PurchasePatch) -> Result<Purchase, CoreError> {
        self.purchases.upsert(patch)
    }

    /// Delete a purchase. Recipes that use it are left alone; their lines
    /// show up as missing references when costed.
    pub fn delete_purchase(&mut self, id: &str) -> Result<bool, CoreError> {
        self.purchases.delete(id)
    }

    // ── Recipes ─────────────────────────────────────────────────────

    /// Recipes in stored order; archived ones only with `include_archived`.
    #[must_use]
    pub fn list_recipes(&self, include_archived: bool) -> Vec<Recipe> {
        self.recipes.list(include_archived)
    }

    #[must_use]
    pub fn get_recipe(&self, id: &str) -> Option<Recipe> {
        self.recipes.get(id)
    }

    pub fn upsert_recipe(&mut self, recipe: Recipe) -> Result<Recipe, CoreError> {
        self.recipes.upsert(recipe)
    }

    pub fn delete_recipe(&mut self, id: &str) -> Result<bool, CoreError> {
        self.recipes.delete(id)
    }

    pub fn set_recipe_archived(&mut self, id: &str, archived: bool) -> Result<Recipe, CoreError> {
        self.recipes.set_archived(id, archived)
    }

    // ── Costing ─────────────────────────────────────────────────────

    /// Cost a stored recipe with the current catalogue and `autoRecalc` setting.
    pub fn compute_costs(&self, recipe_id: &str) -> Result<CostBreakdown, CoreError> {
        let recipe = self
            .recipes
            .get(recipe_id)
            .ok_or_else(|| CoreError::RecipeNotFound(recipe_id.to_string()))?;
        Ok(self.compute_costs_for(&recipe))
    }

    /// Cost any recipe, stored or not, with the current catalogue and settings.
    #[must_use]
    pub fn compute_costs_for(&self, recipe: &Recipe) -> CostBreakdown {
        self.costing_service.compute_costs(
            recipe,
            self.purchases.as_slice(),
            self.settings.get().auto_recalc,
        )
    }

    /// Cost every listed recipe, in list order.
    #[must_use]
    pub fn recipe_cost_summaries(&self, include_archived: bool) -> Vec<RecipeCostSummary> {
        self.recipes
            .list(include_archived)
            .into_iter()
            .map(|recipe| RecipeCostSummary {
                costs: self.compute_costs_for(&recipe),
                recipe_id: recipe.id,
                recipe_name: recipe.name,
                portions: recipe.portions,
                archived: recipe.archived,
            })
            .collect()
    }

    /// Freeze the live price into every line of the recipe that has none.
    ///
    /// Only acts while auto-recalculation is off; lines whose purchase is
    /// missing or unpriced are skipped. Returns the number of lines captured
    /// and writes the recipe only if that number is non-zero.
    pub fn backfill_snapshots(&mut self, recipe_id: &str) -> Result<usize, CoreError> {
        if self.settings.get().auto_recalc {
            return Ok(0);
        }
        self.capture_snapshots(recipe_id, false)
    }

    /// Overwrite every line's snapshot with the purchase's current price.
    /// Returns the number of lines updated.
    pub fn refresh_snapshots(&mut self, recipe_id: &str) -> Result<usize, CoreError> {
        self.capture_snapshots(recipe_id, true)
    }

    /// Convert a quantity between units; see [`ConversionService::convert`].
    #[must_use]
    pub fn convert_quantity(&self, quantity: f64, from_unit: &str, to_unit: &str) -> f64 {
        self.conversion_service.convert(quantity, from_unit, to_unit)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        self.settings.get()
    }

    pub fn update_settings(&mut self, settings: Settings) -> Result<(), CoreError> {
        self.settings.save(settings)
    }

    pub fn set_auto_recalc(&mut self, enabled: bool) -> Result<(), CoreError> {
        let mut settings = self.settings.get().clone();
        settings.auto_recalc = enabled;
        self.settings.save(settings)
    }

    /// Set the display currency. Must be a 3-letter alphabetic code.
    pub fn set_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        let trimmed = currency.trim().to_uppercase();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., EUR, USD)"
            )));
        }
        let mut settings = self.settings.get().clone();
        settings.currency = trimmed;
        self.settings.save(settings)
    }

    // ── Demo data ───────────────────────────────────────────────────

    /// Overwrite purchases, recipes and settings with the built-in demo set.
    /// All or nothing: on a failed write the previous data is put back.
    pub fn load_sample_data(&mut self) -> Result<(), CoreError> {
        let now = self.manager.now();
        self.replace_everything(
            sample_data::sample_purchases(now),
            sample_data::sample_recipes(now),
            sample_data::sample_settings(),
        )?;
        tracing::info!(
            purchases = self.purchases.len(),
            recipes = self.recipes.len(),
            "loaded sample data"
        );
        Ok(())
    }

    /// Whether any untouched demo record is still present.
    #[must_use]
    pub fn has_demo_data(&self) -> bool {
        self.purchases.as_slice().iter().any(|p| p.is_demo)
            || self.recipes.list(true).iter().any(|r| r.is_demo)
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// Everything stored, as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, CoreError> {
        let backup = Backup {
            purchases: self.purchases.list(),
            recipes: self.recipes.list(true),
            settings: self.settings.get().clone(),
        };
        serde_json::to_string_pretty(&backup)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize backup: {e}")))
    }

    /// Replace all three collections with the content of a backup document.
    ///
    /// The document goes through the same repair pass as stored data, so a
    /// partially damaged backup imports what can be salvaged. A document
    /// that is not a JSON object is rejected and nothing changes. A failed
    /// write part way through restores the collections already replaced.
    pub fn import_json(&mut self, json: &str) -> Result<ImportSummary, CoreError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(mut doc) = value else {
            return Err(CoreError::Deserialization(
                "backup must be a JSON object".into(),
            ));
        };

        let take_array = |doc: &mut serde_json::Map<String, serde_json::Value>, key: &str| {
            match doc.remove(key) {
                Some(serde_json::Value::Array(items)) => items,
                _ => Vec::new(),
            }
        };
        let purchases = sanitize_purchases(
            take_array(&mut doc, "purchases"),
            self.manager.now(),
            self.manager.id_generator(),
        );
        let recipes = sanitize_recipes(take_array(&mut doc, "recipes"), self.manager.id_generator());
        let settings = sanitize_settings(doc.remove("settings").filter(|v| v.is_object()));

        let summary = ImportSummary {
            purchases: purchases.len(),
            recipes: recipes.len(),
        };
        self.replace_everything(purchases, recipes, settings)?;
        tracing::info!(
            purchases = summary.purchases,
            recipes = summary.recipes,
            "imported backup"
        );
        Ok(summary)
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Replace the three collections in order, undoing the earlier ones if a
    /// later write fails.
    fn replace_everything(
        &mut self,
        purchases: Vec<Purchase>,
        recipes: Vec<Recipe>,
        settings: Settings,
    ) -> Result<(), CoreError> {
        let previous_purchases = self.purchases.list();
        let previous_recipes = self.recipes.list(true);

        self.purchases.replace_all(purchases)?;

        if let Err(e) = self.recipes.replace_all(recipes) {
            self.restore(Some(previous_purchases), None);
            return Err(e);
        }

        if let Err(e) = self.settings.save(settings) {
            self.restore(Some(previous_purchases), Some(previous_recipes));
            return Err(e);
        }
        Ok(())
    }

    fn restore(&mut self, purchases: Option<Vec<Purchase>>, recipes: Option<Vec<Recipe>>) {
        if let Some(purchases) = purchases {
            if let Err(e) = self.purchases.replace_all(purchases) {
                tracing::warn!(error = %e, "could not restore purchases after a failed replace");
            }
        }
        if let Some(recipes) = recipes {
            if let Err(e) = self.recipes.replace_all(recipes) {
                tracing::warn!(error = %e, "could not restore recipes after a failed replace");
            }
        }
    }

    fn capture_snapshots(&mut self, recipe_id: &str, overwrite: bool) -> Result<usize, CoreError> {
        let recipe = self
            .recipes
            .get(recipe_id)
            .ok_or_else(|| CoreError::RecipeNotFound(recipe_id.to_string()))?;

        let mut captured = 0;
        let ingredients = recipe
            .ingredients
            .into_iter()
            .map(|mut line| {
                if overwrite || line.price_per_unit_snapshot.is_none() {
                    let live = self
                        .purchases
                        .as_slice()
                        .iter()
                        .find(|p| p.id == line.purchase_id)
                        .map(|p| p.price_per_unit)
                        .filter(|price| *price > 0.0);
                    if let Some(price) = live {
                        if line.price_per_unit_snapshot != Some(price) {
                            line.price_per_unit_snapshot = Some(price);
                            captured += 1;
                        }
                    }
                }
                line
            })
            .collect();

        if captured > 0 {
            self.recipes.replace_ingredients(recipe_id, ingredients)?;
            tracing::info!(recipe_id, captured, overwrite, "captured price snapshots");
        }
        Ok(captured)
    }
}
