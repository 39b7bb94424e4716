use crate::errors::CoreError;
use crate::models::number::NumberInput;
use crate::models::purchase::{is_purchase_field, Purchase, PurchasePatch};
use crate::storage::manager::StorageManager;
use crate::storage::sanitize::sanitize_purchases;

use super::price_history_service::PriceHistoryService;

/// Keys that mark a seeded demo record, in stored form.
const DEMO_MARKERS: [&str; 2] = ["isDemo", "demo"];

/// Owns the purchase catalogue.
///
/// Loaded once from storage, kept in memory, and written back in full after
/// every mutation. The new collection is persisted before it replaces the
/// in-memory one, so a failed write leaves the store as it was.
pub struct PurchaseStore {
    manager: StorageManager,
    purchases: Vec<Purchase>,
    history: PriceHistoryService,
}

impl std::fmt::Debug for PurchaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseStore")
            .field("purchases", &self.purchases.len())
            .finish()
    }
}

impl PurchaseStore {
    /// Read and sanitize the stored catalogue. Corrupted data loads as empty.
    pub fn load(manager: StorageManager) -> Result<Self, CoreError> {
        let raw = manager.load_array(&manager.keys().purchases())?;
        let purchases = sanitize_purchases(raw, manager.now(), manager.id_generator());
        tracing::info!(count = purchases.len(), "loaded purchases");
        Ok(Self {
            manager,
            purchases,
            history: PriceHistoryService::new(),
        })
    }

    /// Copy of every purchase, in stored order.
    #[must_use]
    pub fn list(&self) -> Vec<Purchase> {
        self.purchases.clone()
    }

    /// Copy of one purchase.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Purchase> {
        self.purchases.iter().find(|p| p.id == id).cloned()
    }

    /// Read-only view for costing; avoids cloning the catalogue.
    pub(crate) fn as_slice(&self) -> &[Purchase] {
        &self.purchases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }

    /// Create or update a purchase from a partial record.
    ///
    /// The id, `createdAt`, `updatedAt`, price and price history are always
    /// computed here and never taken verbatim from the patch. Any demo marker
    /// is removed: an edited demo record becomes user data. Existing records
    /// keep their position.
    pub fn upsert(&mut self, patch: PurchasePatch) -> Result<Purchase, CoreError> {
        let now = self.manager.now();
        let requested_id = patch.id.clone().filter(|id| !id.trim().is_empty());
        let position = requested_id.as_deref().and_then(|id| self.position(id));
        let existing = position.map(|idx| &self.purchases[idx]);

        let id = requested_id.unwrap_or_else(|| self.fresh_id());
        let created_at = existing
            .map(|p| p.created_at)
            .or(patch.created_at)
            .unwrap_or(now);

        let price = patch
            .price_per_unit
            .as_ref()
            .map(NumberInput::coerce)
            .or(existing.map(|p| p.price_per_unit))
            .unwrap_or(0.0);
        let price = if price.is_finite() && price > 0.0 { price } else { 0.0 };

        let price_history = self.history.reconcile(
            existing.map(|p| p.price_history.as_slice()).unwrap_or(&[]),
            price,
            existing.map(|p| p.price_per_unit),
            existing.map(|p| p.updated_at),
            now,
        );

        let mut merged = match existing {
            Some(p) => p.clone(),
            None => Purchase {
                id: id.clone(),
                name: String::new(),
                category: String::new(),
                subtype: String::new(),
                supplier: String::new(),
                unit: String::new(),
                price_per_unit: 0.0,
                notes: String::new(),
                currency: None,
                invoice_number: None,
                invoice_date: None,
                created_at,
                updated_at: now,
                price_history: Vec::new(),
                is_demo: false,
                extra: serde_json::Map::new(),
            },
        };
        apply_patch(&mut merged, patch);

        merged.id = id;
        merged.created_at = created_at;
        merged.updated_at = now;
        merged.price_per_unit = price;
        merged.price_history = price_history;

        if merged.is_demo || DEMO_MARKERS.iter().any(|k| merged.extra.contains_key(*k)) {
            tracing::debug!(id = %merged.id, "edited demo purchase, promoting to user data");
            merged.is_demo = false;
            for key in DEMO_MARKERS {
                merged.extra.remove(key);
            }
        }
        merged.normalize();

        let mut next = self.purchases.clone();
        match position {
            Some(idx) => next[idx] = merged.clone(),
            None => next.push(merged.clone()),
        }
        self.commit(next)?;

        tracing::debug!(
            id = %merged.id,
            created = position.is_none(),
            price = merged.price_per_unit,
            history = merged.price_history.len(),
            "upserted purchase"
        );
        Ok(merged)
    }

    /// Remove a purchase. Returns whether it existed; removing an unknown id
    /// is not an error and writes nothing.
    pub fn delete(&mut self, id: &str) -> Result<bool, CoreError> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };
        let mut next = self.purchases.clone();
        next.remove(idx);
        self.commit(next)?;
        tracing::debug!(id, "deleted purchase");
        Ok(true)
    }

    /// Replace the whole catalogue (demo seeding, import). Records are
    /// normalized but otherwise kept as given, demo markers included.
    pub fn replace_all(&mut self, purchases: Vec<Purchase>) -> Result<(), CoreError> {
        let next: Vec<Purchase> = purchases
            .into_iter()
            .map(|mut p| {
                p.normalize();
                p
            })
            .collect();
        self.commit(next)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.purchases.iter().position(|p| p.id == id)
    }

    /// A generated id no stored purchase uses yet.
    fn fresh_id(&self) -> String {
        loop {
            let id = self.manager.new_id("p");
            if self.position(&id).is_none() {
                return id;
            }
            tracing::debug!(%id, "generated purchase id already taken, retrying");
        }
    }

    fn commit(&mut self, next: Vec<Purchase>) -> Result<(), CoreError> {
        self.manager.save(&self.manager.keys().purchases(), &next)?;
        self.purchases = next;
        Ok(())
    }
}

/// Overlay every field the patch carries onto `target`.
fn apply_patch(target: &mut Purchase, patch: PurchasePatch) {
    let PurchasePatch {
        id: _,
        name,
        category,
        subtype,
        supplier,
        unit,
        price_per_unit: _,
        notes,
        currency,
        invoice_number,
        invoice_date,
        created_at: _,
        extra,
    } = patch;

    if let Some(v) = name {
        target.name = v;
    }
    if let Some(v) = category {
        target.category = v;
    }
    if let Some(v) = subtype {
        target.subtype = v;
    }
    if let Some(v) = supplier {
        target.supplier = v;
    }
    if let Some(v) = unit {
        target.unit = v;
    }
    if let Some(v) = notes {
        target.notes = v;
    }
    if currency.is_some() {
        target.currency = currency;
    }
    if invoice_number.is_some() {
        target.invoice_number = invoice_number;
    }
    if invoice_date.is_some() {
        target.invoice_date = invoice_date;
    }
    for (key, value) in extra {
        if is_purchase_field(&key) {
            tracing::debug!(id = %target.id, key = %key, "ignoring patch key that names a computed field");
            continue;
        }
        target.extra.insert(key, value);
    }
}
