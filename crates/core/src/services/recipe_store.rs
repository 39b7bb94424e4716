use crate::errors::CoreError;
use crate::models::recipe::{Recipe, RecipeIngredient};
use crate::storage::manager::StorageManager;
use crate::storage::sanitize::sanitize_recipes;

const DEMO_MARKERS: [&str; 2] = ["isDemo", "demo"];

/// Owns the recipe collection. Same persistence rules as the purchase store:
/// whole collection written on every mutation, memory updated only after
/// the write succeeded.
pub struct RecipeStore {
    manager: StorageManager,
    recipes: Vec<Recipe>,
}

impl std::fmt::Debug for RecipeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeStore")
            .field("recipes", &self.recipes.len())
            .field("archived", &self.recipes.iter().filter(|r| r.archived).count())
            .finish()
    }
}

impl RecipeStore {
    pub fn load(manager: StorageManager) -> Result<Self, CoreError> {
        let raw = manager.load_array(&manager.keys().recipes())?;
        let recipes = sanitize_recipes(raw, manager.id_generator());
        tracing::info!(count = recipes.len(), "loaded recipes");
        Ok(Self { manager, recipes })
    }

    /// Copies of the stored recipes. Archived ones only when asked for.
    #[must_use]
    pub fn list(&self, include_archived: bool) -> Vec<Recipe> {
        self.recipes
            .iter()
            .filter(|r| include_archived || !r.archived)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Recipe> {
        self.recipes.iter().find(|r| r.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Insert or replace a recipe by id, assigning an id when it has none.
    ///
    /// For an existing recipe, `archived` and `createdAt` are kept from the
    /// stored record; use [`set_archived`](Self::set_archived) to change the
    /// flag. `updatedAt` is stamped and any demo marker is removed.
    pub fn upsert(&mut self, mut recipe: Recipe) -> Result<Recipe, CoreError> {
        let now = self.manager.now();
        if recipe.id.trim().is_empty() {
            recipe.id = self.fresh_id();
        }
        recipe.strip_shadowed_extra();
        let position = self.position(&recipe.id);

        if let Some(stored) = position.map(|idx| &self.recipes[idx]) {
            recipe.archived = stored.archived;
            recipe.created_at = stored.created_at.or(recipe.created_at);
        }
        recipe.created_at = recipe.created_at.or(Some(now));
        recipe.updated_at = Some(now);

        if recipe.is_demo || DEMO_MARKERS.iter().any(|k| recipe.extra.contains_key(*k)) {
            tracing::debug!(id = %recipe.id, "edited demo recipe, promoting to user data");
            recipe.is_demo = false;
            for key in DEMO_MARKERS {
                recipe.extra.remove(key);
            }
        }

        self.write(position, recipe.clone())?;
        tracing::debug!(id = %recipe.id, created = position.is_none(), "upserted recipe");
        Ok(recipe)
    }

    /// Remove a recipe. Idempotent: an unknown id returns `Ok(false)`.
    pub fn delete(&mut self, id: &str) -> Result<bool, CoreError> {
        let Some(idx) = self.position(id) else {
            return Ok(false);
        };
        let mut next = self.recipes.clone();
        next.remove(idx);
        self.commit(next)?;
        tracing::debug!(id, "deleted recipe");
        Ok(true)
    }

    /// Archive or restore a recipe. The record is never deleted.
    pub fn set_archived(&mut self, id: &str, archived: bool) -> Result<Recipe, CoreError> {
        let idx = self
            .position(id)
            .ok_or_else(|| CoreError::RecipeNotFound(id.to_string()))?;
        let mut recipe = self.recipes[idx].clone();
        recipe.archived = archived;
        recipe.updated_at = Some(self.manager.now());
        self.write(Some(idx), recipe.clone())?;
        tracing::debug!(id, archived, "changed recipe archive state");
        Ok(recipe)
    }

    /// Swap the ingredient lines of a stored recipe, leaving every other
    /// field alone. Used to persist captured price snapshots.
    pub fn replace_ingredients(
        &mut self,
        id: &str,
        ingredients: Vec<RecipeIngredient>,
    ) -> Result<Recipe, CoreError> {
        let idx = self
            .position(id)
            .ok_or_else(|| CoreError::RecipeNotFound(id.to_string()))?;
        let mut recipe = self.recipes[idx].clone();
        recipe.ingredients = ingredients;
        recipe.updated_at = Some(self.manager.now());
        self.write(Some(idx), recipe.clone())?;
        Ok(recipe)
    }

    /// Replace the whole collection (demo seeding, import).
    pub fn replace_all(&mut self, recipes: Vec<Recipe>) -> Result<(), CoreError> {
        let next = recipes
            .into_iter()
            .map(|mut r| {
                r.strip_shadowed_extra();
                r
            })
            .collect();
        self.commit(next)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.recipes.iter().position(|r| r.id == id)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = self.manager.new_id("r");
            if self.position(&id).is_none() {
                return id;
            }
            tracing::debug!(%id, "generated recipe id already taken, retrying");
        }
    }

    fn write(&mut self, position: Option<usize>, recipe: Recipe) -> Result<(), CoreError> {
        let mut next = self.recipes.clone();
        match position {
            Some(idx) => next[idx] = recipe,
            None => next.push(recipe),
        }
        self.commit(next)
    }

    fn commit(&mut self, next: Vec<Recipe>) -> Result<(), CoreError> {
        self.manager.save(&self.manager.keys().recipes(), &next)?;
        self.recipes = next;
        Ok(())
    }
}
