use crate::errors::CoreError;
use crate::models::settings::Settings;
use crate::storage::manager::StorageManager;
use crate::storage::sanitize::sanitize_settings;

/// Holds the settings object and writes it through on change.
pub struct SettingsStore {
    manager: StorageManager,
    settings: Settings,
}

impl SettingsStore {
    pub fn load(manager: StorageManager) -> Result<Self, CoreError> {
        let raw = manager.load_object(&manager.keys().settings())?;
        let settings = sanitize_settings(raw);
        tracing::debug!(?settings, "loaded settings");
        Ok(Self { manager, settings })
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Persist `settings`, then make them current.
    pub fn save(&mut self, settings: Settings) -> Result<(), CoreError> {
        self.manager.save(&self.manager.keys().settings(), &settings)?;
        self.settings = settings;
        Ok(())
    }
}
