use serde::{Deserialize, Serialize};

/// User-configurable settings, stored under their own key next to
/// the purchase and recipe collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// UI language code (e.g., "en").
    pub language: String,

    /// Display currency code (e.g., "EUR"). No exchange-rate conversion is done.
    pub currency: String,

    /// Number formatting locale hint (e.g., "eu").
    pub locale: String,

    /// When `true`, recipes are always costed with live purchase prices.
    /// When `false`, per-line price snapshots take precedence.
    pub auto_recalc: bool,

    /// Show advanced columns and fields in the UI.
    pub show_advanced: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            currency: "EUR".to_string(),
            locale: "eu".to_string(),
            auto_recalc: true,
            show_advanced: false,
        }
    }
}
