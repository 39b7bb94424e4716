use serde::{Deserialize, Serialize};

use super::purchase::Purchase;
use super::recipe::Recipe;
use super::settings::Settings;

/// Everything the app stores, in one document. Produced by
/// `ProfitPlate::export_json` and accepted by `ProfitPlate::import_json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub purchases: Vec<Purchase>,
    pub recipes: Vec<Recipe>,
    pub settings: Settings,
}

/// Counts of records kept after an import was sanitized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub purchases: usize,
    pub recipes: usize,
}
