pub mod conversion_service;
pub mod costing_service;
pub mod price_history_service;
pub mod purchase_store;
pub mod recipe_store;
pub mod settings_store;
