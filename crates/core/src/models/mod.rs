pub mod backup;
pub mod costing;
pub mod number;
pub mod purchase;
pub mod recipe;
pub mod settings;
pub mod unit;
