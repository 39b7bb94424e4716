use serde::{Deserialize, Serialize};

/// The physical quantity a unit measures. Only units of the same
/// dimension can be converted into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Mass,
    Volume,
    /// Pieces, bags, trays... never converted.
    Count,
}

/// A measurement unit the converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Piece,
}

impl Unit {
    /// Parse a unit token, case-insensitively. `"gr"` is accepted for grams.
    /// Returns `None` for empty or unknown tokens.
    pub fn parse(token: &str) -> Option<Unit> {
        match normalize_token(token).as_str() {
            "g" | "gr" => Some(Unit::Gram),
            "kg" => Some(Unit::Kilogram),
            "ml" => Some(Unit::Milliliter),
            "l" => Some(Unit::Liter),
            "pcs" | "pc" => Some(Unit::Piece),
            _ => None,
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Gram | Unit::Kilogram => Dimension::Mass,
            Unit::Milliliter | Unit::Liter => Dimension::Volume,
            Unit::Piece => Dimension::Count,
        }
    }

    /// How many base units (g, ml, pcs) one of this unit holds.
    pub fn base_factor(&self) -> f64 {
        match self {
            Unit::Kilogram | Unit::Liter => 1000.0,
            Unit::Gram | Unit::Milliliter | Unit::Piece => 1.0,
        }
    }

    /// Canonical short symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Milliliter => "ml",
            Unit::Liter => "l",
            Unit::Piece => "pcs",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Lowercase, trimmed form of a unit token. Aliases are resolved by [`Unit::parse`].
pub fn normalize_token(token: &str) -> String {
    token.trim().to_lowercase()
}
