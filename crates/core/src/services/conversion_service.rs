use crate::models::number::NumberInput;
use crate::models::unit::{normalize_token, Dimension, Unit};

/// Converts recipe quantities into the unit a purchase is priced in.
///
/// Supported: g ↔ kg and ml ↔ l (factor 1000). Pieces never convert.
/// Anything else (unknown tokens, mass ↔ volume, empty units) is passed
/// through unchanged: the converter never fails and never guesses.
/// Use [`are_compatible`](Self::are_compatible) to detect the pass-through.
pub struct ConversionService;

impl ConversionService {
    pub fn new() -> Self {
        Self
    }

    /// Convert `quantity` from `from_unit` to `to_unit`.
    /// A non-finite quantity is treated as 0.
    pub fn convert(&self, quantity: f64, from_unit: &str, to_unit: &str) -> f64 {
        let quantity = if quantity.is_finite() { quantity } else { 0.0 };

        if normalize_token(from_unit) == normalize_token(to_unit) {
            return quantity;
        }

        match (Unit::parse(from_unit), Unit::parse(to_unit)) {
            (Some(from), Some(to)) if Self::convertible(from, to) => {
                quantity * from.base_factor() / to.base_factor()
            }
            _ => quantity,
        }
    }

    /// Same as [`convert`](Self::convert) for raw form input; unparseable input counts as 0.
    pub fn convert_input(&self, quantity: &NumberInput, from_unit: &str, to_unit: &str) -> f64 {
        self.convert(quantity.coerce(), from_unit, to_unit)
    }

    /// Whether a quantity in `from_unit` can be expressed in `to_unit`,
    /// either because the tokens are equal or because a conversion exists.
    pub fn are_compatible(&self, from_unit: &str, to_unit: &str) -> bool {
        if normalize_token(from_unit) == normalize_token(to_unit) {
            return true;
        }
        match (Unit::parse(from_unit), Unit::parse(to_unit)) {
            (Some(from), Some(to)) => from == to || Self::convertible(from, to),
            _ => false,
        }
    }

    fn convertible(from: Unit, to: Unit) -> bool {
        from.dimension() == to.dimension() && from.dimension() != Dimension::Count
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grams_to_kilograms_and_back() {
        let c = ConversionService::new();
        let kg = c.convert(1000.0, "g", "kg");
        assert_eq!(kg, 1.0);
        assert_eq!(c.convert(kg, "kg", "g"), 1000.0);
    }

    #[test]
    fn gr_alias_and_case() {
        let c = ConversionService::new();
        assert_eq!(c.convert(500.0, "GR", "Kg"), 0.5);
        assert_eq!(c.convert(2.0, "L", "ml"), 2000.0);
    }

    #[test]
    fn incompatible_units_pass_through() {
        let c = ConversionService::new();
        assert_eq!(c.convert(5.0, "pcs", "kg"), 5.0);
        assert_eq!(c.convert(5.0, "kg", "l"), 5.0);
        assert_eq!(c.convert(5.0, "", "kg"), 5.0);
        assert_eq!(c.convert(5.0, "bag", "kg"), 5.0);
        assert!(!c.are_compatible("pcs", "kg"));
        assert!(c.are_compatible("bag", "BAG"));
        assert!(c.are_compatible("gr", "g"));
    }

    #[test]
    fn garbage_quantity_is_zero() {
        let c = ConversionService::new();
        assert_eq!(c.convert_input(&NumberInput::from("abc"), "g", "kg"), 0.0);
        assert_eq!(c.convert(f64::NAN, "g", "kg"), 0.0);
    }
}
