//! Repair pass for collections read from storage or imported from a backup.
//!
//! Records written by older front-ends may carry strings where numbers are
//! expected, date-only history entries, or no history at all. Each record is
//! repaired field by field on its JSON form and then deserialized; records
//! that are not objects, or still fail to deserialize, are dropped.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::models::number::coerce_json;
use crate::models::purchase::Purchase;
use crate::models::recipe::Recipe;
use crate::models::settings::Settings;

use super::traits::IdGenerator;

const PURCHASE_TEXT_FIELDS: [&str; 6] = ["name", "category", "subtype", "supplier", "unit", "notes"];
const PURCHASE_OPTIONAL_TEXT_FIELDS: [&str; 3] = ["currency", "invoiceNumber", "invoiceDate"];

/// Parse the timestamp formats found in stored data: RFC 3339, a bare
/// `YYYY-MM-DD` date (midnight UTC), a naive date-time, or epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn timestamp_value(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Identifier as a non-empty string, accepting numeric ids from old data.
fn id_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ids already present in a raw collection.
fn present_ids(raw: &[Value]) -> HashSet<String> {
    raw.iter().filter_map(|v| id_of(v.get("id"))).collect()
}

/// A generated id that is not in `taken`; it is added to `taken`.
fn unused_id(prefix: &str, taken: &mut HashSet<String>, ids: &dyn IdGenerator) -> String {
    loop {
        let id = ids.generate(prefix);
        if taken.insert(id.clone()) {
            return id;
        }
    }
}

/// Make `key` a string: numbers and bools are stringified, anything else removed.
fn fix_text(map: &mut Map<String, Value>, key: &str) {
    let fixed = match map.get(key) {
        None | Some(Value::String(_)) => return,
        Some(Value::Number(n)) => Some(Value::String(n.to_string())),
        Some(Value::Bool(b)) => Some(Value::String(b.to_string())),
        Some(_) => None,
    };
    match fixed {
        Some(v) => {
            map.insert(key.to_string(), v);
        }
        None => {
            map.remove(key);
        }
    }
}

fn fix_flag(map: &mut Map<String, Value>, key: &str) {
    if !matches!(map.get(key), None | Some(Value::Bool(_))) {
        map.remove(key);
    }
}

/// Repair a stored purchase collection. `now` dates entries that need a
/// timestamp and have none.
pub fn sanitize_purchases(
    raw: Vec<Value>,
    now: DateTime<Utc>,
    ids: &dyn IdGenerator,
) -> Vec<Purchase> {
    let total = raw.len();
    let mut taken = present_ids(&raw);
    let purchases: Vec<Purchase> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| sanitize_purchase(index, value, now, &mut taken, ids))
        .collect();
    if purchases.len() < total {
        tracing::warn!(
            dropped = total - purchases.len(),
            kept = purchases.len(),
            "dropped malformed purchase records"
        );
    }
    purchases
}

fn sanitize_purchase(
    index: usize,
    value: Value,
    now: DateTime<Utc>,
    taken: &mut HashSet<String>,
    ids: &dyn IdGenerator,
) -> Option<Purchase> {
    let Value::Object(mut map) = value else {
        tracing::warn!(index, "purchase entry is not an object");
        return None;
    };

    let id = id_of(map.get("id")).unwrap_or_else(|| {
        let id = unused_id("p", taken, ids);
        tracing::warn!(index, %id, "purchase without id, assigned a new one");
        id
    });
    map.insert("id".into(), Value::String(id));

    for key in PURCHASE_TEXT_FIELDS {
        fix_text(&mut map, key);
    }
    for key in PURCHASE_OPTIONAL_TEXT_FIELDS {
        fix_text(&mut map, key);
    }
    fix_flag(&mut map, "isDemo");

    let price = map.get("pricePerUnit").map(coerce_json).unwrap_or(0.0).max(0.0);
    map.insert("pricePerUnit".into(), Value::from(price));

    let updated = map.get("updatedAt").and_then(parse_timestamp);
    let created = map
        .get("createdAt")
        .and_then(parse_timestamp)
        .or(updated)
        .unwrap_or(now);
    map.insert("createdAt".into(), timestamp_value(created));
    map.insert("updatedAt".into(), timestamp_value(updated.unwrap_or(created)));

    let history = match map.remove("priceHistory") {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| repair_history_entry(&entry))
            .collect(),
        _ => Vec::new(),
    };
    map.insert("priceHistory".into(), Value::Array(history));

    match serde_json::from_value::<Purchase>(Value::Object(map)) {
        Ok(mut purchase) => {
            purchase.normalize();
            Some(purchase)
        }
        Err(e) => {
            tracing::warn!(index, error = %e, "purchase entry could not be repaired");
            None
        }
    }
}

/// `{date, pricePerUnit | price}` with a readable date and a positive price, or nothing.
fn repair_history_entry(entry: &Value) -> Option<Value> {
    let map = entry.as_object()?;
    let date = map.get("date").and_then(parse_timestamp)?;
    let price = map
        .get("pricePerUnit")
        .or_else(|| map.get("price"))
        .map(coerce_json)?;
    if price <= 0.0 {
        return None;
    }
    let mut fixed = Map::new();
    fixed.insert("date".into(), timestamp_value(date));
    fixed.insert("pricePerUnit".into(), Value::from(price));
    Some(Value::Object(fixed))
}

/// Repair a stored recipe collection.
pub fn sanitize_recipes(raw: Vec<Value>, ids: &dyn IdGenerator) -> Vec<Recipe> {
    let total = raw.len();
    let mut taken = present_ids(&raw);
    let recipes: Vec<Recipe> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| sanitize_recipe(index, value, &mut taken, ids))
        .collect();
    if recipes.len() < total {
        tracing::warn!(
            dropped = total - recipes.len(),
            kept = recipes.len(),
            "dropped malformed recipe records"
        );
    }
    recipes
}

fn sanitize_recipe(
    index: usize,
    value: Value,
    taken: &mut HashSet<String>,
    ids: &dyn IdGenerator,
) -> Option<Recipe> {
    let Value::Object(mut map) = value else {
        tracing::warn!(index, "recipe entry is not an object");
        return None;
    };

    let id = id_of(map.get("id")).unwrap_or_else(|| {
        let id = unused_id("r", taken, ids);
        tracing::warn!(index, %id, "recipe without id, assigned a new one");
        id
    });
    map.insert("id".into(), Value::String(id));

    fix_text(&mut map, "name");
    fix_text(&mut map, "notes");
    fix_text(&mut map, "currency");
    fix_flag(&mut map, "archived");
    fix_flag(&mut map, "isDemo");

    let portions = map.get("portions").map(coerce_json).unwrap_or(0.0);
    map.insert("portions".into(), Value::from(portions));

    // Older records call it `sellingPrice`; keep exactly one key.
    let legacy = map.remove("sellingPrice");
    let selling = map
        .remove("sellingPricePerPortion")
        .filter(|v| !v.is_null())
        .or(legacy.filter(|v| !v.is_null()))
        .map(|v| coerce_json(&v))
        .filter(|p| *p > 0.0);
    if let Some(price) = selling {
        map.insert("sellingPricePerPortion".into(), Value::from(price));
    }

    for key in ["createdAt", "updatedAt"] {
        match map.get(key).map(parse_timestamp) {
            Some(Some(dt)) => {
                map.insert(key.into(), timestamp_value(dt));
            }
            Some(None) => {
                map.remove(key);
            }
            None => {}
        }
    }

    let ingredients = match map.remove("ingredients") {
        Some(Value::Array(lines)) => lines.iter().filter_map(repair_ingredient).collect(),
        _ => Vec::new(),
    };
    map.insert("ingredients".into(), Value::Array(ingredients));

    match serde_json::from_value::<Recipe>(Value::Object(map)) {
        Ok(recipe) => Some(recipe),
        Err(e) => {
            tracing::warn!(index, error = %e, "recipe entry could not be repaired");
            None
        }
    }
}

fn repair_ingredient(line: &Value) -> Option<Value> {
    let map = line.as_object()?;
    let purchase_id = id_of(map.get("purchaseId"))?;
    let mut fixed = Map::new();
    fixed.insert("purchaseId".into(), Value::String(purchase_id));
    fixed.insert(
        "quantity".into(),
        Value::from(map.get("quantity").map(coerce_json).unwrap_or(0.0)),
    );
    let unit = match map.get("unit") {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };
    fixed.insert("unit".into(), Value::String(unit));
    if let Some(snapshot) = map.get("pricePerUnitSnapshot").filter(|v| !v.is_null()) {
        let price = coerce_json(snapshot);
        if price >= 0.0 {
            fixed.insert("pricePerUnitSnapshot".into(), Value::from(price));
        }
    }
    Some(Value::Object(fixed))
}

/// Settings from a stored object; unknown or mistyped content falls back to defaults.
pub fn sanitize_settings(raw: Option<Value>) -> Settings {
    let Some(value) = raw else {
        return Settings::default();
    };
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "settings could not be read, using defaults");
        Settings::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_date_only_and_rfc3339() {
        let a = parse_timestamp(&json!("2025-01-10")).unwrap();
        let b = parse_timestamp(&json!("2025-01-10T00:00:00Z")).unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp(&json!("yesterday")).is_none());
        assert!(parse_timestamp(&json!(null)).is_none());
    }

    #[test]
    fn history_entry_accepts_either_price_key() {
        let e = repair_history_entry(&json!({"date": "2025-02-01", "price": "6,4"})).unwrap();
        assert_eq!(e["pricePerUnit"], json!(6.4));
        assert!(repair_history_entry(&json!({"date": "2025-02-01", "price": 0})).is_none());
        assert!(repair_history_entry(&json!({"price": 3})).is_none());
        assert!(repair_history_entry(&json!("6.4")).is_none());
    }

    #[test]
    fn ingredient_without_purchase_id_is_dropped() {
        assert!(repair_ingredient(&json!({"quantity": 1, "unit": "kg"})).is_none());
        let fixed = repair_ingredient(&json!({"purchaseId": "p1", "quantity": "0,5"})).unwrap();
        assert_eq!(fixed["quantity"], json!(0.5));
        assert_eq!(fixed["unit"], json!(""));
    }
}
