//! Asset identification and record types.
//!
//! Every endpoint of the source describes an asset by a numeric id plus the
//! (name, symbol, slug) triple. The triple is stable across endpoints and is
//! used to join listing and ticker rows before ids can be trusted.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Column names that are carried as typed fields rather than in `fields`.
pub const ID_COLUMN: &str = "id";
pub const NAME_COLUMN: &str = "name";
pub const SYMBOL_COLUMN: &str = "symbol";
pub const SLUG_COLUMN: &str = "slug";

/// Older source revisions name the slug `website_slug`.
pub const LEGACY_SLUG_COLUMN: &str = "website_slug";

/// Leading columns of every table and snapshot, in order.
pub const KEY_COLUMNS: [&str; 4] = [ID_COLUMN, NAME_COLUMN, SYMBOL_COLUMN, SLUG_COLUMN];

/// Source-assigned asset identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Parse an id from a JSON value. The source sends integers, but string
    /// ids have been observed on some revisions.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(Self)
                .ok_or_else(|| CoreError::InvalidAssetId(n.to_string())),
            Value::String(s) => s
                .trim()
                .parse::<u64>()
                .map(Self)
                .map_err(|_| CoreError::InvalidAssetId(s.clone())),
            other => Err(CoreError::InvalidAssetId(other.to_string())),
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The (name, symbol, slug) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NaturalKey {
    pub name: String,
    pub symbol: String,
    pub slug: String,
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.name, self.symbol, self.slug)
    }
}

/// One row of the canonical table.
///
/// `fields` holds every source column other than the key columns, in the
/// order the source first sent them. Nested objects are flattened into
/// dotted names (`quotes.USD.price`).
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub id: AssetId,
    pub name: String,
    pub symbol: String,
    pub slug: String,
    pub fields: Map<String, Value>,
}

impl AssetRecord {
    pub fn new(
        id: AssetId,
        name: impl Into<String>,
        symbol: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            slug: slug.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, column: impl Into<String>, value: Value) -> Self {
        self.fields.insert(column.into(), value);
        self
    }

    /// Build a record from one JSON row of a listing or ticker response.
    pub fn from_json_row(row: &Value) -> Result<Self> {
        let obj = row
            .as_object()
            .ok_or_else(|| CoreError::InvalidRecord(format!("expected object, got {row}")))?;

        let id = match obj.get(ID_COLUMN) {
            Some(v) => AssetId::from_json(v)?,
            None => {
                return Err(CoreError::MissingField {
                    field: ID_COLUMN,
                    context: row_context(obj),
                })
            }
        };
        let name = key_text(obj, NAME_COLUMN)?;
        let symbol = key_text(obj, SYMBOL_COLUMN)?;
        let slug = obj
            .get(SLUG_COLUMN)
            .or_else(|| obj.get(LEGACY_SLUG_COLUMN))
            .map(text_of)
            .ok_or_else(|| CoreError::MissingField {
                field: SLUG_COLUMN,
                context: row_context(obj),
            })?;

        // Skip key columns up front; removing them later reorders the map.
        let mut flat = Map::new();
        for (key, value) in obj {
            if is_key_column(key) {
                continue;
            }
            flatten_into(key, value, &mut flat);
        }

        Ok(Self {
            id,
            name,
            symbol,
            slug,
            fields: flat,
        })
    }

    pub fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            slug: self.slug.clone(),
        }
    }

    /// Column names of this record, key columns first.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        KEY_COLUMNS
            .iter()
            .copied()
            .chain(self.fields.keys().map(String::as_str))
    }

    /// Value of a column, key columns included.
    pub fn get(&self, column: &str) -> Option<Value> {
        match column {
            ID_COLUMN => Some(Value::from(self.id.0)),
            NAME_COLUMN => Some(Value::String(self.name.clone())),
            SYMBOL_COLUMN => Some(Value::String(self.symbol.clone())),
            SLUG_COLUMN => Some(Value::String(self.slug.clone())),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Copy the fields of `incoming` onto this record.
    ///
    /// The id is never changed. When `skip_nulls` is set, null values in
    /// `incoming` leave the existing value untouched.
    pub fn overlay(&mut self, incoming: &AssetRecord, skip_nulls: bool) {
        if !incoming.name.is_empty() {
            self.name.clone_from(&incoming.name);
        }
        if !incoming.symbol.is_empty() {
            self.symbol.clone_from(&incoming.symbol);
        }
        if !incoming.slug.is_empty() {
            self.slug.clone_from(&incoming.slug);
        }
        for (column, value) in &incoming.fields {
            if skip_nulls && value.is_null() {
                continue;
            }
            self.fields.insert(column.clone(), value.clone());
        }
    }
}

/// Flatten nested objects into dotted keys. Arrays are kept as values.
fn flatten_into(prefix: &str, value: &Value, out: &mut Map<String, Value>) {
    match value {
        Value::Object(inner) if !inner.is_empty() => {
            for (key, nested) in inner {
                flatten_into(&format!("{prefix}.{key}"), nested, out);
            }
        }
        other => {
            out.insert(prefix.to_string(), other.clone());
        }
    }
}

fn is_key_column(column: &str) -> bool {
    column == LEGACY_SLUG_COLUMN || KEY_COLUMNS.contains(&column)
}

fn key_text(obj: &Map<String, Value>, field: &'static str) -> Result<String> {
    obj.get(field)
        .map(text_of)
        .ok_or_else(|| CoreError::MissingField {
            field,
            context: row_context(obj),
        })
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn row_context(obj: &Map<String, Value>) -> String {
    obj.get(ID_COLUMN)
        .map(|id| format!("id={id}"))
        .unwrap_or_else(|| "<no id>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_row_flattens_quotes() {
        let row = json!({
            "id": 1,
            "name": "Bitcoin",
            "symbol": "BTC",
            "website_slug": "bitcoin",
            "rank": 1,
            "quotes": {"USD": {"price": 6500.5, "volume_24h": 1.0e9}},
            "last_updated": 1525137271
        });

        let record = AssetRecord::from_json_row(&row).unwrap();
        assert_eq!(record.id, AssetId(1));
        assert_eq!(record.slug, "bitcoin");
        assert_eq!(record.fields.get("quotes.USD.price"), Some(&json!(6500.5)));
        assert_eq!(record.fields.get("rank"), Some(&json!(1)));
        assert!(!record.fields.contains_key("website_slug"));
        assert!(!record.fields.contains_key("quotes"));
    }

    #[test]
    fn test_from_json_row_keeps_source_column_order() {
        let row = json!({
            "id": 1,
            "name": "Bitcoin",
            "symbol": "BTC",
            "website_slug": "bitcoin",
            "rank": 1,
            "quotes": {"USD": {"price": 6500.5, "volume_24h": 1.0e9}},
            "last_updated": 1525137271
        });

        let record = AssetRecord::from_json_row(&row).unwrap();
        let cols: Vec<_> = record.fields.keys().map(String::as_str).collect();
        assert_eq!(
            cols,
            vec!["rank", "quotes.USD.price", "quotes.USD.volume_24h", "last_updated"]
        );
    }

    #[test]
    fn test_from_json_row_prefers_canonical_slug() {
        let row = json!({
            "id": 7, "name": "X", "symbol": "X",
            "website_slug": "old-x", "slug": "x", "rank": 7
        });
        let record = AssetRecord::from_json_row(&row).unwrap();
        assert_eq!(record.slug, "x");
        let cols: Vec<_> = record.fields.keys().map(String::as_str).collect();
        assert_eq!(cols, vec!["rank"]);
    }

    #[test]
    fn test_from_json_row_accepts_string_id() {
        let row = json!({"id": "42", "name": "X", "symbol": "X", "slug": "x"});
        let record = AssetRecord::from_json_row(&row).unwrap();
        assert_eq!(record.id, AssetId(42));
    }

    #[test]
    fn test_from_json_row_missing_id() {
        let row = json!({"name": "X", "symbol": "X", "slug": "x"});
        let err = AssetRecord::from_json_row(&row).unwrap_err();
        assert!(matches!(err, CoreError::MissingField { field: "id", .. }));
    }

    #[test]
    fn test_from_json_row_rejects_negative_id() {
        let row = json!({"id": -3, "name": "X", "symbol": "X", "slug": "x"});
        assert!(matches!(
            AssetRecord::from_json_row(&row),
            Err(CoreError::InvalidAssetId(_))
        ));
    }

    #[test]
    fn test_overlay_skips_nulls() {
        let mut base = AssetRecord::new(AssetId(1), "Bitcoin", "BTC", "bitcoin")
            .with_field("rank", json!(1))
            .with_field("price", json!(100.0));
        let patch = AssetRecord::new(AssetId(1), "Bitcoin", "BTC", "bitcoin")
            .with_field("price", Value::Null)
            .with_field("volume", json!(5));

        base.overlay(&patch, true);

        assert_eq!(base.fields.get("price"), Some(&json!(100.0)));
        assert_eq!(base.fields.get("volume"), Some(&json!(5)));
        assert_eq!(base.fields.get("rank"), Some(&json!(1)));
    }

    #[test]
    fn test_columns_key_columns_first() {
        let record = AssetRecord::new(AssetId(1), "a", "b", "c").with_field("rank", json!(3));
        let cols: Vec<_> = record.columns().collect();
        assert_eq!(cols, vec!["id", "name", "symbol", "slug", "rank"]);
    }
}
