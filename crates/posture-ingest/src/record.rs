//! Untyped raw rows
//!
//! [`RawRecord`] is what a file reader hands over: column name → cell value,
//! exactly as extracted. [`RowView`] resolves canonical fields against a row
//! through the synonym table and coerces cells to text.

use crate::headers::{normalize_header, CanonicalField, SynonymTable};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Cell texts treated as "no value"
const MISSING_MARKERS: &[&str] = &["", "nan", "n/a", "null", "-"];

/// One untyped source row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, Value>);

impl RawRecord {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a cell (builder form)
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a cell
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    /// Raw cell by exact column name
    #[inline]
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Iterate `(column, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no cells
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRecord
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Coerce a cell to trimmed text; missing markers and nulls become `None`
#[must_use]
pub fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            // Spreadsheet exports turn integers into 3.0
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        },
    };
    let lowered = text.to_lowercase();
    (!MISSING_MARKERS.contains(&lowered.as_str())).then_some(text)
}

/// A raw row with headers resolved through a synonym table
#[derive(Debug)]
pub struct RowView<'a> {
    cells: BTreeMap<String, &'a Value>,
    synonyms: &'a SynonymTable,
}

impl<'a> RowView<'a> {
    /// Index a record's headers
    ///
    /// When two raw columns normalize to the same header the first one in
    /// column order wins.
    #[must_use]
    pub fn new(record: &'a RawRecord, synonyms: &'a SynonymTable) -> Self {
        let mut cells = BTreeMap::new();
        for (column, value) in record.iter() {
            cells.entry(normalize_header(column)).or_insert(value);
        }
        Self { cells, synonyms }
    }

    /// Text of the first non-missing cell matching any alias of `field`
    ///
    /// Aliases are tried in table priority order.
    #[must_use]
    pub fn text(&self, field: CanonicalField) -> Option<String> {
        self.synonyms
            .aliases(field)
            .iter()
            .filter_map(|alias| self.cells.get(alias.as_str()))
            .find_map(|value| cell_text(value))
    }

    /// Whether any alias of `field` is present as a column, even if empty
    #[must_use]
    pub fn has_column(&self, field: CanonicalField) -> bool {
        self.synonyms
            .aliases(field)
            .iter()
            .any(|alias| self.cells.contains_key(alias.as_str()))
    }
}
