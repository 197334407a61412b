//! Flat rows produced by the flattener and consumed by the writer.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A single cell of a flattened row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// The field was absent (or null) on the source object.
    Missing,
    Value(Value),
}

impl Cell {
    /// Reads `key` from a JSON object, mapping absent or null fields to `Missing`.
    pub fn from_field(source: &Value, key: &str) -> Self {
        source
            .as_object()
            .map_or(Cell::Missing, |object| Cell::from_map(object, key))
    }

    pub fn from_map(object: &Map<String, Value>, key: &str) -> Self {
        match object.get(key) {
            None | Some(Value::Null) => Cell::Missing,
            Some(value) => Cell::Value(value.clone()),
        }
    }

    /// Reads `parent.child`, e.g. `parentLink.href`. Other keys of `parent` are ignored.
    pub fn from_nested(source: &Value, parent: &str, child: &str) -> Self {
        source
            .get(parent)
            .map_or(Cell::Missing, |nested| Cell::from_field(nested, child))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Renders the cell as CSV text. Missing cells render empty.
    pub fn render(&self) -> String {
        match self {
            Cell::Missing | Cell::Value(Value::Null) => String::new(),
            Cell::Value(Value::String(s)) => s.clone(),
            Cell::Value(other) => other.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Value(Value::String(value))
    }
}

/// An ordered mapping of column name to cell.
///
/// Column order is insertion order; inserting an existing key replaces its
/// cell in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: IndexMap<String, Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, cell: impl Into<Cell>) {
        self.cells.insert(key.into(), cell.into());
    }

    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cells.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(key, cell)| (key.as_str(), cell))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_existing_key_keeps_position() {
        let mut row = Row::new();
        row.insert("a", "1");
        row.insert("b", "2");
        row.insert("a", Cell::Missing);

        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(row.get("a").is_some_and(Cell::is_missing));
        assert_eq!(row.len(), 2);
    }
}
