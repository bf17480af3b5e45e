//! Document filter and update types.
//!
//! The document access layer never hands free-form query documents to a
//! driver: filters are lists of (path, value) equality conditions and updates
//! are one of a small set of structured operations. Drivers translate these
//! into their native query/update documents.

use serde_json::Value;

use crate::Record;

/// A structured equality filter over document fields.
///
/// A condition path of the form `array.field` matches a document whose
/// embedded array `array` contains at least one element with `field` equal to
/// the condition value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocFilter {
    conditions: Vec<(String, Value)>,
}

impl DocFilter {
    /// An empty filter, matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition, chainable.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((path.into(), value.into()));
        self
    }

    /// The conditions in insertion order.
    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether a document satisfies every condition of this filter.
    pub fn matches(&self, document: &Record) -> bool {
        self.conditions.iter().all(|(path, expected)| path_matches(document, path, expected))
    }
}

fn path_matches(document: &Record, path: &str, expected: &Value) -> bool {
    match path.split_once('.') {
        None => document.get(path) == Some(expected),
        Some((head, rest)) => match document.get(head) {
            Some(Value::Array(elements)) => elements.iter().any(|element| {
                element.as_object().is_some_and(|obj| path_matches(obj, rest, expected))
            }),
            Some(Value::Object(nested)) => path_matches(nested, rest, expected),
            _ => false,
        },
    }
}

/// A structured update document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocUpdate {
    /// Replace the named top-level fields with the given values.
    Set(Record),
    /// Prepend an element to the embedded array `array`.
    PushFront { array: String, element: Value },
    /// Update, in place, the fields of the array element whose
    /// `element_field` equals `element_id`.
    SetListElement { array: String, element_field: String, element_id: Value, changes: Record },
}

/// Counts reported by a document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Documents matched by the filter.
    pub matched: u64,
    /// Documents actually modified.
    pub modified: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::record_from_value;

    fn storefront_doc() -> Record {
        record_from_value(json!({
            "business_id": "b64-id",
            "slug": "fresh-farm",
            "published": true,
            "catalog": [
                {"sku": "TOM-1", "title": "Tomatoes", "price_cents": 250},
                {"sku": "CUC-1", "title": "Cucumbers", "price_cents": 180},
            ],
        }))
        .unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(DocFilter::new().matches(&storefront_doc()));
    }

    #[test]
    fn test_top_level_equality() {
        let filter = DocFilter::new().field("slug", "fresh-farm");
        assert!(filter.matches(&storefront_doc()));

        let miss = DocFilter::new().field("slug", "other");
        assert!(!miss.matches(&storefront_doc()));
    }

    #[test]
    fn test_conditions_are_conjunctive() {
        let filter = DocFilter::new().field("slug", "fresh-farm").field("published", false);
        assert!(!filter.matches(&storefront_doc()));
    }

    #[test]
    fn test_array_element_path() {
        let filter = DocFilter::new().field("catalog.sku", "CUC-1");
        assert!(filter.matches(&storefront_doc()));

        let miss = DocFilter::new().field("catalog.sku", "PEP-1");
        assert!(!miss.matches(&storefront_doc()));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let filter = DocFilter::new().field("owner", "nobody");
        assert!(!filter.matches(&storefront_doc()));

        let nested = DocFilter::new().field("slug.inner", "x");
        assert!(!nested.matches(&storefront_doc()));
    }
}
