//! Schema projection between flat storage records and domain types.
//!
//! [`record_to_domain`] is a narrowing projection, not a full deserializer:
//! record fields whose name appears in the domain type's declared field set
//! are copied (or mapped through a registered special cast); everything else
//! is dropped leniently and logged at debug severity, so schema drift is
//! observable without breaking callers.

use mercata_types::{Record, StorageMapped};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Errors raised by the projection utility.
///
/// Repositories map these onto the access error contract with their entity
/// context attached.
#[derive(Debug, thiserror::Error)]
#[error("projection failed: {0}")]
pub struct ProjectionError(String);

type CastFn = Box<dyn Fn(&Value) -> Value + Send + Sync>;

struct CastRule {
    source: String,
    target: String,
    apply: CastFn,
}

/// Per-field transformation rules applied during record-to-domain mapping.
///
/// A rule maps a source record field onto a (possibly different) destination
/// field name, transforming the value on the way. Fields without a rule copy
/// verbatim.
#[derive(Default)]
pub struct SpecialCasts {
    rules: Vec<CastRule>,
}

impl SpecialCasts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename a source field without transforming its value.
    #[must_use]
    pub fn rename(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.map(source, target, Value::clone)
    }

    /// Map a source field onto a destination field through a value function.
    #[must_use]
    pub fn map(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        apply: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(CastRule {
            source: source.into(),
            target: target.into(),
            apply: Box::new(apply),
        });
        self
    }

    fn rule_for(&self, source: &str) -> Option<&CastRule> {
        self.rules.iter().find(|rule| rule.source == source)
    }
}

/// Project a storage record onto a domain type.
///
/// Each record field whose (possibly cast-mapped) name appears in
/// `T::FIELDS` is copied; undeclared fields are dropped and logged at debug
/// severity. No type validation or enum coercion is performed beyond the
/// final deserialization.
pub fn record_to_domain<T>(record: &Record, casts: &SpecialCasts) -> Result<T, ProjectionError>
where
    T: StorageMapped + DeserializeOwned,
{
    let mut projected = Record::new();
    for (name, value) in record {
        let (target, mapped) = match casts.rule_for(name) {
            Some(rule) => (rule.target.clone(), (rule.apply)(value)),
            None => (name.clone(), value.clone()),
        };
        if T::FIELDS.contains(&target.as_str()) {
            projected.insert(target, mapped);
        } else {
            tracing::debug!(field = %name, "record field not declared on domain type, dropped");
        }
    }
    serde_json::from_value(Value::Object(projected)).map_err(|e| ProjectionError(e.to_string()))
}

/// Project a domain value onto a flat storage record.
///
/// Every declared field is copied except those named in `skip`. No cast hook
/// exists in this direction; enum unwrapping is the caller's responsibility.
pub fn domain_to_record<T>(value: &T, skip: &[&str]) -> Result<Record, ProjectionError>
where
    T: StorageMapped + Serialize,
{
    let serialized = serde_json::to_value(value).map_err(|e| ProjectionError(e.to_string()))?;
    let Value::Object(mut record) = serialized else {
        return Err(ProjectionError("domain value did not serialize to an object".to_string()));
    };
    for field in skip {
        record.remove(*field);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mercata_types::SupplierBusiness;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn business() -> SupplierBusiness {
        SupplierBusiness::builder()
            .id(Uuid::new_v4())
            .account_id(Uuid::new_v4())
            .name("Fresh Farm Produce")
            .region("EU-WEST")
            .contact_email("orders@freshfarm.example")
            .active(true)
            .created_at(Utc::now())
            .build()
    }

    #[test]
    fn test_round_trip_reproduces_declared_fields() {
        let original = business();
        let record = domain_to_record(&original, &[]).unwrap();
        let restored: SupplierBusiness = record_to_domain(&record, &SpecialCasts::new()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_undeclared_fields_are_dropped() {
        let mut record = domain_to_record(&business(), &[]).unwrap();
        record.insert("legacy_column".to_string(), json!("stale"));
        let restored: SupplierBusiness = record_to_domain(&record, &SpecialCasts::new()).unwrap();
        let reserialized = domain_to_record(&restored, &[]).unwrap();
        assert!(!reserialized.contains_key("legacy_column"));
    }

    #[test]
    fn test_rename_cast_maps_field_name() {
        let original = business();
        let mut record = domain_to_record(&original, &["region"]).unwrap();
        record.insert("region_code".to_string(), json!(original.region));
        let casts = SpecialCasts::new().rename("region_code", "region");
        let restored: SupplierBusiness = record_to_domain(&record, &casts).unwrap();
        assert_eq!(restored.region, original.region);
    }

    #[test]
    fn test_value_cast_transforms() {
        let original = business();
        let mut record = domain_to_record(&original, &["name"]).unwrap();
        record.insert("name".to_string(), json!("  Fresh Farm Produce  "));
        let casts = SpecialCasts::new().map("name", "name", |value| {
            json!(value.as_str().map(str::trim).unwrap_or_default())
        });
        let restored: SupplierBusiness = record_to_domain(&record, &casts).unwrap();
        assert_eq!(restored.name, "Fresh Farm Produce");
    }

    #[test]
    fn test_skip_omits_fields() {
        let record = domain_to_record(&business(), &["phone", "created_at"]).unwrap();
        assert!(!record.contains_key("phone"));
        assert!(!record.contains_key("created_at"));
        assert!(record.contains_key("name"));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let mut record = domain_to_record(&business(), &[]).unwrap();
        record.remove("contact_email");
        let result: Result<SupplierBusiness, _> = record_to_domain(&record, &SpecialCasts::new());
        assert!(result.is_err());
    }
}
