//! Checks an extraction reply against the field schema.
//!
//! After validation every registry field sits in exactly one of
//! `found_fields` / `missing_fields`, and no name outside the registry survives.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::extraction::result::{ExtractionResult, FoundFields, MissingFields};
use crate::extraction::ExtractionError;
use crate::schema::FieldSchema;

/// What to do when the service names categories or fields outside the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DriftPolicy {
    /// Drop unknown names with a warning and keep going.
    #[default]
    Reconcile,
    /// Fail the extraction with `ExtractionError::SchemaDrift`.
    Reject,
}

impl FromStr for DriftPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reconcile" => Ok(DriftPolicy::Reconcile),
            "reject" => Ok(DriftPolicy::Reject),
            other => Err(format!(
                "SCHEMA_DRIFT_POLICY must be 'reconcile' or 'reject', got '{other}'"
            )),
        }
    }
}

impl fmt::Display for DriftPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriftPolicy::Reconcile => f.write_str("reconcile"),
            DriftPolicy::Reject => f.write_str("reject"),
        }
    }
}

/// Names in `result` that the registry does not know, as `Category` or `Category / Field`.
pub fn unknown_names(result: &ExtractionResult, schema: &FieldSchema) -> Vec<String> {
    let mut unknown = Vec::new();
    for (category, fields) in &result.found_fields {
        collect_unknown(schema, category, fields.keys(), &mut unknown);
    }
    for (category, fields) in result.missing_fields.iter() {
        collect_unknown(schema, category, fields.iter(), &mut unknown);
    }

    unknown.sort();
    unknown.dedup();
    unknown
}

fn collect_unknown<'a>(
    schema: &FieldSchema,
    category: &str,
    fields: impl Iterator<Item = &'a String>,
    unknown: &mut Vec<String>,
) {
    if !schema.has_category(category) {
        unknown.push(category.to_string());
        return;
    }
    for field in fields {
        if !schema.contains(category, field) {
            unknown.push(format!("{category} / {field}"));
        }
    }
}

/// Validates `result` against `schema` under `policy`.
///
/// Reconciliation rules:
/// 1. unknown categories and fields are dropped
/// 2. blank found values count as missing
/// 3. a field both found and missing stays found
/// 4. registry fields named nowhere are appended to missing, in registry order
pub fn validate(
    result: ExtractionResult,
    schema: &FieldSchema,
    policy: DriftPolicy,
) -> Result<ExtractionResult, ExtractionError> {
    let unknown = unknown_names(&result, schema);
    if !unknown.is_empty() {
        match policy {
            DriftPolicy::Reject => return Err(ExtractionError::SchemaDrift(unknown)),
            DriftPolicy::Reconcile => {
                warn!(
                    "Dropping {} name(s) outside the field schema: {}",
                    unknown.len(),
                    unknown.join(", ")
                );
            }
        }
    }

    let mut found = FoundFields::new();
    for (category, fields) in result.found_fields {
        for (field, value) in fields {
            if schema.contains(&category, &field) && !value.trim().is_empty() {
                found
                    .entry(category.clone())
                    .or_default()
                    .insert(field, value);
            }
        }
    }

    let is_found = |category: &str, field: &str| {
        found
            .get(category)
            .is_some_and(|fields| fields.contains_key(field))
    };

    let mut missing = MissingFields::new();
    for (category, fields) in result.missing_fields.iter() {
        if !schema.has_category(category) {
            continue;
        }
        missing.ensure_category(category);
        for field in fields {
            if schema.contains(category, field) && !is_found(category, field) {
                missing.push(category, field);
            }
        }
    }

    let mut unlisted = 0;
    for category in schema.categories() {
        for field in category.fields {
            if !is_found(category.name, field) && !missing.contains(category.name, field) {
                missing.push(category.name, field);
                unlisted += 1;
            }
        }
    }
    if unlisted > 0 {
        debug!("{unlisted} field(s) absent from both maps were marked missing");
    }

    Ok(ExtractionResult {
        found_fields: found,
        missing_fields: missing,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn parse(reply: &str) -> ExtractionResult {
        ExtractionResult::from_reply(reply).unwrap()
    }

    /// Every registry field appears in exactly one of the two maps.
    fn assert_partition(result: &ExtractionResult, schema: &FieldSchema) {
        for category in schema.categories() {
            let found: BTreeSet<&str> = result
                .found_fields
                .get(category.name)
                .map(|f| f.keys().map(String::as_str).collect())
                .unwrap_or_default();
            let missing: BTreeSet<&str> = result
                .missing_fields
                .get(category.name)
                .map(|f| f.iter().map(String::as_str).collect())
                .unwrap_or_default();

            assert!(found.is_disjoint(&missing), "{} overlaps", category.name);
            let union: BTreeSet<&str> = found.union(&missing).copied().collect();
            let expected: BTreeSet<&str> = category.fields.iter().copied().collect();
            assert_eq!(union, expected, "{} is incomplete", category.name);
        }
    }

    #[test]
    fn test_policy_parses_case_insensitively() {
        assert_eq!("Reject".parse::<DriftPolicy>().unwrap(), DriftPolicy::Reject);
        assert_eq!(" reconcile ".parse::<DriftPolicy>().unwrap(), DriftPolicy::Reconcile);
        assert!("coerce".parse::<DriftPolicy>().is_err());
    }

    #[test]
    fn test_partial_reply_is_completed() {
        let schema = FieldSchema::recruiting();
        let result = validate(
            parse(r#"{"found_fields": {"Position Details": {"Engagement Type": "Full-time"}}, "missing_fields": {"Customer Details": ["Customer", "Hiring Manager"]}}"#),
            &schema,
            DriftPolicy::Reconcile,
        )
        .unwrap();

        assert_partition(&result, &schema);
        assert_eq!(result.found_count(), 1);
        assert_eq!(result.missing_fields.field_count(), schema.field_count() - 1);
        // reply order first, then registry order for the rest
        let order: Vec<_> = result.missing_fields.iter().map(|(c, _)| c).collect();
        assert_eq!(order[0], "Customer Details");
        assert_eq!(order[1], "Position Details");
    }

    #[test]
    fn test_field_in_both_maps_stays_found() {
        let schema = FieldSchema::recruiting();
        let result = validate(
            parse(r#"{"found_fields": {"Customer Details": {"Customer": "Acme"}}, "missing_fields": {"Customer Details": ["Customer", "Hiring Manager"]}}"#),
            &schema,
            DriftPolicy::Reconcile,
        )
        .unwrap();

        assert_partition(&result, &schema);
        assert!(!result.missing_fields.contains("Customer Details", "Customer"));
        assert_eq!(result.found_value("Customer Details", "Customer"), Some("Acme"));
    }

    #[test]
    fn test_blank_value_moves_to_missing() {
        let schema = FieldSchema::recruiting();
        let result = validate(
            parse(r#"{"found_fields": {"Customer Details": {"Customer": "  "}}, "missing_fields": {}}"#),
            &schema,
            DriftPolicy::Reconcile,
        )
        .unwrap();

        assert_partition(&result, &schema);
        assert!(result.missing_fields.contains("Customer Details", "Customer"));
    }

    #[test]
    fn test_unknown_names_are_dropped_when_reconciling() {
        let schema = FieldSchema::recruiting();
        let result = validate(
            parse(r#"{"found_fields": {"Perks": {"Gym": "yes"}, "Customer Details": {"Budget": "1M", "Customer": "Acme"}}, "missing_fields": {"Perks": ["Snacks"], "Other Details": ["Pets"]}}"#),
            &schema,
            DriftPolicy::Reconcile,
        )
        .unwrap();

        assert_partition(&result, &schema);
        assert!(!result.found_fields.contains_key("Perks"));
        assert!(result.missing_fields.get("Perks").is_none());
        assert!(!result.missing_fields.contains("Other Details", "Pets"));
        assert_eq!(result.found_value("Customer Details", "Customer"), Some("Acme"));
    }

    #[test]
    fn test_unknown_names_fail_when_rejecting() {
        let schema = FieldSchema::recruiting();
        let err = validate(
            parse(r#"{"found_fields": {"Customer Details": {"Budget": "1M"}}, "missing_fields": {"Perks": ["Snacks"]}}"#),
            &schema,
            DriftPolicy::Reject,
        )
        .unwrap_err();

        match err {
            ExtractionError::SchemaDrift(names) => {
                assert_eq!(names, vec!["Customer Details / Budget", "Perks"]);
            }
            other => panic!("expected SchemaDrift, got {other:?}"),
        }
    }

    #[test]
    fn test_reject_still_completes_known_reply() {
        let schema = FieldSchema::recruiting();
        let result = validate(
            parse(r#"{"found_fields": {}, "missing_fields": {}}"#),
            &schema,
            DriftPolicy::Reject,
        )
        .unwrap();

        assert_partition(&result, &schema);
        assert_eq!(result.missing_fields.field_count(), schema.field_count());
    }

    #[test]
    fn test_null_categories_are_completed_from_registry() {
        let schema = FieldSchema::recruiting();
        let result = validate(
            parse(r#"{"found_fields": {"Customer Details": null, "Position Details": {"Engagement Type": "Full-time"}}, "missing_fields": {"Customer Details": null, "Technical Skills": []}}"#),
            &schema,
            DriftPolicy::Reject,
        )
        .unwrap();

        assert_partition(&result, &schema);
        assert!(result.missing_fields.contains("Customer Details", "Customer"));
        assert!(result.missing_fields.contains("Technical Skills", "Good to Have"));
    }

    #[test]
    fn test_validation_is_stable() {
        let schema = FieldSchema::recruiting();
        let once = validate(
            parse(r#"{"found_fields": {"Other Details": {"Notice Period": "30 days"}}, "missing_fields": {"Business Unit": ["Team Size"]}}"#),
            &schema,
            DriftPolicy::Reconcile,
        )
        .unwrap();
        let twice = validate(once.clone(), &schema, DriftPolicy::Reconcile).unwrap();
        assert_eq!(once, twice);
    }
}
