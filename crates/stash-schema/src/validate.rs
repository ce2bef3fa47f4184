//! Structural Validator: shape compatibility between two values.
//!
//! `validate(reference, candidate)` succeeds when both values have the same
//! shape at every depth:
//!
//! - `null` on either side is compatible with anything;
//! - values of different kinds are a mismatch;
//! - objects must have exactly the same field names, checked in both
//!   directions, and every shared field is validated recursively;
//! - arrays must have the same indices, checked in both directions, and
//!   every shared element is validated recursively;
//! - scalars of the same kind are compatible.
//!
//! The "no new properties" rule for individual field writes, and its
//! exemption for array appends, are enforced by the interception layer.

use serde_json::{Map, Value};
use stash_types::{FieldPath, ValueKind};

use crate::error::{SchemaError, SchemaResult};

/// Validate `candidate` against `reference`, reporting paths from the root.
pub fn validate(reference: &Value, candidate: &Value) -> SchemaResult<()> {
    validate_at(reference, candidate, &FieldPath::root())
}

/// Validate `candidate` against `reference`, reporting paths under `base`.
pub fn validate_at(reference: &Value, candidate: &Value, base: &FieldPath) -> SchemaResult<()> {
    let mut path = base.clone();
    check(reference, candidate, &mut path)
}

fn check(reference: &Value, candidate: &Value, path: &mut FieldPath) -> SchemaResult<()> {
    let expected = ValueKind::of(reference);
    let found = ValueKind::of(candidate);

    match (reference, candidate) {
        (Value::Null, _) | (_, Value::Null) => Ok(()),
        (Value::Object(reference), Value::Object(candidate)) => {
            check_fields(reference, candidate, path)
        }
        (Value::Array(reference), Value::Array(candidate)) => {
            check_items(reference, candidate, path)
        }
        _ if expected == found => Ok(()),
        _ => Err(SchemaError::SchemaMismatch {
            path: path.clone(),
            reason: format!("expected {expected}, found {found}"),
        }),
    }
}

fn check_fields(
    reference: &Map<String, Value>,
    candidate: &Map<String, Value>,
    path: &mut FieldPath,
) -> SchemaResult<()> {
    for (name, reference_value) in reference {
        let Some(candidate_value) = candidate.get(name) else {
            return Err(SchemaError::SchemaMismatch {
                path: path.child(name.as_str()),
                reason: "field is missing".into(),
            });
        };
        path.push(name.as_str());
        let result = check(reference_value, candidate_value, path);
        path.pop();
        result?;
    }

    if let Some(extra) = candidate.keys().find(|name| !reference.contains_key(*name)) {
        return Err(SchemaError::SchemaMismatch {
            path: path.child(extra.as_str()),
            reason: "field is not declared by the schema".into(),
        });
    }

    Ok(())
}

fn check_items(
    reference: &[Value],
    candidate: &[Value],
    path: &mut FieldPath,
) -> SchemaResult<()> {
    for (index, reference_value) in reference.iter().enumerate() {
        let Some(candidate_value) = candidate.get(index) else {
            return Err(SchemaError::SchemaMismatch {
                path: path.child(index.to_string()),
                reason: "element is missing".into(),
            });
        };
        path.push(index.to_string());
        let result = check(reference_value, candidate_value, path);
        path.pop();
        result?;
    }

    if candidate.len() > reference.len() {
        return Err(SchemaError::SchemaMismatch {
            path: path.child(reference.len().to_string()),
            reason: "element is not present in the schema".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn mismatch_path(result: SchemaResult<()>) -> String {
        match result {
            Err(SchemaError::SchemaMismatch { path, .. }) => path.to_string(),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn identical_shapes_pass() {
        let schema = json!({"name": "", "age": 0, "tags": [""], "nested": {"on": false}});
        let value = json!({"name": "ada", "age": 36, "tags": ["x"], "nested": {"on": true}});
        assert!(validate(&schema, &value).is_ok());
    }

    #[test]
    fn scalar_kind_change_is_rejected() {
        let result = validate(&json!(""), &json!(5));
        assert_eq!(mismatch_path(result), "<root>");
    }

    #[test]
    fn nested_kind_change_reports_path() {
        let schema = json!({"a": {"b": {"c": 1}}});
        let value = json!({"a": {"b": {"c": "one"}}});
        assert_eq!(mismatch_path(validate(&schema, &value)), "a.b.c");
    }

    #[test]
    fn missing_field_is_rejected() {
        let schema = json!({"a": 1, "b": 2});
        let value = json!({"a": 1});
        assert_eq!(mismatch_path(validate(&schema, &value)), "b");
    }

    #[test]
    fn extra_field_is_rejected() {
        let schema = json!({"a": 1});
        let value = json!({"a": 1, "z": 2});
        assert_eq!(mismatch_path(validate(&schema, &value)), "z");
    }

    #[test]
    fn extra_nested_field_is_rejected() {
        let schema = json!({"sub": {"a": 1}});
        let value = json!({"sub": {"a": 1, "b": 2}});
        assert_eq!(mismatch_path(validate(&schema, &value)), "sub.b");
    }

    #[test]
    fn null_is_compatible_with_anything() {
        assert!(validate(&json!(null), &json!({"a": 1})).is_ok());
        assert!(validate(&json!({"a": 1}), &json!(null)).is_ok());
        assert!(validate(&json!({"a": null}), &json!({"a": "text"})).is_ok());
    }

    #[test]
    fn arrays_with_matching_elements_pass() {
        assert!(validate(&json!([]), &json!([])).is_ok());
        assert!(validate(&json!([1, "a"]), &json!([2, "b"])).is_ok());
        assert!(validate(&json!([{"a": 1}]), &json!([{"a": 9}])).is_ok());
        assert!(validate(&json!([null, 1]), &json!([{"any": true}, 2])).is_ok());
    }

    #[test]
    fn missing_array_index_is_rejected() {
        let result = validate(&json!({"l": [1, 2]}), &json!({"l": []}));
        assert_eq!(mismatch_path(result), "l.0");
        let result = validate(&json!({"l": [1, 2]}), &json!({"l": [1]}));
        assert_eq!(mismatch_path(result), "l.1");
    }

    #[test]
    fn extra_array_index_is_rejected() {
        let result = validate(&json!({"l": [1]}), &json!({"l": [1, 2, 3]}));
        assert_eq!(mismatch_path(result), "l.1");
    }

    #[test]
    fn array_element_kind_change_is_rejected() {
        let result = validate(&json!({"l": ["a"]}), &json!({"l": [5]}));
        assert_eq!(mismatch_path(result), "l.0");
    }

    #[test]
    fn array_element_object_shapes_are_checked() {
        let result = validate(&json!({"l": [{"a": 1}]}), &json!({"l": [{"zzz": true}]}));
        assert_eq!(mismatch_path(result), "l.0.a");
        let result = validate(&json!({"l": [{"a": 1}]}), &json!({"l": [{"a": 1, "b": 2}]}));
        assert_eq!(mismatch_path(result), "l.0.b");
    }

    #[test]
    fn array_versus_object_is_rejected() {
        let result = validate(&json!({"list": []}), &json!({"list": {}}));
        assert_eq!(mismatch_path(result), "list");
    }

    #[test]
    fn base_path_prefixes_errors() {
        let base = FieldPath::parse("settings.theme").unwrap();
        let result = validate_at(&json!({"dark": false}), &json!({"dark": 1}), &base);
        assert_eq!(mismatch_path(result), "settings.theme.dark");
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                    .prop_map(|fields| Value::Object(fields.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn every_value_validates_against_itself(value in arb_json()) {
            prop_assert!(validate(&value, &value).is_ok());
        }

        #[test]
        fn validation_is_symmetric(a in arb_json(), b in arb_json()) {
            prop_assert_eq!(validate(&a, &b).is_ok(), validate(&b, &a).is_ok());
        }
    }
}
