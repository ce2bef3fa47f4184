//! Prop Merger: hydrate a registered value from persisted data.
//!
//! The target defines which fields exist at every depth; the source only
//! supplies values. Source fields the target does not declare are dropped,
//! and target fields the source does not mention keep their current value.

use serde_json::{Map, Value};
use stash_types::{FieldPath, ValueKind};
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};

/// Merge `source` into `target`.
///
/// On error `target` is left exactly as it was.
pub fn merge(target: &mut Value, source: &Value) -> SchemaResult<()> {
    merge_at(target, source, &FieldPath::root())
}

/// Merge `source` into `target`, reporting paths under `base`.
pub fn merge_at(target: &mut Value, source: &Value, base: &FieldPath) -> SchemaResult<()> {
    let mut scratch = target.clone();
    let mut path = base.clone();
    merge_value(&mut scratch, source, &mut path)?;
    *target = scratch;
    Ok(())
}

fn merge_value(target: &mut Value, source: &Value, path: &mut FieldPath) -> SchemaResult<()> {
    if let (Value::Object(fields), Value::Object(incoming)) = (&mut *target, source) {
        return merge_fields(fields, incoming, path);
    }

    let expected = ValueKind::of(target);
    let found = ValueKind::of(source);
    match (expected, found) {
        // An object in the schema keeps its shape when persisted data has
        // nothing for it.
        (ValueKind::Object, ValueKind::Null) => Ok(()),
        (ValueKind::Null, _) | (_, ValueKind::Null) => {
            *target = source.clone();
            Ok(())
        }
        _ if expected == found => {
            *target = source.clone();
            Ok(())
        }
        _ => Err(SchemaError::TypeMismatch {
            path: path.clone(),
            expected,
            found,
        }),
    }
}

fn merge_fields(
    target: &mut Map<String, Value>,
    source: &Map<String, Value>,
    path: &mut FieldPath,
) -> SchemaResult<()> {
    for (name, incoming) in source {
        let Some(current) = target.get_mut(name) else {
            debug!(path = %path.child(name.as_str()), "dropping field not declared by schema");
            continue;
        };
        path.push(name.as_str());
        let result = merge_value(current, incoming, path);
        path.pop();
        result?;
    }
    Ok(())
}
