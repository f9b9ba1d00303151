//! Dict projections of entity instances.
//!
//! The canonical dict form walks fields in declared order with snake_case
//! keys; tables project as lists of mappings keyed `snake_case(heading)`.
//! Incoming dicts may use camel or snake keys, and the top level may be
//! wrapped under a `command` key, mirroring the XML root.

use serde_json::{Map, Value};

use crate::{
    core::{FieldState, FieldValue, Instance, Table},
    descriptor::{Descriptor, FieldDescriptor, FieldKind, ScalarKind},
    error::EntityError,
    utils::to_camel,
};

/// Project an instance into its dict form. Absent fields are omitted,
/// explicit nils become `null`.
pub fn to_map(instance: &Instance) -> Map<String, Value> {
    let mut map = Map::new();

    for (field, state) in instance
        .descriptor()
        .fields
        .iter()
        .zip(instance.states())
    {
        match state {
            FieldState::Absent => {}
            FieldState::Nil => {
                map.insert(field.name.to_owned(), Value::Null);
            }
            FieldState::Value(value) => {
                map.insert(field.name.to_owned(), value_to_json(value));
            }
        }
    }

    map
}

fn value_to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Int(i) => Value::Number((*i).into()),
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Composite(instance) => Value::Object(to_map(instance)),
        FieldValue::Repeated(items) => Value::Array(items.iter().map(value_to_json).collect()),
        FieldValue::Table(table) => {
            Value::Array(table.records().into_iter().map(Value::Object).collect())
        }
    }
}

/// Rebuild an instance from its dict form. Unknown keys are skipped.
pub fn from_map(
    descriptor: &'static Descriptor,
    map: &Map<String, Value>,
) -> Result<Instance, EntityError> {
    convert(descriptor, unwrap_command(map), false)
}

/// Like [`from_map`], but unknown top-level keys fail with
/// [`EntityError::UnknownField`]. Nested composites stay lenient.
pub fn from_map_strict(
    descriptor: &'static Descriptor,
    map: &Map<String, Value>,
) -> Result<Instance, EntityError> {
    convert(descriptor, unwrap_command(map), true)
}

fn unwrap_command(map: &Map<String, Value>) -> &Map<String, Value> {
    match map.get("command") {
        Some(Value::Object(inner)) => inner,
        _ => map,
    }
}

fn convert(
    descriptor: &'static Descriptor,
    map: &Map<String, Value>,
    strict: bool,
) -> Result<Instance, EntityError> {
    let mut instance = Instance::new(descriptor);

    for (key, value) in map {
        match descriptor.field_by_any(key) {
            Some((idx, field)) => instance.set_at(idx, json_to_state(field, value)?),
            None if strict => {
                return Err(EntityError::UnknownField {
                    tag: descriptor.tag.to_owned(),
                    field: key.clone(),
                });
            }
            None => {}
        }
    }

    Ok(instance)
}

fn json_to_state(field: &FieldDescriptor, value: &Value) -> Result<FieldState, EntityError> {
    if value.is_null() {
        return Ok(FieldState::Nil);
    }
    json_to_value(&field.kind, field.name, value).map(FieldState::Value)
}

fn json_to_value(
    kind: &FieldKind,
    field: &str,
    value: &Value,
) -> Result<FieldValue, EntityError> {
    match kind {
        FieldKind::Scalar(ScalarKind::String) => match value {
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Text(n.to_string())),
            Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
            other => Err(EntityError::invalid(field, unexpected(other, "a string"))),
        },
        FieldKind::Scalar(ScalarKind::Int) => match value {
            Value::Number(n) => n
                .as_i64()
                .map(FieldValue::Int)
                .ok_or_else(|| EntityError::invalid(field, format!("`{n}` is not an integer"))),
            Value::String(s) => s
                .parse()
                .map(FieldValue::Int)
                .map_err(|_| EntityError::invalid(field, format!("`{s}` is not an integer"))),
            other => Err(EntityError::invalid(field, unexpected(other, "an integer"))),
        },
        FieldKind::Scalar(ScalarKind::Bool) => match value {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(FieldValue::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(FieldValue::Bool(false)),
            other => Err(EntityError::invalid(field, unexpected(other, "a boolean"))),
        },
        FieldKind::Composite(descriptor) => match value {
            Value::Object(map) => {
                convert(descriptor(), map, false).map(FieldValue::Composite)
            }
            other => Err(EntityError::invalid(field, unexpected(other, "an object"))),
        },
        FieldKind::Repeated(inner) => {
            // A bare value stands for a single-element list.
            let items: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                single => vec![single],
            };
            items
                .into_iter()
                .map(|item| json_to_value(inner, field, item))
                .collect::<Result<_, _>>()
                .map(FieldValue::Repeated)
        }
        FieldKind::Table => match value {
            Value::Array(records) => table_from_records(field, records).map(FieldValue::Table),
            other => Err(EntityError::invalid(field, unexpected(other, "a record list"))),
        },
    }
}

fn unexpected(value: &Value, wanted: &str) -> String {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    format!("expected {wanted}, found {found}")
}

fn table_from_records(field: &str, records: &[Value]) -> Result<Table, EntityError> {
    let mut table = Table::default();

    let Some(first) = records.first() else {
        return Ok(table);
    };
    let first = first
        .as_object()
        .ok_or_else(|| EntityError::invalid(field, "table records must be objects"))?;
    let keys: Vec<&String> = first.keys().collect();
    table.col_heading = keys.iter().map(|key| to_camel(key)).collect();

    for record in records {
        let record = record
            .as_object()
            .ok_or_else(|| EntityError::invalid(field, "table records must be objects"))?;
        table.rows.push(
            keys.iter()
                .map(|key| record.get(*key).map(cell_text).unwrap_or_default())
                .collect(),
        );
    }

    Ok(table)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
