//! Core value model: dynamic entity instances, field states, and tables.
//!
//! The wire distinguishes three field states: a field may be omitted, present
//! as an explicit nil, or carry a value. [`FieldState`] realises this
//! three-state model for the dynamic layer; [`Nillable`] is its typed-layer
//! counterpart for fields the schema marks nullable.

use serde_json::{Map, Value};

use crate::{
    descriptor::{Descriptor, EntityKind},
    error::EntityError,
    utils::to_snake,
};

/// Three-state typed field: omitted, explicit nil, or a value.
///
/// Plain optional fields use `Option<T>`; `Nillable` appears only where the
/// schema marks a field nullable.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Nillable<T> {
    #[default]
    Absent,
    Nil,
    Set(T),
}

impl<T> Nillable<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_set(self) -> Option<T> {
        match self {
            Self::Set(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Nillable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Absent,
        }
    }
}

/// State of one field slot in an [`Instance`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldState {
    /// Not present on the wire.
    Absent,
    /// Present as an explicit nil element.
    Nil,
    Value(FieldValue),
}

impl FieldState {
    pub fn value(&self) -> Option<&FieldValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// A populated field value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Composite(Instance),
    Repeated(Vec<FieldValue>),
    Table(Table),
}

impl FieldValue {
    /// Variant name, used in mismatch diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Composite(_) => "composite",
            Self::Repeated(_) => "repeated",
            Self::Table(_) => "table",
        }
    }
}

/// Tabular payload: column headings plus rows of cells.
///
/// Appears wherever a field's wire name contains `Table`. Semantically a
/// sequence of records keyed by the headings.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    pub col_heading: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<H, R, C>(headings: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            col_heading: headings.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, heading: &str) -> Option<usize> {
        self.col_heading.iter().position(|h| h == heading)
    }

    /// Project the rows as mappings keyed by `snake_case(heading)`, in row
    /// order. Short rows leave their trailing columns out.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.col_heading
                    .iter()
                    .zip(row.iter())
                    .map(|(heading, cell)| (to_snake(heading), Value::String(cell.clone())))
                    .collect()
            })
            .collect()
    }
}

/// A dynamic entity value: a descriptor handle plus one [`FieldState`] per
/// declared field, in declared order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instance {
    descriptor: &'static Descriptor,
    fields: Vec<FieldState>,
}

impl Instance {
    /// An instance with every field absent.
    pub fn new(descriptor: &'static Descriptor) -> Self {
        Self {
            fields: vec![FieldState::Absent; descriptor.fields.len()],
            descriptor,
        }
    }

    /// Build from one state per declared field.
    pub fn from_states(descriptor: &'static Descriptor, fields: Vec<FieldState>) -> Self {
        debug_assert_eq!(descriptor.fields.len(), fields.len());
        Self { descriptor, fields }
    }

    pub fn descriptor(&self) -> &'static Descriptor {
        self.descriptor
    }

    pub fn tag(&self) -> &'static str {
        self.descriptor.tag
    }

    pub fn kind(&self) -> EntityKind {
        self.descriptor.kind
    }

    pub fn states(&self) -> &[FieldState] {
        &self.fields
    }

    pub fn into_states(self) -> Vec<FieldState> {
        self.fields
    }

    /// State of a field, by internal name.
    pub fn state(&self, name: &str) -> Option<&FieldState> {
        let (idx, _) = self.descriptor.field(name)?;
        self.fields.get(idx)
    }

    /// Value of a field, by internal name. Absent and nil fields yield `None`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.state(name).and_then(FieldState::value)
    }

    /// Set a field by internal name.
    pub fn set(&mut self, name: &str, state: FieldState) -> Result<(), EntityError> {
        let (idx, _) = self
            .descriptor
            .field(name)
            .ok_or_else(|| EntityError::UnknownField {
                tag: self.descriptor.tag.to_owned(),
                field: name.to_owned(),
            })?;
        self.fields[idx] = state;
        Ok(())
    }

    /// Set a field slot by declared position.
    pub fn set_at(&mut self, idx: usize, state: FieldState) {
        self.fields[idx] = state;
    }

    pub fn state_at(&self, idx: usize) -> &FieldState {
        &self.fields[idx]
    }

    pub fn state_at_mut(&mut self, idx: usize) -> &mut FieldState {
        &mut self.fields[idx]
    }

    /// Fail unless this instance carries the expected tag.
    pub fn check_tag(&self, expected: &str) -> Result<(), EntityError> {
        if self.descriptor.tag == expected {
            Ok(())
        } else {
            Err(EntityError::TagMismatch {
                expected: expected.to_owned(),
                found: self.descriptor.tag.to_owned(),
            })
        }
    }
}
