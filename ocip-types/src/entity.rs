//! Typed entities and their bridge to the dynamic [`Instance`] layer.
//!
//! Catalog entities are plain structs declared through the [`entity!`] macro,
//! which emits the struct, its static [`Descriptor`](crate::descriptor::Descriptor),
//! and the positional conversions in both directions. The full command catalog
//! is repetitive schema data; generating it as `entity!` invocations keeps it
//! data-shaped.

use crate::{
    core::{FieldState, FieldValue, Instance, Nillable, Table},
    descriptor::Descriptor,
    error::EntityError,
};

/// A typed request, response, or composite with a fixed field schema.
pub trait OciEntity: Sized {
    fn descriptor() -> &'static Descriptor;

    /// Project into the dynamic layer, one state per declared field.
    fn to_instance(&self) -> Instance;

    /// Rebuild from the dynamic layer. Fails when the instance carries a
    /// different tag or a field value of the wrong shape.
    fn from_instance(instance: Instance) -> Result<Self, EntityError>;

    fn tag() -> &'static str {
        Self::descriptor().tag
    }
}

/// Conversion helpers used by `entity!`-generated code.
#[doc(hidden)]
pub mod field {
    use super::*;

    fn text_of(value: FieldValue, field: &str) -> Result<String, EntityError> {
        match value {
            FieldValue::Text(s) => Ok(s),
            FieldValue::Int(i) => Ok(i.to_string()),
            FieldValue::Bool(b) => Ok(if b { "true" } else { "false" }.to_owned()),
            other => Err(EntityError::mismatch(field, "text", other.kind_name())),
        }
    }

    fn int_of(value: FieldValue, field: &str) -> Result<i64, EntityError> {
        match value {
            FieldValue::Int(i) => Ok(i),
            FieldValue::Text(s) => s
                .parse()
                .map_err(|_| EntityError::invalid(field, format!("`{s}` is not an integer"))),
            other => Err(EntityError::mismatch(field, "int", other.kind_name())),
        }
    }

    fn bool_of(value: FieldValue, field: &str) -> Result<bool, EntityError> {
        match value {
            FieldValue::Bool(b) => Ok(b),
            FieldValue::Text(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            FieldValue::Text(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            FieldValue::Text(s) => {
                Err(EntityError::invalid(field, format!("`{s}` is not a boolean")))
            }
            other => Err(EntityError::mismatch(field, "bool", other.kind_name())),
        }
    }

    // ---- instance -> typed ----------------------------------------------

    pub fn unpack_text(state: FieldState, field: &str) -> Result<Option<String>, EntityError> {
        match state {
            FieldState::Absent | FieldState::Nil => Ok(None),
            FieldState::Value(value) => text_of(value, field).map(Some),
        }
    }

    pub fn unpack_int(state: FieldState, field: &str) -> Result<Option<i64>, EntityError> {
        match state {
            FieldState::Absent | FieldState::Nil => Ok(None),
            FieldState::Value(value) => int_of(value, field).map(Some),
        }
    }

    pub fn unpack_bool(state: FieldState, field: &str) -> Result<Option<bool>, EntityError> {
        match state {
            FieldState::Absent | FieldState::Nil => Ok(None),
            FieldState::Value(value) => bool_of(value, field).map(Some),
        }
    }

    pub fn unpack_text_nil(state: FieldState, field: &str) -> Result<Nillable<String>, EntityError> {
        match state {
            FieldState::Absent => Ok(Nillable::Absent),
            FieldState::Nil => Ok(Nillable::Nil),
            FieldState::Value(value) => text_of(value, field).map(Nillable::Set),
        }
    }

    pub fn unpack_int_nil(state: FieldState, field: &str) -> Result<Nillable<i64>, EntityError> {
        match state {
            FieldState::Absent => Ok(Nillable::Absent),
            FieldState::Nil => Ok(Nillable::Nil),
            FieldState::Value(value) => int_of(value, field).map(Nillable::Set),
        }
    }

    pub fn unpack_bool_nil(state: FieldState, field: &str) -> Result<Nillable<bool>, EntityError> {
        match state {
            FieldState::Absent => Ok(Nillable::Absent),
            FieldState::Nil => Ok(Nillable::Nil),
            FieldState::Value(value) => bool_of(value, field).map(Nillable::Set),
        }
    }

    pub fn unpack_table(state: FieldState, field: &str) -> Result<Option<Table>, EntityError> {
        match state {
            FieldState::Absent | FieldState::Nil => Ok(None),
            FieldState::Value(FieldValue::Table(table)) => Ok(Some(table)),
            FieldState::Value(other) => {
                Err(EntityError::mismatch(field, "table", other.kind_name()))
            }
        }
    }

    pub fn unpack_composite<T: OciEntity>(
        state: FieldState,
        field: &str,
    ) -> Result<Option<T>, EntityError> {
        match state {
            FieldState::Absent | FieldState::Nil => Ok(None),
            FieldState::Value(FieldValue::Composite(instance)) => {
                T::from_instance(instance).map(Some)
            }
            FieldState::Value(other) => {
                Err(EntityError::mismatch(field, "composite", other.kind_name()))
            }
        }
    }

    pub fn unpack_repeated_text(
        state: FieldState,
        field: &str,
    ) -> Result<Option<Vec<String>>, EntityError> {
        match state {
            FieldState::Absent | FieldState::Nil => Ok(None),
            FieldState::Value(FieldValue::Repeated(items)) => items
                .into_iter()
                .map(|item| text_of(item, field))
                .collect::<Result<_, _>>()
                .map(Some),
            // A lone occurrence decodes as a single value; accept it.
            FieldState::Value(value) => text_of(value, field).map(|s| Some(vec![s])),
        }
    }

    pub fn unpack_repeated_composite<T: OciEntity>(
        state: FieldState,
        field: &str,
    ) -> Result<Option<Vec<T>>, EntityError> {
        match state {
            FieldState::Absent | FieldState::Nil => Ok(None),
            FieldState::Value(FieldValue::Repeated(items)) => items
                .into_iter()
                .map(|item| match item {
                    FieldValue::Composite(instance) => T::from_instance(instance),
                    other => Err(EntityError::mismatch(field, "composite", other.kind_name())),
                })
                .collect::<Result<_, _>>()
                .map(Some),
            FieldState::Value(FieldValue::Composite(instance)) => {
                T::from_instance(instance).map(|entity| Some(vec![entity]))
            }
            FieldState::Value(other) => {
                Err(EntityError::mismatch(field, "composite", other.kind_name()))
            }
        }
    }

    // ---- typed -> instance ----------------------------------------------

    pub fn pack_text(value: &Option<String>) -> FieldState {
        match value {
            Some(s) => FieldState::Value(FieldValue::Text(s.clone())),
            None => FieldState::Absent,
        }
    }

    pub fn pack_int(value: &Option<i64>) -> FieldState {
        match value {
            Some(i) => FieldState::Value(FieldValue::Int(*i)),
            None => FieldState::Absent,
        }
    }

    pub fn pack_bool(value: &Option<bool>) -> FieldState {
        match value {
            Some(b) => FieldState::Value(FieldValue::Bool(*b)),
            None => FieldState::Absent,
        }
    }

    pub fn pack_text_nil(value: &Nillable<String>) -> FieldState {
        match value {
            Nillable::Absent => FieldState::Absent,
            Nillable::Nil => FieldState::Nil,
            Nillable::Set(s) => FieldState::Value(FieldValue::Text(s.clone())),
        }
    }

    pub fn pack_int_nil(value: &Nillable<i64>) -> FieldState {
        match value {
            Nillable::Absent => FieldState::Absent,
            Nillable::Nil => FieldState::Nil,
            Nillable::Set(i) => FieldState::Value(FieldValue::Int(*i)),
        }
    }

    pub fn pack_bool_nil(value: &Nillable<bool>) -> FieldState {
        match value {
            Nillable::Absent => FieldState::Absent,
            Nillable::Nil => FieldState::Nil,
            Nillable::Set(b) => FieldState::Value(FieldValue::Bool(*b)),
        }
    }

    pub fn pack_table(value: &Option<Table>) -> FieldState {
        match value {
            Some(table) => FieldState::Value(FieldValue::Table(table.clone())),
            None => FieldState::Absent,
        }
    }

    pub fn pack_composite<T: OciEntity>(value: &Option<T>) -> FieldState {
        match value {
            Some(entity) => FieldState::Value(FieldValue::Composite(entity.to_instance())),
            None => FieldState::Absent,
        }
    }

    pub fn pack_repeated_text(value: &Option<Vec<String>>) -> FieldState {
        match value {
            Some(items) => FieldState::Value(FieldValue::Repeated(
                items.iter().map(|s| FieldValue::Text(s.clone())).collect(),
            )),
            None => FieldState::Absent,
        }
    }

    pub fn pack_repeated_composite<T: OciEntity>(value: &Option<Vec<T>>) -> FieldState {
        match value {
            Some(items) => FieldState::Value(FieldValue::Repeated(
                items
                    .iter()
                    .map(|entity| FieldValue::Composite(entity.to_instance()))
                    .collect(),
            )),
            None => FieldState::Absent,
        }
    }
}

/// Declare a catalog entity: the struct, its descriptor, and its
/// [`OciEntity`] impl.
///
/// ```
/// ocip_types::entity! {
///     /// A device attachment point.
///     pub struct AccessDeviceEndpoint: Type, "AccessDeviceEndpoint" {
///         line_port, "linePort": scalar(String), required;
///         contact, "contact": scalar(String), optional;
///     }
/// }
/// ```
///
/// Field kinds: `scalar(String|Int|Bool)`, `composite(T)`,
/// `repeated(scalar(String))`, `repeated(composite(T))`, `table`.
/// Dispositions: `required`, `optional`, or `nullable` (three-state
/// [`Nillable`] field).
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ekind:ident, $tag:literal {
            $(
                $(#[$fmeta:meta])*
                $fname:ident, $wire:literal: $fkind:ident $(($($kargs:tt)*))?, $disp:ident;
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, Eq, PartialEq)]
        pub struct $name {
            $(
                $(#[$fmeta])*
                pub $fname: $crate::entity!(@ty $fkind ($($($kargs)*)?) $disp),
            )*
        }

        impl $crate::entity::OciEntity for $name {
            fn descriptor() -> &'static $crate::descriptor::Descriptor {
                static FIELDS: &[$crate::descriptor::FieldDescriptor] = &[
                    $(
                        $crate::descriptor::FieldDescriptor {
                            name: stringify!($fname),
                            wire: $wire,
                            kind: $crate::entity!(@kind $fkind ($($($kargs)*)?)),
                            required: $crate::entity!(@required $disp),
                            nullable: $crate::entity!(@nullable $disp),
                        },
                    )*
                ];
                static DESCRIPTOR: $crate::descriptor::Descriptor = $crate::descriptor::Descriptor {
                    tag: $tag,
                    kind: $crate::descriptor::EntityKind::$ekind,
                    fields: FIELDS,
                };
                &DESCRIPTOR
            }

            fn to_instance(&self) -> $crate::core::Instance {
                $crate::core::Instance::from_states(
                    <Self as $crate::entity::OciEntity>::descriptor(),
                    vec![
                        $($crate::entity!(@pack $fkind ($($($kargs)*)?) $disp, &self.$fname),)*
                    ],
                )
            }

            fn from_instance(
                instance: $crate::core::Instance,
            ) -> Result<Self, $crate::error::EntityError> {
                instance.check_tag($tag)?;
                #[allow(unused_mut, unused_variables)]
                let mut states = instance.into_states().into_iter();
                Ok(Self {
                    $(
                        $fname: $crate::entity!(
                            @unpack $fkind ($($($kargs)*)?) $disp,
                            states.next().unwrap_or($crate::core::FieldState::Absent),
                            stringify!($fname)
                        ),
                    )*
                })
            }
        }
    };

    // ---- field types ----------------------------------------------------

    (@ty scalar (String) nullable) => { $crate::core::Nillable<String> };
    (@ty scalar (Int) nullable) => { $crate::core::Nillable<i64> };
    (@ty scalar (Bool) nullable) => { $crate::core::Nillable<bool> };
    (@ty scalar (String) $disp:ident) => { Option<String> };
    (@ty scalar (Int) $disp:ident) => { Option<i64> };
    (@ty scalar (Bool) $disp:ident) => { Option<bool> };
    (@ty composite ($t:ty) $disp:ident) => { Option<$t> };
    (@ty repeated (scalar (String)) $disp:ident) => { Option<Vec<String>> };
    (@ty repeated (composite ($t:ty)) $disp:ident) => { Option<Vec<$t>> };
    (@ty table () $disp:ident) => { Option<$crate::core::Table> };

    // ---- descriptor kinds -----------------------------------------------

    (@kind scalar (String)) => {
        $crate::descriptor::FieldKind::Scalar($crate::descriptor::ScalarKind::String)
    };
    (@kind scalar (Int)) => {
        $crate::descriptor::FieldKind::Scalar($crate::descriptor::ScalarKind::Int)
    };
    (@kind scalar (Bool)) => {
        $crate::descriptor::FieldKind::Scalar($crate::descriptor::ScalarKind::Bool)
    };
    (@kind composite ($t:ty)) => {
        $crate::descriptor::FieldKind::Composite(
            <$t as $crate::entity::OciEntity>::descriptor,
        )
    };
    (@kind repeated ($($inner:tt)+)) => {{
        static INNER: $crate::descriptor::FieldKind = $crate::entity!(@kind $($inner)+);
        $crate::descriptor::FieldKind::Repeated(&INNER)
    }};
    (@kind table ()) => { $crate::descriptor::FieldKind::Table };

    // ---- flags ----------------------------------------------------------

    (@required required) => { true };
    (@required $disp:ident) => { false };
    (@nullable nullable) => { true };
    (@nullable $disp:ident) => { false };

    // ---- typed -> state --------------------------------------------------

    (@pack scalar (String) nullable, $v:expr) => { $crate::entity::field::pack_text_nil($v) };
    (@pack scalar (Int) nullable, $v:expr) => { $crate::entity::field::pack_int_nil($v) };
    (@pack scalar (Bool) nullable, $v:expr) => { $crate::entity::field::pack_bool_nil($v) };
    (@pack scalar (String) $disp:ident, $v:expr) => { $crate::entity::field::pack_text($v) };
    (@pack scalar (Int) $disp:ident, $v:expr) => { $crate::entity::field::pack_int($v) };
    (@pack scalar (Bool) $disp:ident, $v:expr) => { $crate::entity::field::pack_bool($v) };
    (@pack composite ($t:ty) $disp:ident, $v:expr) => {
        $crate::entity::field::pack_composite($v)
    };
    (@pack repeated (scalar (String)) $disp:ident, $v:expr) => {
        $crate::entity::field::pack_repeated_text($v)
    };
    (@pack repeated (composite ($t:ty)) $disp:ident, $v:expr) => {
        $crate::entity::field::pack_repeated_composite($v)
    };
    (@pack table () $disp:ident, $v:expr) => { $crate::entity::field::pack_table($v) };

    // ---- state -> typed --------------------------------------------------

    (@unpack scalar (String) nullable, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_text_nil($state, $field)?
    };
    (@unpack scalar (Int) nullable, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_int_nil($state, $field)?
    };
    (@unpack scalar (Bool) nullable, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_bool_nil($state, $field)?
    };
    (@unpack scalar (String) $disp:ident, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_text($state, $field)?
    };
    (@unpack scalar (Int) $disp:ident, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_int($state, $field)?
    };
    (@unpack scalar (Bool) $disp:ident, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_bool($state, $field)?
    };
    (@unpack composite ($t:ty) $disp:ident, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_composite::<$t>($state, $field)?
    };
    (@unpack repeated (scalar (String)) $disp:ident, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_repeated_text($state, $field)?
    };
    (@unpack repeated (composite ($t:ty)) $disp:ident, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_repeated_composite::<$t>($state, $field)?
    };
    (@unpack table () $disp:ident, $state:expr, $field:expr) => {
        $crate::entity::field::unpack_table($state, $field)?
    };
}
