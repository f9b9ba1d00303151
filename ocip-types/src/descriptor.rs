//! Entity descriptors.
//!
//! Every wire message is a `command` element whose xsi-namespaced `type`
//! attribute names a concrete entity. A [`Descriptor`] is the static schema of
//! one such entity: its wire tag, its kind, and its ordered field list. Field
//! order is significant on the wire; encoders emit declared order while
//! decoders accept any order.
//!
//! Descriptors are `'static` data produced by the `entity!` macro (the full
//! catalog would be generated the same way) and shared freely through the
//! [`Registry`](crate::registry::Registry).

use crate::utils::to_snake;

/// The role an entity plays in the protocol.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EntityKind {
    /// Sent by the client; carries input fields.
    Request,
    /// Carries a populated payload.
    DataResponse,
    /// Empty acknowledgement.
    SuccessResponse,
    /// Carries `summary`, `summaryEnglish`, `detail`, `errorCode`.
    ErrorResponse,
    /// Composite reusable in multiple requests/responses.
    Type,
}

/// Scalar field representation on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScalarKind {
    String,
    Int,
    Bool,
}

/// The shape of a single field.
#[derive(Debug, Eq, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// Nested composite. The descriptor is reached through a function pointer
    /// so entities may reference each other from `'static` data.
    Composite(fn() -> &'static Descriptor),
    /// One child element per item, all under the same wire name.
    Repeated(&'static FieldKind),
    /// Column headings followed by rows of cells.
    Table,
}

/// Per-field schema metadata.
#[derive(Debug, Eq, PartialEq)]
pub struct FieldDescriptor {
    /// Internal (snake_case) name.
    pub name: &'static str,
    /// Wire (camelCase) element name.
    pub wire: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub nullable: bool,
}

/// Static schema of one entity.
#[derive(Debug, Eq, PartialEq)]
pub struct Descriptor {
    /// Wire type tag, i.e. the value of the xsi `type` attribute.
    pub tag: &'static str,
    pub kind: EntityKind,
    /// Fields in wire order.
    pub fields: &'static [FieldDescriptor],
}

impl Descriptor {
    /// Look up a field by its internal name.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDescriptor)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Look up a field by its wire name.
    pub fn field_by_wire(&self, wire: &str) -> Option<(usize, &FieldDescriptor)> {
        self.fields.iter().enumerate().find(|(_, f)| f.wire == wire)
    }

    /// Look up a field by either naming convention. Dict inputs may use camel
    /// or snake keys interchangeably.
    pub fn field_by_any(&self, key: &str) -> Option<(usize, &FieldDescriptor)> {
        self.field(key)
            .or_else(|| self.field_by_wire(key))
            .or_else(|| self.field(&to_snake(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIELDS: &[FieldDescriptor] = &[
        FieldDescriptor {
            name: "user_id",
            wire: "userId",
            kind: FieldKind::Scalar(ScalarKind::String),
            required: true,
            nullable: false,
        },
        FieldDescriptor {
            name: "device_order",
            wire: "deviceOrder",
            kind: FieldKind::Scalar(ScalarKind::Int),
            required: false,
            nullable: false,
        },
    ];

    static DESCRIPTOR: Descriptor = Descriptor {
        tag: "TestRequest",
        kind: EntityKind::Request,
        fields: FIELDS,
    };

    #[test]
    fn test_field_lookup() {
        let tests = [
            ("user_id", Some(0)),
            ("userId", Some(0)),
            ("deviceOrder", Some(1)),
            ("device_order", Some(1)),
            ("missing", None),
        ];

        for (key, expected) in tests {
            let got = DESCRIPTOR.field_by_any(key).map(|(idx, _)| idx);
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_field_by_wire_is_exact() {
        assert!(DESCRIPTOR.field_by_wire("user_id").is_none());
        assert!(DESCRIPTOR.field_by_wire("userId").is_some());
    }
}
