//! XML → entity decoding.
//!
//! Decoding walks the document with a namespace-aware reader so the `type`
//! and `nil` attributes are matched by their resolved namespace rather than a
//! literal prefix. The target descriptor comes from the caller or from the
//! reply's type attribute; children may arrive in any order, unknown children
//! are skipped, and missing children leave their fields absent.

use ocip_types::{
    Descriptor, EntityError, FieldDescriptor, FieldKind, FieldState, FieldValue, Instance,
    OciEntity, Registry, ScalarKind, Table,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::OcipError;

const XSI_NS: &[u8] = b"http://www.w3.org/2001/XMLSchema-instance";

/// Decode a reply document, selecting the descriptor through the reply's
/// type attribute. Accepts either a bare `command` element or a full
/// `BroadsoftDocument` envelope.
pub fn decode_reply(xml: &str, registry: &Registry) -> Result<Instance, OcipError> {
    decode_document(xml, Target::Registry(registry))
}

/// Decode against a caller-supplied descriptor, ignoring the type attribute.
pub fn decode_with(xml: &str, descriptor: &'static Descriptor) -> Result<Instance, OcipError> {
    decode_document(xml, Target::Descriptor(descriptor))
}

/// Decode straight into a typed entity.
pub fn decode_as<T: OciEntity>(xml: &str) -> Result<T, OcipError> {
    let instance = decode_with(xml, T::descriptor())?;
    T::from_instance(instance).map_err(OcipError::from)
}

enum Target<'r> {
    Registry(&'r Registry),
    Descriptor(&'static Descriptor),
}

fn malformed(error: impl std::fmt::Display) -> OcipError {
    OcipError::MalformedWire(error.to_string())
}

fn decode_document(xml: &str, target: Target<'_>) -> Result<Instance, OcipError> {
    let mut reader = NsReader::from_str(xml);

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"command" => {
                    let descriptor = resolve_target(&reader, &start, &target)?;
                    return decode_fields(&mut reader, descriptor);
                }
                // Descend into the envelope.
                b"BroadsoftDocument" => {}
                _ => {
                    reader.read_to_end(start.name()).map_err(malformed)?;
                }
            },
            Event::Empty(start) if start.local_name().as_ref() == b"command" => {
                let descriptor = resolve_target(&reader, &start, &target)?;
                return Ok(Instance::new(descriptor));
            }
            Event::Eof => return Err(malformed("document carries no command element")),
            _ => {}
        }
    }
}

fn resolve_target(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    target: &Target<'_>,
) -> Result<&'static Descriptor, OcipError> {
    match target {
        Target::Descriptor(descriptor) => Ok(descriptor),
        Target::Registry(registry) => {
            let tag = type_attribute(reader, start)?
                .ok_or_else(|| malformed("command element carries no type attribute"))?;
            registry
                .get(&tag)
                .ok_or(OcipError::UnknownCommand(tag))
        }
    }
}

/// The value of the xsi-namespaced `type` attribute, whatever its prefix.
fn type_attribute(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Option<String>, OcipError> {
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        if local.as_ref() == b"type" && is_xsi(&ns) {
            let value = attr.unescape_value().map_err(malformed)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn is_xsi(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(bound)) if *bound == XSI_NS)
}

fn nil_attribute(reader: &NsReader<&[u8]>, start: &BytesStart<'_>) -> Result<bool, OcipError> {
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        if local.as_ref() == b"nil" && is_xsi(&ns) {
            let value = attr.unescape_value().map_err(malformed)?;
            return Ok(value.eq_ignore_ascii_case("true"));
        }
    }
    Ok(false)
}

fn decode_fields(
    reader: &mut NsReader<&[u8]>,
    descriptor: &'static Descriptor,
) -> Result<Instance, OcipError> {
    let mut instance = Instance::new(descriptor);

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => {
                decode_child(reader, descriptor, &mut instance, &start, false)?;
            }
            Event::Empty(start) => {
                decode_child(reader, descriptor, &mut instance, &start, true)?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(malformed("unexpected end of document")),
            _ => {}
        }
    }

    Ok(instance)
}

fn decode_child(
    reader: &mut NsReader<&[u8]>,
    descriptor: &'static Descriptor,
    instance: &mut Instance,
    start: &BytesStart<'_>,
    empty: bool,
) -> Result<(), OcipError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let Some((idx, field)) = descriptor.field_by_wire(&name) else {
        // Unknown children are skipped, not rejected.
        if !empty {
            reader.read_to_end(start.name()).map_err(malformed)?;
        }
        return Ok(());
    };

    if nil_attribute(reader, start)? {
        if !empty {
            reader.read_to_end(start.name()).map_err(malformed)?;
        }
        instance.set_at(idx, FieldState::Nil);
        return Ok(());
    }

    match &field.kind {
        FieldKind::Repeated(inner) => {
            let item = decode_item(reader, inner, field, empty)?;
            match instance.state_at_mut(idx) {
                FieldState::Value(FieldValue::Repeated(items)) => items.push(item),
                slot => *slot = FieldState::Value(FieldValue::Repeated(vec![item])),
            }
        }
        kind => {
            let value = decode_item(reader, kind, field, empty)?;
            instance.set_at(idx, FieldState::Value(value));
        }
    }

    Ok(())
}

fn decode_item(
    reader: &mut NsReader<&[u8]>,
    kind: &FieldKind,
    field: &FieldDescriptor,
    empty: bool,
) -> Result<FieldValue, OcipError> {
    match kind {
        FieldKind::Scalar(scalar) => {
            let text = if empty {
                String::new()
            } else {
                read_text(reader)?
            };
            scalar_value(*scalar, field.name, text)
        }
        FieldKind::Composite(descriptor) => {
            if empty {
                Ok(FieldValue::Composite(Instance::new(descriptor())))
            } else {
                decode_fields(reader, descriptor()).map(FieldValue::Composite)
            }
        }
        FieldKind::Table => {
            if empty {
                Ok(FieldValue::Table(Table::default()))
            } else {
                decode_table(reader).map(FieldValue::Table)
            }
        }
        // Nested repetition has no wire form; the child element itself is
        // the repetition.
        FieldKind::Repeated(inner) => decode_item(reader, inner, field, empty),
    }
}

fn scalar_value(kind: ScalarKind, field: &str, text: String) -> Result<FieldValue, OcipError> {
    match kind {
        ScalarKind::String => Ok(FieldValue::Text(text)),
        ScalarKind::Int => text.trim().parse().map(FieldValue::Int).map_err(|_| {
            OcipError::Decode(EntityError::Invalid {
                field: field.to_owned(),
                message: format!("`{text}` is not an integer"),
            })
        }),
        ScalarKind::Bool => {
            let trimmed = text.trim();
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(FieldValue::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(FieldValue::Bool(false))
            } else {
                Err(OcipError::Decode(EntityError::Invalid {
                    field: field.to_owned(),
                    message: format!("`{text}` is not a boolean"),
                }))
            }
        }
    }
}

/// Text content up to the current element's end tag. Nested elements inside
/// scalar content are skipped.
fn read_text(reader: &mut NsReader<&[u8]>) -> Result<String, OcipError> {
    let mut out = String::new();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Text(text) => out.push_str(&text.unescape().map_err(malformed)?),
            Event::CData(data) => out.push_str(&String::from_utf8_lossy(&data.into_inner())),
            Event::Start(start) => {
                reader.read_to_end(start.name()).map_err(malformed)?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(malformed("unexpected end of document")),
            _ => {}
        }
    }

    Ok(out)
}

fn decode_table(reader: &mut NsReader<&[u8]>) -> Result<Table, OcipError> {
    let mut table = Table::default();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"colHeading" => table.col_heading.push(read_text(reader)?),
                b"row" => table.rows.push(decode_row(reader)?),
                _ => {
                    reader.read_to_end(start.name()).map_err(malformed)?;
                }
            },
            Event::Empty(start) => match start.local_name().as_ref() {
                b"colHeading" => table.col_heading.push(String::new()),
                b"row" => table.rows.push(Vec::new()),
                _ => {}
            },
            Event::End(_) => break,
            Event::Eof => return Err(malformed("unexpected end of document")),
            _ => {}
        }
    }

    Ok(table)
}

fn decode_row(reader: &mut NsReader<&[u8]>) -> Result<Vec<String>, OcipError> {
    let mut cells = Vec::new();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => {
                if start.local_name().as_ref() == b"col" {
                    cells.push(read_text(reader)?);
                } else {
                    reader.read_to_end(start.name()).map_err(malformed)?;
                }
            }
            Event::Empty(start) => {
                if start.local_name().as_ref() == b"col" {
                    cells.push(String::new());
                }
            }
            Event::End(_) => break,
            Event::Eof => return Err(malformed("unexpected end of document")),
            _ => {}
        }
    }

    Ok(cells)
}
