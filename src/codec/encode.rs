//! Entity → XML serialisation.
//!
//! Encoding is descriptor-driven: fields are emitted in declared order,
//! absent fields are skipped, and explicit nils become empty elements with an
//! xsi-namespaced `nil` attribute. The output is the bare `command` element;
//! transports wrap it into the session envelope.

use ocip_types::{FieldState, FieldValue, Instance, OciEntity, Table};
use quick_xml::escape::escape;

/// The XML Schema instance namespace carrying the `type` and `nil`
/// attributes.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Encode a typed entity into its `command` element.
pub fn encode<T: OciEntity>(entity: &T) -> String {
    encode_command(&entity.to_instance())
}

/// Encode a dynamic instance into its `command` element.
pub fn encode_command(instance: &Instance) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("<command xmlns=\"\" xmlns:C=\"");
    out.push_str(XSI_NS);
    out.push_str("\" C:type=\"");
    out.push_str(&escape(instance.tag()));
    out.push_str("\">");
    encode_fields(&mut out, instance);
    out.push_str("</command>");

    out
}

fn encode_fields(out: &mut String, instance: &Instance) {
    for (field, state) in instance.descriptor().fields.iter().zip(instance.states()) {
        match state {
            FieldState::Absent => {}
            FieldState::Nil => {
                out.push('<');
                out.push_str(field.wire);
                out.push_str(" C:nil=\"true\"/>");
            }
            FieldState::Value(value) => encode_value(out, field.wire, value),
        }
    }
}

fn encode_value(out: &mut String, wire: &str, value: &FieldValue) {
    match value {
        FieldValue::Text(text) => element(out, wire, text),
        FieldValue::Int(i) => element(out, wire, &i.to_string()),
        FieldValue::Bool(b) => element(out, wire, if *b { "true" } else { "false" }),
        FieldValue::Composite(instance) => {
            open(out, wire);
            encode_fields(out, instance);
            close(out, wire);
        }
        FieldValue::Repeated(items) => {
            for item in items {
                encode_value(out, wire, item);
            }
        }
        FieldValue::Table(table) => encode_table(out, wire, table),
    }
}

fn encode_table(out: &mut String, wire: &str, table: &Table) {
    open(out, wire);
    for heading in &table.col_heading {
        element(out, "colHeading", heading);
    }
    for row in &table.rows {
        open(out, "row");
        for cell in row {
            element(out, "col", cell);
        }
        close(out, "row");
    }
    close(out, wire);
}

fn open(out: &mut String, name: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
}

fn close(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn element(out: &mut String, name: &str, text: &str) {
    if text.is_empty() {
        out.push('<');
        out.push_str(name);
        out.push_str("/>");
    } else {
        open(out, name);
        out.push_str(&escape(text));
        close(out, name);
    }
}

#[cfg(test)]
mod tests {
    use ocip_types::commands::{
        AuthenticationRequest, ConsolidatedServicePackAssignment,
        GroupCallCenterGetInstanceResponse22, ReplacementConsolidatedServicePackAssignmentList,
        UserConsolidatedModifyRequest22, UserGetRegistrationListResponse,
    };
    use ocip_types::{Nillable, Table};

    use super::*;

    #[test]
    fn test_consolidated_modify_sample() {
        let request = UserConsolidatedModifyRequest22 {
            user_id: Some("Test".into()),
            service_pack_list: Some(ReplacementConsolidatedServicePackAssignmentList {
                service_pack: Some(vec![
                    ConsolidatedServicePackAssignment {
                        service_pack_name: Some("ServicePack".into()),
                        authorized_quantity: Some(1),
                    },
                    ConsolidatedServicePackAssignment {
                        service_pack_name: Some("ServicePack2".into()),
                        authorized_quantity: Some(1),
                    },
                ]),
            }),
        };

        let expected = concat!(
            "<command xmlns=\"\" xmlns:C=\"http://www.w3.org/2001/XMLSchema-instance\" ",
            "C:type=\"UserConsolidatedModifyRequest22\">",
            "<userId>Test</userId>",
            "<servicePackList>",
            "<servicePack><servicePackName>ServicePack</servicePackName>",
            "<authorizedQuantity>1</authorizedQuantity></servicePack>",
            "<servicePack><servicePackName>ServicePack2</servicePackName>",
            "<authorizedQuantity>1</authorizedQuantity></servicePack>",
            "</servicePackList>",
            "</command>",
        );

        assert_eq!(expected, encode(&request));
    }

    #[test]
    fn test_absent_fields_are_skipped() {
        let request = AuthenticationRequest { user_id: None };

        assert_eq!(
            concat!(
                "<command xmlns=\"\" xmlns:C=\"http://www.w3.org/2001/XMLSchema-instance\" ",
                "C:type=\"AuthenticationRequest\"></command>",
            ),
            encode(&request)
        );
    }

    #[test]
    fn test_booleans_lowercase_and_nil_marker() {
        let response = GroupCallCenterGetInstanceResponse22 {
            enable_video: Some(false),
            queue_length: Some(10),
            escape_digit: Nillable::Nil,
            ..Default::default()
        };

        let got = encode(&response);
        assert!(got.contains("<enableVideo>false</enableVideo>"));
        assert!(got.contains("<queueLength>10</queueLength>"));
        assert!(got.contains("<escapeDigit C:nil=\"true\"/>"));
    }

    #[test]
    fn test_empty_string_encodes_as_empty_element() {
        let request = AuthenticationRequest {
            user_id: Some(String::new()),
        };

        assert!(encode(&request).contains("<userId/>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let request = AuthenticationRequest {
            user_id: Some("a<b&c".into()),
        };

        assert!(encode(&request).contains("<userId>a&lt;b&amp;c</userId>"));
    }

    #[test]
    fn test_table_wire_form() {
        let response = UserGetRegistrationListResponse {
            registration_table: Some(Table::new(
                ["deviceName", "endpointType"],
                [["DeskPhone", "Primary"]],
            )),
        };

        let got = encode(&response);
        assert!(got.contains(concat!(
            "<registrationTable>",
            "<colHeading>deviceName</colHeading><colHeading>endpointType</colHeading>",
            "<row><col>DeskPhone</col><col>Primary</col></row>",
            "</registrationTable>",
        )));
    }
}
