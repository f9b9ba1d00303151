//! Transports: framed I/O over a raw socket or SOAP-over-HTTP.
//!
//! All variants share one surface: `connect`, a framed `send` that returns
//! the complete reply, and an idempotent `close`. Raw TCP transports carry
//! the `BroadsoftDocument` envelope serialised in ISO-8859-1 and delimit
//! messages on the literal `</BroadsoftDocument>` terminator; SOAP transports
//! post the same document inside a SOAP envelope, where a complete HTTP
//! response is a complete reply.

use std::fmt;

use crate::codec::XSI_NS;

pub(crate) mod soap;
pub(crate) mod tcp;

pub use soap::SoapTransport;
pub use tcp::TcpTransport;

/// The message boundary on raw sockets. Matched literally; intermediate XML
/// structure is never interpreted.
pub const TERMINATOR: &[u8] = b"</BroadsoftDocument>";

/// A connection able to carry framed OCI documents.
///
/// A transport belongs to exactly one session, is not safe to share across
/// sessions, and carries at most one in-flight request at a time.
pub trait Transport: fmt::Debug + Send {
    fn connect(&mut self) -> Result<(), crate::error::OcipError>;

    /// Send a framed document and read the complete reply.
    fn send(&mut self, frame: &[u8]) -> Result<Vec<u8>, crate::error::OcipError>;

    /// Close the connection. Idempotent.
    fn close(&mut self) -> Result<(), crate::error::OcipError>;

    /// The opaque session identifier carried in every frame.
    fn session_id(&self) -> &str;

    /// Whether the transport is TLS-protected; decides the login variant.
    fn is_secure(&self) -> bool;

    /// Wrap a command body into the session envelope.
    fn frame(&self, body: &str) -> Vec<u8> {
        frame_document(self.session_id(), body)
    }
}

/// Build the on-wire envelope around one command body.
pub fn frame_document(session_id: &str, body: &str) -> Vec<u8> {
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
         <BroadsoftDocument protocol=\"OCI\" xmlns=\"C\" xmlns:xsi=\"{XSI_NS}\">\
         <sessionId xmlns=\"\">{}</sessionId>\
         {body}\
         </BroadsoftDocument>",
        quick_xml::escape::escape(session_id),
    );
    latin1_bytes(&document)
}

/// Serialise to ISO-8859-1. Code points above U+00FF have no Latin-1 form
/// and are written as numeric character references, which is valid wherever
/// text or attribute values appear.
pub fn latin1_bytes(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let code = c as u32;
        if code <= 0xFF {
            out.push(code as u8);
        } else {
            out.extend_from_slice(format!("&#{code};").as_bytes());
        }
    }
    out
}

/// Decode ISO-8859-1 bytes; every byte maps to the code point of the same
/// value.
pub fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Index one past the terminator, scanning from `from`. Callers resume the
/// scan a terminator-length overlap before the previously seen end.
pub(crate) fn find_terminator(buf: &[u8], from: usize) -> Option<usize> {
    let start = from.min(buf.len());
    buf[start..]
        .windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
        .map(|at| start + at + TERMINATOR.len())
}

/// Where to resume a terminator scan after `buf` grew.
pub(crate) fn scan_resume(len: usize) -> usize {
    len.saturating_sub(TERMINATOR.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_document_shape() {
        let frame = frame_document("8a1d6c2e", "<command xmlns=\"\"/>");
        let text = latin1_string(&frame);

        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));
        assert!(text.contains("<BroadsoftDocument protocol=\"OCI\" xmlns=\"C\""));
        assert!(text.contains("<sessionId xmlns=\"\">8a1d6c2e</sessionId>"));
        assert!(text.ends_with("</BroadsoftDocument>"));
    }

    #[test]
    fn test_latin1_round_trip() {
        let tests = [
            ("plain ascii", "plain ascii"),
            ("caf\u{e9}", "caf\u{e9}"),
            ("price \u{20ac}5", "price &#8364;5"),
        ];

        for (test, expected) in tests {
            let bytes = latin1_bytes(test);
            assert_eq!(expected, latin1_string(&bytes));
        }
    }

    #[test]
    fn test_find_terminator() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"<BroadsoftDocument><command/>");
        assert_eq!(None, find_terminator(&buf, 0));

        let resume = scan_resume(buf.len());
        buf.extend_from_slice(b"</Broadsoft");
        assert_eq!(None, find_terminator(&buf, resume));

        // Terminator completed across chunk boundaries.
        let resume = scan_resume(buf.len());
        buf.extend_from_slice(b"Document>trailing");
        let end = find_terminator(&buf, resume).unwrap();
        assert!(latin1_string(&buf[..end]).ends_with("</BroadsoftDocument>"));
    }

    #[test]
    fn test_session_id_is_escaped() {
        let frame = frame_document("a<b", "<command xmlns=\"\"/>");
        assert!(latin1_string(&frame).contains("<sessionId xmlns=\"\">a&lt;b</sessionId>"));
    }
}
