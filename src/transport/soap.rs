//! Blocking SOAP-over-HTTP transport.
//!
//! The same `BroadsoftDocument` the raw socket carries is posted inside a
//! `processOCIMessage` SOAP envelope; the reply document comes back escaped
//! in `processOCIMessageReturn`. No terminator rules apply, a complete HTTP
//! response is a complete reply.

use std::io;
use std::time::Duration;

use log::{debug, info};
use quick_xml::events::Event;
use quick_xml::reader::NsReader;

use crate::error::OcipError;
use crate::transport::{latin1_bytes, latin1_string, Transport};

pub(crate) fn soap_endpoint(host: &str, port: u16, tls: bool) -> String {
    let scheme = if tls { "https" } else { "http" };
    format!("{scheme}://{host}:{port}/webservice/services/ProvisioningService")
}

pub(crate) fn soap_envelope(document: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <soapenv:Body>\
         <processOCIMessage xmlns=\"urn:com:broadsoft:webservice\">\
         <arg0>{}</arg0>\
         </processOCIMessage>\
         </soapenv:Body>\
         </soapenv:Envelope>",
        quick_xml::escape::escape(document)
    )
}

/// Pull the reply document out of the SOAP response body.
pub(crate) fn extract_soap_return(body: &str) -> Result<String, OcipError> {
    let mut reader = NsReader::from_str(body);

    loop {
        match reader
            .read_event()
            .map_err(|e| OcipError::MalformedWire(e.to_string()))?
        {
            Event::Start(start) => {
                if start.local_name().as_ref().ends_with(b"Return") {
                    return element_text(&mut reader);
                }
            }
            Event::Eof => {
                return Err(OcipError::MalformedWire(
                    "SOAP response carries no return element".into(),
                ))
            }
            _ => {}
        }
    }
}

fn element_text(reader: &mut NsReader<&[u8]>) -> Result<String, OcipError> {
    let mut out = String::new();
    loop {
        match reader
            .read_event()
            .map_err(|e| OcipError::MalformedWire(e.to_string()))?
        {
            Event::Text(text) => out.push_str(
                &text
                    .unescape()
                    .map_err(|e| OcipError::MalformedWire(e.to_string()))?,
            ),
            Event::CData(data) => out.push_str(&String::from_utf8_lossy(&data.into_inner())),
            Event::End(_) => return Ok(out),
            Event::Eof => {
                return Err(OcipError::MalformedWire(
                    "unexpected end of SOAP response".into(),
                ))
            }
            _ => {}
        }
    }
}

fn is_timeout(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(current) = source {
        if let Some(io_error) = current.downcast_ref::<io::Error>() {
            return matches!(
                io_error.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            );
        }
        source = current.source();
    }
    false
}

fn map_ureq(error: ureq::Error, timeout: Duration) -> OcipError {
    match error {
        ureq::Error::Status(code, _) => {
            OcipError::SendFailed(io::Error::other(format!("HTTP status {code}")))
        }
        ureq::Error::Transport(transport) => {
            if is_timeout(&transport) {
                OcipError::Timeout(timeout)
            } else {
                OcipError::SendFailed(io::Error::other(transport))
            }
        }
    }
}

/// Blocking HTTP transport posting SOAP-wrapped documents.
#[derive(Debug)]
pub struct SoapTransport {
    host: String,
    port: u16,
    tls: bool,
    timeout: Duration,
    user_agent: String,
    session_id: String,
    agent: Option<ureq::Agent>,
}

impl SoapTransport {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        timeout: Duration,
        user_agent: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            timeout,
            user_agent: user_agent.into(),
            session_id: session_id.into(),
            agent: None,
        }
    }
}

impl Transport for SoapTransport {
    fn connect(&mut self) -> Result<(), OcipError> {
        if self.host.is_empty() {
            return Err(OcipError::ClientInit("endpoint host is empty".into()));
        }

        self.agent = Some(
            ureq::AgentBuilder::new()
                .timeout(self.timeout)
                .user_agent(&self.user_agent)
                .build(),
        );
        info!(
            "initiated SOAP client for {}",
            soap_endpoint(&self.host, self.port, self.tls)
        );
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<Vec<u8>, OcipError> {
        let agent = self.agent.as_ref().ok_or_else(|| {
            OcipError::SendFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "SOAP client is not initialised",
            ))
        })?;

        let envelope = soap_envelope(&latin1_string(frame));
        let response = agent
            .post(&soap_endpoint(&self.host, self.port, self.tls))
            .set("Content-Type", "text/xml; charset=utf-8")
            .set("SOAPAction", "\"processOCIMessage\"")
            .send_string(&envelope)
            .map_err(|error| map_ureq(error, self.timeout))?;

        let body = response
            .into_string()
            .map_err(OcipError::SendFailed)?;
        let reply = extract_soap_return(&body)?;
        Ok(latin1_bytes(&reply))
    }

    fn close(&mut self) -> Result<(), OcipError> {
        if self.agent.take().is_some() {
            debug!("closed SOAP client for {}:{}", self.host, self.port);
        }
        Ok(())
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn is_secure(&self) -> bool {
        self.tls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_escapes_document() {
        let envelope = soap_envelope("<BroadsoftDocument protocol=\"OCI\"/>");
        assert!(envelope.contains("<arg0>&lt;BroadsoftDocument protocol=&quot;OCI&quot;/&gt;</arg0>"));
    }

    #[test]
    fn test_extract_soap_return() {
        let body = concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">",
            "<soapenv:Body>",
            "<processOCIMessageResponse xmlns=\"urn:com:broadsoft:webservice\">",
            "<processOCIMessageReturn>&lt;BroadsoftDocument&gt;&lt;command/&gt;",
            "&lt;/BroadsoftDocument&gt;</processOCIMessageReturn>",
            "</processOCIMessageResponse>",
            "</soapenv:Body>",
            "</soapenv:Envelope>",
        );

        let got = extract_soap_return(body).unwrap();
        assert_eq!("<BroadsoftDocument><command/></BroadsoftDocument>", got);
    }

    #[test]
    fn test_extract_missing_return_fails() {
        let body = "<Envelope><Body/></Envelope>";
        assert!(matches!(
            extract_soap_return(body),
            Err(OcipError::MalformedWire(_))
        ));
    }

    #[test]
    fn test_round_trips_through_envelope() {
        let frame = crate::transport::frame_document("sid", "<command xmlns=\"\"/>");
        let envelope = soap_envelope(&latin1_string(&frame));
        assert!(envelope.contains("soapenv:Envelope"));
    }

    #[test]
    fn test_send_before_connect_fails() {
        let mut transport = SoapTransport::new(
            "localhost",
            2209,
            true,
            Duration::from_secs(1),
            "Broadworks SDK",
            "sid",
        );
        assert!(matches!(
            transport.send(b"<frame/>"),
            Err(OcipError::SendFailed(_))
        ));
    }
}
