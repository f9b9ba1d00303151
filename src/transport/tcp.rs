//! Blocking TCP transport, optionally TLS-wrapped.

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace};
use rustls::pki_types::ServerName;
use rustls::{ClientConnection, StreamOwned};

use crate::error::OcipError;
use crate::transport::{find_terminator, scan_resume, Transport};

/// A rustls client configuration trusting the bundled web roots, shared by
/// the sync and async TCP transports.
pub(crate) fn tls_config() -> Arc<rustls::ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

#[derive(Debug)]
enum Stream {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Blocking socket transport carrying `BroadsoftDocument` frames.
#[derive(Debug)]
pub struct TcpTransport {
    host: String,
    port: u16,
    tls: bool,
    timeout: Duration,
    session_id: String,
    stream: Option<Stream>,
}

impl TcpTransport {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls: bool,
        timeout: Duration,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls,
            timeout,
            session_id: session_id.into(),
            stream: None,
        }
    }

    fn socket_init(&self, source: io::Error) -> OcipError {
        OcipError::SocketInit {
            host: self.host.clone(),
            port: self.port,
            source,
        }
    }

}

fn map_io(error: io::Error, timeout: Duration) -> OcipError {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => OcipError::Timeout(timeout),
        _ => OcipError::SendFailed(error),
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<(), OcipError> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.socket_init(e))?
            .next()
            .ok_or_else(|| {
                self.socket_init(io::Error::new(
                    io::ErrorKind::NotFound,
                    "host resolved to no addresses",
                ))
            })?;

        let stream =
            TcpStream::connect_timeout(&addr, self.timeout).map_err(|e| self.socket_init(e))?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| self.socket_init(e))?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| self.socket_init(e))?;

        self.stream = Some(if self.tls {
            let name = ServerName::try_from(self.host.clone())
                .map_err(|e| self.socket_init(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
            let connection = ClientConnection::new(tls_config(), name)
                .map_err(|e| self.socket_init(io::Error::other(e)))?;
            Stream::Tls(Box::new(StreamOwned::new(connection, stream)))
        } else {
            Stream::Plain(stream)
        });

        info!(
            "connected to {}:{} (tls={})",
            self.host, self.port, self.tls
        );
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<Vec<u8>, OcipError> {
        let timeout = self.timeout;
        let stream = self.stream.as_mut().ok_or_else(|| {
            OcipError::SendFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is not connected",
            ))
        })?;

        stream
            .write_all(frame)
            .map_err(|error| map_io(error, timeout))?;
        trace!("sent frame of {} bytes", frame.len());

        let mut buf = Vec::with_capacity(4096);
        let mut chunk = [0u8; 4096];
        let mut from = 0;

        loop {
            let n = match stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(OcipError::SendFailed(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed before message terminator",
                    )))
                }
                Ok(n) => n,
                Err(error) => return Err(map_io(error, timeout)),
            };

            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = find_terminator(&buf, from) {
                buf.truncate(end);
                trace!("received frame of {} bytes", buf.len());
                return Ok(buf);
            }
            from = scan_resume(buf.len());
        }
    }

    fn close(&mut self) -> Result<(), OcipError> {
        if let Some(stream) = self.stream.take() {
            let socket = match &stream {
                Stream::Plain(socket) => socket,
                Stream::Tls(tls) => tls.get_ref(),
            };
            let _ = socket.shutdown(std::net::Shutdown::Both);
            debug!("closed connection to {}:{}", self.host, self.port);
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

impl Drop for TcpTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
