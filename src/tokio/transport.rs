//! Async TCP and SOAP transports.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::{debug, info, trace};
use rustls::pki_types::ServerName;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tokio_util::codec::Framed;

use crate::error::OcipError;
use crate::tokio::OciClientCodec;
use crate::transport::soap::{extract_soap_return, soap_endpoint, soap_envelope};
use crate::transport::tcp::tls_config;
use crate::transport::{frame_document, latin1_bytes, latin1_string};

use ::tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use ::tokio::net::TcpStream;
use ::tokio::time::timeout;

/// Async counterpart of [`Transport`](crate::transport::Transport); every
/// I/O operation is a suspension point with the per-operation timeout
/// applied.
#[async_trait]
pub trait AsyncTransport: fmt::Debug + Send {
    async fn connect(&mut self) -> Result<(), OcipError>;

    /// Send a framed document and read the complete reply.
    async fn send(&mut self, frame: &[u8]) -> Result<Vec<u8>, OcipError>;

    /// Close the connection. Idempotent.
    async fn close(&mut self) -> Result<(), OcipError>;

    fn session_id(&self) -> &str;

    fn is_secure(&self) -> bool;

    fn frame(&self, body: &str) -> Vec<u8> {
        frame_document(self.session_id(), body)
    }
}

#[derive(Debug)]
enum MaybeTls {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for MaybeTls {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeTls {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Async socket transport carrying `BroadsoftDocument` frames.
///
/// Cancellation of an in-flight send or receive drops the framed stream and
/// with it the socket.
#[derive(Debug)]
pub struct AsyncTcpTransport {
    host: String,
    port: u16,
    tls: bool,
    timeout: Duration,
    session_id: String,
    framed: Option<Framed<MaybeTls, OciClientCodec>>,
}

impl AsyncTcpTransport {
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
            framed: None,
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

#[async_trait]
impl AsyncTransport for AsyncTcpTransport {
    async fn connect(&mut self) -> Result<(), OcipError> {
        let stream = timeout(
            self.timeout,
            TcpStream::connect((self.host.clone(), self.port)),
        )
        .await
        .map_err(|_| OcipError::Timeout(self.timeout))?
        .map_err(|e| self.socket_init(e))?;

        let stream = if self.tls {
            let name = ServerName::try_from(self.host.clone())
                .map_err(|e| self.socket_init(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
            let connector = TlsConnector::from(tls_config());
            let tls = timeout(self.timeout, connector.connect(name, stream))
                .await
                .map_err(|_| OcipError::Timeout(self.timeout))?
                .map_err(|e| self.socket_init(e))?;
            MaybeTls::Tls(Box::new(tls))
        } else {
            MaybeTls::Plain(stream)
        };

        self.framed = Some(Framed::new(stream, OciClientCodec::new()));
        info!(
            "connected to {}:{} (tls={})",
            self.host, self.port, self.tls
        );
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<Vec<u8>, OcipError> {
        let deadline = self.timeout;
        let framed = self.framed.as_mut().ok_or_else(|| {
            OcipError::SendFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is not connected",
            ))
        })?;

        timeout(deadline, framed.send(Bytes::copy_from_slice(frame)))
            .await
            .map_err(|_| OcipError::Timeout(deadline))?
            .map_err(OcipError::SendFailed)?;
        trace!("sent frame of {} bytes", frame.len());

        match timeout(deadline, framed.next()).await {
            Err(_) => Err(OcipError::Timeout(deadline)),
            Ok(None) => Err(OcipError::SendFailed(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before message terminator",
            ))),
            Ok(Some(Err(error))) => Err(OcipError::SendFailed(error)),
            Ok(Some(Ok(reply))) => {
                trace!("received frame of {} bytes", reply.len());
                Ok(reply.to_vec())
            }
        }
    }

    async fn close(&mut self) -> Result<(), OcipError> {
        if let Some(mut framed) = self.framed.take() {
            let _ = framed.get_mut().shutdown().await;
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

/// Async HTTP transport posting SOAP-wrapped documents.
#[derive(Debug)]
pub struct AsyncSoapTransport {
    host: String,
    port: u16,
    tls: bool,
    timeout: Duration,
    user_agent: String,
    session_id: String,
    client: Option<reqwest::Client>,
}

impl AsyncSoapTransport {
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
            client: None,
        }
    }
}

#[async_trait]
impl AsyncTransport for AsyncSoapTransport {
    async fn connect(&mut self) -> Result<(), OcipError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| OcipError::ClientInit(e.to_string()))?;

        self.client = Some(client);
        info!(
            "initiated SOAP client for {}",
            soap_endpoint(&self.host, self.port, self.tls)
        );
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<Vec<u8>, OcipError> {
        let client = self.client.as_ref().ok_or_else(|| {
            OcipError::SendFailed(io::Error::new(
                io::ErrorKind::NotConnected,
                "SOAP client is not initialised",
            ))
        })?;

        let envelope = soap_envelope(&latin1_string(frame));
        let response = client
            .post(soap_endpoint(&self.host, self.port, self.tls))
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"processOCIMessage\"")
            .body(envelope)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    OcipError::Timeout(self.timeout)
                } else {
                    OcipError::SendFailed(io::Error::other(error))
                }
            })?;

        let response = response
            .error_for_status()
            .map_err(|error| OcipError::SendFailed(io::Error::other(error)))?;
        let body = response
            .text()
            .await
            .map_err(|error| OcipError::SendFailed(io::Error::other(error)))?;

        let reply = extract_soap_return(&body)?;
        Ok(latin1_bytes(&reply))
    }

    async fn close(&mut self) -> Result<(), OcipError> {
        if self.client.take().is_some() {
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
