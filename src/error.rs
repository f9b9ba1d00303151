//! The unified failure taxonomy surfaced to callers.

use std::io;
use std::time::Duration;

use ocip_types::EntityError;
use thiserror::Error;

/// Every failure a caller can observe. Transports and the codec produce their
/// native failures; the dispatcher lifts them here with the originating cause
/// attached. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum OcipError {
    /// Transport could not open the connection.
    #[error("could not open connection to {host}:{port}")]
    SocketInit {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// I/O exceeded the per-operation deadline.
    #[error("i/o timed out after {0:?}")]
    Timeout(Duration),

    /// Write or round-trip failed on an established connection.
    #[error("request failed on established connection")]
    SendFailed(#[source] io::Error),

    /// SOAP client construction failed.
    #[error("client initialisation failed: {0}")]
    ClientInit(String),

    /// Handshake did not reach the expected login response.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The server does not speak a password algorithm we know.
    #[error("password algorithm `{0}` is not supported")]
    UnknownAlgorithm(String),

    /// The reply was an `ErrorResponse`.
    #[error("server returned an error: {summary}: {detail}")]
    ResponseError {
        summary: String,
        summary_english: Option<String>,
        detail: String,
        error_code: Option<i64>,
    },

    /// Reply parsing failed, or the reply lacked a type attribute.
    #[error("malformed reply: {0}")]
    MalformedWire(String),

    /// Type tag not present in the registry.
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    /// A field name not present in the request descriptor.
    #[error("unknown field `{field}` for `{tag}`")]
    UnknownField { tag: String, field: String },

    /// Scalar coercion or entity conversion failed.
    #[error("could not decode reply")]
    Decode(#[source] EntityError),

    /// The dispatch was cancelled mid-flight and the transport closed.
    #[error("dispatch cancelled")]
    Cancelled,

    /// Any other unexpected failure, wrapping the underlying cause.
    #[error("unexpected failure")]
    Unknown(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<EntityError> for OcipError {
    fn from(error: EntityError) -> Self {
        match error {
            EntityError::UnknownField { tag, field } => Self::UnknownField { tag, field },
            other => Self::Decode(other),
        }
    }
}

impl OcipError {
    pub(crate) fn unknown<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unknown(Box::new(error))
    }
}
