//! Session lifecycle and the authentication handshake.
//!
//! A session owns exactly one transport, an opaque session identifier
//! carried in every frame, and the authentication state machine. The
//! handshake is a fixed two-step sequence: obtain a nonce, then log in with
//! the signed password. Which login request is sent depends on transport
//! security.

use log::{debug, info};
use md5::{Digest, Md5};
use ocip_types::{
    commands::{
        AuthenticationRequest, AuthenticationResponse, ErrorResponse, LoginRequest14sp4,
        LoginRequest22V5,
    },
    EntityKind, Instance, OciEntity, Registry,
};
use sha1::Sha1;

use crate::codec;
use crate::error::OcipError;
use crate::transport::{latin1_string, Transport};

/// Tags a session accepts before it is authenticated.
pub(crate) const HANDSHAKE_TAGS: [&str; 3] = [
    "AuthenticationRequest",
    "LoginRequest22V5",
    "LoginRequest14sp4",
];

pub(crate) fn is_handshake(tag: &str) -> bool {
    HANDSHAKE_TAGS.contains(&tag)
}

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Created; only handshake commands are accepted.
    Unauthenticated,
    /// Handshake complete; any command is accepted.
    Authenticated,
    /// Transport released; the session is finished.
    Disconnected,
}

/// `signedPassword = md5_hex(nonce + ":" + sha1_hex(password))`, both digests
/// in lowercase hex.
pub fn signed_password(nonce: &str, password: &str) -> String {
    let sha = hex::encode(Sha1::digest(password.as_bytes()));
    let digest = Md5::digest(format!("{nonce}:{sha}").as_bytes());
    hex::encode(digest)
}

/// An authenticated context over one transport.
#[derive(Debug)]
pub struct Session {
    id: String,
    state: SessionState,
    registry: &'static Registry,
    transport: Box<dyn Transport>,
}

impl Session {
    /// Wrap a transport. The session adopts the transport's session
    /// identifier and starts unauthenticated.
    pub fn new(registry: &'static Registry, transport: Box<dyn Transport>) -> Self {
        Self {
            id: transport.session_id().to_owned(),
            state: SessionState::Unauthenticated,
            registry,
            transport,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    pub fn is_secure(&self) -> bool {
        self.transport.is_secure()
    }

    pub fn connect(&mut self) -> Result<(), OcipError> {
        self.transport.connect()
    }

    /// Frame and transmit one command, read the paired reply, decode it.
    /// Non-handshake commands are rejected until the session authenticates.
    pub fn roundtrip(&mut self, instance: &Instance) -> Result<Instance, OcipError> {
        if !self.authenticated() && !is_handshake(instance.tag()) {
            return Err(OcipError::AuthFailed(format!(
                "session is not authenticated; `{}` requires a completed handshake",
                instance.tag()
            )));
        }

        let body = codec::encode_command(instance);
        let frame = self.transport.frame(&body);
        debug!("dispatching {}", instance.tag());

        let reply = self.transport.send(&frame)?;
        let reply = latin1_string(&reply);
        codec::decode_reply(&reply, self.registry)
    }

    /// Run the two-step handshake and mark the session authenticated.
    pub fn authenticate(&mut self, user_id: &str, password: &str) -> Result<(), OcipError> {
        let request = AuthenticationRequest {
            user_id: Some(user_id.to_owned()),
        };
        let reply = self.roundtrip(&request.to_instance())?;

        let challenge = match reply.tag() {
            "AuthenticationResponse" => AuthenticationResponse::from_instance(reply)?,
            _ => return Err(handshake_failure(reply)),
        };

        let algorithm = challenge.password_algorithm.unwrap_or_default();
        if algorithm != "MD5" {
            return Err(OcipError::UnknownAlgorithm(algorithm));
        }
        let nonce = challenge
            .nonce
            .ok_or_else(|| OcipError::AuthFailed("challenge carried no nonce".into()))?;
        let signed = signed_password(&nonce, password);

        let (login, expected) = if self.is_secure() {
            (
                LoginRequest22V5 {
                    user_id: Some(user_id.to_owned()),
                    signed_password: Some(signed),
                }
                .to_instance(),
                "LoginResponse22V5",
            )
        } else {
            (
                LoginRequest14sp4 {
                    user_id: Some(user_id.to_owned()),
                    signed_password: Some(signed),
                }
                .to_instance(),
                "LoginResponse14sp4",
            )
        };

        let reply = self.roundtrip(&login)?;
        if reply.tag() != expected {
            return Err(handshake_failure(reply));
        }

        self.state = SessionState::Authenticated;
        info!("session {} authenticated as {user_id}", self.id);
        Ok(())
    }

    /// Clear the authenticated flag, blank the session identifier, and close
    /// the transport. Idempotent.
    pub fn disconnect(&mut self) {
        let _ = self.transport.close();
        self.state = SessionState::Disconnected;
        self.id.clear();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

pub(crate) fn handshake_failure(reply: Instance) -> OcipError {
    if reply.kind() == EntityKind::ErrorResponse {
        if let Ok(error) = ErrorResponse::from_instance(reply) {
            return OcipError::AuthFailed(format!(
                "{}: {}",
                error.summary.unwrap_or_default(),
                error.detail.unwrap_or_default()
            ));
        }
        return OcipError::AuthFailed("server rejected the handshake".into());
    }
    OcipError::AuthFailed(format!("unexpected `{}` during handshake", reply.tag()))
}
