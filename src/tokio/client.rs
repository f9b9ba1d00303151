//! The async client.
//!
//! Mirrors the blocking dispatcher with suspension points at send and
//! receive. Concurrent dispatches on one session are serialised in
//! submission order by a fair async mutex; encode and decode run on a
//! blocking pool bounded to four workers so the event thread stays free.

use log::info;
use ocip_types::{
    commands::{
        AuthenticationRequest, AuthenticationResponse, LoginRequest14sp4, LoginRequest22V5,
    },
    Instance, OciEntity, Registry,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::client::{classify, raw_instance, ClientConfig, CommandOutcome, Connection};
use crate::codec;
use crate::error::OcipError;
use crate::session::{is_handshake, signed_password, SessionState};
use crate::tokio::{AsyncSoapTransport, AsyncTcpTransport, AsyncTransport};
use crate::transport::latin1_string;

use ::tokio::sync::{Mutex, Semaphore};
use ::tokio::task::spawn_blocking;

/// Codec work shares one pool across clients; four permits match the worker
/// bound of the offload design.
static CODEC_POOL: Semaphore = Semaphore::const_new(4);

async fn offload<F, T>(work: F) -> Result<T, OcipError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let _permit = CODEC_POOL
        .acquire()
        .await
        .map_err(OcipError::unknown)?;
    spawn_blocking(work).await.map_err(OcipError::unknown)
}

#[derive(Debug)]
struct AsyncSession {
    id: String,
    state: SessionState,
    registry: &'static Registry,
    /// Taken while a dispatch is in flight; a cancelled dispatch drops the
    /// transport with the future, closing the socket.
    transport: Option<Box<dyn AsyncTransport>>,
}

impl AsyncSession {
    fn authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    async fn connect(&mut self) -> Result<(), OcipError> {
        match self.transport.as_mut() {
            Some(transport) => transport.connect().await,
            None => Err(OcipError::Cancelled),
        }
    }

    fn is_secure(&self) -> Result<bool, OcipError> {
        self.transport
            .as_ref()
            .map(|transport| transport.is_secure())
            .ok_or(OcipError::Cancelled)
    }

    async fn roundtrip(&mut self, instance: Instance) -> Result<Instance, OcipError> {
        if !self.authenticated() && !is_handshake(instance.tag()) {
            return Err(OcipError::AuthFailed(format!(
                "session is not authenticated; `{}` requires a completed handshake",
                instance.tag()
            )));
        }

        let body = offload(move || codec::encode_command(&instance)).await?;

        let Some(mut transport) = self.transport.take() else {
            // The previous dispatch was cancelled mid-flight; its transport
            // went down with it.
            self.state = SessionState::Unauthenticated;
            return Err(OcipError::Cancelled);
        };
        let frame = transport.frame(&body);
        let result = transport.send(&frame).await;
        self.transport = Some(transport);

        let reply = latin1_string(&result?);
        let registry = self.registry;
        offload(move || codec::decode_reply(&reply, registry)).await?
    }

    async fn authenticate(&mut self, user_id: &str, password: &str) -> Result<(), OcipError> {
        let request = AuthenticationRequest {
            user_id: Some(user_id.to_owned()),
        };
        let reply = self.roundtrip(request.to_instance()).await?;

        let challenge = match reply.tag() {
            "AuthenticationResponse" => AuthenticationResponse::from_instance(reply)?,
            _ => return Err(crate::session::handshake_failure(reply)),
        };

        let algorithm = challenge.password_algorithm.unwrap_or_default();
        if algorithm != "MD5" {
            return Err(OcipError::UnknownAlgorithm(algorithm));
        }
        let nonce = challenge
            .nonce
            .ok_or_else(|| OcipError::AuthFailed("challenge carried no nonce".into()))?;
        let signed = signed_password(&nonce, password);

        let (login, expected) = if self.is_secure()? {
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

        let reply = self.roundtrip(login).await?;
        if reply.tag() != expected {
            return Err(crate::session::handshake_failure(reply));
        }

        self.state = SessionState::Authenticated;
        info!("session {} authenticated as {user_id}", self.id);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            let _ = transport.close().await;
        }
        self.state = SessionState::Disconnected;
        self.id.clear();
    }
}

/// An async OCI-P client sharing the blocking client's surface.
pub struct AsyncClient {
    config: ClientConfig,
    username: String,
    password: String,
    session: Mutex<AsyncSession>,
}

impl std::fmt::Debug for AsyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncClient")
            .field("config", &self.config)
            .field("username", &self.username)
            .field("password", &"/* redacted */")
            .finish()
    }
}

impl AsyncClient {
    /// Connect and authenticate with the default transport for
    /// `config.connection`.
    pub async fn connect(
        config: ClientConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, OcipError> {
        let session_id = Uuid::new_v4().to_string();
        let transport: Box<dyn AsyncTransport> = match config.connection {
            Connection::Tcp => Box::new(AsyncTcpTransport::new(
                &config.host,
                config.port,
                config.tls,
                config.timeout,
                &session_id,
            )),
            Connection::Soap => Box::new(AsyncSoapTransport::new(
                &config.host,
                config.port,
                config.tls,
                config.timeout,
                &config.user_agent,
                &session_id,
            )),
        };
        Self::with_transport(config, username, password, transport).await
    }

    /// Connect and authenticate over a caller-supplied transport.
    pub async fn with_transport(
        config: ClientConfig,
        username: impl Into<String>,
        password: impl Into<String>,
        transport: Box<dyn AsyncTransport>,
    ) -> Result<Self, OcipError> {
        let mut session = AsyncSession {
            id: transport.session_id().to_owned(),
            state: SessionState::Unauthenticated,
            registry: Registry::builtin(),
            transport: Some(transport),
        };
        session.connect().await?;

        let client = Self {
            config,
            username: username.into(),
            password: password.into(),
            session: Mutex::new(session),
        };
        client.authenticate().await?;
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn session_id(&self) -> String {
        self.session.lock().await.id.clone()
    }

    pub async fn authenticated(&self) -> bool {
        self.session.lock().await.authenticated()
    }

    /// Run the two-step handshake.
    pub async fn authenticate(&self) -> Result<(), OcipError> {
        let mut session = self.session.lock().await;
        session.authenticate(&self.username, &self.password).await
    }

    /// Dispatch one typed request and classify the reply. Concurrent calls
    /// queue in submission order; at most one command is in flight.
    pub async fn command<R: OciEntity>(&self, request: &R) -> Result<CommandOutcome, OcipError> {
        self.dispatch(request.to_instance()).await
    }

    /// Dispatch a request by wire tag with a dict of fields.
    pub async fn raw_command(
        &self,
        tag: &str,
        fields: &Map<String, Value>,
    ) -> Result<CommandOutcome, OcipError> {
        let instance = raw_instance(Registry::builtin(), tag, fields)?;
        self.dispatch(instance).await
    }

    async fn dispatch(&self, instance: Instance) -> Result<CommandOutcome, OcipError> {
        let mut session = self.session.lock().await;
        let reply = session.roundtrip(instance).await?;
        classify(reply)
    }

    /// Drop authentication state and release the transport. Idempotent.
    pub async fn disconnect(&self) {
        self.session.lock().await.disconnect().await;
    }
}
