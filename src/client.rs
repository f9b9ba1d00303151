//! The blocking client: dispatches typed requests and routes replies.

use std::time::Duration;

use log::warn;
use ocip_types::{
    commands::ErrorResponse, dict, EntityKind, Instance, OciEntity, Registry,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::OcipError;
use crate::session::Session;
use crate::transport::{SoapTransport, TcpTransport, Transport};

/// How to reach the server.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Connection {
    /// Raw socket framing, the default.
    #[default]
    Tcp,
    /// SOAP-over-HTTP framing.
    Soap,
}

/// Connection settings with the protocol defaults filled in.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub timeout: Duration,
    pub user_agent: String,
    pub connection: Connection,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 2209,
            tls: true,
            timeout: Duration::from_secs(30),
            user_agent: "Broadworks SDK".to_owned(),
            connection: Connection::Tcp,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn connection(mut self, connection: Connection) -> Self {
        self.connection = connection;
        self
    }

    pub(crate) fn build_transport(&self, session_id: &str) -> Box<dyn Transport> {
        match self.connection {
            Connection::Tcp => Box::new(TcpTransport::new(
                &self.host,
                self.port,
                self.tls,
                self.timeout,
                session_id,
            )),
            Connection::Soap => Box::new(SoapTransport::new(
                &self.host,
                self.port,
                self.tls,
                self.timeout,
                &self.user_agent,
                session_id,
            )),
        }
    }
}

/// A classified, non-error reply.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CommandOutcome {
    /// The server acknowledged with an empty `SuccessResponse`.
    Success,
    /// A data response, convertible into its typed entity.
    Data(Instance),
}

impl CommandOutcome {
    pub fn instance(&self) -> Option<&Instance> {
        match self {
            Self::Data(instance) => Some(instance),
            Self::Success => None,
        }
    }

    /// Convert a data reply into its typed entity.
    pub fn into_entity<T: OciEntity>(self) -> Result<T, OcipError> {
        match self {
            Self::Data(instance) => T::from_instance(instance).map_err(OcipError::from),
            Self::Success => Err(OcipError::MalformedWire(
                "success acknowledgement carries no payload".into(),
            )),
        }
    }
}

/// Route a decoded reply: error responses are lifted into the error
/// taxonomy, success acknowledgements and data replies come back as
/// [`CommandOutcome`].
pub(crate) fn classify(reply: Instance) -> Result<CommandOutcome, OcipError> {
    match reply.kind() {
        EntityKind::ErrorResponse => {
            let error = ErrorResponse::from_instance(reply)?;
            Err(OcipError::ResponseError {
                summary: error.summary.unwrap_or_default(),
                summary_english: error.summary_english,
                detail: error.detail.unwrap_or_default(),
                error_code: error.error_code,
            })
        }
        EntityKind::SuccessResponse => Ok(CommandOutcome::Success),
        _ => Ok(CommandOutcome::Data(reply)),
    }
}

/// Resolve a raw command name and field map against the registry.
pub(crate) fn raw_instance(
    registry: &'static Registry,
    tag: &str,
    fields: &Map<String, Value>,
) -> Result<Instance, OcipError> {
    let descriptor = registry
        .get(tag)
        .ok_or_else(|| OcipError::UnknownCommand(tag.to_owned()))?;
    dict::from_map_strict(descriptor, fields).map_err(OcipError::from)
}

/// A blocking OCI-P client.
///
/// Connecting runs the handshake; afterwards commands are dispatched
/// strictly one at a time over the owned session.
pub struct Client {
    config: ClientConfig,
    username: String,
    password: String,
    session: Session,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("username", &self.username)
            .field("password", &"/* redacted */")
            .field("session", &self.session)
            .finish()
    }
}

impl Client {
    /// Connect and authenticate with the default transport for
    /// `config.connection`.
    pub fn connect(
        config: ClientConfig,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, OcipError> {
        let session_id = Uuid::new_v4().to_string();
        let transport = config.build_transport(&session_id);
        Self::with_transport(config, username, password, transport)
    }

    /// Connect and authenticate over a caller-supplied transport.
    pub fn with_transport(
        config: ClientConfig,
        username: impl Into<String>,
        password: impl Into<String>,
        transport: Box<dyn Transport>,
    ) -> Result<Self, OcipError> {
        let mut session = Session::new(Registry::builtin(), transport);
        session.connect()?;

        let mut client = Self {
            config,
            username: username.into(),
            password: password.into(),
            session,
        };
        client.authenticate()?;
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    pub fn authenticated(&self) -> bool {
        self.session.authenticated()
    }

    /// Run the two-step handshake.
    pub fn authenticate(&mut self) -> Result<(), OcipError> {
        let username = self.username.clone();
        let password = self.password.clone();
        self.session.authenticate(&username, &password)
    }

    /// Every command tag the registry knows, sorted.
    pub fn known_commands(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.session.registry().tags().collect();
        tags.sort_unstable();
        tags
    }

    /// Dispatch one typed request and classify the reply.
    pub fn command<R: OciEntity>(&mut self, request: &R) -> Result<CommandOutcome, OcipError> {
        self.dispatch(request.to_instance())
    }

    /// Dispatch a request by wire tag with a dict of fields. Field names may
    /// be camel or snake; names outside the request descriptor are rejected.
    pub fn raw_command(
        &mut self,
        tag: &str,
        fields: &Map<String, Value>,
    ) -> Result<CommandOutcome, OcipError> {
        let instance = raw_instance(self.session.registry(), tag, fields)?;
        self.dispatch(instance)
    }

    fn dispatch(&mut self, instance: Instance) -> Result<CommandOutcome, OcipError> {
        let reply = self.session.roundtrip(&instance)?;
        classify(reply)
    }

    /// Drop authentication state and release the transport. Idempotent.
    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if self.session.authenticated() {
            warn!("client dropped while authenticated; disconnecting");
        }
        self.disconnect();
    }
}
