//! End-to-end client scenarios against a scripted transport.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use ocip::codec::encode;
use ocip::transport::{frame_document, latin1_string, Transport};
use ocip::types::commands::{
    AuthenticationResponse, ErrorResponse, LoginResponse14sp4, LoginResponse22V5, SuccessResponse,
    UserGetRegistrationListRequest, UserGetRegistrationListResponse,
};
use ocip::types::{OciEntity, Table};
use ocip::{Client, ClientConfig, CommandOutcome, OcipError};

type Script = Box<dyn FnMut(&str) -> Result<Vec<u8>, OcipError> + Send>;

/// A transport that records every frame and answers from a script.
struct MockTransport {
    session_id: String,
    tls: bool,
    connected: bool,
    frames: Arc<Mutex<Vec<String>>>,
    script: Script,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("session_id", &self.session_id)
            .field("tls", &self.tls)
            .finish()
    }
}

impl MockTransport {
    fn new(tls: bool, script: Script) -> (Self, Arc<Mutex<Vec<String>>>) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                session_id: "test-session".into(),
                tls,
                connected: false,
                frames: Arc::clone(&frames),
                script,
            },
            frames,
        )
    }
}

impl Transport for MockTransport {
    fn connect(&mut self) -> Result<(), OcipError> {
        self.connected = true;
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<Vec<u8>, OcipError> {
        let text = latin1_string(frame);
        self.frames.lock().unwrap().push(text.clone());
        (self.script)(&text)
    }

    fn close(&mut self) -> Result<(), OcipError> {
        self.connected = false;
        Ok(())
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn is_secure(&self) -> bool {
        self.tls
    }
}

fn reply_frame<T: OciEntity>(entity: &T) -> Vec<u8> {
    frame_document("test-session", &encode(entity))
}

fn auth_challenge() -> AuthenticationResponse {
    AuthenticationResponse {
        user_id: Some("user".into()),
        nonce: Some("12345".into()),
        password_algorithm: Some("MD5".into()),
    }
}

fn registration_reply() -> UserGetRegistrationListResponse {
    UserGetRegistrationListResponse {
        registration_table: Some(Table::new(
            ["deviceName", "endpointType", "line/port"],
            [["DeskPhone", "Primary", "5005"]],
        )),
    }
}

/// Answers the handshake like the real server and delegates everything else.
fn scripted(
    mut other: impl FnMut(&str) -> Result<Vec<u8>, OcipError> + Send + 'static,
) -> Script {
    Box::new(move |frame| {
        if frame.contains("LoginRequest22V5") {
            Ok(reply_frame(&LoginResponse22V5::default()))
        } else if frame.contains("LoginRequest14sp4") {
            Ok(reply_frame(&LoginResponse14sp4::default()))
        } else if frame.contains("AuthenticationRequest") {
            Ok(reply_frame(&auth_challenge()))
        } else {
            other(frame)
        }
    })
}

fn standard_script() -> Script {
    scripted(|frame| {
        if frame.contains("UserGetRegistrationListRequest") {
            Ok(reply_frame(&registration_reply()))
        } else {
            Ok(reply_frame(&SuccessResponse::default()))
        }
    })
}

fn connect_client(tls: bool, script: Script) -> (Client, Arc<Mutex<Vec<String>>>) {
    let (transport, frames) = MockTransport::new(tls, script);
    let client = Client::with_transport(
        ClientConfig::new("localhost").tls(tls),
        "user",
        "pass",
        Box::new(transport),
    )
    .unwrap();
    (client, frames)
}

#[test]
fn test_defaults() {
    let config = ClientConfig::new("localhost");
    assert_eq!("localhost", config.host);
    assert_eq!(2209, config.port);
    assert!(config.tls);
    assert_eq!(std::time::Duration::from_secs(30), config.timeout);
    assert_eq!("Broadworks SDK", config.user_agent);
}

#[test]
fn test_handshake_with_tls() {
    let (client, frames) = connect_client(true, standard_script());

    assert!(client.authenticated());
    assert!(!client.session_id().is_empty());

    let frames = frames.lock().unwrap();
    assert_eq!(2, frames.len());
    assert!(frames[0].contains(":type=\"AuthenticationRequest\""));
    assert!(frames[0].contains("<userId>user</userId>"));
    assert!(frames[1].contains(":type=\"LoginRequest22V5\""));
    assert!(frames[1].contains("<signedPassword>"));

    // The session id is stable and appears in every frame.
    for frame in frames.iter() {
        assert!(frame.contains("<sessionId xmlns=\"\">test-session</sessionId>"));
    }
}

#[test]
fn test_handshake_without_tls() {
    let (client, frames) = connect_client(false, standard_script());

    assert!(client.authenticated());

    let frames = frames.lock().unwrap();
    assert_eq!(2, frames.len());
    assert!(frames[1].contains(":type=\"LoginRequest14sp4\""));
}

#[test]
fn test_signed_password_on_the_wire() {
    let (_, frames) = connect_client(true, standard_script());

    // md5("12345:" + sha1_hex("pass"))
    let expected = ocip::session::signed_password("12345", "pass");
    let frames = frames.lock().unwrap();
    assert!(frames[1].contains(&format!("<signedPassword>{expected}</signedPassword>")));
}

#[test]
fn test_dispatch_data_request() {
    let (mut client, _) = connect_client(true, standard_script());

    let request = UserGetRegistrationListRequest {
        user_id: Some("user".into()),
    };
    let outcome = client.command(&request).unwrap();

    let response: UserGetRegistrationListResponse = outcome.into_entity().unwrap();
    let table = response.registration_table.unwrap();
    assert_eq!(
        vec![json!({
            "device_name": "DeskPhone",
            "endpoint_type": "Primary",
            "line/port": "5005",
        })],
        table
            .records()
            .into_iter()
            .map(Value::Object)
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_success_reply_classifies_as_success() {
    let (mut client, _) = connect_client(true, standard_script());

    let mut fields = Map::new();
    fields.insert("user_id".into(), json!("user"));
    let outcome = client
        .raw_command("UserConsolidatedModifyRequest22", &fields)
        .unwrap();
    assert_eq!(CommandOutcome::Success, outcome);
}

#[test]
fn test_error_response_is_lifted() {
    let script = scripted(|_| {
        Ok(reply_frame(&ErrorResponse {
            summary: Some("bad".into()),
            summary_english: Some("bad".into()),
            detail: Some("reason".into()),
            error_code: Some(100),
        }))
    });
    let (mut client, _) = connect_client(true, script);

    let request = UserGetRegistrationListRequest {
        user_id: Some("user".into()),
    };
    let got = client.command(&request);

    match got {
        Err(OcipError::ResponseError {
            summary,
            detail,
            error_code,
            ..
        }) => {
            assert_eq!("bad", summary);
            assert_eq!("reason", detail);
            assert_eq!(Some(100), error_code);
        }
        other => panic!("expected ResponseError, got {other:?}"),
    }
}

#[test]
fn test_timeout_leaves_session_authenticated() {
    let mut failed_once = false;
    let script = scripted(move |frame| {
        if frame.contains("UserGetRegistrationListRequest") && !failed_once {
            failed_once = true;
            return Err(OcipError::Timeout(std::time::Duration::from_secs(30)));
        }
        Ok(reply_frame(&registration_reply()))
    });
    let (mut client, _) = connect_client(true, script);

    let request = UserGetRegistrationListRequest {
        user_id: Some("user".into()),
    };

    let got = client.command(&request);
    assert!(matches!(got, Err(OcipError::Timeout(_))));

    // The server never replied; the session is still usable.
    assert!(client.authenticated());
    assert!(client.command(&request).is_ok());
}

#[test]
fn test_raw_command_matches_typed_frame() {
    let (mut typed_client, typed_frames) = connect_client(true, standard_script());
    let (mut raw_client, raw_frames) = connect_client(true, standard_script());

    let request = UserGetRegistrationListRequest {
        user_id: Some("example_user".into()),
    };
    typed_client.command(&request).unwrap();

    let mut fields = Map::new();
    fields.insert("user_id".into(), json!("example_user"));
    raw_client
        .raw_command("UserGetRegistrationListRequest", &fields)
        .unwrap();

    assert_eq!(typed_frames.lock().unwrap()[2], raw_frames.lock().unwrap()[2]);
}

#[test]
fn test_raw_command_accepts_camel_keys() {
    let (mut client, frames) = connect_client(true, standard_script());

    let mut fields = Map::new();
    fields.insert("userId".into(), json!("example_user"));
    client
        .raw_command("UserGetRegistrationListRequest", &fields)
        .unwrap();

    assert!(frames.lock().unwrap()[2].contains("<userId>example_user</userId>"));
}

#[test]
fn test_known_commands() {
    let (client, _) = connect_client(true, standard_script());

    let tags = client.known_commands();
    assert!(tags.contains(&"AuthenticationRequest"));
    assert!(tags.contains(&"UserGetRegistrationListRequest"));
    assert!(tags.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_raw_command_unknown_command() {
    let (mut client, _) = connect_client(true, standard_script());

    let got = client.raw_command("NoSuchRequest", &Map::new());
    assert!(matches!(got, Err(OcipError::UnknownCommand(tag)) if tag == "NoSuchRequest"));
}

#[test]
fn test_raw_command_unknown_field() {
    let (mut client, _) = connect_client(true, standard_script());

    let mut fields = Map::new();
    fields.insert("user_id".into(), json!("example_user"));
    fields.insert("stray".into(), json!("x"));

    let got = client.raw_command("UserGetRegistrationListRequest", &fields);
    assert!(matches!(got, Err(OcipError::UnknownField { field, .. }) if field == "stray"));
}

#[test]
fn test_unauthenticated_session_rejects_commands() {
    let (transport, frames) = MockTransport::new(true, standard_script());
    let mut session = ocip::Session::new(
        ocip::types::Registry::builtin(),
        Box::new(transport),
    );
    session.connect().unwrap();

    let request = UserGetRegistrationListRequest {
        user_id: Some("user".into()),
    };
    let got = session.roundtrip(&request.to_instance());

    assert!(matches!(got, Err(OcipError::AuthFailed(_))));
    assert!(frames.lock().unwrap().is_empty());
}

#[test]
fn test_disconnect_is_idempotent() {
    let (mut client, _) = connect_client(true, standard_script());
    assert!(client.authenticated());

    client.disconnect();
    assert!(!client.authenticated());
    assert_eq!("", client.session_id());
    assert_eq!(ocip::SessionState::Disconnected, client.session().state());

    client.disconnect();
    assert!(!client.authenticated());
    assert_eq!("", client.session_id());
}

#[test]
fn test_auth_failure_from_error_response() {
    let script: Script = Box::new(|_| {
        Ok(reply_frame(&ErrorResponse {
            summary: Some("Authentication failed".into()),
            summary_english: Some("Authentication failed".into()),
            detail: Some("Invalid credentials".into()),
            error_code: Some(100),
        }))
    });
    let (transport, _) = MockTransport::new(true, script);

    let got = Client::with_transport(
        ClientConfig::new("localhost"),
        "user",
        "wrong_pass",
        Box::new(transport),
    );
    assert!(matches!(got, Err(OcipError::AuthFailed(_))));
}

#[test]
fn test_unknown_password_algorithm() {
    let script: Script = Box::new(|_| {
        Ok(reply_frame(&AuthenticationResponse {
            user_id: Some("user".into()),
            nonce: Some("12345".into()),
            password_algorithm: Some("SHA-512".into()),
        }))
    });
    let (transport, _) = MockTransport::new(true, script);

    let got = Client::with_transport(
        ClientConfig::new("localhost"),
        "user",
        "pass",
        Box::new(transport),
    );
    assert!(matches!(got, Err(OcipError::UnknownAlgorithm(alg)) if alg == "SHA-512"));
}

#[test]
fn test_login_response_mismatch_fails_handshake() {
    // TLS handshake must end in LoginResponse22V5; a 14sp4 reply is a
    // protocol violation.
    let script: Script = Box::new(|frame| {
        if frame.contains("AuthenticationRequest") {
            Ok(reply_frame(&auth_challenge()))
        } else {
            Ok(reply_frame(&LoginResponse14sp4::default()))
        }
    });
    let (transport, _) = MockTransport::new(true, script);

    let got = Client::with_transport(
        ClientConfig::new("localhost"),
        "user",
        "pass",
        Box::new(transport),
    );
    assert!(matches!(got, Err(OcipError::AuthFailed(_))));
}
