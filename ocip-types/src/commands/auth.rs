//! Handshake commands.
//!
//! Authentication is a two-step exchange: `AuthenticationRequest` obtains a
//! nonce, then the login request carries the signed password. Which login
//! request is sent depends on transport security: `LoginRequest22V5` over TLS,
//! `LoginRequest14sp4` over plaintext.

crate::entity! {
    /// First handshake step; asks the server for a nonce.
    pub struct AuthenticationRequest: Request, "AuthenticationRequest" {
        user_id, "userId": scalar(String), required;
    }
}

crate::entity! {
    /// Carries the nonce and the password algorithm (always `MD5`).
    pub struct AuthenticationResponse: DataResponse, "AuthenticationResponse" {
        user_id, "userId": scalar(String), optional;
        nonce, "nonce": scalar(String), required;
        password_algorithm, "passwordAlgorithm": scalar(String), required;
    }
}

crate::entity! {
    /// Second handshake step over TLS transports.
    pub struct LoginRequest22V5: Request, "LoginRequest22V5" {
        user_id, "userId": scalar(String), required;
        signed_password, "signedPassword": scalar(String), optional;
    }
}

crate::entity! {
    pub struct LoginResponse22V5: DataResponse, "LoginResponse22V5" {
        login_type, "loginType": scalar(String), optional;
        locale, "locale": scalar(String), optional;
        encoding, "encoding": scalar(String), optional;
        password_expires_days, "passwordExpiresDays": scalar(Int), optional;
    }
}

crate::entity! {
    /// Second handshake step over plaintext transports.
    pub struct LoginRequest14sp4: Request, "LoginRequest14sp4" {
        user_id, "userId": scalar(String), required;
        signed_password, "signedPassword": scalar(String), optional;
    }
}

crate::entity! {
    pub struct LoginResponse14sp4: DataResponse, "LoginResponse14sp4" {
        login_type, "loginType": scalar(String), optional;
        locale, "locale": scalar(String), optional;
        encoding, "encoding": scalar(String), optional;
    }
}
