//! Symmetric object ↔ XML codec.
//!
//! [`encode`] and [`decode_reply`] are inverses: for any registered entity,
//! decoding its encoding yields an equal entity, and re-encoding a decoded
//! document reproduces it up to field reordering into declared order.
//!
//! ```
//! use ocip::codec::{decode_as, encode};
//! use ocip::types::commands::AuthenticationRequest;
//!
//! let request = AuthenticationRequest {
//!     user_id: Some("vinny".into()),
//! };
//!
//! let xml = encode(&request);
//! let back: AuthenticationRequest = decode_as(&xml).unwrap();
//! assert_eq!(request, back);
//! ```

pub use decode::{decode_as, decode_reply, decode_with};
pub use encode::{encode, encode_command, XSI_NS};

mod decode;
mod encode;
