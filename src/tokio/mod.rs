//! Asynchronous transports and client, available with the `tokio` feature.
//!
//! The same dispatch surface as the blocking client, with suspension points
//! at every I/O boundary. Codec work is offloaded to a small blocking pool so
//! concurrent dispatches do not monopolise the event thread.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::transport::{find_terminator, scan_resume};

mod client;
mod transport;

pub use client::AsyncClient;
pub use transport::{AsyncSoapTransport, AsyncTcpTransport, AsyncTransport};

/// Frames `BroadsoftDocument` messages on the literal terminator.
///
/// The decoder accumulates bytes until `</BroadsoftDocument>` is observed and
/// yields the complete message including the terminator; intermediate XML
/// structure is never interpreted. The encoder passes frames through
/// unchanged.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OciClientCodec {
    scanned: usize,
}

impl OciClientCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for OciClientCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match find_terminator(src, self.scanned) {
            Some(end) => {
                self.scanned = 0;
                Ok(Some(src.split_to(end).freeze()))
            }
            None => {
                self.scanned = scan_resume(src.len());
                Ok(None)
            }
        }
    }
}

impl Encoder<Bytes> for OciClientCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}
