// NOTE: See `https://datatracker.ietf.org/doc/html/rfc6455#section-4.2`.

//! Conformance probes for HTTP endpoints: a WebSocket opening handshake
//! verifier and a plain status-code check.

pub mod b64;
pub mod cli;
pub mod config;
pub mod connect;
pub mod error;
pub mod handshake;
pub mod key;
pub mod log;
pub mod response;
pub mod sha1;
pub mod status;

pub use config::{ProbeConfig, Target};
pub use connect::{Connect, TcpConnector};
pub use error::{Error, Result, TransportError};
pub use handshake::{Handshake, HandshakeResult};
pub use key::{ClientKey, RandomSource};
pub use status::check_status;
