//! Plain HTTP status check: one GET, compare the status code.

use tracing::debug;

use crate::config::{ProbeConfig, Target};
use crate::connect::Connect;
use crate::error::{Error, Result, TransportError};
use crate::handshake::send_request;
use crate::response::ResponseBuffer;

pub fn status_request(target: &Target) -> String {
    format!(
        "GET {path} HTTP/1.1\r\nHost: {authority}\r\nConnection: close\r\n\r\n",
        path = target.path,
        authority = target.authority(),
    )
}

/// Fetches `config.target` and checks that it answers with `expected`.
///
/// Only the status line is needed, so a response cut short by EOF or by the
/// buffer limit is still judged on what arrived.
pub fn check_status<C: Connect>(connector: &C, config: &ProbeConfig, expected: u16) -> Result<u16> {
    let target = &config.target;
    let mut stream = connector
        .connect(&target.host, target.port)
        .map_err(|source| Error::Connection {
            addr: target.authority(),
            source,
        })?;

    send_request(&mut stream, status_request(target).as_bytes())?;

    let mut response = ResponseBuffer::new(config.response_limit);
    let read = response.read_from(&mut stream);
    drop(stream);
    let read = read?;
    debug!(?read, bytes = response.len(), "response received");

    if response.is_empty() {
        return Err(TransportError::Closed { received: 0 }.into());
    }

    let actual = response.response().status_code()?;
    if actual != expected {
        return Err(Error::UnexpectedStatus { expected, actual });
    }
    Ok(actual)
}
