//! Client side of the RFC 6455 opening handshake, run as a conformance check.

use std::fmt;
use std::io::Write;

use tracing::{debug, info};

use crate::config::{ProbeConfig, Target};
use crate::connect::Connect;
use crate::error::{Error, Result, TransportError};
use crate::key::{ClientKey, RandomSource, SecKey};
use crate::response::{ReadStatus, ResponseBuffer};

pub const SWITCHING_PROTOCOLS: u16 = 101;

const ACCEPT_HEADER: &str = "Sec-WebSocket-Accept";

/// The upgrade request for `target`, byte for byte.
pub fn upgrade_request(target: &Target, key: &SecKey) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {authority}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         \r\n",
        path = target.path,
        authority = target.authority(),
    )
}

/// Sends `request` with a single write. A short write is not retried.
pub(crate) fn send_request<W: Write>(stream: &mut W, request: &[u8]) -> Result<()> {
    let written = stream.write(request).map_err(TransportError::Io)?;
    if written != request.len() {
        return Err(TransportError::ShortWrite {
            written,
            expected: request.len(),
        }
        .into());
    }
    stream.flush().map_err(TransportError::Io)?;
    Ok(())
}

/// Checks a received response against the key that was sent.
pub fn verify(response: &ResponseBuffer, key: &SecKey) -> Result<String> {
    let response = response.response();

    let status = response.status_code()?;
    if status != SWITCHING_PROTOCOLS {
        return Err(Error::UnexpectedStatus {
            expected: SWITCHING_PROTOCOLS,
            actual: status,
        });
    }

    let accept = response
        .header(ACCEPT_HEADER)
        .ok_or(Error::MissingAcceptHeader)?;
    let expected = key.expected_accept();
    if accept != expected.as_bytes() {
        return Err(Error::DigestMismatch {
            expected,
            actual: String::from_utf8_lossy(accept).into_owned(),
        });
    }
    Ok(expected)
}

enum State<S> {
    Init,
    Connected(S),
    RequestSent { stream: S, key: SecKey },
    ResponseReceived { response: ResponseBuffer, key: SecKey },
    Verified { accept: String },
    Failed(Error),
}

impl<S> State<S> {
    fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Connected(_) => "connected",
            Self::RequestSent { .. } => "request-sent",
            Self::ResponseReceived { .. } => "response-received",
            Self::Verified { .. } => "verified",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcome of one handshake attempt.
#[derive(Debug)]
pub enum HandshakeResult {
    Verified { accept: String },
    Failed(Error),
}

impl HandshakeResult {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Verified { .. } => None,
            Self::Failed(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Verified { accept } => Ok(accept),
            Self::Failed(err) => Err(err),
        }
    }
}

impl fmt::Display for HandshakeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified { accept } => {
                write!(f, "handshake verified (Sec-WebSocket-Accept: {accept})")
            }
            Self::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// One-shot handshake driver.
pub struct Handshake<C> {
    connector: C,
    config: ProbeConfig,
    source: RandomSource,
    pinned: Option<ClientKey>,
}

impl<C: Connect> Handshake<C> {
    pub fn new(connector: C, config: ProbeConfig) -> Self {
        Self {
            connector,
            config,
            source: RandomSource::secure(),
            pinned: None,
        }
    }

    pub fn with_source(mut self, source: RandomSource) -> Self {
        self.source = source;
        self
    }

    /// Uses `key` instead of drawing one from the random source.
    pub fn with_key(mut self, key: ClientKey) -> Self {
        self.pinned = Some(key);
        self
    }

    pub fn run(mut self) -> HandshakeResult {
        let mut state = State::Init;
        loop {
            debug!(state = state.name());
            state = match state {
                State::Init => {
                    let target = &self.config.target;
                    match self.connector.connect(&target.host, target.port) {
                        Ok(stream) => State::Connected(stream),
                        Err(source) => State::Failed(Error::Connection {
                            addr: target.authority(),
                            source,
                        }),
                    }
                }
                State::Connected(mut stream) => {
                    let key = self.take_key().encode();
                    let request = upgrade_request(&self.config.target, &key);
                    match send_request(&mut stream, request.as_bytes()) {
                        Ok(()) => State::RequestSent { stream, key },
                        Err(err) => State::Failed(err),
                    }
                }
                State::RequestSent { mut stream, key } => {
                    let mut response = ResponseBuffer::new(self.config.response_limit);
                    let status = response.read_from(&mut stream);
                    drop(stream);
                    match status {
                        Ok(ReadStatus::Complete) => State::ResponseReceived { response, key },
                        Ok(ReadStatus::Exhausted) => State::Failed(Error::BufferExhausted {
                            limit: response.limit(),
                        }),
                        Ok(ReadStatus::Closed) => State::Failed(
                            TransportError::Closed {
                                received: response.len(),
                            }
                            .into(),
                        ),
                        Err(err) => State::Failed(err),
                    }
                }
                State::ResponseReceived { response, key } => match verify(&response, &key) {
                    Ok(accept) => State::Verified { accept },
                    Err(err) => State::Failed(err),
                },
                State::Verified { accept } => {
                    info!(%accept, "handshake verified");
                    return HandshakeResult::Verified { accept };
                }
                State::Failed(err) => {
                    info!(kind = err.kind(), "handshake failed: {err}");
                    return HandshakeResult::Failed(err);
                }
            };
        }
    }

    fn take_key(&mut self) -> ClientKey {
        match self.pinned.take() {
            Some(key) => key,
            None => {
                let key = self.source.generate();
                debug!(secure = key.is_secure(), "generated client key");
                key
            }
        }
    }
}
