use std::time::Duration;

use crate::error::{Error, Result};
use crate::response::DEFAULT_LIMIT;

/// The endpoint a probe talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Result<Self> {
        let host = host.into();
        let path = path.into();
        if host.is_empty() {
            return Err(Error::Usage("--host must not be empty".to_owned()));
        }
        if !path.starts_with('/') {
            return Err(Error::Usage(format!("--path must start with '/', got {path:?}")));
        }
        if host.contains(char::is_whitespace) || path.contains(char::is_whitespace) {
            return Err(Error::Usage("--host and --path must not contain whitespace".to_owned()));
        }
        Ok(Self { host, port, path })
    }

    /// `host:port`, as used in the `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings for one handshake or status check run.
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    pub target: Target,
    /// Response bytes accepted before giving up on the header block.
    pub response_limit: usize,
    /// Applied to connect, read and write. `None` blocks indefinitely.
    pub timeout: Option<Duration>,
}

impl ProbeConfig {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            response_limit: DEFAULT_LIMIT,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_response_limit(mut self, limit: usize) -> Self {
        self.response_limit = limit;
        self
    }
}
