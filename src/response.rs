//! Just enough HTTP/1.1 response parsing for a handshake check.

use std::io::{ErrorKind, Read};

use tracing::trace;

use crate::error::{Error, Result, TransportError};

const SIGNATURE: &[u8] = b"HTTP/1.1";
const END_OF_HEADERS: &[u8] = b"\r\n\r\n";
const CRLF: &[u8] = b"\r\n";

/// Default capacity of a [`ResponseBuffer`].
pub const DEFAULT_LIMIT: usize = 4096;

const READ_CHUNK: usize = 1024;

/// How a [`ResponseBuffer::read_from`] loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadStatus {
    /// `\r\n\r\n` was received.
    Complete,
    /// The peer closed the connection first.
    Closed,
    /// The capacity was reached first.
    Exhausted,
}

/// Receive buffer that never grows past `limit` bytes.
#[derive(Debug)]
pub struct ResponseBuffer {
    data: Vec<u8>,
    limit: usize,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl ResponseBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            data: Vec::with_capacity(limit.min(DEFAULT_LIMIT)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        find(&self.data, END_OF_HEADERS).is_some()
    }

    pub fn response(&self) -> Response<'_> {
        Response::new(&self.data)
    }

    /// Reads until the end of the header block, a full buffer, or EOF.
    ///
    /// Interrupted reads are retried. Every other I/O error is returned.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> Result<ReadStatus> {
        loop {
            if self.is_complete() {
                return Ok(ReadStatus::Complete);
            }
            if self.data.len() >= self.limit {
                return Ok(ReadStatus::Exhausted);
            }

            let start = self.data.len();
            let want = (self.limit - start).min(READ_CHUNK);
            self.data.resize(start + want, 0);
            match reader.read(&mut self.data[start..]) {
                Ok(0) => {
                    self.data.truncate(start);
                    return Ok(ReadStatus::Closed);
                }
                Ok(n) => {
                    trace!(bytes = n, total = start + n, "response chunk");
                    self.data.truncate(start + n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    self.data.truncate(start);
                }
                Err(err) => {
                    self.data.truncate(start);
                    return Err(TransportError::Io(err).into());
                }
            }
        }
    }
}

/// A borrowed view over a possibly incomplete HTTP response.
#[derive(Clone, Copy, Debug)]
pub struct Response<'a> {
    buf: &'a [u8],
}

impl<'a> Response<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// The status code of an `HTTP/1.1` status line.
    pub fn status_code(&self) -> Result<u16> {
        if !self.buf.starts_with(SIGNATURE) {
            return Err(Error::MalformedStatusLine);
        }
        let line = match find(self.buf, CRLF) {
            Some(end) => &self.buf[..end],
            None => self.buf,
        };
        let space = line
            .iter()
            .position(|&b| b == b' ')
            .ok_or(Error::MalformedStatusLine)?;
        let rest = &line[space + 1..];
        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Err(Error::MalformedStatusLine);
        }
        std::str::from_utf8(&rest[..digits])
            .ok()
            .and_then(|code| code.parse().ok())
            .ok_or(Error::MalformedStatusLine)
    }

    pub fn header(&self, name: &str) -> Option<&'a [u8]> {
        header_value(self.buf, name)
    }
}

/// Case-insensitive lookup of `name` among the terminated lines of `buf`.
///
/// Leading spaces of the value are skipped and the value ends at the first
/// `\r` or `\n`. Scanning stops at the blank line closing the header block
/// and at the first line without a `\r\n`.
///
/// A trailing line that is still missing its `\r\n` never matches, even
/// though it may already hold a plausible value. Such a value can be a
/// truncated prefix of the real one.
pub fn header_value<'a>(buf: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let name = name.as_bytes();
    let mut rest = buf;
    while let Some(end) = find(rest, CRLF) {
        let line = &rest[..end];
        if line.is_empty() {
            return None;
        }
        if line.len() > name.len() + 1
            && line[name.len()] == b':'
            && line[..name.len()].eq_ignore_ascii_case(name)
        {
            let value = &line[name.len() + 1..];
            let start = value.iter().take_while(|&&b| b == b' ').count();
            let value = &value[start..];
            let len = value
                .iter()
                .position(|&b| b == b'\r' || b == b'\n')
                .unwrap_or(value.len());
            return Some(&value[..len]);
        }
        rest = &rest[end + CRLF.len()..];
    }
    None
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
