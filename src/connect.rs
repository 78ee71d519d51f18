use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

/// Opens the byte stream a probe runs over.
pub trait Connect {
    type Stream: Read + Write;

    fn connect(&self, host: &str, port: u16) -> io::Result<Self::Stream>;
}

impl<F, S> Connect for F
where
    F: Fn(&str, u16) -> io::Result<S>,
    S: Read + Write,
{
    type Stream = S;

    fn connect(&self, host: &str, port: u16) -> io::Result<S> {
        self(host, port)
    }
}

/// Plain TCP, trying every resolved address in order.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpConnector {
    timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Connect for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let Some(timeout) = self.timeout else {
            return TcpStream::connect((host, port));
        };

        let mut last_error = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    return Ok(stream);
                }
                Err(err) => {
                    debug!(%addr, "connect failed: {err}");
                    last_error = Some(err);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
        }))
    }
}
