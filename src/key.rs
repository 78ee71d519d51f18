//! `Sec-WebSocket-Key` generation.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use tracing::warn;

use crate::{b64, sha1};

/// RFC 6455 §1.3 GUID appended to the key before hashing.
pub const GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

pub const KEY_LEN: usize = 16;

/// The raw 16-byte nonce of one handshake attempt.
///
/// Not `Clone`: encoding consumes it, so one key feeds exactly one request.
#[derive(PartialEq, Eq)]
pub struct ClientKey {
    bytes: [u8; KEY_LEN],
    secure: bool,
}

impl fmt::Debug for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientKey")
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl ClientKey {
    /// Wraps caller-chosen bytes, e.g. the RFC 6455 sample nonce.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            bytes,
            secure: false,
        }
    }

    /// Whether the bytes came from the operating system's entropy source.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    pub fn encode(self) -> SecKey {
        SecKey(b64::encode(&self.bytes))
    }
}

/// Base64 text of a [`ClientKey`], as sent in `Sec-WebSocket-Key`.
#[derive(Debug, PartialEq, Eq)]
pub struct SecKey(String);

impl SecKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Sec-WebSocket-Accept` value a conforming server must answer with.
    pub fn expected_accept(&self) -> String {
        derive_accept_key(self.0.as_bytes())
    }
}

impl fmt::Display for SecKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `base64(sha1(key + GUID))`.
pub fn derive_accept_key(key: &[u8]) -> String {
    let mut hash = sha1::Sha1::new();
    hash.update(key);
    hash.update(GUID.as_bytes());
    b64::encode(hash.digest().as_ref())
}

/// Where key bytes come from.
///
/// `Fallback` is not cryptographically secure. That is acceptable only
/// because the key is a conformance nonce and protects nothing.
pub enum RandomSource {
    Secure,
    Fallback(SmallRng),
}

impl fmt::Debug for RandomSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secure => f.write_str("Secure"),
            Self::Fallback(_) => f.write_str("Fallback"),
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::Secure
    }
}

impl RandomSource {
    pub fn secure() -> Self {
        Self::Secure
    }

    /// Pseudo-random source seeded once, here, from the clock and process id.
    pub fn fallback() -> Self {
        Self::seeded(clock_seed())
    }

    /// Deterministic pseudo-random source.
    pub fn seeded(seed: u64) -> Self {
        Self::Fallback(SmallRng::seed_from_u64(seed))
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }

    /// Draws a fresh key.
    ///
    /// If the operating system source fails, this source downgrades itself
    /// to `Fallback` and stays there. The returned key reports where its
    /// bytes came from.
    pub fn generate(&mut self) -> ClientKey {
        self.generate_with(|bytes| OsRng.try_fill_bytes(bytes))
    }

    /// `generate`, with `entropy` standing in for the operating system source.
    fn generate_with<E: fmt::Display>(
        &mut self,
        entropy: impl FnOnce(&mut [u8]) -> Result<(), E>,
    ) -> ClientKey {
        let mut bytes = [0u8; KEY_LEN];
        if let Self::Secure = self {
            match entropy(&mut bytes) {
                Ok(()) => {
                    return ClientKey {
                        bytes,
                        secure: true,
                    }
                }
                Err(err) => {
                    warn!("secure entropy unavailable ({err}), using insecure fallback");
                    *self = Self::fallback();
                }
            }
        }
        if let Self::Fallback(rng) = self {
            rng.fill_bytes(&mut bytes);
        }
        ClientKey {
            bytes,
            secure: false,
        }
    }
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos() as u64);
    nanos ^ (u64::from(std::process::id()) << 32)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::{derive_accept_key, ClientKey, RandomSource, GUID, KEY_LEN};

    #[test]
    fn handshake() {
        assert_eq!(
            derive_accept_key(b"dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=",
        );
    }

    #[test]
    fn rfc_sample_nonce() {
        let key = ClientKey::from_bytes(*b"the sample nonce").encode();
        assert_eq!(key.as_str(), "dGhlIHNhbXBsZSBub25jZQ==");
        assert_eq!(key.expected_accept(), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
    }

    #[test]
    fn accept_matches_concatenation() {
        let key = "x3JJHMbDL1EzLkh9GBhXDw==";
        let mut seed = key.as_bytes().to_vec();
        seed.extend_from_slice(GUID.as_bytes());
        let digest = crate::sha1::sha1(&seed);
        assert_eq!(derive_accept_key(key.as_bytes()), crate::b64::encode(digest.as_ref()));
        assert_eq!(derive_accept_key(key.as_bytes()), "HSmrc0sMlYUkAGmm5OPpG2HaGWk=");
    }

    #[test]
    fn secure_source() {
        let mut source = RandomSource::secure();
        let key = source.generate();
        assert!(key.is_secure());
        assert!(source.is_secure());
        assert_eq!(key.bytes().len(), KEY_LEN);
        assert_eq!(key.encode().as_str().len(), 24);
    }

    #[test]
    fn secure_keys_differ() {
        let mut source = RandomSource::secure();
        let first = source.generate();
        let second = source.generate();
        assert_ne!(first.bytes(), second.bytes());
    }

    #[test]
    fn seeded_fallback_is_deterministic() {
        let mut a = RandomSource::seeded(42);
        let mut b = RandomSource::seeded(42);
        let mut c = RandomSource::seeded(43);
        let key = a.generate();
        assert!(!key.is_secure());
        assert!(!a.is_secure());
        assert_eq!(key.bytes(), b.generate().bytes());
        assert_ne!(a.generate().bytes(), c.generate().bytes());
    }

    #[test]
    fn fallback_advances() {
        let mut source = RandomSource::fallback();
        let first = source.generate();
        let second = source.generate();
        assert_ne!(first.bytes(), second.bytes());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_entropy_downgrades_to_fallback() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut source = RandomSource::secure();
        let key = tracing::subscriber::with_default(subscriber, || {
            source.generate_with(|_| Err(io::Error::other("no /dev/urandom")))
        });

        assert!(!key.is_secure());
        assert!(!source.is_secure());
        assert!(matches!(source, RandomSource::Fallback(_)));
        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("WARN"), "{log}");
        assert!(log.contains("no /dev/urandom"), "{log}");

        // Once downgraded, the entropy source is not consulted again.
        let next = source.generate_with(|_| -> Result<(), io::Error> {
            panic!("downgraded source asked for entropy")
        });
        assert!(!next.is_secure());
        assert_ne!(next.bytes(), key.bytes());
    }

    #[test]
    fn working_entropy_is_used_verbatim() {
        let mut source = RandomSource::secure();
        let key = source.generate_with(|bytes| {
            bytes.copy_from_slice(b"the sample nonce");
            Ok::<(), io::Error>(())
        });
        assert!(key.is_secure());
        assert_eq!(key.encode().as_str(), "dGhlIHNhbXBsZSBub25jZQ==");
    }

    #[test]
    fn debug_hides_key_bytes() {
        let key = ClientKey::from_bytes(*b"the sample nonce");
        assert_eq!(format!("{key:?}"), "ClientKey { secure: false, .. }");
    }
}
