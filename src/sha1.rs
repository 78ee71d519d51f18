//! SHA-1 (FIPS 180-1).
//!
//! Only used to derive `Sec-WebSocket-Accept`, never for anything that needs
//! collision resistance.

use std::fmt;

const BLOCK_LEN: usize = 64;
const LENGTH_OFFSET: usize = BLOCK_LEN - 8;

const INITIAL_STATE: [u32; 5] = [0x6745_2301, 0xEFCD_AB89, 0x98BA_DCFE, 0x1032_5476, 0xC3D2_E1F0];

/// A 160-bit SHA-1 digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Digest([u8; 20]);

impl Digest {
    pub fn bytes(&self) -> [u8; 20] {
        self.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Incremental SHA-1 hasher.
#[derive(Clone)]
pub struct Sha1 {
    state: [u32; 5],
    block: [u8; BLOCK_LEN],
    // bytes buffered in `block`
    pending: usize,
    // total message length in bytes
    len: u64,
}

impl Default for Sha1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha1 {
    pub fn new() -> Self {
        Self {
            state: INITIAL_STATE,
            block: [0; BLOCK_LEN],
            pending: 0,
            len: 0,
        }
    }

    pub fn update(&mut self, mut data: &[u8]) {
        self.len = self.len.wrapping_add(data.len() as u64);

        if self.pending > 0 {
            let take = data.len().min(BLOCK_LEN - self.pending);
            self.block[self.pending..self.pending + take].copy_from_slice(&data[..take]);
            self.pending += take;
            data = &data[take..];
            if self.pending < BLOCK_LEN {
                return;
            }
            compress(&mut self.state, &self.block);
            self.pending = 0;
        }

        let mut blocks = data.chunks_exact(BLOCK_LEN);
        for block in &mut blocks {
            compress(&mut self.state, block);
        }
        let rest = blocks.remainder();
        self.block[..rest.len()].copy_from_slice(rest);
        self.pending = rest.len();
    }

    /// Pads the message and returns its digest.
    pub fn digest(&self) -> Digest {
        let mut state = self.state;
        let mut block = [0u8; BLOCK_LEN];
        block[..self.pending].copy_from_slice(&self.block[..self.pending]);
        block[self.pending] = 0x80;

        // No room left for the length: flush this block and pad another.
        if self.pending >= LENGTH_OFFSET {
            compress(&mut state, &block);
            block = [0; BLOCK_LEN];
        }

        let bit_len = self.len.wrapping_mul(8);
        block[LENGTH_OFFSET..].copy_from_slice(&bit_len.to_be_bytes());
        compress(&mut state, &block);

        let mut out = [0u8; 20];
        for (word, bytes) in state.iter().zip(out.chunks_exact_mut(4)) {
            bytes.copy_from_slice(&word.to_be_bytes());
        }
        Digest(out)
    }
}

/// One-shot digest of `data`.
pub fn sha1(data: &[u8]) -> Digest {
    let mut hash = Sha1::new();
    hash.update(data);
    hash.digest()
}

// `block` is always exactly `BLOCK_LEN` bytes.
fn compress(state: &mut [u32; 5], block: &[u8]) {
    let mut w = [0u32; 80];
    for (word, bytes) in w.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    for i in 16..80 {
        w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
    }

    let [mut a, mut b, mut c, mut d, mut e] = *state;

    for (i, word) in w.iter().enumerate() {
        let (f, k) = match i {
            0..=19 => ((b & c) | (!b & d), 0x5A82_7999),
            20..=39 => (b ^ c ^ d, 0x6ED9_EBA1),
            40..=59 => ((b & c) | (b & d) | (c & d), 0x8F1B_BCDC),
            _ => (b ^ c ^ d, 0xCA62_C1D6),
        };
        let temp = a
            .rotate_left(5)
            .wrapping_add(f)
            .wrapping_add(e)
            .wrapping_add(k)
            .wrapping_add(*word);
        e = d;
        d = c;
        c = b.rotate_left(30);
        b = a;
        a = temp;
    }

    for (word, value) in state.iter_mut().zip([a, b, c, d, e]) {
        *word = word.wrapping_add(value);
    }
}
