const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Length of the padded encoding of `n` input bytes.
pub const fn encoded_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}

fn encode_group(chunk: &[u8]) -> [u8; 4] {
    let b0 = u32::from(chunk[0]);
    let b1 = chunk.get(1).copied().map_or(0, u32::from);
    let b2 = chunk.get(2).copied().map_or(0, u32::from);
    let triple = (b0 << 16) | (b1 << 8) | b2;

    let sextet = |shift: u32| ALPHABET[((triple >> shift) & 0x3F) as usize];
    [
        sextet(18),
        sextet(12),
        if chunk.len() > 1 { sextet(6) } else { b'=' },
        if chunk.len() > 2 { sextet(0) } else { b'=' },
    ]
}

/// Encodes `input` into `out`, returning the number of bytes written.
///
/// Only whole 4-byte groups are written. If `out` is too small the encoding
/// is truncated at the last group that fits.
pub fn encode_into(input: &[u8], out: &mut [u8]) -> usize {
    let mut written = 0;
    for chunk in input.chunks(3) {
        let Some(slot) = out.get_mut(written..written + 4) else {
            break;
        };
        slot.copy_from_slice(&encode_group(chunk));
        written += 4;
    }
    written
}

/// Standard base64 with `=` padding.
pub fn encode(input: &[u8]) -> String {
    let mut output = String::with_capacity(encoded_len(input.len()));
    for chunk in input.chunks(3) {
        output.extend(encode_group(chunk).map(char::from));
    }
    output
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use super::{encode, encode_into, encoded_len};

    #[test]
    fn rfc4648_vectors() {
        let vectors: [(&[u8], &str); 7] = [
            (b"", ""),
            (b"f", "Zg=="),
            (b"fo", "Zm8="),
            (b"foo", "Zm9v"),
            (b"foob", "Zm9vYg=="),
            (b"fooba", "Zm9vYmE="),
            (b"foobar", "Zm9vYmFy"),
        ];
        for (input, expected) in vectors {
            assert_eq!(encode(input), expected);
        }
    }

    #[test]
    fn websocket_nonce() {
        assert_eq!(encode(b"the sample nonce"), "dGhlIHNhbXBsZSBub25jZQ==");
    }

    #[test]
    fn round_trip_and_padding() {
        let bytes: Vec<u8> = (0..=255u8).rev().cycle().take(100).collect();
        for len in 0..bytes.len() {
            let input = &bytes[..len];
            let text = encode(input);
            assert_eq!(text.len(), encoded_len(len));
            assert_eq!(STANDARD.decode(&text).unwrap(), input);

            let padding = text.bytes().rev().take_while(|&b| b == b'=').count();
            assert_eq!(padding, [0, 2, 1][len % 3], "len {len}");
        }
    }

    #[test]
    fn high_bits() {
        assert_eq!(encode(&[0xFF, 0xFF, 0xFF]), "////");
        assert_eq!(encode(&[0xFB, 0xEF, 0xBE]), "++++");
        assert_eq!(encode(&[0x00]), "AA==");
    }

    #[test]
    fn truncates_into_small_buffer() {
        let mut out = [0u8; 10];
        let written = encode_into(b"foobar!", &mut out);
        assert_eq!(written, 8);
        assert_eq!(&out[..written], b"Zm9vYmFy");
        assert_eq!(&out[written..], &[0, 0]);

        let mut empty = [];
        assert_eq!(encode_into(b"foo", &mut empty), 0);
    }

    #[test]
    fn encode_into_exact_fit() {
        let mut out = [0u8; 24];
        assert_eq!(encode_into(b"the sample nonce", &mut out), 24);
        assert_eq!(&out, b"dGhlIHNhbXBsZSBub25jZQ==");
    }
}
