//! Program image loading.
//!
//! A program image is a sequence of 16-bit words in host byte order; the
//! architecture is word-addressed and never sees bytes, so byte-level
//! endianness is whatever the host wrote.

/// Convert a raw byte image into words, host byte order. An odd trailing
/// byte is padded with a zero byte to form the final word.
#[must_use]
pub fn words_from_bytes(bytes: &[u8]) -> Vec<u16> {
    let mut words = Vec::with_capacity(bytes.len().div_ceil(2));
    let mut chunks = bytes.chunks_exact(2);
    for pair in &mut chunks {
        words.push(u16::from_ne_bytes([pair[0], pair[1]]));
    }
    if let [last] = chunks.remainder() {
        words.push(u16::from_ne_bytes([*last, 0]));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_host_order_words() {
        let expected = [0x7C01_u16, 0x0030, 0x85C3];
        let mut bytes = Vec::new();
        for word in expected {
            bytes.extend_from_slice(&word.to_ne_bytes());
        }
        assert_eq!(words_from_bytes(&bytes), expected);
    }

    #[test]
    fn odd_trailing_byte_is_zero_padded() {
        let words = words_from_bytes(&[0xAB]);
        assert_eq!(words, [u16::from_ne_bytes([0xAB, 0])]);
    }

    #[test]
    fn empty_image_is_empty() {
        assert!(words_from_bytes(&[]).is_empty());
    }
}
