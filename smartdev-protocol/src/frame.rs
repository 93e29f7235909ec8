//! COBS framing for the serial link
//!
//! Messages are byte-stuffed with Consistent Overhead Byte Stuffing so that
//! the delimiter (`0x00`) never appears inside a frame:
//!
//! ```text
//! message:  11 04 FF FF 80 00 95
//! frame:    06 11 04 FF FF 80 02 95 | 00
//!           ^code             ^code   ^delimiter (added by the sender)
//! ```
//!
//! Each code byte `n` is followed by `n - 1` data bytes and stands for a
//! zero, except `0xFF`, which stands for 254 data bytes with no zero. The
//! implied zero after the last block is dropped.
//!
//! Encoding `n` bytes adds at most `n / 254 + 1` bytes of overhead.

/// Byte that terminates frames on the wire
pub const MESSAGE_DELIMITER: u8 = 0x00;

/// Errors that can occur while encoding or decoding a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Destination buffer too small for the output
    BufferOverflow,
    /// A code byte promised more bytes than the frame holds
    InputTooShort,
    /// A delimiter byte appeared inside the frame
    ZeroByte,
}

/// Largest possible encoding of `len` input bytes
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / 254 + 1
}

/// Encode `src` into `dst`, returning the frame length
///
/// The output contains no [`MESSAGE_DELIMITER`] bytes and does not include
/// the trailing delimiter.
pub fn encode(src: &[u8], dst: &mut [u8]) -> Result<usize, FrameError> {
    if dst.is_empty() {
        return Err(FrameError::BufferOverflow);
    }

    let mut code_idx = 0;
    let mut out = 1;
    let mut code: u8 = 1;

    for (i, &byte) in src.iter().enumerate() {
        if byte == 0 {
            dst[code_idx] = code;
            code_idx = out;
            out += 1;
            code = 1;
            if out > dst.len() {
                return Err(FrameError::BufferOverflow);
            }
            continue;
        }

        *dst.get_mut(out).ok_or(FrameError::BufferOverflow)? = byte;
        out += 1;
        code += 1;

        // A full block only opens a new one if more input follows
        if code == 0xFF && i + 1 < src.len() {
            dst[code_idx] = code;
            code_idx = out;
            out += 1;
            code = 1;
            if out > dst.len() {
                return Err(FrameError::BufferOverflow);
            }
        }
    }

    dst[code_idx] = code;
    Ok(out)
}

/// Decode a frame (delimiter already stripped) into `dst`
///
/// Returns the decoded length. An empty frame decodes to nothing.
pub fn decode(src: &[u8], dst: &mut [u8]) -> Result<usize, FrameError> {
    let mut read = 0;
    let mut out = 0;

    while read < src.len() {
        let code = src[read];
        read += 1;
        if code == 0 {
            return Err(FrameError::ZeroByte);
        }

        let len = (code - 1) as usize;
        if read + len > src.len() {
            return Err(FrameError::InputTooShort);
        }

        let block = &src[read..read + len];
        if block.contains(&0) {
            return Err(FrameError::ZeroByte);
        }
        dst.get_mut(out..out + len)
            .ok_or(FrameError::BufferOverflow)?
            .copy_from_slice(block);
        read += len;
        out += len;

        if read < src.len() && code != 0xFF {
            *dst.get_mut(out).ok_or(FrameError::BufferOverflow)? = 0;
            out += 1;
        }
    }

    Ok(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encoded_frames_never_contain_the_delimiter(
            data in proptest::collection::vec(any::<u8>(), 0..700)
        ) {
            let mut frame = [0u8; 720];
            let len = encode(&data, &mut frame).unwrap();
            prop_assert!(len <= max_encoded_len(data.len()));
            prop_assert!(!frame[..len].contains(&MESSAGE_DELIMITER));

            let mut decoded = [0u8; 700];
            let out = decode(&frame[..len], &mut decoded).unwrap();
            prop_assert_eq!(&decoded[..out], &data[..]);
        }

        #[test]
        fn undersized_destinations_report_overflow(
            data in proptest::collection::vec(any::<u8>(), 1..300)
        ) {
            let mut frame = [0u8; 310];
            let len = encode(&data, &mut frame).unwrap();
            let mut short = [0u8; 310];
            prop_assert_eq!(
                encode(&data, &mut short[..len - 1]),
                Err(FrameError::BufferOverflow)
            );
        }
    }
}
