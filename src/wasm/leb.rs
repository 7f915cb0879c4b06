//! LEB128 helpers over `Vec<u8>` buffers.
//!
//! The binary lifter builds everything in memory, so these wrappers adapt the
//! io-based `leb128` codec to plain byte vectors. Encodings are minimal
//! length; signed values sign-extend the top bit of the final byte.

use crate::errors::LiftError;

pub fn encode_u32(out: &mut Vec<u8>, value: u32) {
    leb128::write::unsigned(out, u64::from(value)).expect("writing to a Vec cannot fail");
}

pub fn encode_u64(out: &mut Vec<u8>, value: u64) {
    leb128::write::unsigned(out, value).expect("writing to a Vec cannot fail");
}

pub fn encode_usize(out: &mut Vec<u8>, value: usize) {
    leb128::write::unsigned(out, value as u64).expect("writing to a Vec cannot fail");
}

pub fn encode_i32(out: &mut Vec<u8>, value: i32) {
    leb128::write::signed(out, i64::from(value)).expect("writing to a Vec cannot fail");
}

pub fn encode_i64(out: &mut Vec<u8>, value: i64) {
    leb128::write::signed(out, value).expect("writing to a Vec cannot fail");
}

/// Returns an unsigned LEB128 as a standalone byte vector.
pub fn unsigned(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_u64(&mut out, value);
    out
}

/// Returns a signed LEB128 as a standalone byte vector.
pub fn signed(value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_i64(&mut out, value);
    out
}

pub fn decode_u64(bytes: &[u8]) -> Result<(u64, usize), LiftError> {
    let mut reader = bytes;
    let value = leb128::read::unsigned(&mut reader)
        .map_err(|e| LiftError::fatal(format!("malformed unsigned LEB128: {e}")))?;
    Ok((value, bytes.len() - reader.len()))
}

pub fn decode_i64(bytes: &[u8]) -> Result<(i64, usize), LiftError> {
    let mut reader = bytes;
    let value = leb128::read::signed(&mut reader)
        .map_err(|e| LiftError::fatal(format!("malformed signed LEB128: {e}")))?;
    Ok((value, bytes.len() - reader.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_unsigned_encodings() {
        assert_eq!(unsigned(0), vec![0x00]);
        assert_eq!(unsigned(127), vec![0x7F]);
        assert_eq!(unsigned(128), vec![0x80, 0x01]);
        assert_eq!(unsigned(624485), vec![0xE5, 0x8E, 0x26]);
    }

    #[test]
    fn known_signed_encodings() {
        assert_eq!(signed(0), vec![0x00]);
        assert_eq!(signed(41), vec![0x29]);
        assert_eq!(signed(1), vec![0x01]);
        assert_eq!(signed(-1), vec![0x7F]);
        assert_eq!(signed(-123456), vec![0xC0, 0xBB, 0x78]);
        // 64 needs a continuation byte: bit 6 is the sign bit.
        assert_eq!(signed(64), vec![0xC0, 0x00]);
        assert_eq!(signed(-64), vec![0x40]);
    }

    proptest! {
        #[test]
        fn unsigned_round_trips(value in any::<u64>()) {
            let encoded = unsigned(value);
            let (decoded, consumed) = decode_u64(&encoded).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, encoded.len());
        }

        #[test]
        fn signed_round_trips(value in any::<i64>()) {
            let encoded = signed(value);
            let (decoded, consumed) = decode_i64(&encoded).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, encoded.len());
        }

        #[test]
        fn unsigned_encodings_are_minimal(value in any::<u64>()) {
            let encoded = unsigned(value);
            // The last byte clears its continuation bit; all others set it.
            let (last, rest) = encoded.split_last().unwrap();
            prop_assert_eq!(last & 0x80, 0);
            for byte in rest {
                prop_assert_eq!(byte & 0x80, 0x80);
            }
            // A shorter encoding would have to drop a non-redundant byte.
            if encoded.len() > 1 {
                prop_assert!(*last != 0);
            }
        }
    }
}
