//! Sample codec: raw hardware slots ↔ normalized f32 amplitudes.
//!
//! [`encode`] maps an amplitude in [-1, 1] into one sample slot according
//! to its [`SampleFormat`]; [`decode`] maps back. Float formats store the
//! IEEE-754 bytes directly in the declared byte order. Integer formats
//! scale by the largest magnitude the width can hold, truncate toward
//! negative infinity, and store two's complement.
//!
//! Byte-order correction happens by choosing the `to_be_bytes` /
//! `to_le_bytes` family for the declared order, which is a no-op exactly
//! when the declared order matches the host's.

use crate::format::{Endianness, SampleEncoding, SampleFormat, SampleWidth};
use crate::{Error, Result};

/// Largest positive value a signed integer of the given width can hold,
/// as the scaling factor between normalized amplitudes and raw samples.
#[inline]
pub fn max_magnitude(width: SampleWidth) -> f64 {
    (((1u64 << (width.bits() - 1)) - 1) as f64).max(1.0)
}

fn check_slot(len: usize, format: SampleFormat) -> Result<()> {
    if len != format.bytes() {
        return Err(Error::UnsupportedFormat(format!(
            "slot is {len} bytes but format {format} needs {}",
            format.bytes()
        )));
    }
    Ok(())
}

/// Write a normalized amplitude into one sample slot.
///
/// The slot must be exactly `format.bytes()` long. Values outside
/// [-1, 1] are stored as-is for float formats and will wrap the integer
/// range for integer formats; callers keep amplitudes normalized.
pub fn encode(slot: &mut [u8], format: SampleFormat, value: f32) -> Result<()> {
    check_slot(slot.len(), format)?;
    match (format.encoding(), format.width()) {
        (SampleEncoding::Float, SampleWidth::B4) => {
            let bytes = match format.endian() {
                Endianness::Big => value.to_be_bytes(),
                Endianness::Little => value.to_le_bytes(),
            };
            slot.copy_from_slice(&bytes);
        }
        (SampleEncoding::Float, SampleWidth::B8) => {
            let bytes = match format.endian() {
                Endianness::Big => f64::from(value).to_be_bytes(),
                Endianness::Little => f64::from(value).to_le_bytes(),
            };
            slot.copy_from_slice(&bytes);
        }
        (SampleEncoding::Float, _) => {
            // Unreachable for validated formats; kept panic-free.
            return Err(Error::UnsupportedFormat(format!("{format}")));
        }
        (SampleEncoding::Int, width) => {
            let scaled = (f64::from(value) * max_magnitude(width)).floor() as i64;
            let n = width.bytes();
            match format.endian() {
                Endianness::Big => slot.copy_from_slice(&scaled.to_be_bytes()[8 - n..]),
                Endianness::Little => slot.copy_from_slice(&scaled.to_le_bytes()[..n]),
            }
        }
    }
    Ok(())
}

/// Read a normalized amplitude out of one sample slot.
///
/// The slot must be exactly `format.bytes()` long.
pub fn decode(slot: &[u8], format: SampleFormat) -> Result<f32> {
    check_slot(slot.len(), format)?;
    let value = match (format.encoding(), format.width()) {
        (SampleEncoding::Float, SampleWidth::B4) => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(slot);
            match format.endian() {
                Endianness::Big => f32::from_be_bytes(bytes),
                Endianness::Little => f32::from_le_bytes(bytes),
            }
        }
        (SampleEncoding::Float, SampleWidth::B8) => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(slot);
            let wide = match format.endian() {
                Endianness::Big => f64::from_be_bytes(bytes),
                Endianness::Little => f64::from_le_bytes(bytes),
            };
            wide as f32
        }
        (SampleEncoding::Float, _) => {
            return Err(Error::UnsupportedFormat(format!("{format}")));
        }
        (SampleEncoding::Int, width) => {
            let n = width.bytes();
            let shift = 64 - width.bits();
            // Place the slot's bytes at the significant end, then sign
            // extend with an arithmetic shift.
            let mut bytes = [0u8; 8];
            let raw = match format.endian() {
                Endianness::Big => {
                    bytes[..n].copy_from_slice(slot);
                    i64::from_be_bytes(bytes) >> shift
                }
                Endianness::Little => {
                    bytes[8 - n..].copy_from_slice(slot);
                    i64::from_le_bytes(bytes) >> shift
                }
            };
            (raw as f64 / max_magnitude(width)) as f32
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_formats() -> Vec<SampleFormat> {
        let mut formats = Vec::new();
        for endian in [Endianness::Big, Endianness::Little] {
            for bytes in [2usize, 3, 4, 8] {
                formats.push(SampleFormat::from_bytes(bytes, SampleEncoding::Int, endian).unwrap());
            }
            for bytes in [4usize, 8] {
                formats
                    .push(SampleFormat::from_bytes(bytes, SampleEncoding::Float, endian).unwrap());
            }
        }
        formats
    }

    /// One quantization step for a format, in normalized amplitude.
    fn quantum(format: SampleFormat) -> f32 {
        match format.encoding() {
            SampleEncoding::Float => f32::EPSILON,
            SampleEncoding::Int => (1.0 / max_magnitude(format.width())) as f32,
        }
    }

    #[test]
    fn test_round_trip_all_formats() {
        for format in all_formats() {
            let mut slot = vec![0u8; format.bytes()];
            for v in [-1.0f32, -0.5, 0.0, 0.5, 0.999_94] {
                encode(&mut slot, format, v).unwrap();
                let back = decode(&slot, format).unwrap();
                assert!(
                    (back - v).abs() <= quantum(format) + f32::EPSILON,
                    "{format}: wrote {v}, read {back}"
                );
            }
        }
    }

    #[test]
    fn test_integer_scaling_truncates_toward_negative_infinity() {
        let format = SampleFormat::from_bytes(2, SampleEncoding::Int, Endianness::Little).unwrap();
        let mut slot = [0u8; 2];

        encode(&mut slot, format, 1.0).unwrap();
        assert_eq!(i16::from_le_bytes(slot), i16::MAX);

        encode(&mut slot, format, -1.0).unwrap();
        assert_eq!(i16::from_le_bytes(slot), -i16::MAX);

        // Tiny negative amplitudes floor to -1, not to 0.
        encode(&mut slot, format, -1e-9).unwrap();
        assert_eq!(i16::from_le_bytes(slot), -1);

        encode(&mut slot, format, 0.0).unwrap();
        assert_eq!(i16::from_le_bytes(slot), 0);
    }

    #[test]
    fn test_endianness_invariance() {
        // Writing big-endian then reversing the bytes reads back little-
        // endian as the same value, for every width and encoding.
        for big in all_formats().into_iter().filter(|f| f.endian() == Endianness::Big) {
            let little =
                SampleFormat::from_bytes(big.bytes(), big.encoding(), Endianness::Little).unwrap();

            let mut slot = vec![0u8; big.bytes()];
            encode(&mut slot, big, 0.625).unwrap();
            let as_big = decode(&slot, big).unwrap();

            slot.reverse();
            let as_little = decode(&slot, little).unwrap();
            assert_eq!(as_big, as_little, "{big} vs {little}");
        }
    }

    #[test]
    fn test_native_endian_matches_primitive_layout() {
        let format =
            SampleFormat::from_bytes(4, SampleEncoding::Float, Endianness::NATIVE).unwrap();
        let mut slot = [0u8; 4];
        encode(&mut slot, format, 0.25).unwrap();
        assert_eq!(f32::from_ne_bytes(slot), 0.25);
    }

    #[test]
    fn test_three_byte_sign_extension() {
        let format = SampleFormat::from_bytes(3, SampleEncoding::Int, Endianness::Little).unwrap();
        let mut slot = [0u8; 3];

        encode(&mut slot, format, -0.5).unwrap();
        let back = decode(&slot, format).unwrap();
        assert!((back + 0.5).abs() < 1e-6, "24-bit -0.5 read back as {back}");

        // Most negative representable stays negative after decode.
        let slot = [0x01, 0x00, 0x80];
        assert!(decode(&slot, format).unwrap() < -0.99);
    }

    #[test]
    fn test_slot_size_mismatch() {
        let format = SampleFormat::from_bytes(2, SampleEncoding::Int, Endianness::Little).unwrap();
        let mut slot = [0u8; 4];
        assert!(matches!(
            encode(&mut slot, format, 0.0),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            decode(&slot, format),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
