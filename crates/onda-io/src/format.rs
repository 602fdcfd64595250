//! Sample format descriptors.
//!
//! A [`SampleFormat`] describes one hardware sample slot: how many bytes
//! it occupies, whether it holds a two's-complement integer or an IEEE-754
//! float, and in which byte order. The codec ([`crate::codec`]) reads and
//! writes slots through this description; nothing else in the crate needs
//! to know what the hardware speaks.
//!
//! Sub-width-aligned integer slots (e.g. 18-bit or 20-bit data shifted
//! inside a 4-byte slot) exist in the wild but are deliberately rejected
//! here rather than guessed at: only full-width alignments are codable.

use crate::{Error, Result};

/// Supported slot widths in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleWidth {
    /// 2 bytes (16-bit integer PCM).
    B2,
    /// 3 bytes (24-bit packed integer PCM).
    B3,
    /// 4 bytes (32-bit integer PCM or single-precision float).
    B4,
    /// 8 bytes (64-bit integer PCM or double-precision float).
    B8,
}

impl SampleWidth {
    /// Slot width in bytes.
    #[inline]
    pub fn bytes(self) -> usize {
        match self {
            Self::B2 => 2,
            Self::B3 => 3,
            Self::B4 => 4,
            Self::B8 => 8,
        }
    }

    /// Slot width in bits.
    #[inline]
    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    /// Validate a raw byte count.
    pub fn from_bytes(bytes: usize) -> Result<Self> {
        match bytes {
            2 => Ok(Self::B2),
            3 => Ok(Self::B3),
            4 => Ok(Self::B4),
            8 => Ok(Self::B8),
            other => Err(Error::UnsupportedFormat(format!(
                "{other}-byte sample slots are not implemented"
            ))),
        }
    }
}

/// Numeric encoding of a sample slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// Two's-complement signed integer, full range mapped to [-1, 1].
    Int,
    /// IEEE-754 float storing the amplitude directly.
    Float,
}

/// Byte order of a sample slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

impl Endianness {
    /// The byte order of the host.
    pub const NATIVE: Self = if cfg!(target_endian = "big") {
        Self::Big
    } else {
        Self::Little
    };
}

/// One hardware sample slot: width, encoding, and byte order.
///
/// Construction validates the combination, so a held `SampleFormat` is
/// always codable: integer slots may be 2, 3, 4, or 8 bytes; float slots
/// must be 4 (single) or 8 (double) bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleFormat {
    width: SampleWidth,
    encoding: SampleEncoding,
    endian: Endianness,
}

impl SampleFormat {
    /// 16-bit native-endian integer PCM, the placeholder a driver holds
    /// before format negotiation has run.
    pub const INT16_NATIVE: Self = Self {
        width: SampleWidth::B2,
        encoding: SampleEncoding::Int,
        endian: Endianness::NATIVE,
    };

    /// Build a validated format descriptor.
    pub fn new(width: SampleWidth, encoding: SampleEncoding, endian: Endianness) -> Result<Self> {
        if encoding == SampleEncoding::Float
            && !matches!(width, SampleWidth::B4 | SampleWidth::B8)
        {
            return Err(Error::UnsupportedFormat(format!(
                "{}-byte float slots are not IEEE-754 sizes",
                width.bytes()
            )));
        }
        Ok(Self {
            width,
            encoding,
            endian,
        })
    }

    /// Build from a raw byte count.
    pub fn from_bytes(bytes: usize, encoding: SampleEncoding, endian: Endianness) -> Result<Self> {
        Self::new(SampleWidth::from_bytes(bytes)?, encoding, endian)
    }

    /// Slot width.
    #[inline]
    pub fn width(self) -> SampleWidth {
        self.width
    }

    /// Slot width in bytes.
    #[inline]
    pub fn bytes(self) -> usize {
        self.width.bytes()
    }

    /// Numeric encoding.
    #[inline]
    pub fn encoding(self) -> SampleEncoding {
        self.encoding
    }

    /// Byte order.
    #[inline]
    pub fn endian(self) -> Endianness {
        self.endian
    }

    /// Whether the slot holds an IEEE-754 float.
    #[inline]
    pub fn is_float(self) -> bool {
        self.encoding == SampleEncoding::Float
    }

    /// 4-byte float slot.
    #[inline]
    pub fn is_single_precision(self) -> bool {
        self.is_float() && self.width == SampleWidth::B4
    }

    /// 8-byte float slot.
    #[inline]
    pub fn is_double_precision(self) -> bool {
        self.is_float() && self.width == SampleWidth::B8
    }

    /// Map a cpal sample format to a descriptor.
    ///
    /// cpal delivers buffers in host byte order, so the result is always
    /// native-endian. Formats outside the codec's matrix (unsigned PCM,
    /// 8-bit, packed sub-width variants) are rejected.
    pub fn from_cpal(format: cpal::SampleFormat) -> Result<Self> {
        let (width, encoding) = match format {
            cpal::SampleFormat::I16 => (SampleWidth::B2, SampleEncoding::Int),
            cpal::SampleFormat::I32 => (SampleWidth::B4, SampleEncoding::Int),
            cpal::SampleFormat::I64 => (SampleWidth::B8, SampleEncoding::Int),
            cpal::SampleFormat::F32 => (SampleWidth::B4, SampleEncoding::Float),
            cpal::SampleFormat::F64 => (SampleWidth::B8, SampleEncoding::Float),
            other => {
                return Err(Error::UnsupportedFormat(format!(
                    "cpal sample format {other:?}"
                )));
            }
        };
        Self::new(width, encoding, Endianness::NATIVE)
    }

    /// Map a descriptor back to a cpal sample format.
    ///
    /// Only native-endian formats with a cpal equivalent map; 3-byte
    /// slots have no cpal representation.
    pub fn to_cpal(self) -> Result<cpal::SampleFormat> {
        if self.endian != Endianness::NATIVE {
            return Err(Error::UnsupportedFormat(
                "cpal streams are always host-endian".into(),
            ));
        }
        match (self.encoding, self.width) {
            (SampleEncoding::Int, SampleWidth::B2) => Ok(cpal::SampleFormat::I16),
            (SampleEncoding::Int, SampleWidth::B4) => Ok(cpal::SampleFormat::I32),
            (SampleEncoding::Int, SampleWidth::B8) => Ok(cpal::SampleFormat::I64),
            (SampleEncoding::Float, SampleWidth::B4) => Ok(cpal::SampleFormat::F32),
            (SampleEncoding::Float, SampleWidth::B8) => Ok(cpal::SampleFormat::F64),
            (encoding, width) => Err(Error::UnsupportedFormat(format!(
                "{:?} {}-byte slots have no cpal representation",
                encoding,
                width.bytes()
            ))),
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoding = match self.encoding {
            SampleEncoding::Int => "int",
            SampleEncoding::Float => "float",
        };
        let endian = match self.endian {
            Endianness::Big => "be",
            Endianness::Little => "le",
        };
        write!(f, "{}{}{}", encoding, self.width.bits(), endian)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_validation() {
        assert!(SampleWidth::from_bytes(2).is_ok());
        assert!(SampleWidth::from_bytes(3).is_ok());
        assert!(SampleWidth::from_bytes(4).is_ok());
        assert!(SampleWidth::from_bytes(8).is_ok());

        for bad in [0, 1, 5, 6, 7, 16] {
            assert!(matches!(
                SampleWidth::from_bytes(bad),
                Err(Error::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_float_widths() {
        assert!(SampleFormat::from_bytes(4, SampleEncoding::Float, Endianness::Little).is_ok());
        assert!(SampleFormat::from_bytes(8, SampleEncoding::Float, Endianness::Big).is_ok());
        assert!(SampleFormat::from_bytes(2, SampleEncoding::Float, Endianness::Little).is_err());
        assert!(SampleFormat::from_bytes(3, SampleEncoding::Float, Endianness::Big).is_err());
    }

    #[test]
    fn test_precision_flags() {
        let single =
            SampleFormat::from_bytes(4, SampleEncoding::Float, Endianness::Little).unwrap();
        assert!(single.is_float());
        assert!(single.is_single_precision());
        assert!(!single.is_double_precision());

        let double = SampleFormat::from_bytes(8, SampleEncoding::Float, Endianness::Little).unwrap();
        assert!(double.is_double_precision());

        let pcm = SampleFormat::from_bytes(2, SampleEncoding::Int, Endianness::Little).unwrap();
        assert!(!pcm.is_float());
        assert!(!pcm.is_single_precision());
    }

    #[test]
    fn test_cpal_round_trip() {
        for cpal_format in [
            cpal::SampleFormat::I16,
            cpal::SampleFormat::I32,
            cpal::SampleFormat::F32,
            cpal::SampleFormat::F64,
        ] {
            let format = SampleFormat::from_cpal(cpal_format).unwrap();
            assert_eq!(format.endian(), Endianness::NATIVE);
            assert_eq!(format.to_cpal().unwrap(), cpal_format);
        }
    }

    #[test]
    fn test_cpal_rejects_unsupported() {
        assert!(SampleFormat::from_cpal(cpal::SampleFormat::U16).is_err());
        assert!(SampleFormat::from_cpal(cpal::SampleFormat::U8).is_err());
    }

    #[test]
    fn test_display() {
        let f = SampleFormat::from_bytes(2, SampleEncoding::Int, Endianness::Little).unwrap();
        assert_eq!(f.to_string(), "int16le");
        let f = SampleFormat::from_bytes(8, SampleEncoding::Float, Endianness::Big).unwrap();
        assert_eq!(f.to_string(), "float64be");
    }
}
