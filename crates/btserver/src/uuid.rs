//! Bluetooth UUIDs
//!
//! Services, characteristics and descriptors are all identified by 128-bit
//! UUIDs. SIG-assigned attributes use 16-bit or 32-bit aliases on top of the
//! Bluetooth base UUID; this type stores the full value and recovers the short
//! form when one exists.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 128-bit Bluetooth UUID, stored little-endian as it travels over the air.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Uuid {
    bytes: [u8; 16],
}

/// "00000000-0000-1000-8000-00805F9B34FB" in little-endian order.
const BASE_UUID_BYTES: [u8; 16] = [
    0xFB, 0x34, 0x9B, 0x5F, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Offset within the base UUID where the 16/32-bit alias is inserted.
const BASE_OFFSET: usize = 12;

impl Uuid {
    /// Creates a UUID from 16 little-endian bytes.
    pub const fn from_bytes_le(bytes: [u8; 16]) -> Self {
        Uuid { bytes }
    }

    /// Creates a UUID from 16 big-endian bytes (textual order).
    pub fn from_bytes_be(mut bytes: [u8; 16]) -> Self {
        bytes.reverse();
        Uuid { bytes }
    }

    /// Creates a UUID from its 128-bit value as written in text, e.g.
    /// `0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E`.
    pub const fn from_u128(value: u128) -> Self {
        Uuid {
            bytes: value.to_le_bytes(),
        }
    }

    /// Creates a UUID from a 16-bit SIG-assigned alias.
    pub const fn from_u16(uuid16: u16) -> Self {
        let mut bytes = BASE_UUID_BYTES;
        bytes[BASE_OFFSET] = uuid16 as u8;
        bytes[BASE_OFFSET + 1] = (uuid16 >> 8) as u8;
        Uuid { bytes }
    }

    /// Creates a UUID from a 32-bit SIG-assigned alias.
    pub const fn from_u32(uuid32: u32) -> Self {
        let mut bytes = BASE_UUID_BYTES;
        bytes[BASE_OFFSET] = uuid32 as u8;
        bytes[BASE_OFFSET + 1] = (uuid32 >> 8) as u8;
        bytes[BASE_OFFSET + 2] = (uuid32 >> 16) as u8;
        bytes[BASE_OFFSET + 3] = (uuid32 >> 24) as u8;
        Uuid { bytes }
    }

    /// Creates a UUID from a little-endian slice of 2, 4 or 16 bytes.
    pub fn try_from_slice_le(slice: &[u8]) -> Option<Self> {
        match slice.len() {
            2 => Some(Uuid::from_u16(u16::from_le_bytes([slice[0], slice[1]]))),
            4 => Some(Uuid::from_u32(u32::from_le_bytes([
                slice[0], slice[1], slice[2], slice[3],
            ]))),
            16 => {
                let mut bytes = [0u8; 16];
                bytes.copy_from_slice(slice);
                Some(Uuid::from_bytes_le(bytes))
            }
            _ => None,
        }
    }

    pub const fn as_bytes_le(&self) -> &[u8; 16] {
        &self.bytes
    }

    pub fn as_bytes_be(&self) -> [u8; 16] {
        let mut bytes = self.bytes;
        bytes.reverse();
        bytes
    }

    fn is_sig_assigned(&self) -> bool {
        self.bytes[0..BASE_OFFSET] == BASE_UUID_BYTES[0..BASE_OFFSET]
    }

    /// Returns the 16-bit alias if this is a SIG-assigned 16-bit UUID.
    pub fn as_u16(&self) -> Option<u16> {
        if self.is_sig_assigned()
            && self.bytes[BASE_OFFSET + 2] == 0
            && self.bytes[BASE_OFFSET + 3] == 0
        {
            Some(u16::from_le_bytes([
                self.bytes[BASE_OFFSET],
                self.bytes[BASE_OFFSET + 1],
            ]))
        } else {
            None
        }
    }

    /// Returns the 32-bit alias if this is a SIG-assigned UUID.
    pub fn as_u32(&self) -> Option<u32> {
        if self.is_sig_assigned() {
            Some(u32::from_le_bytes([
                self.bytes[BASE_OFFSET],
                self.bytes[BASE_OFFSET + 1],
                self.bytes[BASE_OFFSET + 2],
                self.bytes[BASE_OFFSET + 3],
            ]))
        } else {
            None
        }
    }
}

impl From<u16> for Uuid {
    fn from(uuid16: u16) -> Self {
        Uuid::from_u16(uuid16)
    }
}

impl From<u32> for Uuid {
    fn from(uuid32: u32) -> Self {
        Uuid::from_u32(uuid32)
    }
}

impl PartialEq<u16> for Uuid {
    fn eq(&self, other: &u16) -> bool {
        self.as_u16() == Some(*other)
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.as_bytes_be();
        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..6]),
            hex::encode(&b[6..8]),
            hex::encode(&b[8..10]),
            hex::encode(&b[10..16])
        )
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.as_u16(), self.as_u32()) {
            (Some(short), _) => write!(f, "Uuid(0x{:04X})", short),
            (None, Some(long)) => write!(f, "Uuid(0x{:08X})", long),
            _ => write!(f, "Uuid({})", self),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UuidParseError {
    #[error("UUID must have 4, 8 or 32 hex digits, found {0}")]
    InvalidLength(usize),

    #[error("invalid hex in UUID: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl FromStr for Uuid {
    type Err = UuidParseError;

    /// Accepts "180D", "0000180D" and the 128-bit form with or without hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let cleaned: String = s.chars().filter(|c| *c != '-').collect();

        match cleaned.len() {
            4 => {
                let mut raw = [0u8; 2];
                hex::decode_to_slice(&cleaned, &mut raw)?;
                Ok(Uuid::from_u16(u16::from_be_bytes(raw)))
            }
            8 => {
                let mut raw = [0u8; 4];
                hex::decode_to_slice(&cleaned, &mut raw)?;
                Ok(Uuid::from_u32(u32::from_be_bytes(raw)))
            }
            32 => {
                let mut bytes_be = [0u8; 16];
                hex::decode_to_slice(&cleaned, &mut bytes_be)?;
                Ok(Uuid::from_bytes_be(bytes_be))
            }
            n => Err(UuidParseError::InvalidLength(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_forms() {
        let hrs = Uuid::from_u16(0x180D);
        assert_eq!(hrs.as_u16(), Some(0x180D));
        assert_eq!(hrs.as_u32(), Some(0x180D));
        assert_eq!(hrs, 0x180Du16);
        assert_eq!(hrs.to_string(), "0000180d-0000-1000-8000-00805f9b34fb");
        assert_eq!(format!("{:?}", hrs), "Uuid(0x180D)");

        let vendor = Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E);
        assert_eq!(vendor.as_u16(), None);
        assert_eq!(vendor.as_u32(), None);
        assert_eq!(vendor.to_string(), "6e400001-b5a3-f393-e0a9-e50e24dcca9e");
    }

    #[test]
    fn test_parse() {
        assert_eq!("180A".parse::<Uuid>(), Ok(Uuid::from_u16(0x180A)));
        assert_eq!("0x2A37".parse::<Uuid>(), Ok(Uuid::from_u16(0x2A37)));
        assert_eq!("0000180A".parse::<Uuid>(), Ok(Uuid::from_u16(0x180A)));
        assert_eq!(
            "0000180a-0000-1000-8000-00805f9b34fb".parse::<Uuid>(),
            Ok(Uuid::from_u16(0x180A))
        );
        assert_eq!(
            "6E400001-B5A3-F393-E0A9-E50E24DCCA9E".parse::<Uuid>(),
            Ok(Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E))
        );
        assert_eq!("18A".parse::<Uuid>(), Err(UuidParseError::InvalidLength(3)));
        assert!(matches!("18ZZ".parse::<Uuid>(), Err(UuidParseError::Hex(_))));
    }

    #[test]
    fn test_parse_error_carries_hex_detail() {
        let err = "18ZZ".parse::<Uuid>().unwrap_err();
        assert_eq!(
            err,
            UuidParseError::Hex(hex::FromHexError::InvalidHexCharacter { c: 'Z', index: 2 })
        );
        assert_eq!(err.to_string(), "invalid hex in UUID: Invalid character 'Z' at position 2");
    }

    #[test]
    fn test_slice_le() {
        assert_eq!(
            Uuid::try_from_slice_le(&[0x0D, 0x18]),
            Some(Uuid::from_u16(0x180D))
        );
        let vendor = Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E);
        assert_eq!(Uuid::try_from_slice_le(vendor.as_bytes_le()), Some(vendor));
        assert_eq!(Uuid::try_from_slice_le(&[1, 2, 3]), None);
    }
}
