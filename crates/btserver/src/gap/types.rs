use std::fmt;

/// Bluetooth device address, stored little-endian as received from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&slice[0..6]);
            Some(Self { bytes })
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

/// A remote device connected to us while we act as a peripheral.
///
/// The transport creates one when the link comes up and forgets it on
/// disconnection; the server only uses it as a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Central {
    pub address: BdAddr,
    pub connection_handle: u16,
}

impl Central {
    pub fn new(address: BdAddr, connection_handle: u16) -> Self {
        Self {
            address,
            connection_handle,
        }
    }
}

impl fmt::Display for Central {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (handle 0x{:04X})", self.address, self.connection_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let addr = BdAddr::new([0x55, 0x44, 0x33, 0x22, 0x11, 0x00]);
        assert_eq!(addr.to_string(), "00:11:22:33:44:55");
        assert_eq!(BdAddr::from_slice(&[1, 2, 3]), None);

        let central = Central::new(addr, 0x0040);
        assert_eq!(central.to_string(), "00:11:22:33:44:55 (handle 0x0040)");
    }
}
