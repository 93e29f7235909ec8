//! Message type identifiers, error codes and device identity

/// Heartbeat identifier carried by HB_REQ/HB_RES
pub type HeartbeatId = u8;

/// Subscription interval in milliseconds (0 = no subscription)
pub type Interval = u16;

/// Device model identifier
pub type DeviceId = u16;

/// Interval value meaning "no subscription"
pub const NO_SUBSCRIPTION: Interval = 0;

/// Message type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MessageType {
    Ping = 0x10,
    SubReq = 0x11,
    SubRes = 0x12,
    DevRead = 0x13,
    DevWrite = 0x14,
    DevData = 0x15,
    DevDisable = 0x16,
    HbReq = 0x17,
    HbRes = 0x18,
    Error = 0xFF,
}

impl MessageType {
    /// Parse a type byte, returning `None` for unknown values
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x10 => Some(Self::Ping),
            0x11 => Some(Self::SubReq),
            0x12 => Some(Self::SubRes),
            0x13 => Some(Self::DevRead),
            0x14 => Some(Self::DevWrite),
            0x15 => Some(Self::DevData),
            0x16 => Some(Self::DevDisable),
            0x17 => Some(Self::HbReq),
            0x18 => Some(Self::HbRes),
            0xFF => Some(Self::Error),
            _ => None,
        }
    }

    /// Convert to the wire byte
    pub const fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Error code carried in the payload of an ERROR message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ErrorCode {
    /// Receiver is overwhelmed; sender should transmit less
    Backoff = 0xFA,
    /// Receiver does not handle this message type (or could not parse it)
    InvalidType = 0xFB,
    /// Frame too large to COBS encode/decode
    BufferOverflow = 0xFC,
    /// Frame incomplete or not COBS-decodable
    UnexpectedDelimeter = 0xFD,
    /// Checksum did not match
    BadChecksum = 0xFE,
    /// Anything else
    GenericError = 0xFF,
}

impl ErrorCode {
    /// Parse an error code byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0xFA => Some(Self::Backoff),
            0xFB => Some(Self::InvalidType),
            0xFC => Some(Self::BufferOverflow),
            0xFD => Some(Self::UnexpectedDelimeter),
            0xFE => Some(Self::BadChecksum),
            0xFF => Some(Self::GenericError),
            _ => None,
        }
    }

    /// Convert to the wire byte
    pub const fn to_byte(self) -> u8 {
        self as u8
    }
}

/// Identity of one device instance
///
/// The nonce is drawn at boot so the host can tell a reconnect from a
/// reboot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceUid {
    /// Device model identifier
    pub device_id: DeviceId,
    /// Protocol year
    pub year: u8,
    /// Per-boot random value
    pub nonce: u64,
}

impl DeviceUid {
    /// Encoded size in bytes
    pub const SIZE: usize = 2 + 1 + 8;

    pub const fn new(device_id: DeviceId, year: u8, nonce: u64) -> Self {
        Self {
            device_id,
            year,
            nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_bytes() {
        for ty in [
            MessageType::Ping,
            MessageType::SubReq,
            MessageType::SubRes,
            MessageType::DevRead,
            MessageType::DevWrite,
            MessageType::DevData,
            MessageType::DevDisable,
            MessageType::HbReq,
            MessageType::HbRes,
            MessageType::Error,
        ] {
            assert_eq!(MessageType::from_byte(ty.to_byte()), Some(ty));
        }
        assert_eq!(MessageType::from_byte(0x80), None);
        assert_eq!(MessageType::from_byte(0x00), None);
    }

    #[test]
    fn test_error_codes_are_distinct() {
        assert_eq!(ErrorCode::Backoff.to_byte(), 0xFA);
        assert_eq!(ErrorCode::GenericError.to_byte(), 0xFF);
        assert_eq!(ErrorCode::from_byte(0xFD), Some(ErrorCode::UnexpectedDelimeter));
        assert_eq!(ErrorCode::from_byte(0x01), None);
    }
}
