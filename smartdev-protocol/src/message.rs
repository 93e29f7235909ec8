//! Smart Device messages
//!
//! Message layout (before framing):
//! ```text
//! ┌──────┬────────┬─────────────┬──────────┐
//! │ TYPE │ LENGTH │ PAYLOAD     │ CHECKSUM │
//! │ 1B   │ 1B     │ 0–255B      │ 1B       │
//! └──────┴────────┴─────────────┴──────────┘
//! ```
//!
//! The checksum is the XOR of every preceding byte. Multi-byte fields are
//! little-endian.
//!
//! A [`Message`] is a single fixed buffer that is rebuilt in place by the
//! `make_*` methods and inspected in place by the `read_*` methods, so one
//! instance serves every send and receive without allocation.

use crate::frame::{self, FrameError};
use crate::params::{ParamMap, ParamTable};
use crate::types::{DeviceUid, ErrorCode, HeartbeatId, Interval, MessageType};

pub const MESSAGE_TYPE_SIZE: usize = 1;
pub const PAYLOAD_LEN_SIZE: usize = 1;
pub const CHECKSUM_SIZE: usize = 1;

/// Largest payload the length byte can describe
pub const PAYLOAD_MAX_SIZE: usize = u8::MAX as usize;

/// Size of a message with an empty payload
pub const MESSAGE_MIN_SIZE: usize = MESSAGE_TYPE_SIZE + PAYLOAD_LEN_SIZE + CHECKSUM_SIZE;

/// Size of a message with a full payload
pub const MESSAGE_MAX_SIZE: usize = MESSAGE_MIN_SIZE + PAYLOAD_MAX_SIZE;

/// Largest COBS frame (without delimiter) a message can produce
pub const ENCODING_MAX_SIZE: usize = frame::max_encoded_len(MESSAGE_MAX_SIZE);

/// Pre-encoded ERROR(GENERIC_ERROR) frame, sent when a reply cannot be encoded
pub const GENERIC_ERROR_FRAME: [u8; 5] = [0x05, 0xFF, 0x01, 0xFF, 0x01];

const PAYLOAD_OFFSET: usize = MESSAGE_TYPE_SIZE + PAYLOAD_LEN_SIZE;

/// Errors building or parsing a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Payload would exceed [`PAYLOAD_MAX_SIZE`]
    PayloadOverflow,
    /// Read past the declared payload length
    OutOfBounds,
    /// Message has a different type than the parser expects
    TypeMismatch { expected: MessageType, found: u8 },
    /// Fields do not account for exactly the declared payload
    LengthMismatch { expected: usize, actual: usize },
    /// A field holds a value outside its domain
    InvalidField,
}

/// A mutable, fixed-capacity message buffer
#[derive(Clone)]
pub struct Message {
    buf: [u8; MESSAGE_MAX_SIZE],
}

impl Default for Message {
    fn default() -> Self {
        Self::new(MessageType::Ping)
    }
}

impl core::fmt::Debug for Message {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Message")
            .field("type", &self.type_byte())
            .field("payload", &self.payload())
            .field("checksum", &self.checksum())
            .finish()
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Message {}

impl Message {
    /// Create an empty, finished message of the given type
    pub fn new(msg_type: MessageType) -> Self {
        let mut msg = Self {
            buf: [0; MESSAGE_MAX_SIZE],
        };
        msg.finish(msg_type);
        msg
    }

    /// Raw type byte (may not be a known [`MessageType`])
    pub fn type_byte(&self) -> u8 {
        self.buf[0]
    }

    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_byte(self.type_byte())
    }

    /// Declared payload length
    pub fn payload_len(&self) -> usize {
        self.buf[MESSAGE_TYPE_SIZE] as usize
    }

    /// Length of the whole message, checksum included
    pub fn len(&self) -> usize {
        MESSAGE_MIN_SIZE + self.payload_len()
    }

    /// Always false; a message has at least a header and checksum
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn payload(&self) -> &[u8] {
        &self.buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + self.payload_len()]
    }

    /// Stored checksum byte
    pub fn checksum(&self) -> u8 {
        self.buf[self.len() - CHECKSUM_SIZE]
    }

    /// The message bytes as sent on the wire (before framing)
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    fn compute_checksum(&self) -> u8 {
        self.buf[..self.len() - CHECKSUM_SIZE]
            .iter()
            .fold(0, |acc, byte| acc ^ byte)
    }

    /// True iff the stored checksum matches the contents
    pub fn verify_checksum(&self) -> bool {
        self.checksum() == self.compute_checksum()
    }

    /// Set the declared payload length
    pub fn set_payload_length(&mut self, len: usize) -> Result<(), MessageError> {
        if len > PAYLOAD_MAX_SIZE {
            return Err(MessageError::PayloadOverflow);
        }
        self.buf[MESSAGE_TYPE_SIZE] = len as u8;
        Ok(())
    }

    /// Append bytes to the payload
    ///
    /// On overflow the message is left untouched.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), MessageError> {
        let start = PAYLOAD_OFFSET + self.payload_len();
        self.set_payload_length(self.payload_len() + bytes.len())?;
        self.buf[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Copy `dst.len()` payload bytes starting at `offset` into `dst`
    ///
    /// Never reads past the declared payload length.
    pub fn read(&self, offset: usize, dst: &mut [u8]) -> Result<(), MessageError> {
        let end = offset
            .checked_add(dst.len())
            .ok_or(MessageError::OutOfBounds)?;
        if end > self.payload_len() {
            return Err(MessageError::OutOfBounds);
        }
        dst.copy_from_slice(&self.buf[PAYLOAD_OFFSET + offset..PAYLOAD_OFFSET + end]);
        Ok(())
    }

    /// Stamp the type byte and store the checksum
    pub fn finish(&mut self, msg_type: MessageType) {
        self.buf[0] = msg_type.to_byte();
        let at = self.len() - CHECKSUM_SIZE;
        self.buf[at] = self.compute_checksum();
    }

    /// COBS-encode this message into `dst` (no delimiter appended)
    pub fn to_cobs(&self, dst: &mut [u8]) -> Result<usize, FrameError> {
        frame::encode(self.as_bytes(), dst)
    }

    /// Replace this message with a decoded frame (delimiter stripped)
    ///
    /// Returns the decoded length. The caller still has to check it
    /// against [`MESSAGE_MIN_SIZE`] and [`Message::len`] and verify the
    /// checksum.
    pub fn from_cobs(&mut self, src: &[u8]) -> Result<usize, FrameError> {
        frame::decode(src, &mut self.buf)
    }

    fn build<F>(&mut self, msg_type: MessageType, fields: F) -> Result<(), MessageError>
    where
        F: FnOnce(&mut Self) -> Result<(), MessageError>,
    {
        self.set_payload_length(0)?;
        fields(self)?;
        self.finish(msg_type);
        Ok(())
    }

    fn check_params_fit(present: ParamMap, params: &ParamTable) -> Result<(), MessageError> {
        if ParamMap::SIZE + params.encoded_len(present) > PAYLOAD_MAX_SIZE {
            return Err(MessageError::PayloadOverflow);
        }
        Ok(())
    }

    fn append_params(&mut self, present: ParamMap, params: &ParamTable) -> Result<(), MessageError> {
        self.append(&present.to_le_bytes())?;
        for index in present {
            // Slots without storage stay in the map but carry no bytes
            if let Some(bytes) = params.get(index) {
                self.append(bytes)?;
            }
        }
        Ok(())
    }

    pub fn make_ping(&mut self) -> Result<(), MessageError> {
        self.build(MessageType::Ping, |_| Ok(()))
    }

    pub fn make_sub_req(&mut self, present: ParamMap, interval: Interval) -> Result<(), MessageError> {
        self.build(MessageType::SubReq, |msg| {
            msg.append(&present.to_le_bytes())?;
            msg.append(&interval.to_le_bytes())
        })
    }

    pub fn make_sub_res(
        &mut self,
        present: ParamMap,
        interval: Interval,
        uid: &DeviceUid,
    ) -> Result<(), MessageError> {
        self.build(MessageType::SubRes, |msg| {
            msg.append(&present.to_le_bytes())?;
            msg.append(&interval.to_le_bytes())?;
            msg.append(&uid.device_id.to_le_bytes())?;
            msg.append(&[uid.year])?;
            msg.append(&uid.nonce.to_le_bytes())
        })
    }

    pub fn make_dev_read(&mut self, present: ParamMap) -> Result<(), MessageError> {
        self.build(MessageType::DevRead, |msg| msg.append(&present.to_le_bytes()))
    }

    /// Build a DEV_WRITE carrying the values of `present` from `params`
    ///
    /// Fails without touching the message if the values do not fit.
    pub fn make_dev_write(&mut self, present: ParamMap, params: &ParamTable) -> Result<(), MessageError> {
        Self::check_params_fit(present, params)?;
        self.build(MessageType::DevWrite, |msg| msg.append_params(present, params))
    }

    /// Build a DEV_DATA carrying the values of `present` from `params`
    ///
    /// Fails without touching the message if the values do not fit.
    pub fn make_dev_data(&mut self, present: ParamMap, params: &ParamTable) -> Result<(), MessageError> {
        Self::check_params_fit(present, params)?;
        self.build(MessageType::DevData, |msg| msg.append_params(present, params))
    }

    pub fn make_dev_disable(&mut self) -> Result<(), MessageError> {
        self.build(MessageType::DevDisable, |_| Ok(()))
    }

    pub fn make_hb_req(&mut self, id: HeartbeatId) -> Result<(), MessageError> {
        self.build(MessageType::HbReq, |msg| msg.append(&[id]))
    }

    pub fn make_hb_res(&mut self, id: HeartbeatId) -> Result<(), MessageError> {
        self.build(MessageType::HbRes, |msg| msg.append(&[id]))
    }

    pub fn make_error(&mut self, code: ErrorCode) -> Result<(), MessageError> {
        self.build(MessageType::Error, |msg| msg.append(&[code.to_byte()]))
    }

    fn reader(&self, expected: MessageType) -> Result<FieldReader<'_>, MessageError> {
        if self.type_byte() != expected.to_byte() {
            return Err(MessageError::TypeMismatch {
                expected,
                found: self.type_byte(),
            });
        }
        Ok(FieldReader { msg: self, offset: 0 })
    }

    pub fn read_sub_req(&self) -> Result<(ParamMap, Interval), MessageError> {
        let mut reader = self.reader(MessageType::SubReq)?;
        let present = reader.param_map()?;
        let interval = reader.u16()?;
        reader.finish()?;
        Ok((present, interval))
    }

    pub fn read_sub_res(&self) -> Result<(ParamMap, Interval, DeviceUid), MessageError> {
        let mut reader = self.reader(MessageType::SubRes)?;
        let present = reader.param_map()?;
        let interval = reader.u16()?;
        let device_id = reader.u16()?;
        let year = reader.u8()?;
        let nonce = reader.u64()?;
        reader.finish()?;
        Ok((present, interval, DeviceUid::new(device_id, year, nonce)))
    }

    pub fn read_dev_read(&self) -> Result<ParamMap, MessageError> {
        let mut reader = self.reader(MessageType::DevRead)?;
        let present = reader.param_map()?;
        reader.finish()?;
        Ok(present)
    }

    /// Parse a DEV_WRITE, copying the carried values into `params`
    ///
    /// `params` is only modified if the whole message is valid.
    pub fn read_dev_write(&self, params: &mut ParamTable) -> Result<ParamMap, MessageError> {
        self.read_params(MessageType::DevWrite, params)
    }

    /// Parse a DEV_DATA, copying the carried values into `params`
    ///
    /// `params` is only modified if the whole message is valid.
    pub fn read_dev_data(&self, params: &mut ParamTable) -> Result<ParamMap, MessageError> {
        self.read_params(MessageType::DevData, params)
    }

    fn read_params(&self, msg_type: MessageType, params: &mut ParamTable) -> Result<ParamMap, MessageError> {
        let mut reader = self.reader(msg_type)?;
        let present = reader.param_map()?;

        let expected = ParamMap::SIZE + params.encoded_len(present);
        if expected != self.payload_len() {
            return Err(MessageError::LengthMismatch {
                expected,
                actual: self.payload_len(),
            });
        }

        for index in present {
            if let Some(dst) = params.get_mut(index) {
                reader.fill(dst)?;
            }
        }
        reader.finish()?;
        Ok(present)
    }

    pub fn read_hb_req(&self) -> Result<HeartbeatId, MessageError> {
        self.read_heartbeat(MessageType::HbReq)
    }

    pub fn read_hb_res(&self) -> Result<HeartbeatId, MessageError> {
        self.read_heartbeat(MessageType::HbRes)
    }

    fn read_heartbeat(&self, msg_type: MessageType) -> Result<HeartbeatId, MessageError> {
        let mut reader = self.reader(msg_type)?;
        let id = reader.u8()?;
        reader.finish()?;
        Ok(id)
    }

    pub fn read_error(&self) -> Result<ErrorCode, MessageError> {
        let mut reader = self.reader(MessageType::Error)?;
        let code = reader.u8()?;
        reader.finish()?;
        ErrorCode::from_byte(code).ok_or(MessageError::InvalidField)
    }
}

/// Sequential field reader over a message payload
struct FieldReader<'a> {
    msg: &'a Message,
    offset: usize,
}

impl FieldReader<'_> {
    fn fill(&mut self, dst: &mut [u8]) -> Result<(), MessageError> {
        self.msg
            .read(self.offset, dst)
            .map_err(|_| MessageError::LengthMismatch {
                expected: self.offset + dst.len(),
                actual: self.msg.payload_len(),
            })?;
        self.offset += dst.len();
        Ok(())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], MessageError> {
        let mut raw = [0u8; N];
        self.fill(&mut raw)?;
        Ok(raw)
    }

    fn u8(&mut self) -> Result<u8, MessageError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, MessageError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, MessageError> {
        self.array().map(u64::from_le_bytes)
    }

    fn param_map(&mut self) -> Result<ParamMap, MessageError> {
        self.array().map(ParamMap::from_le_bytes)
    }

    /// Every declared payload byte must have been consumed
    fn finish(self) -> Result<(), MessageError> {
        if self.offset != self.msg.payload_len() {
            return Err(MessageError::LengthMismatch {
                expected: self.offset,
                actual: self.msg.payload_len(),
            });
        }
        Ok(())
    }
}
