//! Framed message transport
//!
//! Wraps a [`SerialPort`] with the COBS framing and integrity checks, so
//! the device loop only ever sees whole, checksummed messages.

use smartdev_hal::SerialPort;
use smartdev_protocol::{
    ErrorCode, FrameError, Message, ENCODING_MAX_SIZE, GENERIC_ERROR_FRAME, MESSAGE_DELIMITER,
    MESSAGE_MIN_SIZE,
};

use crate::log::{trace, warn};

/// Outcome of one receive attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recv {
    /// Nothing arrived before the timeout
    Idle,
    /// A well-formed message was decoded into the buffer
    Valid,
    /// A frame arrived but was rejected; reply with this code
    Rejected(ErrorCode),
}

/// Serial port plus a frame buffer sized for the largest encoding
pub struct SerialHandler<S> {
    port: S,
    frame: [u8; ENCODING_MAX_SIZE],
}

impl<S: SerialPort> SerialHandler<S> {
    pub fn new(port: S) -> Self {
        Self {
            port,
            frame: [0; ENCODING_MAX_SIZE],
        }
    }

    /// Open the underlying port
    pub fn open(&mut self, baud_rate: u32) -> Result<(), S::Error> {
        self.port.open(baud_rate)
    }

    pub fn port(&self) -> &S {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    /// Receive one frame into `msg`
    ///
    /// A transport error is treated the same as a timeout. On
    /// [`Recv::Rejected`] the contents of `msg` are unspecified.
    pub fn recv(&mut self, msg: &mut Message, timeout_ms: u64) -> Recv {
        let len = match self
            .port
            .read_until_delimiter(MESSAGE_DELIMITER, &mut self.frame, timeout_ms)
        {
            Ok(0) => return Recv::Idle,
            Ok(len) => len,
            Err(_) => {
                warn!("serial read failed");
                return Recv::Idle;
            }
        };

        match msg.from_cobs(&self.frame[..len]) {
            Err(FrameError::BufferOverflow) => Recv::Rejected(ErrorCode::BufferOverflow),
            Err(FrameError::InputTooShort) => Recv::Rejected(ErrorCode::UnexpectedDelimeter),
            Err(FrameError::ZeroByte) => Recv::Rejected(ErrorCode::GenericError),
            Ok(decoded) if decoded < MESSAGE_MIN_SIZE || decoded != msg.len() => {
                Recv::Rejected(ErrorCode::UnexpectedDelimeter)
            }
            Ok(_) if !msg.verify_checksum() => Recv::Rejected(ErrorCode::BadChecksum),
            Ok(_) => {
                trace!("received type {=u8:#x}", msg.type_byte());
                Recv::Valid
            }
        }
    }

    /// Encode and send `msg`
    ///
    /// If the message cannot be encoded the generic error frame goes out
    /// instead. Returns true only if `msg` itself was written.
    pub fn send(&mut self, msg: &Message) -> bool {
        match msg.to_cobs(&mut self.frame) {
            Ok(len) => self.write_frame(len),
            Err(_) => {
                self.send_generic_error();
                false
            }
        }
    }

    /// Send the pre-encoded ERROR(GENERIC_ERROR) frame
    pub fn send_generic_error(&mut self) -> bool {
        self.frame[..GENERIC_ERROR_FRAME.len()].copy_from_slice(&GENERIC_ERROR_FRAME);
        self.write_frame(GENERIC_ERROR_FRAME.len())
    }

    fn write_frame(&mut self, len: usize) -> bool {
        let result = self
            .port
            .write(&self.frame[..len])
            .and_then(|()| self.port.write_byte(MESSAGE_DELIMITER));
        if result.is_err() {
            warn!("serial write failed");
        }
        result.is_ok()
    }
}
