//! Serial transport abstraction
//!
//! The device loop only ever needs three things from a serial line:
//! open it, read one delimiter-terminated chunk with a deadline, and
//! write bytes out.

/// Default line speed for the host link
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Byte-stream serial port
///
/// Implementations own any buffering; reads are bounded by an explicit
/// timeout so the caller can keep its schedule.
pub trait SerialPort {
    /// Error type for port operations
    type Error;

    /// Configure and open the port
    ///
    /// Blocks until the port is usable.
    fn open(&mut self, baud_rate: u32) -> Result<(), Self::Error>;

    /// Read bytes until `delimiter` is seen, `buf` is full, or the timeout expires
    ///
    /// The delimiter is consumed but not stored. Returns the number of bytes
    /// stored in `buf`; zero means nothing arrived before the timeout.
    fn read_until_delimiter(
        &mut self,
        delimiter: u8,
        buf: &mut [u8],
        timeout_ms: u64,
    ) -> Result<usize, Self::Error>;

    /// Write all of `data` to the port
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Write a single byte
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.write(&[byte])
    }
}
