//! Blocking serial transport and clock for the device loop
//!
//! The device loop is synchronous: it blocks in `read_until_delimiter`
//! for at most the timeout it asks for. The buffered UART keeps
//! receiving in its interrupt handler meanwhile, so no bytes are lost
//! while the loop is busy.

use defmt::*;
use embassy_rp::uart::{BufferedUart, Error as UartError};
use embassy_time::{block_for, Duration, Instant};
use embedded_io::{Read, ReadReady, Write};

use smartdev_hal::{Clock, SerialPort};

/// Host link over a buffered RP2040 UART
pub struct UartPort {
    uart: BufferedUart,
    /// Line speed the UART was configured with
    baud_rate: u32,
}

impl UartPort {
    /// Wrap a UART that was configured at `baud_rate`
    pub fn new(uart: BufferedUart, baud_rate: u32) -> Self {
        Self { uart, baud_rate }
    }

    fn read_byte(&mut self) -> Result<u8, UartError> {
        let mut byte = [0u8; 1];
        self.uart.read(&mut byte)?;
        Ok(byte[0])
    }
}

impl SerialPort for UartPort {
    type Error = UartError;

    fn open(&mut self, baud_rate: u32) -> Result<(), UartError> {
        if baud_rate != self.baud_rate {
            warn!(
                "UART configured at {} baud, loop expects {}",
                self.baud_rate, baud_rate
            );
        }

        // Drop anything that arrived before the loop was ready
        while self.uart.read_ready()? {
            self.read_byte()?;
        }
        Ok(())
    }

    fn read_until_delimiter(
        &mut self,
        delimiter: u8,
        buf: &mut [u8],
        timeout_ms: u64,
    ) -> Result<usize, UartError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut len = 0;

        while len < buf.len() {
            if !self.uart.read_ready()? {
                if Instant::now() >= deadline {
                    break;
                }
                continue;
            }

            let byte = self.read_byte()?;
            if byte == delimiter {
                break;
            }
            buf[len] = byte;
            len += 1;
        }
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), UartError> {
        self.uart.write_all(data)
    }
}

/// Millisecond clock backed by the embassy time driver
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }

    fn delay_ms(&mut self, ms: u64) {
        block_for(Duration::from_millis(ms));
    }
}
