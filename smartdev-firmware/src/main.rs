//! Smart Device Firmware
//!
//! Firmware for an RP2040 board exposing digital inputs and outputs to a
//! host over UART0 using the smart device protocol.
//!
//! ```text
//! ┌──────────────── main (thread mode) ──────────────┐
//! │ DeviceLoop::loop_once() forever                  │
//! │   UART0 <-> host    Hub<DigitalPin, 4>           │
//! └───────────────────────────┬──────────────────────┘
//!                             │ &Device, &LIVENESS
//! ┌───────────────────────────┴──────────────────────┐
//! │ SWI_IRQ_1 executor: watchdog_task (1 s ticker)   │
//! └──────────────────────────────────────────────────┘
//! ```

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::InterruptExecutor;
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use rand_core::RngCore;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use smartdev_core::{DeviceLoop, Liveness, LoopConfig};
use smartdev_drivers::{DigitalInput, DigitalOutput, DigitalPin, Hub};
use smartdev_protocol::DeviceUid;

mod tasks;
mod transport;

use transport::{EmbassyClock, UartPort};

/// Device model reported to the host
const DEVICE_ID: u16 = 0x0001;

/// Protocol year reported to the host
const YEAR: u8 = 1;

/// Device exposed by this board: two buttons, two outputs
pub type Device = Hub<DigitalPin<Input<'static>, Output<'static>>, 4>;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

// Shared between the device loop and the watchdog task
static DEVICE: StaticCell<Device> = StaticCell::new();
static LIVENESS: Liveness = Liveness::new();

static EXECUTOR_WATCHDOG: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_WATCHDOG.on_interrupt()
}

/// Main entry point
#[cortex_m_rt::entry]
fn main() -> ! {
    info!("Smart device firmware starting...");

    let p = embassy_rp::init(Default::default());
    let loop_config = LoopConfig::default();

    // Pin assignments are board-specific (Pico: buttons GPIO14/15, LED GPIO25, relay GPIO16)
    let device: &'static Device = DEVICE.init(Hub::new([
        DigitalPin::Input(DigitalInput::new_active_low(Input::new(p.PIN_14, Pull::Up))),
        DigitalPin::Input(DigitalInput::new_active_low(Input::new(p.PIN_15, Pull::Up))),
        DigitalPin::Output(DigitalOutput::new_active_high(Output::new(p.PIN_25, Level::Low))),
        DigitalPin::Output(DigitalOutput::new_active_high(Output::new(p.PIN_16, Level::Low))),
    ]));

    // Setup UART for the host link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = loop_config.baud_rate;

    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 512]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let port = UartPort::new(uart, loop_config.baud_rate);

    info!("UART initialized at {} baud", loop_config.baud_rate);

    // Fresh nonce every boot so the host can tell a reboot from a reconnect
    let uid = DeviceUid::new(DEVICE_ID, YEAR, RoscRng.next_u64());

    let mut device_loop = unwrap!(DeviceLoop::new(
        uid,
        device,
        port,
        EmbassyClock,
        &LIVENESS,
        loop_config,
    )
    .map_err(|_| "invalid parameter layout"));

    let watchdog = unwrap!(device_loop.setup().map_err(|_| "UART setup failed"));

    // Watchdog runs at a higher priority than the blocking device loop
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner = EXECUTOR_WATCHDOG.start(interrupt::SWI_IRQ_1);
    spawner
        .spawn(tasks::watchdog_task(watchdog, loop_config.disable_interval_ms))
        .unwrap();

    info!("Device loop running");

    loop {
        device_loop.loop_once();
    }
}
