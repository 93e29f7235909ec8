//! Main device loop
//!
//! One iteration of [`DeviceLoop::loop_once`]:
//!
//! ```text
//! select(heartbeat, update?) ──► send HB_REQ / DEV_DATA if due
//!            │
//!            ▼
//! serve_once(stop - now) until stop ──► recv ──► dispatch ──► reply
//! ```
//!
//! Everything runs on one thread of control. The only concurrent actor is
//! the [`Watchdog`] returned by [`DeviceLoop::setup`].

use smartdev_hal::{Clock, SerialPort};
use smartdev_protocol::{
    DeviceUid, ErrorCode, HeartbeatId, Interval, LayoutError, Message, MessageError,
    MessageType, ParamMap, ParamTable, NO_SUBSCRIPTION,
};

use super::serial::{Recv, SerialHandler};
use crate::config::LoopConfig;
use crate::log::{debug, info, trace, warn};
use crate::safety::{Liveness, Watchdog};
use crate::scheduler::{select, Task};
use crate::traits::SmartDevice;

/// Id carried by every heartbeat request this device sends
pub const HEARTBEAT_ID: HeartbeatId = 0xFF;

/// Serves one smart device over one serial port
///
/// Owns the parameter table, the message buffer and the schedule. The
/// device itself is borrowed so it can be shared with the watchdog.
pub struct DeviceLoop<'a, D: ?Sized, S, C> {
    uid: DeviceUid,
    device: &'a D,
    serial: SerialHandler<S>,
    clock: C,
    liveness: &'a Liveness,
    config: LoopConfig,
    params: ParamTable,
    msg: Message,
    heartbeat: Task,
    update: Task,
    subscription: ParamMap,
}

impl<'a, D, S, C> DeviceLoop<'a, D, S, C>
where
    D: SmartDevice + ?Sized,
    S: SerialPort,
    C: Clock,
{
    /// Create a loop for `device`
    ///
    /// # Arguments
    /// - `uid`: Identity reported in SUB_RES
    /// - `liveness`: Flag shared with the watchdog
    ///
    /// Fails if the device declares an invalid parameter layout.
    pub fn new(
        uid: DeviceUid,
        device: &'a D,
        port: S,
        clock: C,
        liveness: &'a Liveness,
        config: LoopConfig,
    ) -> Result<Self, LayoutError> {
        let params = ParamTable::new(&device.get_parameters())?;
        let now = clock.now_ms();

        Ok(Self {
            uid,
            device,
            serial: SerialHandler::new(port),
            clock,
            liveness,
            config,
            params,
            msg: Message::new(MessageType::Ping),
            heartbeat: Task::new(config.heartbeat_interval_ms, now),
            update: Task::new(NO_SUBSCRIPTION, now),
            subscription: ParamMap::EMPTY,
        })
    }

    /// Bring up the link and the hardware
    ///
    /// The device is disabled right after setup so it starts in a safe
    /// state. The returned watchdog must be checked every
    /// `config.disable_interval_ms` by the integrator's timer.
    pub fn setup(&mut self) -> Result<Watchdog<'a, D>, S::Error> {
        self.serial.open(self.config.baud_rate)?;
        self.device.setup();
        self.device.disable();
        self.liveness.mark_active();
        info!(
            "device {=u16:#x} up, {} parameters",
            self.uid.device_id,
            self.params.len()
        );
        Ok(Watchdog::new(self.liveness, self.device))
    }

    /// Run one scheduling round and serve the host until the next deadline
    pub fn loop_once(&mut self) {
        let now = self.clock.now_ms();
        let mut stop = if self.is_subscribed() {
            select(&mut [&mut self.heartbeat, &mut self.update], now)
        } else {
            select(&mut [&mut self.heartbeat], now)
        };

        if self.heartbeat.clear_ready() {
            let built = self.msg.make_hb_req(HEARTBEAT_ID);
            self.reply(built);
        }
        if self.update.clear_ready() && !self.send_data(self.subscription) {
            self.serial.send_generic_error();
        }

        stop = stop.max(self.clock.now_ms() + self.config.min_serve_interval_ms);
        loop {
            let now = self.clock.now_ms();
            if now >= stop {
                break;
            }
            self.serve_once(stop - now);
        }
    }

    /// Read `present` from the device and send it as DEV_DATA
    ///
    /// If the values do not fit one message, each parameter goes out in its
    /// own DEV_DATA. Every fragment is attempted; returns true only if all
    /// of them were sent.
    pub fn send_data(&mut self, present: ParamMap) -> bool {
        let present = self.device.read(present, &mut self.params);
        match self.msg.make_dev_data(present, &self.params) {
            Ok(()) => return self.serial.send(&self.msg),
            Err(MessageError::PayloadOverflow) => {
                debug!("splitting DEV_DATA into {} messages", present.count());
            }
            Err(_) => return false,
        }

        let mut success = true;
        for index in present {
            let sent = self
                .msg
                .make_dev_data(ParamMap::single(index), &self.params)
                .is_ok()
                && self.serial.send(&self.msg);
            success &= sent;
        }
        success
    }

    /// Receive and handle at most one message, waiting up to `timeout` ms
    pub fn serve_once(&mut self, timeout: u64) {
        if timeout < self.config.min_timeout_ms {
            self.clock.delay_ms(timeout);
            return;
        }

        match self.serial.recv(&mut self.msg, timeout) {
            Recv::Idle => {}
            Recv::Rejected(code) => {
                warn!("rejected frame: {}", code);
                self.send_error(code);
            }
            Recv::Valid => {
                self.liveness.mark_active();
                self.dispatch();
            }
        }
    }

    /// Change what is pushed to the host and how often
    ///
    /// The subscription becomes whatever the device could actually read out
    /// of `present`. An interval of zero cancels it; anything else is
    /// clamped to the configured range.
    pub fn set_subscription(&mut self, present: ParamMap, interval: Interval) {
        self.subscription = self.device.read(present, &mut self.params);
        let interval = self.config.clamp_interval(interval);
        self.update.set_interval(interval);
        debug!(
            "subscription {=u16:#b} every {=u16} ms",
            self.subscription.bits(),
            interval
        );
    }

    pub fn is_subscribed(&self) -> bool {
        self.update.interval() != NO_SUBSCRIPTION
    }

    pub fn subscription(&self) -> ParamMap {
        self.subscription
    }

    pub fn subscription_interval(&self) -> Interval {
        self.update.interval()
    }

    pub fn uid(&self) -> &DeviceUid {
        &self.uid
    }

    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    pub fn serial(&self) -> &SerialHandler<S> {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut SerialHandler<S> {
        &mut self.serial
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn dispatch(&mut self) {
        let Some(msg_type) = self.msg.message_type() else {
            warn!("unknown message type {=u8:#x}", self.msg.type_byte());
            return self.send_error(ErrorCode::InvalidType);
        };
        trace!("dispatch {}", msg_type);

        match msg_type {
            MessageType::SubReq => match self.msg.read_sub_req() {
                Ok((present, interval)) => {
                    self.set_subscription(present, interval);
                    self.send_subscription();
                }
                Err(_) => self.send_error(ErrorCode::InvalidType),
            },
            MessageType::Ping => self.send_subscription(),
            MessageType::DevWrite => match self.msg.read_dev_write(&mut self.params) {
                Ok(present) => {
                    let written = self.device.write(present, &self.params);
                    self.send_requested(written);
                }
                Err(_) => self.send_error(ErrorCode::InvalidType),
            },
            MessageType::DevRead => match self.msg.read_dev_read() {
                Ok(present) => self.send_requested(present),
                Err(_) => self.send_error(ErrorCode::InvalidType),
            },
            MessageType::DevDisable => {
                info!("disabled by host");
                self.device.disable();
            }
            MessageType::HbReq => match self.msg.read_hb_req() {
                Ok(id) => {
                    let built = self.msg.make_hb_res(id);
                    self.reply(built);
                }
                Err(_) => self.send_error(ErrorCode::InvalidType),
            },
            MessageType::HbRes => match self.msg.read_hb_res() {
                Ok(id) => {
                    trace!("heartbeat {=u8:#x} answered", id);
                }
                Err(_) => self.send_error(ErrorCode::InvalidType),
            },
            MessageType::SubRes | MessageType::DevData | MessageType::Error => {
                self.send_error(ErrorCode::InvalidType)
            }
        }
    }

    /// SUB_RES reply shared by PING and SUB_REQ
    fn send_subscription(&mut self) {
        let built = self
            .msg
            .make_sub_res(self.subscription, self.update.interval(), &self.uid);
        self.reply(built);
    }

    /// DEV_DATA reply for a read or write, minus what the subscription
    /// already delivers
    fn send_requested(&mut self, present: ParamMap) {
        if !self.send_data(present & !self.subscription) {
            self.serial.send_generic_error();
        }
    }

    fn send_error(&mut self, code: ErrorCode) {
        let built = self.msg.make_error(code);
        self.reply(built);
    }

    /// Send the message just built, or the generic error frame if building failed
    fn reply(&mut self, built: Result<(), MessageError>) {
        match built {
            Ok(()) => {
                self.serial.send(&self.msg);
            }
            Err(_) => {
                self.serial.send_generic_error();
            }
        }
    }
}
