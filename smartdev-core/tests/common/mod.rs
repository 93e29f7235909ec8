//! Simulated hardware for device loop tests
//!
//! Time only moves when the loop waits: a read that times out advances the
//! shared clock by the full timeout, and a frame scheduled for later
//! advances it to the frame's arrival time.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use smartdev_core::{DeviceLoop, Liveness, LoopConfig, SmartDevice};
use smartdev_hal::{Clock, SerialPort};
use smartdev_protocol::frame;
use smartdev_protocol::{
    DeviceUid, Message, ParamLayout, ParamMap, ParamTable, MESSAGE_DELIMITER,
};

pub const TEST_UID: DeviceUid = DeviceUid::new(0x0080, 1, 0xdead_beef_dead_beef);

pub type SimLoop<'a> = DeviceLoop<'a, TestDevice, SimPort, SimClock>;

/// Millisecond clock shared between the port and the loop
#[derive(Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u64) {
        self.advance(ms);
    }
}

/// Serial port fed from a queue of timed frames
pub struct SimPort {
    clock: SimClock,
    inbound: VecDeque<(u64, Vec<u8>)>,
    outbound: Vec<u8>,
    pub baud_rate: Option<u32>,
}

impl SimPort {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            inbound: VecDeque::new(),
            outbound: Vec::new(),
            baud_rate: None,
        }
    }

    /// Queue raw frame bytes (without delimiter) arriving at `at`
    pub fn push_frame_at(&mut self, at: u64, frame: &[u8]) {
        self.inbound.push_back((at, frame.to_vec()));
    }

    /// Queue raw frame bytes arriving immediately
    pub fn push_frame(&mut self, frame: &[u8]) {
        let now = self.clock.now_ms();
        self.push_frame_at(now, frame);
    }

    /// Queue an arbitrary unframed message body, COBS-encoded
    pub fn push_raw(&mut self, bytes: &[u8]) {
        let mut buf = [0u8; 600];
        let len = frame::encode(bytes, &mut buf).unwrap();
        self.push_frame(&buf[..len]);
    }

    /// Queue a well-formed message
    pub fn push_message(&mut self, msg: &Message) {
        self.push_raw(msg.as_bytes());
    }

    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Raw bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.outbound
    }

    /// Written frames, delimiters stripped
    pub fn frames(&self) -> Vec<Vec<u8>> {
        let mut frames: Vec<Vec<u8>> = self
            .outbound
            .split(|&b| b == MESSAGE_DELIMITER)
            .map(<[u8]>::to_vec)
            .collect();
        // Everything written is delimiter-terminated
        assert_eq!(frames.pop(), Some(Vec::new()));
        frames
    }

    /// Written frames decoded back into messages
    pub fn messages(&self) -> Vec<Message> {
        self.frames()
            .iter()
            .map(|frame| {
                let mut msg = Message::default();
                let len = msg.from_cobs(frame).unwrap();
                assert_eq!(len, msg.len());
                assert!(msg.verify_checksum());
                msg
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.outbound.clear();
    }
}

impl SerialPort for SimPort {
    type Error = ();

    fn open(&mut self, baud_rate: u32) -> Result<(), ()> {
        self.baud_rate = Some(baud_rate);
        Ok(())
    }

    fn read_until_delimiter(
        &mut self,
        _delimiter: u8,
        buf: &mut [u8],
        timeout_ms: u64,
    ) -> Result<usize, ()> {
        let deadline = self.clock.now_ms() + timeout_ms;
        let due = matches!(self.inbound.front(), Some((at, _)) if *at <= deadline);
        if !due {
            self.clock.set(deadline);
            return Ok(0);
        }

        let (at, frame) = self.inbound.pop_front().unwrap();
        if at > self.clock.now_ms() {
            self.clock.set(at);
        }
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        Ok(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), ()> {
        self.outbound.extend_from_slice(data);
        Ok(())
    }
}

/// Device backed by plain byte vectors
pub struct TestDevice {
    layout: Vec<Option<usize>>,
    values: RefCell<Vec<Vec<u8>>>,
    writable: ParamMap,
    pub setups: Cell<u32>,
    pub disables: Cell<u32>,
    pub reads: RefCell<Vec<ParamMap>>,
}

impl TestDevice {
    /// Every slot with storage starts out as a run of its own index
    pub fn new(layout: &[Option<usize>], writable: ParamMap) -> Self {
        let values = layout
            .iter()
            .enumerate()
            .map(|(index, size)| vec![index as u8; size.unwrap_or(0)])
            .collect();
        Self {
            layout: layout.to_vec(),
            values: RefCell::new(values),
            writable,
            setups: Cell::new(0),
            disables: Cell::new(0),
            reads: RefCell::new(Vec::new()),
        }
    }

    /// u8, u32, u16; only the u32 is writable
    pub fn three_params() -> Self {
        let device = Self::new(&[Some(1), Some(4), Some(2)], ParamMap::single(1));
        device.set_value(0, &[0xAA]);
        device.set_value(1, &[0x01, 0x02, 0x03, 0x04]);
        device.set_value(2, &[0xEF, 0xBE]);
        device
    }

    pub fn set_value(&self, index: usize, bytes: &[u8]) {
        self.values.borrow_mut()[index] = bytes.to_vec();
    }

    pub fn value(&self, index: usize) -> Vec<u8> {
        self.values.borrow()[index].clone()
    }

    /// A table with this device's layout, for building host messages
    pub fn table(&self) -> ParamTable {
        ParamTable::new(&self.layout).unwrap()
    }

    fn declared(&self) -> ParamMap {
        ParamMap::first(self.layout.len())
    }
}

impl SmartDevice for TestDevice {
    fn setup(&self) {
        self.setups.set(self.setups.get() + 1);
    }

    fn get_parameters(&self) -> ParamLayout {
        ParamLayout::from_slice(&self.layout).unwrap()
    }

    fn read(&self, present: ParamMap, params: &mut ParamTable) -> ParamMap {
        self.reads.borrow_mut().push(present);
        let values = self.values.borrow();
        for index in present & self.declared() {
            if let Some(dst) = params.get_mut(index) {
                dst.copy_from_slice(&values[index]);
            }
        }
        present & self.declared()
    }

    fn write(&self, present: ParamMap, params: &ParamTable) -> ParamMap {
        let written = present & self.writable;
        let mut values = self.values.borrow_mut();
        for index in written {
            if let Some(src) = params.get(index) {
                values[index] = src.to_vec();
            }
        }
        written
    }

    fn disable(&self) {
        self.disables.set(self.disables.get() + 1);
    }
}

/// Build a loop over `device` with a fresh simulated port and clock at t=0
pub fn new_loop<'a>(device: &'a TestDevice, liveness: &'a Liveness) -> SimLoop<'a> {
    let clock = SimClock::default();
    let port = SimPort::new(clock.clone());
    DeviceLoop::new(TEST_UID, device, port, clock, liveness, LoopConfig::default()).unwrap()
}

/// Queue `msg` and serve it
pub fn exchange(device_loop: &mut SimLoop<'_>, msg: &Message) -> Vec<Message> {
    device_loop.serial_mut().port_mut().clear();
    device_loop.serial_mut().port_mut().push_message(msg);
    device_loop.serve_once(100);
    device_loop.serial().port().messages()
}

/// Queue raw frame bytes and return the frames written in response
pub fn exchange_frame(device_loop: &mut SimLoop<'_>, frame: &[u8]) -> Vec<Vec<u8>> {
    device_loop.serial_mut().port_mut().clear();
    device_loop.serial_mut().port_mut().push_frame(frame);
    device_loop.serve_once(100);
    device_loop.serial().port().frames()
}
