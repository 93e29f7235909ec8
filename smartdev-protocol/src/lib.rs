//! Smart Device Serial Protocol
//!
//! This crate defines the messages a smart device exchanges with its host
//! over a serial link, and the framing that carries them.
//!
//! # Protocol Overview
//!
//! Each message is COBS-encoded and terminated by a single `0x00`:
//! ```text
//! ┌──────┬────────┬─────────────┬──────────┐
//! │ TYPE │ LENGTH │ PAYLOAD     │ CHECKSUM │   --COBS-->  [frame] 00
//! │ 1B   │ 1B     │ 0–255B      │ 1B       │
//! └──────┴────────┴─────────────┴──────────┘
//! ```
//!
//! The host drives the conversation. The device answers reads and writes,
//! pushes subscribed parameters on a timer, and exchanges heartbeats with
//! the host to prove the link is alive.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod message;
pub mod params;
pub mod types;

pub use frame::{FrameError, MESSAGE_DELIMITER};
pub use message::{
    Message, MessageError, ENCODING_MAX_SIZE, GENERIC_ERROR_FRAME, MESSAGE_MAX_SIZE,
    MESSAGE_MIN_SIZE, PAYLOAD_MAX_SIZE,
};
pub use params::{LayoutError, Param, ParamLayout, ParamMap, ParamTable, MAX_PARAMETERS};
pub use types::{DeviceUid, ErrorCode, HeartbeatId, Interval, MessageType, NO_SUBSCRIPTION};
