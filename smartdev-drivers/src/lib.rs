//! Smart device implementations
//!
//! This crate provides concrete implementations of the `SmartDevice`
//! trait defined in smartdev-core:
//!
//! - Hub: one parameter per attached spoke
//! - Digital spokes over embedded-hal GPIO (inputs, outputs)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod hub;

pub use hub::{DigitalInput, DigitalOutput, DigitalPin, Hub, Spoke};
