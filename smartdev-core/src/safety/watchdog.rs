//! Link watchdog
//!
//! The device loop marks the link alive every time it decodes a valid
//! message. A periodic timer calls [`Watchdog::check`]; if nothing valid
//! arrived since the previous check, the device is disabled.
//!
//! ```text
//!  main loop                         timer (every disable interval)
//!  ─────────                         ──────────────────────────────
//!  valid message ──► mark_active()   check(): was alive? ── no ──► disable()
//!                         │                     │
//!                         └──────► AtomicBool ◄─┘ cleared
//! ```

use portable_atomic::{AtomicBool, Ordering};

use crate::log::warn;
use crate::traits::SmartDevice;

/// Shared "host is talking to us" flag
///
/// Starts out active so the first timer tick after boot cannot disable a
/// device the host has not had a chance to reach yet.
#[derive(Debug)]
pub struct Liveness {
    active: AtomicBool,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
        }
    }

    /// Record that a valid message was received
    pub fn mark_active(&self) {
        self.active.store(true, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }
}

/// Periodic liveness check for one device
///
/// Holds only shared references, so it can be handed to an interrupt
/// or timer task while the device loop keeps running.
pub struct Watchdog<'a, D: ?Sized> {
    liveness: &'a Liveness,
    device: &'a D,
}

impl<D: ?Sized> Clone for Watchdog<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: ?Sized> Copy for Watchdog<'_, D> {}

impl<'a, D: SmartDevice + ?Sized> Watchdog<'a, D> {
    pub fn new(liveness: &'a Liveness, device: &'a D) -> Self {
        Self { liveness, device }
    }

    /// Run one watchdog tick
    ///
    /// Disables the device if no valid message arrived since the last
    /// tick, then clears the flag. Returns true if the device was disabled.
    pub fn check(&self) -> bool {
        if self.liveness.take() {
            return false;
        }
        warn!("link silent, disabling device");
        self.device.disable();
        true
    }
}
