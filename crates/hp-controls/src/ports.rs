//! Capability interfaces for the board's hardware.
//!
//! The control algorithm never touches pins or buses directly. It drives an
//! [`ActuatorPort`], reads a [`SensePort`], toggles a [`DigitalSwitch`] and
//! waits on an [`embedded_hal::delay::DelayNs`]. Real boards implement these
//! over embedded-hal peripherals; tests and the simulator implement them
//! directly.

use core::fmt;

use embedded_hal::delay::DelayNs;
use hp_core::Channel;
use serde::{Deserialize, Serialize};

use crate::error::ControlResult;

/// Which analog node of a hotplate is being sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenseKind {
    /// Heater node, downstream of the heater-path shunt.
    Heater,
    /// Sensing-layer node, downstream of the sensor-path shunt.
    Sensor,
}

impl fmt::Display for SenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenseKind::Heater => f.write_str("heater"),
            SenseKind::Sensor => f.write_str("sensor"),
        }
    }
}

/// Logic level of the sensor-path isolation switch.
///
/// The switch is active low: `High` isolates the sensing layer from the
/// shared analog path, `Low` connects it for measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchLevel {
    Low,
    High,
}

/// Writes a native code to a channel's actuator.
pub trait ActuatorPort {
    /// Issue the actuator's register write for `channel`.
    ///
    /// Returns `false` if the transfer did not complete. No retries happen
    /// at this layer.
    fn write(&mut self, channel: Channel, code: u16) -> bool;
}

/// Takes single raw analog samples.
pub trait SensePort {
    /// One raw reading of `kind` on `channel`, expected in `[0, full_scale)`.
    fn sample_raw(&mut self, channel: Channel, kind: SenseKind) -> ControlResult<u16>;
}

/// Drives a channel's sensor-path isolation switch.
pub trait DigitalSwitch {
    fn set(&mut self, channel: Channel, level: SwitchLevel) -> ControlResult<()>;
}

impl<T: ActuatorPort + ?Sized> ActuatorPort for &mut T {
    fn write(&mut self, channel: Channel, code: u16) -> bool {
        (**self).write(channel, code)
    }
}

impl<T: SensePort + ?Sized> SensePort for &mut T {
    fn sample_raw(&mut self, channel: Channel, kind: SenseKind) -> ControlResult<u16> {
        (**self).sample_raw(channel, kind)
    }
}

impl<T: DigitalSwitch + ?Sized> DigitalSwitch for &mut T {
    fn set(&mut self, channel: Channel, level: SwitchLevel) -> ControlResult<()> {
        (**self).set(channel, level)
    }
}

/// Everything a board needs to regulate and measure both hotplates.
pub trait HotplateHardware: ActuatorPort + SensePort + DigitalSwitch + DelayNs {}

impl<T: ActuatorPort + SensePort + DigitalSwitch + DelayNs> HotplateHardware for T {}

/// Bundles four independent port objects into one [`HotplateHardware`].
#[derive(Debug)]
pub struct HotplateIo<A, S, W, D> {
    pub actuator: A,
    pub sense: S,
    pub switch: W,
    pub delay: D,
}

impl<A, S, W, D> HotplateIo<A, S, W, D> {
    pub fn new(actuator: A, sense: S, switch: W, delay: D) -> Self {
        Self {
            actuator,
            sense,
            switch,
            delay,
        }
    }

    pub fn into_parts(self) -> (A, S, W, D) {
        (self.actuator, self.sense, self.switch, self.delay)
    }
}

impl<A: ActuatorPort, S, W, D> ActuatorPort for HotplateIo<A, S, W, D> {
    fn write(&mut self, channel: Channel, code: u16) -> bool {
        self.actuator.write(channel, code)
    }
}

impl<A, S: SensePort, W, D> SensePort for HotplateIo<A, S, W, D> {
    fn sample_raw(&mut self, channel: Channel, kind: SenseKind) -> ControlResult<u16> {
        self.sense.sample_raw(channel, kind)
    }
}

impl<A, S, W: DigitalSwitch, D> DigitalSwitch for HotplateIo<A, S, W, D> {
    fn set(&mut self, channel: Channel, level: SwitchLevel) -> ControlResult<()> {
        self.switch.set(channel, level)
    }
}

impl<A, S, W, D: DelayNs> DelayNs for HotplateIo<A, S, W, D> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }
}
