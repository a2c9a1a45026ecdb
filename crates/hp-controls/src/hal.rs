//! Port implementations over embedded-hal peripherals.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use hp_core::{Channel, ChannelMap};
use tracing::warn;

use crate::codec::ActuatorCodec;
use crate::error::{ControlError, ControlResult};
use crate::ports::{ActuatorPort, DigitalSwitch, SwitchLevel};

/// One MCP4725 DAC per channel, sharing an I2C bus.
pub struct Mcp4725Actuator<I> {
    bus: I,
    addresses: ChannelMap<u8>,
}

impl<I: I2c> Mcp4725Actuator<I> {
    pub fn new(bus: I, addresses: ChannelMap<u8>) -> Self {
        Self { bus, addresses }
    }

    pub fn release(self) -> I {
        self.bus
    }
}

impl<I: I2c> ActuatorPort for Mcp4725Actuator<I> {
    fn write(&mut self, channel: Channel, code: u16) -> bool {
        let address = self.addresses[channel];
        match self.bus.write(address, &ActuatorCodec::payload(code)) {
            Ok(()) => true,
            Err(err) => {
                warn!(%channel, address, ?err, "DAC write failed");
                false
            }
        }
    }
}

/// Active-low sensor-path enable pins, one per channel.
pub struct PinSwitch<P1, P3> {
    hp1: P1,
    hp3: P3,
}

impl<P1: OutputPin, P3: OutputPin> PinSwitch<P1, P3> {
    pub fn new(hp1: P1, hp3: P3) -> Self {
        Self { hp1, hp3 }
    }

    pub fn release(self) -> (P1, P3) {
        (self.hp1, self.hp3)
    }
}

fn drive_pin<P: OutputPin>(pin: &mut P, level: SwitchLevel) -> Result<(), P::Error> {
    match level {
        SwitchLevel::Low => pin.set_low(),
        SwitchLevel::High => pin.set_high(),
    }
}

impl<P1: OutputPin, P3: OutputPin> DigitalSwitch for PinSwitch<P1, P3> {
    fn set(&mut self, channel: Channel, level: SwitchLevel) -> ControlResult<()> {
        let ok = match channel {
            Channel::Hp1 => drive_pin(&mut self.hp1, level).is_ok(),
            Channel::Hp3 => drive_pin(&mut self.hp3, level).is_ok(),
        };
        if ok {
            Ok(())
        } else {
            Err(ControlError::Switch { channel })
        }
    }
}
