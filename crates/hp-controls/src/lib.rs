//! Heater regulation and resistance measurement for a two-hotplate gas
//! sensor board.
//!
//! Each hotplate has a heater driven by a DAC through a series shunt and a
//! sensing layer biased from the supply through a second shunt. This crate
//! regulates the heater node voltage in closed loop and derives heater and
//! sensing-layer resistances from divider voltages.
//!
//! # Architecture
//!
//! - **Ports**: hardware is reached only through [`ActuatorPort`], [`SensePort`],
//!   [`DigitalSwitch`] and `embedded_hal::delay::DelayNs`
//! - **Codec**: pure millivolt to DAC-code conversion
//! - **Regulator**: fixed-iteration proportional correction loop
//! - **Resistance model**: divider formulas with explicit division faults
//! - **Measurement cycle**: all channels, every cycle, aggregate result
//! - **Board**: owns hardware, configuration and channel state
//!
//! Everything is synchronous. Callers must serialise operations that touch
//! the same channel.

pub mod board;
pub mod codec;
pub mod config;
pub mod cycle;
pub mod error;
pub mod hal;
pub mod ports;
pub mod regulator;
pub mod resistance;
pub mod sense;
pub mod state;

pub use board::HotplateBoard;
pub use codec::ActuatorCodec;
pub use config::{AbortPolicy, ActuatorConfig, BoardConfig, RegulatorConfig, SenseConfig, ShuntPair};
pub use cycle::{ChannelMeasurement, CycleReport, DividerReading, MeasurementCycle};
pub use error::{ControlError, ControlResult};
pub use hal::{Mcp4725Actuator, PinSwitch};
pub use ports::{
    ActuatorPort, DigitalSwitch, HotplateHardware, HotplateIo, SenseKind, SensePort, SwitchLevel,
};
pub use regulator::{HeaterRegulator, IterationRecord, RegulationReport};
pub use state::{ChannelBank, ChannelState, DriveRecord, MeasurementRecord, RegulationState};

pub use hp_core::{Channel, ChannelMap};
