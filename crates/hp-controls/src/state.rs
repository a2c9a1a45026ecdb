//! Per-hotplate mutable state.
//!
//! A [`ChannelState`] is split into two records with disjoint writers: the
//! regulator owns the [`DriveRecord`], the measurement cycle owns the
//! [`MeasurementRecord`]. The split borrows keep either side from touching
//! the other's fields.

use core::fmt;

use hp_core::{ChannelMap, Resistance, ohm};
use serde::{Deserialize, Serialize};

/// Regulation state of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegulationState {
    #[default]
    Off,
    Converging,
    Regulated,
}

impl fmt::Display for RegulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegulationState::Off => f.write_str("off"),
            RegulationState::Converging => f.write_str("converging"),
            RegulationState::Regulated => f.write_str("regulated"),
        }
    }
}

/// Actuator-side fields, written only by the heater drive path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveRecord {
    /// Voltage last written to the actuator (mV).
    pub commanded_mv: u16,
    /// Heater voltage the regulator is steering towards (mV).
    pub target_mv: u16,
    /// Heater node voltage seen by the last regulation step (mV).
    pub last_heater_mv: u16,
    pub state: RegulationState,
}

/// Sense-side fields, written only by the measurement cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Sensing-layer node voltage from the last cycle (mV).
    pub last_sensor_mv: u16,
    /// `None` until measured, or after a failed measurement.
    pub heater_ohm: Option<f64>,
    pub sensor_ohm: Option<f64>,
}

/// Everything known about one hotplate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    drive: DriveRecord,
    measurement: MeasurementRecord,
}

impl ChannelState {
    pub fn drive(&self) -> &DriveRecord {
        &self.drive
    }

    pub fn measurement(&self) -> &MeasurementRecord {
        &self.measurement
    }

    pub fn commanded_mv(&self) -> u16 {
        self.drive.commanded_mv
    }

    pub fn target_mv(&self) -> u16 {
        self.drive.target_mv
    }

    pub fn last_heater_mv(&self) -> u16 {
        self.drive.last_heater_mv
    }

    pub fn last_sensor_mv(&self) -> u16 {
        self.measurement.last_sensor_mv
    }

    pub fn regulation_state(&self) -> RegulationState {
        self.drive.state
    }

    pub fn enabled(&self) -> bool {
        self.drive.state != RegulationState::Off
    }

    pub fn heater_resistance(&self) -> Option<Resistance> {
        self.measurement.heater_ohm.map(ohm)
    }

    pub fn sensor_resistance(&self) -> Option<Resistance> {
        self.measurement.sensor_ohm.map(ohm)
    }

    pub(crate) fn drive_mut(&mut self) -> &mut DriveRecord {
        &mut self.drive
    }

    /// Drive record for reading, measurement record for writing.
    pub(crate) fn split_for_measurement(&mut self) -> (&DriveRecord, &mut MeasurementRecord) {
        (&self.drive, &mut self.measurement)
    }
}

/// State of every hotplate on the board.
pub type ChannelBank = ChannelMap<ChannelState>;

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::{Channel, as_ohm};

    #[test]
    fn new_state_is_zeroed_and_disabled() {
        let bank = ChannelBank::default();
        for (_, state) in bank.iter() {
            assert_eq!(state.commanded_mv(), 0);
            assert_eq!(state.target_mv(), 0);
            assert!(!state.enabled());
            assert!(state.heater_resistance().is_none());
        }
    }

    #[test]
    fn split_borrow_writes_only_measurement() {
        let mut bank = ChannelBank::default();
        bank[Channel::Hp1].drive_mut().commanded_mv = 600;
        let (drive, meas) = bank[Channel::Hp1].split_for_measurement();
        meas.heater_ohm = Some(drive.commanded_mv as f64 / 2.0);
        assert_eq!(
            bank[Channel::Hp1].heater_resistance().map(as_ohm),
            Some(300.0)
        );
        assert_eq!(bank[Channel::Hp3], ChannelState::default());
    }
}
