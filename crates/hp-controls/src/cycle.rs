//! One heater + sensor measurement pass over every hotplate.
//!
//! Order is fixed: HP1 heater, HP1 sensor, HP3 heater, HP3 sensor. A failing
//! step is recorded and the pass carries on, so every channel is attempted on
//! every cycle and the report carries the aggregate result.

use embedded_hal::delay::DelayNs;
use hp_core::{Channel, ChannelMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BoardConfig, SenseConfig, ShuntPair};
use crate::error::ControlResult;
use crate::ports::{DigitalSwitch, SensePort};
use crate::resistance::{heater_resistance, sensor_resistance};
use crate::sense::{measure_heater_mv, measure_sensor_mv};
use crate::state::{ChannelBank, ChannelState};

/// Voltage and derived resistance of one divider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividerReading {
    pub node_mv: u16,
    pub ohm: f64,
}

/// Outcome of one channel's pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMeasurement {
    pub heater: ControlResult<DividerReading>,
    pub sensor: ControlResult<DividerReading>,
}

impl ChannelMeasurement {
    pub fn is_ok(&self) -> bool {
        self.heater.is_ok() && self.sensor.is_ok()
    }
}

/// Outcome of a full cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub channels: ChannelMap<ChannelMeasurement>,
}

impl CycleReport {
    /// `true` only if every step on every channel succeeded.
    pub fn is_ok(&self) -> bool {
        self.channels.iter().all(|(_, m)| m.is_ok())
    }
}

/// Measurement side of the board: owns the write path to resistances.
#[derive(Debug, Clone)]
pub struct MeasurementCycle {
    sense: SenseConfig,
    shunts: ChannelMap<ShuntPair>,
}

impl MeasurementCycle {
    pub fn new(board: &BoardConfig) -> Self {
        Self {
            sense: board.sense.clone(),
            shunts: board.shunts,
        }
    }

    /// Measure every channel and store the results in `bank`.
    pub fn run<H>(&self, hw: &mut H, bank: &mut ChannelBank) -> CycleReport
    where
        H: SensePort + DigitalSwitch + DelayNs,
    {
        let channels = ChannelMap::from_fn(|channel| {
            let state = &mut bank[channel];
            let heater = self.measure_heater(hw, state, channel);
            let sensor = self.measure_sensor(hw, state, channel);
            ChannelMeasurement { heater, sensor }
        });
        let report = CycleReport { channels };
        if !report.is_ok() {
            warn!("measurement cycle finished with failures");
        }
        report
    }

    /// Heater node voltage and heater resistance of `channel`.
    ///
    /// Uses the commanded actuator voltage as the divider drive.
    pub fn measure_heater<H>(
        &self,
        hw: &mut H,
        state: &mut ChannelState,
        channel: Channel,
    ) -> ControlResult<DividerReading>
    where
        H: SensePort + DelayNs,
    {
        let (drive, meas) = state.split_for_measurement();
        let result = measure_heater_mv(hw, &self.sense, channel).and_then(|node_mv| {
            let ohm = heater_resistance(
                f64::from(node_mv),
                f64::from(drive.commanded_mv),
                self.shunts[channel].heater_ohm,
            )?;
            Ok(DividerReading { node_mv, ohm })
        });
        match &result {
            Ok(r) => {
                debug!(%channel, node_mv = r.node_mv, ohm = r.ohm, "heater measured");
                meas.heater_ohm = Some(r.ohm);
            }
            Err(err) => {
                warn!(%channel, %err, "heater measurement failed");
                meas.heater_ohm = None;
            }
        }
        result
    }

    /// Sensing-layer node voltage and resistance of `channel`.
    pub fn measure_sensor<H>(
        &self,
        hw: &mut H,
        state: &mut ChannelState,
        channel: Channel,
    ) -> ControlResult<DividerReading>
    where
        H: SensePort + DigitalSwitch + DelayNs,
    {
        let (_, meas) = state.split_for_measurement();
        let sampled = measure_sensor_mv(hw, &self.sense, channel);
        // A failed read leaves no voltage behind.
        meas.last_sensor_mv = sampled.as_ref().map_or(0, |mv| *mv);
        let result = sampled.and_then(|node_mv| {
            let ohm = sensor_resistance(
                f64::from(node_mv),
                f64::from(self.sense.reference_mv),
                self.shunts[channel].sensor_ohm,
            )?;
            Ok(DividerReading { node_mv, ohm })
        });
        match &result {
            Ok(r) => {
                debug!(%channel, node_mv = r.node_mv, ohm = r.ohm, "sensor measured");
                meas.sensor_ohm = Some(r.ohm);
            }
            Err(err) => {
                warn!(%channel, %err, "sensor measurement failed");
                meas.sensor_ohm = None;
            }
        }
        result
    }
}
