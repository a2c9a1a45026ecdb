//! Simulated two-hotplate board.
//!
//! Implements every port trait over a pair of [`HotplatePlant`]s, with DAC
//! and ADC quantization taken from the board configuration. Simulated time
//! only advances through [`DelayNs`], so settling delays inside the control
//! code are what lets the plates heat up.

use embedded_hal::delay::DelayNs;
use hp_controls::{
    ActuatorCodec, ActuatorPort, BoardConfig, ControlError, ControlResult, DigitalSwitch,
    SenseKind, SensePort, SwitchLevel,
};
use hp_core::{Channel, ChannelMap};
use tracing::trace;

use crate::error::SimResult;
use crate::plant::{HotplateParams, HotplatePlant};

/// Faults injected into the simulated ports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultInjection {
    /// Actuator writes on the channel report a bus error (the code is not applied).
    pub write: ChannelMap<bool>,
    /// Every sample on the channel fails.
    pub sense: ChannelMap<bool>,
}

#[derive(Debug, Clone)]
struct SimChannel {
    plant: HotplatePlant,
    dac_code: u16,
    sensor_connected: bool,
}

/// Simulated board hardware.
#[derive(Debug, Clone)]
pub struct SimBoard {
    config: BoardConfig,
    codec: ActuatorCodec,
    channels: ChannelMap<SimChannel>,
    faults: FaultInjection,
    elapsed_ns: u64,
    writes: u64,
}

impl SimBoard {
    pub fn new(config: BoardConfig, params: ChannelMap<HotplateParams>) -> SimResult<Self> {
        config.validate()?;
        let hp1 = HotplatePlant::new(params.hp1)?;
        let hp3 = HotplatePlant::new(params.hp3)?;
        let channels = ChannelMap::new(hp1, hp3).map(|_, plant| SimChannel {
            plant,
            dac_code: 0,
            sensor_connected: false,
        });
        Ok(Self {
            codec: config.actuator.codec(),
            config,
            channels,
            faults: FaultInjection::default(),
            elapsed_ns: 0,
            writes: 0,
        })
    }

    /// ENS145 shield defaults with sensing layers sized to their shunts.
    pub fn ens145() -> SimResult<Self> {
        Self::new(BoardConfig::default(), Self::ens145_plants())
    }

    /// Hotplate parameters matching the ENS145 shunt table.
    pub fn ens145_plants() -> ChannelMap<HotplateParams> {
        let hp1 = HotplateParams::default();
        let hp3 = HotplateParams {
            sensor_cold_ohm: 50_000.0,
            ..HotplateParams::default()
        };
        ChannelMap::new(hp1, hp3)
    }

    pub fn faults_mut(&mut self) -> &mut FaultInjection {
        &mut self.faults
    }

    pub fn plant(&self, channel: Channel) -> &HotplatePlant {
        &self.channels[channel].plant
    }

    pub fn dac_code(&self, channel: Channel) -> u16 {
        self.channels[channel].dac_code
    }

    /// Simulated time elapsed, in seconds.
    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_ns as f64 * 1e-9
    }

    /// Actuator writes attempted so far.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    fn dac_mv(&self, channel: Channel) -> f64 {
        self.codec.to_millivolts(self.channels[channel].dac_code)
    }

    fn quantize(&self, node_mv: f64) -> u16 {
        let sense = &self.config.sense;
        let raw = node_mv * f64::from(sense.full_scale) / f64::from(sense.reference_mv);
        let max = f64::from(sense.full_scale.saturating_sub(1));
        raw.floor().clamp(0.0, max) as u16
    }
}

impl ActuatorPort for SimBoard {
    fn write(&mut self, channel: Channel, code: u16) -> bool {
        self.writes += 1;
        if self.faults.write[channel] {
            return false;
        }
        self.channels[channel].dac_code = code.min(self.config.actuator.full_scale_code);
        true
    }
}

impl SensePort for SimBoard {
    fn sample_raw(&mut self, channel: Channel, kind: SenseKind) -> ControlResult<u16> {
        if self.faults.sense[channel] {
            return Err(ControlError::Sense {
                channel,
                kind,
                what: "injected sense fault".to_string(),
            });
        }
        let shunts = self.config.shunts[channel];
        let ch = &self.channels[channel];
        let node_mv = match kind {
            SenseKind::Heater => ch.plant.heater_node_mv(self.dac_mv(channel), shunts.heater_ohm),
            // An isolated sensing layer leaves the input pulled to ground.
            SenseKind::Sensor if !ch.sensor_connected => 0.0,
            SenseKind::Sensor => ch
                .plant
                .sensor_node_mv(f64::from(self.config.sense.reference_mv), shunts.sensor_ohm),
        };
        let raw = self.quantize(node_mv);
        trace!(%channel, %kind, node_mv, raw, "simulated sample");
        Ok(raw)
    }
}

impl DigitalSwitch for SimBoard {
    fn set(&mut self, channel: Channel, level: SwitchLevel) -> ControlResult<()> {
        self.channels[channel].sensor_connected = level == SwitchLevel::Low;
        Ok(())
    }
}

impl DelayNs for SimBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
        let dt_s = f64::from(ns) * 1e-9;
        for channel in Channel::ALL {
            let v_dac = self.dac_mv(channel);
            let shunt = self.config.shunts[channel].heater_ohm;
            self.channels[channel].plant.advance(dt_s, v_dac, shunt);
        }
    }
}
