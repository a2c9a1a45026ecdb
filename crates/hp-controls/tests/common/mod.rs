//! Scripted hardware shared by the integration tests.

#![allow(dead_code)]

use embedded_hal::delay::DelayNs;
use hp_controls::{
    ActuatorCodec, ActuatorPort, Channel, ChannelMap, ControlError, ControlResult, DigitalSwitch,
    SenseConfig, SenseKind, SensePort, SwitchLevel,
};

/// Each heater node reads `heater_ratio` of its actuator output; each sensor
/// node reads a fixed raw code.
pub struct MockBoard {
    pub codec: ActuatorCodec,
    pub sense: SenseConfig,
    pub heater_ratio: ChannelMap<f64>,
    pub sensor_raw: ChannelMap<u16>,
    pub sense_fails: ChannelMap<bool>,
    pub write_fails: bool,
    pub writes: Vec<(Channel, u16)>,
    pub switch_log: Vec<(Channel, SwitchLevel)>,
    pub samples: Vec<(Channel, SenseKind)>,
    pub elapsed_ns: u64,
}

impl MockBoard {
    pub fn new(heater_ratio: f64) -> Self {
        Self {
            codec: ActuatorCodec::default(),
            sense: SenseConfig::default(),
            heater_ratio: ChannelMap::new(heater_ratio, heater_ratio),
            sensor_raw: ChannelMap::new(512, 256),
            sense_fails: ChannelMap::default(),
            write_fails: false,
            writes: Vec::new(),
            switch_log: Vec::new(),
            samples: Vec::new(),
            elapsed_ns: 0,
        }
    }

    pub fn last_code(&self, channel: Channel) -> u16 {
        self.writes
            .iter()
            .rev()
            .find(|(ch, _)| *ch == channel)
            .map_or(0, |(_, code)| *code)
    }

    pub fn writes_for(&self, channel: Channel) -> Vec<u16> {
        self.writes
            .iter()
            .filter(|(ch, _)| *ch == channel)
            .map(|(_, code)| *code)
            .collect()
    }
}

impl ActuatorPort for MockBoard {
    fn write(&mut self, channel: Channel, code: u16) -> bool {
        self.writes.push((channel, code));
        !self.write_fails
    }
}

impl SensePort for MockBoard {
    fn sample_raw(&mut self, channel: Channel, kind: SenseKind) -> ControlResult<u16> {
        self.samples.push((channel, kind));
        if self.sense_fails[channel] {
            return Err(ControlError::Sense {
                channel,
                kind,
                what: "ADC not responding".to_string(),
            });
        }
        match kind {
            SenseKind::Heater => {
                let node_mv =
                    self.codec.to_millivolts(self.last_code(channel)) * self.heater_ratio[channel];
                let raw = node_mv * f64::from(self.sense.full_scale)
                    / f64::from(self.sense.reference_mv);
                Ok(raw.floor() as u16)
            }
            SenseKind::Sensor => Ok(self.sensor_raw[channel]),
        }
    }
}

impl DigitalSwitch for MockBoard {
    fn set(&mut self, channel: Channel, level: SwitchLevel) -> ControlResult<()> {
        self.switch_log.push((channel, level));
        Ok(())
    }
}

impl DelayNs for MockBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}
