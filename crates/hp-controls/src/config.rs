//! Board configuration.
//!
//! Fixed at initialization and shared read-only by every component. The
//! defaults describe the ENS145 development shield: two MCP4725 DACs on the
//! I2C bus, a 10-bit ADC referenced to the 3.3 V supply, and the shunt
//! resistors fitted to each hotplate.

use hp_core::{Channel, ChannelMap};
use serde::{Deserialize, Serialize};

use crate::codec::ActuatorCodec;
use crate::error::{ControlError, ControlResult};

/// Actuator (DAC) configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Code corresponding to the reference voltage.
    pub full_scale_code: u16,
    /// Actuator reference voltage (mV).
    pub reference_mv: u16,
    /// Highest voltage the actuator may be commanded to (mV). Sits below the
    /// reference where the output saturates.
    pub ceiling_mv: u16,
    /// 7-bit bus address of each channel's DAC.
    pub bus_address: ChannelMap<u8>,
}

impl ActuatorConfig {
    pub fn codec(&self) -> ActuatorCodec {
        ActuatorCodec::new(self.full_scale_code, self.reference_mv)
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            full_scale_code: 4095,
            reference_mv: 3300,
            ceiling_mv: 3000,
            bus_address: ChannelMap::new(0x60, 0x61),
        }
    }
}

/// Analog sense path configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenseConfig {
    /// Number of distinct ADC codes; raw readings lie in `[0, full_scale)`.
    pub full_scale: u16,
    /// Supply reference voltage (mV), used for conversion and the sensor divider.
    pub reference_mv: u16,
    /// Multiplier applied to the raw code before conversion.
    pub calibration_scale: f64,
    /// Samples taken per settled read; only the last one is kept.
    pub settle_samples: u16,
    /// Pause before each sample (µs).
    pub settle_interval_us: u32,
}

impl Default for SenseConfig {
    fn default() -> Self {
        Self {
            full_scale: 1024,
            reference_mv: 3300,
            calibration_scale: 1.0,
            settle_samples: 10,
            settle_interval_us: 1_000,
        }
    }
}

/// Known series resistors of one hotplate (Ω).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShuntPair {
    /// Between actuator output and heater node.
    pub heater_ohm: f64,
    /// Between supply and sensing-layer node.
    pub sensor_ohm: f64,
}

/// What the regulator does with the actuator when a loop aborts early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortPolicy {
    /// Leave the last written code in place.
    #[default]
    HoldOutput,
    /// Write code 0 and mark the channel off.
    DisableOutput,
}

/// Heater regulation loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatorConfig {
    /// First commanded voltage before any feedback exists (mV).
    pub initial_setpoint_mv: u16,
    /// Upper bound on write/sample/correct steps.
    pub max_iterations: u16,
    /// Stop early once the measured heater voltage is this close to target (mV).
    /// `None` always runs `max_iterations` steps.
    pub convergence_tolerance_mv: Option<u16>,
    pub abort_policy: AbortPolicy,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self {
            initial_setpoint_mv: 300,
            max_iterations: 9,
            convergence_tolerance_mv: None,
            abort_policy: AbortPolicy::HoldOutput,
        }
    }
}

/// Complete board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub actuator: ActuatorConfig,
    pub sense: SenseConfig,
    pub shunts: ChannelMap<ShuntPair>,
    pub regulator: RegulatorConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            actuator: ActuatorConfig::default(),
            sense: SenseConfig::default(),
            shunts: ChannelMap::new(
                ShuntPair {
                    heater_ohm: 100.0,
                    sensor_ohm: 1_000_000.0,
                },
                ShuntPair {
                    heater_ohm: 100.0,
                    sensor_ohm: 100_000.0,
                },
            ),
            regulator: RegulatorConfig::default(),
        }
    }
}

impl BoardConfig {
    /// Reject non-physical values before any hardware is touched.
    pub fn validate(&self) -> ControlResult<()> {
        let a = &self.actuator;
        if a.full_scale_code == 0 || a.full_scale_code > 0x0FFF {
            return Err(ControlError::InvalidArg {
                what: "actuator full_scale_code must be in 1..=4095",
            });
        }
        if a.reference_mv == 0 {
            return Err(ControlError::InvalidArg {
                what: "actuator reference_mv must be positive",
            });
        }
        if a.ceiling_mv == 0 || a.ceiling_mv >= a.reference_mv {
            return Err(ControlError::InvalidArg {
                what: "actuator ceiling_mv must be positive and below reference_mv",
            });
        }
        if a.bus_address.hp1 == a.bus_address.hp3 {
            return Err(ControlError::InvalidArg {
                what: "each channel needs its own actuator bus address",
            });
        }
        if a.bus_address.iter().any(|(_, addr)| *addr > 0x7F) {
            return Err(ControlError::InvalidArg {
                what: "actuator bus addresses are 7-bit",
            });
        }

        let s = &self.sense;
        if s.full_scale == 0 {
            return Err(ControlError::InvalidArg {
                what: "sense full_scale must be positive",
            });
        }
        if s.reference_mv == 0 {
            return Err(ControlError::InvalidArg {
                what: "sense reference_mv must be positive",
            });
        }
        if !s.calibration_scale.is_finite() || s.calibration_scale <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "sense calibration_scale must be finite and positive",
            });
        }
        if s.settle_samples == 0 {
            return Err(ControlError::InvalidArg {
                what: "sense settle_samples must be at least 1",
            });
        }

        for channel in Channel::ALL {
            let shunt = self.shunts[channel];
            if !(shunt.heater_ohm.is_finite() && shunt.heater_ohm > 0.0) {
                return Err(ControlError::InvalidArg {
                    what: "heater shunt must be finite and positive",
                });
            }
            if !(shunt.sensor_ohm.is_finite() && shunt.sensor_ohm > 0.0) {
                return Err(ControlError::InvalidArg {
                    what: "sensor shunt must be finite and positive",
                });
            }
        }

        let r = &self.regulator;
        if r.max_iterations == 0 {
            return Err(ControlError::InvalidArg {
                what: "regulator max_iterations must be at least 1",
            });
        }
        if r.initial_setpoint_mv == 0 || r.initial_setpoint_mv > a.ceiling_mv {
            return Err(ControlError::InvalidArg {
                what: "regulator initial_setpoint_mv must be in 1..=ceiling_mv",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        BoardConfig::default().validate().unwrap();
    }

    #[test]
    fn default_shunts_match_board() {
        let cfg = BoardConfig::default();
        assert_eq!(cfg.shunts[Channel::Hp1].heater_ohm, 100.0);
        assert_eq!(cfg.shunts[Channel::Hp1].sensor_ohm, 1_000_000.0);
        assert_eq!(cfg.shunts[Channel::Hp3].sensor_ohm, 100_000.0);
    }

    #[test]
    fn ceiling_must_sit_below_reference() {
        let mut cfg = BoardConfig::default();
        cfg.actuator.ceiling_mv = 3300;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn shared_bus_address_rejected() {
        let mut cfg = BoardConfig::default();
        cfg.actuator.bus_address = ChannelMap::new(0x60, 0x60);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_sense_params() {
        let mut cfg = BoardConfig::default();
        cfg.sense.settle_samples = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = BoardConfig::default();
        cfg.sense.calibration_scale = f64::NAN;
        assert!(cfg.validate().is_err());

        let mut cfg = BoardConfig::default();
        cfg.shunts.hp3.heater_ohm = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_regulator_params() {
        let mut cfg = BoardConfig::default();
        cfg.regulator.max_iterations = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = BoardConfig::default();
        cfg.regulator.initial_setpoint_mv = 3100;
        assert!(cfg.validate().is_err());
    }
}
