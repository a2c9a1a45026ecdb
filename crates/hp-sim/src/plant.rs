//! Electro-thermal model of one hotplate.
//!
//! The heater is a resistor with a positive temperature coefficient in
//! series with its shunt. Power dissipated in it raises the plate
//! temperature through a thermal resistance, with a first-order lag. The
//! sensing layer is a resistor whose value falls as the plate heats.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::lag::FirstOrderLag;

/// Plate temperature never moves faster than this (K/s).
const MAX_SLEW_K_PER_S: f64 = 1.0e5;

/// Neither resistor drops below this fraction of its cold value.
const MIN_RESISTANCE_FRACTION: f64 = 0.01;

/// Physical parameters of one hotplate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotplateParams {
    /// Heater resistance at ambient (Ω).
    pub heater_cold_ohm: f64,
    /// Heater temperature coefficient (1/K).
    pub heater_tcr_per_k: f64,
    /// Plate temperature rise per watt (K/W).
    pub thermal_resistance_k_per_w: f64,
    /// Thermal time constant (s).
    pub thermal_tau_s: f64,
    /// Sensing layer resistance at ambient (Ω).
    pub sensor_cold_ohm: f64,
    /// Sensing layer temperature coefficient (1/K), usually negative.
    pub sensor_tc_per_k: f64,
}

impl Default for HotplateParams {
    fn default() -> Self {
        Self {
            heater_cold_ohm: 90.0,
            heater_tcr_per_k: 0.0035,
            thermal_resistance_k_per_w: 15_000.0,
            thermal_tau_s: 0.010,
            sensor_cold_ohm: 500_000.0,
            sensor_tc_per_k: -0.002,
        }
    }
}

impl HotplateParams {
    pub fn validate(&self) -> SimResult<()> {
        let positive = [
            (self.heater_cold_ohm, "heater_cold_ohm must be positive"),
            (
                self.thermal_resistance_k_per_w,
                "thermal_resistance_k_per_w must be positive",
            ),
            (self.thermal_tau_s, "thermal_tau_s must be positive"),
            (self.sensor_cold_ohm, "sensor_cold_ohm must be positive"),
        ];
        for (value, what) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidArg { what });
            }
        }
        if !self.heater_tcr_per_k.is_finite() || !self.sensor_tc_per_k.is_finite() {
            return Err(SimError::InvalidArg {
                what: "temperature coefficients must be finite",
            });
        }
        Ok(())
    }
}

/// Dynamic state of one hotplate.
#[derive(Debug, Clone)]
pub struct HotplatePlant {
    params: HotplateParams,
    lag: FirstOrderLag,
    /// Plate temperature above ambient (K).
    rise_k: f64,
}

impl HotplatePlant {
    pub fn new(params: HotplateParams) -> SimResult<Self> {
        params.validate()?;
        Ok(Self {
            lag: FirstOrderLag::new(params.thermal_tau_s, MAX_SLEW_K_PER_S)?,
            params,
            rise_k: 0.0,
        })
    }

    pub fn params(&self) -> &HotplateParams {
        &self.params
    }

    pub fn rise_k(&self) -> f64 {
        self.rise_k
    }

    pub fn heater_ohm(&self) -> f64 {
        heater_ohm_at(&self.params, self.rise_k)
    }

    pub fn sensor_ohm(&self) -> f64 {
        let p = &self.params;
        let factor = (1.0 + p.sensor_tc_per_k * self.rise_k).max(MIN_RESISTANCE_FRACTION);
        p.sensor_cold_ohm * factor
    }

    /// Heater node voltage for drive `v_dac_mv` through `shunt_ohm`.
    pub fn heater_node_mv(&self, v_dac_mv: f64, shunt_ohm: f64) -> f64 {
        let r = self.heater_ohm();
        v_dac_mv * r / (r + shunt_ohm)
    }

    /// Sensing-layer node voltage for supply `v_ref_mv` through `shunt_ohm`.
    pub fn sensor_node_mv(&self, v_ref_mv: f64, shunt_ohm: f64) -> f64 {
        let r = self.sensor_ohm();
        v_ref_mv * r / (r + shunt_ohm)
    }

    /// Advance the plate temperature by `dt_s` under constant drive.
    pub fn advance(&mut self, dt_s: f64, v_dac_mv: f64, shunt_ohm: f64) {
        let params = self.params;
        self.rise_k = self
            .lag
            .advance(self.rise_k, dt_s, |rise| {
                let r = heater_ohm_at(&params, rise);
                let v_h = v_dac_mv * 1e-3 * r / (r + shunt_ohm);
                let power_w = v_h * v_h / r;
                power_w * params.thermal_resistance_k_per_w
            })
            .max(0.0);
    }
}

fn heater_ohm_at(p: &HotplateParams, rise_k: f64) -> f64 {
    p.heater_cold_ohm * (1.0 + p.heater_tcr_per_k * rise_k).max(MIN_RESISTANCE_FRACTION)
}
