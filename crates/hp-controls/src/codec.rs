//! Millivolt to actuator-code conversion and the DAC write payload.

use hp_core::mul_div_floor;
use serde::{Deserialize, Serialize};

/// Register pointer byte preceding every fast-mode DAC write.
pub const WRITE_DAC_REGISTER: u8 = 0x40;

/// Pure conversion between a millivolt set point and the actuator's native code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCodec {
    /// Code corresponding to the reference voltage.
    pub full_scale_code: u16,
    /// Actuator reference voltage in millivolts.
    pub reference_mv: u16,
}

impl ActuatorCodec {
    pub const fn new(full_scale_code: u16, reference_mv: u16) -> Self {
        Self {
            full_scale_code,
            reference_mv,
        }
    }

    /// `floor(setpoint_mv * full_scale_code / reference_mv)`.
    ///
    /// The product is formed in 64 bits so no representable input overflows.
    /// Range checking against the actuator ceiling is the caller's job.
    pub fn to_code(&self, setpoint_mv: u16) -> u16 {
        let code = mul_div_floor(
            u32::from(setpoint_mv),
            u32::from(self.full_scale_code),
            u32::from(self.reference_mv),
        )
        .unwrap_or(0);
        u16::try_from(code).unwrap_or(u16::MAX)
    }

    /// Nominal output voltage for `code`, in millivolts.
    pub fn to_millivolts(&self, code: u16) -> f64 {
        if self.full_scale_code == 0 {
            return 0.0;
        }
        f64::from(code) * f64::from(self.reference_mv) / f64::from(self.full_scale_code)
    }

    /// Bus payload for a 12-bit write: register pointer, then the code left-aligned
    /// across two data bytes.
    pub fn payload(code: u16) -> [u8; 3] {
        let code = code & 0x0FFF;
        [WRITE_DAC_REGISTER, (code >> 4) as u8, ((code & 0x0F) << 4) as u8]
    }
}

impl Default for ActuatorCodec {
    fn default() -> Self {
        Self::new(4095, 3300)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_maps_to_zero() {
        assert_eq!(ActuatorCodec::default().to_code(0), 0);
    }

    #[test]
    fn reference_maps_to_full_scale() {
        let codec = ActuatorCodec::default();
        assert_eq!(codec.to_code(3300), 4095);
        assert_eq!(codec.to_code(300), 372);
        assert_eq!(codec.to_code(3000), 3722);
    }

    #[test]
    fn payload_layout() {
        assert_eq!(ActuatorCodec::payload(0), [0x40, 0x00, 0x00]);
        assert_eq!(ActuatorCodec::payload(0x0ABC), [0x40, 0xAB, 0xC0]);
        assert_eq!(ActuatorCodec::payload(4095), [0x40, 0xFF, 0xF0]);
    }

    #[test]
    fn zero_reference_degrades_to_zero_code() {
        let codec = ActuatorCodec::new(4095, 0);
        assert_eq!(codec.to_code(1000), 0);
        assert_eq!(ActuatorCodec::new(0, 3300).to_millivolts(100), 0.0);
    }
}
