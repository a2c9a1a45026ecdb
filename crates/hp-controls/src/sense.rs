//! Settled analog acquisition and raw-code conversion.
//!
//! A settled read takes `settle_samples` readings, pausing before each one,
//! and keeps only the **last**. The repeated reads give the analog front end
//! time to settle after a switch or actuator change; they are not a noise
//! filter and must not be replaced by a mean.

use embedded_hal::delay::DelayNs;
use hp_core::Channel;
use tracing::{trace, warn};

use crate::config::SenseConfig;
use crate::error::{ControlError, ControlResult};
use crate::ports::{DigitalSwitch, SenseKind, SensePort, SwitchLevel};

impl SenseConfig {
    /// Convert a raw code to millivolts: `raw * scale * reference / full_scale`,
    /// truncated.
    pub fn to_millivolts(&self, raw: u16) -> u16 {
        if self.full_scale == 0 {
            return 0;
        }
        let scaled = f64::from(raw) * self.calibration_scale;
        let mv = (scaled * f64::from(self.reference_mv) / f64::from(self.full_scale)).floor();
        mv.clamp(0.0, f64::from(u16::MAX)) as u16
    }

    fn check_raw(&self, channel: Channel, kind: SenseKind, raw: u16) -> ControlResult<u16> {
        if raw >= self.full_scale {
            return Err(ControlError::InvalidReading {
                channel,
                kind,
                raw,
                full_scale: self.full_scale,
            });
        }
        Ok(raw)
    }
}

/// Settled read of `kind` on `channel`; returns the last of `settle_samples`
/// raw readings.
///
/// Any failed sample aborts the read.
pub fn sample_averaged<H>(
    hw: &mut H,
    config: &SenseConfig,
    channel: Channel,
    kind: SenseKind,
) -> ControlResult<u16>
where
    H: SensePort + DelayNs,
{
    if config.settle_samples == 0 {
        return Err(ControlError::InvalidArg {
            what: "settle_samples must be at least 1",
        });
    }
    let mut reading = 0;
    for _ in 0..config.settle_samples {
        hw.delay_us(config.settle_interval_us);
        reading = hw.sample_raw(channel, kind)?;
    }
    trace!(%channel, %kind, raw = reading, "settled sample");
    config.check_raw(channel, kind, reading)
}

/// Heater node voltage of `channel` in millivolts.
pub fn measure_heater_mv<H>(hw: &mut H, config: &SenseConfig, channel: Channel) -> ControlResult<u16>
where
    H: SensePort + DelayNs,
{
    let raw = sample_averaged(hw, config, channel, SenseKind::Heater)?;
    Ok(config.to_millivolts(raw))
}

/// Sensing-layer node voltage of `channel` in millivolts.
///
/// The isolation switch is pulled low only for the duration of the read and
/// is driven high again afterwards, even when the read fails.
pub fn measure_sensor_mv<H>(hw: &mut H, config: &SenseConfig, channel: Channel) -> ControlResult<u16>
where
    H: SensePort + DigitalSwitch + DelayNs,
{
    hw.set(channel, SwitchLevel::Low)?;
    let sampled = sample_averaged(hw, config, channel, SenseKind::Sensor);
    let restored = hw.set(channel, SwitchLevel::High);
    if restored.is_err() {
        warn!(%channel, "failed to re-isolate sensor path");
    }
    let raw = sampled?;
    restored?;
    Ok(config.to_millivolts(raw))
}
