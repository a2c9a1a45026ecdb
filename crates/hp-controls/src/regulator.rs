//! Closed-loop heater voltage regulation.
//!
//! Each channel moves `Off -> Converging -> Regulated`. A failed regulation
//! returns the channel to `Off` and reports the error.
//!
//! The loop seeds the actuator with a low, harmless set point, then for a
//! fixed number of steps writes the commanded voltage, samples the heater
//! node and rescales:
//!
//! ```text
//! next = target * commanded / measured
//! ```
//!
//! The ratio `commanded / measured` is the actuator-to-heater transfer ratio,
//! re-derived every step as the heater warms and its resistance drifts. It is
//! a one-step proportional estimate, not a PID loop. With no tolerance
//! configured the loop always runs the full iteration bound; the result is
//! the success of the last actuator write.

use embedded_hal::delay::DelayNs;
use hp_core::{Channel, mul_div_floor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::codec::ActuatorCodec;
use crate::config::{AbortPolicy, BoardConfig, RegulatorConfig, SenseConfig};
use crate::error::{ControlError, ControlResult};
use crate::ports::{ActuatorPort, SensePort};
use crate::sense::measure_heater_mv;
use crate::state::{ChannelState, DriveRecord, RegulationState};

/// One write/sample/correct step, as handed to a trace observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub channel: Channel,
    /// 1-based step number.
    pub iteration: u16,
    /// Voltage written this step (mV).
    pub commanded_mv: u16,
    /// Actuator code written this step.
    pub code: u16,
    pub write_ok: bool,
    /// Heater node voltage after the write (mV).
    pub measured_mv: u16,
    /// Proportional correction for the next step (mV), before range checking.
    pub next_commanded_mv: u32,
}

/// Summary of a completed regulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationReport {
    pub channel: Channel,
    pub target_mv: u16,
    /// Steps actually executed.
    pub iterations: u16,
    /// Voltage left on the actuator (mV).
    pub commanded_mv: u16,
    /// Heater node voltage from the last step (mV).
    pub last_measured_mv: u16,
    /// Whether the last measurement landed within the configured tolerance.
    /// `None` when no tolerance is configured.
    pub converged: Option<bool>,
}

/// Heater drive path: open-loop writes and the regulation loop.
#[derive(Debug, Clone)]
pub struct HeaterRegulator {
    codec: ActuatorCodec,
    ceiling_mv: u16,
    sense: SenseConfig,
    config: RegulatorConfig,
}

impl HeaterRegulator {
    pub fn new(board: &BoardConfig) -> Self {
        Self {
            codec: board.actuator.codec(),
            ceiling_mv: board.actuator.ceiling_mv,
            sense: board.sense.clone(),
            config: board.regulator.clone(),
        }
    }

    pub fn codec(&self) -> ActuatorCodec {
        self.codec
    }

    /// Highest voltage the actuator may be commanded to (mV).
    pub fn ceiling_mv(&self) -> u16 {
        self.ceiling_mv
    }

    pub fn config(&self) -> &RegulatorConfig {
        &self.config
    }

    /// Write `mv` to `channel` without feedback.
    ///
    /// Out-of-range requests are rejected before any write. The commanded
    /// voltage is recorded even when the bus transfer fails.
    pub fn set_heater_voltage<H>(
        &self,
        hw: &mut H,
        state: &mut ChannelState,
        channel: Channel,
        mv: u16,
    ) -> ControlResult<()>
    where
        H: ActuatorPort,
    {
        self.check_ceiling("heater voltage", u32::from(mv))?;
        if write_drive(hw, &self.codec, state.drive_mut(), channel, mv) {
            Ok(())
        } else {
            Err(ControlError::BusTransfer { channel })
        }
    }

    /// Write code 0 to `channel` and mark it off.
    pub fn disable<H>(&self, hw: &mut H, state: &mut ChannelState, channel: Channel) -> ControlResult<()>
    where
        H: ActuatorPort,
    {
        let drive = state.drive_mut();
        drive.target_mv = 0;
        drive.last_heater_mv = 0;
        drive.state = RegulationState::Off;
        let ok = write_drive(hw, &self.codec, drive, channel, 0);
        info!(%channel, ok, "heater disabled");
        if ok {
            Ok(())
        } else {
            Err(ControlError::BusTransfer { channel })
        }
    }

    /// Steer the heater node of `channel` towards `target_mv`.
    pub fn regulate<H>(
        &self,
        hw: &mut H,
        state: &mut ChannelState,
        channel: Channel,
        target_mv: u16,
    ) -> ControlResult<RegulationReport>
    where
        H: ActuatorPort + SensePort + DelayNs,
    {
        self.regulate_traced(hw, state, channel, target_mv, |_| {})
    }

    /// [`regulate`](Self::regulate) with `observer` called after every step.
    pub fn regulate_traced<H, F>(
        &self,
        hw: &mut H,
        state: &mut ChannelState,
        channel: Channel,
        target_mv: u16,
        mut observer: F,
    ) -> ControlResult<RegulationReport>
    where
        H: ActuatorPort + SensePort + DelayNs,
        F: FnMut(&IterationRecord),
    {
        if let Err(err) = self.check_ceiling("target heater voltage", u32::from(target_mv)) {
            // Nothing is written; the actuator keeps its last code.
            state.drive_mut().state = RegulationState::Off;
            warn!(%channel, target_mv, "target rejected before any write");
            return Err(err);
        }

        if target_mv == 0 {
            self.disable(hw, state, channel)?;
            return Ok(RegulationReport {
                channel,
                target_mv,
                iterations: 0,
                commanded_mv: 0,
                last_measured_mv: 0,
                converged: self.config.convergence_tolerance_mv.map(|_| true),
            });
        }

        let drive = state.drive_mut();
        drive.target_mv = target_mv;
        drive.state = RegulationState::Converging;

        let mut commanded = self.config.initial_setpoint_mv;
        let mut write_ok = false;
        let mut measured = 0;
        let mut iterations = 0;

        for iteration in 1..=self.config.max_iterations {
            iterations = iteration;
            let code = self.codec.to_code(commanded);
            write_ok = write_drive(hw, &self.codec, drive, channel, commanded);
            if !write_ok {
                // No retry; the next step writes again anyway.
                warn!(%channel, iteration, code, "actuator write failed");
            }

            measured = match measure_heater_mv(hw, &self.sense, channel) {
                Ok(mv) => mv,
                Err(err) => return Err(self.abort(hw, drive, channel, err)),
            };
            drive.last_heater_mv = measured;

            if measured == 0 {
                let err = ControlError::Division {
                    what: "heater node reads 0 mV, transfer ratio undefined",
                };
                return Err(self.abort(hw, drive, channel, err));
            }

            let next = mul_div_floor(u32::from(target_mv), u32::from(commanded), u32::from(measured))
                .unwrap_or(u32::MAX);

            let record = IterationRecord {
                channel,
                iteration,
                commanded_mv: commanded,
                code,
                write_ok,
                measured_mv: measured,
                next_commanded_mv: next,
            };
            debug!(
                %channel,
                iteration,
                commanded_mv = commanded,
                code,
                write_ok,
                measured_mv = measured,
                next_commanded_mv = next,
                "regulation step"
            );
            observer(&record);

            if let Err(err) = self.check_ceiling("corrected commanded voltage", next) {
                return Err(self.abort(hw, drive, channel, err));
            }

            if let Some(tol) = self.config.convergence_tolerance_mv {
                if measured.abs_diff(target_mv) <= tol {
                    break;
                }
            }

            // check_ceiling bounds `next` by a u16 ceiling
            commanded = next as u16;
        }

        drive.state = RegulationState::Regulated;
        let report = RegulationReport {
            channel,
            target_mv,
            iterations,
            commanded_mv: drive.commanded_mv,
            last_measured_mv: measured,
            converged: self
                .config
                .convergence_tolerance_mv
                .map(|tol| measured.abs_diff(target_mv) <= tol),
        };
        info!(
            %channel,
            target_mv,
            commanded_mv = report.commanded_mv,
            measured_mv = measured,
            iterations,
            "heater regulated"
        );

        if write_ok {
            Ok(report)
        } else {
            Err(ControlError::BusTransfer { channel })
        }
    }

    fn check_ceiling(&self, what: &'static str, value_mv: u32) -> ControlResult<()> {
        if value_mv > u32::from(self.ceiling_mv) {
            return Err(ControlError::Range {
                what,
                value_mv,
                limit_mv: u32::from(self.ceiling_mv),
            });
        }
        Ok(())
    }

    /// Apply the abort policy and hand back `err` for the caller.
    ///
    /// A failed disabling write is wrapped in [`ControlError::DisableFailed`]
    /// so the caller knows the heater may still be driven.
    fn abort<H: ActuatorPort>(
        &self,
        hw: &mut H,
        drive: &mut DriveRecord,
        channel: Channel,
        err: ControlError,
    ) -> ControlError {
        drive.state = RegulationState::Off;
        match self.config.abort_policy {
            AbortPolicy::HoldOutput => {
                warn!(%channel, commanded_mv = drive.commanded_mv, %err, "regulation aborted, output held");
            }
            AbortPolicy::DisableOutput => {
                drive.target_mv = 0;
                let ok = write_drive(hw, &self.codec, drive, channel, 0);
                warn!(%channel, disabled = ok, %err, "regulation aborted, output disabled");
                if !ok {
                    return ControlError::DisableFailed {
                        channel,
                        cause: Box::new(err),
                    };
                }
            }
        }
        err
    }
}

/// Record `mv` as commanded and write its code. Returns the bus result.
fn write_drive<H: ActuatorPort>(
    hw: &mut H,
    codec: &ActuatorCodec,
    drive: &mut DriveRecord,
    channel: Channel,
    mv: u16,
) -> bool {
    drive.commanded_mv = mv;
    hw.write(channel, codec.to_code(mv))
}
