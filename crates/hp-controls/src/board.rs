//! Two-hotplate board facade.
//!
//! Owns the hardware, the configuration and the per-channel state, and wires
//! the heater drive path and the measurement cycle to them.

use hp_core::Channel;
use tracing::{info, warn};

use crate::config::BoardConfig;
use crate::cycle::{CycleReport, DividerReading, MeasurementCycle};
use crate::error::{ControlError, ControlResult};
use crate::ports::{HotplateHardware, SwitchLevel};
use crate::regulator::{HeaterRegulator, IterationRecord, RegulationReport};
use crate::sense::{measure_heater_mv, measure_sensor_mv};
use crate::state::{ChannelBank, ChannelState};

pub struct HotplateBoard<H> {
    hw: H,
    config: BoardConfig,
    regulator: HeaterRegulator,
    cycle: MeasurementCycle,
    bank: ChannelBank,
}

impl<H: HotplateHardware> HotplateBoard<H> {
    /// Validate `config` and take ownership of `hw`. Nothing is written to
    /// the hardware until [`begin`](Self::begin).
    pub fn new(hw: H, config: BoardConfig) -> ControlResult<Self> {
        config.validate()?;
        Ok(Self {
            regulator: HeaterRegulator::new(&config),
            cycle: MeasurementCycle::new(&config),
            bank: ChannelBank::default(),
            hw,
            config,
        })
    }

    /// Isolate both sensor paths, reset all channel state and switch both
    /// heaters off.
    ///
    /// Every channel is attempted; the first failure is returned.
    pub fn begin(&mut self) -> ControlResult<()> {
        let mut first_err = None;
        for channel in Channel::ALL {
            if let Err(err) = self.hw.set(channel, SwitchLevel::High) {
                warn!(%channel, %err, "failed to isolate sensor path");
                first_err.get_or_insert(err);
            }
        }

        self.bank = ChannelBank::default();
        for channel in Channel::ALL {
            if let Err(err) = self
                .regulator
                .disable(&mut self.hw, &mut self.bank[channel], channel)
            {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            None => {
                info!("board initialised, heaters off");
                Ok(())
            }
            Some(err) => Err(err),
        }
    }

    /// Open-loop heater drive.
    pub fn set_heater_voltage(&mut self, channel: Channel, mv: u16) -> ControlResult<()> {
        self.regulator
            .set_heater_voltage(&mut self.hw, &mut self.bank[channel], channel, mv)
    }

    /// Closed-loop heater regulation; `0` switches the heater off.
    pub fn regulate(&mut self, channel: Channel, target_mv: u16) -> ControlResult<RegulationReport> {
        self.regulator
            .regulate(&mut self.hw, &mut self.bank[channel], channel, target_mv)
    }

    /// [`regulate`](Self::regulate) with a per-step observer.
    pub fn regulate_traced<F>(
        &mut self,
        channel: Channel,
        target_mv: u16,
        observer: F,
    ) -> ControlResult<RegulationReport>
    where
        F: FnMut(&IterationRecord),
    {
        self.regulator.regulate_traced(
            &mut self.hw,
            &mut self.bank[channel],
            channel,
            target_mv,
            observer,
        )
    }

    pub fn disable(&mut self, channel: Channel) -> ControlResult<()> {
        self.regulator
            .disable(&mut self.hw, &mut self.bank[channel], channel)
    }

    pub fn measure_heater_voltage(&mut self, channel: Channel) -> ControlResult<u16> {
        measure_heater_mv(&mut self.hw, &self.config.sense, channel)
    }

    pub fn measure_sensor_voltage(&mut self, channel: Channel) -> ControlResult<u16> {
        measure_sensor_mv(&mut self.hw, &self.config.sense, channel)
    }

    /// Heater resistance (Ω), also stored in the channel state.
    pub fn measure_heater_resistance(&mut self, channel: Channel) -> ControlResult<f64> {
        self.cycle
            .measure_heater(&mut self.hw, &mut self.bank[channel], channel)
            .map(|r: DividerReading| r.ohm)
    }

    /// Sensing-layer resistance (Ω), also stored in the channel state.
    pub fn measure_sensor_resistance(&mut self, channel: Channel) -> ControlResult<f64> {
        self.cycle
            .measure_sensor(&mut self.hw, &mut self.bank[channel], channel)
            .map(|r| r.ohm)
    }

    /// Measure every channel. See [`MeasurementCycle::run`].
    pub fn run_cycle(&mut self) -> CycleReport {
        self.cycle.run(&mut self.hw, &mut self.bank)
    }

    /// Like [`run_cycle`](Self::run_cycle), failing with the first recorded
    /// error if any step failed.
    pub fn run_cycle_checked(&mut self) -> ControlResult<CycleReport> {
        let report = self.run_cycle();
        let first_err: Option<ControlError> = report.channels.iter().find_map(|(_, m)| {
            m.heater
                .as_ref()
                .err()
                .or(m.sensor.as_ref().err())
                .cloned()
        });
        match first_err {
            None => Ok(report),
            Some(err) => Err(err),
        }
    }

    pub fn state(&self, channel: Channel) -> &ChannelState {
        &self.bank[channel]
    }

    pub fn states(&self) -> &ChannelBank {
        &self.bank
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn release(self) -> H {
        self.hw
    }
}
