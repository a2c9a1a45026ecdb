//! Error types for hotplate control operations.

use hp_core::{Channel, HpError};
use thiserror::Error;

use crate::ports::SenseKind;

/// Result type for hotplate control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while driving or measuring a hotplate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// The actuator write for a channel did not complete on the bus.
    #[error("Bus transfer failed for {channel}")]
    BusTransfer { channel: Channel },

    /// A requested or derived voltage is beyond what the actuator can produce.
    #[error("Out of range: {what} = {value_mv} mV (limit {limit_mv} mV)")]
    Range {
        what: &'static str,
        value_mv: u32,
        limit_mv: u32,
    },

    /// A divider formula or correction step had a non-positive denominator.
    #[error("Division fault: {what}")]
    Division { what: &'static str },

    /// The sense path could not deliver a sample.
    #[error("Sense failure on {channel} {kind}: {what}")]
    Sense {
        channel: Channel,
        kind: SenseKind,
        what: String,
    },

    /// A raw sample outside `[0, full_scale)`.
    #[error("Invalid reading on {channel} {kind}: raw {raw} (full scale {full_scale})")]
    InvalidReading {
        channel: Channel,
        kind: SenseKind,
        raw: u16,
        full_scale: u16,
    },

    /// A regulation abort tried to switch the heater off and that write failed.
    #[error("{cause}; disabling {channel} also failed, heater may still be driven")]
    DisableFailed {
        channel: Channel,
        #[source]
        cause: Box<ControlError>,
    },

    /// The sensor-path isolation switch could not be driven.
    #[error("Isolation switch failed for {channel}")]
    Switch { channel: Channel },

    /// Invalid argument or configuration value.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Non-finite intermediate result.
    #[error(transparent)]
    Numeric(#[from] HpError),
}
