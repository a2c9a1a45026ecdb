//! hp-core: stable foundation for the hotplate controller.
//!
//! Contains:
//! - channel (hotplate identifiers + fixed per-channel maps)
//! - units (uom SI voltage/resistance types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod channel;
pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use channel::{Channel, ChannelMap};
pub use error::{HpError, HpResult};
pub use numeric::*;
pub use units::*;
