//! Simulated hotplate board for host-side testing.
//!
//! [`SimBoard`] implements every hardware port of `hp-controls` on top of an
//! electro-thermal hotplate model, so the regulator and measurement cycle run
//! unchanged against it.

pub mod board;
pub mod error;
pub mod lag;
pub mod plant;

pub use board::{FaultInjection, SimBoard};
pub use error::{SimError, SimResult};
pub use lag::FirstOrderLag;
pub use plant::{HotplateParams, HotplatePlant};
