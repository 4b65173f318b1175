//! `tank_core` — deterministic transfer-and-simulation engine.
//!
//! No IO, no clock reads. Wall-clock anchors and query times are passed in
//! by the caller, so every computation is a pure function of its inputs.

mod format;
mod parse;
mod sim;
mod transfer;
mod types;

pub use format::{clock_after, fixed, hhmm};
pub use parse::parse_decimal;
pub use sim::{
    PairSim, PairSnapshot, SimConfig, Simulation, Snapshot, DEFAULT_HORIZON_HOURS, TIME_STEP_HOURS,
};
pub use transfer::{plan_transfer, plan_transfer_raw};
pub use types::*;
