//! Application services.
//!
//! - `active_state`: persistence of the per-probe active flags
//! - `runner`: sequential probe execution with cooperative stop

pub mod active_state;
pub mod runner;
