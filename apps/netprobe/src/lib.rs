//! netprobe - sequential network connectivity tester
//!
//! Runs a fixed list of probes (host resolution, TCP connect, web fetch,
//! staged downloads) one after another on a background task, with a
//! cooperative stop and a persisted per-probe on/off selection.

pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod logging;
pub mod platform;
pub mod probes;
pub mod services;

pub use cli::{run, Cli};
