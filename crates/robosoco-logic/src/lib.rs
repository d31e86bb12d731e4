//! Pure rescue logic for RoboSoco.
//!
//! This crate contains everything the tunnel mission decides and simulates
//! that is independent of clocks, threads, files, or presentation. Functions
//! take plain data and return results, so the decision engine can be driven
//! tick-by-tick from unit tests, the headless harness, or the mission engine.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`command`] | Control center → robot command vocabulary |
//! | [`config`] | Mission configuration, defaults and validation |
//! | [`constants`] | Demo mission defaults (tunnel, robot, sensors, hazards) |
//! | [`control`] | Control center decision engine and response sequencing |
//! | [`robot`] | Robot motion, battery watchdog, command execution |
//! | [`scenario`] | Tunnel world model and sensor readings by position |
//! | [`snapshot`] | Per-tick robot + sensor snapshot and photo records |
//! | [`triage`] | Victim attributes and priority classification table |

pub mod command;
pub mod config;
pub mod constants;
pub mod control;
pub mod robot;
pub mod scenario;
pub mod snapshot;
pub mod triage;
