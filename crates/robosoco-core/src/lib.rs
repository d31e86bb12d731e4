//! RoboSoco Core - Tunnel Rescue Mission Engine
//!
//! Runs one search-and-rescue mission: a robot drives down a tunnel, a
//! control center reads its sensor snapshots and answers with commands,
//! and observers watch each committed tick.
//!
//! # Architecture
//!
//! The mission loop is the single owner of all mutable state:
//! - **Scenario**: the tunnel and the objects in it (`robosoco_logic::scenario`)
//! - **Robot**: position, battery, kits, photos (`robosoco_logic::robot`)
//! - **Control center**: victim memory and response sequencing (`robosoco_logic::control`)
//! - **Observers**: read-only consumers of tick reports ([`observer`])
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::atomic::AtomicBool;
//! use std::time::Duration;
//! use robosoco_core::prelude::*;
//!
//! let mut engine = MissionEngine::new(MissionConfig::default()).unwrap();
//! let active = AtomicBool::new(true);
//! let reason = engine.run(&active, &mut LogObserver, Duration::ZERO);
//! println!("mission ended: {}", reason);
//! ```

pub mod engine;
pub mod observer;
pub mod report;
pub mod settings;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::engine::{MissionEngine, TerminationReason, TickReport};
    pub use crate::observer::{LogObserver, MissionMonitor, MissionObserver};
    pub use crate::report::{MissionLogEntry, MissionReport};
    pub use crate::settings::{load_config, parse_config};
    pub use robosoco_logic::config::MissionConfig;
}
