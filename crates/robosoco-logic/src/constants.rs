//! Default values for the demo tunnel mission.
//!
//! These are the values of the demo tunnel mission. They seed
//! [`MissionConfig::default`](crate::config::MissionConfig) and nothing
//! else reads them directly, so every run can override them from TOML.

pub mod tunnel {
    /// Tunnel length in meters; the robot stops at this position.
    pub const LENGTH_M: f64 = 500.0;
    /// Tunnel width in meters.
    pub const WIDTH_M: f64 = 8.0;
    /// Lateral offset of the lane the robot drives along.
    pub const ROBOT_LANE_Y: f64 = 4.0;
}

pub mod robot {
    /// Distance covered by one advance or retreat.
    pub const STEP_M: f64 = 1.0;
    pub const START_BATTERY_PCT: f64 = 100.0;
    /// Battery percentage consumed per meter driven.
    pub const BATTERY_COST_PER_M: f64 = 0.1;
    /// Below this the watchdog forces a return to base.
    pub const LOW_BATTERY_PCT: f64 = 20.0;
    /// First-aid kits on board at launch. Never replenished.
    pub const STARTING_KITS: u32 = 3;
}

pub mod sensors {
    pub const AMBIENT_TEMP_C: f64 = 25.0;
    pub const BASE_CO2_PPM: f64 = 415.0;
    /// Symmetric jitter applied to every temperature reading.
    pub const TEMP_NOISE_C: f64 = 0.5;
    /// Symmetric jitter applied to every CO2 reading.
    pub const CO2_NOISE_PPM: f64 = 10.0;
    /// Body temperature assumed for victims placed without one.
    pub const DEFAULT_BODY_TEMP_C: f64 = 37.0;
}

pub mod hazards {
    /// Structural risk strictly above this forces a return.
    pub const STRUCTURAL_RISK_LIMIT: u8 = 3;
    /// Temperature strictly above this forces a return.
    pub const HEAT_LIMIT_C: f64 = 1000.0;
}

pub mod mission {
    /// Real-time delay between ticks in the interactive run.
    pub const TICK_INTERVAL_MS: u64 = 540;
    /// Ground speed of the human rescue team, used for ETA estimates.
    pub const RESCUE_TEAM_SPEED_M_PER_MIN: f64 = 50.0;
}
