//! Mission configuration and validation.
//!
//! `MissionConfig::default()` is the demo tunnel mission. Every section
//! deserializes with `#[serde(default)]`, so a config file only needs the
//! keys it changes:
//!
//! ```toml
//! seed = 7
//!
//! [robot]
//! kits = 1
//!
//! [hazards]
//! heat_limit_c = 600.0
//! ```
//!
//! Loading from disk lives in `robosoco-core`; this module only owns the
//! shape and the validation rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::scenario::{Scenario, ScenarioObject};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    pub length_m: f64,
    pub width_m: f64,
    /// Lateral offset the robot drives along.
    pub robot_lane_y: f64,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            length_m: constants::tunnel::LENGTH_M,
            width_m: constants::tunnel::WIDTH_M,
            robot_lane_y: constants::tunnel::ROBOT_LANE_Y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub step_m: f64,
    pub start_battery_pct: f64,
    pub battery_cost_per_m: f64,
    pub low_battery_pct: f64,
    pub kits: u32,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            step_m: constants::robot::STEP_M,
            start_battery_pct: constants::robot::START_BATTERY_PCT,
            battery_cost_per_m: constants::robot::BATTERY_COST_PER_M,
            low_battery_pct: constants::robot::LOW_BATTERY_PCT,
            kits: constants::robot::STARTING_KITS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub ambient_temp_c: f64,
    pub base_co2_ppm: f64,
    /// Half-width of the uniform temperature jitter. 0 disables it.
    pub temp_noise_c: f64,
    /// Half-width of the uniform CO2 jitter. 0 disables it.
    pub co2_noise_ppm: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            ambient_temp_c: constants::sensors::AMBIENT_TEMP_C,
            base_co2_ppm: constants::sensors::BASE_CO2_PPM,
            temp_noise_c: constants::sensors::TEMP_NOISE_C,
            co2_noise_ppm: constants::sensors::CO2_NOISE_PPM,
        }
    }
}

impl SensorConfig {
    /// Same baselines with jitter switched off.
    pub fn noiseless(&self) -> Self {
        Self {
            temp_noise_c: 0.0,
            co2_noise_ppm: 0.0,
            ..self.clone()
        }
    }
}

/// Thresholds that trigger the control center's hazard override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    pub structural_risk_limit: u8,
    pub heat_limit_c: f64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            structural_risk_limit: constants::hazards::STRUCTURAL_RISK_LIMIT,
            heat_limit_c: constants::hazards::HEAT_LIMIT_C,
        }
    }
}

/// Full configuration for one mission run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// RNG seed for sensor noise. `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Safety cap on the number of ticks. `None` runs until a natural end.
    pub max_ticks: Option<u64>,
    /// Real-time pacing between ticks; 0 runs flat out.
    pub tick_interval_ms: u64,
    pub rescue_team_speed_m_per_min: f64,
    pub tunnel: TunnelConfig,
    pub robot: RobotConfig,
    pub sensors: SensorConfig,
    pub hazards: HazardConfig,
    /// Custom scenario objects. `None` places the tunnel accident scenario.
    pub objects: Option<Vec<ScenarioObject>>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_ticks: None,
            tick_interval_ms: constants::mission::TICK_INTERVAL_MS,
            rescue_team_speed_m_per_min: constants::mission::RESCUE_TEAM_SPEED_M_PER_MIN,
            tunnel: TunnelConfig::default(),
            robot: RobotConfig::default(),
            sensors: SensorConfig::default(),
            hazards: HazardConfig::default(),
            objects: None,
        }
    }
}

/// A configuration value outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be within 0..=100, got {value}")]
    OutOfPercentRange { field: &'static str, value: f64 },
    #[error("robot lane y={lane} lies outside the tunnel width {width}")]
    LaneOutsideTunnel { lane: f64, width: f64 },
    #[error("{field} half-width {value} is too wide to sample")]
    NoiseTooWide { field: &'static str, value: f64 },
    #[error("scenario object #{index} has a non-positive radius {radius}")]
    BadObjectRadius { index: usize, radius: f64 },
}

impl MissionConfig {
    /// Check every numeric field. The first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tunnel.length_m", self.tunnel.length_m)?;
        positive("tunnel.width_m", self.tunnel.width_m)?;
        if !(0.0..=self.tunnel.width_m).contains(&self.tunnel.robot_lane_y) {
            return Err(ConfigError::LaneOutsideTunnel {
                lane: self.tunnel.robot_lane_y,
                width: self.tunnel.width_m,
            });
        }

        positive("robot.step_m", self.robot.step_m)?;
        percent("robot.start_battery_pct", self.robot.start_battery_pct)?;
        percent("robot.low_battery_pct", self.robot.low_battery_pct)?;
        non_negative("robot.battery_cost_per_m", self.robot.battery_cost_per_m)?;

        noise_band("sensors.temp_noise_c", self.sensors.temp_noise_c)?;
        noise_band("sensors.co2_noise_ppm", self.sensors.co2_noise_ppm)?;
        non_negative("sensors.base_co2_ppm", self.sensors.base_co2_ppm)?;

        positive("hazards.heat_limit_c", self.hazards.heat_limit_c)?;
        positive(
            "rescue_team_speed_m_per_min",
            self.rescue_team_speed_m_per_min,
        )?;

        if let Some(objects) = &self.objects {
            for (index, obj) in objects.iter().enumerate() {
                let radius = obj.radius();
                if radius.is_nan() || radius <= 0.0 {
                    return Err(ConfigError::BadObjectRadius { index, radius });
                }
            }
        }
        Ok(())
    }

    /// Build the world this config describes.
    pub fn build_scenario(&self) -> Scenario {
        match &self.objects {
            Some(objects) => Scenario::new(
                self.tunnel.length_m,
                self.tunnel.width_m,
                objects.clone(),
            ),
            None => Scenario::tunnel_accident(self.tunnel.length_m, self.tunnel.width_m),
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Jitter is drawn from `-value..=value`; the full band must stay finite.
fn noise_band(field: &'static str, value: f64) -> Result<(), ConfigError> {
    non_negative(field, value)?;
    if (2.0 * value).is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NoiseTooWide { field, value })
    }
}

fn percent(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfPercentRange { field, value })
    }
}
