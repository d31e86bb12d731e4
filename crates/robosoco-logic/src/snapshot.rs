//! Per-tick data exchanged between robot and control center.
//!
//! The robot packages its state and the sensor sweep into a
//! [`StateSnapshot`] every tick; the control center only ever sees these
//! snapshots. Photo records are what the thermal camera stores.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scenario::{Point, VictimId};
use crate::triage::{Consciousness, LifeStatus, Severity, VitalCondition};

/// Operating status reported by the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotStatus {
    /// Driving forward, looking for victims.
    Exploring,
    /// Driving back to the entrance.
    Returning,
    /// Stopped, ready for the next sequence step.
    Awaiting,
    TakingPhoto,
    /// Deploying a first-aid kit.
    ImmediateAction,
    /// Reached the far end of the tunnel.
    EndOfTunnel,
    /// Back at base or out of power. Terminal.
    BatteryDepleted,
}

impl RobotStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::BatteryDepleted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exploring => "Exploring",
            Self::Returning => "Returning",
            Self::Awaiting => "Awaiting",
            Self::TakingPhoto => "TakingPhoto",
            Self::ImmediateAction => "ImmediateAction",
            Self::EndOfTunnel => "EndOfTunnel",
            Self::BatteryDepleted => "BatteryDepleted",
        }
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the victim sensor reports about the victim in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedVictim {
    pub id: VictimId,
    pub position: Point,
    pub severity: Severity,
    pub consciousness: Consciousness,
    pub condition: VitalCondition,
    pub life_status: LifeStatus,
}

impl fmt::Display for DetectedVictim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}: {}, {}, {}, {}",
            self.id,
            self.position,
            self.severity.as_str(),
            self.life_status.as_str(),
            self.consciousness.as_str(),
            self.condition.as_str()
        )
    }
}

/// One sensor sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// °C, rounded to 0.1.
    pub temperature: f64,
    pub co2_ppm: f64,
    pub structural_risk: u8,
    pub detected_victim: Option<DetectedVictim>,
}

/// Robot state plus sensor sweep for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub tick: u64,
    pub timestamp: DateTime<Utc>,
    pub pos_x: f64,
    pub pos_y: f64,
    /// Rounded to 0.1 %.
    pub battery_pct: f64,
    pub robot_status: RobotStatus,
    pub sensors: SensorReading,
}

/// A thermal photo kept in the robot's memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub photo_id: String,
    pub pos_x: f64,
    pub max_temperature: f64,
    pub victim_data: Option<DetectedVictim>,
}

/// Photo id for a position; one photo per meter mark.
pub fn photo_id_for(pos_x: f64) -> String {
    format!("thermal_photo_{}m", pos_x.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_id_from_position() {
        assert_eq!(photo_id_for(150.0), "thermal_photo_150m");
        assert_eq!(photo_id_for(0.0), "thermal_photo_0m");
        assert_eq!(photo_id_for(149.6), "thermal_photo_150m");
    }

    #[test]
    fn test_only_battery_depleted_is_terminal() {
        assert!(RobotStatus::BatteryDepleted.is_terminal());
        assert!(!RobotStatus::Returning.is_terminal());
        assert!(!RobotStatus::EndOfTunnel.is_terminal());
        assert!(!RobotStatus::Awaiting.is_terminal());
    }

    #[test]
    fn test_detected_victim_display() {
        let v = DetectedVictim {
            id: VictimId(2),
            position: Point::new(150.0, 3.0),
            severity: Severity::Severe,
            consciousness: Consciousness::Unconscious,
            condition: VitalCondition::Bleeding,
            life_status: LifeStatus::Alive,
        };
        assert_eq!(
            v.to_string(),
            "victim#2 at (150, 3): severe, alive, unconscious, bleeding"
        );
    }
}
