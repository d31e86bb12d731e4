//! Control center decision engine.
//!
//! The control center sees one [`StateSnapshot`] per tick and answers with at
//! most one [`Command`]. It never touches the robot directly. Its memory is
//! the set of victims already handled and a pending response sequence.
//!
//! # Decision order
//!
//! The first matching rule wins:
//!
//! | # | Condition | Command | Sequence |
//! |---|-----------|---------|----------|
//! | 1 | structural risk above limit, or heat above limit | `RETURN_TO_BASE` (none if already returning) | cleared |
//! | 2 | robot `Returning` | none | cleared |
//! | 3 | robot `Awaiting`, steps pending | next step | popped |
//! | 4 | robot `Exploring`, new victim in range | by priority, see below | enqueued |
//! | 5 | robot `EndOfTunnel` | `HOLD_POSITION` | untouched |
//!
//! New victims are registered and classified with
//! [`classify_priority`](crate::triage::classify_priority):
//!
//! | Priority | Immediate command | Then, one per `Awaiting` tick |
//! |----------|-------------------|-------------------------------|
//! | High | `DEPLOY_KIT` | `TAKE_PHOTO`, `RESUME_EXPLORATION` |
//! | Medium | `TAKE_PHOTO` | `RESUME_EXPLORATION` |
//! | Low | none | none |
//!
//! ```
//! use robosoco_logic::command::Command;
//! use robosoco_logic::config::MissionConfig;
//! use robosoco_logic::control::ControlCenter;
//! use robosoco_logic::scenario::{Point, VictimId};
//! use robosoco_logic::snapshot::{DetectedVictim, RobotStatus, SensorReading, StateSnapshot};
//! use robosoco_logic::triage::{Consciousness, LifeStatus, Severity, VitalCondition};
//!
//! let mut center = ControlCenter::new(&MissionConfig::default());
//! let snapshot = StateSnapshot {
//!     tick: 150,
//!     timestamp: chrono::Utc::now(),
//!     pos_x: 150.0,
//!     pos_y: 4.0,
//!     battery_pct: 85.0,
//!     robot_status: RobotStatus::Exploring,
//!     sensors: SensorReading {
//!         temperature: 27.1,
//!         co2_ppm: 418.0,
//!         structural_risk: 0,
//!         detected_victim: Some(DetectedVictim {
//!             id: VictimId(2),
//!             position: Point::new(150.0, 3.0),
//!             severity: Severity::Severe,
//!             consciousness: Consciousness::Unconscious,
//!             condition: VitalCondition::Bleeding,
//!             life_status: LifeStatus::Alive,
//!         }),
//!     },
//! };
//! assert_eq!(center.decide(&snapshot).command, Some(Command::DeployKit));
//! assert_eq!(center.pending_steps(), 2);
//! ```

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::config::{HazardConfig, MissionConfig};
use crate::scenario::VictimId;
use crate::snapshot::{DetectedVictim, PhotoRecord, RobotStatus, SensorReading, StateSnapshot};
use crate::triage::{classify_priority, Priority, VitalCondition};

// ============================================================================
// SEQUENCING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceState {
    Idle,
    SequenceActive,
}

/// Ordered chain of follow-up commands, emitted one per `Awaiting` tick.
#[derive(Debug, Clone, Default)]
pub struct ResponseSequence {
    steps: VecDeque<Command>,
}

impl ResponseSequence {
    pub fn state(&self) -> SequenceState {
        if self.steps.is_empty() {
            SequenceState::Idle
        } else {
            SequenceState::SequenceActive
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn enqueue(&mut self, steps: &[Command]) {
        self.steps.extend(steps.iter().copied());
    }

    fn pop(&mut self) -> Option<Command> {
        self.steps.pop_front()
    }

    /// Drop every pending step. Returns how many were discarded.
    fn clear(&mut self) -> usize {
        let discarded = self.steps.len();
        self.steps.clear();
        discarded
    }
}

// ============================================================================
// DECISIONS
// ============================================================================

/// Which limit triggered a hazard override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HazardCause {
    Structural { risk: u8 },
    Heat { temperature: f64 },
}

impl fmt::Display for HazardCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural { risk } => write!(f, "structural risk {}", risk),
            Self::Heat { temperature } => write!(f, "extreme heat {:.1}°C", temperature),
        }
    }
}

/// A first sighting of a victim, as announced to the rescue team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictimAlert {
    pub tick: u64,
    pub victim: DetectedVictim,
    pub priority: Priority,
    /// Robot position when the victim was sighted.
    pub pos_x: f64,
    /// Minutes for the rescue team to reach `pos_x` from the entrance.
    pub eta_minutes: u64,
    /// Bleeding on top of high priority.
    pub max_priority_bleeding: bool,
    /// Full response, starting with the command issued on this tick.
    pub plan: Vec<Command>,
}

impl fmt::Display for VictimAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} priority: {} (rescue team ETA {} min)",
            self.priority, self.victim, self.eta_minutes
        )?;
        if self.max_priority_bleeding {
            f.write_str(", bleeding: maximum priority")?;
        }
        Ok(())
    }
}

/// Why the control center did what it did this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionNote {
    HazardOverride {
        cause: HazardCause,
        discarded_steps: usize,
    },
    /// The robot is heading home; only watching. Carries the hazard being
    /// sensed on the way, if any.
    MonitoringReturn { hazard: Option<HazardCause> },
    SequenceStep { remaining: usize },
    VictimAlert(VictimAlert),
    VictimAlreadyRegistered { victim: VictimId },
    TunnelEnd,
    Nominal,
}

impl fmt::Display for DecisionNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HazardOverride {
                cause,
                discarded_steps,
            } => {
                write!(f, "hazard override: {}", cause)?;
                if *discarded_steps > 0 {
                    write!(f, ", {} pending step(s) discarded", discarded_steps)?;
                }
                Ok(())
            }
            Self::MonitoringReturn { hazard: Some(cause) } => {
                write!(f, "monitoring return ({} sensed)", cause)
            }
            Self::MonitoringReturn { hazard: None } => f.write_str("monitoring return"),
            Self::SequenceStep { remaining } => {
                write!(f, "sequence step, {} remaining", remaining)
            }
            Self::VictimAlert(alert) => write!(f, "{}", alert),
            Self::VictimAlreadyRegistered { victim } => {
                write!(f, "{} already registered", victim)
            }
            Self::TunnelEnd => f.write_str("end of tunnel reached"),
            Self::Nominal => f.write_str("nominal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub command: Option<Command>,
    pub note: DecisionNote,
}

impl Decision {
    fn with(command: Command, note: DecisionNote) -> Self {
        Self {
            command: Some(command),
            note,
        }
    }

    fn silent(note: DecisionNote) -> Self {
        Self {
            command: None,
            note,
        }
    }
}

/// Follow-up chain for a priority, not counting the immediate command.
fn response_plan(priority: Priority) -> (Option<Command>, &'static [Command]) {
    match priority {
        Priority::High => (
            Some(Command::DeployKit),
            &[Command::TakePhoto, Command::ResumeExploration],
        ),
        Priority::Medium => (Some(Command::TakePhoto), &[Command::ResumeExploration]),
        Priority::Low => (None, &[]),
    }
}

// ============================================================================
// CONTROL CENTER
// ============================================================================

#[derive(Debug, Clone)]
pub struct ControlCenter {
    hazards: HazardConfig,
    rescue_speed_m_per_min: f64,
    registered: BTreeSet<VictimId>,
    sequence: ResponseSequence,
    alerts: Vec<VictimAlert>,
    photos_confirmed: usize,
}

impl ControlCenter {
    pub fn new(config: &MissionConfig) -> Self {
        Self {
            hazards: config.hazards.clone(),
            rescue_speed_m_per_min: config.rescue_team_speed_m_per_min,
            registered: BTreeSet::new(),
            sequence: ResponseSequence::default(),
            alerts: Vec::new(),
            photos_confirmed: 0,
        }
    }

    pub fn sequence_state(&self) -> SequenceState {
        self.sequence.state()
    }

    pub fn pending_steps(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_registered(&self, id: VictimId) -> bool {
        self.registered.contains(&id)
    }

    /// Every alert raised this mission, in order.
    pub fn alerts(&self) -> &[VictimAlert] {
        &self.alerts
    }

    pub fn photos_confirmed(&self) -> usize {
        self.photos_confirmed
    }

    /// Decide this tick's command.
    pub fn decide(&mut self, snapshot: &StateSnapshot) -> Decision {
        let hazard = self.hazard_cause(&snapshot.sensors);

        if snapshot.robot_status == RobotStatus::Returning {
            self.sequence.clear();
            return Decision::silent(DecisionNote::MonitoringReturn { hazard });
        }

        if let Some(cause) = hazard {
            let discarded_steps = self.sequence.clear();
            log::warn!(
                "[control] {} at {}m, ordering return to base",
                cause,
                snapshot.pos_x
            );
            return Decision::with(
                Command::ReturnToBase,
                DecisionNote::HazardOverride {
                    cause,
                    discarded_steps,
                },
            );
        }

        match snapshot.robot_status {
            RobotStatus::Awaiting if !self.sequence.is_empty() => {
                let Some(step) = self.sequence.pop() else {
                    return Decision::silent(DecisionNote::Nominal);
                };
                let remaining = self.sequence.len();
                log::info!("[control] sequence step {} ({} remaining)", step, remaining);
                Decision::with(step, DecisionNote::SequenceStep { remaining })
            }
            RobotStatus::Exploring => match &snapshot.sensors.detected_victim {
                Some(victim) if self.registered.contains(&victim.id) => {
                    Decision::silent(DecisionNote::VictimAlreadyRegistered { victim: victim.id })
                }
                Some(victim) => self.register_victim(snapshot, victim),
                None => Decision::silent(DecisionNote::Nominal),
            },
            RobotStatus::EndOfTunnel => {
                Decision::with(Command::HoldPosition, DecisionNote::TunnelEnd)
            }
            _ => Decision::silent(DecisionNote::Nominal),
        }
    }

    /// Acknowledge a photo the robot stored. Returns the log line.
    pub fn confirm_photo(&mut self, photo: &PhotoRecord) -> String {
        self.photos_confirmed += 1;
        match &photo.victim_data {
            Some(victim) => format!(
                "photo {} received: max {:.1}°C, {}",
                photo.photo_id, photo.max_temperature, victim
            ),
            None => format!(
                "photo {} received: max {:.1}°C, no victim in frame",
                photo.photo_id, photo.max_temperature
            ),
        }
    }

    fn hazard_cause(&self, sensors: &SensorReading) -> Option<HazardCause> {
        if sensors.structural_risk > self.hazards.structural_risk_limit {
            Some(HazardCause::Structural {
                risk: sensors.structural_risk,
            })
        } else if sensors.temperature > self.hazards.heat_limit_c {
            Some(HazardCause::Heat {
                temperature: sensors.temperature,
            })
        } else {
            None
        }
    }

    fn register_victim(&mut self, snapshot: &StateSnapshot, victim: &DetectedVictim) -> Decision {
        self.registered.insert(victim.id);

        let priority = classify_priority(victim.severity, victim.consciousness, victim.condition);
        let (command, follow_up) = response_plan(priority);
        self.sequence.enqueue(follow_up);

        let alert = VictimAlert {
            tick: snapshot.tick,
            victim: victim.clone(),
            priority,
            pos_x: snapshot.pos_x,
            eta_minutes: self.rescue_eta_minutes(snapshot.pos_x),
            max_priority_bleeding: priority == Priority::High
                && victim.condition == VitalCondition::Bleeding,
            plan: command.into_iter().chain(follow_up.iter().copied()).collect(),
        };
        log::info!("[control] victim detected at {}m: {}", snapshot.pos_x, alert);
        self.alerts.push(alert.clone());

        Decision {
            command,
            note: DecisionNote::VictimAlert(alert),
        }
    }

    fn rescue_eta_minutes(&self, pos_x: f64) -> u64 {
        if self.rescue_speed_m_per_min <= 0.0 {
            return 0;
        }
        (pos_x / self.rescue_speed_m_per_min).round().max(0.0) as u64
    }
}
