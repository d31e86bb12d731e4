//! Robot actuation: motion, the battery watchdog and command execution.
//!
//! The robot drives a single lane of the tunnel. Each tick it either advances
//! (while `Exploring`) or retreats (while `Returning`), paying a fixed
//! battery cost per meter, and then runs the battery watchdog. Commands from
//! the control center change its status and consume its resources.
//!
//! Status transitions driven here:
//!
//! | From | Trigger | To |
//! |------|---------|----|
//! | `Exploring` | advance attempted at tunnel length | `EndOfTunnel` |
//! | any non-terminal except `Returning` | battery below threshold | `Returning` |
//! | `Returning` | position reaches 0 | `BatteryDepleted` |
//! | any non-terminal | battery reaches 0 | `BatteryDepleted` |
//! | any non-terminal | command | see [`Robot::execute_command`] |

use indexmap::IndexMap;

use crate::command::Command;
use crate::config::{MissionConfig, RobotConfig};
use crate::scenario::Point;
use crate::snapshot::{photo_id_for, PhotoRecord, RobotStatus, SensorReading, StateSnapshot};

/// What the motion phase of a tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReport {
    /// Signed displacement along the tunnel this tick.
    pub moved_m: f64,
    /// The watchdog turned the robot around this tick.
    pub low_battery_return: bool,
}

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    PhotoTaken(PhotoRecord),
    KitDeployed { remaining: u32 },
    /// Deployment attempted with no kits left. Nothing was consumed.
    KitUnavailable,
    StatusChanged(RobotStatus),
    /// The robot is in a terminal state or the command was not recognized.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Robot {
    position: f64,
    lane_y: f64,
    battery: f64,
    status: RobotStatus,
    kits: u32,
    photos: IndexMap<String, PhotoRecord>,
    params: RobotConfig,
    tunnel_length: f64,
}

impl Robot {
    /// A robot at the tunnel entrance, fully configured for `config`.
    pub fn new(config: &MissionConfig) -> Self {
        Self {
            position: 0.0,
            lane_y: config.tunnel.robot_lane_y,
            battery: config.robot.start_battery_pct,
            status: RobotStatus::Exploring,
            kits: config.robot.kits,
            photos: IndexMap::new(),
            params: config.robot.clone(),
            tunnel_length: config.tunnel.length_m,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn point(&self) -> Point {
        Point::new(self.position, self.lane_y)
    }

    pub fn battery(&self) -> f64 {
        self.battery
    }

    pub fn status(&self) -> RobotStatus {
        self.status
    }

    pub fn kits(&self) -> u32 {
        self.kits
    }

    /// Photos in the order they were taken, keyed by photo id.
    pub fn photos(&self) -> &IndexMap<String, PhotoRecord> {
        &self.photos
    }

    pub fn at_tunnel_end(&self) -> bool {
        self.position >= self.tunnel_length
    }

    /// Move one step forward if exploring. Returns whether the robot moved.
    ///
    /// The robot still reports `Exploring` on the tick it arrives at the
    /// tunnel end, so whatever it senses there is classified. The next call
    /// switches it to `EndOfTunnel`.
    pub fn advance(&mut self) -> bool {
        if self.status != RobotStatus::Exploring {
            return false;
        }
        if self.at_tunnel_end() {
            log::info!("[robot] reached the end of the tunnel at {}m", self.position);
            self.status = RobotStatus::EndOfTunnel;
            return false;
        }

        self.position = (self.position + self.params.step_m).min(self.tunnel_length);
        self.drain_battery();
        true
    }

    /// Move one step back toward base if returning. Returns whether the
    /// robot moved.
    pub fn retreat(&mut self) -> bool {
        if self.status != RobotStatus::Returning {
            return false;
        }

        self.position = (self.position - self.params.step_m).max(0.0);
        self.drain_battery();

        if self.status == RobotStatus::Returning && self.position <= 0.0 {
            log::info!("[robot] back at base with {:.1}% battery", self.battery);
            self.status = RobotStatus::BatteryDepleted;
        }
        true
    }

    /// Force a return when the battery is low. Runs every tick and never
    /// ends the mission by itself.
    pub fn battery_watchdog(&mut self) -> bool {
        let low = self.battery < self.params.low_battery_pct;
        if !low || self.status == RobotStatus::Returning || self.status.is_terminal() {
            return false;
        }
        log::warn!(
            "[robot] battery low ({:.1}% < {}%), returning to base from {}m",
            self.battery,
            self.params.low_battery_pct,
            self.position
        );
        self.status = RobotStatus::Returning;
        true
    }

    /// Motion phase of a tick. The watchdog runs on both sides of the move
    /// so a battery that crosses the threshold turns the robot this tick.
    pub fn step_motion(&mut self) -> MotionReport {
        let before = self.position;
        let mut low_battery_return = self.battery_watchdog();
        if !self.retreat() {
            self.advance();
        }
        low_battery_return |= self.battery_watchdog();
        MotionReport {
            moved_m: self.position - before,
            low_battery_return,
        }
    }

    /// Package state and sensors for the control center.
    pub fn snapshot(
        &self,
        tick: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
        sensors: SensorReading,
    ) -> StateSnapshot {
        StateSnapshot {
            tick,
            timestamp,
            pos_x: self.position,
            pos_y: self.lane_y,
            battery_pct: (self.battery * 10.0).round() / 10.0,
            robot_status: self.status,
            sensors,
        }
    }

    /// Execute a control center command. `context` is the snapshot the
    /// command was decided on; photos record its sensor data.
    ///
    /// | Command | Status afterwards | Side effect |
    /// |---------|-------------------|-------------|
    /// | `TAKE_PHOTO` | `Awaiting` | photo stored under its position id |
    /// | `RESUME_EXPLORATION` | `Exploring` | |
    /// | `RETURN_TO_BASE` | `Returning` | |
    /// | `HOLD_POSITION` | `Awaiting` | |
    /// | `DEPLOY_KIT` | `Awaiting` | one kit consumed, if any left |
    pub fn execute_command(&mut self, command: Command, context: &StateSnapshot) -> CommandOutcome {
        if self.status.is_terminal() {
            log::debug!("[robot] ignoring {} in status {}", command, self.status);
            return CommandOutcome::Ignored;
        }

        match command {
            Command::TakePhoto => {
                self.status = RobotStatus::TakingPhoto;
                let record = PhotoRecord {
                    photo_id: photo_id_for(self.position),
                    pos_x: self.position,
                    max_temperature: context.sensors.temperature,
                    victim_data: context.sensors.detected_victim.clone(),
                };
                log::info!("[robot] thermal photo '{}' recorded", record.photo_id);
                self.photos.insert(record.photo_id.clone(), record.clone());
                self.status = RobotStatus::Awaiting;
                CommandOutcome::PhotoTaken(record)
            }
            Command::ResumeExploration => {
                self.status = RobotStatus::Exploring;
                CommandOutcome::StatusChanged(self.status)
            }
            Command::ReturnToBase => {
                log::info!("[robot] return route started at {}m", self.position);
                self.status = RobotStatus::Returning;
                CommandOutcome::StatusChanged(self.status)
            }
            Command::HoldPosition => {
                self.status = RobotStatus::Awaiting;
                CommandOutcome::StatusChanged(self.status)
            }
            Command::DeployKit => {
                self.status = RobotStatus::ImmediateAction;
                let outcome = if self.kits > 0 {
                    self.kits -= 1;
                    log::info!(
                        "[robot] first-aid kit released at {}m, {} left",
                        self.position,
                        self.kits
                    );
                    CommandOutcome::KitDeployed {
                        remaining: self.kits,
                    }
                } else {
                    log::warn!(
                        "[robot] kit deployment attempted at {}m but none are left",
                        self.position
                    );
                    CommandOutcome::KitUnavailable
                };
                self.status = RobotStatus::Awaiting;
                outcome
            }
        }
    }

    /// Execute a command given by its wire name. Unknown names are logged
    /// and ignored.
    pub fn execute_wire(&mut self, raw: &str, context: &StateSnapshot) -> CommandOutcome {
        match raw.parse::<Command>() {
            Ok(command) => self.execute_command(command, context),
            Err(e) => {
                log::warn!("[robot] {}; ignored", e);
                CommandOutcome::Ignored
            }
        }
    }

    fn drain_battery(&mut self) {
        let cost = self.params.battery_cost_per_m * self.params.step_m;
        // Rounded so repeated tenths do not drift across the threshold.
        self.battery = ((self.battery - cost) * 1e6).round() / 1e6;
        if self.battery <= 0.0 {
            self.battery = 0.0;
            if !self.status.is_terminal() {
                log::warn!("[robot] battery exhausted at {}m", self.position);
                self.status = RobotStatus::BatteryDepleted;
            }
        }
    }
}
