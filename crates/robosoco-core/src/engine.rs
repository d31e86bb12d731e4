//! Mission engine - owns the tunnel, robot and control center and runs ticks

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use robosoco_logic::config::{ConfigError, MissionConfig};
use robosoco_logic::control::{ControlCenter, Decision, DecisionNote};
use robosoco_logic::robot::{CommandOutcome, MotionReport, Robot};
use robosoco_logic::scenario::{Scenario, VictimId};
use robosoco_logic::snapshot::{RobotStatus, StateSnapshot};
use robosoco_logic::triage::Severity;

use crate::observer::MissionObserver;
use crate::report::{LogSource, MissionLogEntry, MissionReport, PathPoint};

/// Why a mission stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Holding at the far end with nothing left to do.
    TunnelEndReached,
    /// Back at base or out of power.
    BatteryDepleted,
    /// The mission-active flag was cleared.
    Cancelled,
    /// Hit `max_ticks`.
    TickLimit,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TunnelEndReached => "tunnel end reached",
            Self::BatteryDepleted => "robot stopped (battery depleted or back at base)",
            Self::Cancelled => "cancelled",
            Self::TickLimit => "tick limit reached",
        };
        f.write_str(text)
    }
}

/// Everything that happened during one committed tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub snapshot: StateSnapshot,
    pub motion: MotionReport,
    pub decision: Decision,
    pub outcome: Option<CommandOutcome>,
    /// Victim whose severity a kit improved this tick.
    pub kit_effect: Option<(VictimId, Severity)>,
    /// Robot status after the command ran.
    pub status_after: RobotStatus,
}

/// Main mission engine
pub struct MissionEngine {
    config: MissionConfig,
    scenario: Scenario,
    robot: Robot,
    center: ControlCenter,
    rng: StdRng,
    tick: u64,
    started_at: DateTime<Utc>,
    log: Vec<MissionLogEntry>,
    path: Vec<PathPoint>,
    kits_used: u32,
    termination: Option<TerminationReason>,
}

impl MissionEngine {
    /// Create a mission for `config`, in the tunnel it describes.
    pub fn new(config: MissionConfig) -> Result<Self, ConfigError> {
        let scenario = config.build_scenario();
        Self::with_scenario(config, scenario)
    }

    /// Create a mission in an explicitly built tunnel.
    pub fn with_scenario(config: MissionConfig, scenario: Scenario) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            robot: Robot::new(&config),
            center: ControlCenter::new(&config),
            rng,
            scenario,
            config,
            tick: 0,
            started_at: Utc::now(),
            log: Vec::new(),
            path: Vec::new(),
            kits_used: 0,
            termination: None,
        })
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn control_center(&self) -> &ControlCenter {
        &self.center
    }

    /// Ticks run so far; every tick delivers one snapshot.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn log(&self) -> &[MissionLogEntry] {
        &self.log
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// Run one tick. Returns `None` once the mission has ended.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.termination.is_some() {
            return None;
        }
        self.tick += 1;

        // Robot: move, sense, report
        let motion = self.robot.step_motion();
        let sensors =
            self.scenario
                .read_sensors(self.robot.point(), &self.config.sensors, &mut self.rng);
        let snapshot = self.robot.snapshot(self.tick, Utc::now(), sensors);
        self.path.push(PathPoint {
            tick: self.tick,
            x: snapshot.pos_x,
            y: snapshot.pos_y,
        });

        // Control center: decide, robot: execute
        let decision = self.center.decide(&snapshot);
        let outcome = decision
            .command
            .map(|command| self.robot.execute_command(command, &snapshot));
        self.record_tick(&snapshot, &decision);

        let mut kit_effect = None;
        match &outcome {
            Some(CommandOutcome::PhotoTaken(photo)) => {
                let message = self.center.confirm_photo(photo);
                self.log.push(MissionLogEntry::new(
                    snapshot.timestamp,
                    self.tick,
                    LogSource::ControlCenter,
                    message,
                    None,
                ));
            }
            Some(CommandOutcome::KitDeployed { .. }) => {
                self.kits_used += 1;
                if let Some(victim) = &snapshot.sensors.detected_victim {
                    if let Some(severity) = self.scenario.apply_kit(victim.id) {
                        log::info!(
                            "[mission] kit stabilized {}: severity now {}",
                            victim.id,
                            severity.as_str()
                        );
                        kit_effect = Some((victim.id, severity));
                    }
                }
            }
            _ => {}
        }

        self.termination = self.check_termination();
        if let Some(reason) = self.termination {
            log::info!("[mission] ended at tick {}: {}", self.tick, reason);
        }

        Some(TickReport {
            snapshot,
            motion,
            decision,
            outcome,
            kit_effect,
            status_after: self.robot.status(),
        })
    }

    /// Tick until the mission ends or `active` is cleared. The flag is polled
    /// once per tick; a tick in flight always completes. `pace` is slept
    /// between ticks.
    pub fn run(
        &mut self,
        active: &AtomicBool,
        observer: &mut dyn MissionObserver,
        pace: Duration,
    ) -> TerminationReason {
        log::info!(
            "[mission] starting: {}x{} m tunnel, {} victims, {} kits, battery {}%",
            self.scenario.length_m(),
            self.scenario.width_m(),
            self.scenario.victims().count(),
            self.robot.kits(),
            self.robot.battery()
        );

        while self.termination.is_none() {
            if !active.load(Ordering::SeqCst) {
                log::info!("[mission] cancelled at tick {}", self.tick);
                self.termination = Some(TerminationReason::Cancelled);
                break;
            }
            let Some(report) = self.tick() else {
                break;
            };
            observer.on_tick(&report);
            if self.termination.is_none() && !pace.is_zero() {
                thread::sleep(pace);
            }
        }

        let reason = *self
            .termination
            .get_or_insert(TerminationReason::Cancelled);
        observer.on_finish(&self.report());
        reason
    }

    /// Snapshot of the mission so far.
    pub fn report(&self) -> MissionReport {
        MissionReport {
            started_at: self.started_at,
            finished_at: Utc::now(),
            termination: self.termination,
            packets_received: self.tick,
            final_position: self.robot.position(),
            final_battery_pct: (self.robot.battery() * 10.0).round() / 10.0,
            final_status: self.robot.status(),
            kits_used: self.kits_used,
            kits_remaining: self.robot.kits(),
            victims: self.center.alerts().to_vec(),
            photos: self.robot.photos().values().cloned().collect(),
            log: self.log.clone(),
            path: self.path.clone(),
        }
    }

    fn record_tick(&mut self, snapshot: &StateSnapshot, decision: &Decision) {
        let s = &snapshot.sensors;
        let message = format!(
            "pos {}m, battery {:.1}%, {}, {:.1}°C, CO2 {} ppm, risk {}",
            snapshot.pos_x,
            snapshot.battery_pct,
            snapshot.robot_status,
            s.temperature,
            s.co2_ppm,
            s.structural_risk
        );
        self.log.push(MissionLogEntry::new(
            snapshot.timestamp,
            self.tick,
            LogSource::Robot,
            message,
            decision.command,
        ));

        let noteworthy =
            decision.command.is_some() || matches!(decision.note, DecisionNote::VictimAlert(_));
        if noteworthy {
            self.log.push(MissionLogEntry::new(
                snapshot.timestamp,
                self.tick,
                LogSource::ControlCenter,
                decision.note.to_string(),
                decision.command,
            ));
        }
    }

    fn check_termination(&self) -> Option<TerminationReason> {
        let status = self.robot.status();
        if status.is_terminal() {
            return Some(TerminationReason::BatteryDepleted);
        }
        if self.robot.at_tunnel_end()
            && status == RobotStatus::Awaiting
            && self.center.pending_steps() == 0
        {
            return Some(TerminationReason::TunnelEndReached);
        }
        match self.config.max_ticks {
            Some(limit) if self.tick >= limit => Some(TerminationReason::TickLimit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::MissionMonitor;
    use robosoco_logic::command::Command;
    use std::sync::Arc;

    fn quiet_config() -> MissionConfig {
        let mut config = MissionConfig::default();
        config.seed = Some(42);
        config.sensors = config.sensors.noiseless();
        config
    }

    #[test]
    fn test_engine_creation() {
        let engine = MissionEngine::new(quiet_config()).unwrap();
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(engine.robot().position(), 0.0);
        assert_eq!(engine.scenario().victims().count(), 4);
        assert!(engine.termination().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = quiet_config();
        config.tunnel.length_m = 0.0;
        assert!(MissionEngine::new(config).is_err());
    }

    #[test]
    fn test_tick_advances_and_logs() {
        let mut engine = MissionEngine::new(quiet_config()).unwrap();
        let report = engine.tick().unwrap();
        assert_eq!(report.snapshot.tick, 1);
        assert_eq!(report.snapshot.pos_x, 1.0);
        assert_eq!(report.decision.command, None);
        assert_eq!(engine.log().len(), 1);
        assert_eq!(engine.log()[0].source, LogSource::Robot);
    }

    #[test]
    fn test_kit_improves_victim_once() {
        let mut engine = MissionEngine::new(quiet_config()).unwrap();
        let mut effects = Vec::new();
        while let Some(report) = engine.tick() {
            if let Some(effect) = report.kit_effect {
                effects.push(effect);
            }
            if engine.tick_count() > 200 {
                break;
            }
        }
        // Victim #2 at 150 m: severe → moderate.
        assert_eq!(effects, vec![(VictimId(2), Severity::Moderate)]);
        let victim = engine.scenario().victim(VictimId(2)).unwrap();
        assert!(victim.kit_applied);
    }

    #[test]
    fn test_tick_limit() {
        let mut config = quiet_config();
        config.max_ticks = Some(10);
        let mut engine = MissionEngine::new(config).unwrap();
        let active = AtomicBool::new(true);
        let mut monitor = MissionMonitor::new();
        let reason = engine.run(&active, &mut monitor, Duration::ZERO);
        assert_eq!(reason, TerminationReason::TickLimit);
        assert_eq!(engine.tick_count(), 10);
        assert!(engine.tick().is_none());
    }

    #[test]
    fn test_cancelled_before_first_tick() {
        let mut engine = MissionEngine::new(quiet_config()).unwrap();
        let active = AtomicBool::new(false);
        let mut monitor = MissionMonitor::new();
        let reason = engine.run(&active, &mut monitor, Duration::ZERO);
        assert_eq!(reason, TerminationReason::Cancelled);
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(monitor.termination(), Some(TerminationReason::Cancelled));
    }

    /// Clears the run flag from inside the observer once `after` ticks landed.
    struct StopAfter {
        active: Arc<AtomicBool>,
        after: u64,
        seen: u64,
    }

    impl MissionObserver for StopAfter {
        fn on_tick(&mut self, _report: &TickReport) {
            self.seen += 1;
            if self.seen == self.after {
                self.active.store(false, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_cancel_mid_mission_keeps_finished_ticks() {
        let mut engine = MissionEngine::new(quiet_config()).unwrap();
        let active = Arc::new(AtomicBool::new(true));
        let mut observer = StopAfter {
            active: Arc::clone(&active),
            after: 3,
            seen: 0,
        };
        let reason = engine.run(&active, &mut observer, Duration::ZERO);
        assert_eq!(reason, TerminationReason::Cancelled);
        assert_eq!(engine.tick_count(), 3);
        assert_eq!(observer.seen, 3);
        assert_eq!(engine.robot().position(), 3.0);
        assert_eq!(engine.report().termination, Some(TerminationReason::Cancelled));
    }

    #[test]
    fn test_photo_confirmation_logged() {
        let mut engine = MissionEngine::new(quiet_config()).unwrap();
        while engine.robot().photos().is_empty() && engine.tick_count() < 200 {
            engine.tick();
        }
        assert_eq!(engine.control_center().photos_confirmed(), 1);
        let confirmed = engine
            .log()
            .iter()
            .any(|e| e.source == LogSource::ControlCenter && e.message.contains("thermal_photo_"));
        assert!(confirmed);
        assert!(engine
            .log()
            .iter()
            .any(|e| e.action == Some(Command::DeployKit)));
    }
}
