//! Integration tests for the closed rescue loop.
//!
//! Exercises: Scenario → Robot motion → sensor sweep → StateSnapshot
//! → ControlCenter decision → Robot command execution
//!
//! All tests are pure logic with no clocks, threads or files.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use robosoco_logic::command::Command;
use robosoco_logic::config::MissionConfig;
use robosoco_logic::control::{ControlCenter, Decision, DecisionNote, SequenceState};
use robosoco_logic::robot::{CommandOutcome, Robot};
use robosoco_logic::scenario::{
    HeatSource, Scenario, ScenarioObject, StructuralHazard, Victim, VictimId,
};
use robosoco_logic::snapshot::{RobotStatus, StateSnapshot};
use robosoco_logic::triage::{Consciousness, Severity, VitalCondition};

// ── Helpers ────────────────────────────────────────────────────────────

struct Rig {
    config: MissionConfig,
    scenario: Scenario,
    robot: Robot,
    center: ControlCenter,
    rng: StdRng,
    tick: u64,
}

struct Step {
    snapshot: StateSnapshot,
    decision: Decision,
    outcome: Option<CommandOutcome>,
}

impl Rig {
    fn new(mut config: MissionConfig, objects: Vec<ScenarioObject>) -> Self {
        config.sensors = config.sensors.noiseless();
        let scenario = Scenario::new(config.tunnel.length_m, config.tunnel.width_m, objects);
        Self {
            robot: Robot::new(&config),
            center: ControlCenter::new(&config),
            rng: StdRng::seed_from_u64(7),
            config,
            scenario,
            tick: 0,
        }
    }

    fn step(&mut self) -> Step {
        self.tick += 1;
        self.robot.step_motion();
        let sensors = self
            .scenario
            .read_sensors(self.robot.point(), &self.config.sensors, &mut self.rng);
        let snapshot = self.robot.snapshot(self.tick, Utc::now(), sensors);
        let decision = self.center.decide(&snapshot);
        let outcome = decision
            .command
            .map(|cmd| self.robot.execute_command(cmd, &snapshot));
        Step {
            snapshot,
            decision,
            outcome,
        }
    }

    /// Step until a command is issued, at most `limit` ticks.
    fn next_command(&mut self, limit: usize) -> Option<Step> {
        (0..limit)
            .map(|_| self.step())
            .find(|s| s.decision.command.is_some())
    }
}

fn bleeding_victim_at_150() -> Vec<ScenarioObject> {
    vec![ScenarioObject::Victim(Victim::new(
        150.0,
        3.0,
        3.0,
        Severity::Critical,
        Consciousness::Unconscious,
        VitalCondition::Bleeding,
    ))]
}

// ── Victim response ────────────────────────────────────────────────────

#[test]
fn critical_bleeding_victim_gets_kit_photo_resume() {
    let mut rig = Rig::new(MissionConfig::default(), bleeding_victim_at_150());

    let first = rig.next_command(200).expect("victim should be sighted");
    assert_eq!(first.decision.command, Some(Command::DeployKit));
    assert!(first.snapshot.pos_x > 145.0 && first.snapshot.pos_x <= 150.0);
    assert_eq!(
        first.outcome,
        Some(CommandOutcome::KitDeployed { remaining: 2 })
    );
    assert_eq!(rig.robot.status(), RobotStatus::Awaiting);
    let stop = rig.robot.position();

    let second = rig.step();
    assert_eq!(second.snapshot.robot_status, RobotStatus::Awaiting);
    assert_eq!(second.decision.command, Some(Command::TakePhoto));
    assert!(matches!(second.outcome, Some(CommandOutcome::PhotoTaken(_))));

    let third = rig.step();
    assert_eq!(third.decision.command, Some(Command::ResumeExploration));
    assert_eq!(rig.center.sequence_state(), SequenceState::Idle);
    assert_eq!(rig.robot.position(), stop);

    let fourth = rig.step();
    assert_eq!(fourth.snapshot.robot_status, RobotStatus::Exploring);
    assert_eq!(rig.robot.position(), stop + 1.0);
    assert_eq!(rig.robot.photos().len(), 1);
}

#[test]
fn victim_is_alerted_once_across_its_whole_radius() {
    let mut rig = Rig::new(MissionConfig::default(), bleeding_victim_at_150());
    let mut alerts = 0;
    for _ in 0..220 {
        let step = rig.step();
        if matches!(step.decision.note, DecisionNote::VictimAlert(_)) {
            alerts += 1;
        }
    }
    assert_eq!(alerts, 1);
    assert_eq!(rig.robot.kits(), 2);
    assert!(rig.center.is_registered(VictimId(0)));
}

#[test]
fn overlapping_victims_resolve_to_nearest() {
    let objects = vec![
        ScenarioObject::Victim(Victim::new(
            100.0,
            6.0,
            6.0,
            Severity::Light,
            Consciousness::Awake,
            VitalCondition::Normal,
        )),
        ScenarioObject::Victim(Victim::new(
            102.0,
            4.0,
            6.0,
            Severity::Moderate,
            Consciousness::Awake,
            VitalCondition::Distressed,
        )),
    ];
    let mut rig = Rig::new(MissionConfig::default(), objects);
    let first = rig.next_command(200).expect("medium victim should be sighted");
    assert_eq!(first.decision.command, Some(Command::TakePhoto));
    let DecisionNote::VictimAlert(alert) = first.decision.note else {
        panic!("expected an alert");
    };
    assert_eq!(alert.victim.id, VictimId(1));
}

#[test]
fn kits_run_out_without_going_negative() {
    let mut config = MissionConfig::default();
    config.robot.kits = 1;
    let objects = (1..=3)
        .map(|i| {
            ScenarioObject::Victim(Victim::new(
                f64::from(i) * 50.0,
                4.0,
                1.5,
                Severity::Severe,
                Consciousness::Unconscious,
                VitalCondition::Breathing,
            ))
        })
        .collect();
    let mut rig = Rig::new(config, objects);

    let mut outcomes = Vec::new();
    for _ in 0..200 {
        let step = rig.step();
        if step.decision.command == Some(Command::DeployKit) {
            outcomes.push(step.outcome);
        }
    }
    assert_eq!(
        outcomes,
        vec![
            Some(CommandOutcome::KitDeployed { remaining: 0 }),
            Some(CommandOutcome::KitUnavailable),
            Some(CommandOutcome::KitUnavailable),
        ]
    );
    assert_eq!(rig.robot.kits(), 0);
    assert_eq!(rig.robot.photos().len(), 3);
}

// ── Hazards ────────────────────────────────────────────────────────────

#[test]
fn structural_collapse_turns_robot_around_mid_sequence() {
    let objects = vec![
        ScenarioObject::Victim(Victim::new(
            60.0,
            4.0,
            3.0,
            Severity::Critical,
            Consciousness::Unconscious,
            VitalCondition::Bleeding,
        )),
        ScenarioObject::StructuralHazard(StructuralHazard::new(60.0, 4.0, 5, 1.5)),
    ];
    let mut rig = Rig::new(MissionConfig::default(), objects);

    let kit = rig.next_command(100).expect("victim should be sighted");
    assert_eq!(kit.decision.command, Some(Command::DeployKit));
    assert_eq!(rig.center.pending_steps(), 2);

    // Hazard starts at 59 m; the sequence finishes at 58 m first.
    rig.step();
    rig.step();
    let hazard = rig.next_command(10).expect("hazard should be sensed");
    assert_eq!(hazard.decision.command, Some(Command::ReturnToBase));
    assert_eq!(rig.robot.status(), RobotStatus::Returning);

    let next = rig.step();
    assert_eq!(next.decision.command, None);
    assert!(matches!(
        next.decision.note,
        DecisionNote::MonitoringReturn { .. }
    ));
    assert!(rig.robot.position() < hazard.snapshot.pos_x);
}

#[test]
fn hazard_takes_precedence_over_new_victim() {
    let objects = vec![
        ScenarioObject::Victim(Victim::new(
            30.0,
            4.0,
            2.0,
            Severity::Critical,
            Consciousness::Unconscious,
            VitalCondition::Bleeding,
        )),
        ScenarioObject::StructuralHazard(StructuralHazard::new(31.0, 4.0, 4, 3.0)),
    ];
    let mut rig = Rig::new(MissionConfig::default(), objects);
    let first = rig.next_command(100).expect("hazard should be sensed");
    assert_eq!(first.decision.command, Some(Command::ReturnToBase));
    assert_eq!(rig.center.sequence_state(), SequenceState::Idle);
    assert!(!rig.center.is_registered(VictimId(0)));
}

#[test]
fn extreme_fire_forces_return() {
    let objects = vec![ScenarioObject::HeatSource(HeatSource::new(
        80.0, 4.0, 1500.0, 20.0,
    ))];
    let mut rig = Rig::new(MissionConfig::default(), objects);
    let step = rig.next_command(100).expect("heat should be sensed");
    assert_eq!(step.decision.command, Some(Command::ReturnToBase));
    assert!(step.snapshot.sensors.temperature > 1000.0);
}

// ── Battery and tunnel end ─────────────────────────────────────────────

#[test]
fn low_battery_forces_return_in_same_tick() {
    let mut config = MissionConfig::default();
    config.robot.start_battery_pct = 20.03;
    let mut rig = Rig::new(config, Vec::new());
    let step = rig.step();
    assert!(step.snapshot.battery_pct < 20.0);
    assert_eq!(step.snapshot.robot_status, RobotStatus::Returning);
}

#[test]
fn returning_robot_reaches_base_and_stops() {
    let mut config = MissionConfig::default();
    config.robot.start_battery_pct = 21.0;
    let mut rig = Rig::new(config, Vec::new());
    for _ in 0..100 {
        rig.step();
        if rig.robot.status().is_terminal() {
            break;
        }
    }
    assert_eq!(rig.robot.status(), RobotStatus::BatteryDepleted);
    assert_eq!(rig.robot.position(), 0.0);
}

#[test]
fn tunnel_end_holds_position() {
    let mut config = MissionConfig::default();
    config.tunnel.length_m = 20.0;
    let mut rig = Rig::new(config, Vec::new());
    let step = rig.next_command(30).expect("tunnel end should be reached");
    assert_eq!(step.snapshot.robot_status, RobotStatus::EndOfTunnel);
    assert_eq!(step.decision.command, Some(Command::HoldPosition));
    assert_eq!(rig.robot.status(), RobotStatus::Awaiting);
    assert!(rig.robot.at_tunnel_end());
    assert_eq!(rig.center.sequence_state(), SequenceState::Idle);
}

#[test]
fn victim_at_last_meter_is_handled_before_holding() {
    let mut config = MissionConfig::default();
    config.tunnel.length_m = 20.0;
    let objects = vec![ScenarioObject::Victim(Victim::new(
        20.0,
        4.0,
        0.5,
        Severity::Critical,
        Consciousness::Unconscious,
        VitalCondition::Bleeding,
    ))];
    let mut rig = Rig::new(config, objects);

    let mut commands = Vec::new();
    for _ in 0..30 {
        let step = rig.step();
        if let Some(command) = step.decision.command {
            commands.push((step.snapshot.robot_status, command));
        }
    }
    assert_eq!(
        commands,
        vec![
            (RobotStatus::Exploring, Command::DeployKit),
            (RobotStatus::Awaiting, Command::TakePhoto),
            (RobotStatus::Awaiting, Command::ResumeExploration),
            (RobotStatus::EndOfTunnel, Command::HoldPosition),
        ]
    );
    assert_eq!(rig.center.alerts().len(), 1);
    assert_eq!(rig.robot.kits(), 2);
    assert_eq!(rig.robot.position(), 20.0);
}
