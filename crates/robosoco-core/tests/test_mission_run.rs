//! Integration tests for complete missions.
//!
//! Exercises: config file → MissionEngine → observers → MissionReport
//!
//! Pacing is zero throughout; sensor noise stays on unless a test needs
//! exact readings, since no decision in these tunnels sits near a threshold.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use robosoco_core::prelude::*;
use robosoco_core::report::LogSource;
use robosoco_logic::command::Command;
use robosoco_logic::scenario::VictimId;
use robosoco_logic::snapshot::RobotStatus;
use robosoco_logic::triage::Priority;

// ── Helpers ────────────────────────────────────────────────────────────

fn run_to_end(config: MissionConfig) -> (MissionEngine, TerminationReason, MissionMonitor) {
    let mut engine = MissionEngine::new(config).expect("valid config");
    let monitor = MissionMonitor::new();
    let mut observers = (monitor.clone(), LogObserver);
    let reason = engine.run(&AtomicBool::new(true), &mut observers, Duration::ZERO);
    (engine, reason, monitor)
}

fn seeded(seed: u64) -> MissionConfig {
    MissionConfig {
        seed: Some(seed),
        ..MissionConfig::default()
    }
}

// ── Demo tunnel ────────────────────────────────────────────────────────

#[test]
fn demo_tunnel_mission_reaches_the_end() {
    let (engine, reason, monitor) = run_to_end(seeded(42));
    assert_eq!(reason, TerminationReason::TunnelEndReached);
    assert_eq!(monitor.termination(), Some(reason));

    // 500 driving ticks, one to stop at the end, two waits per kit
    // sequence and one per photo-only sequence.
    assert_eq!(engine.tick_count(), 506);

    let report = engine.report();
    assert_eq!(report.packets_received, 506);
    assert_eq!(report.final_position, 500.0);
    assert_eq!(report.final_battery_pct, 50.0);
    assert_eq!(report.final_status, RobotStatus::Awaiting);
    assert_eq!(report.kits_used, 2);
    assert_eq!(report.kits_remaining, 1);
    assert_eq!(report.photos.len(), 3);
    assert_eq!(report.path.len(), 506);
    assert!(report.duration() >= chrono::Duration::zero());
}

#[test]
fn demo_tunnel_alerts_each_victim_once_in_order() {
    let (engine, _, _) = run_to_end(seeded(3));
    let alerts = engine.control_center().alerts();
    let seen: Vec<(VictimId, Priority)> = alerts.iter().map(|a| (a.victim.id, a.priority)).collect();
    assert_eq!(
        seen,
        vec![
            (VictimId(2), Priority::High),
            (VictimId(1), Priority::Medium),
            (VictimId(0), Priority::High),
            (VictimId(3), Priority::Low),
        ]
    );
    assert!(alerts[0].max_priority_bleeding);
    assert_eq!(alerts[0].eta_minutes, 3);
    assert!(!alerts[2].max_priority_bleeding);
}

#[test]
fn decisions_do_not_depend_on_sensor_noise() {
    let commands = |seed| {
        let (engine, _, _) = run_to_end(seeded(seed));
        engine
            .log()
            .iter()
            .filter(|e| e.source == LogSource::Robot)
            .filter_map(|e| e.action.map(|a| (e.tick, a)))
            .collect::<Vec<_>>()
    };
    let a = commands(1);
    assert_eq!(a, commands(99));
    assert_eq!(a.last().map(|(_, c)| *c), Some(Command::HoldPosition));
}

#[test]
fn monitor_holds_final_tick() {
    let (_, _, monitor) = run_to_end(seeded(5));
    let last = monitor.latest().expect("at least one tick");
    assert_eq!(last.snapshot.tick, 506);
    assert_eq!(last.decision.command, Some(Command::HoldPosition));
    assert_eq!(last.status_after, RobotStatus::Awaiting);
}

// ── Config files and reports ───────────────────────────────────────────

const COLLAPSE_TUNNEL: &str = r#"
seed = 11

[tunnel]
length_m = 200.0

[[objects]]
kind = "victim"
position = { x = 80.0, y = 3.0 }
detection_radius = 3.0
severity = "critical"
consciousness = "unconscious"
condition = "bleeding"

[[objects]]
kind = "structural_hazard"
position = { x = 150.0, y = 4.0 }
risk_level = 5
radius = 6.0
"#;

#[test]
fn collapse_sends_robot_home() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("collapse.toml");
    std::fs::write(&config_path, COLLAPSE_TUNNEL).unwrap();

    let config = load_config(&config_path).unwrap();
    let (engine, reason, _) = run_to_end(config);

    assert_eq!(reason, TerminationReason::BatteryDepleted);
    let report = engine.report();
    assert_eq!(report.final_position, 0.0);
    assert_eq!(report.final_battery_pct, 71.0);
    assert_eq!(report.kits_used, 1);
    assert_eq!(report.victims.len(), 1);

    let overrides: Vec<_> = engine
        .log()
        .iter()
        .filter(|e| e.source == LogSource::ControlCenter)
        .filter(|e| e.action == Some(Command::ReturnToBase))
        .collect();
    assert_eq!(overrides.len(), 1);
    assert!(overrides[0].message.contains("structural risk 5"));

    let report_path = dir.path().join("report.json");
    report.save(&report_path).unwrap();
    let reloaded = MissionReport::load(&report_path).unwrap();
    assert_eq!(reloaded.termination, Some(TerminationReason::BatteryDepleted));
    assert_eq!(reloaded.victims.len(), 1);
}

#[test]
fn low_battery_mission_turns_back() {
    let mut config = seeded(8);
    config.robot.start_battery_pct = 30.0;
    let (engine, reason, _) = run_to_end(config);
    assert_eq!(reason, TerminationReason::BatteryDepleted);
    // 30% drains below 20% after 101 m and the robot drives back the same way.
    let furthest = engine
        .report()
        .path
        .iter()
        .map(|p| p.x)
        .fold(0.0, f64::max);
    assert_eq!(furthest, 101.0);
    assert_eq!(engine.robot().position(), 0.0);
}

#[test]
fn tick_limit_caps_mission() {
    let mut config = seeded(2);
    config.max_ticks = Some(50);
    let (engine, reason, _) = run_to_end(config);
    assert_eq!(reason, TerminationReason::TickLimit);
    assert_eq!(engine.report().packets_received, 50);
}
