//! RoboSoco Headless Mission Harness
//!
//! Validates the pure rescue logic, then flies the tunnel mission with
//! console logging. Runs entirely in-process with no dashboard or hardware.
//!
//! Usage:
//!   cargo run -p robosoco-simtest
//!   cargo run -p robosoco-simtest -- --verbose --tick-ms 0
//!   cargo run -p robosoco-simtest -- --config mission.toml --report report.json

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;

use robosoco_core::prelude::*;
use robosoco_logic::command::Command;
use robosoco_logic::config::SensorConfig;
use robosoco_logic::control::{ControlCenter, DecisionNote, SequenceState};
use robosoco_logic::robot::{CommandOutcome, Robot};
use robosoco_logic::scenario::{
    attenuated_temperature, HeatSource, Point, Scenario, ScenarioObject, StructuralHazard,
    Victim, VictimId,
};
use robosoco_logic::snapshot::{photo_id_for, DetectedVictim, RobotStatus, SensorReading, StateSnapshot};
use robosoco_logic::triage::{
    classify_priority, Consciousness, LifeStatus, Priority, Severity, VitalCondition,
    FALLBACK_PRIORITY,
};

#[derive(Parser, Debug)]
#[command(name = "robosoco-simtest")]
#[command(about = "Validate rescue logic and run the tunnel mission headless", long_about = None)]
#[command(version)]
struct Args {
    /// Mission config file (TOML). Defaults to the demo tunnel.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for sensor noise
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between ticks in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Write the mission report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print every validation check, not only failures
    #[arg(long)]
    verbose: bool,

    /// Go straight to the mission
    #[arg(long)]
    skip_validation: bool,

    /// Run the validation sweep only
    #[arg(long, conflicts_with = "skip_validation")]
    validate_only: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    if !args.skip_validation {
        let failed = run_validation(args.verbose);
        if failed > 0 {
            bail!("{} validation check(s) failed", failed);
        }
    }
    if args.validate_only {
        return Ok(());
    }

    let config = mission_config(args)?;
    run_mission(config, args)
}

fn run_validation(verbose: bool) -> usize {
    println!("=== RoboSoco Logic Validation ===\n");

    let mut results = Vec::new();

    // 1. Sensor model
    results.extend(validate_sensor_model(verbose));

    // 2. Triage table
    results.extend(validate_triage(verbose));

    // 3. Robot actuation
    results.extend(validate_robot(verbose));

    // 4. Decision engine
    results.extend(validate_decision_engine(verbose));

    // 5. Headless demo mission
    results.extend(validate_demo_mission(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===\n",
        passed, total, failed
    );
    failed
}

// ── 1. Sensor Model ─────────────────────────────────────────────────────

fn validate_sensor_model(verbose: bool) -> Vec<TestResult> {
    println!("--- Sensor Model ---");
    let mut results = Vec::new();
    let ambient = 25.0;

    // Sources contribute nothing at or beyond their radius
    let edge = attenuated_temperature(ambient, 800.0, 25.0, 25.0);
    let beyond = attenuated_temperature(ambient, 800.0, 40.0, 25.0);
    results.push(check(
        "sensor_zero_outside_radius",
        edge.is_none() && beyond.is_none(),
        format!("at radius: {:?}, beyond: {:?}", edge, beyond),
    ));

    // Temperature near the bus fire lies between ambient and the core,
    // falling off with distance
    let fire = Scenario::new(
        500.0,
        8.0,
        vec![ScenarioObject::HeatSource(HeatSource::new(350.0, 4.0, 800.0, 25.0))],
    );
    let temps: Vec<f64> = [355.0, 360.0, 365.0, 370.0]
        .iter()
        .map(|&x| fire.temperature_at(Point::new(x, 5.0), ambient))
        .collect();
    let bounded = temps.iter().all(|&t| t > ambient && t < 800.0);
    let decreasing = temps.windows(2).all(|w| w[0] > w[1]);
    if verbose {
        println!("  fire profile: {:?}", temps);
    }
    results.push(check(
        "sensor_fire_attenuation",
        bounded && decreasing,
        format!("x=355..370 → {:?}", temps),
    ));

    // Structural risk is the max of overlapping hazards
    let hazards = Scenario::new(
        500.0,
        8.0,
        vec![
            ScenarioObject::StructuralHazard(StructuralHazard::new(100.0, 4.0, 2, 10.0)),
            ScenarioObject::StructuralHazard(StructuralHazard::new(104.0, 4.0, 5, 3.0)),
        ],
    );
    let risk_overlap = hazards.structural_risk_at(Point::new(103.0, 4.0));
    let risk_outside = hazards.structural_risk_at(Point::new(110.0, 4.0));
    results.push(check(
        "sensor_structural_max",
        risk_overlap == 5 && risk_outside == 0,
        format!("overlap={}, at edge={}", risk_overlap, risk_outside),
    ));

    // Nearest victim wins when radii overlap
    let crowd = Scenario::new(
        500.0,
        8.0,
        vec![
            ScenarioObject::Victim(Victim::new(
                200.0,
                4.0,
                6.0,
                Severity::Light,
                Consciousness::Awake,
                VitalCondition::Normal,
            )),
            ScenarioObject::Victim(Victim::new(
                203.0,
                4.0,
                6.0,
                Severity::Critical,
                Consciousness::Unconscious,
                VitalCondition::Bleeding,
            )),
        ],
    );
    let near_second = crowd.detect_victim(Point::new(202.0, 4.0)).map(|v| v.id);
    let midpoint = crowd.detect_victim(Point::new(201.5, 4.0)).map(|v| v.id);
    results.push(check(
        "sensor_nearest_victim",
        near_second == Some(VictimId(1)) && midpoint == Some(VictimId(0)),
        format!("at 202 → {:?}, at midpoint → {:?}", near_second, midpoint),
    ));

    // Noise stays within its band
    let noisy = SensorConfig::default();
    let mut rng = rand::thread_rng();
    let readings: Vec<SensorReading> = (0..200)
        .map(|_| fire.read_sensors(Point::new(500.0, 4.0), &noisy, &mut rng))
        .collect();
    let in_band = readings.iter().all(|r| {
        (r.temperature - ambient).abs() <= noisy.temp_noise_c + 0.05
            && (r.co2_ppm - noisy.base_co2_ppm).abs() <= noisy.co2_noise_ppm
    });
    results.push(check(
        "sensor_noise_band",
        in_band,
        format!(
            "200 readings within ±{}°C / ±{} ppm",
            noisy.temp_noise_c, noisy.co2_noise_ppm
        ),
    ));

    results
}

// ── 2. Triage ───────────────────────────────────────────────────────────

fn validate_triage(verbose: bool) -> Vec<TestResult> {
    println!("--- Triage ---");
    let mut results = Vec::new();

    let table = [
        (Severity::Critical, Consciousness::Unconscious, VitalCondition::Bleeding, Priority::High),
        (Severity::Severe, Consciousness::Unconscious, VitalCondition::Breathing, Priority::High),
        (Severity::Moderate, Consciousness::Awake, VitalCondition::Distressed, Priority::Medium),
        (Severity::Moderate, Consciousness::Unconscious, VitalCondition::Breathing, Priority::Medium),
        (Severity::Light, Consciousness::Awake, VitalCondition::Distressed, Priority::Medium),
        (Severity::Light, Consciousness::Awake, VitalCondition::Normal, Priority::Low),
    ];
    let mismatches: Vec<_> = table
        .iter()
        .filter(|(s, c, v, expected)| classify_priority(*s, *c, *v) != *expected)
        .collect();
    if verbose {
        for (s, c, v, p) in &table {
            println!(
                "  {}/{}/{} → {}",
                s.as_str(),
                c.as_str(),
                v.as_str(),
                p
            );
        }
    }
    results.push(check(
        "triage_table_rows",
        mismatches.is_empty(),
        format!("{} listed rows, {} mismatched", table.len(), mismatches.len()),
    ));

    let fallback = classify_priority(
        Severity::Critical,
        Consciousness::Awake,
        VitalCondition::Normal,
    );
    results.push(check(
        "triage_fallback_medium",
        fallback == FALLBACK_PRIORITY && fallback == Priority::Medium,
        format!("critical/awake/normal → {}", fallback),
    ));

    results
}

// ── 3. Robot ────────────────────────────────────────────────────────────

fn context_for(robot: &Robot, victim: Option<DetectedVictim>) -> StateSnapshot {
    robot.snapshot(
        0,
        chrono::Utc::now(),
        SensorReading {
            temperature: 25.0,
            co2_ppm: 415.0,
            structural_risk: 0,
            detected_victim: victim,
        },
    )
}

fn validate_robot(verbose: bool) -> Vec<TestResult> {
    println!("--- Robot ---");
    let mut results = Vec::new();

    // Kits never go negative
    let config = MissionConfig::default();
    let mut robot = Robot::new(&config);
    let ctx = context_for(&robot, None);
    let outcomes: Vec<CommandOutcome> = (0..5)
        .map(|_| robot.execute_command(Command::DeployKit, &ctx))
        .collect();
    let unavailable = outcomes
        .iter()
        .filter(|o| **o == CommandOutcome::KitUnavailable)
        .count();
    results.push(check(
        "robot_kits_floor_at_zero",
        robot.kits() == 0 && unavailable == 2,
        format!("5 deployments: {} kits left, {} refused", robot.kits(), unavailable),
    ));

    // Battery watchdog turns the robot in the tick the threshold is crossed
    let mut low = config.clone();
    low.robot.start_battery_pct = 20.03;
    let mut robot = Robot::new(&low);
    let motion = robot.step_motion();
    results.push(check(
        "robot_watchdog_same_tick",
        motion.low_battery_return && robot.status() == RobotStatus::Returning,
        format!("battery {:.2}% → {}", robot.battery(), robot.status()),
    ));

    // Full tunnel drive costs 50% battery and ends at EndOfTunnel
    let mut robot = Robot::new(&config);
    let mut steps = 0;
    while robot.advance() {
        steps += 1;
    }
    if verbose {
        println!("  drove {} steps, battery {:.1}%", steps, robot.battery());
    }
    results.push(check(
        "robot_full_drive",
        steps == 500 && robot.status() == RobotStatus::EndOfTunnel && robot.battery() == 50.0,
        format!("{} steps, {:.1}%, {}", steps, robot.battery(), robot.status()),
    ));

    // Photos are keyed by position
    let id = photo_id_for(150.0);
    results.push(check(
        "robot_photo_id",
        id == "thermal_photo_150m",
        id,
    ));

    results
}

// ── 4. Decision Engine ──────────────────────────────────────────────────

fn bleeding_victim() -> DetectedVictim {
    DetectedVictim {
        id: VictimId(7),
        position: Point::new(150.0, 3.0),
        severity: Severity::Critical,
        consciousness: Consciousness::Unconscious,
        condition: VitalCondition::Bleeding,
        life_status: LifeStatus::Alive,
    }
}

fn snapshot_with(status: RobotStatus, risk: u8, victim: Option<DetectedVictim>) -> StateSnapshot {
    StateSnapshot {
        tick: 0,
        timestamp: chrono::Utc::now(),
        pos_x: 150.0,
        pos_y: 4.0,
        battery_pct: 85.0,
        robot_status: status,
        sensors: SensorReading {
            temperature: 27.0,
            co2_ppm: 415.0,
            structural_risk: risk,
            detected_victim: victim,
        },
    }
}

fn validate_decision_engine(verbose: bool) -> Vec<TestResult> {
    println!("--- Decision Engine ---");
    let mut results = Vec::new();
    let config = MissionConfig::default();

    // Kit → photo → resume, one step per Awaiting tick
    let mut center = ControlCenter::new(&config);
    let mut emitted = Vec::new();
    let mut pending = Vec::new();
    let first = center.decide(&snapshot_with(RobotStatus::Exploring, 0, Some(bleeding_victim())));
    emitted.push(first.command);
    pending.push(center.pending_steps());
    for _ in 0..3 {
        let d = center.decide(&snapshot_with(RobotStatus::Awaiting, 0, Some(bleeding_victim())));
        emitted.push(d.command);
        pending.push(center.pending_steps());
    }
    let expected = vec![
        Some(Command::DeployKit),
        Some(Command::TakePhoto),
        Some(Command::ResumeExploration),
        None,
    ];
    if verbose {
        println!("  emitted {:?}, pending {:?}", emitted, pending);
    }
    results.push(check(
        "decision_high_priority_sequence",
        emitted == expected && pending == vec![2, 1, 0, 0],
        format!("{:?}", emitted),
    ));

    // Registered victims never alert twice
    let again = center.decide(&snapshot_with(RobotStatus::Exploring, 0, Some(bleeding_victim())));
    results.push(check(
        "decision_dedup",
        again.command.is_none() && center.alerts().len() == 1,
        format!("second pass: {}", again.note),
    ));

    // Structural risk above the limit wins over victims and sequences
    let mut center = ControlCenter::new(&config);
    center.decide(&snapshot_with(RobotStatus::Exploring, 0, Some(bleeding_victim())));
    let hazard = center.decide(&snapshot_with(RobotStatus::Awaiting, 4, Some(bleeding_victim())));
    let discarded = matches!(
        hazard.note,
        DecisionNote::HazardOverride {
            discarded_steps: 2,
            ..
        }
    );
    results.push(check(
        "decision_hazard_override",
        hazard.command == Some(Command::ReturnToBase)
            && discarded
            && center.sequence_state() == SequenceState::Idle,
        hazard.note.to_string(),
    ));

    // At the limit is not a hazard
    let mut center = ControlCenter::new(&config);
    let at_limit = center.decide(&snapshot_with(RobotStatus::Exploring, 3, None));
    results.push(check(
        "decision_risk_limit_exclusive",
        at_limit.command.is_none(),
        format!("risk 3 → {:?}", at_limit.command),
    ));

    results
}

// ── 5. Demo Mission ─────────────────────────────────────────────────────

fn validate_demo_mission(verbose: bool) -> Vec<TestResult> {
    println!("--- Demo Mission ---");
    let mut results = Vec::new();

    let mut config = MissionConfig::default();
    config.seed = Some(0);
    config.sensors = config.sensors.noiseless();
    let mut engine = match MissionEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(check("mission_config", false, e.to_string()));
            return results;
        }
    };

    let mut commands = Vec::new();
    while let Some(report) = engine.tick() {
        if let Some(command) = report.decision.command {
            commands.push((report.snapshot.tick, command));
        }
    }
    if verbose {
        for (tick, command) in &commands {
            println!("  tick {:>3}: {}", tick, command);
        }
    }

    let report = engine.report();
    results.push(check(
        "mission_reaches_tunnel_end",
        report.termination == Some(TerminationReason::TunnelEndReached),
        format!(
            "{:?} after {} ticks",
            report.termination, report.packets_received
        ),
    ));
    results.push(check(
        "mission_all_victims_registered",
        report.victims.len() == 4,
        format!("{} of 4 victims registered", report.victims.len()),
    ));
    results.push(check(
        "mission_kits_and_photos",
        report.kits_used == 2 && report.photos.len() == 3,
        format!(
            "{} kits used, {} photos",
            report.kits_used,
            report.photos.len()
        ),
    ));

    results
}

// ── Mission run ─────────────────────────────────────────────────────────

fn mission_config(args: &Args) -> anyhow::Result<MissionConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading mission config {}", path.display()))?,
        None => MissionConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(ms) = args.tick_ms {
        config.tick_interval_ms = ms;
    }
    if args.max_ticks.is_some() {
        config.max_ticks = args.max_ticks;
    }
    config.validate().context("invalid mission config")?;
    Ok(config)
}

fn run_mission(config: MissionConfig, args: &Args) -> anyhow::Result<()> {
    println!("=== RoboSoco Tunnel Mission ===\n");

    let active = Arc::new(AtomicBool::new(true));
    let flag = active.clone();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        flag.store(false, Ordering::SeqCst);
    })
    .context("installing Ctrl-C handler")?;

    let pace = Duration::from_millis(config.tick_interval_ms);
    let mut engine = MissionEngine::new(config).context("building mission")?;
    let reason = engine.run(&active, &mut LogObserver, pace);
    let report = engine.report();

    println!("\n--- Mission Summary ---");
    println!("  termination:      {}", reason);
    println!("  packets received: {}", report.packets_received);
    println!(
        "  wall time:        {} ms",
        report.duration().num_milliseconds()
    );
    println!(
        "  robot:            {}m, {:.1}% battery, {}",
        report.final_position, report.final_battery_pct, report.final_status
    );
    println!(
        "  kits:             {} used, {} remaining",
        report.kits_used, report.kits_remaining
    );
    println!("  victims:          {}", report.victims.len());
    for alert in &report.victims {
        println!("    - tick {:>3}: {}", alert.tick, alert);
    }
    println!("  photos:           {}", report.photos.len());
    for photo in &report.photos {
        let subject = photo
            .victim_data
            .as_ref()
            .map(|v| v.id.to_string())
            .unwrap_or_else(|| "no victim".into());
        println!(
            "    - {} at {}m, max {:.1}°C, {}",
            photo.photo_id, photo.pos_x, photo.max_temperature, subject
        );
    }

    if let Some(path) = &args.report {
        report
            .save(path)
            .with_context(|| format!("writing report {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }
    Ok(())
}
