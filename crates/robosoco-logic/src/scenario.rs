//! Tunnel world model and sensor readings by position.
//!
//! A [`Scenario`] is a fixed list of objects placed along the tunnel: heat
//! sources, structural hazards and victims. The robot never holds a handle to
//! it; each tick the mission owner asks for a [`SensorReading`] at the robot's
//! position.
//!
//! # Sensor model
//!
//! | Channel | Rule |
//! |---------|------|
//! | Temperature | max over emitters of `ambient + (t - ambient) * (1 - d/r)` for `d < r`, floored at ambient, plus jitter |
//! | CO2 | baseline plus jitter |
//! | Structural risk | max `risk_level` of hazards with `d < r`, else 0 |
//! | Victim | nearest victim with `d < detection_radius`; equal distances go to the lower id |
//!
//! Victims count as heat emitters too, at body temperature within their
//! detection radius, which is what the thermal camera picks up.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SensorConfig;
use crate::constants;
use crate::snapshot::{DetectedVictim, SensorReading};
use crate::triage::{Consciousness, LifeStatus, Severity, VitalCondition};

/// Stable identity of a victim, assigned in placement order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct VictimId(pub u32);

impl fmt::Display for VictimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "victim#{}", self.0)
    }
}

/// A point in tunnel coordinates (x along the tunnel, y across it).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatSource {
    pub position: Point,
    /// Temperature at the core of the source, in °C.
    pub temperature: f64,
    pub radius: f64,
}

impl HeatSource {
    pub fn new(x: f64, y: f64, temperature: f64, radius: f64) -> Self {
        Self {
            position: Point::new(x, y),
            temperature,
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralHazard {
    pub position: Point,
    pub risk_level: u8,
    pub radius: f64,
}

impl StructuralHazard {
    pub fn new(x: f64, y: f64, risk_level: u8, radius: f64) -> Self {
        Self {
            position: Point::new(x, y),
            risk_level,
            radius,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Victim {
    /// Reassigned by [`Scenario::new`]; any value in a config file is ignored.
    #[serde(default)]
    pub id: VictimId,
    pub position: Point,
    pub detection_radius: f64,
    #[serde(default = "default_body_temperature")]
    pub body_temperature: f64,
    pub severity: Severity,
    pub consciousness: Consciousness,
    pub condition: VitalCondition,
    #[serde(default)]
    pub life_status: LifeStatus,
    /// Set once a first-aid kit has improved this victim's severity.
    #[serde(default)]
    pub kit_applied: bool,
}

fn default_body_temperature() -> f64 {
    constants::sensors::DEFAULT_BODY_TEMP_C
}

impl Victim {
    pub fn new(
        x: f64,
        y: f64,
        detection_radius: f64,
        severity: Severity,
        consciousness: Consciousness,
        condition: VitalCondition,
    ) -> Self {
        Self {
            id: VictimId::default(),
            position: Point::new(x, y),
            detection_radius,
            body_temperature: default_body_temperature(),
            severity,
            consciousness,
            condition,
            life_status: LifeStatus::Alive,
            kit_applied: false,
        }
    }

    pub fn with_body_temperature(mut self, celsius: f64) -> Self {
        self.body_temperature = celsius;
        self
    }

    fn report(&self) -> DetectedVictim {
        DetectedVictim {
            id: self.id,
            position: self.position,
            severity: self.severity,
            consciousness: self.consciousness,
            condition: self.condition,
            life_status: self.life_status,
        }
    }
}

/// Anything placed in the tunnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioObject {
    HeatSource(HeatSource),
    StructuralHazard(StructuralHazard),
    Victim(Victim),
}

impl ScenarioObject {
    pub fn position(&self) -> Point {
        match self {
            Self::HeatSource(h) => h.position,
            Self::StructuralHazard(s) => s.position,
            Self::Victim(v) => v.position,
        }
    }

    /// Influence radius (detection radius for victims).
    pub fn radius(&self) -> f64 {
        match self {
            Self::HeatSource(h) => h.radius,
            Self::StructuralHazard(s) => s.radius,
            Self::Victim(v) => v.detection_radius,
        }
    }

    /// Core temperature and radius, if this object radiates heat.
    fn heat_emission(&self) -> Option<(f64, f64)> {
        match self {
            Self::HeatSource(h) => Some((h.temperature, h.radius)),
            Self::Victim(v) => Some((v.body_temperature, v.detection_radius)),
            Self::StructuralHazard(_) => None,
        }
    }
}

/// Temperature contributed by one emitter at distance `dist`, or `None`
/// outside its radius.
pub fn attenuated_temperature(ambient: f64, source_temp: f64, dist: f64, radius: f64) -> Option<f64> {
    if dist >= radius {
        return None;
    }
    Some(ambient + (source_temp - ambient) * (1.0 - dist / radius))
}

/// The tunnel and everything in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    length_m: f64,
    width_m: f64,
    objects: Vec<ScenarioObject>,
}

impl Scenario {
    /// Place `objects` in the tunnel. Victims are numbered 0, 1, 2… in the
    /// order they appear.
    pub fn new(length_m: f64, width_m: f64, objects: Vec<ScenarioObject>) -> Self {
        let mut objects = objects;
        let mut next_id = 0;
        for obj in &mut objects {
            if let ScenarioObject::Victim(v) = obj {
                v.id = VictimId(next_id);
                next_id += 1;
            }
        }
        Self {
            length_m,
            width_m,
            objects,
        }
    }

    /// Bus fire in a road tunnel: one large fire with the wreck under it,
    /// and four victims spread between 150 m and 450 m.
    pub fn tunnel_accident(length_m: f64, width_m: f64) -> Self {
        use Consciousness::*;
        use Severity::*;
        use VitalCondition::*;

        Self::new(
            length_m,
            width_m,
            vec![
                ScenarioObject::HeatSource(HeatSource::new(350.0, 4.0, 800.0, 25.0)),
                ScenarioObject::StructuralHazard(StructuralHazard::new(350.0, 4.0, 3, 10.0)),
                ScenarioObject::Victim(
                    Victim::new(355.0, 5.0, 5.0, Critical, Unconscious, Breathing)
                        .with_body_temperature(38.0),
                ),
                ScenarioObject::Victim(Victim::new(320.0, 2.0, 4.0, Moderate, Awake, Distressed)),
                ScenarioObject::Victim(
                    Victim::new(150.0, 3.0, 3.0, Severe, Unconscious, Bleeding)
                        .with_body_temperature(37.5),
                ),
                ScenarioObject::Victim(
                    Victim::new(450.0, 6.0, 3.0, Light, Awake, Normal).with_body_temperature(36.8),
                ),
            ],
        )
    }

    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    pub fn objects(&self) -> &[ScenarioObject] {
        &self.objects
    }

    pub fn victims(&self) -> impl Iterator<Item = &Victim> {
        self.objects.iter().filter_map(|o| match o {
            ScenarioObject::Victim(v) => Some(v),
            _ => None,
        })
    }

    pub fn victim(&self, id: VictimId) -> Option<&Victim> {
        self.victims().find(|v| v.id == id)
    }

    /// Noise-free temperature at `at`.
    pub fn temperature_at(&self, at: Point, ambient: f64) -> f64 {
        self.objects
            .iter()
            .filter_map(|obj| {
                let (temp, radius) = obj.heat_emission()?;
                attenuated_temperature(ambient, temp, obj.position().distance_to(at), radius)
            })
            .fold(ambient, f64::max)
    }

    pub fn structural_risk_at(&self, at: Point) -> u8 {
        self.objects
            .iter()
            .filter_map(|obj| match obj {
                ScenarioObject::StructuralHazard(h) if h.position.distance_to(at) < h.radius => {
                    Some(h.risk_level)
                }
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Nearest victim whose detection radius covers `at`.
    pub fn detect_victim(&self, at: Point) -> Option<DetectedVictim> {
        self.victims()
            .map(|v| (v, v.position.distance_to(at)))
            .filter(|(v, dist)| *dist < v.detection_radius)
            .min_by(|(a, da), (b, db)| da.total_cmp(db).then(a.id.cmp(&b.id)))
            .map(|(v, _)| v.report())
    }

    /// Full sensor sweep at `at`. Jitter comes from `rng`; with a noiseless
    /// [`SensorConfig`] the reading is deterministic.
    pub fn read_sensors<R: Rng>(
        &self,
        at: Point,
        sensors: &SensorConfig,
        rng: &mut R,
    ) -> SensorReading {
        let temperature = self.temperature_at(at, sensors.ambient_temp_c)
            + symmetric_jitter(rng, sensors.temp_noise_c);
        let co2 = sensors.base_co2_ppm + symmetric_jitter(rng, sensors.co2_noise_ppm);

        SensorReading {
            temperature: round_tenths(temperature),
            co2_ppm: co2.round().max(0.0),
            structural_risk: self.structural_risk_at(at),
            detected_victim: self.detect_victim(at),
        }
    }

    /// Apply the effect of a first-aid kit: severity improves by one tier,
    /// only the first time. Returns the new severity when it changed.
    pub fn apply_kit(&mut self, id: VictimId) -> Option<Severity> {
        let victim = self.objects.iter_mut().find_map(|o| match o {
            ScenarioObject::Victim(v) if v.id == id => Some(v),
            _ => None,
        })?;
        if victim.kit_applied {
            return None;
        }
        victim.kit_applied = true;
        victim.severity = victim.severity.improved();
        Some(victim.severity)
    }
}

fn symmetric_jitter<R: Rng>(rng: &mut R, half_width: f64) -> f64 {
    if half_width > 0.0 {
        rng.gen_range(-half_width..=half_width)
    } else {
        0.0
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
