//! Victim attributes and priority classification.
//!
//! The control center ranks every newly detected victim into one of three
//! response tiers with a fixed rule table:
//!
//! | Severity | Consciousness | Condition | Priority |
//! |----------|---------------|-----------|----------|
//! | critical / severe | unconscious | bleeding / breathing | High |
//! | moderate | any | distressed / normal | Medium |
//! | moderate | unconscious | breathing | Medium |
//! | light | awake | distressed | Medium |
//! | light | awake | normal | Low |
//!
//! Every other combination falls back to [`FALLBACK_PRIORITY`].
//!
//! ```
//! use robosoco_logic::triage::{classify_priority, Consciousness, Priority, Severity, VitalCondition};
//!
//! let p = classify_priority(Severity::Critical, Consciousness::Unconscious, VitalCondition::Bleeding);
//! assert_eq!(p, Priority::High);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Injury severity reported by the victim sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Severe,
    Moderate,
    Light,
}

impl Severity {
    /// One tier better, used when a first-aid kit reaches the victim.
    /// `Light` stays `Light`.
    pub fn improved(self) -> Self {
        match self {
            Self::Critical => Self::Severe,
            Self::Severe => Self::Moderate,
            Self::Moderate | Self::Light => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Severe => "severe",
            Self::Moderate => "moderate",
            Self::Light => "light",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consciousness {
    Awake,
    Unconscious,
}

impl Consciousness {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Awake => "awake",
            Self::Unconscious => "unconscious",
        }
    }
}

/// Observed vital condition of the victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalCondition {
    Bleeding,
    Breathing,
    /// Conscious but in acute crisis (panic, shock, pain).
    Distressed,
    Normal,
}

impl VitalCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bleeding => "bleeding",
            Self::Breathing => "breathing",
            Self::Distressed => "distressed",
            Self::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStatus {
    #[default]
    Alive,
    Deceased,
    Unknown,
}

impl LifeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Deceased => "deceased",
            Self::Unknown => "unknown",
        }
    }
}

/// Response tier assigned to a victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Kit, photo, resume.
    High,
    /// Photo, resume.
    Medium,
    /// Registered and otherwise left for the human team.
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority for attribute combinations the table does not list.
pub const FALLBACK_PRIORITY: Priority = Priority::Medium;

/// Classify a victim into a response tier.
pub fn classify_priority(
    severity: Severity,
    consciousness: Consciousness,
    condition: VitalCondition,
) -> Priority {
    use Consciousness::*;
    use Severity::*;
    use VitalCondition::*;

    match (severity, consciousness, condition) {
        (Critical | Severe, Unconscious, Bleeding | Breathing) => Priority::High,
        (Moderate, _, Distressed | Normal) => Priority::Medium,
        (Moderate, Unconscious, Breathing) => Priority::Medium,
        (Light, Awake, Distressed) => Priority::Medium,
        (Light, Awake, Normal) => Priority::Low,
        _ => FALLBACK_PRIORITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SEVERITIES: [Severity; 4] = [
        Severity::Critical,
        Severity::Severe,
        Severity::Moderate,
        Severity::Light,
    ];
    const ALL_CONSCIOUSNESS: [Consciousness; 2] = [Consciousness::Awake, Consciousness::Unconscious];
    const ALL_CONDITIONS: [VitalCondition; 4] = [
        VitalCondition::Bleeding,
        VitalCondition::Breathing,
        VitalCondition::Distressed,
        VitalCondition::Normal,
    ];

    #[test]
    fn test_unconscious_bleeding_is_high() {
        for sev in [Severity::Critical, Severity::Severe] {
            for cond in [VitalCondition::Bleeding, VitalCondition::Breathing] {
                assert_eq!(
                    classify_priority(sev, Consciousness::Unconscious, cond),
                    Priority::High
                );
            }
        }
    }

    #[test]
    fn test_moderate_rows_are_medium() {
        assert_eq!(
            classify_priority(Severity::Moderate, Consciousness::Awake, VitalCondition::Distressed),
            Priority::Medium
        );
        assert_eq!(
            classify_priority(Severity::Moderate, Consciousness::Awake, VitalCondition::Normal),
            Priority::Medium
        );
        assert_eq!(
            classify_priority(
                Severity::Moderate,
                Consciousness::Unconscious,
                VitalCondition::Breathing
            ),
            Priority::Medium
        );
    }

    #[test]
    fn test_light_rows() {
        assert_eq!(
            classify_priority(Severity::Light, Consciousness::Awake, VitalCondition::Distressed),
            Priority::Medium
        );
        assert_eq!(
            classify_priority(Severity::Light, Consciousness::Awake, VitalCondition::Normal),
            Priority::Low
        );
    }

    #[test]
    fn test_unlisted_combinations_fall_back() {
        // Awake critical victims are not in the table.
        assert_eq!(
            classify_priority(Severity::Critical, Consciousness::Awake, VitalCondition::Bleeding),
            FALLBACK_PRIORITY
        );
        assert_eq!(
            classify_priority(Severity::Light, Consciousness::Unconscious, VitalCondition::Normal),
            FALLBACK_PRIORITY
        );
    }

    #[test]
    fn test_only_one_low_combination() {
        let mut lows = 0;
        for s in ALL_SEVERITIES {
            for c in ALL_CONSCIOUSNESS {
                for v in ALL_CONDITIONS {
                    if classify_priority(s, c, v) == Priority::Low {
                        lows += 1;
                    }
                }
            }
        }
        assert_eq!(lows, 1);
    }

    #[test]
    fn test_severity_improves_once_per_call() {
        assert_eq!(Severity::Critical.improved(), Severity::Severe);
        assert_eq!(Severity::Severe.improved(), Severity::Moderate);
        assert_eq!(Severity::Moderate.improved(), Severity::Light);
        assert_eq!(Severity::Light.improved(), Severity::Light);
    }
}
