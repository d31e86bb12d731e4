//! Command vocabulary sent from the control center to the robot.
//!
//! The set is closed. Commands arriving as text (operator console, replayed
//! logs) go through [`Command::from_str`]; anything outside the vocabulary is
//! a [`CommandParseError`] and the robot ignores it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Record a thermal photo at the current position.
    TakePhoto,
    /// Leave `Awaiting` and keep driving forward.
    ResumeExploration,
    /// Turn around and drive back to position 0.
    ReturnToBase,
    /// Stop and wait.
    HoldPosition,
    /// Drop one first-aid kit next to the victim.
    DeployKit,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::TakePhoto,
        Command::ResumeExploration,
        Command::ReturnToBase,
        Command::HoldPosition,
        Command::DeployKit,
    ];

    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TakePhoto => "TAKE_PHOTO",
            Self::ResumeExploration => "RESUME_EXPLORATION",
            Self::ReturnToBase => "RETURN_TO_BASE",
            Self::HoldPosition => "HOLD_POSITION",
            Self::DeployKit => "DEPLOY_KIT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command: {0:?}")]
pub struct CommandParseError(pub String);

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CommandParseError(s.to_string()))
    }
}
