//! Mission log and end-of-mission report.
//!
//! The engine appends one robot entry per tick (the snapshot summary and the
//! command it drew), plus control center entries for alerts, commands and
//! photo confirmations. [`MissionReport`] bundles the log with the
//! mission's outcome and serializes to JSON.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use robosoco_logic::command::Command;
use robosoco_logic::control::VictimAlert;
use robosoco_logic::snapshot::{PhotoRecord, RobotStatus};

use crate::engine::TerminationReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Robot,
    ControlCenter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub tick: u64,
    pub source: LogSource,
    pub message: String,
    pub action: Option<Command>,
}

impl MissionLogEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        tick: u64,
        source: LogSource,
        message: String,
        action: Option<Command>,
    ) -> Self {
        Self {
            timestamp,
            tick,
            source,
            message,
            action,
        }
    }
}

/// Where the robot was at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub tick: u64,
    pub x: f64,
    pub y: f64,
}

/// Outcome of a mission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `None` while the mission is still running.
    pub termination: Option<TerminationReason>,
    pub packets_received: u64,
    pub final_position: f64,
    pub final_battery_pct: f64,
    pub final_status: RobotStatus,
    pub kits_used: u32,
    pub kits_remaining: u32,
    pub victims: Vec<VictimAlert>,
    pub photos: Vec<PhotoRecord>,
    pub log: Vec<MissionLogEntry>,
    pub path: Vec<PathPoint>,
}

impl MissionReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self, ReportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the report to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_json(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ReportError> {
        Self::read_json(BufReader::new(File::open(path)?))
    }
}

/// Errors that can occur writing or reading a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
