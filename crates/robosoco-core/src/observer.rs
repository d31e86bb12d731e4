//! Presentation seam - read-only consumers of committed ticks.
//!
//! The mission loop is the only writer. Observers get each [`TickReport`]
//! after the tick is committed and the final [`MissionReport`] once the
//! mission ends. [`MissionMonitor`] keeps the latest tick behind a lock so
//! a reader on another thread can poll it.

use std::sync::Arc;

use parking_lot::RwLock;

use robosoco_logic::control::DecisionNote;

use crate::engine::{TerminationReason, TickReport};
use crate::report::MissionReport;

pub trait MissionObserver {
    fn on_tick(&mut self, report: &TickReport);

    fn on_finish(&mut self, _report: &MissionReport) {}
}

impl<A: MissionObserver, B: MissionObserver> MissionObserver for (A, B) {
    fn on_tick(&mut self, report: &TickReport) {
        self.0.on_tick(report);
        self.1.on_tick(report);
    }

    fn on_finish(&mut self, report: &MissionReport) {
        self.0.on_finish(report);
        self.1.on_finish(report);
    }
}

/// Console feed through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl MissionObserver for LogObserver {
    fn on_tick(&mut self, report: &TickReport) {
        let snap = &report.snapshot;
        log::debug!(
            "[tick {}] x={}m battery={:.1}% status={} temp={:.1}°C co2={} risk={}",
            snap.tick,
            snap.pos_x,
            snap.battery_pct,
            snap.robot_status,
            snap.sensors.temperature,
            snap.sensors.co2_ppm,
            snap.sensors.structural_risk
        );
        if let Some(command) = report.decision.command {
            log::info!(
                "[tick {}] {} -> {} ({})",
                snap.tick,
                snap.robot_status,
                command,
                report.decision.note
            );
        } else if let DecisionNote::VictimAlert(alert) = &report.decision.note {
            log::info!("[tick {}] registered without action: {}", snap.tick, alert);
        }
    }

    fn on_finish(&mut self, report: &MissionReport) {
        log::info!(
            "[mission] {} packets, {} victims, {} photos, {} kits used",
            report.packets_received,
            report.victims.len(),
            report.photos.len(),
            report.kits_used
        );
    }
}

/// Latest committed state, shareable across threads.
#[derive(Debug, Clone, Default)]
pub struct MissionMonitor {
    latest: Arc<RwLock<Option<TickReport>>>,
    termination: Arc<RwLock<Option<TerminationReason>>>,
}

impl MissionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<TickReport> {
        self.latest.read().clone()
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        *self.termination.read()
    }

    pub fn is_finished(&self) -> bool {
        self.termination.read().is_some()
    }
}

impl MissionObserver for MissionMonitor {
    fn on_tick(&mut self, report: &TickReport) {
        *self.latest.write() = Some(report.clone());
    }

    fn on_finish(&mut self, report: &MissionReport) {
        *self.termination.write() = report.termination;
    }
}
