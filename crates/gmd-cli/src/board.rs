//! Threat board: live missiles ranked by engagement priority.

use std::cmp::Ordering;

use gmd_core::models::{InterceptorSite, Missile, Priority, ThreatAssessment};
use gmd_core::threat::assess;

/// One line of the threat board.
#[derive(Debug, Clone)]
pub struct ThreatRow {
    pub missile_id: String,
    pub name: String,
    pub class: String,
    pub lat: f64,
    pub lon: f64,
    pub altitude_km: f64,
    pub assessment: ThreatAssessment,
}

impl ThreatRow {
    pub fn priority(&self) -> Priority {
        self.assessment.priority
    }

    /// Fixed-width line for terminal output.
    pub fn render(&self) -> String {
        format!(
            "{:<8} {:<18} {:<10} {:>8.3} {:>9.3} {:>7.1}km  score {:>2}  TTI {:>6.0}s  {}",
            format!("{:?}", self.assessment.priority).to_uppercase(),
            self.name,
            self.class,
            self.lat,
            self.lon,
            self.altitude_km,
            self.assessment.threat_score,
            self.assessment.time_to_impact_s,
            self.assessment.interceptor_label()
        )
    }
}

/// Assess every Active missile against `sites`, highest priority first and
/// soonest impact first within a priority.
pub fn threat_board(missiles: &[Missile], sites: &[InterceptorSite]) -> Vec<ThreatRow> {
    let mut rows: Vec<ThreatRow> = missiles
        .iter()
        .filter(|missile| missile.is_active())
        .map(|missile| ThreatRow {
            missile_id: missile.id.clone(),
            name: missile.name.clone(),
            class: missile.class.to_string(),
            lat: missile.current.lat,
            lon: missile.current.lon,
            altitude_km: missile.altitude_m / 1000.0,
            assessment: assess(missile, sites),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.priority().cmp(&a.priority()).then_with(|| {
            a.assessment
                .time_to_impact_s
                .partial_cmp(&b.assessment.time_to_impact_s)
                .unwrap_or(Ordering::Equal)
        })
    });
    rows
}
