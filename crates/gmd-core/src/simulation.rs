//! Simulation engine: the entity registry plus the per-tick state machine.
//!
//! `Simulation` owns every tracked missile and the interceptor network. It is a
//! plain synchronous struct with an injected clock so callers decide how it is
//! shared and how often `tick` runs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::geodesy::GeoPoint;
use crate::models::{
    default_interceptor_sites, InterceptorSite, LaunchRequest, Missile, MissileStatus,
    MissileUpdate, Snapshot, TrajectorySample,
};
use crate::sink::BroadcastSink;
use crate::{threat, trajectory};

/// Result of an intercept command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterceptOutcome {
    pub missile_id: String,
    pub interceptor_site_id: String,
    /// Whether a ready interceptor was consumed at the named site
    pub interceptor_expended: bool,
    /// Ready interceptors left at the site, if the site exists
    pub remaining_interceptors: Option<u32>,
}

/// Everything that happened during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Batch handed to the sink (empty batches are not sent)
    pub batch: Vec<MissileUpdate>,
    /// Missiles that reached their target this tick, in their final state
    pub impacts: Vec<Missile>,
    /// Intercepted missiles dropped from the registry this tick
    pub expired: Vec<String>,
    /// Per-missile failures; the affected missiles were skipped
    pub faults: Vec<CoreError>,
}

/// Registry of missiles and interceptor sites.
pub struct Simulation {
    missiles: HashMap<String, Missile>,
    sites: Vec<InterceptorSite>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_sites(default_interceptor_sites())
    }
}

impl Simulation {
    /// Create a simulation with the given interceptor network and no missiles.
    pub fn with_sites(sites: Vec<InterceptorSite>) -> Self {
        Self {
            missiles: HashMap::new(),
            sites,
        }
    }

    /// Validate a launch command and register the new missile as Active.
    pub fn launch(&mut self, request: LaunchRequest, now: DateTime<Utc>) -> CoreResult<Missile> {
        let launch = required_point(request.launch_lat, request.launch_lon, "launch")?;
        let target = required_point(request.target_lat, request.target_lon, "target")?;

        let class = request
            .missile_type
            .ok_or_else(|| CoreError::InvalidInput("missile_type is required".to_string()))?;
        let speed_mps = class.cruise_speed_mps().ok_or_else(|| {
            CoreError::InvalidInput(format!("no flight profile for missile class {class}"))
        })?;

        let name = request
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Missile-{}", self.active_count() + 1));

        let missile = Missile {
            id: Uuid::new_v4().to_string(),
            name,
            class,
            launch,
            target,
            launch_time: now,
            speed_mps,
            current: launch,
            altitude_m: 0.0,
            status: MissileStatus::Active,
            history: Default::default(),
        };

        self.missiles.insert(missile.id.clone(), missile.clone());
        Ok(missile)
    }

    /// Mark an Active missile as intercepted and spend one interceptor from the
    /// named site if that site is eligible.
    ///
    /// Missiles that are unknown or already Intercepted/Impact yield `NotFound`
    /// and nothing changes.
    pub fn intercept(&mut self, missile_id: &str, site_id: &str) -> CoreResult<InterceptOutcome> {
        let missile = self
            .missiles
            .get_mut(missile_id)
            .filter(|m| m.is_active())
            .ok_or_else(|| CoreError::NotFound(format!("missile {missile_id}")))?;
        missile.status = MissileStatus::Intercepted;

        let site = self.sites.iter_mut().find(|s| s.id == site_id);
        let mut interceptor_expended = false;
        let remaining_interceptors = site.map(|site| {
            if site.is_eligible() {
                site.ready_interceptors -= 1;
                interceptor_expended = true;
            }
            site.ready_interceptors
        });

        Ok(InterceptOutcome {
            missile_id: missile_id.to_string(),
            interceptor_site_id: site_id.to_string(),
            interceptor_expended,
            remaining_interceptors,
        })
    }

    /// Point-in-time copy of every tracked missile and every site.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            missiles: self.missiles_by_launch(),
            interceptor_sites: self.sites.clone(),
        }
    }

    /// Advance every Active missile to `now`, retire arrivals, and push the
    /// resulting batch to `sink` when it is non-empty.
    pub fn tick(&mut self, now: DateTime<Utc>, sink: &dyn BroadcastSink) -> TickReport {
        let mut report = TickReport::default();
        let mut retired: Vec<String> = Vec::new();

        for (id, missile) in self.missiles.iter_mut() {
            match missile.status {
                MissileStatus::Active => match advance_missile(missile, now, &self.sites) {
                    Ok(Some(update)) => report.batch.push(update),
                    Ok(None) => {
                        report.impacts.push(missile.clone());
                        retired.push(id.clone());
                    }
                    Err(err) => report.faults.push(err),
                },
                MissileStatus::Intercepted => {
                    // Frozen wreckage stays visible until its would-be arrival time.
                    let expired = trajectory::arrival_time(missile)
                        .map(|arrival| arrival <= now)
                        .unwrap_or(true);
                    if expired {
                        report.expired.push(id.clone());
                        retired.push(id.clone());
                    }
                }
                MissileStatus::Impact => retired.push(id.clone()),
            }
        }

        for id in &retired {
            self.missiles.remove(id);
        }

        report
            .batch
            .sort_by(|a, b| {
                a.missile
                    .launch_time
                    .cmp(&b.missile.launch_time)
                    .then_with(|| a.missile.id.cmp(&b.missile.id))
            });

        if !report.batch.is_empty() {
            sink.send(&report.batch);
        }

        report
    }

    pub fn missile(&self, missile_id: &str) -> Option<&Missile> {
        self.missiles.get(missile_id)
    }

    /// Missiles currently tracked (Active and retained Intercepted), oldest launch first.
    pub fn missiles_by_launch(&self) -> Vec<Missile> {
        let mut missiles: Vec<Missile> = self.missiles.values().cloned().collect();
        missiles.sort_by(|a, b| a.launch_time.cmp(&b.launch_time).then_with(|| a.id.cmp(&b.id)));
        missiles
    }

    pub fn active_count(&self) -> usize {
        self.missiles.values().filter(|m| m.is_active()).count()
    }

    pub fn missile_count(&self) -> usize {
        self.missiles.len()
    }

    pub fn sites(&self) -> &[InterceptorSite] {
        &self.sites
    }

    pub fn site(&self, site_id: &str) -> Option<&InterceptorSite> {
        self.sites.iter().find(|s| s.id == site_id)
    }
}

fn required_point(lat: Option<f64>, lon: Option<f64>, which: &str) -> CoreResult<GeoPoint> {
    let lat = lat.ok_or_else(|| CoreError::InvalidInput(format!("{which}_lat is required")))?;
    let lon = lon.ok_or_else(|| CoreError::InvalidInput(format!("{which}_lon is required")))?;
    let point = GeoPoint::new(lat, lon);
    if !point.is_valid() {
        return Err(CoreError::InvalidInput(format!(
            "{which} point ({lat}, {lon}) is outside valid latitude/longitude ranges"
        )));
    }
    Ok(point)
}

/// Move one Active missile to `now`.
///
/// Returns `None` when the missile has arrived; it is then left in its final
/// Impact state for the caller to remove.
fn advance_missile(
    missile: &mut Missile,
    now: DateTime<Utc>,
    sites: &[InterceptorSite],
) -> CoreResult<Option<MissileUpdate>> {
    let total_s = trajectory::total_flight_time_s(missile)?;
    let elapsed_s = trajectory::elapsed_s(missile, now);

    if elapsed_s >= total_s {
        missile.status = MissileStatus::Impact;
        missile.current = missile.target;
        missile.altitude_m = 0.0;
        return Ok(None);
    }

    let progress = (elapsed_s / total_s).clamp(0.0, 1.0);
    let state = trajectory::advance(missile, progress);
    if !(state.point.lat.is_finite() && state.point.lon.is_finite() && state.altitude_m.is_finite()) {
        return Err(CoreError::computation(
            &missile.id,
            format!("non-finite trajectory state at progress {progress}"),
        ));
    }

    missile.current = state.point;
    missile.altitude_m = state.altitude_m;
    missile.record_sample(TrajectorySample {
        lat: state.point.lat,
        lon: state.point.lon,
        altitude_m: state.altitude_m,
        timestamp: now,
    });

    let threat_assessment = threat::assess(missile, sites);
    Ok(Some(MissileUpdate {
        missile: missile.clone(),
        threat_assessment,
    }))
}
