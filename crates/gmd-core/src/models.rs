//! Core data models for the missile defense simulation.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geodesy::GeoPoint;

/// Maximum number of trajectory samples kept per missile.
pub const HISTORY_CAPACITY: usize = 100;

/// Apogee used for classes without a profile entry.
pub const DEFAULT_APOGEE_M: f64 = 200_000.0;
/// Base threat used for classes without a profile entry.
pub const DEFAULT_BASE_THREAT: u8 = 5;

/// Ballistic missile class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissileClass {
    #[serde(rename = "ICBM")]
    Icbm,
    #[serde(rename = "IRBM")]
    Irbm,
    #[serde(rename = "SRBM")]
    Srbm,
    Hypersonic,
    /// Any class name the simulator has no flight profile for.
    #[serde(other)]
    Unknown,
}

impl MissileClass {
    /// Classes that can actually be launched.
    pub const LAUNCHABLE: [MissileClass; 4] = [
        MissileClass::Icbm,
        MissileClass::Irbm,
        MissileClass::Srbm,
        MissileClass::Hypersonic,
    ];

    /// Uniformly random launchable class, used when a launch names none.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::LAUNCHABLE[rng.random_range(0..Self::LAUNCHABLE.len())]
    }

    /// Cruise speed in m/s, `None` for classes without a flight profile.
    pub fn cruise_speed_mps(self) -> Option<f64> {
        match self {
            MissileClass::Icbm => Some(7_000.0),
            MissileClass::Irbm => Some(3_000.0),
            MissileClass::Srbm => Some(1_500.0),
            MissileClass::Hypersonic => Some(6_000.0),
            MissileClass::Unknown => None,
        }
    }

    /// Peak altitude of the simplified parabolic trajectory.
    pub fn apogee_m(self) -> f64 {
        match self {
            MissileClass::Icbm => 1_200_000.0,
            MissileClass::Irbm => 400_000.0,
            MissileClass::Srbm => 150_000.0,
            MissileClass::Hypersonic => 60_000.0,
            MissileClass::Unknown => DEFAULT_APOGEE_M,
        }
    }

    pub fn base_threat(self) -> u8 {
        match self {
            MissileClass::Icbm => 10,
            MissileClass::Irbm => 7,
            MissileClass::Srbm => 5,
            MissileClass::Hypersonic => 9,
            MissileClass::Unknown => DEFAULT_BASE_THREAT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MissileClass::Icbm => "ICBM",
            MissileClass::Irbm => "IRBM",
            MissileClass::Srbm => "SRBM",
            MissileClass::Hypersonic => "Hypersonic",
            MissileClass::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MissileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissileStatus {
    /// In flight and advanced every tick
    #[default]
    Active,
    /// Destroyed by an interceptor; frozen at its last position
    Intercepted,
    /// Reached its target
    Impact,
}

impl MissileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MissileStatus::Active => "Active",
            MissileStatus::Intercepted => "Intercepted",
            MissileStatus::Impact => "Impact",
        }
    }
}

/// One recorded position along a missile's flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub lat: f64,
    pub lon: f64,
    #[serde(alias = "alt")]
    pub altitude_m: f64,
    #[serde(alias = "time")]
    pub timestamp: DateTime<Utc>,
}

/// A missile tracked by the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Missile {
    pub id: String,
    pub name: String,
    #[serde(rename = "missile_type")]
    pub class: MissileClass,
    pub launch: GeoPoint,
    pub target: GeoPoint,
    pub launch_time: DateTime<Utc>,
    pub speed_mps: f64,
    pub current: GeoPoint,
    pub altitude_m: f64,
    pub status: MissileStatus,
    /// Most recent samples, oldest first
    #[serde(rename = "trajectory_points")]
    pub history: VecDeque<TrajectorySample>,
}

impl Missile {
    /// Append a sample, discarding the oldest once the history is full.
    pub fn record_sample(&mut self, sample: TrajectorySample) {
        while self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(sample);
    }

    pub fn is_active(&self) -> bool {
        self.status == MissileStatus::Active
    }
}

/// Launch command parameters. Coordinates are optional so that the engine can
/// report which one is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub missile_type: Option<MissileClass>,
    pub launch_lat: Option<f64>,
    pub launch_lon: Option<f64>,
    pub target_lat: Option<f64>,
    pub target_lon: Option<f64>,
}

impl LaunchRequest {
    pub fn new(name: impl Into<String>, class: MissileClass, launch: GeoPoint, target: GeoPoint) -> Self {
        Self {
            name: Some(name.into()),
            missile_type: Some(class),
            launch_lat: Some(launch.lat),
            launch_lon: Some(launch.lon),
            target_lat: Some(target.lat),
            target_lon: Some(target.lon),
        }
    }
}

// ========== INTERCEPTOR SITES ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterceptorType {
    Patriot,
    #[serde(rename = "THAAD")]
    Thaad,
    Aegis,
}

impl fmt::Display for InterceptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InterceptorType::Patriot => "Patriot",
            InterceptorType::Thaad => "THAAD",
            InterceptorType::Aegis => "Aegis",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiteStatus {
    #[default]
    Active,
    Maintenance,
    Offline,
}

/// A ground or sea based interceptor battery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorSite {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    pub interceptor_type: InterceptorType,
    pub range_km: f64,
    pub ready_interceptors: u32,
    pub status: SiteStatus,
}

impl InterceptorSite {
    /// Site can be assigned to an engagement.
    pub fn is_eligible(&self) -> bool {
        self.status == SiteStatus::Active && self.ready_interceptors > 0
    }

    pub fn range_m(&self) -> f64 {
        self.range_km * 1000.0
    }
}

/// The fixed set of interceptor sites seeded at startup.
pub fn default_interceptor_sites() -> Vec<InterceptorSite> {
    let site = |id: &str,
                name: &str,
                lat: f64,
                lon: f64,
                interceptor_type: InterceptorType,
                range_km: f64,
                ready: u32| InterceptorSite {
        id: id.to_string(),
        name: name.to_string(),
        location: GeoPoint::new(lat, lon),
        interceptor_type,
        range_km,
        ready_interceptors: ready,
        status: SiteStatus::Active,
    };

    vec![
        site("norfolk", "Norfolk Naval Base", 36.9467, -76.3284, InterceptorType::Aegis, 500.0, 12),
        site("ramstein", "Ramstein Air Base", 49.4369, 7.6003, InterceptorType::Patriot, 160.0, 8),
        site("yokosuka", "Yokosuka Naval Base", 35.2928, 139.6675, InterceptorType::Aegis, 500.0, 10),
        site("guam", "Guam Defense Site", 13.4443, 144.7937, InterceptorType::Thaad, 200.0, 6),
        site("fort-sill", "Fort Sill", 34.6515, -98.4020, InterceptorType::Patriot, 160.0, 15),
    ]
}

// ========== THREAT ASSESSMENT ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Interceptor site chosen for an engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedInterceptor {
    pub site_id: String,
    pub name: String,
    pub interceptor_type: InterceptorType,
    pub distance_m: f64,
}

impl fmt::Display for RecommendedInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.interceptor_type)
    }
}

/// Derived threat view of one missile at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub missile_id: String,
    pub threat_score: u8,
    pub impact_probability: f64,
    pub time_to_impact_s: f64,
    pub recommended_interceptor: Option<RecommendedInterceptor>,
    #[serde(rename = "priority_level")]
    pub priority: Priority,
}

impl ThreatAssessment {
    /// Human readable interceptor recommendation.
    pub fn interceptor_label(&self) -> String {
        self.recommended_interceptor
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "None Available".to_string())
    }
}

/// One entry of a tick's output batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissileUpdate {
    pub missile: Missile,
    pub threat_assessment: ThreatAssessment,
}

/// Point-in-time view for newly connecting observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub missiles: Vec<Missile>,
    pub interceptor_sites: Vec<InterceptorSite>,
}
