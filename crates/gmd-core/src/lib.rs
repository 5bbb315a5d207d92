pub mod error;
pub mod geodesy;
pub mod models;
pub mod simulation;
pub mod sink;
pub mod threat;
pub mod trajectory;

pub use error::{CoreError, CoreResult};
pub use geodesy::{bearing, distance, interpolate, GeoPoint, EARTH_RADIUS_M};
pub use models::{
    default_interceptor_sites, InterceptorSite, InterceptorType, LaunchRequest, Missile,
    MissileClass, MissileStatus, MissileUpdate, Priority, RecommendedInterceptor, SiteStatus,
    Snapshot, ThreatAssessment, TrajectorySample, HISTORY_CAPACITY,
};
pub use simulation::{InterceptOutcome, Simulation, TickReport};
pub use sink::{BroadcastSink, NullSink, RecordingSink};
pub use threat::assess;
pub use trajectory::{advance, TrajectoryState};
