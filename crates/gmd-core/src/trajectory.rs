//! Simplified ballistic trajectory model.
//!
//! Horizontal motion follows the great-circle arc between launch and target at
//! the class cruise speed. Altitude is a parabola that peaks at the class apogee
//! halfway through the flight, standing in for the boost/midcourse/reentry phases.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::geodesy::{self, GeoPoint};
use crate::models::{Missile, MissileClass};

/// Position and altitude of a missile at some point in its flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryState {
    pub point: GeoPoint,
    pub altitude_m: f64,
}

/// Parabolic altitude profile: 0 at both ends, the class apogee at `progress = 0.5`.
pub fn altitude_at(class: MissileClass, progress: f64) -> f64 {
    class.apogee_m() * 4.0 * progress * (1.0 - progress)
}

/// Position along the launch → target arc at the given flight progress.
pub fn advance(missile: &Missile, progress: f64) -> TrajectoryState {
    TrajectoryState {
        point: geodesy::interpolate(missile.launch, missile.target, progress),
        altitude_m: altitude_at(missile.class, progress),
    }
}

/// Total flight time in seconds: ground distance over cruise speed.
pub fn total_flight_time_s(missile: &Missile) -> Result<f64, CoreError> {
    if !(missile.speed_mps.is_finite() && missile.speed_mps > 0.0) {
        return Err(CoreError::computation(
            &missile.id,
            format!("invalid speed {} m/s", missile.speed_mps),
        ));
    }
    if !missile.launch.is_valid() || !missile.target.is_valid() {
        return Err(CoreError::computation(&missile.id, "launch or target point out of range"));
    }
    Ok(geodesy::distance(missile.launch, missile.target) / missile.speed_mps)
}

/// Seconds since launch, fractional.
pub fn elapsed_s(missile: &Missile, now: DateTime<Utc>) -> f64 {
    (now - missile.launch_time)
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| (now - missile.launch_time).num_seconds() as f64)
}

/// Instant at which the missile reaches its target.
pub fn arrival_time(missile: &Missile) -> Result<DateTime<Utc>, CoreError> {
    let flight_s = total_flight_time_s(missile)?;
    let micros = (flight_s * 1_000_000.0).round() as i64;
    Ok(missile.launch_time + chrono::Duration::microseconds(micros))
}

/// Flight progress at `now`. Values at or above 1.0 mean the missile has arrived.
pub fn progress_at(missile: &Missile, now: DateTime<Utc>) -> Result<f64, CoreError> {
    let total = total_flight_time_s(missile)?;
    let elapsed = elapsed_s(missile, now);
    if total <= 0.0 {
        return Ok(1.0);
    }
    Ok((elapsed / total).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MissileStatus, TrajectorySample};
    use std::collections::VecDeque;

    fn missile(class: MissileClass) -> Missile {
        let launch = GeoPoint::new(39.0458, 125.7625);
        Missile {
            id: "m-1".to_string(),
            name: "Test".to_string(),
            class,
            launch,
            target: GeoPoint::new(37.5665, -122.4194),
            launch_time: Utc::now(),
            speed_mps: class.cruise_speed_mps().unwrap_or(1_000.0),
            current: launch,
            altitude_m: 0.0,
            status: MissileStatus::Active,
            history: VecDeque::<TrajectorySample>::new(),
        }
    }

    #[test]
    fn advance_at_zero_is_launch_point_on_ground() {
        let m = missile(MissileClass::Icbm);
        let state = advance(&m, 0.0);
        assert!(geodesy::distance(state.point, m.launch) < 1e-3);
        assert_eq!(state.altitude_m, 0.0);
    }

    #[test]
    fn advance_at_one_is_target_point_on_ground() {
        let m = missile(MissileClass::Irbm);
        let state = advance(&m, 1.0);
        assert!(geodesy::distance(state.point, m.target) < 1e-3);
        assert_eq!(state.altitude_m, 0.0);
    }

    #[test]
    fn advance_at_half_reaches_apogee() {
        for class in MissileClass::LAUNCHABLE {
            let state = advance(&missile(class), 0.5);
            assert_eq!(state.altitude_m, class.apogee_m(), "{class}");
        }
        assert_eq!(altitude_at(MissileClass::Unknown, 0.5), 200_000.0);
    }

    #[test]
    fn flight_time_is_distance_over_speed() {
        let m = missile(MissileClass::Icbm);
        let expected = geodesy::distance(m.launch, m.target) / 7_000.0;
        assert_eq!(total_flight_time_s(&m).unwrap(), expected);
    }

    #[test]
    fn progress_tracks_elapsed_time() {
        let m = missile(MissileClass::Icbm);
        let total = total_flight_time_s(&m).unwrap();
        let half = m.launch_time + chrono::Duration::milliseconds((total * 500.0) as i64);
        let p = progress_at(&m, half).unwrap();
        assert!((p - 0.5).abs() < 1e-3, "got {p}");

        let late = arrival_time(&m).unwrap() + chrono::Duration::seconds(1);
        assert!(progress_at(&m, late).unwrap() >= 1.0);
    }

    #[test]
    fn zero_speed_is_a_computation_error() {
        let mut m = missile(MissileClass::Srbm);
        m.speed_mps = 0.0;
        assert!(matches!(total_flight_time_s(&m), Err(CoreError::Computation { .. })));
    }

    #[test]
    fn identical_endpoints_arrive_immediately() {
        let mut m = missile(MissileClass::Srbm);
        m.target = m.launch;
        assert_eq!(total_flight_time_s(&m).unwrap(), 0.0);
        assert_eq!(progress_at(&m, m.launch_time).unwrap(), 1.0);
    }
}
