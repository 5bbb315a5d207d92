//! Threat assessment heuristic.
//!
//! Scores an in-flight missile against the interceptor network: how soon it
//! lands, how likely it is to land, and which site should engage it.

use std::cmp::Ordering;

use crate::geodesy;
use crate::models::{
    InterceptorSite, Missile, MissileClass, Priority, RecommendedInterceptor, ThreatAssessment,
};

/// Time-to-impact below which a high-probability threat is critical.
pub const CRITICAL_TTI_S: f64 = 300.0;
pub const HIGH_TTI_S: f64 = 600.0;
pub const MEDIUM_TTI_S: f64 = 1200.0;

const CRITICAL_PROBABILITY: f64 = 0.8;
const HIGH_PROBABILITY: f64 = 0.6;
const MAX_IMPACT_PROBABILITY: f64 = 0.95;
const MAX_THREAT_SCORE: u8 = 10;

/// Estimated probability that a missile of this class reaches its target.
///
/// Depends on class only; interceptor coverage does not lower it.
pub fn impact_probability(class: MissileClass) -> f64 {
    (0.7 + f64::from(class.base_threat()) / 20.0).min(MAX_IMPACT_PROBABILITY)
}

/// Priority tier, first match wins.
pub fn priority_for(time_to_impact_s: f64, impact_probability: f64) -> Priority {
    if time_to_impact_s < CRITICAL_TTI_S && impact_probability > CRITICAL_PROBABILITY {
        Priority::Critical
    } else if time_to_impact_s < HIGH_TTI_S && impact_probability > HIGH_PROBABILITY {
        Priority::High
    } else if time_to_impact_s < MEDIUM_TTI_S {
        Priority::Medium
    } else {
        Priority::Low
    }
}

pub fn threat_score(class: MissileClass, impact_probability: f64) -> u8 {
    let bonus = (impact_probability * 3.0).floor() as u8;
    class.base_threat().saturating_add(bonus).min(MAX_THREAT_SCORE)
}

/// Nearest eligible site whose engagement envelope covers the missile's current position.
pub fn select_interceptor(
    missile: &Missile,
    sites: &[InterceptorSite],
) -> Option<RecommendedInterceptor> {
    sites
        .iter()
        .filter(|site| site.is_eligible())
        .map(|site| (site, geodesy::distance(site.location, missile.current)))
        .filter(|(site, dist)| *dist < site.range_m())
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(site, dist)| RecommendedInterceptor {
            site_id: site.id.clone(),
            name: site.name.clone(),
            interceptor_type: site.interceptor_type,
            distance_m: dist,
        })
}

/// Assess one missile against the full interceptor network.
pub fn assess(missile: &Missile, sites: &[InterceptorSite]) -> ThreatAssessment {
    let remaining_m = geodesy::distance(missile.current, missile.target);
    let time_to_impact_s = remaining_m / missile.speed_mps;
    let probability = impact_probability(missile.class);

    ThreatAssessment {
        missile_id: missile.id.clone(),
        threat_score: threat_score(missile.class, probability),
        impact_probability: probability,
        time_to_impact_s,
        recommended_interceptor: select_interceptor(missile, sites),
        priority: priority_for(time_to_impact_s, probability),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::GeoPoint;
    use crate::models::{default_interceptor_sites, InterceptorType, MissileStatus, SiteStatus};
    use chrono::Utc;
    use std::collections::VecDeque;

    fn missile_at(class: MissileClass, current: GeoPoint, target: GeoPoint) -> Missile {
        Missile {
            id: "m-1".to_string(),
            name: "Test".to_string(),
            class,
            launch: current,
            target,
            launch_time: Utc::now(),
            speed_mps: class.cruise_speed_mps().unwrap_or(1_000.0),
            current,
            altitude_m: 0.0,
            status: MissileStatus::Active,
            history: VecDeque::new(),
        }
    }

    fn site(id: &str, location: GeoPoint, range_km: f64, ready: u32) -> InterceptorSite {
        InterceptorSite {
            id: id.to_string(),
            name: format!("Site {id}"),
            location,
            interceptor_type: InterceptorType::Patriot,
            range_km,
            ready_interceptors: ready,
            status: SiteStatus::Active,
        }
    }

    #[test]
    fn impact_probability_saturates_for_every_class() {
        // 0.7 + base/20 reaches the 0.95 cap for every base threat >= 5.
        for class in MissileClass::LAUNCHABLE {
            assert!((impact_probability(class) - 0.95).abs() < 1e-12, "{class}");
        }
        assert_eq!(impact_probability(MissileClass::Icbm), 0.95);
    }

    #[test]
    fn threat_score_is_capped_at_ten() {
        assert_eq!(threat_score(MissileClass::Icbm, 0.95), 10);
        // 5 + floor(0.95 * 3) = 7
        assert_eq!(threat_score(MissileClass::Srbm, impact_probability(MissileClass::Srbm)), 7);
        assert_eq!(threat_score(MissileClass::Unknown, 0.0), 5);
    }

    #[test]
    fn priority_tiers() {
        assert_eq!(priority_for(100.0, 0.95), Priority::Critical);
        assert_eq!(priority_for(100.0, 0.7), Priority::High);
        assert_eq!(priority_for(450.0, 0.95), Priority::High);
        assert_eq!(priority_for(100.0, 0.5), Priority::Medium);
        assert_eq!(priority_for(900.0, 0.95), Priority::Medium);
        assert_eq!(priority_for(1200.0, 0.95), Priority::Low);
    }

    #[test]
    fn priority_never_drops_as_impact_approaches() {
        for probability in [0.5, 0.65, 0.85, 0.95] {
            let mut previous = Priority::Low;
            let mut tti = 2_000.0;
            while tti >= 0.0 {
                let current = priority_for(tti, probability);
                assert!(current >= previous, "tti {tti} p {probability}");
                previous = current;
                tti -= 10.0;
            }
        }
    }

    #[test]
    fn nearest_eligible_site_in_range_is_recommended() {
        let origin = GeoPoint::new(35.0, 139.0);
        let m = missile_at(MissileClass::Irbm, origin, GeoPoint::new(34.0, -118.0));
        let sites = vec![
            site("far", GeoPoint::new(36.0, 139.0), 500.0, 4),
            site("near", GeoPoint::new(35.2, 139.0), 500.0, 4),
            site("out-of-range", GeoPoint::new(35.1, 139.0), 1.0, 4),
        ];
        let pick = select_interceptor(&m, &sites).expect("site in range");
        assert_eq!(pick.site_id, "near");
        assert_eq!(pick.to_string(), "Site near (Patriot)");
    }

    #[test]
    fn empty_site_is_never_recommended() {
        let origin = GeoPoint::new(35.0, 139.0);
        let m = missile_at(MissileClass::Irbm, origin, GeoPoint::new(34.0, -118.0));
        let sites = vec![
            site("empty", GeoPoint::new(35.0, 139.0), 500.0, 0),
            site("stocked", GeoPoint::new(36.0, 139.0), 500.0, 3),
        ];
        let assessment = assess(&m, &sites);
        let pick = assessment.recommended_interceptor.expect("stocked site");
        assert_eq!(pick.site_id, "stocked");

        let only_empty = vec![site("empty", origin, 500.0, 0)];
        let assessment = assess(&m, &only_empty);
        assert!(assessment.recommended_interceptor.is_none());
        assert_eq!(assessment.interceptor_label(), "None Available");
    }

    #[test]
    fn non_active_sites_are_skipped() {
        let origin = GeoPoint::new(35.0, 139.0);
        let m = missile_at(MissileClass::Irbm, origin, GeoPoint::new(34.0, -118.0));
        let mut maintenance = site("maintenance", origin, 500.0, 5);
        maintenance.status = SiteStatus::Maintenance;
        assert!(select_interceptor(&m, &[maintenance]).is_none());
    }

    #[test]
    fn assessment_near_target_is_critical() {
        let target = GeoPoint::new(37.5665, -122.4194);
        // 1 degree of latitude short of target: ~111 km, ~16 s for an ICBM.
        let m = missile_at(MissileClass::Icbm, GeoPoint::new(36.5665, -122.4194), target);
        let a = assess(&m, &default_interceptor_sites());
        assert_eq!(a.priority, Priority::Critical);
        assert_eq!(a.threat_score, 10);
        assert!(a.time_to_impact_s > 10.0 && a.time_to_impact_s < 20.0);
        assert!(a.recommended_interceptor.is_none());
    }
}
