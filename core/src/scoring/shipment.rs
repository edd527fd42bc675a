//! Shipment risk: ETA deviation 40%, weather 25%, route 20%, carrier 10%,
//! tracking gap 5%.

use super::{finish, Confidence, ScoreResult, Weighted};
use crate::{
    entity::{Shipment, WeatherRisk},
    org_config::ThresholdBand,
};
use chrono::{DateTime, Utc};

pub const ETA_DEVIATION: &str = "etaDeviationScore";
pub const WEATHER: &str = "weatherScore";
pub const ROUTE: &str = "routeScore";
pub const CARRIER: &str = "carrierScore";
pub const TRACKING_GAP: &str = "trackingGapScore";

const MAX_TRACKING_GAP_HOURS: f64 = 24.0;

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

pub fn weather_score(risk: WeatherRisk) -> f64 {
    match risk {
        WeatherRisk::Low => 0.0,
        WeatherRisk::Medium => 15.0,
        WeatherRisk::High => 30.0,
        WeatherRisk::Severe => 40.0,
    }
}

pub fn score_shipment(shipment: &Shipment, band: &ThresholdBand, now: DateTime<Utc>) -> ScoreResult {
    let mut confidence = Confidence::new();

    // Early or on-time shipments carry no deviation risk.
    let eta_deviation = match shipment.estimated_arrival {
        Some(eta) => {
            let hours_late = hours_between(eta, now);
            if hours_late > 0.0 {
                (hours_late * 2.0).min(50.0)
            } else {
                0.0
            }
        }
        None => {
            confidence.penalize(20, "Estimated arrival date not set");
            25.0
        }
    };

    let weather = match shipment.weather_risk {
        Some(risk) => weather_score(risk),
        None => {
            confidence.penalize(10, "Weather risk data unavailable, using medium default");
            weather_score(WeatherRisk::Medium)
        }
    };

    let route = match shipment.route_risk_index {
        Some(index) => (index * 0.25).clamp(0.0, 25.0),
        None => {
            confidence.penalize(10, "Route risk index unavailable");
            0.0
        }
    };

    let carrier = match shipment.carrier_reliability {
        Some(reliability) => ((100.0 - reliability) * 0.20).clamp(0.0, 20.0),
        None => {
            confidence.penalize(10, "Carrier reliability data unavailable");
            4.0
        }
    };

    let tracking_gap = match shipment.tracking_events.last() {
        Some(event) => hours_between(event.timestamp, now).clamp(0.0, MAX_TRACKING_GAP_HOURS),
        None => {
            confidence.penalize(15, "No tracking events recorded");
            MAX_TRACKING_GAP_HOURS
        }
    };

    finish(
        &[
            Weighted { name: ETA_DEVIATION, value: eta_deviation, weight: 0.40 },
            Weighted { name: WEATHER, value: weather, weight: 0.25 },
            Weighted { name: ROUTE, value: route, weight: 0.20 },
            Weighted { name: CARRIER, value: carrier, weight: 0.10 },
            Weighted { name: TRACKING_GAP, value: tracking_gap, weight: 0.05 },
        ],
        confidence,
        band,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::{ShipmentStatus, TrackingEvent},
        org_config::DEFAULT_BAND,
        types::RiskTier,
    };
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn shipment() -> Shipment {
        Shipment {
            id: "shp-1".into(),
            organization_id: "org-1".into(),
            shipment_number: "SHP-0001".into(),
            supplier_id: None,
            carrier: "Maersk".into(),
            status: ShipmentStatus::InTransit,
            estimated_arrival: Some(now() + Duration::days(2)),
            weather_risk: Some(WeatherRisk::Low),
            route_risk_index: Some(20.0),
            carrier_reliability: Some(90.0),
            tracking_events: vec![TrackingEvent {
                timestamp: now() - Duration::hours(2),
                location: "Rotterdam".into(),
                status: "departed".into(),
            }],
            version: 0,
        }
    }

    #[test]
    fn on_schedule_shipment_is_low_risk() {
        let result = score_shipment(&shipment(), &DEFAULT_BAND, now());
        // 0 + 0 + 5*0.20 + 2*0.10 + 2*0.05 = 1.3
        assert_eq!(result.overall_score, 1);
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.component(TRACKING_GAP), 2.0);
    }

    #[test]
    fn late_shipment_deviation_is_capped() {
        let mut s = shipment();
        s.estimated_arrival = Some(now() - Duration::hours(10));
        assert_eq!(score_shipment(&s, &DEFAULT_BAND, now()).component(ETA_DEVIATION), 20.0);

        s.estimated_arrival = Some(now() - Duration::days(5));
        assert_eq!(score_shipment(&s, &DEFAULT_BAND, now()).component(ETA_DEVIATION), 50.0);
    }

    #[test]
    fn missing_everything_uses_defaults() {
        let mut s = shipment();
        s.estimated_arrival = None;
        s.weather_risk = None;
        s.route_risk_index = None;
        s.carrier_reliability = None;
        s.tracking_events.clear();
        let result = score_shipment(&s, &DEFAULT_BAND, now());
        // 25*0.40 + 15*0.25 + 0 + 4*0.10 + 24*0.05 = 15.35
        assert_eq!(result.overall_score, 15);
        assert_eq!(result.confidence, 35);
        assert!(result.low_confidence);
        assert_eq!(result.component(WEATHER), 15.0);
        assert_eq!(result.component(CARRIER), 4.0);
        assert_eq!(result.component(TRACKING_GAP), 24.0);
        assert!(result.confidence_warning.unwrap().contains("No tracking events recorded"));
    }

    #[test]
    fn severe_conditions_stay_in_range() {
        let mut s = shipment();
        s.estimated_arrival = Some(now() - Duration::days(30));
        s.weather_risk = Some(WeatherRisk::Severe);
        s.route_risk_index = Some(400.0);
        s.carrier_reliability = Some(-100.0);
        s.tracking_events[0].timestamp = now() - Duration::days(10);
        let result = score_shipment(&s, &DEFAULT_BAND, now());
        // 50*0.40 + 40*0.25 + 25*0.20 + 20*0.10 + 24*0.05 = 38.2
        assert_eq!(result.overall_score, 38);
        assert_eq!(result.risk_tier, RiskTier::Medium);
        assert_eq!(result.component(WEATHER), 40.0);
    }
}
