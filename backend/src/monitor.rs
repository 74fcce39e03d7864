use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use shared::{SensorReading, SensorSnapshot, SensorStatus, ServiceCounters, StatusSnapshot};

pub const TICK_INTERVAL: Duration = Duration::from_secs(2);

/// Simulated greenhouse telemetry plus service counters. There is no real
/// sensor integration; readings start from fixed baselines and drift by a
/// bounded random walk on each tick. The RNG is injected so the walk is
/// testable without wall-clock or global state.
#[derive(Debug, Clone)]
pub struct MonitorState {
    temperature: f64,
    humidity: f64,
    light_level: f64,
    soil_moisture: f64,
    air_quality: f64,
    total_requests: u64,
    analyses_completed: u64,
    failed_analyses: u64,
    confidence_sum: u64,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            temperature: 22.0,
            humidity: 65.0,
            light_level: 75.0,
            soil_moisture: 45.0,
            air_quality: 85.0,
            total_requests: 0,
            analyses_completed: 0,
            failed_analyses: 0,
            confidence_sum: 0,
        }
    }

    /// Advances each simulated reading one step. Step sizes and clamp ranges
    /// follow the original monitoring view.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.temperature += rng.random_range(-1.0..=1.0);
        self.humidity = (self.humidity + rng.random_range(-2.5..=2.5)).clamp(30.0, 90.0);
        self.light_level = (self.light_level + rng.random_range(-5.0..=5.0)).clamp(0.0, 100.0);
        self.soil_moisture = (self.soil_moisture + rng.random_range(-1.5..=1.5)).clamp(0.0, 100.0);
        self.air_quality = (self.air_quality + rng.random_range(-1.0..=1.0)).clamp(0.0, 100.0);
    }

    pub fn record_request(&mut self) {
        self.total_requests += 1;
    }

    pub fn record_analysis(&mut self, confidence_percent: u8) {
        self.analyses_completed += 1;
        self.confidence_sum += u64::from(confidence_percent);
    }

    pub fn record_failure(&mut self) {
        self.failed_analyses += 1;
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> StatusSnapshot {
        let average_confidence = if self.analyses_completed > 0 {
            self.confidence_sum as f64 / self.analyses_completed as f64
        } else {
            0.0
        };

        StatusSnapshot {
            sensors: SensorSnapshot {
                temperature: SensorReading {
                    value: self.temperature,
                    status: temperature_status(self.temperature),
                },
                humidity: SensorReading {
                    value: self.humidity,
                    status: humidity_status(self.humidity),
                },
                light_level: SensorReading {
                    value: self.light_level,
                    status: SensorStatus::Optimal,
                },
                soil_moisture: SensorReading {
                    value: self.soil_moisture,
                    status: soil_moisture_status(self.soil_moisture),
                },
                air_quality: SensorReading {
                    value: self.air_quality,
                    status: SensorStatus::Optimal,
                },
            },
            service: ServiceCounters {
                total_requests: self.total_requests,
                analyses_completed: self.analyses_completed,
                failed_analyses: self.failed_analyses,
                average_confidence,
            },
            generated_at: now,
        }
    }
}

fn temperature_status(celsius: f64) -> SensorStatus {
    if (18.0..=26.0).contains(&celsius) {
        SensorStatus::Optimal
    } else {
        SensorStatus::Warning
    }
}

fn humidity_status(percent: f64) -> SensorStatus {
    if (40.0..=80.0).contains(&percent) {
        SensorStatus::Optimal
    } else {
        SensorStatus::Warning
    }
}

fn soil_moisture_status(percent: f64) -> SensorStatus {
    if percent < 30.0 {
        SensorStatus::Critical
    } else if percent < 50.0 {
        SensorStatus::Warning
    } else {
        SensorStatus::Optimal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn walk_stays_within_clamped_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = MonitorState::new();
        for _ in 0..1000 {
            state.tick(&mut rng);
            let snapshot = state.snapshot(Utc::now());
            let sensors = snapshot.sensors;
            assert!((30.0..=90.0).contains(&sensors.humidity.value));
            assert!((0.0..=100.0).contains(&sensors.light_level.value));
            assert!((0.0..=100.0).contains(&sensors.soil_moisture.value));
            assert!((0.0..=100.0).contains(&sensors.air_quality.value));
        }
    }

    #[test]
    fn seeded_walks_are_reproducible() {
        let mut a = MonitorState::new();
        let mut b = MonitorState::new();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            a.tick(&mut rng_a);
            b.tick(&mut rng_b);
        }
        let now = Utc::now();
        let snap_a = a.snapshot(now);
        let snap_b = b.snapshot(now);
        assert_eq!(snap_a.sensors.temperature.value, snap_b.sensors.temperature.value);
        assert_eq!(snap_a.sensors.humidity.value, snap_b.sensors.humidity.value);
    }

    #[test]
    fn counters_track_requests_and_confidence() {
        let mut state = MonitorState::new();
        state.record_request();
        state.record_request();
        state.record_analysis(80);
        state.record_analysis(60);
        state.record_failure();

        let service = state.snapshot(Utc::now()).service;
        assert_eq!(service.total_requests, 2);
        assert_eq!(service.analyses_completed, 2);
        assert_eq!(service.failed_analyses, 1);
        assert!((service.average_confidence - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn average_confidence_is_zero_before_any_analysis() {
        let service = MonitorState::new().snapshot(Utc::now()).service;
        assert_eq!(service.average_confidence, 0.0);
    }

    #[test]
    fn sensor_grading_follows_thresholds() {
        assert_eq!(temperature_status(22.0), SensorStatus::Optimal);
        assert_eq!(temperature_status(17.0), SensorStatus::Warning);
        assert_eq!(humidity_status(39.0), SensorStatus::Warning);
        assert_eq!(soil_moisture_status(25.0), SensorStatus::Critical);
        assert_eq!(soil_moisture_status(45.0), SensorStatus::Warning);
        assert_eq!(soil_moisture_status(60.0), SensorStatus::Optimal);
    }

    #[test]
    fn baseline_readings_grade_as_expected() {
        let snapshot = MonitorState::new().snapshot(Utc::now());
        assert_eq!(snapshot.sensors.temperature.status, SensorStatus::Optimal);
        assert_eq!(snapshot.sensors.humidity.status, SensorStatus::Optimal);
        // 45% soil moisture sits in the warning band.
        assert_eq!(snapshot.sensors.soil_moisture.status, SensorStatus::Warning);
    }
}
