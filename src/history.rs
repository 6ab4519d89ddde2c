//! Synthesized sensor history.
//!
//! There is no recorder behind the tool server, so history is fabricated:
//! evenly spaced samples going back from `now`, jittered around fixed bases.

use chrono::{DateTime, TimeDelta, Utc};
use incunest_shared::config::HistoryConfig;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
}

/// Build `config.samples` samples covering `duration_secs`, newest first.
///
/// Sample `i` is stamped `now - i * duration_secs / samples`. Returns `None`
/// when the offsets cannot be represented, including a spacing below one
/// nanosecond, which would repeat timestamps.
pub fn synthesize_history<R: Rng>(
    duration_secs: f64,
    config: &HistoryConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<Vec<SensorSample>> {
    let samples = config.samples.max(1);
    let spacing = Duration::try_from_secs_f64(duration_secs / samples as f64).ok()?;
    if samples > 1 && spacing.is_zero() {
        return None;
    }
    let spacing = TimeDelta::from_std(spacing).ok()?;

    let mut history = Vec::with_capacity(samples);
    for i in 0..samples {
        let offset = spacing.checked_mul(i as i32)?;
        let timestamp = now.checked_sub_signed(offset)?;
        history.push(SensorSample {
            timestamp,
            temperature: config.base_temperature + rng.random::<f64>() * config.temperature_jitter,
            humidity: config.base_humidity + rng.random::<f64>() * config.humidity_jitter,
        });
    }
    Some(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_history_is_ten_decreasing_samples() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(42);
        let history = synthesize_history(3600.0, &HistoryConfig::default(), now, &mut rng).unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].timestamp, now);
        for pair in history.windows(2) {
            assert!(pair[0].timestamp > pair[1].timestamp);
            assert_eq!(pair[0].timestamp - pair[1].timestamp, TimeDelta::seconds(360));
        }
        assert_eq!(now - history[9].timestamp, TimeDelta::seconds(3240));
    }

    #[test]
    fn values_stay_within_jitter_band() {
        let mut rng = StdRng::seed_from_u64(7);
        let history =
            synthesize_history(60.0, &HistoryConfig::default(), Utc::now(), &mut rng).unwrap();
        for sample in &history {
            assert!((36.5..37.5).contains(&sample.temperature));
            assert!((65.0..70.0).contains(&sample.humidity));
        }
    }

    #[test]
    fn sample_count_follows_config() {
        let config = HistoryConfig {
            samples: 4,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let history = synthesize_history(40.0, &config, Utc::now(), &mut rng).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].timestamp - history[1].timestamp, TimeDelta::seconds(10));
    }

    #[test]
    fn unrepresentable_duration_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = HistoryConfig::default();
        assert!(synthesize_history(1e300, &config, Utc::now(), &mut rng).is_none());
        assert!(synthesize_history(-5.0, &config, Utc::now(), &mut rng).is_none());
    }

    #[test]
    fn sub_nanosecond_spacing_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = HistoryConfig::default();
        assert!(synthesize_history(1e-10, &config, Utc::now(), &mut rng).is_none());

        let history = synthesize_history(1e-7, &config, Utc::now(), &mut rng).unwrap();
        for pair in history.windows(2) {
            assert!(pair[0].timestamp > pair[1].timestamp);
        }
    }
}
