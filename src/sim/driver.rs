//! Periodic kicks that keep the driver body moving.

use crate::config::DriverConfig;
use crate::spawn::SpawnRng;
use glam::Vec3;

/// One scheduled kick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriverKick {
    pub impulse: Vec3,
    /// Body-local application point; off-center so the kick adds spin.
    pub offset: Vec3,
}

/// Fires a randomized impulse whenever the current interval has elapsed.
///
/// The first interval is exactly `interval_ms`; each kick then draws the
/// next one from `[interval_ms, interval_ms + jitter_ms)`. The driver
/// therefore never idles longer than one jittered interval.
#[derive(Debug)]
pub struct DriverScheduler {
    config: DriverConfig,
    last_kick_ms: f64,
    interval_ms: f64,
}

impl DriverScheduler {
    pub fn new(config: DriverConfig, now_ms: f64) -> Self {
        let interval_ms = config.interval_ms;
        Self {
            config,
            last_kick_ms: now_ms,
            interval_ms,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn last_kick_ms(&self) -> f64 {
        self.last_kick_ms
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms - self.last_kick_ms > self.interval_ms
    }

    /// Produce a kick if one is due, recording it and resampling the interval.
    ///
    /// `driver_radius` scales the off-center application point.
    pub fn poll(&mut self, now_ms: f64, driver_radius: f32, rng: &mut SpawnRng) -> Option<DriverKick> {
        if !self.is_due(now_ms) {
            return None;
        }

        let impulse = rng.random_direction() * self.config.impulse;
        let reach = self.config.offset * driver_radius;
        let offset = Vec3::new(
            rng.random_range(-reach, reach),
            rng.random_range(-reach, reach),
            rng.random_range(-reach, reach),
        );

        self.last_kick_ms = now_ms;
        self.interval_ms = self.config.interval_ms
            + rng.random_range_f64(0.0, self.config.jitter_ms);

        Some(DriverKick { impulse, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_due_before_interval() {
        let mut rng = SpawnRng::seeded(1);
        let mut s = DriverScheduler::new(DriverConfig::default(), 0.0);
        assert!(s.poll(2999.0, 0.75, &mut rng).is_none());
        assert!(s.poll(3000.0, 0.75, &mut rng).is_none());
        assert!(s.poll(3000.5, 0.75, &mut rng).is_some());
    }

    #[test]
    fn test_kick_shape() {
        let config = DriverConfig::default();
        let mut rng = SpawnRng::seeded(2);
        let mut s = DriverScheduler::new(config.clone(), 0.0);
        let kick = s.poll(3500.0, 1.0, &mut rng).unwrap();

        assert!((kick.impulse.length() - config.impulse).abs() < 1e-3);
        assert!(kick.offset.abs().max_element() <= config.offset);
        assert_eq!(s.last_kick_ms(), 3500.0);
    }

    #[test]
    fn test_interval_resampled_within_jitter() {
        let mut rng = SpawnRng::seeded(3);
        let mut s = DriverScheduler::new(DriverConfig::default(), 0.0);
        let mut now = 0.0;
        let mut kicks = 0;
        while kicks < 50 {
            now += 16.0;
            if s.poll(now, 0.75, &mut rng).is_some() {
                kicks += 1;
                assert!((3000.0..5000.0).contains(&s.interval_ms()));
            }
        }
    }

    #[test]
    fn test_zero_jitter_gives_fixed_interval() {
        let config = DriverConfig {
            jitter_ms: 0.0,
            ..DriverConfig::default()
        };
        let mut rng = SpawnRng::seeded(4);
        let mut s = DriverScheduler::new(config, 100.0);
        s.poll(3200.0, 0.75, &mut rng).unwrap();
        assert_eq!(s.interval_ms(), 3000.0);
    }
}
