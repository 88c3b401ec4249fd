//! Revival of bodies that have come to rest.
//!
//! Physics settling can leave bodies resting with negligible motion
//! indefinitely. No non-driver body stays near-stationary for longer than
//! the dwell threshold: once it does, it gets a kick biased toward the
//! center of the shell.

use super::registry::BodyRegistry;
use crate::config::LivenessConfig;
use crate::physics::PhysicsBackend;
use crate::spawn::SpawnRng;
use glam::Vec3;

/// Per-body low-velocity bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StationaryTracker {
    /// Time spent continuously near rest.
    pub stationary_ms: f64,
    /// Speed sampled on the previous tick.
    pub last_speed: f32,
}

pub struct Liveness {
    config: LivenessConfig,
}

impl Liveness {
    pub fn new(config: LivenessConfig) -> Self {
        Self { config }
    }

    /// Feed one speed sample. Returns `true` when the body is due a revival,
    /// in which case the tracker has already been reset.
    pub fn observe(&self, tracker: &mut StationaryTracker, speed: f32, delta_ms: f64) -> bool {
        let change = (speed - tracker.last_speed).abs();
        tracker.last_speed = speed;

        if speed < self.config.low_speed && change < self.config.change_epsilon {
            tracker.stationary_ms += delta_ms;
        } else {
            tracker.stationary_ms = 0.0;
        }

        if tracker.stationary_ms > self.config.dwell_ms {
            tracker.stationary_ms = 0.0;
            true
        } else {
            false
        }
    }

    /// Revival kick for a body at `position`: mostly toward the center,
    /// partly random, with a random magnitude.
    pub fn revival_impulse(&self, position: Vec3, rng: &mut SpawnRng) -> Vec3 {
        let random = rng.random_direction();
        let inward = -position.normalize_or_zero();
        let bias = self.config.center_bias;
        let blended = inward * bias + random * (1.0 - bias);
        let direction = if blended.length_squared() > 1e-8 {
            blended.normalize()
        } else {
            random
        };
        direction * rng.random_range(self.config.revival_min, self.config.revival_max)
    }

    /// Check every non-driver body and revive the ones that are due.
    ///
    /// Returns how many bodies were revived.
    pub fn apply<P: PhysicsBackend>(
        &self,
        registry: &mut BodyRegistry,
        physics: &mut P,
        delta_ms: f64,
        rng: &mut SpawnRng,
    ) -> usize {
        let driver = registry.driver_id();
        let mut revived = 0;

        for body in registry.iter_mut() {
            if Some(body.id) == driver {
                continue;
            }
            let (Some(position), Some(velocity)) =
                (physics.position(body.handle), physics.velocity(body.handle))
            else {
                continue;
            };

            if self.observe(&mut body.tracker, velocity.length(), delta_ms) {
                let impulse = self.revival_impulse(position, rng);
                physics.apply_impulse(body.handle, impulse, Vec3::ZERO);
                tracing::debug!(body = ?body.id, ?impulse, "revived stationary body");
                revived += 1;
            }
        }

        revived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn liveness() -> Liveness {
        Liveness::new(LivenessConfig::default())
    }

    #[test]
    fn test_accumulates_while_slow_and_steady() {
        let l = liveness();
        let mut t = StationaryTracker {
            stationary_ms: 0.0,
            last_speed: 0.1,
        };
        assert!(!l.observe(&mut t, 0.1, 500.0));
        assert!(!l.observe(&mut t, 0.12, 500.0));
        assert_eq!(t.stationary_ms, 1000.0);
        assert_eq!(t.last_speed, 0.12);
    }

    #[test]
    fn test_first_sample_from_rest_counts_as_change() {
        let l = liveness();
        let mut t = StationaryTracker::default();
        assert!(!l.observe(&mut t, 0.1, 500.0));
        assert_eq!(t.stationary_ms, 0.0);
        assert!(!l.observe(&mut t, 0.12, 500.0));
        assert_eq!(t.stationary_ms, 500.0);
    }

    #[test]
    fn test_resets_on_fast_or_changing_speed() {
        let l = liveness();
        let mut t = StationaryTracker::default();
        l.observe(&mut t, 0.1, 800.0);
        l.observe(&mut t, 0.5, 16.0);
        assert_eq!(t.stationary_ms, 0.0);

        l.observe(&mut t, 0.2, 800.0);
        // Speed is low but jumped by 0.3 since the last sample.
        assert_eq!(t.stationary_ms, 0.0);
    }

    #[test]
    fn test_one_revival_per_dwell_interval() {
        let l = liveness();
        let mut t = StationaryTracker::default();
        let mut revivals = Vec::new();
        // 6 seconds at 100 ms per sample, held at rest.
        for step in 1..=60 {
            if l.observe(&mut t, 0.0, 100.0) {
                revivals.push(step);
                assert_eq!(t.stationary_ms, 0.0);
            }
        }
        // Due once strictly more than 2000 ms has accumulated.
        assert_eq!(revivals, vec![21, 42]);
    }

    #[test]
    fn test_revival_points_mostly_inward() {
        let l = liveness();
        let mut rng = SpawnRng::seeded(11);
        let position = Vec3::new(3.0, 0.0, 0.0);
        for _ in 0..200 {
            let impulse = l.revival_impulse(position, &mut rng);
            let magnitude = impulse.length();
            assert!((8.0..14.0).contains(&magnitude), "magnitude {magnitude}");
            // 0.8 inward vs at most 0.2 random keeps the x component negative.
            assert!(impulse.x < 0.0);
        }
    }

    #[test]
    fn test_apply_revives_resting_ambient_body_but_not_driver() {
        use crate::config::BodyConfig;
        use crate::physics::SphereWorld;
        use crate::scene::Scene;
        use crate::sim::factory::{BodyFactory, BodyRole};

        let l = liveness();
        let factory = BodyFactory::new(BodyConfig::default());
        let mut world = SphereWorld::default();
        let mut scene = Scene::new(5.0, 14.0);
        let mut rng = SpawnRng::seeded(13);
        let mut registry = BodyRegistry::new();

        let driver = factory.build(BodyRole::Driver, 0.75, Vec3::ZERO, &mut world, &mut scene, &mut rng);
        registry.insert_driver(driver);
        let ambient = factory.build(
            BodyRole::Ambient { lit: false },
            0.3,
            Vec3::new(2.0, 0.0, 0.0),
            &mut world,
            &mut scene,
            &mut rng,
        );
        let ambient_id = registry.insert(ambient);

        let mut revivals = Vec::new();
        for step in 1..=300 {
            world.set_velocity(driver.handle, Vec3::ZERO);
            world.set_velocity(ambient.handle, Vec3::ZERO);
            let revived = l.apply(&mut registry, &mut world, 16.0, &mut rng);
            if revived > 0 {
                assert_eq!(revived, 1);
                // The kick reached the physics body and points inward.
                let velocity = world.velocity(ambient.handle).unwrap();
                assert!(velocity.x < 0.0, "velocity {velocity}");
                assert_eq!(world.velocity(driver.handle), Some(Vec3::ZERO));
                revivals.push(step);
            }
        }

        // 2000 ms dwell at 16 ms per tick: due on the 126th resting sample.
        assert_eq!(revivals, vec![126, 252]);
        let driver_body = registry.driver().unwrap();
        assert_eq!(driver_body.tracker, StationaryTracker::default());
        let ambient_body = registry.iter().find(|b| b.id == ambient_id).unwrap();
        assert_eq!(ambient_body.tracker.stationary_ms, 48.0 * 16.0);
    }

    #[test]
    fn test_revival_at_center_uses_random_direction() {
        let l = liveness();
        let mut rng = SpawnRng::seeded(12);
        let impulse = l.revival_impulse(Vec3::ZERO, &mut rng);
        assert!(impulse.length() >= 8.0);
    }
}
