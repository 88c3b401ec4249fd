//! Population turnover: periodic removal plus an animated spawn-in.

use super::easing::elastic_out;
use super::factory::{BodyFactory, BodyRole};
use super::registry::{BodyId, BodyParts, BodyRegistry};
use crate::config::RegenConfig;
use crate::physics::{BodyMode, PhysicsBackend};
use crate::scene::{RenderBackend, Transform};
use crate::spawn::SpawnRng;
use glam::Vec3;

/// A body still playing its scale-in animation.
///
/// It is kinematic and not yet in the registry, so none of the per-body
/// policies see it until it activates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawningBody {
    pub parts: BodyParts,
    pub started_ms: f64,
    pub position: Vec3,
}

/// The single spawn slot.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum PendingSpawn {
    #[default]
    Empty,
    Spawning(SpawningBody),
}

impl PendingSpawn {
    pub fn is_empty(&self) -> bool {
        matches!(self, PendingSpawn::Empty)
    }
}

/// What one regeneration cycle did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub removed: Option<BodyId>,
    pub spawn_started: bool,
}

pub struct Regenerator {
    config: RegenConfig,
    target_count: usize,
    last_cycle_ms: f64,
    pending: PendingSpawn,
}

impl Regenerator {
    pub fn new(config: RegenConfig, target_count: usize, now_ms: f64) -> Self {
        Self {
            config,
            target_count,
            last_cycle_ms: now_ms,
            pending: PendingSpawn::Empty,
        }
    }

    pub fn pending(&self) -> &PendingSpawn {
        &self.pending
    }

    pub fn last_cycle_ms(&self) -> f64 {
        self.last_cycle_ms
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms - self.last_cycle_ms >= self.config.cadence_ms
    }

    /// Run one cycle unconditionally.
    ///
    /// Removes one random non-driver body while more than half the target
    /// population is present, then starts a spawn if the slot is free.
    #[allow(clippy::too_many_arguments)]
    pub fn cycle<P: PhysicsBackend, R: RenderBackend>(
        &mut self,
        now_ms: f64,
        registry: &mut BodyRegistry,
        factory: &BodyFactory,
        physics: &mut P,
        render: &mut R,
        rng: &mut SpawnRng,
    ) -> CycleReport {
        self.last_cycle_ms = now_ms;
        let mut report = CycleReport::default();

        let ambient = registry.non_driver_count();
        if ambient * 2 > self.target_count {
            let victim = registry
                .nth_non_driver(rng.random_index(ambient))
                .and_then(|index| registry.remove_at(index));
            if let Some(body) = victim {
                BodyFactory::release(&body.parts(), physics, render);
                tracing::debug!(body = ?body.id, remaining = registry.len(), "regenerator removed body");
                report.removed = Some(body.id);
            }
        }

        if self.pending.is_empty() {
            let position = rng.random_direction() * self.config.spawn_distance;
            let radius = factory.ambient_radius(rng);
            let parts = factory.build(BodyRole::Arrival, radius, position, physics, render, rng);
            self.pending = PendingSpawn::Spawning(SpawningBody {
                parts,
                started_ms: now_ms,
                position,
            });
            tracing::debug!(?position, radius, "spawn started");
            report.spawn_started = true;
        }

        report
    }

    /// Advance the spawn-in animation, activating the body once it is over.
    ///
    /// Returns the id the body got in the registry when it activates.
    pub fn animate<P: PhysicsBackend, R: RenderBackend>(
        &mut self,
        now_ms: f64,
        registry: &mut BodyRegistry,
        physics: &mut P,
        render: &mut R,
        rng: &mut SpawnRng,
    ) -> Option<BodyId> {
        let PendingSpawn::Spawning(spawning) = self.pending else {
            return None;
        };
        let elapsed = now_ms - spawning.started_ms;
        let parts = spawning.parts;

        if elapsed > self.config.popup_ms || self.config.popup_ms <= 0.0 {
            render.set_transform(parts.node, Transform::at(spawning.position));
            physics.set_mode(parts.handle, BodyMode::Dynamic);
            physics.apply_impulse(
                parts.handle,
                rng.random_direction() * self.config.spawn_impulse,
                Vec3::ZERO,
            );
            let id = registry.insert(parts);
            self.pending = PendingSpawn::Empty;
            tracing::debug!(body = ?id, "spawned body activated");
            return Some(id);
        }

        let p = (elapsed / self.config.popup_ms) as f32;
        let scale = elastic_out(p) * self.config.popup_scale;
        render.set_transform(
            parts.node,
            Transform::at(spawning.position).with_scale(scale),
        );
        if let Some(light) = parts.light {
            let intensity = self.config.popup_light_peak * (0.5 + 0.5 * (elapsed as f32 * 0.015).sin());
            render.set_light(light, spawning.position, intensity);
        }
        None
    }

    /// Empty the slot, handing back whatever was spawning.
    pub fn take_pending(&mut self) -> Option<BodyParts> {
        match std::mem::take(&mut self.pending) {
            PendingSpawn::Spawning(spawning) => Some(spawning.parts),
            PendingSpawn::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BodyConfig;
    use crate::physics::SphereWorld;
    use crate::scene::Scene;

    struct Fixture {
        registry: BodyRegistry,
        factory: BodyFactory,
        world: SphereWorld,
        scene: Scene,
        rng: SpawnRng,
    }

    /// A driver plus `ambient` other bodies.
    fn fixture(ambient: usize) -> Fixture {
        let factory = BodyFactory::new(BodyConfig::default());
        let mut world = SphereWorld::default();
        let mut scene = Scene::new(5.0, 14.0);
        let mut rng = SpawnRng::seeded(21);
        let mut registry = BodyRegistry::new();

        let driver = factory.build(BodyRole::Driver, 0.75, Vec3::ZERO, &mut world, &mut scene, &mut rng);
        registry.insert_driver(driver);
        for i in 0..ambient {
            let at = Vec3::new(i as f32 * 0.2, 1.0, 0.0);
            let parts = factory.build(BodyRole::Ambient { lit: false }, 0.3, at, &mut world, &mut scene, &mut rng);
            registry.insert(parts);
        }

        Fixture {
            registry,
            factory,
            world,
            scene,
            rng,
        }
    }

    fn cycle(regen: &mut Regenerator, f: &mut Fixture, now: f64) -> CycleReport {
        regen.cycle(now, &mut f.registry, &f.factory, &mut f.world, &mut f.scene, &mut f.rng)
    }

    fn animate(regen: &mut Regenerator, f: &mut Fixture, now: f64) -> Option<BodyId> {
        regen.animate(now, &mut f.registry, &mut f.world, &mut f.scene, &mut f.rng)
    }

    #[test]
    fn test_cycle_removes_one_and_starts_one_spawn() {
        let mut f = fixture(10);
        let driver = f.registry.driver_id();
        let mut regen = Regenerator::new(RegenConfig::default(), 12, 0.0);

        let report = cycle(&mut regen, &mut f, 10_000.0);

        assert!(report.removed.is_some());
        assert!(report.spawn_started);
        assert_eq!(f.registry.len(), 10);
        assert_eq!(f.registry.driver_id(), driver);
        assert!(!regen.pending().is_empty());
        // Removed body is gone from both backends; the spawn is not yet registered.
        assert_eq!(f.world.body_count(), 11);
        assert_eq!(f.scene.sphere_count(), 11);
    }

    #[test]
    fn test_cycle_keeps_small_population() {
        let mut f = fixture(5);
        let mut regen = Regenerator::new(RegenConfig::default(), 12, 0.0);

        let report = cycle(&mut regen, &mut f, 10_000.0);

        assert_eq!(report.removed, None);
        assert_eq!(f.registry.len(), 6);
    }

    #[test]
    fn test_no_second_spawn_while_pending() {
        let mut f = fixture(10);
        let mut regen = Regenerator::new(RegenConfig::default(), 12, 0.0);

        assert!(cycle(&mut regen, &mut f, 10_000.0).spawn_started);
        let report = cycle(&mut regen, &mut f, 10_100.0);
        assert!(!report.spawn_started);
        // Removal does not wait on the spawn slot.
        assert!(report.removed.is_some());
        assert_eq!(f.registry.len(), 9);
    }

    #[test]
    fn test_zero_popup_activates_on_first_frame() {
        let mut f = fixture(3);
        let config = RegenConfig {
            popup_ms: 0.0,
            ..RegenConfig::default()
        };
        let mut regen = Regenerator::new(config, 12, 0.0);
        cycle(&mut regen, &mut f, 0.0);
        let PendingSpawn::Spawning(spawning) = *regen.pending() else {
            panic!("expected a pending spawn");
        };

        assert!(animate(&mut regen, &mut f, 0.0).is_some());
        let scale = f.scene.sphere(spawning.parts.node).unwrap().transform.scale;
        assert_eq!(scale, 1.0);
        assert!(regen.pending().is_empty());
    }

    #[test]
    fn test_spawn_scales_in_then_activates_once() {
        let mut f = fixture(3);
        let config = RegenConfig::default();
        let mut regen = Regenerator::new(config.clone(), 12, 0.0);
        cycle(&mut regen, &mut f, 0.0);

        let PendingSpawn::Spawning(spawning) = *regen.pending() else {
            panic!("expected a pending spawn");
        };
        let node = spawning.parts.node;
        assert_eq!(f.world.mode(spawning.parts.handle), Some(BodyMode::Kinematic));

        assert_eq!(animate(&mut regen, &mut f, 0.0), None);
        assert_eq!(f.scene.sphere(node).unwrap().transform.scale, 0.0);

        assert_eq!(animate(&mut regen, &mut f, config.popup_ms * 0.5), None);
        assert!(f.scene.sphere(node).unwrap().transform.scale > 0.5);

        // Exactly at the duration the animation is still running.
        assert_eq!(animate(&mut regen, &mut f, config.popup_ms), None);
        assert_eq!(f.scene.sphere(node).unwrap().transform.scale, 1.0);

        let id = animate(&mut regen, &mut f, config.popup_ms + 1.0).expect("activates");
        assert!(regen.pending().is_empty());
        assert_eq!(f.registry.len(), 5);
        assert_eq!(f.registry.get(4).map(|b| b.id), Some(id));
        assert_eq!(f.world.mode(spawning.parts.handle), Some(BodyMode::Dynamic));
        assert!(f.world.velocity(spawning.parts.handle).unwrap().length() > 0.0);

        assert_eq!(animate(&mut regen, &mut f, config.popup_ms + 100.0), None);
        assert_eq!(f.registry.len(), 5);
    }

    #[test]
    fn test_take_pending_empties_slot() {
        let mut f = fixture(1);
        let mut regen = Regenerator::new(RegenConfig::default(), 12, 0.0);
        cycle(&mut regen, &mut f, 0.0);

        assert!(regen.take_pending().is_some());
        assert!(regen.pending().is_empty());
        assert!(regen.take_pending().is_none());
    }

    #[test]
    fn test_due_on_cadence() {
        let regen = Regenerator::new(RegenConfig::default(), 12, 500.0);
        assert!(!regen.is_due(10_499.0));
        assert!(regen.is_due(10_500.0));
    }
}
