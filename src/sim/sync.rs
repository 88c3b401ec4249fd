//! Physics to render copy, plus the cosmetic pulses.

use super::registry::BodyRegistry;
use crate::physics::PhysicsBackend;
use crate::scene::{RenderBackend, Transform};

/// Cosmetic values for one body at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pulse {
    pub light: f32,
    pub emissive: f32,
    pub scale: f32,
}

/// Copies physics transforms into the scene every tick.
///
/// Takes the physics backend by shared reference; it only reads.
pub struct RenderSync {
    light_intensity: f32,
}

impl RenderSync {
    pub fn new(light_intensity: f32) -> Self {
        Self { light_intensity }
    }

    /// Pulse values at `elapsed_ms` for a body with the given phase.
    ///
    /// The driver pulses faster and brighter than ambient bodies.
    pub fn pulse(&self, is_driver: bool, phase: f32, elapsed_ms: f64) -> Pulse {
        let t = elapsed_ms as f32;
        let (light, emissive) = if is_driver {
            let wave = (t * 0.004 + phase).sin();
            (self.light_intensity * 2.0 * (0.8 + 0.2 * wave), 0.6 + 0.3 * wave)
        } else {
            let wave = (t * 0.002 + phase).sin();
            let glow = (t * 0.0025 + phase * 1.7).sin();
            (self.light_intensity * (0.6 + 0.4 * wave), 0.15 + 0.1 * glow)
        };
        Pulse {
            light,
            emissive,
            scale: 1.0 + 0.02 * (t * 0.003 + phase).sin(),
        }
    }

    pub fn apply<P: PhysicsBackend, R: RenderBackend>(
        &self,
        registry: &BodyRegistry,
        physics: &P,
        render: &mut R,
        elapsed_ms: f64,
    ) {
        let driver = registry.driver_id();
        for body in registry.iter() {
            let (Some(position), Some(rotation)) =
                (physics.position(body.handle), physics.rotation(body.handle))
            else {
                continue;
            };
            let pulse = self.pulse(Some(body.id) == driver, body.phase, elapsed_ms);

            render.set_transform(
                body.node,
                Transform {
                    position,
                    rotation,
                    scale: pulse.scale,
                },
            );
            render.set_emissive(body.node, pulse.emissive);
            if let Some(light) = body.light {
                render.set_light(light, position, pulse.light);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BodyConfig;
    use crate::physics::SphereWorld;
    use crate::scene::Scene;
    use crate::sim::factory::{BodyFactory, BodyRole};
    use crate::spawn::SpawnRng;
    use glam::{Quat, Vec3};

    #[test]
    fn test_copies_transform_and_moves_light() {
        let factory = BodyFactory::new(BodyConfig::default());
        let mut world = SphereWorld::default();
        let mut scene = Scene::new(5.0, 14.0);
        let mut rng = SpawnRng::seeded(8);
        let mut registry = BodyRegistry::new();
        let parts = factory.build(BodyRole::Ambient { lit: true }, 0.4, Vec3::ZERO, &mut world, &mut scene, &mut rng);
        registry.insert(parts);

        let moved = Vec3::new(1.0, 2.0, -0.5);
        world.set_position(parts.handle, moved);
        RenderSync::new(1.2).apply(&registry, &world, &mut scene, 1234.0);

        let node = scene.sphere(parts.node).unwrap();
        assert_eq!(node.transform.position, moved);
        assert_eq!(node.transform.rotation, Quat::IDENTITY);
        assert!(node.material.emissive > 0.0);
        let light = scene.light(parts.light.unwrap()).unwrap();
        assert_eq!(light.position, moved);
    }

    #[test]
    fn test_pulse_ranges() {
        let sync = RenderSync::new(1.0);
        for step in 0..500 {
            let t = step as f64 * 37.0;
            let ambient = sync.pulse(false, 0.3, t);
            assert!((0.2..=1.0).contains(&ambient.light));
            assert!((0.05..=0.25).contains(&ambient.emissive));
            assert!((0.98..=1.02).contains(&ambient.scale));

            let driver = sync.pulse(true, 0.3, t);
            assert!((1.2..=2.0).contains(&driver.light));
            assert!(driver.emissive >= 0.3);
        }
    }

    #[test]
    fn test_removed_physics_body_is_skipped() {
        let factory = BodyFactory::new(BodyConfig::default());
        let mut world = SphereWorld::default();
        let mut scene = Scene::new(5.0, 14.0);
        let mut rng = SpawnRng::seeded(9);
        let mut registry = BodyRegistry::new();
        let parts = factory.build(BodyRole::Ambient { lit: false }, 0.4, Vec3::X, &mut world, &mut scene, &mut rng);
        registry.insert(parts);
        world.remove_body(parts.handle);

        RenderSync::new(1.0).apply(&registry, &world, &mut scene, 0.0);
        assert_eq!(scene.sphere(parts.node).unwrap().transform.position, Vec3::X);
    }
}
