//! Creation and release of the physics + render pair behind each body.

use super::registry::BodyParts;
use crate::config::BodyConfig;
use crate::physics::{BodyDesc, BodyMode, PhysicsBackend};
use crate::scene::{PointLight, RenderBackend, SphereMaterial, Transform};
use crate::spawn::{hsv_to_rgb, SpawnRng};
use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Hue of the driver, a warm amber that reads apart from the random palette.
const DRIVER_HUE: f32 = 0.08;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyRole {
    Driver,
    /// Part of the initial population; `lit` bodies carry a point light.
    Ambient { lit: bool },
    /// Regenerated body; starts at zero scale and always carries a light.
    Arrival,
}

/// Builds bodies from the population settings.
pub struct BodyFactory {
    config: BodyConfig,
}

impl BodyFactory {
    pub fn new(config: BodyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BodyConfig {
        &self.config
    }

    /// Radius of an ambient body drawn from the configured range.
    pub fn ambient_radius(&self, rng: &mut SpawnRng) -> f32 {
        rng.random_range(self.config.radius_min, self.config.radius_max)
    }

    /// Mass of an ambient body with the configured density.
    pub fn ambient_mass(&self, radius: f32) -> f32 {
        self.config.density * (4.0 / 3.0) * PI * radius.powi(3)
    }

    /// Create the physics body, mesh node and optional light for one body.
    pub fn build<P: PhysicsBackend, R: RenderBackend>(
        &self,
        role: BodyRole,
        radius: f32,
        position: Vec3,
        physics: &mut P,
        render: &mut R,
        rng: &mut SpawnRng,
    ) -> BodyParts {
        let c = &self.config;
        let (mass, color, lit, mode, scale) = match role {
            BodyRole::Driver => (
                c.driver_mass,
                hsv_to_rgb(DRIVER_HUE, 0.85, 1.0),
                true,
                BodyMode::Dynamic,
                1.0,
            ),
            BodyRole::Ambient { lit } => (
                self.ambient_mass(radius),
                rng.random_hue(c.saturation, c.value),
                lit,
                BodyMode::Dynamic,
                1.0,
            ),
            BodyRole::Arrival => (
                self.ambient_mass(radius),
                rng.random_hue(c.saturation, c.value),
                true,
                BodyMode::Kinematic,
                0.0,
            ),
        };

        let handle = physics.add_body(
            &BodyDesc::sphere(position, radius, mass)
                .with_damping(c.linear_damping, c.angular_damping)
                .with_mode(mode),
        );
        let node = render.create_sphere(
            radius,
            SphereMaterial { color, emissive: 0.0 },
            Transform::at(position).with_scale(scale),
        );
        let light = lit.then(|| {
            let intensity = if role == BodyRole::Driver {
                c.light_intensity * 2.0
            } else {
                c.light_intensity
            };
            render.create_light(PointLight {
                position,
                color,
                intensity,
                range: c.light_range,
            })
        });

        BodyParts {
            handle,
            node,
            light,
            radius,
            phase: rng.random_range(0.0, TAU),
        }
    }

    /// Release everything a body owns. Safe on already-released parts.
    pub fn release<P: PhysicsBackend, R: RenderBackend>(parts: &BodyParts, physics: &mut P, render: &mut R) {
        physics.remove_body(parts.handle);
        render.dispose_sphere(parts.node);
        if let Some(light) = parts.light {
            render.dispose_light(light);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::SphereWorld;
    use crate::scene::Scene;

    #[test]
    fn test_arrival_starts_kinematic_hidden_and_lit() {
        let factory = BodyFactory::new(BodyConfig::default());
        let mut world = SphereWorld::default();
        let mut scene = Scene::new(5.0, 14.0);
        let mut rng = SpawnRng::seeded(1);

        let parts = factory.build(BodyRole::Arrival, 0.4, Vec3::X, &mut world, &mut scene, &mut rng);

        assert_eq!(world.mode(parts.handle), Some(BodyMode::Kinematic));
        assert_eq!(scene.sphere(parts.node).unwrap().transform.scale, 0.0);
        assert!(parts.light.is_some());
    }

    #[test]
    fn test_unlit_ambient_has_no_light() {
        let factory = BodyFactory::new(BodyConfig::default());
        let mut world = SphereWorld::default();
        let mut scene = Scene::new(5.0, 14.0);
        let mut rng = SpawnRng::seeded(2);

        let parts = factory.build(
            BodyRole::Ambient { lit: false },
            0.3,
            Vec3::ZERO,
            &mut world,
            &mut scene,
            &mut rng,
        );
        assert!(parts.light.is_none());
        assert_eq!(scene.light_count(), 0);
        assert_eq!(world.mode(parts.handle), Some(BodyMode::Dynamic));
    }

    #[test]
    fn test_release_is_idempotent() {
        let factory = BodyFactory::new(BodyConfig::default());
        let mut world = SphereWorld::default();
        let mut scene = Scene::new(5.0, 14.0);
        let mut rng = SpawnRng::seeded(3);

        let parts = factory.build(BodyRole::Driver, 0.75, Vec3::ZERO, &mut world, &mut scene, &mut rng);
        BodyFactory::release(&parts, &mut world, &mut scene);
        BodyFactory::release(&parts, &mut world, &mut scene);

        assert_eq!(world.body_count(), 0);
        assert_eq!(scene.sphere_count(), 0);
        assert_eq!(scene.light_count(), 0);
    }

    #[test]
    fn test_mass_grows_with_volume() {
        let factory = BodyFactory::new(BodyConfig::default());
        let small = factory.ambient_mass(0.3);
        let large = factory.ambient_mass(0.6);
        assert!((large / small - 8.0).abs() < 1e-3);
    }
}
