//! Spherical boundary enforcement.
//!
//! Inside 80% of the effective radius bodies move freely (apart from the
//! central pull). In the outer band a quadratic restoring force grows to
//! the full multiplier at the effective radius. Past the exit radius a body
//! is marked for removal, or put back near the center if it is the driver.

use super::registry::BodyRegistry;
use crate::config::BoundaryConfig;
use crate::physics::PhysicsBackend;
use glam::Vec3;

/// Fraction of the effective radius where the restoring band starts.
pub const BAND_START: f32 = 0.8;

/// Inward force for a body at `position`. Zero inside the band.
pub fn restoring_force(position: Vec3, effective_radius: f32, multiplier: f32) -> Vec3 {
    let distance = position.length();
    let start = BAND_START * effective_radius;
    if distance <= start {
        return Vec3::ZERO;
    }
    let depth = (distance - start) / ((1.0 - BAND_START) * effective_radius);
    -position / distance * depth * depth * multiplier
}

pub struct Confinement {
    config: BoundaryConfig,
}

impl Confinement {
    pub fn new(config: BoundaryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    /// Sweep every registered body once.
    ///
    /// Returns the registry indices of bodies that left through the exit
    /// radius. They are not removed here.
    pub fn apply<P: PhysicsBackend>(&self, registry: &BodyRegistry, physics: &mut P) -> Vec<usize> {
        let c = &self.config;
        let effective = c.effective_radius();
        let exit = c.exit_radius();
        let mut marked = Vec::new();

        for (index, body) in registry.iter().enumerate() {
            let Some(position) = physics.position(body.handle) else {
                continue;
            };
            let distance = position.length();
            let outward = position.normalize_or_zero();

            if distance > exit {
                if registry.is_driver(index) {
                    let reset = outward * c.driver_reset_fraction * effective;
                    physics.set_position(body.handle, reset);
                    physics.set_velocity(body.handle, Vec3::ZERO);
                    tracing::debug!(distance, "driver escaped; repositioned");
                } else {
                    tracing::debug!(body = ?body.id, distance, "body ejected");
                    marked.push(index);
                }
                continue;
            }

            let Some(mut velocity) = physics.velocity(body.handle) else {
                continue;
            };

            if distance > BAND_START * effective {
                physics.apply_force(body.handle, restoring_force(position, effective, c.force_multiplier));
                velocity *= c.outer_damping;
            }

            if c.central_gravity > 0.0 {
                physics.apply_force(body.handle, -outward * c.central_gravity);
            }

            let speed = velocity.length();
            if speed > c.max_speed {
                velocity *= c.max_speed / speed;
            }
            physics.set_velocity(body.handle, velocity);
        }

        marked
    }
}
