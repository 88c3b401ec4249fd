//! Rigid-body physics boundary.
//!
//! The simulation core treats physics as a black-box stepped simulator and
//! only talks to it through [`PhysicsBackend`]. [`SphereWorld`] is the
//! built-in implementation.

mod world;

pub use world::SphereWorld;

use glam::{Quat, Vec3};

/// Opaque handle to a body inside a physics backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u64);

/// How a body reacts to the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyMode {
    /// Ignores forces and impulses; pushes dynamic bodies as if infinitely heavy.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Everything needed to add a sphere to the world.
#[derive(Clone, Copy, Debug)]
pub struct BodyDesc {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub mode: BodyMode,
}

impl BodyDesc {
    /// A resting dynamic sphere.
    pub fn sphere(position: Vec3, radius: f32, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            radius,
            mass,
            linear_damping: 0.0,
            angular_damping: 0.0,
            mode: BodyMode::Dynamic,
        }
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_mode(mut self, mode: BodyMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Contact response shared by every pair of bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.2,
            restitution: 0.55,
        }
    }
}

/// Operations the simulation core needs from a physics engine.
///
/// Accessors return `None` and mutators do nothing for handles that were
/// already removed, so late calls during teardown are harmless.
pub trait PhysicsBackend {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Remove a body. Returns `false` if it was not present.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Advance the world by `dt` seconds.
    fn step(&mut self, dt: f32);

    fn body_count(&self) -> usize;

    fn position(&self, handle: BodyHandle) -> Option<Vec3>;
    fn rotation(&self, handle: BodyHandle) -> Option<Quat>;
    fn velocity(&self, handle: BodyHandle) -> Option<Vec3>;

    fn set_position(&mut self, handle: BodyHandle, position: Vec3);
    fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3);
    fn set_mode(&mut self, handle: BodyHandle, mode: BodyMode);

    /// Apply an instantaneous impulse at a body-local offset from the center.
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3, local_offset: Vec3);

    /// Accumulate a force, consumed by the next [`step`](Self::step).
    fn apply_force(&mut self, handle: BodyHandle, force: Vec3);
}
