//! # orbshell
//!
//! An animated cluster of rigid spheres confined inside a translucent
//! spherical shell.
//!
//! The core is a per-tick confinement and lifecycle loop. It keeps bodies
//! inside the shell with restoring forces, kicks a designated driver body
//! on a jittered interval, revives bodies that come to rest, and slowly
//! turns the population over with an elastic spawn-in animation.
//!
//! ## Quick Start
//!
//! ```ignore
//! use orbshell::prelude::*;
//!
//! fn main() -> Result<(), RunError> {
//!     orbshell::run(ShellConfig::default().with_target_count(30))
//! }
//! ```
//!
//! ## Headless
//!
//! [`Simulation`] talks to physics and rendering only through the
//! [`PhysicsBackend`] and [`RenderBackend`] traits. The built-in
//! [`SphereWorld`] and [`Scene`] need no GPU, so the loop can be driven
//! directly with session time in milliseconds:
//!
//! ```ignore
//! let mut sim = Simulation::new(ShellConfig::default().with_seed(7));
//! sim.start(0.0);
//! for frame in 1..600 {
//!     sim.tick(frame as f64 * 16.0);
//! }
//! sim.stop();
//! ```
//!
//! ## Configuration
//!
//! [`ShellConfig`] loads from JSON; every field has a default, so a file
//! only needs the values it changes.

pub mod config;
pub mod error;
pub mod gpu;
pub mod input;
pub mod physics;
pub mod scene;
pub mod shader;
pub mod sim;
pub mod spawn;
pub mod time;
mod window;

pub use bytemuck;
pub use glam::{Quat, Vec2, Vec3};

pub use config::ShellConfig;
pub use error::{ConfigError, GpuError, RunError};
pub use physics::{BodyDesc, BodyHandle, BodyMode, ContactMaterial, PhysicsBackend, SphereWorld};
pub use scene::{LightId, NodeId, PointLight, RenderBackend, Scene, SphereMaterial, Transform};
pub use sim::{BodyId, PendingSpawn, Phase, Simulation, TickReport};
pub use spawn::SpawnRng;
pub use time::Time;
pub use window::run;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::ShellConfig;
    pub use crate::error::{ConfigError, RunError};
    pub use crate::physics::{PhysicsBackend, SphereWorld};
    pub use crate::scene::{RenderBackend, Scene};
    pub use crate::sim::{BodyId, PendingSpawn, Phase, Simulation, TickReport};
    pub use crate::{Quat, Vec2, Vec3};
}
