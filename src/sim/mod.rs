//! The confinement and lifecycle loop.
//!
//! [`Simulation`] owns the body registry, the physics backend and the render
//! backend, and runs the per-tick policies in a fixed order:
//!
//! 1. physics sub-steps
//! 2. driver kick
//! 3. population regeneration and spawn-in animation
//! 4. liveness revival
//! 5. boundary confinement, then removal of ejected bodies
//! 6. render sync
//!
//! Session time is passed in by the caller as milliseconds, so tests can
//! drive it without a clock.

pub mod confinement;
pub mod driver;
pub mod easing;
pub mod factory;
pub mod liveness;
pub mod regen;
pub mod registry;
pub mod sync;
pub mod tasks;

pub use confinement::Confinement;
pub use driver::{DriverKick, DriverScheduler};
pub use factory::{BodyFactory, BodyRole};
pub use liveness::{Liveness, StationaryTracker};
pub use regen::{PendingSpawn, Regenerator, SpawningBody};
pub use registry::{ActiveBody, BodyId, BodyParts, BodyRegistry};
pub use sync::RenderSync;
pub use tasks::{FrameTask, FrameTasks};

use crate::config::ShellConfig;
use crate::physics::{ContactMaterial, PhysicsBackend, SphereWorld};
use crate::scene::{RenderBackend, Scene};
use crate::spawn::SpawnRng;
use glam::Vec3;

/// Placement attempts per initial body before accepting an overlap.
const PLACEMENT_TRIES: usize = 12;

/// Where the loop is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Never started.
    Idle,
    /// Population built, camera intro playing, physics not yet running.
    Intro,
    Running,
    Stopped,
}

/// What one [`Simulation::tick`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Bodies that left the registry this tick, ejected or regenerated.
    pub removed: Vec<BodyId>,
    pub revived: usize,
    pub driver_kicked: bool,
    pub spawn_started: bool,
    /// Body that finished its spawn-in and joined the registry.
    pub activated: Option<BodyId>,
}

/// Hit the nearest sphere along a ray, returning the distance to it.
///
/// `direction` must be normalized. Hits behind the origin are ignored; a
/// ray starting inside a sphere hits its far side.
pub fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    let far = -b + root;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

/// A cluster of spheres kept inside a shell.
///
/// # Example
///
/// ```ignore
/// use orbshell::prelude::*;
///
/// let mut sim = Simulation::new(ShellConfig::default().with_seed(1));
/// sim.start(0.0);
/// sim.tick(16.0);
/// sim.stop();
/// ```
pub struct Simulation<P: PhysicsBackend = SphereWorld, R: RenderBackend = Scene> {
    config: ShellConfig,
    physics: P,
    render: R,
    registry: BodyRegistry,
    factory: BodyFactory,
    confinement: Confinement,
    liveness: Liveness,
    driver: DriverScheduler,
    regen: Regenerator,
    sync: RenderSync,
    tasks: FrameTasks,
    rng: SpawnRng,
    phase: Phase,
    last_tick_ms: f64,
}

impl Simulation<SphereWorld, Scene> {
    /// Create a simulation on the built-in physics world and scene.
    pub fn new(config: ShellConfig) -> Self {
        let gravity = Vec3::from_array(config.physics.gravity);
        let material = ContactMaterial {
            friction: config.physics.friction,
            restitution: config.physics.restitution,
        };
        let physics = SphereWorld::new(gravity, material);
        let render = Scene::new(config.boundary.shell_radius, config.view.camera_distance);
        Self::with_backends(config, physics, render)
    }
}

impl<P: PhysicsBackend, R: RenderBackend> Simulation<P, R> {
    /// Create a simulation on caller-supplied backends.
    ///
    /// Both backends should be empty; `stop` releases only what the
    /// simulation created.
    ///
    /// An invalid config is logged, not rejected; each part guards its own
    /// degenerate values.
    pub fn with_backends(config: ShellConfig, physics: P, render: R) -> Self {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "simulation created with an invalid config");
        }
        let target = config.bodies.target_count as usize;
        Self {
            factory: BodyFactory::new(config.bodies.clone()),
            confinement: Confinement::new(config.boundary.clone()),
            liveness: Liveness::new(config.liveness.clone()),
            driver: DriverScheduler::new(config.driver.clone(), 0.0),
            regen: Regenerator::new(config.regen.clone(), target, 0.0),
            sync: RenderSync::new(config.bodies.light_intensity),
            tasks: FrameTasks::new(),
            rng: SpawnRng::from_seed_option(config.seed),
            registry: BodyRegistry::new(),
            phase: Phase::Idle,
            last_tick_ms: 0.0,
            physics,
            render,
            config,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether ticks do anything.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Intro | Phase::Running)
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable physics access, for tests and tools that place bodies by hand.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn pending(&self) -> &PendingSpawn {
        self.regen.pending()
    }

    pub fn driver_scheduler(&self) -> &DriverScheduler {
        &self.driver
    }

    pub fn tasks(&self) -> &FrameTasks {
        &self.tasks
    }

    /// Build the initial population and begin the camera intro.
    ///
    /// Ignored while already active. A stopped simulation can be started
    /// again.
    pub fn start(&mut self, now_ms: f64) {
        if self.is_active() {
            tracing::warn!(phase = ?self.phase, "start ignored; simulation already active");
            return;
        }

        self.spawn_initial_population();
        self.last_tick_ms = now_ms;

        let view = &self.config.view;
        if view.intro_ms > 0.0 {
            self.render.set_camera_distance(view.intro_from);
            self.tasks.push(FrameTask::CameraIntro {
                started_ms: now_ms,
                duration_ms: view.intro_ms,
                from: view.intro_from,
                to: view.camera_distance,
            });
            self.phase = Phase::Intro;
        } else {
            self.render.set_camera_distance(view.camera_distance);
            self.begin_running(now_ms);
        }

        self.sync.apply(&self.registry, &self.physics, &mut self.render, now_ms);
        tracing::info!(
            bodies = self.registry.len(),
            intro_ms = self.config.view.intro_ms,
            "simulation started"
        );
    }

    fn begin_running(&mut self, now_ms: f64) {
        self.driver = DriverScheduler::new(self.config.driver.clone(), now_ms);
        self.regen = Regenerator::new(
            self.config.regen.clone(),
            self.config.bodies.target_count as usize,
            now_ms,
        );
        self.phase = Phase::Running;
    }

    fn spawn_initial_population(&mut self) {
        let bodies = &self.config.bodies;
        let spread = bodies.initial_spread * self.config.boundary.effective_radius();
        let mut placed: Vec<(Vec3, f32)> = Vec::new();

        let driver = self.factory.build(
            BodyRole::Driver,
            bodies.driver_radius,
            Vec3::ZERO,
            &mut self.physics,
            &mut self.render,
            &mut self.rng,
        );
        placed.push((Vec3::ZERO, driver.radius));
        self.registry.insert_driver(driver);

        for _ in 1..bodies.target_count {
            let radius = self.factory.ambient_radius(&mut self.rng);
            let mut position = self.rng.random_in_sphere(spread);
            for _ in 1..PLACEMENT_TRIES {
                let clear = placed
                    .iter()
                    .all(|&(p, r)| p.distance_squared(position) >= (r + radius) * (r + radius));
                if clear {
                    break;
                }
                position = self.rng.random_in_sphere(spread);
            }
            let lit = self.rng.chance(bodies.light_chance);
            let parts = self.factory.build(
                BodyRole::Ambient { lit },
                radius,
                position,
                &mut self.physics,
                &mut self.render,
                &mut self.rng,
            );
            placed.push((position, radius));
            self.registry.insert(parts);
        }
    }

    /// Advance one frame to session time `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> TickReport {
        let mut report = TickReport::default();
        if !self.is_active() {
            return report;
        }

        let delta_ms = (now_ms - self.last_tick_ms).max(0.0);
        self.last_tick_ms = now_ms;

        let events = self.tasks.run(now_ms, &mut self.render);
        if self.phase == Phase::Intro {
            if !events.intro_finished {
                return report;
            }
            tracing::info!("intro finished");
            self.begin_running(now_ms);
        }

        let physics = &self.config.physics;
        for _ in 0..physics.substeps_per_tick {
            self.physics.step(physics.substep);
        }

        if let Some(driver) = self.registry.driver() {
            let (handle, radius) = (driver.handle, driver.radius);
            if let Some(kick) = self.driver.poll(now_ms, radius, &mut self.rng) {
                self.physics.apply_impulse(handle, kick.impulse, kick.offset);
                let pulse = &self.config.driver;
                if pulse.pulse_ms > 0.0 {
                    self.tasks.push(FrameTask::ShellPulse {
                        started_ms: now_ms,
                        duration_ms: pulse.pulse_ms,
                        peak: pulse.pulse_peak,
                    });
                }
                tracing::trace!(impulse = ?kick.impulse, next_ms = self.driver.interval_ms(), "driver kicked");
                report.driver_kicked = true;
            }
        }

        if self.regen.is_due(now_ms) {
            let cycle = self.regen.cycle(
                now_ms,
                &mut self.registry,
                &self.factory,
                &mut self.physics,
                &mut self.render,
                &mut self.rng,
            );
            report.removed.extend(cycle.removed);
            report.spawn_started = cycle.spawn_started;
        }
        report.activated = self.regen.animate(
            now_ms,
            &mut self.registry,
            &mut self.physics,
            &mut self.render,
            &mut self.rng,
        );

        report.revived = self
            .liveness
            .apply(&mut self.registry, &mut self.physics, delta_ms, &mut self.rng);

        let mut marked = self.confinement.apply(&self.registry, &mut self.physics);
        for body in self.registry.remove_marked(&mut marked) {
            BodyFactory::release(&body.parts(), &mut self.physics, &mut self.render);
            report.removed.push(body.id);
        }

        self.sync.apply(&self.registry, &self.physics, &mut self.render, now_ms);
        report
    }

    /// Halt the loop and release every body, light and pending spawn.
    ///
    /// Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        if !self.is_active() {
            tracing::debug!(phase = ?self.phase, "stop ignored; simulation not active");
            return;
        }

        let mut released = 0;
        for body in self.registry.drain() {
            BodyFactory::release(&body.parts(), &mut self.physics, &mut self.render);
            released += 1;
        }
        if let Some(parts) = self.regen.take_pending() {
            BodyFactory::release(&parts, &mut self.physics, &mut self.render);
            released += 1;
        }
        self.tasks.clear();
        self.render.set_shell_glow(0.0);
        self.phase = Phase::Stopped;
        tracing::info!(released, "simulation stopped");
    }

    /// Cast a ray against the active bodies and nudge the nearest one hit.
    pub fn poke(&mut self, origin: Vec3, direction: Vec3) -> Option<BodyId> {
        if self.phase != Phase::Running {
            return None;
        }
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let (id, handle, _) = self
            .registry
            .iter()
            .filter_map(|body| {
                let center = self.physics.position(body.handle)?;
                let t = ray_sphere(origin, direction, center, body.radius)?;
                Some((body.id, body.handle, t))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))?;

        let nudge = (direction + self.rng.random_direction() * 0.5).normalize_or_zero();
        let impulse = nudge * self.config.view.poke_impulse;
        self.physics.apply_impulse(handle, impulse, Vec3::ZERO);
        tracing::trace!(body = ?id, ?impulse, "poked body");
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ShellConfig {
        ShellConfig::default().with_seed(42).with_intro_ms(0.0)
    }

    #[test]
    fn test_ray_sphere() {
        let hit = ray_sphere(Vec3::new(0.0, 0.0, -10.0), Vec3::Z, Vec3::ZERO, 1.0);
        assert_eq!(hit, Some(9.0));
        assert_eq!(ray_sphere(Vec3::new(0.0, 2.0, -10.0), Vec3::Z, Vec3::ZERO, 1.0), None);
        assert_eq!(ray_sphere(Vec3::new(0.0, 0.0, 10.0), Vec3::Z, Vec3::ZERO, 1.0), None);
        assert_eq!(ray_sphere(Vec3::ZERO, Vec3::Z, Vec3::ZERO, 1.0), Some(1.0));
    }

    #[test]
    fn test_start_builds_target_population() {
        let mut sim = Simulation::new(config());
        sim.start(0.0);

        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(sim.registry().len(), 24);
        assert_eq!(sim.registry().driver_index(), Some(0));
        assert_eq!(sim.physics().body_count(), 24);
        assert_eq!(sim.render().sphere_count(), 24);
        assert!(sim.render().light_count() >= 1);
    }

    #[test]
    fn test_intro_defers_physics() {
        let mut sim = Simulation::new(ShellConfig::default().with_seed(3));
        sim.start(0.0);
        assert_eq!(sim.phase(), Phase::Intro);
        assert_eq!(sim.render().camera_distance, 40.0);

        let handle = sim.registry().get(1).unwrap().handle;
        sim.physics_mut().set_velocity(handle, Vec3::X);
        let before = sim.physics().position(handle).unwrap();
        sim.tick(800.0);
        assert_eq!(sim.physics().position(handle), Some(before));

        sim.tick(1600.0);
        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(sim.render().camera_distance, 14.0);
        assert_eq!(sim.driver_scheduler().last_kick_ms(), 1600.0);
    }

    #[test]
    fn test_tick_before_start_is_noop() {
        let mut sim = Simulation::new(config());
        assert_eq!(sim.tick(100.0), TickReport::default());
        assert!(sim.registry().is_empty());
    }

    #[test]
    fn test_start_twice_is_ignored() {
        let mut sim = Simulation::new(config());
        sim.start(0.0);
        sim.start(10.0);
        assert_eq!(sim.registry().len(), 24);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut sim = Simulation::new(config());
        sim.start(0.0);
        sim.stop();
        sim.start(100.0);
        assert_eq!(sim.registry().len(), 24);
        assert_eq!(sim.physics().body_count(), 24);
    }

    #[test]
    fn test_poke_hits_nearest_body() {
        let mut sim = Simulation::new(config());
        sim.start(0.0);
        let driver = sim.registry().driver().unwrap();
        let (id, handle) = (driver.id, driver.handle);
        sim.physics_mut().set_position(handle, Vec3::new(0.0, 0.0, -4.0));

        let hit = sim.poke(Vec3::new(0.0, 0.0, -20.0), Vec3::Z);
        assert_eq!(hit, Some(id));
        assert!(sim.physics().velocity(handle).unwrap().length() > 0.0);
    }

    #[test]
    fn test_poke_miss() {
        let mut sim = Simulation::new(config());
        sim.start(0.0);
        assert_eq!(sim.poke(Vec3::new(0.0, 50.0, -20.0), Vec3::Z), None);
        assert_eq!(sim.poke(Vec3::ZERO, Vec3::ZERO), None);
    }
}
