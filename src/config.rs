//! Configuration for the shell simulation.
//!
//! Every section has sensible defaults and is `#[serde(default)]`, so a JSON
//! file only needs the values it wants to change:
//!
//! ```json
//! {
//!   "boundary": { "shell_radius": 6.0 },
//!   "regen": { "cadence_ms": 5000.0 }
//! }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Spherical boundary and the forces that keep bodies inside it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Radius of the visible shell.
    pub shell_radius: f32,
    /// Fraction of the shell radius bodies are meant to stay within.
    pub inner_fraction: f32,
    /// Multiple of the shell radius past which a body is ejected.
    pub exit_threshold: f32,
    /// Peak inward force at the edge of the effective radius.
    pub force_multiplier: f32,
    /// Velocity factor applied every tick while in the outer band.
    pub outer_damping: f32,
    /// Constant pull toward the center. Zero disables it.
    pub central_gravity: f32,
    /// Speed cap for every body.
    pub max_speed: f32,
    /// Where an escaped driver is put back, as a fraction of the effective radius.
    pub driver_reset_fraction: f32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            shell_radius: 5.0,
            inner_fraction: 0.9,
            exit_threshold: 1.02,
            force_multiplier: 40.0,
            outer_damping: 0.95,
            central_gravity: 1.5,
            max_speed: 12.0,
            driver_reset_fraction: 0.7,
        }
    }
}

impl BoundaryConfig {
    /// Radius bodies are softly pushed back into.
    pub fn effective_radius(&self) -> f32 {
        self.shell_radius * self.inner_fraction
    }

    /// Distance from the center past which bodies are ejected.
    pub fn exit_radius(&self) -> f32 {
        self.shell_radius * self.exit_threshold
    }
}

/// Body population and appearance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    /// Desired number of bodies, driver included.
    pub target_count: u32,
    pub radius_min: f32,
    pub radius_max: f32,
    /// Mass per unit volume for ambient bodies.
    pub density: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub driver_radius: f32,
    pub driver_mass: f32,
    /// Chance that an initial ambient body carries a point light.
    pub light_chance: f32,
    pub light_range: f32,
    pub light_intensity: f32,
    pub saturation: f32,
    pub value: f32,
    /// Initial bodies are scattered within this fraction of the effective radius.
    pub initial_spread: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            target_count: 24,
            radius_min: 0.28,
            radius_max: 0.52,
            density: 1.6,
            linear_damping: 0.12,
            angular_damping: 0.3,
            driver_radius: 0.75,
            driver_mass: 4.0,
            light_chance: 0.3,
            light_range: 3.5,
            light_intensity: 1.2,
            saturation: 0.65,
            value: 0.95,
            initial_spread: 0.6,
        }
    }
}

/// Physics world settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    /// Fixed integration step in seconds.
    pub substep: f32,
    /// Integration steps per tick.
    pub substeps_per_tick: u32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, 0.0],
            substep: 1.0 / 120.0,
            substeps_per_tick: 2,
            friction: 0.2,
            restitution: 0.55,
        }
    }
}

/// Stationary-body detection and revival.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LivenessConfig {
    pub low_speed: f32,
    /// Maximum per-tick speed change still counted as stationary.
    pub change_epsilon: f32,
    pub dwell_ms: f64,
    pub revival_min: f32,
    pub revival_max: f32,
    /// Weight of the toward-center component in the revival direction.
    pub center_bias: f32,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            low_speed: 0.3,
            change_epsilon: 0.05,
            dwell_ms: 2000.0,
            revival_min: 8.0,
            revival_max: 14.0,
            center_bias: 0.8,
        }
    }
}

/// Periodic driver kicks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    pub interval_ms: f64,
    /// Upper bound of the random extra delay added after each kick.
    pub jitter_ms: f64,
    pub impulse: f32,
    /// Maximum off-center distance of the kick point, as a fraction of the driver radius.
    pub offset: f32,
    /// Duration of the shell glow pulse triggered by a kick. Zero disables it.
    pub pulse_ms: f64,
    pub pulse_peak: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            interval_ms: 3000.0,
            jitter_ms: 2000.0,
            impulse: 18.0,
            offset: 0.15,
            pulse_ms: 600.0,
            pulse_peak: 1.0,
        }
    }
}

/// Population turnover.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegenConfig {
    pub cadence_ms: f64,
    pub popup_ms: f64,
    pub popup_scale: f32,
    /// Distance from the center new bodies appear at.
    pub spawn_distance: f32,
    pub spawn_impulse: f32,
    pub popup_light_peak: f32,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            cadence_ms: 10_000.0,
            popup_ms: 900.0,
            popup_scale: 1.0,
            spawn_distance: 1.2,
            spawn_impulse: 4.0,
            popup_light_peak: 4.0,
        }
    }
}

/// Camera and viewer window.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub camera_distance: f32,
    /// Camera distance the intro zoom starts from.
    pub intro_from: f32,
    /// Length of the intro zoom. Zero starts the simulation immediately.
    pub intro_ms: f64,
    /// Impulse applied to a body hit by a click.
    pub poke_impulse: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: "orbshell".into(),
            width: 1280,
            height: 720,
            camera_distance: 14.0,
            intro_from: 40.0,
            intro_ms: 1600.0,
            poke_impulse: 3.0,
        }
    }
}

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    pub boundary: BoundaryConfig,
    pub bodies: BodyConfig,
    pub physics: PhysicsConfig,
    pub liveness: LivenessConfig,
    pub driver: DriverConfig,
    pub regen: RegenConfig,
    pub view: ViewConfig,
    /// Fixed RNG seed. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl ShellConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON string and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Set the shell radius.
    pub fn with_shell_radius(mut self, radius: f32) -> Self {
        self.boundary.shell_radius = radius;
        self
    }

    /// Set the target population, driver included.
    pub fn with_target_count(mut self, count: u32) -> Self {
        self.bodies.target_count = count;
        self
    }

    /// Set the camera intro duration. Zero skips the intro.
    pub fn with_intro_ms(mut self, ms: f64) -> Self {
        self.view.intro_ms = ms;
        self
    }

    /// Fix the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every value the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.boundary;
        positive("boundary.shell_radius", b.shell_radius)?;
        if !(b.inner_fraction > 0.0 && b.inner_fraction <= 1.0) {
            return Err(ConfigError::invalid(
                "boundary.inner_fraction",
                format!("must be in (0, 1], got {}", b.inner_fraction),
            ));
        }
        if !(b.exit_threshold > 1.0) {
            return Err(ConfigError::invalid(
                "boundary.exit_threshold",
                format!("must be greater than 1.0, got {}", b.exit_threshold),
            ));
        }
        non_negative("boundary.force_multiplier", b.force_multiplier)?;
        non_negative("boundary.central_gravity", b.central_gravity)?;
        positive("boundary.max_speed", b.max_speed)?;
        if !(0.0..=1.0).contains(&b.outer_damping) {
            return Err(ConfigError::invalid(
                "boundary.outer_damping",
                format!("must be in [0, 1], got {}", b.outer_damping),
            ));
        }

        let bodies = &self.bodies;
        if bodies.target_count == 0 {
            return Err(ConfigError::invalid(
                "bodies.target_count",
                "must include at least the driver",
            ));
        }
        positive("bodies.radius_min", bodies.radius_min)?;
        if bodies.radius_max < bodies.radius_min {
            return Err(ConfigError::invalid(
                "bodies.radius_max",
                format!(
                    "must not be below radius_min ({} < {})",
                    bodies.radius_max, bodies.radius_min
                ),
            ));
        }
        positive("bodies.density", bodies.density)?;
        positive("bodies.driver_radius", bodies.driver_radius)?;
        positive("bodies.driver_mass", bodies.driver_mass)?;

        positive("physics.substep", self.physics.substep)?;
        if self.physics.substeps_per_tick == 0 {
            return Err(ConfigError::invalid(
                "physics.substeps_per_tick",
                "must be at least 1",
            ));
        }

        let l = &self.liveness;
        positive("liveness.dwell_ms", l.dwell_ms as f32)?;
        if l.revival_max < l.revival_min {
            return Err(ConfigError::invalid(
                "liveness.revival_max",
                "must not be below revival_min",
            ));
        }

        positive("driver.interval_ms", self.driver.interval_ms as f32)?;
        non_negative("driver.jitter_ms", self.driver.jitter_ms as f32)?;
        positive("regen.cadence_ms", self.regen.cadence_ms as f32)?;
        positive("regen.popup_ms", self.regen.popup_ms as f32)?;
        non_negative("view.intro_ms", self.view.intro_ms as f32)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must not be negative, got {}", value)))
    }
}
