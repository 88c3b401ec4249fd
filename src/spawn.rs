//! Randomness for spawning and impulses.
//!
//! Every random decision the simulation makes (placement, kick directions,
//! colors, timing jitter) goes through one [`SpawnRng`] so a fixed seed
//! reproduces a whole run.

use crate::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Squared-length window accepted by [`SpawnRng::sample_in_ball`].
///
/// Samples near the origin are rejected because normalizing them amplifies
/// float error and skews the direction.
pub const ACCEPT_MIN_LEN_SQ: f32 = 0.1;
pub const ACCEPT_MAX_LEN_SQ: f32 = 1.0;

/// Random source with helpers for common spawn patterns.
pub struct SpawnRng {
    rng: SmallRng,
}

impl SpawnRng {
    /// Seed from a fixed value, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Use `seed` when given, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random f64 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range_f64(&mut self, min: f64, max: f64) -> f64 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Uniform index into a collection of `len` items.
    #[inline]
    pub fn random_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// True with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.random() < p
    }

    // ========== Direction helpers ==========

    /// Un-normalized point from the unit ball, rejection-sampled.
    ///
    /// The squared length is always in `[0.1, 1.0)`. The acceptance region
    /// is a thick shell of the sampling cube, so the loop terminates with
    /// probability one and needs no retry cap.
    pub fn sample_in_ball(&mut self) -> Vec3 {
        loop {
            let v = Vec3::new(
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
                self.rng.gen_range(-1.0..1.0),
            );
            let len_sq = v.length_squared();
            if (ACCEPT_MIN_LEN_SQ..ACCEPT_MAX_LEN_SQ).contains(&len_sq) {
                return v;
            }
        }
    }

    /// Random unit vector, free of the axis bias of per-axis sampling.
    ///
    /// Used for driver kicks, spawn placement and spawn impulses alike.
    pub fn random_direction(&mut self) -> Vec3 {
        self.sample_in_ball().normalize()
    }

    /// Random point inside a sphere of given radius, centered at origin.
    ///
    /// Distribution is uniform throughout the volume.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        // Cube root for uniform volume distribution
        let r = radius * self.random().cbrt();
        self.random_direction() * r
    }

    // ========== Color helpers ==========

    /// Random color with given saturation and value (HSV model).
    pub fn random_hue(&mut self, saturation: f32, value: f32) -> Vec3 {
        let hue = self.random();
        hsv_to_rgb(hue, saturation, value)
    }
}

/// Convert HSV to RGB.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let c = v * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h * 6.0) as u32 % 6 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Vec3::new(r + m, g + m, b + m)
}
