//! Easing curves for entrance animations.

use std::f32::consts::TAU;

/// Elastic ease-out: overshoots past 1, then settles.
///
/// `2^(-10p) * sin((10p - 0.75) * 2π/3) + 1`, pinned so that `p <= 0` gives
/// exactly 0 and `p >= 1` gives exactly 1.
pub fn elastic_out(p: f32) -> f32 {
    if p <= 0.0 {
        0.0
    } else if p >= 1.0 {
        1.0
    } else {
        (2.0f32).powf(-10.0 * p) * ((10.0 * p - 0.75) * (TAU / 3.0)).sin() + 1.0
    }
}
