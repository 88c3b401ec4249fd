//! Session clock feeding `Simulation::tick`.
//!
//! The simulation only ever sees milliseconds as `f64`; the viewer samples
//! this clock once per redraw and hands the elapsed value over. While the
//! window is hidden or the user pauses, the clock stands still, so the
//! driver and regeneration schedules pick up where they left off.

use std::time::{Duration, Instant};

/// Milliseconds since the session began, minus any paused stretches.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    elapsed_ms: f64,
    delta_ms: f64,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    pause_elapsed: Duration,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Sample the clock for a new redraw, yielding `(session_ms, frame_ms)`.
    ///
    /// A paused clock yields the frozen session time and a zero frame time.
    pub fn update(&mut self) -> (f64, f64) {
        let now = Instant::now();

        if self.paused {
            self.delta_ms = 0.0;
            return (self.elapsed_ms, self.delta_ms);
        }

        self.delta_ms = now.duration_since(self.last_frame).as_secs_f64() * 1000.0;
        self.last_frame = now;

        let raw_elapsed = now.duration_since(self.start).saturating_sub(self.pause_elapsed);
        self.elapsed_ms = raw_elapsed.as_secs_f64() * 1000.0;

        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        (self.elapsed_ms, self.delta_ms)
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    #[inline]
    pub fn delta_ms(&self) -> f64 {
        self.delta_ms
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Redraw rate, refreshed every half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze session time, e.g. while the window is occluded.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Restart a frozen clock without counting the frozen span.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
