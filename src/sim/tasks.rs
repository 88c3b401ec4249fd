//! Time-boxed animations run once per tick.
//!
//! Everything that animates for a while and then stops (the camera intro,
//! shell glow pulses) lives in one [`FrameTasks`] list owned by the
//! simulation, so teardown only has to clear one place.

use crate::scene::RenderBackend;
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameTask {
    /// Zoom the camera from `from` to `to` with an ease-out curve.
    CameraIntro {
        started_ms: f64,
        duration_ms: f64,
        from: f32,
        to: f32,
    },
    /// Brighten the shell rim and let it fade again.
    ShellPulse {
        started_ms: f64,
        duration_ms: f64,
        peak: f32,
    },
}

impl FrameTask {
    fn progress(started_ms: f64, duration_ms: f64, now_ms: f64) -> f32 {
        if duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - started_ms) / duration_ms).clamp(0.0, 1.0) as f32
    }
}

/// Cubic ease-out.
fn ease_out_cubic(p: f32) -> f32 {
    1.0 - (1.0 - p).powi(3)
}

/// What a call to [`FrameTasks::run`] finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskEvents {
    pub intro_finished: bool,
}

#[derive(Debug, Default)]
pub struct FrameTasks {
    tasks: Vec<FrameTask>,
}

impl FrameTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: FrameTask) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn has_intro(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| matches!(t, FrameTask::CameraIntro { .. }))
    }

    /// Advance every task to `now_ms` and drop the finished ones.
    ///
    /// Overlapping shell pulses add up.
    pub fn run<R: RenderBackend>(&mut self, now_ms: f64, render: &mut R) -> TaskEvents {
        let mut events = TaskEvents::default();
        let mut glow: Option<f32> = None;

        self.tasks.retain(|task| match *task {
            FrameTask::CameraIntro {
                started_ms,
                duration_ms,
                from,
                to,
            } => {
                let p = FrameTask::progress(started_ms, duration_ms, now_ms);
                render.set_camera_distance(from + (to - from) * ease_out_cubic(p));
                if p >= 1.0 {
                    events.intro_finished = true;
                    false
                } else {
                    true
                }
            }
            FrameTask::ShellPulse {
                started_ms,
                duration_ms,
                peak,
            } => {
                let p = FrameTask::progress(started_ms, duration_ms, now_ms);
                *glow.get_or_insert(0.0) += peak * (PI * p).sin().max(0.0);
                p < 1.0
            }
        });

        if let Some(glow) = glow {
            render.set_shell_glow(glow);
        }
        events
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
