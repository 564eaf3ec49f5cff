//! Frame scheduler
//!
//! The host calls `on_animation_frame` once per display refresh. Frames that
//! arrive sooner than the target interval are skipped (admission), so the
//! simulation runs at the target rate regardless of refresh rate. Admitted
//! frames run the stages in a fixed order with one shared `FrameContext`:
//! input, particles, simulation, render.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub target_fps: f64,
    /// Upper bound on `FrameContext::time_scale` after a stall
    pub max_time_scale: f64,
    /// Time each stage and log averages
    pub instrumentation: bool,
    /// Admitted frames between perf log lines
    pub perf_log_every: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            max_time_scale: 4.0,
            instrumentation: false,
            perf_log_every: 300,
        }
    }
}

impl LoopConfig {
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps
    }
}

/// Per-frame timing handed to every stage. Built fresh each admitted frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Wall-clock time since the previous admitted frame
    pub delta_ms: f64,
    /// `delta / interval`, clamped
    pub time_scale: f64,
    pub now_ms: f64,
    pub interval_ms: f64,
}

impl FrameContext {
    /// Simulation step in seconds: one interval scaled by `time_scale`
    pub fn sim_dt_secs(&self) -> f32 {
        (self.interval_ms * self.time_scale / 1000.0) as f32
    }

    pub fn sim_dt_ms(&self) -> f64 {
        self.interval_ms * self.time_scale
    }
}

/// Work run for each admitted frame
pub trait FrameStages {
    fn input(&mut self, _ctx: FrameContext) {}
    fn particles(&mut self, _ctx: FrameContext) {}
    fn simulation(&mut self, _ctx: FrameContext) {}
    fn render(&mut self, _ctx: FrameContext) {}
}

/// The host's animation-callback primitive
pub trait AnimationHost {
    /// Ask for one callback on the next refresh; returns a cancellation id
    fn request_frame(&mut self) -> u64;
    fn cancel_frame(&mut self, id: u64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Input,
    Particles,
    Simulation,
    Render,
}

impl Stage {
    const ALL: [Stage; 4] = [Stage::Input, Stage::Particles, Stage::Simulation, Stage::Render];

    fn run(self, stages: &mut impl FrameStages, ctx: FrameContext) {
        match self {
            Stage::Input => stages.input(ctx),
            Stage::Particles => stages.particles(ctx),
            Stage::Simulation => stages.simulation(ctx),
            Stage::Render => stages.render(ctx),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Particles => "particles",
            Stage::Simulation => "simulation",
            Stage::Render => "render",
        }
    }
}

/// Rolling per-stage averages, logged and reset every `log_every` frames
#[derive(Debug, Clone)]
pub struct FrameProfiler {
    log_every: u32,
    frames: u32,
    totals: [Duration; 4],
}

impl FrameProfiler {
    pub fn new(log_every: u32) -> Self {
        Self {
            log_every: log_every.max(1),
            frames: 0,
            totals: [Duration::ZERO; 4],
        }
    }

    fn record(&mut self, stage: usize, elapsed: Duration) {
        self.totals[stage] += elapsed;
    }

    /// Close out a frame. Returns the averages in ms when a window completes.
    fn end_frame(&mut self) -> Option<[f64; 4]> {
        self.frames += 1;
        if self.frames < self.log_every {
            return None;
        }
        let n = self.frames as f64;
        let avg = self.totals.map(|t| t.as_secs_f64() * 1000.0 / n);
        log::info!(
            "Frame perf over {} frames: {} {:.3}ms, {} {:.3}ms, {} {:.3}ms, {} {:.3}ms",
            self.frames,
            Stage::ALL[0].name(),
            avg[0],
            Stage::ALL[1].name(),
            avg[1],
            Stage::ALL[2].name(),
            avg[2],
            Stage::ALL[3].name(),
            avg[3],
        );
        self.frames = 0;
        self.totals = [Duration::ZERO; 4];
        Some(avg)
    }
}

#[derive(Debug)]
pub struct FrameScheduler {
    interval_ms: f64,
    max_time_scale: f64,
    running: bool,
    last_frame_ms: f64,
    pending: Option<u64>,
    admitted: u64,
    profiler: Option<FrameProfiler>,
}

impl FrameScheduler {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            interval_ms: config.frame_interval_ms(),
            max_time_scale: config.max_time_scale,
            running: false,
            last_frame_ms: 0.0,
            pending: None,
            admitted: 0,
            profiler: config
                .instrumentation
                .then(|| FrameProfiler::new(config.perf_log_every)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Frames that passed admission since construction
    pub fn admitted_frames(&self) -> u64 {
        self.admitted
    }

    pub fn start(&mut self, host: &mut dyn AnimationHost, now_ms: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_frame_ms = now_ms;
        self.pending = Some(host.request_frame());
        log::info!("Frame loop started at {:.1} fps", 1000.0 / self.interval_ms);
    }

    /// Cancel the pending callback. A frame already running finishes normally.
    pub fn stop(&mut self, host: &mut dyn AnimationHost) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(id) = self.pending.take() {
            host.cancel_frame(id);
        }
        log::info!("Frame loop stopped after {} frames", self.admitted);
    }

    /// Host callback. Returns the context when the frame was admitted.
    pub fn on_animation_frame(
        &mut self,
        now_ms: f64,
        host: &mut dyn AnimationHost,
        stages: &mut impl FrameStages,
    ) -> Option<FrameContext> {
        self.pending = None;
        if !self.running {
            return None;
        }

        let delta = now_ms - self.last_frame_ms;
        if delta < self.interval_ms {
            self.pending = Some(host.request_frame());
            return None;
        }

        // Carry the remainder so late frames don't accumulate drift
        self.last_frame_ms = now_ms - delta % self.interval_ms;
        let ctx = FrameContext {
            delta_ms: delta,
            time_scale: (delta / self.interval_ms).min(self.max_time_scale),
            now_ms,
            interval_ms: self.interval_ms,
        };

        match self.profiler.as_mut() {
            None => {
                for stage in Stage::ALL {
                    stage.run(stages, ctx);
                }
            }
            Some(profiler) => {
                for (i, stage) in Stage::ALL.into_iter().enumerate() {
                    let started = Instant::now();
                    stage.run(stages, ctx);
                    profiler.record(i, started.elapsed());
                }
                profiler.end_frame();
            }
        }
        self.admitted += 1;

        self.pending = Some(host.request_frame());
        Some(ctx)
    }
}

/// Host that hands out ids and remembers the last pending one.
/// Drives the headless binary and tests.
#[derive(Debug, Default)]
pub struct ManualHost {
    next_id: u64,
    pending: Option<u64>,
    cancelled: usize,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl AnimationHost for ManualHost {
    fn request_frame(&mut self) -> u64 {
        self.next_id += 1;
        self.pending = Some(self.next_id);
        self.next_id
    }

    fn cancel_frame(&mut self, id: u64) {
        if self.pending == Some(id) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace {
        calls: Vec<(&'static str, f64)>,
    }

    impl FrameStages for Trace {
        fn input(&mut self, ctx: FrameContext) {
            self.calls.push(("input", ctx.now_ms));
        }
        fn particles(&mut self, ctx: FrameContext) {
            self.calls.push(("particles", ctx.now_ms));
        }
        fn simulation(&mut self, ctx: FrameContext) {
            self.calls.push(("simulation", ctx.now_ms));
        }
        fn render(&mut self, ctx: FrameContext) {
            self.calls.push(("render", ctx.now_ms));
        }
    }

    fn scheduler(fps: f64) -> FrameScheduler {
        FrameScheduler::new(LoopConfig {
            target_fps: fps,
            ..Default::default()
        })
    }

    #[test]
    fn test_not_running_does_nothing() {
        let mut host = ManualHost::new();
        let mut trace = Trace::default();
        let mut s = scheduler(50.0);
        assert!(s.on_animation_frame(100.0, &mut host, &mut trace).is_none());
        assert!(trace.calls.is_empty());
        assert!(!host.has_pending());
    }

    #[test]
    fn test_admission_skips_early_frames() {
        let mut host = ManualHost::new();
        let mut trace = Trace::default();
        let mut s = scheduler(50.0); // 20ms interval
        s.start(&mut host, 0.0);

        assert!(s.on_animation_frame(8.0, &mut host, &mut trace).is_none());
        assert!(s.on_animation_frame(16.0, &mut host, &mut trace).is_none());
        assert!(host.has_pending());
        assert!(trace.calls.is_empty());

        let ctx = s.on_animation_frame(24.0, &mut host, &mut trace).unwrap();
        assert_eq!(ctx.delta_ms, 24.0);
        assert_eq!(s.admitted_frames(), 1);
    }

    #[test]
    fn test_stage_order() {
        let mut host = ManualHost::new();
        let mut trace = Trace::default();
        let mut s = scheduler(50.0);
        s.start(&mut host, 0.0);
        s.on_animation_frame(20.0, &mut host, &mut trace);
        let names: Vec<_> = trace.calls.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["input", "particles", "simulation", "render"]);
        assert!(trace.calls.iter().all(|(_, t)| *t == 20.0));
    }

    #[test]
    fn test_drift_correction_keeps_remainder() {
        let mut host = ManualHost::new();
        let mut trace = Trace::default();
        let mut s = scheduler(50.0);
        s.start(&mut host, 0.0);
        // 25ms late frame: last frame time becomes 20, not 25
        s.on_animation_frame(25.0, &mut host, &mut trace);
        // Only 15ms since the callback, but 20 since the corrected mark
        let ctx = s.on_animation_frame(40.0, &mut host, &mut trace).unwrap();
        assert_eq!(ctx.delta_ms, 20.0);
    }

    #[test]
    fn test_time_scale_clamped_after_stall() {
        let mut host = ManualHost::new();
        let mut trace = Trace::default();
        let mut s = scheduler(50.0);
        s.start(&mut host, 0.0);
        let ctx = s.on_animation_frame(1000.0, &mut host, &mut trace).unwrap();
        assert_eq!(ctx.time_scale, 4.0);
        assert_eq!(ctx.sim_dt_ms(), 80.0);

        let ctx = s.on_animation_frame(1030.0, &mut host, &mut trace).unwrap();
        assert_eq!(ctx.time_scale, 1.5);
    }

    #[test]
    fn test_stop_cancels_pending() {
        let mut host = ManualHost::new();
        let mut trace = Trace::default();
        let mut s = scheduler(60.0);
        s.start(&mut host, 0.0);
        assert!(host.has_pending());
        s.stop(&mut host);
        assert!(!host.has_pending());
        assert_eq!(host.cancelled(), 1);
        assert!(s.on_animation_frame(500.0, &mut host, &mut trace).is_none());
        assert!(trace.calls.is_empty());
    }

    #[test]
    fn test_instrumentation_keeps_control_flow() {
        let mut host = ManualHost::new();
        let mut plain = Trace::default();
        let mut timed = Trace::default();
        let mut a = scheduler(50.0);
        let mut b = FrameScheduler::new(LoopConfig {
            target_fps: 50.0,
            instrumentation: true,
            perf_log_every: 2,
            ..Default::default()
        });
        a.start(&mut host, 0.0);
        b.start(&mut host, 0.0);
        for t in [10.0, 20.0, 35.0, 41.0, 60.0, 130.0] {
            let ra = a.on_animation_frame(t, &mut host, &mut plain);
            let rb = b.on_animation_frame(t, &mut host, &mut timed);
            assert_eq!(ra, rb);
        }
        assert_eq!(plain.calls, timed.calls);
    }

    #[test]
    fn test_profiler_resets_after_window() {
        let mut p = FrameProfiler::new(2);
        p.record(0, Duration::from_millis(2));
        assert!(p.end_frame().is_none());
        p.record(0, Duration::from_millis(4));
        let avg = p.end_frame().unwrap();
        assert!((avg[0] - 3.0).abs() < 1e-9);
        assert_eq!(p.frames, 0);
        assert_eq!(p.totals[0], Duration::ZERO);
    }
}
