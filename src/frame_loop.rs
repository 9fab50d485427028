use std::time::{Duration, Instant};

use crate::{
    config::EngineConfig,
    core::{Millis, Viewport},
    engine::{Engine, TickOutcome},
    error::{GlowError, GlowResult},
    surface::{FrameRGBA, Surface},
};

pub trait Clock {
    fn now_ms(&mut self) -> Millis;
}

#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&mut self) -> Millis {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

/// Deterministic clock: `0, step, 2·step, ...`, one value per call.
#[derive(Clone, Copy, Debug)]
pub struct FixedStepClock {
    step_ms: Millis,
    index: u64,
}

impl FixedStepClock {
    pub fn new(step_ms: Millis) -> Self {
        Self { step_ms, index: 0 }
    }
}

impl Clock for FixedStepClock {
    fn now_ms(&mut self) -> Millis {
        let t = (self.index as f64) * self.step_ms;
        self.index += 1;
        t
    }
}

pub trait FrameSink {
    fn consume(&mut self, surface: &Surface, t: Millis) -> GlowResult<()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn consume(&mut self, _surface: &Surface, _t: Millis) -> GlowResult<()> {
        Ok(())
    }
}

pub struct FnSink<F>(pub F);

impl<F> FrameSink for FnSink<F>
where
    F: FnMut(&Surface, Millis) -> GlowResult<()>,
{
    fn consume(&mut self, surface: &Surface, t: Millis) -> GlowResult<()> {
        (self.0)(surface, t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopOptions {
    pub fps: u32,
    /// Sleep between ticks to hold `fps`; offline rendering runs unpaced.
    pub pace: bool,
    pub max_ticks: Option<u64>,
}

impl LoopOptions {
    pub fn paced(fps: u32) -> Self {
        Self {
            fps,
            pace: true,
            max_ticks: None,
        }
    }

    pub fn offline(fps: u32, ticks: u64) -> Self {
        Self {
            fps,
            pace: false,
            max_ticks: Some(ticks),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopReport {
    pub ticks: u64,
    pub halted: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameLoop {
    opts: LoopOptions,
}

impl FrameLoop {
    pub fn new(opts: LoopOptions) -> GlowResult<Self> {
        if opts.fps == 0 {
            return Err(GlowError::validation("frame loop fps must be > 0"));
        }
        Ok(Self { opts })
    }

    /// Drives `engine` until it halts or the tick budget is spent, then stops it. The engine
    /// must already be started.
    #[tracing::instrument(skip_all, fields(fps = self.opts.fps, pace = self.opts.pace))]
    pub fn run(
        &self,
        engine: &mut Engine,
        clock: &mut dyn Clock,
        sink: &mut dyn FrameSink,
    ) -> GlowResult<LoopReport> {
        if !engine.is_running() {
            return Err(GlowError::lifecycle("frame loop needs a started engine"));
        }
        let result = self.drive(engine, clock, sink);
        engine.stop();
        result
    }

    fn drive(
        &self,
        engine: &mut Engine,
        clock: &mut dyn Clock,
        sink: &mut dyn FrameSink,
    ) -> GlowResult<LoopReport> {
        let stop = engine.stop_handle();
        let interval = Duration::from_secs_f64(1.0 / f64::from(self.opts.fps));
        let mut ticks = 0u64;

        loop {
            if !stop.is_running() {
                return Ok(LoopReport {
                    ticks,
                    halted: true,
                });
            }
            if self.opts.max_ticks.is_some_and(|max| ticks >= max) {
                return Ok(LoopReport {
                    ticks,
                    halted: false,
                });
            }

            let started = Instant::now();
            let t = clock.now_ms();
            let outcome = engine.tick(t);
            if let Some(surface) = engine.surface() {
                sink.consume(surface, t)?;
            }
            ticks += 1;

            if outcome == TickOutcome::Halt {
                return Ok(LoopReport {
                    ticks,
                    halted: true,
                });
            }
            if self.opts.pace {
                std::thread::sleep(interval.saturating_sub(started.elapsed()));
            }
        }
    }
}

/// Simulates from `t = 0` to `time_ms` at the configured fps and returns the last frame.
///
/// Trails depend on history, so a still at `time_ms` needs every earlier tick.
pub fn render_still(
    config: &EngineConfig,
    viewport: Viewport,
    time_ms: Millis,
) -> GlowResult<FrameRGBA> {
    if !time_ms.is_finite() || time_ms < 0.0 {
        return Err(GlowError::validation("still time must be finite and >= 0"));
    }
    let mut engine = Engine::new(config.clone(), Box::new(|| {}))?;
    engine.start(viewport)?;

    let step = config.frame_interval_ms();
    let ticks = (time_ms / step).floor() as u64 + 1;
    let mut last = None;
    let mut seen = 0u64;
    let mut clock = FixedStepClock::new(step);
    let mut sink = FnSink(|surface: &Surface, _t: Millis| -> GlowResult<()> {
        seen += 1;
        if seen == ticks {
            last = Some(surface.snapshot());
        }
        Ok(())
    });
    FrameLoop::new(LoopOptions::offline(config.fps, ticks))?.run(
        &mut engine,
        &mut clock,
        &mut sink,
    )?;
    drop(sink);

    last.ok_or_else(|| GlowError::lifecycle("animation halted before the requested time"))
}
