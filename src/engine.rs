use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
};

use crate::{
    blob::{Blob, create_population},
    color::Rgba,
    composite::CompositeMode,
    config::EngineConfig,
    core::{Millis, Viewport},
    error::{GlowError, GlowResult},
    motion::{MotionParams, advance},
    render::{GlowStyle, paint_blob},
    rng::{RandomSource, source_from_seed},
    surface::Surface,
};

pub type Notifier = Box<dyn FnMut()>;

/// Requests that a running engine stop after the tick in flight, if any.
///
/// Safe to trigger from inside the notification callback or from another thread.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Debug)]
pub struct ViewportHandle(mpsc::Sender<Viewport>);

impl ViewportHandle {
    pub fn resize(&self, viewport: Viewport) -> bool {
        self.0.send(viewport).is_ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Halt,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    pub notifications: u64,
    pub callback_failures: u64,
    pub resizes: u64,
}

struct Running {
    surface: Surface,
    blobs: Vec<Blob>,
    last_change: Millis,
    resize_tx: mpsc::Sender<Viewport>,
    resize_rx: mpsc::Receiver<Viewport>,
}

/// One mounted animation: surface, blob population and notification heartbeat.
///
/// Lifecycle is `Stopped -> Running -> Stopped`. The population lives exactly as long as one
/// run; starting again after a stop creates a fresh one.
pub struct Engine {
    config: EngineConfig,
    motion: MotionParams,
    style: GlowStyle,
    rng: Box<dyn RandomSource>,
    notifier: Notifier,
    keep_running: Arc<AtomicBool>,
    running: Option<Running>,
    stats: EngineStats,
}

impl Engine {
    pub fn new(config: EngineConfig, notifier: Notifier) -> GlowResult<Self> {
        let rng = source_from_seed(config.seed);
        Self::with_random_source(config, rng, notifier)
    }

    pub fn with_random_source(
        config: EngineConfig,
        rng: Box<dyn RandomSource>,
        notifier: Notifier,
    ) -> GlowResult<Self> {
        config.validate()?;
        Ok(Self {
            motion: MotionParams::from_config(&config),
            style: GlowStyle::from_config(&config),
            config,
            rng,
            notifier,
            keep_running: Arc::new(AtomicBool::new(false)),
            running: None,
            stats: EngineStats::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some() && self.keep_running.load(Ordering::Acquire)
    }

    /// Bound to the current run; take it after [`Engine::start`].
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.keep_running))
    }

    /// `None` while stopped.
    pub fn viewport_handle(&self) -> Option<ViewportHandle> {
        if !self.is_running() {
            return None;
        }
        self.running
            .as_ref()
            .map(|r| ViewportHandle(r.resize_tx.clone()))
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.running.as_ref().map(|r| &r.surface)
    }

    pub fn blobs(&self) -> &[Blob] {
        self.running
            .as_ref()
            .map(|r| r.blobs.as_slice())
            .unwrap_or(&[])
    }

    #[tracing::instrument(skip(self))]
    pub fn start(&mut self, viewport: Viewport) -> GlowResult<()> {
        if self.running.is_some() && !self.keep_running.load(Ordering::Acquire) {
            // Stopped through a handle with no tick since; finish that stop first.
            self.stop();
        }
        if self.running.is_some() {
            return Err(GlowError::lifecycle("engine is already running"));
        }

        let surface = Surface::new(viewport).inspect_err(|e| {
            tracing::error!(error = %e, "surface unavailable; animation not started");
        })?;
        let blobs = create_population(self.config.population, surface.viewport(), &mut *self.rng);
        let (resize_tx, resize_rx) = mpsc::channel();

        // Handles from an earlier run keep their own flag and cannot stop this one.
        self.keep_running = Arc::new(AtomicBool::new(true));
        self.running = Some(Running {
            surface,
            blobs,
            last_change: 0.0,
            resize_tx,
            resize_rx,
        });

        tracing::info!(
            width = viewport.width,
            height = viewport.height,
            population = self.config.population,
            "animation started"
        );
        Ok(())
    }

    /// Runs one frame at timestamp `t`.
    ///
    /// Ticking a stopped engine does nothing. When a stop is requested during the tick (for
    /// example from the notification callback), the frame still completes and the outcome is
    /// [`TickOutcome::Halt`].
    pub fn tick(&mut self, t: Millis) -> TickOutcome {
        if !self.keep_running.load(Ordering::Acquire) {
            self.stop();
            return TickOutcome::Halt;
        }
        let Some(run) = self.running.as_mut() else {
            return TickOutcome::Halt;
        };

        if let Some(viewport) = run.resize_rx.try_iter().last() {
            match run.surface.resize(viewport) {
                Ok(()) => {
                    self.stats.resizes += 1;
                    tracing::debug!(
                        width = viewport.width,
                        height = viewport.height,
                        "surface resized"
                    );
                }
                Err(e) => tracing::warn!(error = %e, "ignoring resize"),
            }
        }

        if t - run.last_change > self.config.change_interval_ms {
            run.last_change = t;
            notify_isolated(&mut self.notifier, &mut self.stats, t);
        }

        let surface = &mut run.surface;
        surface.set_composite_mode(CompositeMode::SourceOver);
        surface.fill(Rgba::black(self.config.trail_alpha));

        surface.set_composite_mode(CompositeMode::Screen);
        for blob in &mut run.blobs {
            let frame = advance(blob, t, &self.motion, &mut *self.rng);
            paint_blob(surface, blob, &frame, &self.style);
        }
        surface.set_composite_mode(CompositeMode::SourceOver);

        self.stats.ticks += 1;

        if self.keep_running.load(Ordering::Acquire) {
            TickOutcome::Continue
        } else {
            TickOutcome::Halt
        }
    }

    pub fn resize(&mut self, viewport: Viewport) -> GlowResult<()> {
        let run = self
            .running
            .as_mut()
            .ok_or_else(|| GlowError::lifecycle("resize on a stopped engine"))?;
        run.surface.resize(viewport)?;
        self.stats.resizes += 1;
        Ok(())
    }

    /// Deregisters the resize observer and discards the population. Idempotent.
    pub fn stop(&mut self) {
        self.keep_running.store(false, Ordering::Release);
        if let Some(run) = self.running.take() {
            tracing::info!(ticks = self.stats.ticks, blobs = run.blobs.len(), "animation stopped");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn notify_isolated(notifier: &mut Notifier, stats: &mut EngineStats, t: Millis) {
    stats.notifications += 1;
    tracing::debug!(t, "animation changed");
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| notifier())) {
        stats.callback_failures += 1;
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        tracing::warn!(panic = %msg, "animation-changed callback panicked; continuing");
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn counting_engine(seed: u64) -> (Engine, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let cfg = EngineConfig {
            seed: Some(seed),
            ..EngineConfig::default()
        };
        let engine = Engine::new(cfg, Box::new(move || c.set(c.get() + 1))).unwrap();
        (engine, count)
    }

    #[test]
    fn notifications_fire_after_interval_boundary() {
        let (mut engine, count) = counting_engine(1);
        engine.start(Viewport::new(64, 48)).unwrap();

        let mut fired_at = Vec::new();
        for t in [0.0, 4999.0, 5001.0, 10002.0] {
            let before = count.get();
            engine.tick(t);
            if count.get() != before {
                fired_at.push(t);
            }
        }
        assert_eq!(fired_at, vec![5001.0, 10002.0]);
        assert_eq!(engine.stats().notifications, 2);
    }

    #[test]
    fn exactly_5000_does_not_notify() {
        let (mut engine, count) = counting_engine(1);
        engine.start(Viewport::new(16, 16)).unwrap();
        engine.tick(5000.0);
        assert_eq!(count.get(), 0);
        engine.tick(5000.5);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn start_twice_is_rejected() {
        let (mut engine, _) = counting_engine(2);
        engine.start(Viewport::new(16, 16)).unwrap();
        let err = engine.start(Viewport::new(16, 16)).unwrap_err();
        assert!(matches!(err, GlowError::Lifecycle(_)));
    }

    #[test]
    fn failed_start_leaves_engine_stopped() {
        let (mut engine, count) = counting_engine(2);
        let err = engine.start(Viewport::new(0, 480)).unwrap_err();
        assert!(matches!(err, GlowError::Surface(_)));
        assert!(!engine.is_running());
        assert!(engine.blobs().is_empty());
        assert_eq!(engine.tick(9000.0), TickOutcome::Halt);
        assert_eq!(engine.stats().ticks, 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn population_matches_config_and_survives_ticks() {
        let (mut engine, _) = counting_engine(3);
        engine.start(Viewport::new(120, 80)).unwrap();
        assert_eq!(engine.blobs().len(), 12);
        for i in 0..10 {
            engine.tick(f64::from(i) * 16.0);
        }
        assert_eq!(engine.blobs().len(), 12);
        assert_eq!(engine.stats().ticks, 10);
    }

    #[test]
    fn composite_mode_is_restored_after_tick() {
        let (mut engine, _) = counting_engine(4);
        engine.start(Viewport::new(32, 32)).unwrap();
        engine.tick(16.0);
        let surface = engine.surface().unwrap();
        assert_eq!(surface.composite_mode(), CompositeMode::SourceOver);
        assert!(surface.data().iter().any(|&b| b != 0));
    }

    #[test]
    fn stop_discards_population_and_deregisters_observer() {
        let (mut engine, _) = counting_engine(5);
        engine.start(Viewport::new(32, 32)).unwrap();
        let observer = engine.viewport_handle().unwrap();
        assert!(observer.resize(Viewport::new(40, 40)));

        engine.stop();
        assert!(!engine.is_running());
        assert!(engine.blobs().is_empty());
        assert!(engine.surface().is_none());
        assert!(engine.viewport_handle().is_none());
        assert!(!observer.resize(Viewport::new(50, 50)));
        engine.stop();
    }

    #[test]
    fn restart_builds_a_fresh_population() {
        let (mut engine, _) = counting_engine(6);
        engine.start(Viewport::new(200, 200)).unwrap();
        let first: Vec<_> = engine.blobs().iter().map(|b| b.origin()).collect();
        engine.stop();
        engine.start(Viewport::new(200, 200)).unwrap();
        let second: Vec<_> = engine.blobs().iter().map(|b| b.origin()).collect();
        assert_eq!(first.len(), second.len());
        assert_ne!(first, second);
    }
}
