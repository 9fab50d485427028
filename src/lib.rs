#![forbid(unsafe_code)]

pub mod blob;
pub mod color;
pub mod composite;
pub mod config;
pub mod core;
pub mod encode_ffmpeg;
pub mod engine;
pub mod error;
pub mod frame_loop;
pub mod motion;
pub mod render;
pub mod rng;
pub mod surface;

pub use blob::{Blob, create_population};
pub use composite::CompositeMode;
pub use config::EngineConfig;
pub use crate::core::{Millis, Viewport};
pub use encode_ffmpeg::{FfmpegEncoder, Mp4Config, is_ffmpeg_on_path};
pub use engine::{Engine, EngineStats, Notifier, StopHandle, TickOutcome, ViewportHandle};
pub use error::{GlowError, GlowResult};
pub use frame_loop::{
    Clock, FixedStepClock, FnSink, FrameLoop, FrameSink, LoopOptions, LoopReport, MonotonicClock,
    NullSink, render_still,
};
pub use motion::{BlobFrame, MotionParams, advance};
pub use render::{GlowStyle, RadialGlow, paint_blob};
pub use rng::{RandomSource, RngSource, SequenceSource, source_from_seed};
pub use surface::{FrameRGBA, Surface};
