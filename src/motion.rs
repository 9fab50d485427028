use crate::{
    blob::Blob,
    config::EngineConfig,
    core::{Millis, Point, Vec2},
    rng::RandomSource,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionParams {
    pub reroll_ms: f64,
    pub drift_range: f64,
    pub easing: f64,
    pub hue_rate: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl MotionParams {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            reroll_ms: cfg.drift_reroll_ms,
            drift_range: cfg.drift_range,
            easing: cfg.drift_easing,
            hue_rate: cfg.hue_rate,
        }
    }
}

/// Derived, per-tick render parameters. Never stored on the blob.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobFrame {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub hue: f64,
}

fn wave(t: Millis, freq: f64, phase: f64, amp: f64, mid: f64) -> f64 {
    (t * freq + phase).sin() * amp + mid
}

pub fn advance(
    blob: &mut Blob,
    t: Millis,
    params: &MotionParams,
    rng: &mut dyn RandomSource,
) -> BlobFrame {
    if t - blob.last_reroll > params.reroll_ms {
        let span = params.drift_range * 2.0;
        blob.drift_target = Vec2::new((rng.unit() - 0.5) * span, (rng.unit() - 0.5) * span);
        blob.last_reroll = t;
        tracing::trace!(drift_target = ?blob.drift_target, t, "drift target re-rolled");
    }

    blob.drift += (blob.drift_target - blob.drift) * params.easing;

    let width_scale = wave(t, blob.width_freq(), blob.width_phase(), 0.2, 0.8);
    let height_scale = wave(t, blob.height_freq(), blob.height_phase(), 0.2, 0.8);
    let base_scale = wave(t, blob.speed(), blob.phase(), 0.15, 0.85);

    BlobFrame {
        center: blob.center(),
        width: blob.base_width() * width_scale * base_scale,
        height: blob.base_height() * height_scale * base_scale,
        hue: hue_at(t, blob.hue_offset(), params.hue_rate),
    }
}

pub fn hue_at(t: Millis, offset: f64, rate: f64) -> f64 {
    let h = (t * rate + offset).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if h >= 360.0 { 0.0 } else { h }
}
