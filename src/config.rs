use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::error::{GlowError, GlowResult};

/// Tunables for one engine instance. Defaults reproduce the stock animation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub population: usize,
    /// A blob's drift target is re-rolled once this much time has passed since the last re-roll.
    pub drift_reroll_ms: f64,
    /// Drift targets are drawn from `[-drift_range, drift_range]` on each axis.
    pub drift_range: f64,
    pub drift_easing: f64,
    /// Minimum spacing between "animation changed" notifications.
    pub change_interval_ms: f64,
    pub trail_alpha: f64,
    /// Hue rotation in degrees per millisecond.
    pub hue_rate: f64,
    /// Hue offset of the outer gradient stop, in degrees.
    pub hue_shift: f64,
    pub inner_alpha: f64,
    pub outer_alpha: f64,
    pub fps: u32,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            population: 12,
            drift_reroll_ms: 3000.0,
            drift_range: 15.0,
            drift_easing: 0.002,
            change_interval_ms: 5000.0,
            trail_alpha: 0.15,
            hue_rate: 0.01,
            hue_shift: 30.0,
            inner_alpha: 0.15,
            outer_alpha: 0.02,
            fps: 60,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_path(path: &Path) -> GlowResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open engine config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse engine config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Applies `GLOWFIELD_SEED` and `GLOWFIELD_FPS` when they parse; malformed values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(seed) = std::env::var("GLOWFIELD_SEED")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.seed = Some(seed);
        }
        if let Some(fps) = std::env::var("GLOWFIELD_FPS")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.fps = fps;
        }
        self
    }

    pub fn validate(&self) -> GlowResult<()> {
        if self.population == 0 {
            return Err(GlowError::validation("population must be > 0"));
        }
        if self.fps == 0 {
            return Err(GlowError::validation("fps must be > 0"));
        }

        let non_negative = [
            ("drift_reroll_ms", self.drift_reroll_ms),
            ("drift_range", self.drift_range),
            ("change_interval_ms", self.change_interval_ms),
            ("hue_rate", self.hue_rate),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(GlowError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }

        if !self.hue_shift.is_finite() {
            return Err(GlowError::validation("hue_shift must be finite"));
        }
        if !(self.drift_easing > 0.0 && self.drift_easing <= 1.0) {
            return Err(GlowError::validation("drift_easing must be in (0, 1]"));
        }

        let alphas = [
            ("trail_alpha", self.trail_alpha),
            ("inner_alpha", self.inner_alpha),
            ("outer_alpha", self.outer_alpha),
        ];
        for (name, v) in alphas {
            if !(0.0..=1.0).contains(&v) {
                return Err(GlowError::validation(format!("{name} must be in [0, 1]")));
            }
        }
        Ok(())
    }

    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps.max(1))
    }
}
