use std::f64::consts::TAU;

use crate::{
    core::{Millis, Point, Vec2, Viewport},
    rng::RandomSource,
};

pub const BASE_SIZE_MIN: f64 = 40.0;
pub const BASE_SIZE_SPAN: f64 = 120.0;
pub const SATURATION_MIN: f64 = 60.0;
pub const BRIGHTNESS_MIN: f64 = 30.0;
pub const TONE_SPAN: f64 = 20.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Blob {
    origin: Point,
    base_width: f64,
    base_height: f64,
    phase: f64,
    width_phase: f64,
    height_phase: f64,
    // radians per ms
    speed: f64,
    width_freq: f64,
    height_freq: f64,
    hue_offset: f64,
    saturation: f64,
    brightness: f64,

    pub(crate) drift: Vec2,
    pub(crate) drift_target: Vec2,
    pub(crate) last_reroll: Millis,
}

impl Blob {
    pub fn random(rng: &mut dyn RandomSource, viewport: Viewport) -> Self {
        let x = rng.unit() * f64::from(viewport.width);
        let y = rng.unit() * f64::from(viewport.height);
        let base_width = rng.range(BASE_SIZE_MIN, BASE_SIZE_MIN + BASE_SIZE_SPAN);
        let base_height = rng.range(BASE_SIZE_MIN, BASE_SIZE_MIN + BASE_SIZE_SPAN);
        let phase = rng.unit() * TAU;
        let speed = rng.range(0.0002, 0.0006);
        let hue_offset = rng.unit() * 360.0;
        let saturation = rng.range(SATURATION_MIN, SATURATION_MIN + TONE_SPAN);
        let brightness = rng.range(BRIGHTNESS_MIN, BRIGHTNESS_MIN + TONE_SPAN);
        let width_phase = rng.unit() * TAU;
        let height_phase = rng.unit() * TAU;
        let width_freq = rng.range(0.0001, 0.0003);
        let height_freq = rng.range(0.0002, 0.0004);

        Self {
            origin: Point::new(x, y),
            base_width,
            base_height,
            phase,
            width_phase,
            height_phase,
            speed,
            width_freq,
            height_freq,
            hue_offset,
            saturation,
            brightness,
            drift: Vec2::ZERO,
            drift_target: Vec2::ZERO,
            last_reroll: 0.0,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn center(&self) -> Point {
        self.origin + self.drift
    }

    pub fn base_width(&self) -> f64 {
        self.base_width
    }

    pub fn base_height(&self) -> f64 {
        self.base_height
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn width_phase(&self) -> f64 {
        self.width_phase
    }

    pub fn height_phase(&self) -> f64 {
        self.height_phase
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn width_freq(&self) -> f64 {
        self.width_freq
    }

    pub fn height_freq(&self) -> f64 {
        self.height_freq
    }

    pub fn hue_offset(&self) -> f64 {
        self.hue_offset
    }

    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn drift(&self) -> Vec2 {
        self.drift
    }

    pub fn drift_target(&self) -> Vec2 {
        self.drift_target
    }

    pub fn last_reroll(&self) -> Millis {
        self.last_reroll
    }
}

pub fn create_population(
    count: usize,
    viewport: Viewport,
    rng: &mut dyn RandomSource,
) -> Vec<Blob> {
    (0..count).map(|_| Blob::random(rng, viewport)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{SequenceSource, source_from_seed};

    #[test]
    fn population_has_requested_size_and_bounds() {
        let vp = Viewport::new(800, 600);
        let mut rng = source_from_seed(Some(42));
        let blobs = create_population(12, vp, &mut rng);
        assert_eq!(blobs.len(), 12);

        for b in &blobs {
            assert!((0.0..800.0).contains(&b.origin().x));
            assert!((0.0..600.0).contains(&b.origin().y));
            assert!((40.0..160.0).contains(&b.base_width()));
            assert!((40.0..160.0).contains(&b.base_height()));
            assert!((0.0..TAU).contains(&b.phase()));
            assert!((0.0..TAU).contains(&b.width_phase()));
            assert!((0.0..TAU).contains(&b.height_phase()));
            assert!((0.0002..0.0006).contains(&b.speed()));
            assert!((0.0001..0.0003).contains(&b.width_freq()));
            assert!((0.0002..0.0004).contains(&b.height_freq()));
            assert!((0.0..360.0).contains(&b.hue_offset()));
            assert!((60.0..80.0).contains(&b.saturation()));
            assert!((30.0..50.0).contains(&b.brightness()));
            assert_eq!(b.drift(), Vec2::ZERO);
            assert_eq!(b.drift_target(), Vec2::ZERO);
            assert_eq!(b.last_reroll(), 0.0);
        }
    }

    #[test]
    fn fields_follow_draw_order() {
        let vp = Viewport::new(100, 200);
        let mut rng = SequenceSource::new(vec![
            0.5, 0.25, 0.0, 0.5, 0.0, 0.5, 0.5, 0.0, 0.5, 0.25, 0.75, 0.5, 0.0,
        ]);
        let b = Blob::random(&mut rng, vp);
        assert_eq!(rng.draws(), 13);

        assert_eq!(b.origin(), Point::new(50.0, 50.0));
        assert_eq!(b.base_width(), 40.0);
        assert_eq!(b.base_height(), 100.0);
        assert_eq!(b.phase(), 0.0);
        assert!((b.speed() - 0.0004).abs() < 1e-15);
        assert_eq!(b.hue_offset(), 180.0);
        assert_eq!(b.saturation(), 60.0);
        assert_eq!(b.brightness(), 40.0);
        assert!((b.width_phase() - TAU * 0.25).abs() < 1e-12);
        assert!((b.height_phase() - TAU * 0.75).abs() < 1e-12);
        assert!((b.width_freq() - 0.0002).abs() < 1e-15);
        assert!((b.height_freq() - 0.0002).abs() < 1e-15);
    }

    #[test]
    fn zero_population_is_empty() {
        let mut rng = SequenceSource::constant(0.5);
        assert!(create_population(0, Viewport::new(10, 10), &mut rng).is_empty());
        assert_eq!(rng.draws(), 0);
    }
}
