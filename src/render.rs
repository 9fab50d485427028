use kurbo::{Ellipse, Shape as _};

use crate::{
    blob::Blob,
    color::Hsla,
    composite::quantize,
    config::EngineConfig,
    core::Point,
    motion::BlobFrame,
    surface::Surface,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlowStyle {
    pub inner_alpha: f64,
    pub outer_alpha: f64,
    pub hue_shift: f64,
}

impl Default for GlowStyle {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl GlowStyle {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            inner_alpha: cfg.inner_alpha,
            outer_alpha: cfg.outer_alpha,
            hue_shift: cfg.hue_shift,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialGlow {
    pub center: Point,
    pub radius: f64,
    pub inner: [f64; 4],
    pub outer: [f64; 4],
}

impl RadialGlow {
    /// The falloff radius is the blob's current width, whatever its height.
    pub fn for_blob(blob: &Blob, frame: &BlobFrame, style: &GlowStyle) -> Self {
        let inner = Hsla::new(frame.hue, blob.saturation(), blob.brightness(), style.inner_alpha);
        let outer = Hsla::new(
            (frame.hue + style.hue_shift).rem_euclid(360.0),
            blob.saturation(),
            blob.brightness(),
            style.outer_alpha,
        );
        Self {
            center: frame.center,
            radius: frame.width,
            inner: inner.to_rgba().premultiplied(),
            outer: outer.to_rgba().premultiplied(),
        }
    }

    pub fn color_at(&self, p: Point) -> [f64; 4] {
        let t = if self.radius > 0.0 {
            (p.distance(self.center) / self.radius).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let mut out = [0.0; 4];
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.inner[i] * (1.0 - t) + self.outer[i] * t;
        }
        out
    }
}

/// Fraction of the pixel centred at offset `(dx, dy)` that lies inside the axis-aligned ellipse
/// with half-axes `(a, b)`, using a one-pixel linear ramp across the edge.
fn ellipse_coverage(dx: f64, dy: f64, a: f64, b: f64) -> f64 {
    let nx = dx / a;
    let ny = dy / b;
    let f = nx * nx + ny * ny - 1.0;
    let gx = nx / a;
    let gy = ny / b;
    let grad = 2.0 * (gx * gx + gy * gy).sqrt();
    if grad <= f64::EPSILON {
        return if f <= 0.0 { 1.0 } else { 0.0 };
    }
    (0.5 - f / grad).clamp(0.0, 1.0)
}

/// Paints one blob as a soft ellipse of `frame.width × frame.height` at `frame.center`, blended
/// with the surface's current composite mode.
pub fn paint_blob(surface: &mut Surface, blob: &Blob, frame: &BlobFrame, style: &GlowStyle) {
    let a = frame.width / 2.0;
    let b = frame.height / 2.0;
    if !(a > 0.0 && b > 0.0) {
        return;
    }

    let glow = RadialGlow::for_blob(blob, frame, style);
    let ellipse = Ellipse::new(frame.center, (a, b), 0.0);
    let bbox = ellipse
        .bounding_box()
        .inflate(1.0, 1.0)
        .intersect(surface.viewport().bounds());
    if bbox.is_zero_area() {
        return;
    }

    let x0 = bbox.x0.floor().max(0.0) as u32;
    let y0 = bbox.y0.floor().max(0.0) as u32;
    let x1 = (bbox.x1.ceil() as u32).min(surface.width());
    let y1 = (bbox.y1.ceil() as u32).min(surface.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let coverage = ellipse_coverage(p.x - frame.center.x, p.y - frame.center.y, a, b);
            if coverage <= 0.0 {
                continue;
            }
            let c = glow.color_at(p).map(|v| v * coverage);
            let src = quantize(c);
            if src == [0; 4] {
                continue;
            }
            surface.blend_pixel(x, y, src);
        }
    }
}
