use crate::error::{GlowError, GlowResult};

pub use kurbo::{Point, Rect, Vec2};

/// Timestamp on the tick driver's clock, in milliseconds.
pub type Millis = f64;

/// Largest surface edge the engine will allocate.
pub const MAX_SURFACE_DIM: u32 = 16_384;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(self) -> GlowResult<Self> {
        if self.width == 0 || self.height == 0 {
            return Err(GlowError::surface(format!(
                "viewport {}x{} has no drawable area",
                self.width, self.height
            )));
        }
        if self.width > MAX_SURFACE_DIM || self.height > MAX_SURFACE_DIM {
            return Err(GlowError::surface(format!(
                "viewport {}x{} exceeds the {MAX_SURFACE_DIM}px limit",
                self.width, self.height
            )));
        }
        Ok(self)
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub fn bounds(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}
