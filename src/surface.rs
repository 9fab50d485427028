use crate::{
    color::Rgba,
    composite::{CompositeMode, PremulRgba8, fill_over_in_place, quantize},
    core::Viewport,
    error::{GlowError, GlowResult},
};

#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn to_straight(&self) -> FrameRGBA {
        if !self.premultiplied {
            return self.clone();
        }
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 {
                px[..3].fill(0);
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        FrameRGBA {
            width: self.width,
            height: self.height,
            data,
            premultiplied: false,
        }
    }
}

pub struct Surface {
    viewport: Viewport,
    data: Vec<u8>,
    mode: CompositeMode,
}

impl Surface {
    pub fn new(viewport: Viewport) -> GlowResult<Self> {
        let viewport = viewport.validate()?;
        let len = viewport
            .pixel_count()
            .checked_mul(4)
            .ok_or_else(|| GlowError::surface("surface buffer size overflow"))?;
        Ok(Self {
            viewport,
            data: vec![0u8; len],
            mode: CompositeMode::SourceOver,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn width(&self) -> u32 {
        self.viewport.width
    }

    pub fn height(&self) -> u32 {
        self.viewport.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reallocates to `viewport`, leaving a transparent surface. A rejected size keeps the old
    /// buffer intact.
    pub fn resize(&mut self, viewport: Viewport) -> GlowResult<()> {
        let fresh = Self::new(viewport)?;
        self.viewport = fresh.viewport;
        self.data = fresh.data;
        Ok(())
    }

    pub fn composite_mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn set_composite_mode(&mut self, mode: CompositeMode) {
        self.mode = mode;
    }

    pub fn fill(&mut self, color: Rgba) {
        let src = quantize(color.premultiplied());
        if self.mode == CompositeMode::SourceOver {
            fill_over_in_place(&mut self.data, src);
            return;
        }
        for d in self.data.chunks_exact_mut(4) {
            let out = self.mode.blend([d[0], d[1], d[2], d[3]], src);
            d.copy_from_slice(&out);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<PremulRgba8> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let idx = self.index(x, y);
        Some([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    pub fn blend_pixel(&mut self, x: u32, y: u32, src: PremulRgba8) {
        let Some(dst) = self.pixel(x, y) else {
            return;
        };
        let out = self.mode.blend(dst, src);
        let idx = self.index(x, y);
        self.data[idx..idx + 4].copy_from_slice(&out);
    }

    pub fn snapshot(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.width(),
            height: self.height(),
            data: self.data.clone(),
            premultiplied: true,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width() as usize) + (x as usize)) * 4
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("viewport", &self.viewport)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
