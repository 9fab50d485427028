use std::{
    io::Write as _,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use anyhow::Context as _;

use crate::{
    core::{Millis, Viewport},
    error::{GlowError, GlowResult},
    frame_loop::FrameSink,
    surface::Surface,
};

#[derive(Clone, Debug)]
pub struct Mp4Config {
    pub viewport: Viewport,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
    pub background: [u8; 3],
}

impl Mp4Config {
    pub fn new(out_path: impl Into<PathBuf>, viewport: Viewport, fps: u32) -> Self {
        Self {
            viewport,
            fps,
            out_path: out_path.into(),
            overwrite: true,
            background: [0, 0, 0],
        }
    }

    pub fn validate(&self) -> GlowResult<()> {
        self.viewport.validate()?;
        if self.fps == 0 {
            return Err(GlowError::validation("encode fps must be non-zero"));
        }
        // yuv420p subsamples chroma 2x2.
        if !self.viewport.width.is_multiple_of(2) || !self.viewport.height.is_multiple_of(2) {
            return Err(GlowError::validation(
                "encode width/height must be even for yuv420p output",
            ));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

fn ensure_parent_dir(path: &Path) -> GlowResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

pub struct FfmpegEncoder {
    cfg: Mp4Config,
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
    frames: u64,
}

impl FfmpegEncoder {
    pub fn new(cfg: Mp4Config) -> GlowResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(GlowError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(GlowError::encode("ffmpeg was not found on PATH"));
        }

        let size = format!("{}x{}", cfg.viewport.width, cfg.viewport.height);
        let rate = cfg.fps.to_string();
        let mut child = Command::new("ffmpeg")
            .arg(if cfg.overwrite { "-y" } else { "-n" })
            .args(["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", size.as_str(), "-r", rate.as_str(), "-i", "pipe:0", "-an"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .arg(&cfg.out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GlowError::encode(format!("spawn ffmpeg: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GlowError::encode("ffmpeg stdin unavailable"))?;

        tracing::debug!(out = %cfg.out_path.display(), %size, fps = cfg.fps, "ffmpeg started");
        Ok(Self {
            scratch: vec![0u8; cfg.viewport.pixel_count() * 4],
            cfg,
            child,
            stdin: Some(stdin),
            frames: 0,
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn encode_surface(&mut self, surface: &Surface) -> GlowResult<()> {
        if surface.viewport() != self.cfg.viewport {
            return Err(GlowError::validation(format!(
                "frame is {}x{} but the encoder was opened at {}x{}",
                surface.width(),
                surface.height(),
                self.cfg.viewport.width,
                self.cfg.viewport.height
            )));
        }
        flatten_premul_onto(&mut self.scratch, surface.data(), self.cfg.background)?;

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| GlowError::encode("encoder already finished"))?;
        stdin
            .write_all(&self.scratch)
            .map_err(|e| GlowError::encode(format!("write frame to ffmpeg: {e}")))?;
        self.frames += 1;
        Ok(())
    }

    pub fn finish(mut self) -> GlowResult<()> {
        drop(self.stdin.take());
        let output = self
            .child
            .wait_with_output()
            .map_err(|e| GlowError::encode(format!("wait for ffmpeg: {e}")))?;
        if !output.status.success() {
            return Err(GlowError::encode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        tracing::info!(out = %self.cfg.out_path.display(), frames = self.frames, "mp4 written");
        Ok(())
    }
}

impl FrameSink for FfmpegEncoder {
    fn consume(&mut self, surface: &Surface, _t: Millis) -> GlowResult<()> {
        self.encode_surface(surface)
    }
}

fn flatten_premul_onto(dst: &mut [u8], src: &[u8], bg: [u8; 3]) -> GlowResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(GlowError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let inv = 255 - u32::from(s[3]);
        for i in 0..3 {
            let under = (u32::from(bg[i]) * inv + 127) / 255;
            d[i] = (u32::from(s[i]) + under).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}
