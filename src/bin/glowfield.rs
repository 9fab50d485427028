use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use glowfield::{
    EngineConfig, FfmpegEncoder, FixedStepClock, FrameLoop, LoopOptions, MonotonicClock, Mp4Config,
    NullSink, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "glowfield", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render an MP4 video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Run the live, paced animation loop headless and log its heartbeat.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Engine config JSON; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Random seed; overrides the config file and GLOWFIELD_SEED.
    #[arg(long)]
    seed: Option<u64>,

    /// Tick rate; overrides the config file and GLOWFIELD_FPS.
    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Animation time of the frame, in milliseconds.
    #[arg(long, default_value_t = 5000.0)]
    time_ms: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Stop after this many seconds; runs until interrupted when omitted.
    #[arg(long)]
    seconds: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn load_config(common: &CommonArgs) -> anyhow::Result<EngineConfig> {
    let cfg = match &common.config {
        Some(path) => EngineConfig::from_json_path(path)?,
        None => EngineConfig::default(),
    };
    let mut cfg = cfg.with_env_overrides();
    if common.seed.is_some() {
        cfg.seed = common.seed;
    }
    if let Some(fps) = common.fps {
        cfg.fps = fps;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn tick_budget(seconds: f64, fps: u32) -> anyhow::Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("seconds must be finite and >= 0 (got {seconds})");
    }
    Ok((seconds * f64::from(fps)).round() as u64)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let viewport = Viewport::new(args.common.width, args.common.height);

    let frame = glowfield::render_still(&cfg, viewport, args.time_ms)?.to_straight();

    ensure_parent(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let viewport = Viewport::new(args.common.width, args.common.height);
    let ticks = tick_budget(args.seconds, cfg.fps)?;

    let mut encoder = FfmpegEncoder::new(Mp4Config::new(&args.out, viewport, cfg.fps))?;
    let mut engine = glowfield::Engine::new(cfg.clone(), Box::new(|| {}))?;
    engine.start(viewport)?;

    let mut clock = FixedStepClock::new(cfg.frame_interval_ms());
    FrameLoop::new(LoopOptions::offline(cfg.fps, ticks))?.run(
        &mut engine,
        &mut clock,
        &mut encoder,
    )?;
    encoder.finish()?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.common)?;
    let viewport = Viewport::new(args.common.width, args.common.height);

    let mut beats = 0u64;
    let mut engine = glowfield::Engine::new(
        cfg.clone(),
        Box::new(move || {
            beats += 1;
            tracing::info!(beats, "animation changed");
        }),
    )?;
    engine.start(viewport)?;

    let opts = LoopOptions {
        max_ticks: args
            .seconds
            .map(|s| tick_budget(s, cfg.fps))
            .transpose()?,
        ..LoopOptions::paced(cfg.fps)
    };
    let mut clock = MonotonicClock::new();
    let report = FrameLoop::new(opts)?.run(&mut engine, &mut clock, &mut NullSink)?;

    let stats = engine.stats();
    eprintln!(
        "ran {} ticks, {} notifications, {} resizes",
        report.ticks, stats.notifications, stats.resizes
    );
    Ok(())
}
