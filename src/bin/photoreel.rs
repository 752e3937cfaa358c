use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

use photoreel::{
    Canvas, CaptionFont, CaptionSchedule, CaptureOutcome, Container, FfmpegEncoder,
    FixedStepClock, FontSource, Fps, FrameClock, FrameRenderer, RealtimeClock, RenderSession,
    SourceImage, StopHandle, StudioConfig, Surface,
};

#[derive(Parser, Debug)]
#[command(name = "photoreel", version)]
struct Cli {
    /// Studio config JSON. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Caption font file (TTF/OTF/TTC). Defaults to a system sans-serif.
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Print the resolved caption font (family name + SHA-256 of font bytes).
    #[arg(long, global = true)]
    dump_fonts: bool,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the generated script, one line per caption.
    Script(ScriptArgs),
    /// Print the caption schedule.
    Captions(CaptionsArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the full reel (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct ScriptArgs {
    #[arg(long, default_value = "")]
    topic: String,
}

#[derive(Args, Debug)]
struct CaptionsArgs {
    #[arg(long, default_value = "")]
    topic: String,

    /// Reel length, e.g. `12s`, `18s`, `24s` or `1500ms`.
    #[arg(long, value_parser = parse_duration)]
    duration: Option<u64>,

    /// Emit JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Source photo. Without one only background and captions are drawn.
    #[arg(long)]
    image: Option<PathBuf>,

    #[arg(long, default_value = "")]
    topic: String,

    #[arg(long, value_parser = parse_duration)]
    duration: Option<u64>,

    /// Timestamp of the frame in milliseconds.
    #[arg(long, default_value_t = 0)]
    at_ms: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long)]
    image: PathBuf,

    #[arg(long, default_value = "")]
    topic: String,

    #[arg(long, value_parser = parse_duration)]
    duration: Option<u64>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long, value_enum)]
    container: Option<ContainerChoice>,

    /// Output path. Defaults to `video.webm` / `video.mp4`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pace frames by the wall clock; press Enter to cancel.
    #[arg(long)]
    realtime: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContainerChoice {
    Webm,
    Mp4,
}

impl From<ContainerChoice> for Container {
    fn from(c: ContainerChoice) -> Self {
        match c {
            ContainerChoice::Webm => Container::Webm,
            ContainerChoice::Mp4 => Container::Mp4,
        }
    }
}

fn parse_duration(s: &str) -> Result<u64, String> {
    photoreel::parse_duration_ms(s).map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = match &cli.config {
        Some(path) => StudioConfig::from_path(path)?,
        None => StudioConfig::default(),
    };
    if let Some(font) = &cli.font {
        cfg.font = FontSource::File(font.clone());
    }

    match cli.cmd {
        Command::Script(args) => cmd_script(args),
        Command::Captions(args) => cmd_captions(args, &cfg),
        Command::Frame(args) => cmd_frame(args, &cfg, cli.dump_fonts),
        Command::Render(args) => cmd_render(args, cfg, cli.dump_fonts),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_script(args: ScriptArgs) -> anyhow::Result<()> {
    for line in photoreel::generate_script(&args.topic) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_captions(args: CaptionsArgs, cfg: &StudioConfig) -> anyhow::Result<()> {
    let duration_ms = args.duration.unwrap_or(cfg.duration_ms);
    let schedule = CaptionSchedule::for_topic(&args.topic, duration_ms)?;
    if args.json {
        let json = serde_json::to_string_pretty(schedule.captions())
            .context("serialize caption schedule")?;
        println!("{json}");
        return Ok(());
    }
    for c in schedule.captions() {
        println!("{:>6} {:>6}  {}", c.start_ms, c.end_ms, c.text);
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs, cfg: &StudioConfig, dump_fonts: bool) -> anyhow::Result<()> {
    let font = load_font(&cfg.font, dump_fonts)?;
    let image = args.image.as_deref().map(SourceImage::from_path).transpose()?;
    let schedule =
        CaptionSchedule::for_topic(&args.topic, args.duration.unwrap_or(cfg.duration_ms))?;

    let mut renderer = FrameRenderer::new(Canvas::VERTICAL_HD, &font)?;
    let frame = renderer.render_to_frame(image.as_ref(), args.at_ms, &schedule)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
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

fn cmd_render(args: RenderArgs, mut cfg: StudioConfig, dump_fonts: bool) -> anyhow::Result<()> {
    if let Some(ms) = args.duration {
        cfg.duration_ms = ms;
    }
    if let Some(fps) = args.fps {
        cfg.fps = Fps::new(fps)?;
    }
    if let Some(c) = args.container {
        cfg.container = c.into();
    }
    cfg.validate()?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("video.{}", cfg.container.extension())));
    if !cfg.overwrite && out.exists() {
        anyhow::bail!("output file '{}' already exists", out.display());
    }

    let font = load_font(&cfg.font, dump_fonts)?;
    let image = SourceImage::from_path(&args.image)?;
    let mut session = RenderSession::new(&args.topic, cfg.duration_ms)?
        .with_fps(cfg.fps)
        .with_container(cfg.container)
        .with_image(image);

    let canvas = Canvas::VERTICAL_HD;
    let mut renderer = FrameRenderer::new(canvas, &font)?;
    let mut surface = Surface::new(canvas)?;
    let mut encoder = FfmpegEncoder::new();
    let stop = StopHandle::new();

    let mut clock: Box<dyn FrameClock> = if args.realtime {
        spawn_enter_to_stop(stop.clone());
        eprintln!("recording in real time, press Enter to cancel");
        Box::new(RealtimeClock::new(cfg.fps))
    } else {
        Box::new(FixedStepClock::new(cfg.fps))
    };

    let outcome = session.start_capture(
        Some(&mut surface),
        &mut renderer,
        &mut encoder,
        clock.as_mut(),
        &stop,
    )?;

    match outcome {
        CaptureOutcome::Completed { frames } => {
            let artifact = session
                .take_artifact()
                .context("capture completed without an artifact")?;
            artifact.write_to(&out)?;
            eprintln!(
                "wrote {} ({frames} frames, {}, {} bytes)",
                out.display(),
                artifact.media_type,
                artifact.len()
            );
        }
        CaptureOutcome::Cancelled { frames } => {
            eprintln!("cancelled after {frames} frames; nothing written");
        }
    }
    Ok(())
}

fn load_font(source: &FontSource, dump: bool) -> anyhow::Result<CaptionFont> {
    let font = CaptionFont::resolve(source)?;
    if dump {
        eprintln!("caption font:");
        eprintln!("  source: {}", describe_source(source));
        eprintln!("  family: {}", font.family);
        eprintln!("  sha256: {}", font.sha256_hex());
    }
    Ok(font)
}

fn describe_source(source: &FontSource) -> String {
    match source {
        FontSource::System => "system".to_string(),
        FontSource::File(path) => path.display().to_string(),
    }
}

fn spawn_enter_to_stop(stop: StopHandle) {
    std::thread::spawn(move || {
        let mut line = String::new();
        // EOF (0 bytes) means no terminal is attached; keep recording.
        if matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0) {
            stop.stop();
        }
    });
}
