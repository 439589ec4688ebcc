use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wordreel::capture::still::render_still;
use wordreel::encode::ffmpeg::is_ffmpeg_on_path;
use wordreel::render::text::load_caption_font;
use wordreel::{
    CpuSurface, JobState, JobStatus, RenderConfig, RenderRequest, RenderService, WordTimeline,
};

#[derive(Parser, Debug)]
#[command(name = "wordreel", version)]
struct Cli {
    /// TOML config file; defaults apply to missing keys.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Caption font (TTF/OTF), overriding the config.
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a word file into an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Run a JSON render request (`{"word_json": "...", "audio_url": "..."}`) as a job.
    Job(JobArgs),
    /// Render the caption scene after the first N words as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Word JSON: `{"words": [{"start", "end", "text", "is_hl"}, ...]}`.
    #[arg(long)]
    words: PathBuf,

    /// Audio track: http(s) URL or local path.
    #[arg(long)]
    audio: Option<String>,

    /// Output MP4 path; defaults to `<output_dir>/video-<id>.mp4`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Encode segments concurrently.
    #[arg(long)]
    parallel: bool,
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Request JSON file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Word JSON file.
    #[arg(long)]
    words: PathBuf,

    /// Number of words animated before the snapshot.
    #[arg(long, default_value_t = 1)]
    after: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => RenderConfig::from_toml_path(path)?,
        None => RenderConfig::default(),
    };
    if let Some(font) = cli.font.clone() {
        config.font_path = Some(font);
    }

    match cli.cmd {
        Command::Render(args) => cmd_render(config, args),
        Command::Job(args) => cmd_job(&config, &args.in_path),
        Command::Frame(args) => cmd_frame(&config, args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn require_ffmpeg() -> anyhow::Result<()> {
    if !is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg was not found on PATH; install it to render videos");
    }
    Ok(())
}

fn cmd_render(mut config: RenderConfig, args: RenderArgs) -> anyhow::Result<()> {
    require_ffmpeg()?;
    config.parallel_segments |= args.parallel;

    let timeline = WordTimeline::from_path(&args.words)?;
    let service = RenderService::from_config(&config)?;
    let handle = service.submit_timeline(timeline, args.audio, args.out)?;
    finish(handle.wait())
}

fn cmd_job(config: &RenderConfig, in_path: &Path) -> anyhow::Result<()> {
    require_ffmpeg()?;

    let raw = std::fs::read_to_string(in_path)
        .with_context(|| format!("read request '{}'", in_path.display()))?;
    let request: RenderRequest = serde_json::from_str(&raw).context("parse request JSON")?;

    let service = RenderService::from_config(config)?;
    let ack = service.submit(&request);
    println!("{}", serde_json::to_string(&ack)?);
    let Some(id) = ack.job_id else {
        anyhow::bail!(
            "request rejected: {}",
            ack.error.unwrap_or_else(|| "unknown reason".to_string())
        );
    };
    let handle = service
        .handle(id)
        .with_context(|| format!("job {id} vanished after submission"))?;
    let status = handle.wait();
    println!("{}", serde_json::to_string(&status)?);
    finish(status)
}

fn finish(status: JobStatus) -> anyhow::Result<()> {
    match (status.state, status.output, status.failure) {
        (JobState::Done, Some(out), _) => {
            eprintln!("wrote {}", out.display());
            Ok(())
        }
        (_, _, Some(failure)) => {
            anyhow::bail!("job {} failed ({:?}): {}", status.id, failure.kind, failure.message)
        }
        (state, _, _) => anyhow::bail!("job {} ended in unexpected state {state:?}", status.id),
    }
}

fn cmd_frame(config: &RenderConfig, args: FrameArgs) -> anyhow::Result<()> {
    let timeline = WordTimeline::from_path(&args.words)?;
    let opts = config.pipeline_opts()?;
    let font = load_caption_font(config.font_path.as_deref())?;
    let mut surface = CpuSurface::new(config.canvas(), opts.background, &font)?;

    render_still(
        &timeline,
        opts.animator,
        &mut surface,
        opts.background,
        args.after,
        &args.out,
    )?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
