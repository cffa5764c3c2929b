use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcoder_core::{
    load_config, load_config_from_env, validate_config, AudioFormat, AudioPreset, Config,
    EngineCommand, Observers, Supervisor, TranscodeJob,
};

/// Transcode one media file through a supervised ffmpeg instance.
#[derive(Debug, Parser)]
#[command(name = "transcode")]
#[command(version)]
struct Args {
    /// File to transcode
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the result
    #[arg(short, long)]
    output: PathBuf,

    /// TOML configuration file (TRANSCODER_* env vars apply either way)
    #[arg(short, long, env = "TRANSCODER_CONFIG")]
    config: Option<PathBuf>,

    /// Target audio format; defaults to the output file's extension
    #[arg(short, long)]
    format: Option<AudioFormat>,

    /// VBR quality for lossy formats (lower is better)
    #[arg(short, long, conflicts_with = "bitrate")]
    quality: Option<u8>,

    /// Constant bitrate in kbit/s for lossy formats
    #[arg(short, long)]
    bitrate: Option<u32>,

    /// Abort and dispose the engine after this many seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Raw engine arguments replacing the preset. Refer to the staged files
    /// by their file names.
    #[arg(last = true)]
    raw: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_config_from_env().context("Failed to load config from environment")?,
    };
    if let Some(timeout) = args.timeout {
        config.supervisor.timeout_secs = Some(timeout);
    }
    validate_config(&config).context("Configuration validation failed")?;
    info!("Engine program: {}", config.engine.program);

    let input = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read input {:?}", args.input))?;
    let job = build_job(&args, input)?;

    let supervisor = build_supervisor(&config);
    let output = match config.supervisor.timeout_secs {
        Some(secs) => {
            supervisor
                .run_with_timeout(job, Duration::from_secs(secs))
                .await
        }
        None => supervisor.run(job).await,
    }
    .context("Transcode failed")?;

    tokio::fs::write(&args.output, &output)
        .await
        .with_context(|| format!("Failed to write output {:?}", args.output))?;
    info!("Wrote {} bytes to {:?}", output.len(), args.output);

    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_supervisor(config: &Config) -> Supervisor {
    let observers = Observers::new()
        .on_duration(|secs| info!("Input duration: {:.2}s", secs))
        .on_progress(|value| info!("Progress: {:.0}", value))
        .on_log(|stream, line| debug!(target: "engine", stream = %stream, "{}", line));
    Supervisor::from_config(config).with_observers(observers)
}

/// Builds the job: inputs and outputs are staged under their file names.
fn build_job(args: &Args, input: Vec<u8>) -> Result<TranscodeJob> {
    let input_name = file_name(&args.input)?;
    let output_name = file_name(&args.output)?;
    if input_name == output_name {
        bail!(
            "input and output share the file name {:?}; rename the output",
            input_name
        );
    }

    if !args.raw.is_empty() {
        let command = EngineCommand::new(args.raw.iter().cloned())?;
        return Ok(TranscodeJob::new(command, output_name).with_input(input_name, input));
    }

    let format = match args.format {
        Some(format) => format,
        None => {
            let extension = args
                .output
                .extension()
                .and_then(|ext| ext.to_str())
                .context("No --format given and the output has no extension")?;
            extension.parse::<AudioFormat>()?
        }
    };

    let mut preset = AudioPreset::new(format);
    if let Some(quality) = args.quality {
        preset = preset.with_quality(quality);
    }
    if let Some(kbps) = args.bitrate {
        preset = preset.with_bitrate(kbps);
    }

    Ok(preset.job(&input_name, input, &output_name)?)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("{:?} has no usable file name", path))
}
