use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use reel_compositor::{
    assets::{AssetLoader, VisualAsset},
    audio::AudioProbe,
    config::Config,
    export::{export, CancellationToken, ExportCoordinator, ExportOutcome, ExportState, PngSequenceSink},
    filters::FilterRegistry,
    timeline::{Timeline, Transition, TransitionKind},
    transform::TransformParams,
};

#[derive(Parser)]
#[command(
    name = "reel-compositor",
    version,
    about = "Turn a folder of images and a soundtrack into a transition-blended frame sequence",
    long_about = "Reel-Compositor lays out still images as a slideshow matching the length of an audio track, applies an optional filter and transition, and writes the composited frames as a numbered PNG sequence with a manifest."
)]
struct Cli {
    /// Directory containing the images (png, jpg, bmp); `NN_name` prefixes set the order
    #[arg(short, long)]
    images: PathBuf,

    /// Audio file whose length the slideshow should match (WAV, MP3, FLAC, OGG, M4A)
    #[arg(short, long, conflicts_with = "duration")]
    audio: Option<PathBuf>,

    /// Total length in seconds, instead of an audio file
    #[arg(short, long)]
    duration: Option<f64>,

    /// Output directory for the frame sequence (must not exist)
    #[arg(short, long)]
    output: PathBuf,

    /// Filter applied to every image (see `--filter list`)
    #[arg(short, long)]
    filter: Option<String>,

    /// Transition between images (none, fade, slide-left, zoom-in, ...)
    #[arg(short, long)]
    transition: Option<String>,

    /// Container tag recorded in the manifest (mp4, mov, avi, webm)
    #[arg(long)]
    format: Option<String>,

    /// Output quality (4k, 1080p, 720p, 480p)
    #[arg(short, long)]
    quality: Option<String>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Reel-Compositor v{}", env!("CARGO_PKG_VERSION"));

    let registry = FilterRegistry::new();
    if cli.filter.as_deref() == Some("list") {
        for name in registry.available_filters() {
            println!("{}", name);
        }
        return Ok(());
    }

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;

    let filter = match &cli.filter {
        Some(name) => Some(
            registry
                .get_filter(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown filter: {} (try --filter list)", name))?,
        ),
        None => None,
    };

    let transition = match &cli.transition {
        Some(name) => {
            let kind: TransitionKind = name.parse().map_err(anyhow::Error::msg)?;
            Transition::new(kind, config.timeline.transition_duration)
        }
        None => config.timeline.transition(),
    };

    let mut profile = config.export_profile();
    if let Some(format) = &cli.format {
        profile.format = format.parse().map_err(anyhow::Error::msg)?;
    }
    if let Some(quality) = &cli.quality {
        profile.quality = quality.parse().map_err(anyhow::Error::msg)?;
    }

    info!("Images: {:?}", cli.images);
    info!("Output: {:?}", cli.output);
    info!("Profile: {}", profile);

    let assets = AssetLoader::load_directory(&cli.images)?;

    let target = match (&cli.audio, cli.duration) {
        (Some(audio), _) => {
            let seconds = AudioProbe::duration(audio)?;
            info!("Audio {:?} runs {:.2}s", audio, seconds);
            Some(seconds)
        }
        (None, Some(seconds)) => Some(seconds),
        (None, None) => None,
    };

    let mut timeline = match target {
        Some(seconds) => Timeline::slideshow(&assets, seconds, transition)?,
        None => sequence_at_default_duration(&assets, &config, transition)?,
    }
    .with_reorder_policy(config.timeline.reorder_policy);

    if let Some(filter) = filter {
        info!("Applying {} filter", filter.name());
        let ids: Vec<_> = timeline.items().iter().map(|item| item.id).collect();
        for id in ids {
            timeline.set_params(id, TransformParams::identity().with_filter(filter))?;
        }
    }

    info!(
        "Timeline: {} items over {:.2}s with {} transitions",
        timeline.len(),
        timeline.target_duration(),
        transition.kind
    );

    // Ctrl-C stops the export between frames
    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling export...");
            signal_token.cancel();
        }
    });

    let coordinator = ExportCoordinator::from_config(&config);
    let sink = PngSequenceSink::new(&cli.output);
    let mut session = export(coordinator, timeline, profile, sink, token);

    let mut reported = -1i64;
    while let Some(progress) = session.progress.recv().await {
        let decile = (progress.percent / 10.0).floor() as i64;
        if progress.state == ExportState::Rendering && decile > reported {
            reported = decile;
            info!(
                "Rendering: {:.0}% ({}/{} frames)",
                progress.percent, progress.frame, progress.total_frames
            );
        }
    }

    match session.wait().await {
        Ok(ExportOutcome::Completed(artifact)) => {
            info!("Export complete! Frames saved to: {}", artifact);
            if let Some(location) = artifact.location {
                println!("{}", location.display());
            }
        }
        Ok(ExportOutcome::Cancelled { progress }) => {
            warn!(
                "Export cancelled at frame {}/{}; nothing was written to {:?}",
                progress.frame, progress.total_frames, cli.output
            );
        }
        Err(e) => return Err(anyhow::anyhow!(e.user_message())),
    }

    Ok(())
}

/// Without a target length every image stays on screen for the configured default duration
fn sequence_at_default_duration(
    assets: &[Arc<VisualAsset>],
    config: &Config,
    transition: Transition,
) -> reel_compositor::Result<Timeline> {
    let mut timeline = Timeline::new();
    for (index, asset) in assets.iter().enumerate() {
        let incoming = if index == 0 { Transition::none() } else { transition };
        timeline.append(Arc::clone(asset), config.timeline.default_image_duration, incoming)?;
    }
    Ok(timeline)
}
