// THEORY:
// `hand_vision` replays a directory of depth images through a `TrackingPipeline`.
// Each image is one frame, taken in file-name order; any greyscale or colour image
// works, and its luma channel is used as depth.
//
// Decoding is blocking work, so a reader task on tokio's blocking pool decodes frames
// and feeds them through a bounded channel. The main task owns the pipeline and
// processes frames strictly in order, logging every event it emits.

use anyhow::{Context, Result, bail};
use clap::Parser;
use hand_vision::pipeline::{CanvasConfig, DepthFrame, PipelineConfig, Report, TrackingEvent, TrackingPipeline};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const FRAME_QUEUE_DEPTH: usize = 8;
const FRAME_EXTENSIONS: [&str; 6] = ["png", "pgm", "bmp", "jpg", "jpeg", "tiff"];

#[derive(Debug, Parser)]
#[command(name = "hand_vision", version, about = "Track hands and gestures in a sequence of depth images")]
struct Cli {
    /// Directory holding one depth image per frame.
    frames_dir: PathBuf,

    /// JSON pipeline configuration; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Track every hand of comparable size instead of the largest one.
    #[arg(long)]
    multi: bool,

    /// Emit handmove events on a canvas of this width.
    #[arg(long, requires = "canvas_height")]
    canvas_width: Option<f64>,

    #[arg(long, requires = "canvas_width")]
    canvas_height: Option<f64>,

    /// Do not mirror handmove x coordinates.
    #[arg(long)]
    no_mirror: bool,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => PipelineConfig::default(),
        };

        if self.multi {
            config.tracker.multi_candidate = true;
        }
        if let (Some(width), Some(height)) = (self.canvas_width, self.canvas_height) {
            let base = config.canvas.unwrap_or_default();
            config.canvas = Some(CanvasConfig { width, height, ..base });
        }
        if self.no_mirror {
            if let Some(canvas) = config.canvas.as_mut() {
                canvas.mirror_x = false;
            }
        }
        Ok(config)
    }
}

fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_frame(path: &Path) -> Result<DepthFrame> {
    let image = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_luma8();
    Ok(DepthFrame::from(&image))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = cli.pipeline_config()?;
    let mut pipeline = TrackingPipeline::new(config).context("invalid pipeline configuration")?;

    let paths = frame_paths(&cli.frames_dir)?;
    if paths.is_empty() {
        bail!("no frames found in {}", cli.frames_dir.display());
    }
    info!(frames = paths.len(), dir = %cli.frames_dir.display(), "replaying depth frames");

    pipeline.subscribe(|event| match event {
        TrackingEvent::HandMove(m) => debug!(x = m.x, y = m.y, "handmove"),
        TrackingEvent::Gesture(g) => info!(gesture = %g.kind, frame = g.frame, "event"),
    });

    let (tx, mut rx) = mpsc::channel::<(PathBuf, DepthFrame)>(FRAME_QUEUE_DEPTH);
    let reader = tokio::task::spawn_blocking(move || -> Result<()> {
        for path in paths {
            let frame = match load_frame(&path) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "skipping frame");
                    continue;
                }
            };
            if tx.blocking_send((path, frame)).is_err() {
                // Receiver gone; nothing left to do.
                break;
            }
        }
        Ok(())
    });

    let mut detected = 0u64;
    let mut gestures = 0usize;
    while let Some((path, frame)) = rx.recv().await {
        match pipeline.process_frame(&frame) {
            Report::NoCandidate => {
                debug!(frame = %path.display(), "no hand");
            }
            Report::Detected(report) => {
                detected += 1;
                gestures += report.gestures.len();
                let fingers: Vec<usize> = report.candidates.iter().map(|c| c.fingers.len()).collect();
                debug!(frame = %path.display(), ?fingers, "hand detected");
            }
        }
    }

    reader.await.context("frame reader panicked")??;
    info!(
        frames = pipeline.recognizer().frames_seen(),
        detected, gestures, "replay finished"
    );
    Ok(())
}
