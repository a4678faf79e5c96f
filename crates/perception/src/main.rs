//! Perception Node - Main Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gpio::{OutputSink, SysfsGpio, DEFAULT_SYSFS_ROOT};
use node_common::{init_logging, ShutdownSignal};
use perception::{
    FrameLoop, MotionCache, MotionClient, MotionPoller, PerceptionPipeline, PerceptionSettings,
};
use tokio::sync::watch;
use tracing::{info, warn};
use vision::{CameraSource, CaptureWorker, FrameSource, ImageDirSource, RedBlobClassifier, SceneClassifier, ScriptedClassifier};

#[derive(Debug, Parser)]
#[command(name = "perception-node", version, about = "Stop-sign and red-light perception node")]
struct Args {
    /// Settings file (TOML or JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Live camera device index (needs the `camera` feature)
    #[arg(long, value_name = "INDEX", conflicts_with = "frames", required_unless_present = "frames")]
    camera: Option<i32>,

    /// Directory of recorded frames to replay instead of a camera
    #[arg(long, value_name = "DIR")]
    frames: Option<PathBuf>,

    /// Replay the frame directory forever
    #[arg(long = "loop", requires = "frames")]
    loop_frames: bool,

    /// Pre-recorded detections, one JSON object per line
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Derive the red candidate from frame pixels
    #[arg(long)]
    red_blob: bool,

    /// Run without GPIO; outputs are logged only
    #[arg(long)]
    no_gpio: bool,

    /// sysfs GPIO root
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SYSFS_ROOT)]
    gpio_root: PathBuf,

    /// Base URL of the actuation node
    #[arg(long, value_name = "URL")]
    status_url: Option<String>,

    /// Skip the motion query and treat the robot as always moving
    #[arg(long)]
    assume_moving: bool,

    /// Log JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = PerceptionSettings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(url) = &args.status_url {
        settings.status.url = url.clone();
    }
    if args.json_logs {
        settings.logging.json = true;
    }
    settings.validate().context("validating settings")?;

    init_logging(&settings.logging);
    info!("=== Perception Node v{} ===", env!("CARGO_PKG_VERSION"));

    let signal = ShutdownSignal::install().context("installing signal handlers")?;

    let scripted = match &args.script {
        Some(path) => ScriptedClassifier::from_path(path).context("loading detection script")?,
        None => ScriptedClassifier::default(),
    };
    let classifier: Box<dyn SceneClassifier> = if args.red_blob {
        Box::new(RedBlobClassifier::new(settings.red_blob.clone(), Box::new(scripted)))
    } else {
        Box::new(scripted)
    };

    let sink = if args.no_gpio {
        warn!("GPIO disabled, outputs will only be logged");
        OutputSink::Absent
    } else {
        let lines = SysfsGpio::open(&args.gpio_root, &[settings.outputs.stop, settings.outputs.red])
            .context("acquiring output lines")?;
        OutputSink::present(lines)
    };
    let pipeline = PerceptionPipeline::new(&settings.detection, settings.outputs.clone(), sink)?;

    let source: Box<dyn FrameSource> = match (&args.frames, args.camera) {
        (Some(dir), _) => Box::new(
            ImageDirSource::open(dir, &settings.capture, args.loop_frames).context("opening frame directory")?,
        ),
        (None, index) => {
            let index = index.unwrap_or(0);
            Box::new(CameraSource::open(index, &settings.capture).context("opening camera")?)
        }
    };
    let mut capture = CaptureWorker::spawn(source, settings.capture.fps)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let (motion, poller) = if args.assume_moving {
        (MotionCache::constant(true), None)
    } else {
        let client = MotionClient::new(&settings.status.url, settings.status.timeout())?;
        let poller = MotionPoller::spawn(client, settings.status.poll_interval(), shutdown_rx.clone());
        (poller.cache(), Some(poller))
    };

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let name = signal.wait().await;
        info!("{} received, shutting down", name);
        signal_tx.send_replace(true);
    });

    let frame_loop = FrameLoop::new(capture.frames(), classifier, pipeline, motion, settings.loop_period());
    let result = frame_loop.run(shutdown_rx).await;

    shutdown_tx.send_replace(true);
    if let Some(poller) = poller {
        poller.join().await;
    }
    capture.stop();

    let summary = result?;
    info!("Processed {} frames, {} events", summary.frames, summary.events);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_source_flags() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["perception-node", "--camera", "2"]).unwrap();
        assert_eq!(args.camera, Some(2));
        assert!(args.frames.is_none());

        let args = Args::try_parse_from(["perception-node", "--frames", "recorded", "--loop"]).unwrap();
        assert_eq!(args.frames, Some(PathBuf::from("recorded")));
        assert!(args.camera.is_none());

        assert!(Args::try_parse_from(["perception-node", "--camera", "0", "--frames", "recorded"]).is_err());
        assert!(Args::try_parse_from(["perception-node"]).is_err());
        assert!(Args::try_parse_from(["perception-node", "--camera", "0", "--loop"]).is_err());
    }
}
