//! Actuation Node - Main Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use actuator::{ActuatorRuntime, ActuatorState, PinSync, SharedActuator};
use anyhow::Context;
use api::{run_server, ActuatorSettings, AppState};
use clap::Parser;
use gpio::{OutputSink, SysfsGpio};
use metrics_exporter_prometheus::PrometheusBuilder;
use node_common::{init_logging, ShutdownSignal};
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "actuator-node", version, about = "Motor actuation node with heartbeat failsafe")]
struct Args {
    /// Settings file (TOML or JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:5000
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Run without GPIO; outputs are logged only
    #[arg(long)]
    no_gpio: bool,

    /// sysfs GPIO root
    #[arg(long, value_name = "DIR")]
    gpio_root: Option<PathBuf>,

    /// Log JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = ActuatorSettings::load(args.config.as_deref()).context("loading settings")?;
    if let Some(bind) = &args.bind {
        settings.server.bind = bind.clone();
    }
    if let Some(root) = &args.gpio_root {
        settings.gpio_root = root.display().to_string();
    }
    if args.json_logs {
        settings.logging.json = true;
    }
    settings.validate().context("validating settings")?;

    init_logging(&settings.logging);
    info!("=== Actuation Node v{} ===", env!("CARGO_PKG_VERSION"));

    let signal = ShutdownSignal::install().context("installing signal handlers")?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing metrics recorder")?;

    let pins = settings.actuator.pins.clone();
    let sink = if args.no_gpio {
        warn!("GPIO disabled, outputs will only be logged");
        OutputSink::Absent
    } else {
        let lines = SysfsGpio::open(std::path::Path::new(&settings.gpio_root), &pins.all())
            .context("acquiring motor lines")?;
        OutputSink::present(lines)
    };

    let actuator: SharedActuator = Arc::new(Mutex::new(ActuatorState::new(
        &settings.actuator,
        Instant::now().into_std(),
    )));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runtime = ActuatorRuntime::spawn(
        actuator.clone(),
        PinSync::new(pins, settings.actuator.failsafe_active_high, sink),
        &settings.actuator,
        shutdown_rx,
    );

    let state = Arc::new(AppState::new(actuator, Some(metrics)));
    let served = run_server(&settings.server, state, async move {
        let name = signal.wait().await;
        info!("{} received, shutting down", name);
    })
    .await;

    shutdown_tx.send_replace(true);
    runtime.join().await.context("stopping actuator runtime")?;

    served.context("serving API")?;
    Ok(())
}
