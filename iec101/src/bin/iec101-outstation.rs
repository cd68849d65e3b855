use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use iec101::outstation::{run_drift, OutstationSession, PointStore};
use iec101::transport::shutdown_channel;
use iec101::{logging, RuntimeConfig, TransportArgs};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "iec101-outstation",
    about = "IEC 60870-5-101 outstation simulating a power measurement and limit"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "IEC101_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    transport: TransportArgs,

    /// Pause between interrogation reply frames in milliseconds
    #[arg(long)]
    scan_delay_ms: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut runtime =
        RuntimeConfig::load_or_default(cli.config.as_deref()).context("loading configuration")?;
    cli.transport.apply(&mut runtime.transport);
    if let Some(delay) = cli.scan_delay_ms {
        runtime.outstation.scan_delay_ms = delay;
    }
    let config = runtime.outstation.to_outstation_config()?;
    let store = PointStore::new(runtime.outstation.initial_state());

    info!(transport = ?runtime.transport, "waiting for master");
    let (mut reader, mut writer) = runtime
        .transport
        .open()
        .await
        .context("opening transport")?;

    let (trigger, shutdown) = shutdown_channel();
    let drift = tokio::spawn(run_drift(
        store.clone(),
        config.drift_period,
        trigger.subscribe(),
    ));
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            // Keep the trigger alive; dropping it would stop the session.
            warn!(error = %e, "failed to listen for interrupt");
            std::future::pending::<()>().await;
        }
        info!("interrupt received, shutting down");
        trigger.trigger();
    });

    let mut session = OutstationSession::new(config, store);
    let result = session.run(&mut reader, &mut writer, shutdown).await;
    drift.abort();
    result?;

    let stats = session.statistics();
    let points = session.store().snapshot();
    info!(
        received = stats.frames_received,
        rejected = stats.frames_rejected,
        power_drawn = points.power_drawn,
        power_limitation = points.power_limitation,
        "outstation stopped"
    );
    Ok(())
}
