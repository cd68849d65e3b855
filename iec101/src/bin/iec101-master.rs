use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use iec101::master::MasterSession;
use iec101::transport::shutdown_channel;
use iec101::{logging, RuntimeConfig, TransportArgs};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "iec101-master",
    about = "IEC 60870-5-101 master: link reset, interrogation and periodic setpoints"
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "IEC101_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    transport: TransportArgs,

    /// Link address of the outstation
    #[arg(long)]
    link_address: Option<u16>,

    /// Common address of ASDU
    #[arg(long)]
    common_address: Option<u16>,

    /// Period of the setpoint command in milliseconds
    #[arg(long)]
    setpoint_interval_ms: Option<u64>,

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
    if let Some(address) = cli.link_address {
        runtime.master.link_address = address;
    }
    if let Some(address) = cli.common_address {
        runtime.master.common_address = address;
    }
    if let Some(interval) = cli.setpoint_interval_ms {
        runtime.master.setpoint_interval_ms = interval;
    }
    let config = runtime.master.to_master_config()?;

    info!(transport = ?runtime.transport, "connecting to outstation");
    let (reader, mut writer) = runtime
        .transport
        .open()
        .await
        .context("opening transport")?;

    let (trigger, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            // Keep the trigger alive; dropping it would stop the session.
            warn!(error = %e, "failed to listen for interrupt");
            std::future::pending::<()>().await;
        }
        info!("interrupt received, shutting down");
        trigger.trigger();
    });

    let mut session = MasterSession::new(config);
    session.run(reader, &mut writer, shutdown).await?;

    let stats = session.statistics();
    info!(
        sent = stats.frames_sent,
        received = stats.frames_received,
        rejected = stats.frames_rejected,
        "master stopped"
    );
    Ok(())
}
