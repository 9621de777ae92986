//! Yocto Exporter binary
//!
//! Registers the hardware hub, optionally dumps what is attached, then runs
//! the supervised collection loop alongside the scrape server.

use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::time;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use yocto_exporter::{
    device::take_inventory, start_web_server, supervisor::HUB_SETTLE, Collector, DeviceSession,
    MetricsRegistry, SimulatedHub, Supervisor, WebConfig, DEFAULT_BIND_ADDRESS, DEFAULT_WEB_PORT,
};

#[cfg(feature = "virtualhub")]
use yocto_exporter::{device::virtualhub::DEFAULT_HUB_URL, VirtualHubSession};

#[derive(Parser)]
#[command(name = "yocto_exporter")]
#[command(about = "Prometheus exporter for Yoctopuce USB sensors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Scrape server bind address
    #[arg(long, default_value = DEFAULT_BIND_ADDRESS)]
    host: String,

    /// Scrape server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Print discovered modules and sensors, then keep serving
    #[arg(long, conflicts_with = "dump_only")]
    dump: bool,

    /// Print discovered modules and sensors, then exit
    #[arg(long)]
    dump_only: bool,

    /// Log every module access during collection
    #[arg(long)]
    log_access: bool,

    /// VirtualHub or YoctoHub address
    #[cfg(feature = "virtualhub")]
    #[arg(long, default_value = DEFAULT_HUB_URL)]
    hub: String,

    /// Serve a simulated hub described by a JSON file instead of hardware
    #[arg(long, value_name = "FILE")]
    simulate: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::from(1);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = if cli.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[cfg(feature = "virtualhub")]
fn hardware_session(cli: &Cli) -> anyhow::Result<Box<dyn DeviceSession>> {
    Ok(Box::new(VirtualHubSession::new(cli.hub.clone())))
}

#[cfg(not(feature = "virtualhub"))]
fn hardware_session(_cli: &Cli) -> anyhow::Result<Box<dyn DeviceSession>> {
    Err(anyhow!("built without VirtualHub support; pass --simulate <FILE>"))
}

fn open_session(cli: &Cli) -> anyhow::Result<Box<dyn DeviceSession>> {
    match &cli.simulate {
        Some(path) => {
            info!("Using simulated hub from {}", path.display());
            let hub = SimulatedHub::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            Ok(Box::new(hub))
        }
        None => hardware_session(cli),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting Yocto exporter {}", env!("CARGO_PKG_VERSION"));

    let mut session = open_session(&cli)?;
    info!("Registering hub {}", session.transport());
    session.register_hub().await?;
    time::sleep(HUB_SETTLE).await;

    if cli.dump || cli.dump_only {
        let inventory = take_inventory(&mut session).await?;
        println!("modules: {}", inventory.len());
        for module in &inventory {
            print!("{}", module);
        }
        if cli.dump_only {
            return Ok(());
        }
    }

    let registry = Arc::new(MetricsRegistry::new()?);
    let mut supervisor = Supervisor::new(
        Collector::new(session, registry.clone()),
        cli.log_access,
    );

    // Populate the registry before the first scrape can arrive.
    supervisor.step().await?;

    let config = WebConfig::new(&cli.host, cli.port);
    info!("Scrape server bind address: {}", config.bind_address());
    let server = tokio::spawn(start_web_server(config, registry));

    tokio::select! {
        result = supervisor.run() => match result {
            Ok(never) => match never {},
            Err(e) => Err(e.into()),
        },
        joined = server => match joined {
            Ok(Ok(())) => Err(anyhow!("scrape server stopped")),
            Ok(Err(e)) => Err(e.into()),
            Err(e) => Err(e.into()),
        },
    }
}
