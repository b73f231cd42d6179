use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lanwake::api::ApiServerBuilder;
use lanwake::{
    db, is_valid_mac, validate_mac, Config, Device, DeviceRegistry, DeviceUpdate, WakeDispatcher,
    WakeResult,
};

/// lanwake - register devices and wake them with magic packets
#[derive(Parser)]
#[command(name = "lanwake", version, about)]
struct Cli {
    /// Database path (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server (default)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List registered devices
    List,
    /// Show one device
    Show {
        /// Device name (case-insensitive)
        name: String,
    },
    /// Register a device
    Add {
        /// Unique device name
        name: String,
        /// MAC address (XX:XX:XX:XX:XX:XX or XX-XX-XX-XX-XX-XX)
        mac: String,
        /// IP address (informational)
        #[arg(long)]
        ip: Option<String>,
        /// Broadcast address to send the magic packet to
        #[arg(long)]
        broadcast: Option<String>,
    },
    /// Change fields of a device; omitted fields are kept
    Update {
        /// Current device name
        name: String,
        /// New name
        #[arg(long = "name", value_name = "NEW_NAME")]
        new_name: Option<String>,
        /// New MAC address
        #[arg(long)]
        mac: Option<String>,
        /// New IP address
        #[arg(long, conflicts_with = "clear_ip")]
        ip: Option<String>,
        /// New broadcast address
        #[arg(long, conflicts_with = "clear_broadcast")]
        broadcast: Option<String>,
        /// Remove the stored IP address
        #[arg(long)]
        clear_ip: bool,
        /// Remove the stored broadcast address
        #[arg(long)]
        clear_broadcast: bool,
    },
    /// Remove a device
    Remove {
        /// Device name (case-insensitive)
        name: String,
    },
    /// Wake a registered device by name, or a raw MAC address
    Wake {
        /// Device name or MAC address
        target: String,
        /// Broadcast address (overrides the device's)
        #[arg(long)]
        broadcast: Option<String>,
    },
    /// Wake every registered device
    WakeAll,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,lanwake=info",
        1 => "info,lanwake=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(db_path) = cli.db {
        config.db_path = db_path;
    }

    let pool = db::init(&config.db_path)?;
    let registry = DeviceRegistry::new(pool.clone());
    let outcome = registry.load_devices(Some(&config.legacy_devices_file))?;
    tracing::debug!(?outcome, db = %config.db_path.display(), "device store ready");

    let dispatcher = WakeDispatcher::default()
        .with_default_broadcast(config.wake.broadcast)
        .with_port(config.wake.port);

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.api_server.port);
            tracing::info!(port, "starting lanwake");

            ApiServerBuilder::new(pool, dispatcher, port)
                .host(config.api_server.host)
                .rate_limit_per_minute(config.api_server.rate_limit_per_minute)
                .build()
                .run()
                .await?;
            Ok(())
        }
        Command::List => cmd_list(&registry),
        Command::Show { name } => cmd_show(&registry, &name),
        Command::Add {
            name,
            mac,
            ip,
            broadcast,
        } => {
            validate_mac(&mac)?;
            let device = Device {
                name,
                mac,
                ip,
                broadcast,
            };
            registry.add(&device)?;
            println!("Added {} ({})", device.name, device.mac);
            Ok(())
        }
        Command::Update {
            name,
            new_name,
            mac,
            ip,
            broadcast,
            clear_ip,
            clear_broadcast,
        } => {
            if let Some(mac) = &mac {
                validate_mac(mac)?;
            }
            let update = DeviceUpdate {
                name: new_name,
                mac,
                ip: if clear_ip { Some(None) } else { ip.map(Some) },
                broadcast: if clear_broadcast {
                    Some(None)
                } else {
                    broadcast.map(Some)
                },
            };
            if !registry.update(&name, &update)? {
                anyhow::bail!("device not found: {name}");
            }
            println!("Updated {name}");
            Ok(())
        }
        Command::Remove { name } => {
            if !registry.remove(&name)? {
                anyhow::bail!("device not found: {name}");
            }
            println!("Removed {name}");
            Ok(())
        }
        Command::Wake { target, broadcast } => {
            let result = cmd_wake(&registry, &dispatcher, &target, broadcast).await?;
            report(&[result])
        }
        Command::WakeAll => {
            let devices = registry.list()?;
            if devices.is_empty() {
                println!("No devices registered");
                return Ok(());
            }
            report(&dispatcher.wake_multiple(&devices).await)
        }
    }
}

fn cmd_list(registry: &DeviceRegistry) -> anyhow::Result<()> {
    let devices = registry.list()?;
    if devices.is_empty() {
        println!("No devices registered");
        return Ok(());
    }

    println!("{:<24} {:<18} {:<16} BROADCAST", "NAME", "MAC", "IP");
    for device in devices {
        println!(
            "{:<24} {:<18} {:<16} {}",
            device.name,
            device.mac,
            device.ip.as_deref().unwrap_or("-"),
            device.broadcast.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn cmd_show(registry: &DeviceRegistry, name: &str) -> anyhow::Result<()> {
    let device = registry
        .get(name)?
        .ok_or_else(|| anyhow::anyhow!("device not found: {name}"))?;
    println!("{}", serde_json::to_string_pretty(&device)?);
    Ok(())
}

/// Resolve a registered name first, then fall back to a raw MAC
async fn cmd_wake(
    registry: &DeviceRegistry,
    dispatcher: &WakeDispatcher,
    target: &str,
    broadcast: Option<String>,
) -> anyhow::Result<WakeResult> {
    if let Some(mut device) = registry.get(target)? {
        if broadcast.is_some() {
            device.broadcast = broadcast;
        }
        return Ok(dispatcher.wake_device(&device).await);
    }

    if is_valid_mac(target) {
        return Ok(dispatcher.wake(target, broadcast.as_deref()).await);
    }

    anyhow::bail!("no device named {target:?} and not a valid MAC address")
}

/// Print results; fail if any wake did not go out
fn report(results: &[WakeResult]) -> anyhow::Result<()> {
    for result in results {
        let mark = if result.success { "ok" } else { "FAILED" };
        println!("[{mark}] {}", result.message);
    }

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} wake attempts failed", results.len());
    }
    Ok(())
}
