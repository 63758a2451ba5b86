//! aoed - ATA over Ethernet server
//!
//! Serves a file, block device, or RAM disk as an AoE target on a network
//! interface.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;

use aoed::config::{BackendKind, Config};
use aoed::protocol::{BROADCAST_MAJOR, BROADCAST_MINOR};
use aoed::server::{Listener, Server};
use aoed::storage::{BackingStore, FileStore, MemStore};

#[derive(Parser, Debug)]
#[command(name = "aoed")]
#[command(about = "ATA over Ethernet server", long_about = None)]
struct Args {
    /// Network interface to serve on
    #[arg(short, long)]
    interface: Option<String>,

    /// Backing file or block device
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Shelf (major) address
    #[arg(long, default_value_t = 15)]
    shelf: u16,

    /// Slot (minor) address
    #[arg(long, default_value_t = 1)]
    slot: u8,

    /// Seconds between discovery broadcasts (0 disables)
    #[arg(long, default_value_t = 60)]
    advertise_secs: u64,

    /// Outstanding messages advertised to initiators
    #[arg(long, default_value_t = 16)]
    buffer_count: u16,

    /// Firmware version advertised to initiators
    #[arg(long, default_value_t = 1)]
    firmware_version: u16,

    /// Maximum sectors per request advertised to initiators
    #[arg(long, default_value_t = 2)]
    sectors: u8,

    /// Create or extend the backing file to this many bytes
    #[arg(long)]
    size: Option<u64>,

    /// Serve the device read-only
    #[arg(long)]
    read_only: bool,

    /// Config string answered to discovery queries
    #[arg(long, default_value = "")]
    config_string: String,

    /// Load the whole setup from a TOML file instead of flags
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = Args::parse();

    log::info!("aoed v{}", env!("CARGO_PKG_VERSION"));

    let (interface, server, advertise) = match args.config.take() {
        Some(path) => setup_from_config(&path)?,
        None => setup_from_flags(args)?,
    };

    let mut listener = Listener::new(&interface, server, advertise)
        .context("failed to open AoE listener")?;

    listener.run().context("server error")?;

    Ok(())
}

fn setup_from_flags(args: Args) -> Result<(String, Server, Duration)> {
    let interface = match args.interface {
        Some(interface) => interface,
        None => bail!("--interface is required (or use --config)"),
    };
    let device = match args.device {
        Some(device) => device,
        None => bail!("--device is required (or use --config)"),
    };

    if args.shelf == BROADCAST_MAJOR {
        bail!("shelf {:#06X} is the broadcast wildcard", BROADCAST_MAJOR);
    }
    if args.slot == BROADCAST_MINOR {
        bail!("slot {:#04X} is the broadcast wildcard", BROADCAST_MINOR);
    }
    if args.config_string.len() > 1024 {
        bail!("config string longer than 1024 bytes");
    }

    let store = match args.size {
        Some(size) => FileStore::create(&device, size, args.read_only)
            .with_context(|| format!("failed to create backing file {}", device.display()))?,
        None => FileStore::open(&device, args.read_only)
            .with_context(|| format!("failed to open backing device {}", device.display()))?,
    };

    log::info!(
        "backing device {} ({} sectors{})",
        device.display(),
        store.info().total_sectors,
        if args.read_only { ", read-only" } else { "" },
    );

    let server = Server {
        major: args.shelf,
        minor: args.slot,
        buffer_count: args.buffer_count,
        firmware_version: args.firmware_version,
        sector_count: args.sectors,
        config: args.config_string.into_bytes(),
        store: Box::new(store),
    };

    Ok((interface, server, Duration::from_secs(args.advertise_secs)))
}

fn setup_from_config(path: &Path) -> Result<(String, Server, Duration)> {
    let config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    let store: Box<dyn BackingStore> = match config.device.backend {
        BackendKind::File => {
            let device = config
                .device
                .path
                .as_ref()
                .expect("file config validated");

            let store = match config.device.size {
                Some(size) => FileStore::create(device, size, config.device.read_only)
                    .with_context(|| {
                        format!("failed to create backing file {}", device.display())
                    })?,
                None => FileStore::open(device, config.device.read_only).with_context(|| {
                    format!("failed to open backing device {}", device.display())
                })?,
            };

            log::info!(
                "backing device {} ({} sectors{})",
                device.display(),
                store.info().total_sectors,
                if config.device.read_only { ", read-only" } else { "" },
            );

            Box::new(store)
        }
        BackendKind::Ram => {
            let sectors = config.device.ram_sectors.expect("ram config validated");
            log::info!("RAM disk ({sectors} sectors)");
            if config.device.read_only {
                Box::new(MemStore::read_only(sectors))
            } else {
                Box::new(MemStore::new(sectors))
            }
        }
    };

    let server = Server {
        major: config.server.shelf,
        minor: config.server.slot,
        buffer_count: config.server.buffer_count,
        firmware_version: config.server.firmware_version,
        sector_count: config.server.sector_count,
        config: config.server.config_string.into_bytes(),
        store,
    };

    Ok((
        config.server.interface,
        server,
        Duration::from_secs(config.server.advertise_secs),
    ))
}
