//! ATA over Ethernet (AoE) server, as described in the AoEr11 specification.
//!
//! This crate implements the AoE wire format and a server that presents a
//! block device over raw Ethernet (EtherType 0x88A2, no IP stack). Backing
//! stores are pluggable: a regular file, a block device, or an in-memory
//! disk.

pub mod config;
pub mod protocol;
pub mod server;
pub mod storage;

pub use config::Config;
pub use protocol::ata::{serve_ata, ServeError};
pub use protocol::{Arg, Command, Header, ProtocolError, ResponseSender, WireError};
pub use storage::{BackingStore, Capabilities, DeviceInfo, StoreError};
