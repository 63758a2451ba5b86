//! AoE wire protocol
//!
//! This module implements the AoEr11 header and its four argument variants,
//! plus the ATA request handler. The codec covers the AoE payload only; the
//! Ethernet header around it is added and stripped by the server layer.

pub mod ata;
mod ata_arg;
mod config_arg;
mod header;
mod mac_mask;
mod reserve;

pub use ata_arg::{AtaArg, AtaFlags};
pub use config_arg::{ConfigArg, ConfigCommand};
pub use header::Header;
pub use mac_mask::{Directive, DirectiveCommand, MacMaskArg, MacMaskCommand, MacMaskError};
pub use reserve::{ReserveReleaseArg, ReserveReleaseCommand};

use thiserror::Error;

/// AoE protocol version implemented by this crate.
pub const VERSION: u8 = 1;

/// Registered EtherType for AoE over IEEE 802.3 Ethernet.
pub const ETHERTYPE: u16 = 0x88A2;

/// Wildcard major (shelf) address matching any server.
pub const BROADCAST_MAJOR: u16 = 0xFFFF;

/// Wildcard minor (slot) address matching any server.
pub const BROADCAST_MINOR: u8 = 0xFF;

/// Ethernet broadcast address.
pub const BROADCAST_MAC: [u8; 6] = [0xFF; 6];

/// Sector size required by AoEr11, Section 3.
pub const SECTOR_SIZE: usize = 512;

/// Errors raised by the wire codec.
///
/// The server drops frames that fail to decode; malformed packets are not
/// worth replying to.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of frame")]
    UnexpectedEof,

    #[error("bad argument parameter")]
    BadArgument,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("unrecognized command code: {0}")]
    UnrecognizedCommand(u8),
}

/// AoE error codes carried in the header's error field, per AoEr11,
/// Section 2.4. Sent to a client with the error flag set when a request
/// fails at the protocol level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProtocolError {
    UnrecognizedCommandCode = 1,
    BadArgumentParameter = 2,
    DeviceUnavailable = 3,
    ConfigStringPresent = 4,
    UnsupportedVersion = 5,
    TargetIsReserved = 6,
}

impl ProtocolError {
    /// Wire code for the header's error field.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// AoE command types, per AoEr11, Section 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Issue an ATA command to the attached device.
    #[default]
    IssueAta = 0,
    /// Set or retrieve server configuration.
    QueryConfig = 1,
    /// Read or manage the MAC-address access list.
    MacMaskList = 2,
    /// Reserve or release a target for a set of clients.
    ReserveRelease = 3,
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Command::IssueAta),
            1 => Ok(Command::QueryConfig),
            2 => Ok(Command::MacMaskList),
            3 => Ok(Command::ReserveRelease),
            other => Err(other),
        }
    }
}

/// Command-specific argument, keyed by the header's command field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Ata(AtaArg),
    Config(ConfigArg),
    MacMask(MacMaskArg),
    ReserveRelease(ReserveReleaseArg),
}

impl Arg {
    /// The command this argument variant belongs to.
    pub fn command(&self) -> Command {
        match self {
            Arg::Ata(_) => Command::IssueAta,
            Arg::Config(_) => Command::QueryConfig,
            Arg::MacMask(_) => Command::MacMaskList,
            Arg::ReserveRelease(_) => Command::ReserveRelease,
        }
    }

    /// Encode this argument into its wire form.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        match self {
            Arg::Ata(a) => a.encode(),
            Arg::Config(c) => c.encode(),
            Arg::MacMask(m) => m.encode(),
            Arg::ReserveRelease(r) => r.encode(),
        }
    }

    /// Decode the argument variant selected by `command` from `b`.
    pub fn decode(command: Command, b: &[u8]) -> Result<Arg, WireError> {
        match command {
            Command::IssueAta => AtaArg::decode(b).map(Arg::Ata),
            Command::QueryConfig => ConfigArg::decode(b).map(Arg::Config),
            Command::MacMaskList => MacMaskArg::decode(b).map(Arg::MacMask),
            Command::ReserveRelease => ReserveReleaseArg::decode(b).map(Arg::ReserveRelease),
        }
    }
}

/// Reply channel handed to request handlers.
///
/// Implementations stamp outbound identity: version, the response flag, the
/// server's major/minor, and the request's command and tag. Handlers fill in
/// only the argument and, for failures, the error flag and code.
pub trait ResponseSender {
    /// Send `header` as a response, returning the number of bytes written.
    fn send(&mut self, header: Header) -> Result<usize, ata::ServeError>;
}
