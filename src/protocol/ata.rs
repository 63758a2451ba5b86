//! ATA request handling.
//!
//! Dispatches the ATA commands carried by Issue ATA Command headers against
//! a backing store and sends a single reply per request.

use std::fmt;

use thiserror::Error;

use super::{Arg, AtaArg, Command, Header, ResponseSender, WireError, SECTOR_SIZE};
use crate::storage::{BackingStore, StoreError};

/// Error register value for an aborted command.
pub const ATA_ERR_ABORT: u8 = 0x04;

/// Status register: error.
pub const ATA_STATUS_ERR: u8 = 0x01;

/// Status register: device ready.
pub const ATA_STATUS_READY: u8 = 0x40;

/// ATA opcodes recognized by [`serve_ata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AtaOp {
    Read28 = 0x20,
    Read48 = 0x24,
    Write28 = 0x30,
    Write48 = 0x34,
    CheckPower = 0xE5,
    Flush = 0xE7,
    Identify = 0xEC,
}

impl TryFrom<u8> for AtaOp {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x20 => Ok(AtaOp::Read28),
            0x24 => Ok(AtaOp::Read48),
            0x30 => Ok(AtaOp::Write28),
            0x34 => Ok(AtaOp::Write48),
            0xE5 => Ok(AtaOp::CheckPower),
            0xE7 => Ok(AtaOp::Flush),
            0xEC => Ok(AtaOp::Identify),
            other => Err(other),
        }
    }
}

impl fmt::Display for AtaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtaOp::Read28 => write!(f, "READ SECTORS"),
            AtaOp::Read48 => write!(f, "READ SECTORS EXT"),
            AtaOp::Write28 => write!(f, "WRITE SECTORS"),
            AtaOp::Write48 => write!(f, "WRITE SECTORS EXT"),
            AtaOp::CheckPower => write!(f, "CHECK POWER MODE"),
            AtaOp::Flush => write!(f, "FLUSH CACHE"),
            AtaOp::Identify => write!(f, "IDENTIFY DEVICE"),
        }
    }
}

/// Failures surfaced to the caller of [`serve_ata`].
///
/// An aborted ATA command is not among them: aborts are protocol-level
/// replies, and the caller is not informed.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The request is not an ATA command, or carries a non-ATA argument.
    #[error("invalid ATA request")]
    InvalidRequest,

    /// Identification was requested from a store without the identify
    /// capability.
    #[error("not implemented")]
    NotImplemented,

    #[error("wire format error: {0}")]
    Wire(#[from] WireError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one dispatch step. `Abort` sends the abort-shaped reply
/// instead of propagating; `Fatal` propagates and sends nothing.
enum Failure {
    Abort,
    Fatal(ServeError),
}

impl From<StoreError> for Failure {
    fn from(e: StoreError) -> Self {
        Failure::Fatal(ServeError::Store(e))
    }
}

/// Replies to an AoE ATA request after performing the requested operation
/// on the backing store, returning the number of bytes sent.
///
/// Recoverable precondition failures (unknown opcode, flag or length
/// disagreements, writes to a read-only store, short transfers) produce an
/// abort reply and no error. Backing-store failures are returned and no
/// reply is sent.
pub fn serve_ata(
    w: &mut dyn ResponseSender,
    r: &Header,
    store: &mut dyn BackingStore,
) -> Result<usize, ServeError> {
    if r.command != Command::IssueAta {
        return Err(ServeError::InvalidRequest);
    }
    let arg = match &r.arg {
        Some(Arg::Ata(arg)) => arg,
        _ => return Err(ServeError::InvalidRequest),
    };

    let step = match AtaOp::try_from(arg.cmd_status) {
        Ok(op) => {
            log::debug!(
                "ATA command: {} lba={:?} count={}",
                op,
                arg.lba,
                arg.sector_count
            );

            match op {
                AtaOp::CheckPower => check_power(),
                AtaOp::Flush => flush(store),
                AtaOp::Identify => identify(arg, store),
                AtaOp::Read28 | AtaOp::Read48 => read(arg, store),
                AtaOp::Write28 | AtaOp::Write48 => write(arg, store),
            }
        }
        Err(code) => {
            log::warn!("unknown ATA command: {:#04x}", code);
            Err(Failure::Abort)
        }
    };

    let warg = match step {
        Ok(warg) => warg,
        Err(Failure::Fatal(e)) => return Err(e),
        Err(Failure::Abort) => AtaArg {
            cmd_status: ATA_STATUS_ERR,
            err_feature: ATA_ERR_ABORT,
            ..Default::default()
        },
    };

    // The sender stamps identity fields; only the argument matters here.
    w.send(Header {
        arg: Some(Arg::Ata(warg)),
        ..Default::default()
    })
}

/// The device is always active; report ready without touching the store.
fn check_power() -> Result<AtaArg, Failure> {
    Ok(AtaArg {
        sector_count: 0xFF,
        cmd_status: ATA_STATUS_READY,
        ..Default::default()
    })
}

/// Acknowledge a cache flush, syncing the store first when it can.
fn flush(store: &mut dyn BackingStore) -> Result<AtaArg, Failure> {
    if store.capabilities().sync {
        store.sync()?;
    }

    check_power()
}

fn identify(r: &AtaArg, store: &mut dyn BackingStore) -> Result<AtaArg, Failure> {
    if r.cmd_status != AtaOp::Identify as u8 {
        return Err(Failure::Abort);
    }

    // Identity is exactly one sector.
    if r.sector_count != 1 {
        return Err(Failure::Abort);
    }

    if !store.capabilities().identify {
        return Err(Failure::Fatal(ServeError::NotImplemented));
    }

    let id = store.identify()?;

    Ok(AtaArg {
        cmd_status: ATA_STATUS_READY,
        data: id.to_vec(),
        ..Default::default()
    })
}

/// 28-bit or 48-bit sector read.
fn read(r: &AtaArg, store: &mut dyn BackingStore) -> Result<AtaArg, Failure> {
    if r.cmd_status != AtaOp::Read28 as u8 && r.cmd_status != AtaOp::Read48 as u8 {
        return Err(Failure::Abort);
    }

    if r.flags.write {
        return Err(Failure::Abort);
    }

    let offset = lba(r.lba, r.flags.extended) * SECTOR_SIZE as i64;
    store.seek(offset as u64)?;

    let mut buf = vec![0u8; r.sector_count as usize * SECTOR_SIZE];
    let n = store.read(&mut buf)?;

    if n / SECTOR_SIZE != r.sector_count as usize {
        return Err(Failure::Abort);
    }

    Ok(AtaArg {
        cmd_status: ATA_STATUS_READY,
        data: buf,
        ..Default::default()
    })
}

/// 28-bit or 48-bit sector write.
fn write(r: &AtaArg, store: &mut dyn BackingStore) -> Result<AtaArg, Failure> {
    if r.cmd_status != AtaOp::Write28 as u8 && r.cmd_status != AtaOp::Write48 as u8 {
        return Err(Failure::Abort);
    }

    if !r.flags.write {
        return Err(Failure::Abort);
    }

    if r.data.len() / SECTOR_SIZE != r.sector_count as usize {
        return Err(Failure::Abort);
    }

    if !store.capabilities().write {
        return Err(Failure::Abort);
    }

    let offset = lba(r.lba, r.flags.extended) * SECTOR_SIZE as i64;
    store.seek(offset as u64)?;

    let n = store.write(&r.data)?;

    if n / SECTOR_SIZE != r.sector_count as usize {
        return Err(Failure::Abort);
    }

    Ok(AtaArg {
        cmd_status: ATA_STATUS_READY,
        ..Default::default()
    })
}

/// Computes a logical block address from the packed 6-byte LBA array.
///
/// The array holds the low 48 bits of a little-endian value; the result is
/// masked to 48 or 28 bits depending on the extended flag.
pub fn lba(raw: [u8; 6], extended: bool) -> i64 {
    let mut b = [0u8; 8];
    b[..6].copy_from_slice(&raw);
    let lba = u64::from_le_bytes(b);

    let masked = if extended {
        lba & 0x0000_FFFF_FFFF_FFFF
    } else {
        lba & 0x0FFF_FFFF
    };

    masked as i64
}
