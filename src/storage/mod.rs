//! Backing stores
//!
//! A backing store is the seekable byte stream an AoE target serves
//! sectors from. Optional capabilities (write, identify, sync) are fixed
//! when a store is constructed; the ATA handler branches on their presence
//! instead of downcasting.

pub mod file;
pub mod mem;

use thiserror::Error;

pub use file::FileStore;
pub use mem::MemStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Optional capabilities a store advertises at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Accepts sector writes. Write requests against a store without this
    /// are aborted at the protocol level.
    pub write: bool,

    /// Produces a 512-byte IDENTIFY DEVICE blob.
    pub identify: bool,

    /// Can flush buffered writes to stable storage.
    pub sync: bool,
}

/// Device identity used to build IDENTIFY DEVICE data.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Model name, at most 40 characters.
    pub model: String,
    /// Serial number, at most 20 characters.
    pub serial: String,
    /// Firmware revision, at most 8 characters.
    pub firmware: String,
    /// Total addressable sectors.
    pub total_sectors: u64,
    /// LBA48 support.
    pub lba48: bool,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            model: "AoE Virtual Disk".to_string(),
            serial: "0000000000".to_string(),
            firmware: env!("CARGO_PKG_VERSION").to_string(),
            total_sectors: 0,
            lba48: true,
        }
    }
}

/// A seekable byte stream with capability-gated extras.
///
/// `seek` and `read` are the minimum contract. The remaining methods are
/// only invoked when [`Capabilities`] advertises them; the defaults refuse.
pub trait BackingStore: Send {
    /// Capability set fixed at construction.
    fn capabilities(&self) -> Capabilities;

    /// Position the cursor at an absolute byte offset.
    fn seek(&mut self, offset: u64) -> StoreResult<u64>;

    /// Read from the cursor, returning the number of bytes read.
    fn read(&mut self, buf: &mut [u8]) -> StoreResult<usize>;

    /// Write at the cursor, returning the number of bytes written.
    fn write(&mut self, _data: &[u8]) -> StoreResult<usize> {
        Err(StoreError::Unsupported("write"))
    }

    /// Produce the 512-byte IDENTIFY DEVICE blob.
    fn identify(&mut self) -> StoreResult<[u8; 512]> {
        Err(StoreError::Unsupported("identify"))
    }

    /// Flush buffered writes to stable storage.
    fn sync(&mut self) -> StoreResult<()> {
        Err(StoreError::Unsupported("sync"))
    }
}

/// Builds a 512-byte IDENTIFY DEVICE response.
pub fn identify_data(info: &DeviceInfo) -> [u8; 512] {
    let mut data = [0u8; 512];

    // Words 10-19: serial number (20 ASCII chars, space-padded)
    let serial = format!("{:<20}", &info.serial[..info.serial.len().min(20)]);
    copy_ata_string(&mut data[20..40], &serial);

    // Words 23-26: firmware revision (8 ASCII chars)
    let firmware = format!("{:<8}", &info.firmware[..info.firmware.len().min(8)]);
    copy_ata_string(&mut data[46..54], &firmware);

    // Words 27-46: model number (40 ASCII chars)
    let model = format!("{:<40}", &info.model[..info.model.len().min(40)]);
    copy_ata_string(&mut data[54..94], &model);

    // Word 47: max sectors per interrupt
    data[94] = 0x01;

    // Word 49: capabilities, LBA + DMA supported
    data[98] = 0x00;
    data[99] = 0x03;

    // Words 60-61: total addressable sectors (LBA28), clamped
    let lba28_sectors = info.total_sectors.min(0x0FFF_FFFF) as u32;
    data[120..124].copy_from_slice(&lba28_sectors.to_le_bytes());

    if info.lba48 {
        // Words 83/86: command sets supported/enabled, LBA48
        data[167] = 0x04;
        data[173] = 0x04;

        // Words 100-103: total addressable sectors (LBA48)
        let sectors = info.total_sectors & 0x0000_FFFF_FFFF_FFFF;
        data[200..208].copy_from_slice(&sectors.to_le_bytes());
    }

    data
}

/// Copies a string into ATA identify format: ASCII, byte-swapped within
/// each 16-bit word.
fn copy_ata_string(dest: &mut [u8], src: &str) {
    let bytes = src.as_bytes();
    for i in (0..dest.len()).step_by(2) {
        if i + 1 < bytes.len() {
            dest[i] = bytes[i + 1];
            dest[i + 1] = bytes[i];
        } else if i < bytes.len() {
            dest[i] = b' ';
            dest[i + 1] = bytes[i];
        } else {
            dest[i] = b' ';
            dest[i + 1] = b' ';
        }
    }
}
