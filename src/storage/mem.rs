//! In-memory store.
//!
//! A volatile RAM disk, useful for scratch targets and tests.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use super::{identify_data, BackingStore, Capabilities, DeviceInfo, StoreResult};
use crate::protocol::SECTOR_SIZE;

/// Backing store over an in-memory buffer.
pub struct MemStore {
    cursor: Cursor<Vec<u8>>,
    info: DeviceInfo,
    caps: Capabilities,
}

impl MemStore {
    /// Create a zero-filled writable store of `sectors` sectors.
    pub fn new(sectors: u64) -> Self {
        Self::with_capabilities(
            sectors,
            Capabilities {
                write: true,
                identify: true,
                sync: true,
            },
        )
    }

    /// Create a zero-filled read-only store of `sectors` sectors.
    pub fn read_only(sectors: u64) -> Self {
        Self::with_capabilities(
            sectors,
            Capabilities {
                write: false,
                identify: true,
                sync: false,
            },
        )
    }

    fn with_capabilities(sectors: u64, caps: Capabilities) -> Self {
        let info = DeviceInfo {
            model: "AoE RAM Disk".to_string(),
            total_sectors: sectors,
            ..Default::default()
        };

        Self {
            cursor: Cursor::new(vec![0u8; sectors as usize * SECTOR_SIZE]),
            info,
            caps,
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

impl BackingStore for MemStore {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn seek(&mut self, offset: u64) -> StoreResult<u64> {
        Ok(self.cursor.seek(SeekFrom::Start(offset))?)
    }

    fn read(&mut self, buf: &mut [u8]) -> StoreResult<usize> {
        Ok(self.cursor.read(buf)?)
    }

    fn write(&mut self, data: &[u8]) -> StoreResult<usize> {
        Ok(self.cursor.write(data)?)
    }

    fn identify(&mut self) -> StoreResult<[u8; 512]> {
        Ok(identify_data(&self.info))
    }

    fn sync(&mut self) -> StoreResult<()> {
        Ok(())
    }
}
