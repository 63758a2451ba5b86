//! File-backed store.
//!
//! Serves sectors from a regular file or a block device node.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{identify_data, BackingStore, Capabilities, DeviceInfo, StoreResult};
use crate::protocol::SECTOR_SIZE;

/// Backing store over a file or block device.
pub struct FileStore {
    file: File,
    info: DeviceInfo,
    caps: Capabilities,
}

impl FileStore {
    /// Open an existing file or block device.
    pub fn open<P: AsRef<Path>>(path: P, read_only: bool) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .open(path.as_ref())?;

        Self::from_file(file, path.as_ref(), read_only)
    }

    /// Open or create a file, extending it to at least `size_bytes`.
    ///
    /// With `read_only` set, the file is still created and sized, but
    /// reopened without write access before serving.
    pub fn create<P: AsRef<Path>>(path: P, size_bytes: u64, read_only: bool) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;

        if file.metadata()?.len() < size_bytes {
            file.set_len(size_bytes)?;
        }

        if read_only {
            drop(file);
            return Self::open(path.as_ref(), true);
        }

        Self::from_file(file, path.as_ref(), false)
    }

    fn from_file(mut file: File, path: &Path, read_only: bool) -> StoreResult<Self> {
        // Seek to the end to size the device; metadata length is zero for
        // block device nodes.
        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        let info = DeviceInfo {
            model: "AoE File Store".to_string(),
            serial: generate_serial(path),
            total_sectors: size / SECTOR_SIZE as u64,
            ..Default::default()
        };

        Ok(Self {
            file,
            info,
            caps: Capabilities {
                write: !read_only,
                identify: true,
                sync: !read_only,
            },
        })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

impl BackingStore for FileStore {
    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn seek(&mut self, offset: u64) -> StoreResult<u64> {
        Ok(self.file.seek(SeekFrom::Start(offset))?)
    }

    fn read(&mut self, buf: &mut [u8]) -> StoreResult<usize> {
        Ok(self.file.read(buf)?)
    }

    fn write(&mut self, data: &[u8]) -> StoreResult<usize> {
        Ok(self.file.write(data)?)
    }

    fn identify(&mut self) -> StoreResult<[u8; 512]> {
        Ok(identify_data(&self.info))
    }

    fn sync(&mut self) -> StoreResult<()> {
        Ok(self.file.sync_all()?)
    }
}

/// Derives a stable serial number from the backing path.
fn generate_serial(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    format!("{:016X}", hasher.finish())
}
