//! ATA command argument (AoEr11, Section 3.1).

use super::WireError;

/// Minimum length of an encoded ATA argument.
///
/// 1 byte : flags
///   0101 0011
///    | |   ||
///    | |   |+-- write flag
///    | |   +--- asynchronous flag
///    | +------- device/head register flag
///    +--------- extended LBA48 flag
/// 1 byte : err/feature
/// 1 byte : sector count
/// 1 byte : cmd/status
/// 6 bytes: lba array
/// 2 bytes: reserved
/// N bytes: data
const ATA_ARG_LEN: usize = 1 + 1 + 1 + 1 + 6 + 2;

/// Flag bits in byte 0 of an ATA argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AtaFlags {
    /// LBA48 extended command (bit 6). The device/head register flag is
    /// only meaningful when this is set.
    pub extended: bool,
    /// ATA device/head register flag (bit 4).
    pub device_head: bool,
    /// Asynchronous write request (bit 1).
    pub asynchronous: bool,
    /// Write command; data follows the argument header (bit 0).
    pub write: bool,
}

impl AtaFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            extended: (byte & 0x40) != 0,
            device_head: (byte & 0x10) != 0,
            asynchronous: (byte & 0x02) != 0,
            write: (byte & 0x01) != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut flags = 0u8;
        if self.extended {
            flags |= 1 << 6;
        }
        if self.device_head {
            flags |= 1 << 4;
        }
        if self.asynchronous {
            flags |= 1 << 1;
        }
        if self.write {
            flags |= 1;
        }
        flags
    }
}

/// Argument to command 0, Issue ATA Command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtaArg {
    pub flags: AtaFlags,

    /// Error (response) / feature (request) register.
    pub err_feature: u8,

    /// Number of sectors to transfer.
    pub sector_count: u8,

    /// Command (request) / status (response) register. Raw; interpreted by
    /// the ATA handler.
    pub cmd_status: u8,

    /// Logical block address, packed little-endian.
    pub lba: [u8; 6],

    /// Raw data transferred to or from the device.
    pub data: Vec<u8>,
}

impl AtaArg {
    /// Encode into wire form. Never fails.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut b = vec![0u8; ATA_ARG_LEN + self.data.len()];

        b[0] = self.flags.to_byte();
        b[1] = self.err_feature;
        b[2] = self.sector_count;
        b[3] = self.cmd_status;
        b[4..10].copy_from_slice(&self.lba);

        // Bytes 10-11 reserved.

        b[12..].copy_from_slice(&self.data);

        Ok(b)
    }

    /// Decode from wire form.
    ///
    /// Fails with `UnexpectedEof` when shorter than 12 bytes, and with
    /// `BadArgument` when the reserved bytes 10-11 are not zero.
    pub fn decode(b: &[u8]) -> Result<Self, WireError> {
        if b.len() < ATA_ARG_LEN {
            return Err(WireError::UnexpectedEof);
        }

        if b[10] != 0 || b[11] != 0 {
            return Err(WireError::BadArgument);
        }

        let mut lba = [0u8; 6];
        lba.copy_from_slice(&b[4..10]);

        Ok(Self {
            flags: AtaFlags::from_byte(b[0]),
            err_feature: b[1],
            sector_count: b[2],
            cmd_status: b[3],
            lba,
            data: b[12..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_empty() {
        let b = AtaArg::default().encode().unwrap();
        assert_eq!(b, vec![0u8; ATA_ARG_LEN]);
    }

    #[test]
    fn encode_extended_device_head() {
        let arg = AtaArg {
            flags: AtaFlags {
                extended: true,
                device_head: true,
                ..Default::default()
            },
            lba: [0, 1, 2, 3, 4, 5],
            ..Default::default()
        };
        assert_eq!(
            arg.encode().unwrap(),
            vec![0x50, 0, 0, 0, 0, 1, 2, 3, 4, 5, 0, 0]
        );
    }

    #[test]
    fn encode_async_write_with_data() {
        let arg = AtaArg {
            flags: AtaFlags {
                asynchronous: true,
                write: true,
                ..Default::default()
            },
            lba: [5, 4, 3, 2, 1, 6],
            data: b"foo".to_vec(),
            ..Default::default()
        };
        assert_eq!(
            arg.encode().unwrap(),
            vec![0x03, 0, 0, 0, 5, 4, 3, 2, 1, 6, 0, 0, b'f', b'o', b'o']
        );
    }

    #[test]
    fn encode_registers() {
        let arg = AtaArg {
            err_feature: 2,
            sector_count: 255,
            cmd_status: 4,
            ..Default::default()
        };
        assert_eq!(
            arg.encode().unwrap(),
            vec![0x00, 2, 255, 4, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn decode_too_short() {
        assert_eq!(
            AtaArg::decode(&[0u8; ATA_ARG_LEN - 1]),
            Err(WireError::UnexpectedEof)
        );
    }

    #[test]
    fn decode_reserved_not_zero() {
        assert_eq!(
            AtaArg::decode(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1]),
            Err(WireError::BadArgument)
        );
    }

    #[test]
    fn decode_with_data() {
        let arg =
            AtaArg::decode(&[0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 0, 0, b'f', b'o', b'o']).unwrap();
        assert_eq!(
            arg,
            AtaArg {
                lba: [1, 2, 3, 4, 5, 6],
                data: b"foo".to_vec(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn decode_flags() {
        let arg = AtaArg::decode(&[0x03, 1, 255, 2, 6, 6, 6, 6, 6, 6, 0, 0, 1]).unwrap();
        assert_eq!(
            arg,
            AtaArg {
                flags: AtaFlags {
                    asynchronous: true,
                    write: true,
                    ..Default::default()
                },
                err_feature: 1,
                sector_count: 255,
                cmd_status: 2,
                lba: [6; 6],
                data: vec![1],
            }
        );
    }

    #[test]
    fn round_trip() {
        let arg = AtaArg {
            flags: AtaFlags {
                extended: true,
                write: true,
                ..Default::default()
            },
            err_feature: 9,
            sector_count: 3,
            cmd_status: 0x34,
            lba: [1, 2, 3, 4, 5, 6],
            data: vec![0xAB; 1536],
        };
        assert_eq!(AtaArg::decode(&arg.encode().unwrap()).unwrap(), arg);
    }
}
