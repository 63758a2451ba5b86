//! Query Config Information argument (AoEr11, Section 3.2).

use super::WireError;

/// Minimum length of an encoded config argument.
///
/// 2 bytes: buffer count
/// 2 bytes: firmware version
/// 1 byte : sector count
/// 1 byte : version + config command
///   0001 0001
///   ^^^^ ^^^^
///   |       +- config command
///   +--------- version
/// 2 bytes: config string length
/// N bytes: config string
const CONFIG_ARG_LEN: usize = 2 + 2 + 1 + 1 + 2;

/// Maximum config string length, per AoEr11, Section 3.2.
pub const MAX_CONFIG_STRING: u16 = 1024;

/// Config subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConfigCommand {
    /// Read the server's config string.
    Read = 0,
    /// Respond only if the argument string matches the config string
    /// exactly.
    Test = 1,
    /// Respond only if the argument string is a prefix of the config
    /// string.
    TestPrefix = 2,
    /// Set the config string, if the server's is empty.
    Set = 3,
    /// Forcibly set the config string.
    ForceSet = 4,
}

impl TryFrom<u8> for ConfigCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ConfigCommand::Read),
            1 => Ok(ConfigCommand::Test),
            2 => Ok(ConfigCommand::TestPrefix),
            3 => Ok(ConfigCommand::Set),
            4 => Ok(ConfigCommand::ForceSet),
            other => Err(other),
        }
    }
}

/// Argument to command 1, Query Config Information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigArg {
    /// Maximum number of outstanding messages the server can queue.
    /// Messages in excess of this value are dropped.
    pub buffer_count: u16,

    /// Server firmware version number.
    pub firmware_version: u16,

    /// Maximum sectors per ATA request, if non-zero. Zero means 2, for
    /// backward compatibility.
    pub sector_count: u8,

    /// AoE protocol version the server supports.
    ///
    /// Decode accepts any nibble here; only the outer header's version is
    /// gated. Encode does not inspect it either, so a decoded frame always
    /// re-encodes.
    pub version: u8,

    /// Config subcommand nibble. Must be at most 0xF; interpret with
    /// [`ConfigArg::config_command`].
    pub command: u8,

    /// Length of `string`. Must match on encode.
    pub string_length: u16,

    /// Server configuration string, at most 1024 bytes.
    pub string: Vec<u8>,
}

impl ConfigArg {
    /// Typed view of the config subcommand nibble.
    pub fn config_command(&self) -> Result<ConfigCommand, u8> {
        ConfigCommand::try_from(self.command)
    }

    /// Encode into wire form.
    ///
    /// Fails with `BadArgument` when the command does not fit in 4 bits,
    /// when `string_length` disagrees with the string, or when the string
    /// exceeds 1024 bytes.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if self.command > 0xF {
            return Err(WireError::BadArgument);
        }

        if self.string_length as usize != self.string.len() {
            return Err(WireError::BadArgument);
        }

        if self.string_length > MAX_CONFIG_STRING {
            return Err(WireError::BadArgument);
        }

        let mut b = vec![0u8; CONFIG_ARG_LEN + self.string.len()];

        b[0..2].copy_from_slice(&self.buffer_count.to_be_bytes());
        b[2..4].copy_from_slice(&self.firmware_version.to_be_bytes());
        b[4] = self.sector_count;
        b[5] = (self.version << 4) | self.command;
        b[6..8].copy_from_slice(&self.string_length.to_be_bytes());
        b[8..].copy_from_slice(&self.string);

        Ok(b)
    }

    /// Decode from wire form.
    ///
    /// Fails with `UnexpectedEof` when shorter than 8 bytes or when fewer
    /// than `string_length` bytes remain after the fixed prefix, and with
    /// `BadArgument` when `string_length` exceeds 1024. Surplus trailing
    /// bytes are ignored; frames may be padded.
    pub fn decode(b: &[u8]) -> Result<Self, WireError> {
        if b.len() < CONFIG_ARG_LEN {
            return Err(WireError::UnexpectedEof);
        }

        let buffer_count = u16::from_be_bytes([b[0], b[1]]);
        let firmware_version = u16::from_be_bytes([b[2], b[3]]);
        let sector_count = b[4];
        let version = b[5] >> 4;
        let command = b[5] & 0x0F;

        let string_length = u16::from_be_bytes([b[6], b[7]]);
        if b[8..].len() < string_length as usize {
            return Err(WireError::UnexpectedEof);
        }
        if string_length > MAX_CONFIG_STRING {
            return Err(WireError::BadArgument);
        }

        Ok(Self {
            buffer_count,
            firmware_version,
            sector_count,
            version,
            command,
            string_length,
            string: b[8..8 + string_length as usize].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::VERSION;

    #[test]
    fn encode_command_too_wide() {
        let arg = ConfigArg {
            version: VERSION,
            command: 0x1F,
            ..Default::default()
        };
        assert_eq!(arg.encode(), Err(WireError::BadArgument));
    }

    #[test]
    fn encode_string_length_mismatch() {
        let arg = ConfigArg {
            version: VERSION,
            command: 0x1,
            string_length: 0,
            string: vec![0],
            ..Default::default()
        };
        assert_eq!(arg.encode(), Err(WireError::BadArgument));
    }

    #[test]
    fn encode_string_too_long() {
        let arg = ConfigArg {
            version: VERSION,
            command: 0x1,
            string_length: 1025,
            string: vec![0; 1025],
            ..Default::default()
        };
        assert_eq!(arg.encode(), Err(WireError::BadArgument));
    }

    #[test]
    fn encode_golden() {
        let arg = ConfigArg {
            buffer_count: 10,
            firmware_version: 1,
            sector_count: 2,
            version: VERSION,
            command: 2,
            string_length: 3,
            string: b"foo".to_vec(),
        };
        assert_eq!(
            arg.encode().unwrap(),
            vec![0, 10, 0, 1, 2, 0x12, 0, 3, b'f', b'o', b'o']
        );
    }

    #[test]
    fn decode_too_short() {
        assert_eq!(
            ConfigArg::decode(&[0u8; CONFIG_ARG_LEN - 1]),
            Err(WireError::UnexpectedEof)
        );
    }

    #[test]
    fn decode_string_truncated() {
        // string_length 1 with nothing after the prefix
        assert_eq!(
            ConfigArg::decode(&[0, 0, 0, 0, 0, 0x10, 0, 1]),
            Err(WireError::UnexpectedEof)
        );
    }

    #[test]
    fn decode_string_too_long() {
        let mut b = vec![0, 0, 0, 0, 0, 0x10, 4, 1];
        b.extend_from_slice(&[0u8; 1025]);
        assert_eq!(ConfigArg::decode(&b), Err(WireError::BadArgument));
    }

    #[test]
    fn decode_golden() {
        let arg = ConfigArg::decode(&[0, 10, 0, 1, 2, 0x12, 0, 3, b'f', b'o', b'o']).unwrap();
        assert_eq!(
            arg,
            ConfigArg {
                buffer_count: 10,
                firmware_version: 1,
                sector_count: 2,
                version: VERSION,
                command: 2,
                string_length: 3,
                string: b"foo".to_vec(),
            }
        );
    }

    #[test]
    fn decode_ignores_padding() {
        // 4 bytes of frame padding after a 3-byte string
        let arg =
            ConfigArg::decode(&[0, 10, 0, 1, 2, 0x12, 0, 3, b'f', b'o', b'o', 0, 0, 0, 0])
                .unwrap();
        assert_eq!(arg.string, b"foo");
        assert_eq!(arg.string_length, 3);
    }

    #[test]
    fn decode_foreign_version_reencodes() {
        // Inner version nibble is not gated on either side.
        let b = [0, 0, 0, 0, 0, 0x30, 0, 0];
        let arg = ConfigArg::decode(&b).unwrap();
        assert_eq!(arg.version, 3);
        assert_eq!(arg.encode().unwrap(), b.to_vec());
    }
}
