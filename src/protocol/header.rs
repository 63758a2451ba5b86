//! AoE header codec (AoEr11, Section 2).

use super::{Arg, Command, WireError, VERSION};

/// Length of the fixed portion of a header.
///
/// 1 byte : version + flags
///   0001 1100
///   ^^^^ ||
///   |    |+-- error flag
///   |    +--- response flag
///   +-------- version
/// 1 byte : error
/// 2 bytes: major
/// 1 byte : minor
/// 1 byte : command
/// 4 bytes: tag
/// N bytes: arg
const HEADER_LEN: usize = 1 + 1 + 2 + 1 + 1 + 4;

/// An ATA over Ethernet header.
///
/// A `Header` does not include the Ethernet header encapsulating it on the
/// wire; the server layer adds and strips that transparently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// AoE version. Must equal [`VERSION`] to encode or decode.
    pub version: u8,

    /// Message is a response to a request.
    pub flag_response: bool,

    /// The command generated an AoE protocol error.
    pub flag_error: bool,

    /// Error code reported to a client, valid when `flag_error` is set.
    pub error: u8,

    /// Major (shelf) address. 0xFFFF broadcasts to all servers.
    pub major: u16,

    /// Minor (slot) address. 0xFF broadcasts to all servers.
    pub minor: u8,

    pub command: Command,

    /// Opaque client-chosen tag, echoed verbatim in responses.
    pub tag: [u8; 4],

    /// Command-specific argument.
    pub arg: Option<Arg>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: VERSION,
            flag_response: false,
            flag_error: false,
            error: 0,
            major: 0,
            minor: 0,
            command: Command::default(),
            tag: [0; 4],
            arg: None,
        }
    }
}

impl Header {
    /// Encode into wire form.
    ///
    /// Fails with `UnsupportedVersion` when the version is not 1 and with
    /// `BadArgument` when no argument is present; argument encode errors
    /// propagate.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if self.version != VERSION {
            return Err(WireError::UnsupportedVersion(self.version));
        }

        let arg = self.arg.as_ref().ok_or(WireError::BadArgument)?;
        let ab = arg.encode()?;

        let mut b = vec![0u8; HEADER_LEN + ab.len()];

        let mut vf = self.version << 4;
        if self.flag_response {
            vf |= 1 << 3;
        }
        if self.flag_error {
            vf |= 1 << 2;
        }
        b[0] = vf;

        b[1] = self.error;
        b[2..4].copy_from_slice(&self.major.to_be_bytes());
        b[4] = self.minor;
        b[5] = self.command as u8;
        b[6..10].copy_from_slice(&self.tag);
        b[10..].copy_from_slice(&ab);

        Ok(b)
    }

    /// Decode from wire form.
    ///
    /// Fails with `UnexpectedEof` when shorter than 10 bytes, with
    /// `UnsupportedVersion` when the version nibble is not 1, and with
    /// `UnrecognizedCommand` for an unknown command code; argument decode
    /// errors propagate.
    pub fn decode(b: &[u8]) -> Result<Self, WireError> {
        if b.len() < HEADER_LEN {
            return Err(WireError::UnexpectedEof);
        }

        let version = b[0] >> 4;
        if version != VERSION {
            return Err(WireError::UnsupportedVersion(version));
        }

        let flag_response = (b[0] & 0x08) != 0;
        let flag_error = (b[0] & 0x04) != 0;

        let error = b[1];
        let major = u16::from_be_bytes([b[2], b[3]]);
        let minor = b[4];
        let command = Command::try_from(b[5]).map_err(WireError::UnrecognizedCommand)?;

        let mut tag = [0u8; 4];
        tag.copy_from_slice(&b[6..10]);

        let arg = Arg::decode(command, &b[10..])?;

        Ok(Self {
            version,
            flag_response,
            flag_error,
            error,
            major,
            minor,
            command,
            tag,
            arg: Some(arg),
        })
    }
}
