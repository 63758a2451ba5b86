//! Reserve/Release argument (AoEr11, Section 3.4).

use super::WireError;

/// Minimum length of an encoded reserve/release argument.
///
///   1 byte : reserve/release command
///   1 byte : number of MAC addresses
/// 6*N bytes: MAC addresses
const RESERVE_RELEASE_ARG_LEN: usize = 2;

/// Reserve/release subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReserveReleaseCommand {
    /// Read the server's reserve list.
    Read = 0,
    /// Modify the reserve list, if it is empty or the sender is on it.
    Set = 1,
    /// Forcibly modify the reserve list.
    ForceSet = 2,
}

impl TryFrom<u8> for ReserveReleaseCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReserveReleaseCommand::Read),
            1 => Ok(ReserveReleaseCommand::Set),
            2 => Ok(ReserveReleaseCommand::ForceSet),
            other => Err(other),
        }
    }
}

/// Argument to command 3, Reserve/Release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReserveReleaseArg {
    /// Raw subcommand; interpret with [`ReserveReleaseArg::rr_command`].
    pub command: u8,

    /// Number of hardware addresses. Must match `macs.len()` on encode.
    pub n_macs: u8,

    /// Hardware addresses interacting with the reserve list. Each must be
    /// exactly 6 bytes to encode.
    pub macs: Vec<Vec<u8>>,
}

impl ReserveReleaseArg {
    /// Typed view of the reserve/release subcommand.
    pub fn rr_command(&self) -> Result<ReserveReleaseCommand, u8> {
        ReserveReleaseCommand::try_from(self.command)
    }

    /// Encode into wire form. Fails with `BadArgument` when `n_macs`
    /// disagrees with the list or any address is not 6 bytes.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if self.n_macs as usize != self.macs.len() {
            return Err(WireError::BadArgument);
        }

        let mut b = vec![0u8; RESERVE_RELEASE_ARG_LEN + 6 * self.n_macs as usize];

        b[0] = self.command;
        b[1] = self.n_macs;

        let mut n = RESERVE_RELEASE_ARG_LEN;
        for m in &self.macs {
            if m.len() != 6 {
                return Err(WireError::BadArgument);
            }

            b[n..n + 6].copy_from_slice(m);
            n += 6;
        }

        Ok(b)
    }

    /// Decode from wire form. Fails with `UnexpectedEof` when shorter than
    /// 2 bytes or when the remaining span is not exactly `6 * n_macs`. An
    /// empty address list decodes to an allocated empty list.
    pub fn decode(b: &[u8]) -> Result<Self, WireError> {
        if b.len() < RESERVE_RELEASE_ARG_LEN {
            return Err(WireError::UnexpectedEof);
        }

        let command = b[0];
        let n_macs = b[1];

        let tail = &b[RESERVE_RELEASE_ARG_LEN..];
        if tail.len() != 6 * n_macs as usize {
            return Err(WireError::UnexpectedEof);
        }

        let macs = tail.chunks_exact(6).map(|m| m.to_vec()).collect();

        Ok(Self {
            command,
            n_macs,
            macs,
        })
    }
}
