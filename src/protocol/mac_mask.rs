//! MAC Mask List argument (AoEr11, Section 3.3).

use super::WireError;

/// Minimum length of an encoded MAC mask argument.
///
///   1 byte : reserved
///   1 byte : MAC mask command
///   1 byte : MAC mask error
///   1 byte : directive count
/// 8*N bytes: directives
const MAC_MASK_ARG_LEN: usize = 1 + 1 + 1 + 1;

/// Exact length of an encoded directive.
///
/// 1 byte : reserved
/// 1 byte : directive command
/// 6 bytes: ethernet address
const DIRECTIVE_LEN: usize = 1 + 1 + 6;

/// MAC mask subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MacMaskCommand {
    /// Read the server's MAC mask list.
    Read = 0,
    /// Edit the server's MAC mask list.
    Edit = 1,
}

impl TryFrom<u8> for MacMaskCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MacMaskCommand::Read),
            1 => Ok(MacMaskCommand::Edit),
            other => Err(other),
        }
    }
}

/// Errors a server reports while processing a directive list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MacMaskError {
    Unspecified = 1,
    BadCommand = 2,
    ListFull = 3,
}

impl TryFrom<u8> for MacMaskError {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MacMaskError::Unspecified),
            2 => Ok(MacMaskError::BadCommand),
            3 => Ok(MacMaskError::ListFull),
            other => Err(other),
        }
    }
}

/// Per-directive subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DirectiveCommand {
    /// No processing for this directive.
    None = 0,
    /// Add the MAC address to the mask list.
    Add = 1,
    /// Delete the MAC address from the mask list.
    Delete = 2,
}

impl TryFrom<u8> for DirectiveCommand {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DirectiveCommand::None),
            1 => Ok(DirectiveCommand::Add),
            2 => Ok(DirectiveCommand::Delete),
            other => Err(other),
        }
    }
}

/// One entry of a MAC mask edit: a command and the hardware address it
/// applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directive {
    /// Raw subcommand; interpret with [`Directive::directive_command`].
    pub command: u8,

    /// Hardware address. Must be exactly 6 bytes to encode.
    pub mac: Vec<u8>,
}

impl Directive {
    /// Typed view of the directive subcommand.
    pub fn directive_command(&self) -> Result<DirectiveCommand, u8> {
        DirectiveCommand::try_from(self.command)
    }

    /// Encode into wire form. Fails with `BadArgument` unless the MAC is
    /// exactly 6 bytes.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if self.mac.len() != 6 {
            return Err(WireError::BadArgument);
        }

        let mut b = vec![0u8; DIRECTIVE_LEN];

        // Byte 0 reserved.
        b[1] = self.command;
        b[2..].copy_from_slice(&self.mac);

        Ok(b)
    }

    /// Decode from wire form. Requires exactly 8 bytes (`UnexpectedEof`
    /// otherwise) with a zero reserved byte (`BadArgument` otherwise).
    pub fn decode(b: &[u8]) -> Result<Self, WireError> {
        if b.len() != DIRECTIVE_LEN {
            return Err(WireError::UnexpectedEof);
        }

        if b[0] != 0 {
            return Err(WireError::BadArgument);
        }

        Ok(Self {
            command: b[1],
            mac: b[2..].to_vec(),
        })
    }
}

/// Argument to command 2, MAC Mask List.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacMaskArg {
    /// Raw subcommand; interpret with [`MacMaskArg::mac_command`].
    pub command: u8,

    /// Raw directive-list error, if any; interpret with
    /// [`MacMaskArg::mac_error`].
    pub error: u8,

    /// Number of directives. Must match `directives.len()` on encode.
    pub dir_count: u8,

    pub directives: Vec<Directive>,
}

impl MacMaskArg {
    /// Typed view of the MAC mask subcommand.
    pub fn mac_command(&self) -> Result<MacMaskCommand, u8> {
        MacMaskCommand::try_from(self.command)
    }

    /// Typed view of the directive-list error.
    pub fn mac_error(&self) -> Result<MacMaskError, u8> {
        MacMaskError::try_from(self.error)
    }

    /// Encode into wire form. Fails with `BadArgument` when `dir_count`
    /// disagrees with the directive list or any directive is malformed.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        if self.dir_count as usize != self.directives.len() {
            return Err(WireError::BadArgument);
        }

        let mut b = vec![0u8; MAC_MASK_ARG_LEN + DIRECTIVE_LEN * self.dir_count as usize];

        // Byte 0 reserved.
        b[1] = self.command;
        b[2] = self.error;
        b[3] = self.dir_count;

        let mut n = MAC_MASK_ARG_LEN;
        for d in &self.directives {
            b[n..n + DIRECTIVE_LEN].copy_from_slice(&d.encode()?);
            n += DIRECTIVE_LEN;
        }

        Ok(b)
    }

    /// Decode from wire form.
    ///
    /// Fails with `UnexpectedEof` when shorter than 4 bytes or when the
    /// remaining span is not exactly `8 * dir_count`, and with
    /// `BadArgument` when the reserved byte is non-zero or a directive is
    /// malformed.
    pub fn decode(b: &[u8]) -> Result<Self, WireError> {
        if b.len() < MAC_MASK_ARG_LEN {
            return Err(WireError::UnexpectedEof);
        }

        if b[0] != 0 {
            return Err(WireError::BadArgument);
        }

        let command = b[1];
        let error = b[2];
        let dir_count = b[3];

        let tail = &b[MAC_MASK_ARG_LEN..];
        if tail.len() != DIRECTIVE_LEN * dir_count as usize {
            return Err(WireError::UnexpectedEof);
        }

        let mut directives = Vec::with_capacity(dir_count as usize);
        for chunk in tail.chunks_exact(DIRECTIVE_LEN) {
            directives.push(Directive::decode(chunk)?);
        }

        Ok(Self {
            command,
            error,
            dir_count,
            directives,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(b: [u8; 6]) -> Vec<u8> {
        b.to_vec()
    }

    #[test]
    fn encode_count_mismatch() {
        let arg = MacMaskArg {
            dir_count: 1,
            ..Default::default()
        };
        assert_eq!(arg.encode(), Err(WireError::BadArgument));
    }

    #[test]
    fn encode_malformed_directive() {
        let arg = MacMaskArg {
            dir_count: 1,
            directives: vec![Directive {
                command: 0,
                mac: vec![0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0x00],
            }],
            ..Default::default()
        };
        assert_eq!(arg.encode(), Err(WireError::BadArgument));
    }

    #[test]
    fn encode_no_directives() {
        assert_eq!(MacMaskArg::default().encode().unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn encode_three_directives() {
        let arg = MacMaskArg {
            dir_count: 3,
            directives: vec![
                Directive {
                    command: 1,
                    mac: mac([0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD]),
                },
                Directive {
                    command: 2,
                    mac: mac([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
                },
                Directive {
                    command: 3,
                    mac: mac([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            arg.encode().unwrap(),
            vec![
                0, 0, 0, 3,
                0, 1, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD,
                0, 2, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
                0, 3, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55,
            ]
        );
    }

    #[test]
    fn decode_too_short() {
        assert_eq!(
            MacMaskArg::decode(&[0u8; MAC_MASK_ARG_LEN - 1]),
            Err(WireError::UnexpectedEof)
        );
    }

    #[test]
    fn decode_reserved_not_zero() {
        assert_eq!(
            MacMaskArg::decode(&[255, 0, 0, 0]),
            Err(WireError::BadArgument)
        );
    }

    #[test]
    fn decode_missing_directives() {
        // dir_count 1 but a zero-directive tail
        assert_eq!(
            MacMaskArg::decode(&[0, 0, 0, 1]),
            Err(WireError::UnexpectedEof)
        );
    }

    #[test]
    fn decode_bad_directive() {
        assert_eq!(
            MacMaskArg::decode(&[0, 0, 0, 1, 1, 1, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD]),
            Err(WireError::BadArgument)
        );
    }

    #[test]
    fn decode_one_directive() {
        let arg =
            MacMaskArg::decode(&[0, 0, 0, 1, 0, 1, 0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD]).unwrap();
        assert_eq!(
            arg,
            MacMaskArg {
                command: 0,
                error: 0,
                dir_count: 1,
                directives: vec![Directive {
                    command: 1,
                    mac: mac([0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD]),
                }],
            }
        );
        assert_eq!(arg.mac_command(), Ok(MacMaskCommand::Read));
        assert_eq!(arg.directives[0].directive_command(), Ok(DirectiveCommand::Add));
    }

    #[test]
    fn decode_empty_list() {
        let arg = MacMaskArg::decode(&[0, 1, 0, 0]).unwrap();
        assert_eq!(arg.dir_count, 0);
        assert!(arg.directives.is_empty());
        assert_eq!(arg.encode().unwrap(), vec![0, 1, 0, 0]);
    }

    #[test]
    fn directive_decode_wrong_length() {
        assert_eq!(
            Directive::decode(&[0u8; DIRECTIVE_LEN - 1]),
            Err(WireError::UnexpectedEof)
        );
        assert_eq!(
            Directive::decode(&[0u8; DIRECTIVE_LEN + 1]),
            Err(WireError::UnexpectedEof)
        );
    }

    #[test]
    fn directive_decode_reserved_not_zero() {
        assert_eq!(
            Directive::decode(&[255, 0, 0, 0, 0, 0, 0, 0]),
            Err(WireError::BadArgument)
        );
    }

    #[test]
    fn directive_encode_wrong_mac_length() {
        for len in [5usize, 7] {
            let d = Directive {
                command: 1,
                mac: vec![0; len],
            };
            assert_eq!(d.encode(), Err(WireError::BadArgument));
        }
    }

    #[test]
    fn directive_round_trip() {
        let d = Directive {
            command: 1,
            mac: mac([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
        };
        let b = d.encode().unwrap();
        assert_eq!(b, vec![0, 1, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(Directive::decode(&b).unwrap(), d);
    }
}
