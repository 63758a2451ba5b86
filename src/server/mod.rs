//! AoE server
//!
//! A [`Server`] is one shelf/slot target: identity, advertised limits, the
//! config string, and the backing store it serves. The raw-Ethernet plumbing
//! around it lives in [`listener`].

mod listener;

pub use listener::{Listener, ListenerError};

use crate::protocol::ata::serve_ata;
use crate::protocol::{
    Arg, Command, ConfigArg, ConfigCommand, Header, ProtocolError, ResponseSender,
    BROADCAST_MAJOR, BROADCAST_MINOR, VERSION,
};
use crate::storage::BackingStore;

/// One AoE target.
pub struct Server {
    /// Major (shelf) address.
    pub major: u16,
    /// Minor (slot) address.
    pub minor: u8,

    /// Outstanding messages advertised to initiators.
    pub buffer_count: u16,
    /// Firmware version advertised to initiators.
    pub firmware_version: u16,
    /// Maximum sectors per ATA request advertised to initiators.
    pub sector_count: u8,

    /// Config string answered to discovery queries. At most 1024 bytes.
    pub config: Vec<u8>,

    pub store: Box<dyn BackingStore>,
}

impl Server {
    /// Whether a request header addresses this server, honoring the
    /// broadcast wildcards.
    pub fn accepts(&self, h: &Header) -> bool {
        let major = h.major == self.major || h.major == BROADCAST_MAJOR;
        let minor = h.minor == self.minor || h.minor == BROADCAST_MINOR;
        major && minor
    }

    /// Handle one decoded request, sending at most one reply through `w`.
    ///
    /// Backing-store failures are logged and the request dropped; the
    /// protocol has no way to express them beyond not replying.
    pub fn handle(&mut self, h: &Header, w: &mut dyn ResponseSender) {
        match h.command {
            Command::IssueAta => {
                if let Err(e) = serve_ata(w, h, self.store.as_mut()) {
                    log::error!("ATA request failed: {e}");
                }
            }
            Command::QueryConfig => self.handle_config(h, w),
            Command::MacMaskList | Command::ReserveRelease => {
                // Decoded but unenforced; this server keeps no access
                // control state.
                log::debug!("ignoring {:?} command", h.command);
            }
        }
    }

    fn handle_config(&self, h: &Header, w: &mut dyn ResponseSender) {
        let arg = match &h.arg {
            Some(Arg::Config(arg)) => arg,
            _ => {
                log::warn!("config query without config argument");
                return;
            }
        };

        let reply = match arg.config_command() {
            Ok(ConfigCommand::Read) => Some(self.config_arg()),
            Ok(ConfigCommand::Test) => (arg.string == self.config).then(|| self.config_arg()),
            Ok(ConfigCommand::TestPrefix) => self
                .config
                .starts_with(&arg.string[..])
                .then(|| self.config_arg()),
            Ok(ConfigCommand::Set | ConfigCommand::ForceSet) => {
                // The config string is fixed for the server's lifetime.
                self.send_error(h, w, ProtocolError::ConfigStringPresent);
                return;
            }
            Err(code) => {
                log::warn!("unknown config subcommand: {code:#x}");
                self.send_error(h, w, ProtocolError::UnrecognizedCommandCode);
                return;
            }
        };

        if let Some(arg) = reply {
            if let Err(e) = w.send(Header {
                arg: Some(Arg::Config(arg)),
                ..Default::default()
            }) {
                log::warn!("failed to send config response: {e}");
            }
        }
    }

    fn send_error(&self, h: &Header, w: &mut dyn ResponseSender, err: ProtocolError) {
        let reply = Header {
            flag_error: true,
            error: err.code(),
            arg: h.arg.clone(),
            ..Default::default()
        };

        if let Err(e) = w.send(reply) {
            log::warn!("failed to send error response: {e}");
        }
    }

    /// The config argument describing this server.
    pub fn config_arg(&self) -> ConfigArg {
        ConfigArg {
            buffer_count: self.buffer_count,
            firmware_version: self.firmware_version,
            sector_count: self.sector_count,
            version: VERSION,
            command: ConfigCommand::Read as u8,
            string_length: self.config.len() as u16,
            string: self.config.clone(),
        }
    }

    /// The periodic discovery broadcast: an unsolicited config response
    /// with a zero tag. The advertiser ticker sends this to the Ethernet
    /// broadcast address.
    pub fn advertisement(&self) -> Header {
        Header {
            flag_response: true,
            major: self.major,
            minor: self.minor,
            command: Command::QueryConfig,
            arg: Some(Arg::Config(self.config_arg())),
            ..Default::default()
        }
    }
}
