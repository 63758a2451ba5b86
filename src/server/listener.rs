//! Raw-Ethernet listener.
//!
//! Receives AoE frames on a network interface via pnet, feeds requests to
//! the server, and broadcasts periodic discovery advertisements.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use thiserror::Error;

use crate::protocol::ata::ServeError;
use crate::protocol::{Command, Header, ResponseSender, WireError, BROADCAST_MAC, ETHERTYPE, VERSION};
use crate::server::Server;

const ETHERNET_HEADER_LEN: usize = 14;

/// Listener setup and runtime errors.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("interface {0} has no hardware address")]
    NoHardwareAddress(String),

    #[error("unsupported datalink channel type")]
    UnsupportedChannel,

    #[error("wire format error: {0}")]
    Wire(#[from] WireError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// AoE network listener: one server bound to one interface.
pub struct Listener {
    interface: NetworkInterface,
    local_mac: [u8; 6],
    tx: Arc<Mutex<Box<dyn DataLinkSender>>>,
    rx: Box<dyn DataLinkReceiver>,
    server: Server,
    advertise_interval: Duration,
}

impl Listener {
    /// Open a datalink channel on the named interface.
    ///
    /// A zero `advertise_interval` disables the discovery broadcast.
    pub fn new(
        interface_name: &str,
        server: Server,
        advertise_interval: Duration,
    ) -> Result<Self, ListenerError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == interface_name)
            .ok_or_else(|| ListenerError::InterfaceNotFound(interface_name.to_string()))?;

        let local_mac = interface
            .mac
            .ok_or_else(|| ListenerError::NoHardwareAddress(interface_name.to_string()))?
            .octets();

        let (tx, rx) = match datalink::channel(&interface, Default::default()) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(ListenerError::UnsupportedChannel),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            interface,
            local_mac,
            tx: Arc::new(Mutex::new(tx)),
            rx,
            server,
            advertise_interval,
        })
    }

    /// Run the receive loop. Does not return except on a receive error.
    pub fn run(&mut self) -> Result<(), ListenerError> {
        log::info!(
            "serving shelf {} slot {} on {} ({})",
            self.server.major,
            self.server.minor,
            self.interface.name,
            format_mac(self.local_mac),
        );

        self.spawn_advertiser()?;

        loop {
            let frame = self.rx.next()?.to_vec();
            self.handle_frame(&frame);
        }
    }

    /// Filter and dispatch one received frame.
    ///
    /// Frames that are not AoE requests for this server, and frames that do
    /// not decode, are dropped without a reply.
    fn handle_frame(&mut self, frame: &[u8]) {
        if frame.len() < ETHERNET_HEADER_LEN {
            return;
        }

        let ethertype = u16::from_be_bytes([frame[12], frame[13]]);
        if ethertype != ETHERTYPE {
            return;
        }

        let mut src_mac = [0u8; 6];
        src_mac.copy_from_slice(&frame[6..12]);

        let header = match Header::decode(&frame[ETHERNET_HEADER_LEN..]) {
            Ok(header) => header,
            Err(e) => {
                log::debug!("dropping undecodable frame from {}: {e}", format_mac(src_mac));
                return;
            }
        };

        if header.flag_response {
            return;
        }
        if !self.server.accepts(&header) {
            return;
        }

        log::debug!(
            "request from {}: {:?} major={} minor={} tag={:02X?}",
            format_mac(src_mac),
            header.command,
            header.major,
            header.minor,
            header.tag,
        );

        let mut sender = FrameSender {
            tx: Arc::clone(&self.tx),
            source: self.local_mac,
            dest: src_mac,
            major: self.server.major,
            minor: self.server.minor,
            command: header.command,
            tag: header.tag,
        };

        self.server.handle(&header, &mut sender);
    }

    /// Start the discovery ticker: the advertisement frame is built once
    /// and rebroadcast on every interval.
    fn spawn_advertiser(&self) -> Result<(), ListenerError> {
        if self.advertise_interval.is_zero() {
            return Ok(());
        }

        let payload = self.server.advertisement().encode()?;
        let frame = build_frame(BROADCAST_MAC, self.local_mac, &payload);
        let tx = Arc::clone(&self.tx);
        let interval = self.advertise_interval;

        thread::spawn(move || loop {
            if let Err(e) = send_frame(&tx, &frame) {
                log::warn!("advertisement failed: {e}");
            }
            thread::sleep(interval);
        });

        Ok(())
    }
}

/// Per-request reply channel: stamps outbound identity and wraps the
/// payload in an Ethernet frame back to the requester.
struct FrameSender {
    tx: Arc<Mutex<Box<dyn DataLinkSender>>>,
    source: [u8; 6],
    dest: [u8; 6],
    major: u16,
    minor: u8,
    command: Command,
    tag: [u8; 4],
}

impl ResponseSender for FrameSender {
    fn send(&mut self, mut header: Header) -> Result<usize, ServeError> {
        stamp_response(&mut header, self.major, self.minor, self.command, self.tag);

        let payload = header.encode()?;
        let frame = build_frame(self.dest, self.source, &payload);
        send_frame(&self.tx, &frame)?;

        Ok(frame.len())
    }
}

/// Outgoing traffic is always a response from this server: the version,
/// response flag, and server address are stamped, and the request's command
/// and tag echoed. Handlers control only the argument and error fields.
fn stamp_response(header: &mut Header, major: u16, minor: u8, command: Command, tag: [u8; 4]) {
    header.version = VERSION;
    header.flag_response = true;
    header.major = major;
    header.minor = minor;
    header.command = command;
    header.tag = tag;
}

fn build_frame(dest: [u8; 6], source: [u8; 6], payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(ETHERNET_HEADER_LEN + payload.len());
    frame.extend_from_slice(&dest);
    frame.extend_from_slice(&source);
    frame.extend_from_slice(&ETHERTYPE.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

fn send_frame(tx: &Arc<Mutex<Box<dyn DataLinkSender>>>, frame: &[u8]) -> io::Result<()> {
    let mut tx = tx.lock().unwrap();
    match tx.send_to(frame, None) {
        Some(result) => result,
        None => Err(io::Error::new(
            io::ErrorKind::Other,
            "datalink sender refused frame",
        )),
    }
}

fn format_mac(mac: [u8; 6]) -> String {
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_layout() {
        let frame = build_frame([0xFF; 6], [1, 2, 3, 4, 5, 6], &[0xAA, 0xBB]);

        assert_eq!(&frame[0..6], &[0xFF; 6]);
        assert_eq!(&frame[6..12], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&frame[12..14], &ETHERTYPE.to_be_bytes());
        assert_eq!(&frame[14..], &[0xAA, 0xBB]);
    }

    #[test]
    fn responses_carry_server_identity() {
        use crate::protocol::{Arg, AtaArg};

        // A handler reply carries only an argument; identity comes from
        // the request and the server, even for wildcard-addressed requests.
        let mut header = Header {
            arg: Some(Arg::Ata(AtaArg::default())),
            ..Default::default()
        };
        stamp_response(&mut header, 7, 3, Command::IssueAta, [9, 9, 9, 9]);

        assert_eq!(header.version, VERSION);
        assert!(header.flag_response);
        assert_eq!(header.major, 7);
        assert_eq!(header.minor, 3);
        assert_eq!(header.command, Command::IssueAta);
        assert_eq!(header.tag, [9, 9, 9, 9]);
        header.encode().unwrap();
    }

    #[test]
    fn mac_formatting() {
        assert_eq!(
            format_mac([0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01]),
            "de:ad:be:ef:00:01"
        );
    }
}
