//! SSDP (Simple Service Discovery Protocol) search client
//!
//! Sends one M-SEARCH to the UPnP multicast group and yields the unicast
//! responses that arrive before the socket's read timeout.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{DiscoveryError, Result};
use crate::handle::InterfaceOrigin;

/// UPnP multicast group and port
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Search target matching every device and service
pub const SEARCH_ALL: &str = "ssdp:all";

/// Search target matching root devices only
pub const SEARCH_ROOT_DEVICES: &str = "upnp:rootdevice";

/// `NTS` of an announcement from a device joining the network
const NTS_ALIVE: &str = "ssdp:alive";

/// `NTS` of an announcement from a device whose description changed
const NTS_UPDATE: &str = "ssdp:update";

/// One response to an M-SEARCH
#[derive(Debug, Clone, PartialEq)]
pub struct SsdpResponse {
    /// URL of the root description document
    pub location: String,
    /// Search target the response answers (`ST`)
    pub search_target: String,
    /// Unique service name, `uuid:<device>[::<type>]`
    pub usn: String,
    pub server: Option<String>,
    /// Address the response came from
    pub from: Option<SocketAddr>,
}

impl SsdpResponse {
    /// The device UDN part of the USN
    pub fn udn(&self) -> &str {
        self.usn.split("::").next().unwrap_or_default().trim()
    }

    /// True for the `upnp:rootdevice` announcement of a device
    pub fn is_root_device(&self) -> bool {
        self.search_target.eq_ignore_ascii_case(SEARCH_ROOT_DEVICES)
            || self.usn.ends_with("::upnp:rootdevice")
    }
}

/// SSDP client for device discovery
pub struct SsdpClient {
    socket: UdpSocket,
    mx: u8,
    user_agent: String,
}

impl SsdpClient {
    /// Create a client on all interfaces with the specified read timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::bind(IpAddr::V4(Ipv4Addr::UNSPECIFIED), timeout)
    }

    /// Create a client bound to one local interface address
    pub fn bind(local: IpAddr, timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind(SocketAddr::new(local, 0))
            .map_err(|e| DiscoveryError::network("failed to bind UDP socket", e))?;

        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| DiscoveryError::network("failed to set read timeout", e))?;

        socket
            .set_multicast_loop_v4(true)
            .map_err(|e| DiscoveryError::network("failed to set multicast loop", e))?;

        Ok(Self {
            socket,
            mx: 2,
            user_agent: concat!("upnp-sdk/", env!("CARGO_PKG_VERSION"), " UPnP/1.1").to_string(),
        })
    }

    /// Maximum response delay devices may pick, in seconds (clamped to 1..=5)
    pub fn with_mx(mut self, mx: u8) -> Self {
        self.mx = mx.clamp(1, 5);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Interface origin stamped on events from this client
    pub fn origin(&self) -> InterfaceOrigin {
        let address = self
            .socket
            .local_addr()
            .ok()
            .map(|addr| addr.ip())
            .filter(|ip| !ip.is_unspecified());
        InterfaceOrigin::new(0, address)
    }

    /// Send an M-SEARCH request and return an iterator of responses
    pub fn search(&self, search_target: &str) -> Result<SsdpResponseIterator<'_>> {
        let request = search_request(search_target, self.mx, &self.user_agent);
        debug!(search_target = %search_target, mx = self.mx, "Sending M-SEARCH");

        self.socket
            .send_to(request.as_bytes(), SSDP_MULTICAST_ADDR)
            .map_err(|e| DiscoveryError::network("failed to send M-SEARCH", e))?;

        Ok(SsdpResponseIterator::new(&self.socket))
    }
}

fn search_request(search_target: &str, mx: u8, user_agent: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: {}\r\n\
         ST: {}\r\n\
         USER-AGENT: {}\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, mx, search_target, user_agent
    )
}

/// Iterator over SSDP responses, ending at the read timeout
pub struct SsdpResponseIterator<'a> {
    socket: &'a UdpSocket,
    buffer: [u8; 2048],
    finished: bool,
}

impl<'a> SsdpResponseIterator<'a> {
    fn new(socket: &'a UdpSocket) -> Self {
        Self {
            socket,
            buffer: [0; 2048],
            finished: false,
        }
    }
}

impl<'a> Iterator for SsdpResponseIterator<'a> {
    type Item = Result<SsdpResponse>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.socket.recv_from(&mut self.buffer) {
                Ok((size, from)) => {
                    let Ok(text) = std::str::from_utf8(&self.buffer[..size]) else {
                        trace!(from = %from, "Ignoring non UTF-8 SSDP datagram");
                        continue;
                    };
                    match parse_ssdp_response(text) {
                        Some(mut response) => {
                            response.from = Some(from);
                            return Some(Ok(response));
                        }
                        None => trace!(from = %from, "Ignoring malformed SSDP datagram"),
                    }
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    self.finished = true;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(DiscoveryError::network("socket error", e)));
                }
            }
        }
        None
    }
}

/// Parse an SSDP response from HTTP text
pub fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
    let mut lines = response.lines();
    let status = lines.next()?.trim();
    // search responses are `HTTP/1.1 200 OK`; NOTIFY is accepted only while the device is alive
    let notify = status.starts_with("NOTIFY");
    if !status.starts_with("HTTP/") && !notify {
        return None;
    }

    let mut location = None;
    let mut search_target = None;
    let mut usn = None;
    let mut server = None;
    let mut notification = None;

    for line in lines {
        let line = line.trim();

        if let Some(value) = extract_header_value(line, "LOCATION:") {
            location = Some(value);
        } else if let Some(value) = extract_header_value(line, "ST:") {
            search_target = Some(value);
        } else if let Some(value) = extract_header_value(line, "NT:") {
            search_target.get_or_insert(value);
        } else if let Some(value) = extract_header_value(line, "USN:") {
            usn = Some(value);
        } else if let Some(value) = extract_header_value(line, "SERVER:") {
            server = Some(value);
        } else if let Some(value) = extract_header_value(line, "NTS:") {
            notification = Some(value);
        }
    }

    if notify && !matches!(notification.as_deref(), Some(NTS_ALIVE) | Some(NTS_UPDATE)) {
        return None;
    }

    match (location, search_target, usn) {
        (Some(location), Some(search_target), Some(usn)) => Some(SsdpResponse {
            location,
            search_target,
            usn,
            server,
            from: None,
        }),
        _ => None,
    }
}

/// Extract header value from a line like "HEADER: value"
fn extract_header_value(line: &str, header: &str) -> Option<String> {
    if line.len() > header.len()
        && line.is_char_boundary(header.len())
        && line[..header.len()].eq_ignore_ascii_case(header)
    {
        Some(line[header.len()..].trim().to_string())
    } else {
        None
    }
}
