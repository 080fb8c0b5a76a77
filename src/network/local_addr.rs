//! Local address detection
//!
//! Replication skips configured replicas that point at this node. Which IP
//! "this node" has depends on the platform and network, so detection is a
//! plain function value the caller can swap.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Strategy returning this node's outward-facing IP
pub type LocalAddrDetector = fn() -> Option<IpAddr>;

/// Detect the IP the OS would route external traffic from
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub fn detect_local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

/// Detector for nodes that only ever run on one host
pub fn loopback() -> Option<IpAddr> {
    Some(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Run `detect`, falling back to 127.0.0.1
pub fn resolve_local_ip(detect: LocalAddrDetector) -> IpAddr {
    detect().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
