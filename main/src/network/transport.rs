use super::SsdpSocket;
use super::TokioSsdpSocket;
use mockall::automock;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::net::SocketAddrV4;
use std::net::UdpSocket;
use std::sync::Arc;

/// Creates the sockets of a [crate::DiscoveryEngine].
#[automock]
pub trait Transport: Send + Sync {
    /// Binds the group port and joins the multicast group.
    fn bind_multicast(&self, group: SocketAddrV4) -> std::io::Result<Arc<dyn SsdpSocket>>;

    fn bind_unicast(&self, port: u16) -> std::io::Result<Arc<dyn SsdpSocket>>;

    /// Local address of the interface that reaches `destination`.
    fn local_ip(&self, destination: SocketAddrV4) -> std::io::Result<Ipv4Addr>;
}

pub struct TokioTransport {
    multicast_loop: bool,
}

impl TokioTransport {
    pub fn new(multicast_loop: bool) -> Self {
        Self { multicast_loop }
    }
}

impl Transport for TokioTransport {
    fn bind_multicast(&self, group: SocketAddrV4) -> std::io::Result<Arc<dyn SsdpSocket>> {
        Ok(Arc::new(TokioSsdpSocket::bind_multicast(
            group,
            self.multicast_loop,
        )?))
    }

    fn bind_unicast(&self, port: u16) -> std::io::Result<Arc<dyn SsdpSocket>> {
        Ok(Arc::new(TokioSsdpSocket::bind_unicast(port)?))
    }

    fn local_ip(&self, destination: SocketAddrV4) -> std::io::Result<Ipv4Addr> {
        // Connecting a UDP socket only selects a route, nothing is sent.
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(destination)?;
        match socket.local_addr()?.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
            ip => Err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("No usable local IPv4 address, got {}", ip),
            )),
        }
    }
}
