use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use futures_util::FutureExt;
use futures_util::StreamExt;
use mockall::automock;
use simple_ssdp_protocol::SsdpDecoder;
use simple_ssdp_protocol::SsdpMessage;
use socket2::Domain;
use socket2::Protocol;
use socket2::Socket;
use socket2::Type;
use std::net::Ipv4Addr;
use std::net::SocketAddr;
use std::net::SocketAddrV4;
use std::net::UdpSocket as StdUdpSocket;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tokio_util::udp::UdpFramed;

/// A bound UDP socket carrying SSDP messages.
#[automock]
pub trait SsdpSocket: Send + Sync {
    fn send_to(
        &self,
        data: Arc<[u8]>,
        destination: SocketAddrV4,
    ) -> BoxFuture<'static, std::io::Result<()>>;

    /// Datagrams in arrival order until the socket is closed.
    fn receive(&self) -> BoxStream<'static, std::io::Result<(SsdpMessage, SocketAddrV4)>>;

    fn close(&self);
}

pub struct TokioSsdpSocket {
    socket: Arc<UdpSocket>,
    closed: CancellationToken,
}

impl TokioSsdpSocket {
    /// Binds the group port on all interfaces and joins the group.
    ///
    /// Must be called within a Tokio runtime.
    pub fn bind_multicast(group: SocketAddrV4, multicast_loop: bool) -> std::io::Result<Self> {
        let socket = new_reusable_socket()?;
        socket.set_multicast_loop_v4(multicast_loop)?;
        let bind_address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port());
        socket.bind(&bind_address.into())?;
        log::info!("Multicast socket listening at {}", bind_address);

        log::info!("Joining multicast group {}", group.ip());
        socket.join_multicast_v4(group.ip(), &Ipv4Addr::UNSPECIFIED)?;

        Ok(Self::new(new_async_socket(socket)?))
    }

    /// Must be called within a Tokio runtime.
    pub fn bind_unicast(port: u16) -> std::io::Result<Self> {
        let socket = new_reusable_socket()?;
        let bind_address = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        socket.bind(&bind_address.into())?;
        log::info!("Unicast socket bound at {}", bind_address);
        Ok(Self::new(new_async_socket(socket)?))
    }

    pub fn local_address(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    fn new(socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
            closed: CancellationToken::new(),
        }
    }

    async fn send(
        socket: Arc<UdpSocket>,
        closed: CancellationToken,
        data: Arc<[u8]>,
        destination: SocketAddrV4,
    ) -> std::io::Result<()> {
        if closed.is_cancelled() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Socket is closed",
            ));
        }
        socket.send_to(&data, destination).await?;
        Ok(())
    }
}

impl SsdpSocket for TokioSsdpSocket {
    fn send_to(
        &self,
        data: Arc<[u8]>,
        destination: SocketAddrV4,
    ) -> BoxFuture<'static, std::io::Result<()>> {
        Self::send(self.socket.clone(), self.closed.clone(), data, destination).boxed()
    }

    fn receive(&self) -> BoxStream<'static, std::io::Result<(SsdpMessage, SocketAddrV4)>> {
        UdpFramed::new(self.socket.clone(), SsdpDecoder)
            .take_until(self.closed.clone().cancelled_owned())
            .filter_map(|r| async { extract_ipv4(r) })
            .boxed()
    }

    fn close(&self) {
        if !self.closed.is_cancelled() {
            log::debug!("Closing socket at {:?}", self.socket.local_addr());
            self.closed.cancel();
        }
    }
}

fn extract_ipv4(
    result: std::io::Result<(SsdpMessage, SocketAddr)>,
) -> Option<std::io::Result<(SsdpMessage, SocketAddrV4)>> {
    match result {
        Ok((message, SocketAddr::V4(address))) => Some(Ok((message, address))),
        Ok((_, SocketAddr::V6(address))) => {
            log::debug!("Dropping a packet from IPv6 address {}", address);
            None
        }
        Err(e) => Some(Err(e)),
    }
}

fn new_reusable_socket() -> std::io::Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

fn new_async_socket(socket: Socket) -> std::io::Result<UdpSocket> {
    let socket: StdUdpSocket = socket.into();
    socket.try_into()
}

#[cfg(test)]
mod test {
    use super::*;
    use simple_ssdp_protocol::NotificationSubType;

    #[tokio::test]
    async fn unicast_loopback() -> anyhow::Result<()> {
        crate::test::init();

        let receiver = TokioSsdpSocket::bind_unicast(0)?;
        let sender = TokioSsdpSocket::bind_unicast(0)?;
        let destination = SocketAddrV4::new(Ipv4Addr::LOCALHOST, receiver.local_address()?.port());
        let packet: Arc<[u8]> = b"NOTIFY * HTTP/1.1\r\nNTS: ssdp:alive\r\nUSN: abc\r\n\r\n"[..].into();

        // When
        let mut messages = receiver.receive();
        sender.send_to(packet, destination).await?;
        let (message, remote) = messages.next().await.unwrap()?;

        // Then
        assert_eq!(remote.ip(), &Ipv4Addr::LOCALHOST);
        assert_eq!(remote.port(), sender.local_address()?.port());
        if let SsdpMessage::Notify(notification) = message {
            assert_eq!(notification.sub_type, Some(NotificationSubType::Alive));
            assert_eq!(notification.usn.as_deref(), Some("abc"));
        } else {
            panic!("Expecting `Notify`");
        }

        Ok(())
    }

    #[tokio::test]
    async fn closed_socket() -> anyhow::Result<()> {
        crate::test::init();

        let socket = TokioSsdpSocket::bind_unicast(0)?;
        let destination = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9);

        // When
        socket.close();

        // Then
        assert!(socket.receive().next().await.is_none(), "Stream must end");
        let e = socket
            .send_to(b"x"[..].into(), destination)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), std::io::ErrorKind::NotConnected);

        Ok(())
    }
}
