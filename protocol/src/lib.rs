//! SSDP wire format.

mod encode;
mod headers;
mod message;

pub use encode::encode_msearch;
pub use encode::encode_notify_alive;
pub use encode::encode_notify_byebye;
pub use encode::encode_response;
pub use encode::encode_response_at;
pub use encode::notification_type;
pub use headers::Headers;
pub use message::parse_max_age;
pub use message::Notification;
pub use message::NotificationSubType;
pub use message::SearchRequest;
pub use message::SearchResponse;
pub use message::SsdpMessage;

use bytes::BytesMut;
use std::net::Ipv4Addr;
use std::net::SocketAddrV4;
use tokio_util::codec::Decoder;

/// Well-known SSDP multicast group.
pub const MULTICAST_IP: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Well-known SSDP port.
pub const MULTICAST_PORT: u16 = 1900;

pub const ROOT_DEVICE: &str = "upnp:rootdevice";

/// Search target matching every device and service.
pub const SEARCH_ALL: &str = "ssdp:all";

/// NT of every `ssdp:byebye` notification.
pub const DISCOVERY_SERVICE_TYPE: &str = "urn:schemas-upnp-org:service:DiscoveryService:1";

pub fn multicast_group() -> SocketAddrV4 {
    SocketAddrV4::new(MULTICAST_IP, MULTICAST_PORT)
}

/// Decodes each UDP datagram into one [SsdpMessage].
///
/// Decoding never fails on malformed text: lines that are not headers are
/// dropped and invalid UTF-8 is replaced.
#[derive(Default)]
pub struct SsdpDecoder;

impl Decoder for SsdpDecoder {
    type Item = SsdpMessage;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let datagram = src.split();
        Ok(Some(SsdpMessage::parse(&String::from_utf8_lossy(&datagram))))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_datagram() {
        let mut bytes = BytesMut::from(
            "NOTIFY * HTTP/1.1\r\nNT: upnp:rootdevice\r\nNTS: ssdp:alive\r\nUSN: abc\r\n\r\n",
        );

        // When
        let message = SsdpDecoder.decode(&mut bytes).unwrap().unwrap();

        // Then
        if let SsdpMessage::Notify(notification) = message {
            assert_eq!(notification.notification_type.as_deref(), Some(ROOT_DEVICE));
            assert_eq!(notification.sub_type, Some(NotificationSubType::Alive));
        } else {
            panic!("Expecting `Notify`");
        }
        assert!(bytes.is_empty(), "The whole datagram must be consumed");
    }

    #[test]
    fn decode_empty_datagram() {
        let actual = SsdpDecoder.decode(&mut Default::default()).unwrap();
        assert_eq!(actual, None);
    }

    #[test]
    fn decode_invalid_utf8() {
        let mut bytes = BytesMut::from(&b"HTTP/1.1 200 OK\r\nST: \xff\xfe\r\n\r\n"[..]);

        let message = SsdpDecoder.decode(&mut bytes).unwrap().unwrap();

        assert!(matches!(message, SsdpMessage::Response(_)));
        assert!(message.headers().get("st").is_some());
    }
}
