use serde::Serialize;
use simple_ssdp_protocol::SsdpMessage;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::net::SocketAddrV4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoteInfo {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl RemoteInfo {
    pub fn family(&self) -> &'static str {
        "IPv4"
    }

    pub fn socket_address(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.address, self.port)
    }
}

impl From<SocketAddrV4> for RemoteInfo {
    fn from(address: SocketAddrV4) -> Self {
        Self {
            address: *address.ip(),
            port: address.port(),
        }
    }
}

/// A received SSDP message together with its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SsdpRecord {
    pub message: SsdpMessage,
    pub remote: RemoteInfo,
}

impl SsdpRecord {
    pub fn new(message: SsdpMessage, remote: impl Into<RemoteInfo>) -> Self {
        Self {
            message,
            remote: remote.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.message.headers().get(name)
    }

    /// Headers and sender flattened into one map.
    ///
    /// `address`, `port` and `family` override headers of the same name.
    pub fn fields(&self) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<_, _> = self.message.headers().clone().into_iter().collect();
        fields.insert("address".into(), self.remote.address.to_string());
        fields.insert("port".into(), self.remote.port.to_string());
        fields.insert("family".into(), self.remote.family().into());
        fields
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fields_merge_remote_info() {
        let message = SsdpMessage::parse("NOTIFY * HTTP/1.1\r\nNTS: ssdp:alive\r\nPORT: 1\r\n\r\n");
        let record = SsdpRecord::new(message, "10.0.0.2:1900".parse::<SocketAddrV4>().unwrap());

        // When
        let fields = record.fields();

        // Then
        assert_eq!(fields["nts"], "ssdp:alive");
        assert_eq!(fields["address"], "10.0.0.2");
        assert_eq!(fields["port"], "1900");
        assert_eq!(fields["family"], "IPv4");
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn serialize_to_json() {
        let message = SsdpMessage::parse("HTTP/1.1 200 OK\r\nST: upnp:rootdevice\r\n\r\n");
        let record = SsdpRecord::new(message, "10.0.0.2:50000".parse::<SocketAddrV4>().unwrap());

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["message"]["kind"], "response");
        assert_eq!(json["message"]["search_target"], "upnp:rootdevice");
        assert_eq!(json["remote"]["address"], "10.0.0.2");
        assert_eq!(json["remote"]["port"], 50000);
    }
}
