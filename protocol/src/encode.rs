use chrono::DateTime;
use chrono::Utc;
use std::net::SocketAddrV4;

/// First token of the `SERVER` header.
const PLATFORM: &str = concat!("simple-ssdp/", env!("CARGO_PKG_VERSION"));

const CACHE_CONTROL: &str = "max-age = 1800";

/// Derives the NT or ST header of a USN.
///
/// For `<uuid>::<urn>` this is `<urn>`. A USN without `::`, such as
/// `upnp:rootdevice` or a bare UUID, is its own type.
pub fn notification_type(usn: &str) -> &str {
    match usn.find("::") {
        Some(delimiter) => usn[delimiter + 2..].trim(),
        None => usn.trim(),
    }
}

pub fn encode_msearch(search_target: &str, destination: SocketAddrV4) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 3\r\n\
         ST: {}\r\n\
         \r\n",
        destination, search_target
    )
}

pub fn encode_response(location: &str, usn: &str, product: &str, product_version: &str) -> String {
    encode_response_at(location, usn, product, product_version, Utc::now())
}

pub fn encode_response_at(
    location: &str,
    usn: &str,
    product: &str,
    product_version: &str,
    date: DateTime<Utc>,
) -> String {
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: {}\r\n\
         DATE: {}\r\n\
         EXT:\r\n\
         LOCATION: http://{}\r\n\
         SERVER: {}\r\n\
         ST: {}\r\n\
         USN: {}\r\n\
         \r\n",
        CACHE_CONTROL,
        date.format("%a, %d %b %Y %H:%M:%S GMT"),
        location,
        server(product, product_version),
        notification_type(usn),
        usn
    )
}

pub fn encode_notify_alive(
    multicast_address: SocketAddrV4,
    location: &str,
    usn: &str,
    product: &str,
    product_version: &str,
) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
         HOST: {}\r\n\
         CACHE-CONTROL: {}\r\n\
         LOCATION: http://{}\r\n\
         NT: {}\r\n\
         NTS: ssdp:alive\r\n\
         SERVER: {}\r\n\
         USN: {}\r\n\
         \r\n",
        multicast_address,
        CACHE_CONTROL,
        location,
        notification_type(usn),
        server(product, product_version),
        usn
    )
}

pub fn encode_notify_byebye(multicast_address: SocketAddrV4, usn: &str) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
         HOST: {}\r\n\
         NT: {}\r\n\
         NTS: ssdp:byebye\r\n\
         USN: {}\r\n\
         \r\n",
        multicast_address,
        crate::DISCOVERY_SERVICE_TYPE,
        usn
    )
}

fn server(product: &str, product_version: &str) -> String {
    format!("{} UPnP/1.1 {}/{}", PLATFORM, product, product_version)
}
