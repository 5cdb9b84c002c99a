use simple_ssdp_protocol::multicast_group;
use std::net::Ipv4Addr;
use std::net::SocketAddrV4;
use thiserror::Error;

/// How an M-SEARCH for something other than `ssdp:all` is answered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SearchMatch {
    /// Every registered service is sent back regardless of the search target.
    #[default]
    EchoAll,

    /// Only advertised USNs whose type equals the search target.
    Exact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpConfig {
    pub device_name: String,

    /// Port of the description server, also bound for unicast search responses.
    pub port: u16,

    /// Path of the description document, starting with `/`.
    pub location: String,

    pub product: String,
    pub product_version: String,
    pub multicast_address: SocketAddrV4,

    /// Host advertised in `LOCATION`. Detected from the routing table when absent.
    pub host: Option<Ipv4Addr>,

    pub search_match: SearchMatch,
    pub multicast_loop: bool,
}

impl SsdpConfig {
    pub fn new(
        device_name: impl Into<String>,
        port: u16,
        location: impl Into<String>,
        product: impl Into<String>,
        product_version: impl Into<String>,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            port,
            location: location.into(),
            product: product.into(),
            product_version: product_version.into(),
            multicast_address: multicast_group(),
            host: None,
            search_match: SearchMatch::default(),
            multicast_loop: true,
        }
    }

    pub fn with_multicast_address(mut self, multicast_address: SocketAddrV4) -> Self {
        self.multicast_address = multicast_address;
        self
    }

    pub fn with_host(mut self, host: Ipv4Addr) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_search_match(mut self, search_match: SearchMatch) -> Self {
        self.search_match = search_match;
        self
    }

    pub fn with_multicast_loop(mut self, multicast_loop: bool) -> Self {
        self.multicast_loop = multicast_loop;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.device_name.trim().is_empty() {
            return Err(ConfigError::EmptyDeviceName);
        }
        if self.product.trim().is_empty() {
            return Err(ConfigError::EmptyProduct);
        }
        if !self.location.starts_with('/') {
            return Err(ConfigError::InvalidLocation(self.location.clone()));
        }
        Ok(())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port")]
    InvalidPort,

    #[error("Device name must not be empty")]
    EmptyDeviceName,

    #[error("Product must not be empty")]
    EmptyProduct,

    #[error("Location `{0}` must be a path starting with `/`")]
    InvalidLocation(String),
}

#[cfg(test)]
mod test {
    use super::*;

    fn config() -> SsdpConfig {
        SsdpConfig::new("Printer", 8080, "/description.xml", "PrintServer", "1.0")
    }

    #[test]
    fn defaults() {
        let config = config();

        assert_eq!(
            config.multicast_address,
            SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900)
        );
        assert_eq!(config.search_match, SearchMatch::EchoAll);
        assert_eq!(config.host, None);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn invalid_port() {
        let config = SsdpConfig {
            port: 0,
            ..config()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn empty_device_name() {
        let config = SsdpConfig {
            device_name: " ".into(),
            ..config()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyDeviceName));
    }

    #[test]
    fn relative_location() {
        let config = SsdpConfig {
            location: "description.xml".into(),
            ..config()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLocation("description.xml".into()))
        );
    }
}
