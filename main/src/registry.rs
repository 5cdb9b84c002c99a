use simple_ssdp_protocol::ROOT_DEVICE;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub uuid: Uuid,

    /// Device-type USN, `urn:schemas-upnp-org:device:<name>:1`.
    pub device_type: String,

    pub friendly_name: String,
}

impl DeviceIdentity {
    pub fn new(uuid: Uuid, device_name: &str) -> Self {
        Self {
            uuid,
            device_type: format!("urn:schemas-upnp-org:device:{}:1", device_name),
            friendly_name: device_name.to_owned(),
        }
    }

    /// USNs announced for the root device, in announcement order.
    pub fn root_usns(&self) -> [String; 3] {
        [
            ROOT_DEVICE.to_owned(),
            self.uuid.to_string(),
            self.device_type.clone(),
        ]
    }
}

/// Services advertised by a device, in registration order.
///
/// Registering the same URN twice advertises it twice.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    identity: DeviceIdentity,
    services: Vec<String>,
}

impl ServiceRegistry {
    pub fn new(identity: DeviceIdentity) -> Self {
        Self {
            identity,
            services: Vec::default(),
        }
    }

    pub fn register(&mut self, service_urn: &str) {
        let usn = format!("{}::{}", self.identity.uuid, service_urn);
        log::debug!("Registered service {}", usn);
        self.services.push(usn);
    }

    pub fn count(&self) -> usize {
        self.services.len()
    }

    pub fn services(&self) -> &[String] {
        &self.services
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Root-device USNs followed by every service.
    pub fn advertised_usns(&self) -> Vec<String> {
        self.identity
            .root_usns()
            .into_iter()
            .chain(self.services.iter().cloned())
            .collect()
    }
}
