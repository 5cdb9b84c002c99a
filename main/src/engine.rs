use crate::lock;
use crate::ConfigError;
use crate::DeviceIdentity;
use crate::EventSink;
use crate::IdGenerator;
use crate::SearchMatch;
use crate::ServiceRegistry;
use crate::SsdpConfig;
use crate::SsdpEvent;
use crate::SsdpRecord;
use crate::SsdpSocket;
use crate::TokioTransport;
use crate::Transport;
use crate::UuidGenerator;
use futures_channel::mpsc::UnboundedReceiver;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use simple_ssdp_protocol::encode_msearch;
use simple_ssdp_protocol::encode_notify_alive;
use simple_ssdp_protocol::encode_notify_byebye;
use simple_ssdp_protocol::encode_response;
use simple_ssdp_protocol::notification_type;
use simple_ssdp_protocol::SsdpMessage;
use simple_ssdp_protocol::SEARCH_ALL;
use std::net::SocketAddrV4;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Listening,
    Stopped,
}

/// SSDP device engine.
///
/// Answers searches for the registered services, announces and withdraws them,
/// and publishes every other received message as an [SsdpEvent].
///
/// Sending failures are published as [SsdpEvent::Error] and close the socket
/// involved. Nothing is retried.
pub struct DiscoveryEngine {
    config: SsdpConfig,
    registry: ServiceRegistry,
    location: String,
    transport: Arc<dyn Transport>,
    multicast_socket: Mutex<Option<Arc<dyn SsdpSocket>>>,
    unicast_socket: Mutex<Option<Arc<dyn SsdpSocket>>>,
    state: Mutex<EngineState>,
    receiving: CancellationToken,
    receive_task: Mutex<Option<JoinHandle<()>>>,
    events: EventSink,
}

impl DiscoveryEngine {
    /// Binds the unicast response socket on `config.port`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(config: SsdpConfig) -> Result<Self, EngineError> {
        let transport = Arc::new(TokioTransport::new(config.multicast_loop));
        Self::with_transport(config, transport, &UuidGenerator)
    }

    pub fn with_transport(
        config: SsdpConfig,
        transport: Arc<dyn Transport>,
        id_generator: &dyn IdGenerator,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let identity = DeviceIdentity::new(id_generator.generate(), &config.device_name);
        log::info!("Device UUID is {}", identity.uuid);

        let host = match config.host {
            Some(host) => host,
            None => transport
                .local_ip(config.multicast_address)
                .map_err(EngineError::LocalAddress)?,
        };
        let location = format!("{}:{}{}", host, config.port, config.location);
        log::info!("Description location is http://{}", location);

        let unicast_socket = transport
            .bind_unicast(config.port)
            .map_err(EngineError::UnicastBind)?;

        Ok(Self {
            config,
            registry: ServiceRegistry::new(identity),
            location,
            transport,
            multicast_socket: Mutex::new(None),
            unicast_socket: Mutex::new(Some(unicast_socket)),
            state: Mutex::new(EngineState::Idle),
            receiving: CancellationToken::new(),
            receive_task: Mutex::new(None),
            events: EventSink::default(),
        })
    }

    /// Registers a service to be announced by [Self::start].
    pub fn register(&mut self, service_urn: &str) {
        self.registry.register(service_urn);
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &DeviceIdentity {
        self.registry.identity()
    }

    /// `host:port/path` of the description document, without scheme.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn state(&self) -> EngineState {
        *lock(&self.state)
    }

    pub fn subscribe(&self) -> UnboundedReceiver<SsdpEvent> {
        self.events.subscribe()
    }

    /// Joins the multicast group and announces the device and its services.
    ///
    /// Announcements go out in order: root device, UUID, device type, then the
    /// services in registration order.
    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        let socket = {
            let mut state = lock(&self.state);
            if *state != EngineState::Idle {
                return Err(EngineError::InvalidState {
                    expected: EngineState::Idle,
                    actual: *state,
                });
            }
            let socket = self
                .transport
                .bind_multicast(self.config.multicast_address)
                .map_err(EngineError::MulticastBind)?;
            *lock(&self.multicast_socket) = Some(socket.clone());
            *state = EngineState::Listening;
            socket
        };

        let messages = socket.receive();
        let task = tokio::spawn(Self::receive_loop(
            Arc::downgrade(self),
            messages,
            self.receiving.clone(),
        ));
        *lock(&self.receive_task) = Some(task);

        for usn in self.registry.advertised_usns() {
            self.advertise(&usn).await;
        }
        Ok(())
    }

    /// Withdraws `usn` and closes both sockets.
    ///
    /// Only `usn` is withdrawn, see [Self::withdraw] for the other services.
    /// Nothing is closed if the `ssdp:byebye` cannot be sent. If the multicast
    /// socket is already closed, the `ssdp:byebye` is skipped.
    pub async fn stop(&self, usn: &str) -> Result<(), EngineError> {
        let state = self.state();
        if state == EngineState::Stopped {
            return Err(EngineError::InvalidState {
                expected: EngineState::Listening,
                actual: state,
            });
        }
        match self.withdraw(usn).await {
            Err(EngineError::SocketClosed) => {
                log::warn!("Multicast socket is closed, not withdrawing {}", usn)
            }
            result => result?,
        }

        self.close_multicast();
        if let Some(socket) = lock(&self.unicast_socket).take() {
            socket.close();
        }
        let task = lock(&self.receive_task).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                log::warn!("Receive loop failed: {}", e);
            }
        }
        *lock(&self.state) = EngineState::Stopped;
        log::info!("UDP sockets closed");
        Ok(())
    }

    /// Sends one `ssdp:byebye` for `usn` without closing anything.
    pub async fn withdraw(&self, usn: &str) -> Result<(), EngineError> {
        let socket = self.multicast_socket().ok_or(EngineError::SocketClosed)?;
        let group = self.config.multicast_address;
        let packet = encode_notify_byebye(group, usn);
        log::debug!("Sending ssdp:byebye for {}", usn);
        if let Err(e) = socket.send_to(packet.into_bytes().into(), group).await {
            log::error!("Error sending ssdp:byebye for {}: {}", usn, e);
            return Err(EngineError::Byebye(e));
        }
        Ok(())
    }

    /// Sends an M-SEARCH to the multicast group.
    pub async fn discover(&self, search_target: &str) {
        self.discover_at(search_target, self.config.multicast_address)
            .await
    }

    pub async fn discover_at(&self, search_target: &str, destination: SocketAddrV4) {
        let packet = encode_msearch(search_target, destination);
        log::debug!("Sending M-SEARCH for {} to {}", search_target, destination);
        if let Err(e) = self.send_multicast(packet, destination).await {
            self.publish_error(format!("Error on UDP socket for M-SEARCH: {}", e));
        }
    }

    /// Sends one `ssdp:alive` for `usn` to the multicast group.
    pub async fn advertise(&self, usn: &str) {
        let group = self.config.multicast_address;
        let packet = encode_notify_alive(
            group,
            &self.location,
            usn,
            &self.config.product,
            &self.config.product_version,
        );
        log::debug!("Sending ssdp:alive for {}", usn);
        if let Err(e) = self.send_multicast(packet, group).await {
            self.publish_error(format!("Error sending ssdp:alive: {}", e));
        }
    }

    /// Sends a search response for `usn` through the unicast socket.
    pub async fn respond(&self, usn: &str, destination: SocketAddrV4) {
        let Some(socket) = lock(&self.unicast_socket).clone() else {
            self.publish_error("Error sending response: unicast socket is closed".into());
            return;
        };
        let packet = encode_response(
            &self.location,
            usn,
            &self.config.product,
            &self.config.product_version,
        );
        log::debug!("Sending response for {} to {}", usn, destination);
        if let Err(e) = socket.send_to(packet.into_bytes().into(), destination).await {
            if let Some(socket) = lock(&self.unicast_socket).take() {
                socket.close();
            }
            self.publish_error(format!("Error sending response: {}", e));
        }
    }

    /// Closes the multicast socket if sending fails.
    async fn send_multicast(
        &self,
        packet: String,
        destination: SocketAddrV4,
    ) -> std::io::Result<()> {
        let Some(socket) = self.multicast_socket() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "multicast socket is closed",
            ));
        };
        if let Err(e) = socket.send_to(packet.into_bytes().into(), destination).await {
            log::warn!("Failed to send to {}: {}", destination, e);
            self.close_multicast();
            return Err(e);
        }
        Ok(())
    }

    /// Runs until `receiving` is cancelled or the engine is dropped.
    async fn receive_loop(
        engine: Weak<Self>,
        messages: BoxStream<'static, std::io::Result<(SsdpMessage, SocketAddrV4)>>,
        receiving: CancellationToken,
    ) {
        let mut messages = std::pin::pin!(messages.take_until(receiving.cancelled_owned()));
        while let Some(result) = messages.next().await {
            let Some(engine) = engine.upgrade() else {
                break;
            };
            match result {
                Ok((message, remote)) => engine.handle_message(message, remote).await,
                Err(e) => {
                    engine.close_multicast();
                    engine.publish_error(format!("Error on UDP multicast socket: {}", e));
                    break;
                }
            }
        }
        log::debug!("Multicast receive loop finished");
    }

    async fn handle_message(&self, message: SsdpMessage, remote: SocketAddrV4) {
        if let SsdpMessage::Search(search) = &message {
            let search_target = search.search_target.as_deref();
            log::debug!("M-SEARCH for {:?} from {}", search_target, remote);
            for usn in self.search_matches(search_target) {
                self.respond(&usn, remote).await;
            }
            return;
        }

        let record = SsdpRecord::new(message, remote);
        let event = if let SsdpMessage::Notify(_) = record.message {
            SsdpEvent::Notify(record)
        } else {
            SsdpEvent::Discover(record)
        };
        self.events.publish(event);
    }

    fn search_matches(&self, search_target: Option<&str>) -> Vec<String> {
        if search_target == Some(SEARCH_ALL) {
            return self.registry.advertised_usns();
        }
        match self.config.search_match {
            SearchMatch::EchoAll => self.registry.services().to_vec(),
            SearchMatch::Exact => self
                .registry
                .advertised_usns()
                .into_iter()
                .filter(|usn| Some(notification_type(usn)) == search_target)
                .collect(),
        }
    }

    fn multicast_socket(&self) -> Option<Arc<dyn SsdpSocket>> {
        lock(&self.multicast_socket).clone()
    }

    fn close_multicast(&self) {
        self.receiving.cancel();
        if let Some(socket) = lock(&self.multicast_socket).take() {
            socket.close();
        }
    }

    fn publish_error(&self, message: String) {
        log::error!("{}", message);
        self.events.publish(SsdpEvent::Error(message));
    }
}

impl Drop for DiscoveryEngine {
    fn drop(&mut self) {
        self.receiving.cancel();
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration")]
    Config(#[from] ConfigError),

    #[error("Failed to find the local IPv4 address")]
    LocalAddress(#[source] std::io::Error),

    #[error("Failed to bind the unicast socket")]
    UnicastBind(#[source] std::io::Error),

    #[error("Failed to bind the multicast socket")]
    MulticastBind(#[source] std::io::Error),

    #[error("Engine is {actual:?} but must be {expected:?}")]
    InvalidState {
        expected: EngineState,
        actual: EngineState,
    },

    #[error("Multicast socket is closed")]
    SocketClosed,

    #[error("Failed to send ssdp:byebye")]
    Byebye(#[source] std::io::Error),
}
