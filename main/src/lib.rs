mod config;
mod engine;
mod event;
mod id;
mod network;
mod record;
mod registry;

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

pub use config::ConfigError;
pub use config::SearchMatch;
pub use config::SsdpConfig;
pub use engine::DiscoveryEngine;
pub use engine::EngineError;
pub use engine::EngineState;
pub use event::EventSink;
pub use event::SsdpEvent;
pub use id::IdGenerator;
pub use id::UuidGenerator;
pub use network::SsdpSocket;
pub use network::TokioSsdpSocket;
pub use network::TokioTransport;
pub use network::Transport;
pub use record::RemoteInfo;
pub use record::SsdpRecord;
pub use registry::DeviceIdentity;
pub use registry::ServiceRegistry;
pub use simple_ssdp_protocol as protocol;

/// Locks a mutex whose guarded state stays valid even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod test {
    pub fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}
