mod socket;
mod transport;

pub use socket::SsdpSocket;
pub use socket::TokioSsdpSocket;
pub use transport::TokioTransport;
pub use transport::Transport;

#[cfg(test)]
pub use socket::MockSsdpSocket;
#[cfg(test)]
pub use transport::MockTransport;
