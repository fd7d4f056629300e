//! UDP transport for a single component.
//!
//! A component owns a private data socket and, optionally, a socket on the
//! shared bus port. Both are non-blocking. Every outbound datagram leaves
//! from the data socket, so peers that reply reach the component's private
//! port.
//!
//! Sends go through a duplicate of the data socket's handle and never wait
//! on the reactor, so hooks can send synchronously from any point of a tick.
//!
//! Receive contract:
//! - `poll` makes exactly one non-blocking receive attempt.
//! - Datagrams longer than `max_datagram_bytes` are truncated to that length
//!   by the OS; a truncated document normally fails to parse and is dropped.
//! - Payloads that are not one JSON document are dropped without a signal.
//! - Only the data socket updates the sender record used by `reply`.

mod socket;
pub mod wire;

use crate::config::TransportConfig;
use crate::error::{MppError, MppResult};
use serde_json::Value;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::UdpSocket;
use tracing::{debug, error};

/// Sending side of the transport, as seen by hooks and the belief store.
pub trait Outbound {
    /// Best-effort send to `port` on the loopback address.
    fn send(&self, envelope: &Value, port: u16) -> bool;
    /// Send to the origin of the most recent data-socket datagram.
    fn reply(&self, envelope: &Value) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Data,
    Bus,
}

#[derive(Debug)]
pub struct Transport {
    data: UdpSocket,
    sender: std::net::UdpSocket,
    bus: Option<UdpSocket>,
    loopback: IpAddr,
    recv_buf: Vec<u8>,
    last_sender: Option<SocketAddr>,
}

impl Transport {
    /// Bind the data socket and, if requested, the bus socket.
    ///
    /// Must be called from within a tokio runtime with I/O enabled.
    pub fn open(data_port: u16, bus_port: Option<u16>, config: &TransportConfig) -> MppResult<Self> {
        config.validate()?;
        let data = bind(config.bind_addr, data_port)?;
        let sender = data
            .try_clone()
            .map_err(|source| MppError::Bind { port: data_port, source })?;
        let data = register(data, data_port)?;
        let bus = match bus_port {
            Some(port) => match bind(config.bind_addr, port).and_then(|s| register(s, port)) {
                Ok(socket) => Some(socket),
                Err(e) => {
                    error!("[Transport] failed to bind BUS: {}", e);
                    return Err(e);
                }
            },
            None => None,
        };

        Ok(Self {
            data,
            sender,
            bus,
            loopback: config.loopback,
            recv_buf: vec![0u8; config.max_datagram_bytes],
            last_sender: None,
        })
    }

    pub fn has_bus(&self) -> bool {
        self.bus.is_some()
    }

    /// Port actually bound for `channel` (differs from the request when it was 0).
    pub fn local_port(&self, channel: Channel) -> Option<u16> {
        self.socket(channel)
            .and_then(|s| s.local_addr().ok())
            .map(|addr| addr.port())
    }

    pub fn last_sender(&self) -> Option<SocketAddr> {
        self.last_sender
    }

    pub fn max_datagram_bytes(&self) -> usize {
        self.recv_buf.len()
    }

    /// One non-blocking receive on `channel`; see the module docs for the
    /// truncation and drop rules.
    pub fn poll(&mut self, channel: Channel) -> Option<Value> {
        let socket = match channel {
            Channel::Data => &self.data,
            Channel::Bus => self.bus.as_ref()?,
        };

        let (len, sender) = socket.try_recv_from(&mut self.recv_buf).ok()?;
        if len == 0 {
            return None;
        }
        if channel == Channel::Data {
            self.last_sender = Some(sender);
        }
        wire::decode(&self.recv_buf[..len])
    }

    /// Resolve once `channel` may have a datagram queued.
    ///
    /// Readiness can be spurious; callers still go through `poll`. An absent
    /// bus socket never becomes ready. An error means the reactor gave up on
    /// the socket.
    pub async fn readable(&self, channel: Channel) -> io::Result<()> {
        match self.socket(channel) {
            Some(socket) => socket.readable().await,
            None => std::future::pending().await,
        }
    }

    fn socket(&self, channel: Channel) -> Option<&UdpSocket> {
        match channel {
            Channel::Data => Some(&self.data),
            Channel::Bus => self.bus.as_ref(),
        }
    }

    fn send_to(&self, envelope: &Value, dest: SocketAddr) -> bool {
        let Some(payload) = wire::encode(envelope) else {
            return false;
        };
        match self.sender.send_to(&payload, dest) {
            Ok(sent) => sent == payload.len(),
            Err(_) => false,
        }
    }
}

impl Outbound for Transport {
    fn send(&self, envelope: &Value, port: u16) -> bool {
        self.send_to(envelope, SocketAddr::new(self.loopback, port))
    }

    fn reply(&self, envelope: &Value) -> bool {
        match self.last_sender {
            Some(dest) => self.send_to(envelope, dest),
            None => false,
        }
    }
}

fn bind(addr: IpAddr, port: u16) -> MppResult<std::net::UdpSocket> {
    let bind_err = |source| MppError::Bind { port, source };

    let socket = socket::bind_reusable(SocketAddr::new(addr, port)).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;
    Ok(socket)
}

fn register(socket: std::net::UdpSocket, port: u16) -> MppResult<UdpSocket> {
    let socket = UdpSocket::from_std(socket).map_err(|source| MppError::Bind { port, source })?;
    if let Ok(local) = socket.local_addr() {
        debug!("[Transport] bound {}", local);
    }
    Ok(socket)
}
