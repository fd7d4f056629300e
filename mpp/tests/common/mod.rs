//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use mpp::Outbound;
use serde_json::Value;
use std::cell::RefCell;
use std::net::UdpSocket;
use std::time::Duration;

/// Outbound that records instead of sending.
#[derive(Default)]
pub struct Recorder {
    pub sent: RefCell<Vec<(u16, Value)>>,
    pub replies: RefCell<Vec<Value>>,
    /// Value returned by `reply`, mimicking whether a sender is known.
    pub has_sender: bool,
}

impl Recorder {
    pub fn with_sender() -> Self {
        Self {
            has_sender: true,
            ..Self::default()
        }
    }

    pub fn sent_to(&self, port: u16) -> Vec<Value> {
        self.sent
            .borrow()
            .iter()
            .filter(|(p, _)| *p == port)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl Outbound for Recorder {
    fn send(&self, envelope: &Value, port: u16) -> bool {
        self.sent.borrow_mut().push((port, envelope.clone()));
        true
    }

    fn reply(&self, envelope: &Value) -> bool {
        if self.has_sender {
            self.replies.borrow_mut().push(envelope.clone());
        }
        self.has_sender
    }
}

/// Plain loopback socket standing in for a peer, a sink or the bus.
pub fn peer() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    socket
}

pub fn port_of(socket: &UdpSocket) -> u16 {
    socket.local_addr().unwrap().port()
}

/// Blocking receive of one raw datagram.
pub fn recv_raw(socket: &UdpSocket) -> Vec<u8> {
    let mut buf = vec![0u8; 65_536];
    let (len, _) = socket.recv_from(&mut buf).unwrap();
    buf.truncate(len);
    buf
}

pub fn recv_json(socket: &UdpSocket) -> Value {
    serde_json::from_slice(&recv_raw(socket)).unwrap()
}

/// Everything already queued on `socket`, without waiting.
pub fn drain_json(socket: &UdpSocket) -> Vec<Value> {
    socket.set_nonblocking(true).unwrap();
    let mut buf = vec![0u8; 65_536];
    let mut out = Vec::new();
    while let Ok((len, _)) = socket.recv_from(&mut buf) {
        out.push(serde_json::from_slice(&buf[..len]).unwrap());
    }
    socket.set_nonblocking(false).unwrap();
    out
}
