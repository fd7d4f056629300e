//! The per-component run loop.
//!
//! One `Node` is one logical actor: it owns the transport, the belief
//! journal, the publisher and the component itself, and mutates them only
//! from inside `tick`. Each tick services:
//!
//! ```text
//! data socket  -> at most one envelope -> apply_config, on_message
//! bus socket   -> at most one envelope -> apply_config, on_message   (if listening)
//! publisher    -> publish_snapshot                                    (if due)
//! ```
//!
//! Between ticks the loop suspends until either socket is readable or the
//! next publish deadline passes. Datagrams beyond one per socket stay queued
//! in the OS buffer, so a busy socket keeps the loop going tick after tick
//! without ever servicing two envelopes from it in the same tick.

use crate::belief::BeliefStore;
use crate::component::{Component, Context};
use crate::config::{FleetPorts, MppConfig};
use crate::dispatch::dispatch;
use crate::publisher::Publisher;
use crate::transport::{Channel, Transport};
use std::io;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Stopped,
}

pub struct Node<C: Component> {
    component: C,
    data_port: u16,
    ports: FleetPorts,
    transport: Option<Transport>,
    beliefs: BeliefStore,
    publisher: Publisher,
    state: RunState,
}

impl<C: Component> Node<C> {
    /// Bind the component's sockets and prepare its loop.
    ///
    /// A bind failure does not error out: the node comes back unhealthy and
    /// `run` returns right after its startup line.
    pub fn new(component: C, data_port: u16, config: &MppConfig) -> Self {
        let bus_port = config.node.listen_bus.then_some(config.ports.bus);

        let (transport, state) = match Transport::open(data_port, bus_port, &config.transport) {
            Ok(transport) => (Some(transport), RunState::Running),
            Err(e) => {
                error!("[Node] {} on port {} unhealthy: {}", component.identity(), data_port, e);
                (None, RunState::Stopped)
            }
        };
        let data_port = transport
            .as_ref()
            .and_then(|t| t.local_port(Channel::Data))
            .unwrap_or(data_port);
        let beliefs = BeliefStore::new(component.identity());

        Self {
            component,
            data_port,
            ports: config.ports,
            transport,
            beliefs,
            publisher: Publisher::new(config.node.publish_period_ms, Instant::now()),
            state,
        }
    }

    /// Drive ticks until a hook stops the node.
    pub async fn run(&mut self) {
        let listening = self.transport.as_ref().is_some_and(Transport::has_bus);
        if listening {
            info!("[Node] running on port={} (listening BUS)", self.data_port);
        } else {
            info!("[Node] running on port={}", self.data_port);
        }

        while self.is_running() {
            self.wait_ready().await;
            if self.is_running() {
                self.tick();
            }
        }
    }

    /// Service one tick: one data envelope, one bus envelope, then the publisher.
    pub fn tick(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        if let Some(envelope) = transport.poll(Channel::Data) {
            let mut ctx = Context::new(
                &*transport,
                &mut self.beliefs,
                self.ports,
                self.data_port,
                &mut self.state,
            );
            dispatch(&mut self.component, &envelope, &mut ctx);
        }

        if transport.has_bus() {
            if let Some(envelope) = transport.poll(Channel::Bus) {
                let mut ctx = Context::new(
                    &*transport,
                    &mut self.beliefs,
                    self.ports,
                    self.data_port,
                    &mut self.state,
                );
                dispatch(&mut self.component, &envelope, &mut ctx);
            }
        }

        if self.publisher.poll(Instant::now()) {
            let mut ctx = Context::new(
                &*transport,
                &mut self.beliefs,
                self.ports,
                self.data_port,
                &mut self.state,
            );
            self.component.publish_snapshot(&mut ctx);
        }
    }

    async fn wait_ready(&mut self) {
        let Some(transport) = self.transport.as_ref() else {
            return;
        };
        let deadline = self.publisher.next_deadline();

        let ready = tokio::select! {
            ready = transport.readable(Channel::Data) => ready,
            ready = transport.readable(Channel::Bus) => ready,
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => Ok(()),
        };
        self.on_readiness(ready);
    }

    /// A failed readiness wait would otherwise turn `run` into a busy loop.
    fn on_readiness(&mut self, ready: io::Result<()>) {
        if let Err(e) = ready {
            error!(
                "[Node] {} on port {} stopping, socket wait failed: {}",
                self.component.identity(),
                self.data_port,
                e
            );
            self.state = RunState::Stopped;
        }
    }

    /// Sockets bound successfully.
    pub fn is_healthy(&self) -> bool {
        self.transport.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.is_healthy() && self.state == RunState::Running
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Bound data port (the requested one if binding failed).
    pub fn data_port(&self) -> u16 {
        self.data_port
    }

    pub fn bus_port(&self) -> Option<u16> {
        self.transport
            .as_ref()
            .and_then(|t| t.local_port(Channel::Bus))
    }

    pub fn ports(&self) -> FleetPorts {
        self.ports
    }

    pub fn beliefs(&self) -> &BeliefStore {
        &self.beliefs
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn transport(&self) -> Option<&Transport> {
        self.transport.as_ref()
    }
}
