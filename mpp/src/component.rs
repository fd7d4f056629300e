//! The component contract and the context the core hands to its hooks.
//!
//! A concrete component implements [`Component`]; the scheduler drives it
//! and never depends on what the component is. During a hook the component
//! reaches the outside world only through [`Context`], which is how belief
//! commits stay single-writer.

use crate::belief::{BeliefStore, CommitOutcome};
use crate::config::FleetPorts;
use crate::scheduler::RunState;
use crate::transport::Outbound;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

/// Capability interface every component kind provides to the scheduler.
///
/// Hooks are total over the JSON value: unknown fields must be ignored, and
/// a hook for which an envelope means nothing simply does nothing.
pub trait Component {
    /// Short identity; beliefs this component may assert start with `<identity>.`.
    fn identity(&self) -> &str;

    /// The component's full externally visible state.
    fn snapshot(&self) -> Value;

    /// Merge an inbound document into internal state. Runs first for every envelope.
    fn apply_config(&mut self, envelope: &Value, ctx: &mut Context<'_>);

    /// Generic handling, invoked after `apply_config` for every envelope.
    fn on_message(&mut self, envelope: &Value, ctx: &mut Context<'_>);

    /// Periodic snapshot production; by default the snapshot goes to the bus.
    fn publish_snapshot(&mut self, ctx: &mut Context<'_>) {
        let snapshot = self.snapshot();
        ctx.send_bus(&snapshot);
    }
}

/// Services the core exposes to a component while one of its hooks runs.
pub struct Context<'a> {
    outbound: &'a dyn Outbound,
    beliefs: &'a mut BeliefStore,
    ports: FleetPorts,
    data_port: u16,
    state: &'a mut RunState,
}

impl<'a> Context<'a> {
    pub fn new(
        outbound: &'a dyn Outbound,
        beliefs: &'a mut BeliefStore,
        ports: FleetPorts,
        data_port: u16,
        state: &'a mut RunState,
    ) -> Self {
        Self {
            outbound,
            beliefs,
            ports,
            data_port,
            state,
        }
    }

    /// Assert a belief owned by this component.
    ///
    /// A rejected commit changes nothing and sends nothing; an accepted one is
    /// journaled and then announced to the belief sink.
    pub fn commit(&mut self, subject: &str, polarity: bool, context: Value) -> CommitOutcome {
        match self.beliefs.record(subject, polarity, context) {
            Ok(belief) => {
                let sent = self.outbound.send(&belief.envelope(), self.ports.belief_sink);
                debug!(
                    "[Beliefs] committed {}={} (sink delivery: {})",
                    subject, polarity, sent
                );
                CommitOutcome::Committed { sent }
            }
            Err(rejection) => {
                debug!("[Beliefs] rejected {}={}: {}", subject, polarity, rejection);
                CommitOutcome::Rejected(rejection)
            }
        }
    }

    pub fn send(&self, envelope: &Value, port: u16) -> bool {
        self.outbound.send(envelope, port)
    }

    pub fn send_bus(&self, envelope: &Value) -> bool {
        self.outbound.send(envelope, self.ports.bus)
    }

    pub fn send_sink(&self, envelope: &Value) -> bool {
        self.outbound.send(envelope, self.ports.belief_sink)
    }

    /// Reply to whoever sent the most recent datagram on the data port.
    pub fn reply(&self, envelope: &Value) -> bool {
        self.outbound.reply(envelope)
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Leave the run loop after the current tick.
    pub fn stop(&mut self) {
        if *self.state == RunState::Running {
            info!("[Node] {} stopping", self.beliefs.owner());
        }
        *self.state = RunState::Stopped;
    }

    pub fn beliefs(&self) -> &BeliefStore {
        &*self.beliefs
    }

    pub fn data_port(&self) -> u16 {
        self.data_port
    }

    pub fn ports(&self) -> FleetPorts {
        self.ports
    }
}
