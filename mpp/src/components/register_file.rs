//! Register file component.
//!
//! A generic collaborator that keeps an open-ended set of JSON registers.
//! Any top-level key of an inbound object that is not a control or reserved
//! key is written into the register of the same name. Control keys:
//!
//! - `read: true`     reply to the sender with the snapshot
//! - `publish: true`  send the snapshot to the bus
//! - `assert: {...}`  commit `{subject, polarity = true, context = {}}`
//! - `stop: true`     leave the run loop
//!
//! The keys a snapshot reports (`component`, `port`, `beliefs`) are reserved
//! and never stored, so a snapshot seen on the bus configures nothing.
//!
//! The first configuration that changes a register commits
//! `<ID>.configured`; later ones fall under the duplicate rule.

use crate::component::{Component, Context};
use serde_json::{json, Map, Value};

const CONTROL_KEYS: &[&str] = &["read", "publish", "assert", "stop", "belief"];
const RESERVED_KEYS: &[&str] = &["component", "port", "beliefs"];

#[derive(Debug, Clone)]
pub struct RegisterFile {
    name: String,
    port: u16,
    registers: Map<String, Value>,
}

impl RegisterFile {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            registers: Map::new(),
        }
    }

    pub fn register(&self, key: &str) -> Option<&Value> {
        self.registers.get(key)
    }

    pub fn registers(&self) -> &Map<String, Value> {
        &self.registers
    }

    /// Snapshot plus the journal length, as sent on read and publish.
    fn reported_snapshot(&self, ctx: &Context<'_>) -> Value {
        let mut snapshot = self.snapshot();
        snapshot["beliefs"] = json!(ctx.beliefs().len());
        snapshot
    }

    fn is_register_key(key: &str) -> bool {
        !CONTROL_KEYS.contains(&key) && !RESERVED_KEYS.contains(&key)
    }

    fn flag(envelope: &Value, key: &str) -> bool {
        envelope.get(key).and_then(Value::as_bool).unwrap_or(false)
    }
}

impl Component for RegisterFile {
    fn identity(&self) -> &str {
        &self.name
    }

    fn snapshot(&self) -> Value {
        let mut snapshot = Map::new();
        snapshot.insert("component".to_string(), json!(self.name));
        snapshot.insert("port".to_string(), json!(self.port));
        for (key, value) in &self.registers {
            snapshot.insert(key.clone(), value.clone());
        }
        Value::Object(snapshot)
    }

    fn publish_snapshot(&mut self, ctx: &mut Context<'_>) {
        let snapshot = self.reported_snapshot(ctx);
        ctx.send_bus(&snapshot);
    }

    fn apply_config(&mut self, envelope: &Value, ctx: &mut Context<'_>) {
        let Some(fields) = envelope.as_object() else {
            return;
        };

        let mut changed = Vec::new();
        for (key, value) in fields {
            if !Self::is_register_key(key) {
                continue;
            }
            if self.registers.get(key) != Some(value) {
                self.registers.insert(key.clone(), value.clone());
                changed.push(key.clone());
            }
        }

        if !changed.is_empty() {
            let subject = format!("{}.configured", self.name);
            ctx.commit(&subject, true, json!({ "keys": changed }));
        }

        if Self::flag(envelope, "read") {
            let snapshot = self.reported_snapshot(ctx);
            ctx.reply(&snapshot);
        }
    }

    fn on_message(&mut self, envelope: &Value, ctx: &mut Context<'_>) {
        if Self::flag(envelope, "publish") {
            self.publish_snapshot(ctx);
        }

        if let Some(assertion) = envelope.get("assert") {
            if let Some(subject) = assertion.get("subject").and_then(Value::as_str) {
                let polarity = assertion
                    .get("polarity")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                let context = assertion
                    .get("context")
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                ctx.commit(subject, polarity, context);
            }
        }

        if Self::flag(envelope, "stop") {
            ctx.stop();
        }
    }
}
