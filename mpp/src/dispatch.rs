//! Envelope dispatch: every inbound document reaches both hooks, in order.

use crate::component::{Component, Context};
use serde_json::Value;

/// Run `apply_config` then `on_message` for one envelope.
///
/// Both hooks always run, even if the first one stopped the node; the stop
/// takes effect at the next tick boundary.
pub fn dispatch<C: Component + ?Sized>(component: &mut C, envelope: &Value, ctx: &mut Context<'_>) {
    component.apply_config(envelope, ctx);
    component.on_message(envelope, ctx);
}
