// MPP Library
// UDP component framework: JSON envelopes between independently addressable
// components, plus an ownership-checked, append-only belief store.

pub mod belief;
pub mod component;
pub mod components;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod publisher;
pub mod scheduler;
pub mod transport;

pub use belief::{Belief, BeliefStore, CommitOutcome, Rejection};
pub use component::{Component, Context};
pub use config::{FleetPorts, MppConfig, NodeConfig, TransportConfig};
pub use error::{MppError, MppResult};
pub use publisher::Publisher;
pub use scheduler::{Node, RunState};
pub use transport::{Channel, Outbound, Transport};
