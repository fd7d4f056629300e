//! Belief store: an append-only journal of owned `(subject, polarity)` facts.
//!
//! Rules enforced on every commit:
//! - ownership: the subject must start with `<owner>.`
//! - monotonicity: an identical `(subject, polarity)` pair is never recorded
//!   twice; the opposite polarity is a distinct fact and is accepted.
//!
//! Entries are never mutated or removed. The store does not interpret a
//! subject's polarity history; `history` hands back the raw entries.
//!
//! The journal grows for the lifetime of the process.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;

/// A committed fact asserted by its owning component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub owner: String,
    pub subject: String,
    pub polarity: bool,
    pub context: Value,
}

impl Belief {
    /// Provenance envelope announced to the belief sink.
    pub fn envelope(&self) -> Value {
        json!({
            "belief": {
                "component": self.owner,
                "subject": self.subject,
                "polarity": self.polarity,
                "context": self.context,
            }
        })
    }
}

/// Why a commit left the journal untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Subject is outside the owner's namespace.
    NotOwner,
    /// The same `(subject, polarity)` is already journaled.
    Duplicate,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotOwner => write!(f, "subject not owned by this component"),
            Rejection::Duplicate => write!(f, "belief already committed"),
        }
    }
}

/// Result of a commit as seen by the calling hook.
///
/// Both rejection kinds look identical on the wire: nothing is journaled and
/// nothing is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Journaled; `sent` reports whether the sink envelope left the socket.
    Committed { sent: bool },
    Rejected(Rejection),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct BeliefStore {
    owner: String,
    prefix: String,
    entries: Vec<Belief>,
    seen: HashSet<(String, bool)>,
}

impl BeliefStore {
    pub fn new(owner: impl Into<String>) -> Self {
        let owner = owner.into();
        let prefix = format!("{}.", owner);
        Self {
            owner,
            prefix,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn owns(&self, subject: &str) -> bool {
        subject.starts_with(&self.prefix)
    }

    /// Apply the ownership and duplicate rules, then append.
    ///
    /// Announcing the returned belief is the caller's job; see
    /// [`crate::component::Context::commit`].
    pub fn record(
        &mut self,
        subject: &str,
        polarity: bool,
        context: Value,
    ) -> Result<&Belief, Rejection> {
        if !self.owns(subject) {
            return Err(Rejection::NotOwner);
        }
        if !self.seen.insert((subject.to_string(), polarity)) {
            return Err(Rejection::Duplicate);
        }

        self.entries.push(Belief {
            owner: self.owner.clone(),
            subject: subject.to_string(),
            polarity,
            context,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn contains(&self, subject: &str, polarity: bool) -> bool {
        self.seen.contains(&(subject.to_string(), polarity))
    }

    /// All entries in commit order.
    pub fn entries(&self) -> &[Belief] {
        &self.entries
    }

    /// Every entry recorded for `subject`, in commit order.
    pub fn history<'a>(&'a self, subject: &'a str) -> impl Iterator<Item = &'a Belief> + 'a {
        self.entries.iter().filter(move |b| b.subject == subject)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_envelope_shape() {
        let belief = Belief {
            owner: "NET".to_string(),
            subject: "NET.rx_done".to_string(),
            polarity: true,
            context: json!({"rx_len": 64}),
        };
        assert_eq!(
            serde_json::to_string(&belief.envelope()).unwrap(),
            r#"{"belief":{"component":"NET","subject":"NET.rx_done","polarity":true,"context":{"rx_len":64}}}"#
        );
    }

    #[test]
    fn test_prefix_requires_dot() {
        let store = BeliefStore::new("NET");
        assert!(store.owns("NET.started"));
        assert!(!store.owns("NETWORK.started"));
        assert!(!store.owns("NET"));
        assert!(!store.owns("net.started"));
    }

    #[test]
    fn test_rejections_are_distinguished() {
        let mut store = BeliefStore::new("NET");
        assert_eq!(
            store.record("OTHER.x", true, json!({})).unwrap_err(),
            Rejection::NotOwner
        );
        store.record("NET.x", true, json!({})).unwrap();
        assert_eq!(
            store.record("NET.x", true, json!({"again": 1})).unwrap_err(),
            Rejection::Duplicate
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].context, json!({}));
    }

    #[test]
    fn test_history_keeps_polarity_flips() {
        let mut store = BeliefStore::new("NET");
        store.record("NET.link", true, json!({})).unwrap();
        store.record("NET.other", true, json!({})).unwrap();
        store.record("NET.link", false, json!({"reason": "down"})).unwrap();

        let flips: Vec<bool> = store.history("NET.link").map(|b| b.polarity).collect();
        assert_eq!(flips, vec![true, false]);
        assert!(store.contains("NET.link", true));
        assert!(store.contains("NET.link", false));
        assert!(!store.contains("NET.other", false));
    }
}
