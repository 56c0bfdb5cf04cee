//! Cross-endpoint reply-thread resolution
//!
//! When a reply written on one endpoint is mirrored to the others, the
//! mirrored copy must point at the *destination's* copy of the parent, and
//! the destination shares no id space with the source. [`ReplyLinks`] is the
//! table that makes this translation possible: after every successful post
//! it records which local id each destination assigned to a given source
//! message, and connectors consult it at publish time to rebuild the thread.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Shared reply-link table.
///
/// Keyed by `(source connection, source message id)`; each entry maps a
/// destination connection name to the id that destination assigned when it
/// mirrored the message. The handle is cheap to clone: construct one per
/// process and inject a clone into every connection (and into connectors
/// that post replies). Entries live for the process lifetime; nothing here
/// is persisted.
#[derive(Debug, Clone, Default)]
pub struct ReplyLinks {
    table: Arc<Mutex<HashMap<(String, String), HashMap<String, String>>>>,
}

impl ReplyLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `destination` assigned `destination_id` to its mirror of
    /// the message `(source_connection, source_id)`. Overwrites any earlier
    /// entry for the same destination.
    pub fn record(
        &self,
        source_connection: &str,
        source_id: &str,
        destination: &str,
        destination_id: &str,
    ) {
        let mut table = self.table.lock().unwrap();
        table
            .entry((source_connection.to_string(), source_id.to_string()))
            .or_default()
            .insert(destination.to_string(), destination_id.to_string());
        debug!(
            "Linked {}/{} to {} as {}",
            source_connection, source_id, destination, destination_id
        );
    }

    /// Look up the id `destination` assigned to its mirror of
    /// `(source_connection, source_id)`, if it ever received one.
    pub fn resolve(
        &self,
        source_connection: &str,
        source_id: &str,
        destination: &str,
    ) -> Option<String> {
        let table = self.table.lock().unwrap();
        table
            .get(&(source_connection.to_string(), source_id.to_string()))
            .and_then(|destinations| destinations.get(destination))
            .cloned()
    }

    /// Number of source messages with at least one recorded mirror.
    pub fn len(&self) -> usize {
        self.table.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
