//! Mock connector for testing
//!
//! A configurable, scriptable connector used to exercise orchestration
//! logic without credentials or network access. Fetches are served from
//! pre-queued batches, publishes are recorded with deterministic ids, and
//! failures can be injected on either direction. Available in all builds
//! so downstream crates can drive it from their own integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::connections::{ConnectionMode, Connector, ReplyFallback};
use crate::error::{ConnectionError, Result};
use crate::replies::ReplyLinks;
use crate::types::{Message, MessageSupport};

/// A message the mock accepted, with the id it assigned and the reply
/// target it resolved (if any).
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub message: Message,
    pub assigned_id: String,
    pub reply_target: Option<String>,
}

/// Scriptable in-memory connector.
///
/// Cloning shares the scripted batches, counters, and publish record, so
/// tests keep a handle for assertions while the connection owns a clone.
#[derive(Clone)]
pub struct MockConnector {
    name: String,
    capabilities: Vec<ConnectionMode>,
    supports: MessageSupport,
    reply_fallback: ReplyFallback,
    reply_links: Option<ReplyLinks>,
    fetch_error: Option<String>,
    publish_error: Option<String>,
    fetch_batches: Arc<Mutex<VecDeque<Vec<Message>>>>,
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    next_id: Arc<Mutex<usize>>,
    fetch_calls: Arc<Mutex<usize>>,
    publish_calls: Arc<Mutex<usize>>,
}

impl MockConnector {
    fn new(name: &str, capabilities: Vec<ConnectionMode>, batches: Vec<Vec<Message>>) -> Self {
        Self {
            name: name.to_string(),
            capabilities,
            supports: MessageSupport::TextOnly,
            reply_fallback: ReplyFallback::default(),
            reply_links: None,
            fetch_error: None,
            publish_error: None,
            fetch_batches: Arc::new(Mutex::new(batches.into())),
            published: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(Mutex::new(0)),
            fetch_calls: Arc::new(Mutex::new(0)),
            publish_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// A read-only connector serving the given batches, one per fetch.
    pub fn reader(batches: Vec<Vec<Message>>) -> Self {
        Self::new("mock", vec![ConnectionMode::Read], batches)
    }

    /// A write-only connector assigning ids of the form `{name}-{n}`.
    pub fn writer(name: &str) -> Self {
        Self::new(name, vec![ConnectionMode::Write], Vec::new())
    }

    /// A connector implementing both directions.
    pub fn read_write(name: &str, batches: Vec<Vec<Message>>) -> Self {
        Self::new(
            name,
            vec![ConnectionMode::Read, ConnectionMode::Write],
            batches,
        )
    }

    pub fn with_supports(mut self, supports: MessageSupport) -> Self {
        self.supports = supports;
        self
    }

    pub fn with_reply_fallback(mut self, fallback: ReplyFallback) -> Self {
        self.reply_fallback = fallback;
        self
    }

    /// Inject the shared reply-link table so publishes resolve reply
    /// targets the way a real connector would.
    pub fn with_reply_links(mut self, reply_links: ReplyLinks) -> Self {
        self.reply_links = Some(reply_links);
        self
    }

    /// Make every fetch fail with the given message.
    pub fn with_fetch_error(mut self, error: &str) -> Self {
        self.fetch_error = Some(error.to_string());
        self
    }

    /// Make every publish fail with the given message.
    pub fn with_publish_error(mut self, error: &str) -> Self {
        self.publish_error = Some(error.to_string());
        self
    }

    /// Queue another fetch batch behind any already scripted.
    pub fn push_batch(&self, batch: Vec<Message>) {
        self.fetch_batches.lock().unwrap().push_back(batch);
    }

    /// Everything this connector accepted, in publish order.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }

    pub fn fetch_call_count(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }

    pub fn publish_call_count(&self) -> usize {
        *self.publish_calls.lock().unwrap()
    }

    fn assign_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}-{}", self.name, next)
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn capabilities(&self) -> Vec<ConnectionMode> {
        self.capabilities.clone()
    }

    fn supports(&self) -> MessageSupport {
        self.supports
    }

    fn reply_fallback(&self) -> ReplyFallback {
        self.reply_fallback
    }

    async fn fetch(&mut self) -> Result<Vec<Message>> {
        *self.fetch_calls.lock().unwrap() += 1;

        if let Some(error) = &self.fetch_error {
            return Err(ConnectionError::Fetch(error.clone()).into());
        }

        Ok(self
            .fetch_batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn publish(&mut self, messages: &[Message]) -> Result<Vec<String>> {
        *self.publish_calls.lock().unwrap() += 1;

        if let Some(error) = &self.publish_error {
            return Err(ConnectionError::Publish(error.clone()).into());
        }

        let mut assigned = Vec::with_capacity(messages.len());
        for message in messages {
            let reply_target = message.reply_to_id.as_ref().and_then(|parent_id| {
                self.reply_links.as_ref().and_then(|links| {
                    links.resolve(&message.source_connection, parent_id, &self.name)
                })
            });

            // Unresolvable reply: apply the configured fallback.
            if message.reply_to_id.is_some()
                && reply_target.is_none()
                && self.reply_fallback == ReplyFallback::Skip
            {
                continue;
            }

            let id = self.assign_id();
            self.published.lock().unwrap().push(PublishedMessage {
                message: message.clone(),
                assigned_id: id.clone(),
                reply_target,
            });
            assigned.push(id);
        }

        Ok(assigned)
    }
}
