//! Connection abstraction
//!
//! A [`Connection`] is a named participant in the crosspost mesh. It wraps a
//! [`Connector`] (the service-specific implementation of fetch/publish)
//! and enforces the parts of the contract that every endpoint shares:
//! capability gating, suppression of a connection's own output, content
//! eligibility filtering, and reply-link bookkeeping. Connectors stay small
//! and dumb; the wrapper owns the invariants.
//!
//! # Examples
//!
//! ```no_run
//! use libcrosscast::connections::{mock::MockConnector, Connection, ConnectionMode};
//! use libcrosscast::replies::ReplyLinks;
//!
//! # async fn example() -> libcrosscast::error::Result<()> {
//! let reply_links = ReplyLinks::new();
//! let mut mirror = Connection::new(
//!     "mirror",
//!     &[ConnectionMode::Write],
//!     Box::new(MockConnector::writer("mirror")),
//!     reply_links,
//! )?;
//!
//! let message = libcrosscast::types::Message::new("hello, fediverse");
//! mirror.write(std::slice::from_ref(&message)).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConnectionError, Result};
use crate::replies::ReplyLinks;
use crate::types::{Message, MessageSupport};

pub mod mock;

/// Directions a connection participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionMode {
    Read,
    Write,
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionMode::Read => write!(f, "read"),
            ConnectionMode::Write => write!(f, "write"),
        }
    }
}

/// What a connector does with a reply whose parent cannot be resolved to a
/// native id. The parent may not have been crossposted, yet or ever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyFallback {
    /// Publish the message as a top-level post.
    #[default]
    PostAsTopLevel,
    /// Decline the message entirely.
    Skip,
}

/// Service-specific fetch/publish implementation.
///
/// Implementations declare what they can do via [`capabilities`]; the
/// default `fetch`/`publish` bodies return a capability error, so a
/// connector only overrides the directions it supports and the wrapper
/// catches mismatches centrally.
///
/// [`capabilities`]: Connector::capabilities
#[async_trait]
pub trait Connector: Send {
    /// The directions this connector implements. Must be non-empty.
    fn capabilities(&self) -> Vec<ConnectionMode>;

    /// What kinds of content this connector can publish.
    fn supports(&self) -> MessageSupport {
        MessageSupport::TextOnly
    }

    /// Policy for replies whose parent has no native id here. Connectors
    /// that publish replies should document their choice.
    fn reply_fallback(&self) -> ReplyFallback {
        ReplyFallback::PostAsTopLevel
    }

    /// Fetch new messages since the last call.
    ///
    /// Must be safe to call repeatedly and must return an empty `Vec`,
    /// not an error, when there is nothing new. Transient failures may
    /// surface as errors; the wrapper recovers from them.
    async fn fetch(&mut self) -> Result<Vec<Message>> {
        Err(ConnectionError::Capability("fetch is not implemented for this connector".to_string()).into())
    }

    /// Publish the given messages, returning one endpoint-local id per
    /// message actually published, in submission order. Messages the
    /// connector declines are simply omitted from the returned list.
    async fn publish(&mut self, messages: &[Message]) -> Result<Vec<String>> {
        let _ = messages;
        Err(ConnectionError::Capability("publish is not implemented for this connector".to_string()).into())
    }
}

/// A named, capability-gated endpoint in the crosspost mesh.
pub struct Connection {
    name: String,
    modes: Vec<ConnectionMode>,
    /// Ids this connection has itself produced via write. Fetched items
    /// carrying one of these ids are our own mirrors coming back around;
    /// dropping them is what breaks the repost cycle.
    posted_message_ids: HashSet<String>,
    connector: Box<dyn Connector>,
    reply_links: ReplyLinks,
}

impl Connection {
    /// Wrap `connector` as the connection `name`, participating in the
    /// given `modes`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Setup`] when `modes` is empty, contains
    /// duplicates, or requests a direction the connector does not declare
    /// in its capability set. All of these are wiring mistakes and fatal.
    pub fn new(
        name: impl Into<String>,
        modes: &[ConnectionMode],
        connector: Box<dyn Connector>,
        reply_links: ReplyLinks,
    ) -> Result<Self> {
        let name = name.into();

        if modes.is_empty() {
            return Err(ConnectionError::Setup(format!(
                "connection '{}' must declare at least one mode",
                name
            ))
            .into());
        }

        let mut seen = HashSet::new();
        for mode in modes {
            if !seen.insert(*mode) {
                return Err(ConnectionError::Setup(format!(
                    "connection '{}' declares mode '{}' more than once",
                    name, mode
                ))
                .into());
            }
        }

        let capabilities = connector.capabilities();
        for mode in modes {
            if !capabilities.contains(mode) {
                return Err(ConnectionError::Setup(format!(
                    "connection '{}' requests mode '{}' but its connector only implements {:?}",
                    name, mode, capabilities
                ))
                .into());
            }
        }

        debug!("Connection '{}' initialized with modes {:?}", name, modes);

        Ok(Self {
            name,
            modes: modes.to_vec(),
            posted_message_ids: HashSet::new(),
            connector,
            reply_links,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modes(&self) -> &[ConnectionMode] {
        &self.modes
    }

    pub fn reads(&self) -> bool {
        self.modes.contains(&ConnectionMode::Read)
    }

    pub fn writes(&self) -> bool {
        self.modes.contains(&ConnectionMode::Write)
    }

    /// Read new messages from this connection.
    ///
    /// Returns empty without touching the connector when the connection is
    /// not in read mode. A capability error from the connector propagates;
    /// any other fetch failure is logged and treated as zero messages for
    /// this cycle, so one broken endpoint cannot poison the fan-out.
    ///
    /// Fetched messages whose id this connection itself produced are
    /// dropped, and the id is forgotten once matched: each posted id
    /// suppresses exactly one re-ingestion.
    pub async fn read(&mut self) -> Result<Vec<Message>> {
        if !self.reads() {
            return Ok(Vec::new());
        }

        let fetched = match self.connector.fetch().await {
            Ok(batch) => batch,
            Err(e) if e.is_capability() => return Err(e),
            Err(e) => {
                warn!(
                    "Fetch from '{}' failed, treating as no new messages: {}",
                    self.name, e
                );
                Vec::new()
            }
        };

        let mut fresh = Vec::with_capacity(fetched.len());
        for mut message in fetched {
            if self.posted_message_ids.remove(&message.id) {
                debug!(
                    "Skipping message {} on '{}': this connection posted it",
                    message.id, self.name
                );
                continue;
            }
            if message.source_connection.is_empty() {
                message.source_connection = self.name.clone();
            }
            fresh.push(message);
        }

        if !fresh.is_empty() {
            info!("Read {} new message(s) from '{}'", fresh.len(), self.name);
        }

        Ok(fresh)
    }

    /// Write messages to this connection.
    ///
    /// No-op when the connection is not in write mode. Messages failing
    /// [`Message::has_content`] for this connector's support level are
    /// filtered out; if nothing survives, the connector is not called.
    /// Ids assigned by the connector are merged into the dedup set, and a
    /// reply link is recorded for every published message that carries
    /// provenance.
    pub async fn write(&mut self, messages: &[Message]) -> Result<()> {
        if !self.writes() {
            return Ok(());
        }

        let support = self.connector.supports();
        let eligible: Vec<Message> = messages
            .iter()
            .filter(|message| message.has_content(support))
            .cloned()
            .collect();

        if eligible.is_empty() {
            if !messages.is_empty() {
                debug!(
                    "Nothing publishable for '{}' ({} message(s) filtered out)",
                    self.name,
                    messages.len()
                );
            }
            return Ok(());
        }

        let posted_ids = self.connector.publish(&eligible).await?;

        self.posted_message_ids.extend(posted_ids.iter().cloned());

        if posted_ids.len() == eligible.len() {
            for (message, posted_id) in eligible.iter().zip(posted_ids.iter()) {
                if !message.source_connection.is_empty() {
                    self.reply_links.record(
                        &message.source_connection,
                        &message.id,
                        &self.name,
                        posted_id,
                    );
                }
            }
        } else {
            // The connector declined some messages, so the id list no
            // longer lines up one-to-one with the batch.
            warn!(
                "'{}' returned {} id(s) for {} message(s); skipping reply-link recording for this batch",
                self.name,
                posted_ids.len(),
                eligible.len()
            );
        }

        info!("Posted {} message(s) to '{}'", posted_ids.len(), self.name);

        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("modes", &self.modes)
            .field("posted_message_ids", &self.posted_message_ids.len())
            .finish()
    }
}
