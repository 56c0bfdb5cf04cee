//! Crossposting orchestration
//!
//! The [`Crossposter`] owns the set of connections and one FIFO queue per
//! connection. [`read_cycle`] pulls new messages from every readable
//! connection and fans them out into every *other* connection's queue;
//! [`write_cycle`] drains each queue, up to the configured rate limit,
//! into its connection. The two cycles are designed to be driven
//! concurrently by the [`Scheduler`](crate::scheduler::Scheduler) and
//! interleave freely around the shared queue lock.
//!
//! [`read_cycle`]: Crossposter::read_cycle
//! [`write_cycle`]: Crossposter::write_cycle

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::connections::Connection;
use crate::error::{ConfigError, Result};
use crate::types::Message;

struct ConnectionHandle {
    name: String,
    reads: bool,
    writes: bool,
    // Read and write workers may target the same connection concurrently;
    // this lock serializes them without serializing distinct connections.
    connection: AsyncMutex<Connection>,
}

/// Fans messages out from every readable connection to every other
/// writable connection.
pub struct Crossposter {
    connections: Vec<ConnectionHandle>,
    // One coarse lock over all queues. Cycle cadence is seconds, so
    // contention is negligible; what matters is that a pop is atomic with
    // respect to concurrent appends. Never held across connector I/O.
    queues: Mutex<HashMap<String, VecDeque<Message>>>,
    rate_limit: Option<usize>,
    poll_interval: Duration,
}

impl Crossposter {
    /// Build a crossposter over the given connections.
    ///
    /// # Errors
    ///
    /// Rejects an empty connection list, duplicate connection names, a
    /// poll interval under one second, or a rate limit of zero. All are
    /// fatal configuration mistakes.
    pub fn new(connections: Vec<Connection>, config: &Config) -> Result<Self> {
        if connections.is_empty() {
            return Err(ConfigError::NoConnections.into());
        }

        config.validate()?;
        let poll_interval = config.scheduler.poll_interval()?;

        let mut queues = HashMap::with_capacity(connections.len());
        let mut handles = Vec::with_capacity(connections.len());
        for connection in connections {
            let name = connection.name().to_string();
            if queues.contains_key(&name) {
                return Err(ConfigError::DuplicateConnection(name).into());
            }
            queues.insert(name.clone(), VecDeque::new());
            handles.push(ConnectionHandle {
                name,
                reads: connection.reads(),
                writes: connection.writes(),
                connection: AsyncMutex::new(connection),
            });
        }

        info!("Crossposter initialized with {} connection(s)", handles.len());

        Ok(Self {
            connections: handles,
            queues: Mutex::new(queues),
            rate_limit: config.scheduler.rate_limit,
            poll_interval,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn rate_limit(&self) -> Option<usize> {
        self.rate_limit
    }

    /// Messages currently queued for the named connection.
    pub fn queued(&self, name: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(name)
            .map_or(0, VecDeque::len)
    }

    /// Pull new messages from every readable connection and append them to
    /// every *other* connection's queue.
    ///
    /// A message is never enqueued for its own source; that exclusion,
    /// together with each connection's posted-id suppression, is what
    /// keeps mirrors from ping-ponging between endpoints forever.
    pub async fn read_cycle(&self) -> Result<()> {
        for handle in &self.connections {
            if !handle.reads {
                continue;
            }

            let messages = handle.connection.lock().await.read().await?;
            if messages.is_empty() {
                continue;
            }

            let mut queues = self.queues.lock().unwrap();
            for (name, queue) in queues.iter_mut() {
                if name == &handle.name {
                    continue;
                }
                queue.extend(messages.iter().cloned());
                info!(
                    "Queued {} message(s) from '{}' for '{}'",
                    messages.len(),
                    handle.name,
                    name
                );
            }
        }

        Ok(())
    }

    /// Drain each writable connection's queue into it, in FIFO order,
    /// taking at most the configured rate limit per connection per cycle.
    ///
    /// The popped slice is dropped from the queue before the write is
    /// attempted and is never requeued: retrying could double-post
    /// messages the connector had already accepted before erroring. A
    /// publish failure propagates so a persistently broken connection
    /// stops the write worker loudly instead of silently shedding queued
    /// messages every cycle.
    pub async fn write_cycle(&self) -> Result<()> {
        for handle in &self.connections {
            if !handle.writes {
                continue;
            }

            let batch: Vec<Message> = {
                let mut queues = self.queues.lock().unwrap();
                let Some(queue) = queues.get_mut(&handle.name) else {
                    continue;
                };
                let take = self
                    .rate_limit
                    .map_or(queue.len(), |limit| limit.min(queue.len()));
                queue.drain(..take).collect()
            };

            if batch.is_empty() {
                continue;
            }

            debug!(
                "Draining {} message(s) from '{}' queue",
                batch.len(),
                handle.name
            );
            handle.connection.lock().await.write(&batch).await?;
        }

        Ok(())
    }

    /// Deliver a single message to every writable connection immediately,
    /// bypassing the queues and the scheduled cycles.
    ///
    /// Failures are isolated per connection: one refusing endpoint cannot
    /// block delivery to the rest.
    pub async fn write_message(&self, message: &Message) {
        let deliveries = self
            .connections
            .iter()
            .filter(|handle| handle.writes)
            .map(|handle| {
                let message = message.clone();
                async move {
                    let mut connection = handle.connection.lock().await;
                    if let Err(e) = connection.write(std::slice::from_ref(&message)).await {
                        warn!(
                            "Failed to deliver message {} to '{}': {}",
                            message.id, handle.name, e
                        );
                    }
                }
            })
            .collect::<Vec<_>>();

        join_all(deliveries).await;
    }
}
