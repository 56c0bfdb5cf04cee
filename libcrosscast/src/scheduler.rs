//! Cycle scheduling
//!
//! Drives a [`Crossposter`]'s two cycles forever on independent workers:
//! one loops `read_cycle`, one loops `write_cycle`, and each sleeps the
//! configured poll interval between its own invocations. The workers share
//! nothing beyond the crossposter's queue lock and interleave freely; a
//! connector stuck in a fetch delays only the read side.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{error, info};

use crate::crossposter::Crossposter;
use crate::error::Result;

pub struct Scheduler {
    crossposter: Arc<Crossposter>,
}

impl Scheduler {
    pub fn new(crossposter: Arc<Crossposter>) -> Self {
        Self { crossposter }
    }

    /// Run both workers until one fails fatally.
    ///
    /// Recoverable conditions (a transient fetch failure, an empty cycle)
    /// never surface here; what does surface, like a capability mismatch
    /// or a persistent publish failure, indicates a broken deployment, so
    /// the first such error stops the scheduler and is returned.
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting crosspost workers (poll interval: {:?})",
            self.crossposter.poll_interval()
        );

        tokio::try_join!(self.read_worker(), self.write_worker())?;
        Ok(())
    }

    async fn read_worker(&self) -> Result<()> {
        loop {
            if let Err(e) = self.crossposter.read_cycle().await {
                error!("Read worker stopping: {}", e);
                return Err(e);
            }
            sleep(self.crossposter.poll_interval()).await;
        }
    }

    async fn write_worker(&self) -> Result<()> {
        loop {
            if let Err(e) = self.crossposter.write_cycle().await {
                error!("Write worker stopping: {}", e);
                return Err(e);
            }
            sleep(self.crossposter.poll_interval()).await;
        }
    }
}
