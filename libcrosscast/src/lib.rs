//! Crosscast - crosspost short messages among heterogeneous endpoints
//!
//! This library keeps a set of independent endpoints (social networks,
//! chat channels, feeds) mirrored: anything readable from one is fanned
//! out to all the others, with reply threads reconstructed across id
//! spaces and per-cycle rate limiting on the way out. Concrete services
//! plug in by implementing the [`Connector`](connections::Connector)
//! trait; everything protocol-specific stays behind that boundary.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use libcrosscast::connections::{mock::MockConnector, Connection, ConnectionMode};
//! use libcrosscast::{Config, Crossposter, ReplyLinks, Scheduler};
//!
//! # async fn example() -> libcrosscast::Result<()> {
//! let reply_links = ReplyLinks::new();
//!
//! let source = Connection::new(
//!     "source",
//!     &[ConnectionMode::Read],
//!     Box::new(MockConnector::reader(vec![])),
//!     reply_links.clone(),
//! )?;
//! let mirror = Connection::new(
//!     "mirror",
//!     &[ConnectionMode::Write],
//!     Box::new(MockConnector::writer("mirror").with_reply_links(reply_links.clone())),
//!     reply_links,
//! )?;
//!
//! let crossposter = Arc::new(Crossposter::new(vec![source, mirror], &Config::default())?);
//! Scheduler::new(crossposter).run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connections;
pub mod crossposter;
pub mod error;
pub mod logging;
pub mod replies;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use connections::{Connection, ConnectionMode, Connector, ReplyFallback};
pub use crossposter::Crossposter;
pub use error::{ConfigError, ConnectionError, CrosscastError, Result};
pub use replies::ReplyLinks;
pub use scheduler::Scheduler;
pub use types::{
    Media, MediaMimeType, Message, MessageMetadata, MessageSupport, MessageVisibility,
};
