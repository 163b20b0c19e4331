//! Async Generic Netlink protocol implementation for Linux.
//!
//! This module carries the protocol engine: the attribute codec, the
//! message builder, the transport session with its three exchange modes
//! and the response demultiplexer. The Path Tracing family is layered on
//! top in [`genl::hoppt`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ptlink::netlink::genl::hoppt::HopptConnection;
//!
//! # async fn example() -> ptlink::Result<()> {
//! let conn = HopptConnection::new()?;
//!
//! for entry in conn.get_entries().await? {
//!     println!("{}: id {} tts {}", entry.ifindex, entry.id, entry.template);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Timeouts
//!
//! Every send and receive is bounded by [`ConnectionConfig::timeout`]:
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use ptlink::netlink::ConnectionConfig;
//! use ptlink::netlink::genl::hoppt::HopptConnection;
//!
//! # fn example() -> ptlink::Result<()> {
//! let config = ConnectionConfig::new().timeout(Duration::from_millis(500));
//! let conn = HopptConnection::with_config(config)?;
//! # Ok(())
//! # }
//! ```

pub mod attr;
mod builder;
pub mod connection;
pub mod demux;
mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod genl;
pub mod message;
mod socket;
pub mod srh;

pub use attr::{AttrSet, AttrTable};
pub use builder::MessageBuilder;
pub use connection::{Connection, ConnectionConfig, DEFAULT_TIMEOUT, DumpOutcome};
pub use demux::{Frame, FrameIter, FrameKind, KernelError};
pub use error::{Error, Result};
pub use socket::{DEFAULT_RECV_BUF, NetlinkSocket, Transport};
