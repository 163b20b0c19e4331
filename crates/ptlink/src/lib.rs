//! Async Generic Netlink client for IPv6 hop-by-hop Path Tracing.
//!
//! This crate configures and inspects the kernel's `IPV6_HOPPT` Generic
//! Netlink family: per-interface Path Tracing entries (a 12-bit interface
//! id plus a timestamp template) and the set of interfaces accepting
//! incoming probes.
//!
//! # Features
//!
//! - `output` - JSON/text output formatting
//! - `integration` - Tests against a live kernel (root required)
//!
//! # Example
//!
//! ```rust,no_run
//! use ptlink::{HopptConnection, HopptEntry, TtsTemplate};
//!
//! #[tokio::main]
//! async fn main() -> ptlink::Result<()> {
//!     let conn = HopptConnection::new()?;
//!
//!     conn.add_entry(&HopptEntry::new(7, 3, TtsTemplate::Template2)).await?;
//!
//!     for entry in conn.get_entries().await? {
//!         println!("ifindex {} id {} tts {}", entry.ifindex, entry.id, entry.template);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Kernel rejections carry the errno and, when the kernel supplied one,
//! the extended ACK message:
//!
//! ```rust,no_run
//! use ptlink::{Error, HopptConnection};
//!
//! # async fn example() -> ptlink::Result<()> {
//! let conn = HopptConnection::new()?;
//! match conn.get_entry(3).await {
//!     Ok(entry) => println!("id {}", entry.id),
//!     Err(e) if e.is_not_found() => println!("no entry"),
//!     Err(Error::FamilyNotFound { .. }) => println!("path tracing not available"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

// Core modules (always available)
pub mod netlink;
pub mod util;

// Feature-gated modules
#[cfg(feature = "output")]
pub mod output;

// Re-export common types at crate root for convenience
pub use netlink::genl::hoppt::{HopptCommand, HopptConnection, HopptEntry, InterfaceBinding, TtsTemplate};
pub use netlink::{Connection, ConnectionConfig, Error, Result};
