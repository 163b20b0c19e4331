//! IPv6 hop-by-hop Path Tracing configuration via Generic Netlink.
//!
//! The `IPV6_HOPPT` family keeps one Path Tracing entry per interface
//! (a 12-bit interface id and a timestamp template) plus a set of
//! "source" interfaces on which incoming probes are accepted.
//!
//! # Example
//!
//! ```rust,no_run
//! use ptlink::netlink::genl::hoppt::{HopptConnection, HopptEntry, TtsTemplate};
//!
//! # async fn example() -> ptlink::Result<()> {
//! let conn = HopptConnection::new()?;
//!
//! conn.add_entry(&HopptEntry::new(7, 3, TtsTemplate::Template2)).await?;
//!
//! for entry in conn.get_entries().await? {
//!     println!("ifindex {} id {} tts {}", entry.ifindex, entry.id, entry.template);
//! }
//! # Ok(())
//! # }
//! ```

mod connection;
mod request;
mod types;

pub use connection::HopptConnection;
pub use request::{HopptCommand, build};
pub use types::{HopptEntry, InterfaceBinding, TtsTemplate};

/// Path Tracing Generic Netlink family name.
pub const HOPPT_GENL_NAME: &str = "IPV6_HOPPT";

/// Path Tracing Generic Netlink version.
pub const HOPPT_GENL_VERSION: u8 = 1;

/// Path Tracing commands.
pub mod cmd {
    pub const UNSPEC: u8 = 0;
    pub const ADD_ID: u8 = 1;
    pub const DEL_ID: u8 = 2;
    pub const SHOW_ID: u8 = 3;
    pub const DUMP_ID: u8 = 4;
    pub const TGRCV_ADD_ID: u8 = 5;
    pub const TGRCV_DEL_ID: u8 = 6;
    pub const TGRCV_DUMP_ID: u8 = 7;
}

/// Path Tracing attributes.
pub mod attr {
    pub const UNSPEC: u16 = 0;
    /// Interface id, u32.
    pub const ID: u16 = 1;
    /// Interface index, s32.
    pub const IFINDEX: u16 = 2;
    /// Timestamp template, u32.
    pub const TTSTMPL: u16 = 3;
    pub const MAX: u16 = TTSTMPL;
}

/// Timestamp template selectors.
pub mod tts {
    pub const UNSPEC: u32 = 0;
    pub const TMPL_1: u32 = 1;
    pub const TMPL_2: u32 = 2;
    pub const TMPL_3: u32 = 3;
    pub const TMPL_4: u32 = 4;
    pub const MAX: u32 = TMPL_4;
}
