//! Generic Netlink (GENL) support.
//!
//! Generic Netlink extends the standard netlink protocol with dynamically
//! numbered families. A client looks the family id up by name through the
//! fixed control family, then addresses every request to that id.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HopptConnection                         │
//! │ (Path Tracing commands and records)     │
//! └────────────────┬────────────────────────┘
//!                  │
//! ┌────────────────▼────────────────────────┐
//! │ GenlConnection                          │
//! │ (family cache, GENL requests)           │
//! └────────────────┬────────────────────────┘
//!                  │
//! ┌────────────────▼────────────────────────┐
//! │ Connection<T: Transport>                │
//! │ (sequence numbers, reply/ack/dump)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use ptlink::netlink::genl::GenlConnection;
//!
//! # async fn example() -> ptlink::Result<()> {
//! let conn = GenlConnection::new()?;
//! let family = conn.get_family("IPV6_HOPPT").await?;
//! println!("Path Tracing family ID: {}", family.id);
//! # Ok(())
//! # }
//! ```

mod connection;
mod family;
mod header;
mod request;

pub mod hoppt;

pub use connection::GenlConnection;
pub use family::FamilyInfo;
pub use header::{GENL_HDRLEN, GenlMsgHdr, split_payload};
pub use request::{ExchangeMode, GenlRequest};

// Control family constants (fixed, not dynamically assigned)
pub const GENL_ID_CTRL: u16 = 0x10;

/// Version of the control family protocol.
pub const GENL_CTRL_VERSION: u8 = 1;

/// Control family commands
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlCmd {
    Unspec = 0,
    NewFamily = 1,
    DelFamily = 2,
    GetFamily = 3,
}

/// Control family attributes
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtrlAttr {
    Unspec = 0,
    FamilyId = 1,
    FamilyName = 2,
    Version = 3,
    HdrSize = 4,
    MaxAttr = 5,
    Ops = 6,
    McastGroups = 7,
}

impl CtrlAttr {
    /// Highest attribute decoded from a family reply; later ones land in the residual.
    pub const MAX: u16 = CtrlAttr::McastGroups as u16;
}
