//! Path Tracing connection.

use std::ops::ControlFlow;

use super::request::HopptCommand;
use super::types::{HopptEntry, InterfaceBinding};
use super::{HOPPT_GENL_NAME, attr};
use crate::netlink::attr::AttrTable;
use crate::netlink::connection::{ConnectionConfig, DumpOutcome};
use crate::netlink::error::Result;
use crate::netlink::genl::{GenlConnection, split_payload};
use crate::netlink::socket::{NetlinkSocket, Transport};

/// Connection to the `IPV6_HOPPT` Generic Netlink family.
///
/// The family id is resolved on the first command and cached. If the
/// kernel does not provide the family, that command and every later one
/// fail with [`Error::FamilyNotFound`](crate::Error::FamilyNotFound).
///
/// # Example
///
/// ```rust,no_run
/// use ptlink::netlink::genl::hoppt::{HopptConnection, HopptEntry, TtsTemplate};
///
/// # async fn example() -> ptlink::Result<()> {
/// let conn = HopptConnection::new()?;
/// conn.add_entry(&HopptEntry::new(7, 3, TtsTemplate::Template2)).await?;
/// let entry = conn.get_entry(3).await?;
/// assert_eq!(entry.id, 7);
/// # Ok(())
/// # }
/// ```
pub struct HopptConnection<T: Transport = NetlinkSocket> {
    genl: GenlConnection<T>,
}

impl HopptConnection<NetlinkSocket> {
    /// Open a connection with the default configuration.
    pub fn new() -> Result<Self> {
        Ok(Self::from_genl(GenlConnection::new()?))
    }

    /// Open a connection with custom timeout and buffer settings.
    pub fn with_config(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::from_genl(GenlConnection::with_config(config)?))
    }
}

impl<T: Transport> HopptConnection<T> {
    /// Wrap an existing Generic Netlink connection.
    pub fn from_genl(genl: GenlConnection<T>) -> Self {
        Self { genl }
    }

    /// Create a connection over an arbitrary transport.
    pub fn from_transport(transport: T, config: ConnectionConfig) -> Self {
        Self::from_genl(GenlConnection::from_transport(transport, config))
    }

    /// Get the underlying Generic Netlink connection.
    pub fn genl(&self) -> &GenlConnection<T> {
        &self.genl
    }

    /// Resolved id of the Path Tracing family.
    pub async fn family_id(&self) -> Result<u16> {
        self.genl.get_family_id(HOPPT_GENL_NAME).await
    }

    async fn ack(&self, command: HopptCommand) -> Result<()> {
        let req = command.to_request()?;
        self.genl.ack(HOPPT_GENL_NAME, &req).await
    }

    async fn reply(&self, command: HopptCommand) -> Result<Vec<u8>> {
        let req = command.to_request()?;
        self.genl.reply(HOPPT_GENL_NAME, &req).await
    }

    /// Program a Path Tracing entry on its interface.
    pub async fn add_entry(&self, entry: &HopptEntry) -> Result<()> {
        self.ack(HopptCommand::Add(*entry))
            .await
            .map_err(|e| e.with_context(format!("adding path tracing entry on ifindex {}", entry.ifindex)))
    }

    /// Remove the Path Tracing entry of an interface.
    pub async fn del_entry(&self, ifindex: i32) -> Result<()> {
        self.ack(HopptCommand::Del { ifindex })
            .await
            .map_err(|e| e.with_context(format!("deleting path tracing entry on ifindex {}", ifindex)))
    }

    /// Get the Path Tracing entry of one interface.
    pub async fn get_entry(&self, ifindex: i32) -> Result<HopptEntry> {
        let payload = self
            .reply(HopptCommand::Show { ifindex })
            .await
            .map_err(|e| e.with_context(format!("showing path tracing entry on ifindex {}", ifindex)))?;
        parse_entry(&payload)
    }

    /// Get every Path Tracing entry.
    pub async fn get_entries(&self) -> Result<Vec<HopptEntry>> {
        let mut entries = Vec::new();
        self.for_each_entry(|entry| {
            entries.push(entry);
            ControlFlow::Continue(())
        })
        .await?;
        Ok(entries)
    }

    /// Walk every Path Tracing entry, stopping early if `f` breaks.
    ///
    /// Stopping early fails the dump with
    /// [`Error::Interrupted`](crate::Error::Interrupted).
    pub async fn for_each_entry<F>(&self, mut f: F) -> Result<DumpOutcome>
    where
        F: FnMut(HopptEntry) -> ControlFlow<()> + Send,
    {
        let req = HopptCommand::Dump.to_request()?;
        self.genl
            .dump(HOPPT_GENL_NAME, &req, |_, attrs| {
                let table = AttrTable::parse(attrs, attr::MAX)?;
                Ok(f(HopptEntry::from_attributes(&table)?))
            })
            .await
    }

    /// Accept incoming probes on an interface.
    pub async fn add_source(&self, ifindex: i32) -> Result<()> {
        self.ack(HopptCommand::SourceAdd(InterfaceBinding::new(ifindex)))
            .await
            .map_err(|e| e.with_context(format!("adding source interface ifindex {}", ifindex)))
    }

    /// Stop accepting incoming probes on an interface.
    pub async fn del_source(&self, ifindex: i32) -> Result<()> {
        self.ack(HopptCommand::SourceDel(InterfaceBinding::new(ifindex)))
            .await
            .map_err(|e| e.with_context(format!("deleting source interface ifindex {}", ifindex)))
    }

    /// Get the source interfaces.
    ///
    /// The kernel answers this query with a single message rather than a
    /// dump.
    pub async fn get_sources(&self) -> Result<Vec<InterfaceBinding>> {
        let payload = self
            .reply(HopptCommand::SourceDump)
            .await
            .map_err(|e| e.with_context("showing source interfaces"))?;
        let (_, attrs) = split_payload(&payload)?;
        let table = AttrTable::parse(attrs, attr::MAX)?;
        Ok(vec![InterfaceBinding::from_attributes(&table)?])
    }
}

fn parse_entry(payload: &[u8]) -> Result<HopptEntry> {
    let (hdr, attrs) = split_payload(payload)?;
    tracing::trace!(cmd = hdr.cmd, len = attrs.len(), "path tracing reply");
    let table = AttrTable::parse(attrs, attr::MAX)?;
    HopptEntry::from_attributes(&table)
}
