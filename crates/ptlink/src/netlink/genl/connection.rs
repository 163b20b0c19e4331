//! Generic Netlink connection with family resolution.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{PoisonError, RwLock};

use super::family::FamilyInfo;
use super::header::{GenlMsgHdr, split_payload};
use super::request::{ExchangeMode, GenlRequest};
use crate::netlink::connection::{Connection, ConnectionConfig, DumpOutcome};
use crate::netlink::error::{Error, Result};
use crate::netlink::socket::{NetlinkSocket, Transport};

use super::GENL_ID_CTRL;

/// Outcome of a family lookup, kept for the lifetime of the connection.
#[derive(Debug, Clone)]
enum FamilyState {
    Resolved(FamilyInfo),
    /// The kernel does not know the family; later lookups fail without I/O.
    Missing,
}

/// Generic Netlink connection.
///
/// Resolves family names to ids on first use and remembers the answer.
/// A family the kernel reported as unknown stays unknown: every later
/// request for it fails with [`Error::FamilyNotFound`] without touching the
/// socket. Transient failures (timeouts, I/O) are not remembered.
///
/// # Example
///
/// ```rust,no_run
/// use ptlink::netlink::genl::GenlConnection;
///
/// # async fn example() -> ptlink::Result<()> {
/// let conn = GenlConnection::new()?;
///
/// if conn.get_family("IPV6_HOPPT").await.is_ok() {
///     println!("Path Tracing is available");
/// }
/// # Ok(())
/// # }
/// ```
pub struct GenlConnection<T: Transport = NetlinkSocket> {
    conn: Connection<T>,
    families: RwLock<HashMap<String, FamilyState>>,
}

impl GenlConnection<NetlinkSocket> {
    /// Create a new Generic Netlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self::from_connection(Connection::new()?))
    }

    /// Create a connection with custom timeout and buffer settings.
    pub fn with_config(config: ConnectionConfig) -> Result<Self> {
        Ok(Self::from_connection(Connection::with_config(config)?))
    }
}

impl<T: Transport> GenlConnection<T> {
    /// Wrap an existing netlink connection.
    pub fn from_connection(conn: Connection<T>) -> Self {
        Self {
            conn,
            families: RwLock::new(HashMap::new()),
        }
    }

    /// Create a connection over an arbitrary transport.
    pub fn from_transport(transport: T, config: ConnectionConfig) -> Self {
        Self::from_connection(Connection::from_transport(transport, config))
    }

    /// Get the underlying netlink connection.
    pub fn connection(&self) -> &Connection<T> {
        &self.conn
    }

    fn cached(&self, name: &str) -> Option<FamilyState> {
        self.families
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn remember(&self, name: &str, state: FamilyState) {
        self.families
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), state);
    }

    /// Get information about a Generic Netlink family.
    ///
    /// The result is cached, so subsequent calls for the same family
    /// do not require kernel communication.
    pub async fn get_family(&self, name: &str) -> Result<FamilyInfo> {
        match self.cached(name) {
            Some(FamilyState::Resolved(info)) => return Ok(info),
            Some(FamilyState::Missing) => {
                return Err(Error::FamilyNotFound {
                    name: name.to_string(),
                });
            }
            None => {}
        }

        match self.query_family(name).await {
            Ok(info) => {
                tracing::debug!(family = name, id = info.id, version = info.version, "resolved family");
                self.remember(name, FamilyState::Resolved(info.clone()));
                Ok(info)
            }
            Err(e @ Error::FamilyNotFound { .. }) => {
                tracing::debug!(family = name, "family not registered");
                self.remember(name, FamilyState::Missing);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Get the family ID for a given family name.
    pub async fn get_family_id(&self, name: &str) -> Result<u16> {
        Ok(self.get_family(name).await?.id)
    }

    /// Forget every cached lookup, including failed ones.
    pub fn clear_cache(&self) {
        self.families
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    async fn query_family(&self, name: &str) -> Result<FamilyInfo> {
        let builder = FamilyInfo::request(name)?.to_builder(GENL_ID_CTRL);
        match self.conn.request(builder).await {
            Ok(payload) => FamilyInfo::parse(&payload, name),
            Err(e) if e.errno() == Some(libc::ENOENT) => Err(Error::FamilyNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn prepare(&self, family: &str, req: &GenlRequest, expected: ExchangeMode) -> Result<u16> {
        if req.mode != expected {
            return Err(Error::InvalidRequest(format!(
                "command {} is a {:?} exchange, not {:?}",
                req.cmd, req.mode, expected
            )));
        }
        self.get_family_id(family).await
    }

    /// Send a request without waiting for an answer.
    pub async fn send_only(&self, family: &str, req: &GenlRequest) -> Result<u32> {
        let id = self.get_family_id(family).await?;
        self.conn.send_only(req.to_builder(id)).await
    }

    /// Send a mutation and wait for the kernel's acknowledgement.
    pub async fn ack(&self, family: &str, req: &GenlRequest) -> Result<()> {
        let id = self.prepare(family, req, ExchangeMode::Ack).await?;
        self.conn.request_ack(req.to_builder(id)).await
    }

    /// Send a query and return its single reply payload (GENL header included).
    pub async fn reply(&self, family: &str, req: &GenlRequest) -> Result<Vec<u8>> {
        let id = self.prepare(family, req, ExchangeMode::Reply).await?;
        self.conn.request(req.to_builder(id)).await
    }

    /// Run a dump, handing each message's GENL header and attributes to `on_message`.
    pub async fn dump<F>(&self, family: &str, req: &GenlRequest, mut on_message: F) -> Result<DumpOutcome>
    where
        F: FnMut(&GenlMsgHdr, &[u8]) -> Result<ControlFlow<()>> + Send,
    {
        let id = self.prepare(family, req, ExchangeMode::Dump).await?;
        self.conn
            .dump(req.to_builder(id), |payload| {
                let (hdr, attrs) = split_payload(payload)?;
                on_message(&hdr, attrs)
            })
            .await
    }
}
