//! Family-independent Generic Netlink request.

use crate::netlink::attr::AttrSet;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST};

use super::header::GenlMsgHdr;

/// How a request is exchanged with the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeMode {
    /// Mutation; the kernel answers with an acknowledgement.
    Ack,
    /// Query answered by exactly one data message.
    Reply,
    /// Enumeration answered by a multipart dump.
    Dump,
}

impl ExchangeMode {
    /// Netlink header flags for this mode.
    pub fn flags(self) -> u16 {
        match self {
            Self::Ack => NLM_F_REQUEST | NLM_F_ACK,
            Self::Reply => NLM_F_REQUEST,
            Self::Dump => NLM_F_REQUEST | NLM_F_DUMP,
        }
    }
}

/// One logical GENL command: command id, version, attributes and exchange mode.
///
/// The family id is not part of the request; the session fills it in once
/// the family has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenlRequest {
    pub cmd: u8,
    pub version: u8,
    pub attrs: AttrSet,
    pub mode: ExchangeMode,
}

impl GenlRequest {
    pub fn new(cmd: u8, version: u8, mode: ExchangeMode) -> Self {
        Self {
            cmd,
            version,
            attrs: AttrSet::new(),
            mode,
        }
    }

    /// Replace the attribute set.
    pub fn attrs(mut self, attrs: AttrSet) -> Self {
        self.attrs = attrs;
        self
    }

    /// Header flags this request is sent with.
    pub fn flags(&self) -> u16 {
        self.mode.flags()
    }

    /// Render into a message builder addressed to `family_id`.
    pub fn to_builder(&self, family_id: u16) -> MessageBuilder {
        let mut builder = MessageBuilder::new(family_id, self.flags());
        builder.append_header(&GenlMsgHdr::new(self.cmd, self.version));
        builder.append_attrs(&self.attrs);
        builder
    }
}
