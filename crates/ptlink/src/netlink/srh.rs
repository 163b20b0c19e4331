//! SRv6 Segment Routing Header TLVs used by Path Tracing.
//!
//! A Path Tracing probe carries a PTSS TLV in its SRH. The interface id
//! programmed through [`HopptConnection`](super::genl::hoppt::HopptConnection)
//! is what ends up in the top 12 bits of its `rinfo` field. Unlike Generic
//! Netlink attributes, every field here is in network byte order.

use winnow::binary::{be_u8, be_u16, be_u64};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// SRH TLV types.
pub mod tlv_type {
    pub const INGRESS: u8 = 1;
    pub const EGRESS: u8 = 2;
    pub const OPAQUE: u8 = 3;
    pub const PADDING: u8 = 4;
    pub const HMAC: u8 = 5;
    pub const PTSS: u8 = 128;
}

/// Length of the PTSS TLV value (after type and length).
pub const PTSS_VALUE_LEN: usize = 14;

/// Total length of an encoded PTSS TLV.
pub const PTSS_TLV_LEN: usize = 2 + PTSS_VALUE_LEN;

/// Path Tracing Source Statistics TLV (`struct sr6_tlv_ptss`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PtssTlv {
    /// 12-bit interface id followed by 4-bit load.
    pub rinfo: u16,
    pub timestamp: u64,
    pub session_id: u16,
    pub seq_number: u16,
}

impl PtssTlv {
    /// Largest value of the interface id part of `rinfo`.
    pub const INTERFACE_ID_MAX: u16 = 0x0fff;
    /// Largest value of the load part of `rinfo`.
    pub const LOAD_MAX: u8 = 0x0f;

    /// Compose `rinfo` from an interface id and load; both are masked to their width.
    pub fn with_rinfo(interface_id: u16, load: u8) -> Self {
        Self {
            rinfo: ((interface_id & Self::INTERFACE_ID_MAX) << 4) | u16::from(load & Self::LOAD_MAX),
            ..Self::default()
        }
    }

    /// Interface id (top 12 bits of `rinfo`).
    pub fn interface_id(&self) -> u16 {
        self.rinfo >> 4
    }

    /// Interface load (low 4 bits of `rinfo`).
    pub fn load(&self) -> u8 {
        (self.rinfo & 0x000f) as u8
    }

    /// winnow parser for a full TLV, header included.
    pub fn parse_tlv(input: &mut &[u8]) -> PResult<Self> {
        let kind = be_u8.parse_next(input)?;
        let len = be_u8.parse_next(input)?;
        if kind != tlv_type::PTSS || len as usize != PTSS_VALUE_LEN {
            return Err(ErrMode::Cut(ContextError::new()));
        }
        let rinfo = be_u16.parse_next(input)?;
        let timestamp = be_u64.parse_next(input)?;
        let session_id = be_u16.parse_next(input)?;
        let seq_number = be_u16.parse_next(input)?;
        Ok(Self {
            rinfo,
            timestamp,
            session_id,
            seq_number,
        })
    }

    /// Parse a PTSS TLV from the start of `data`.
    ///
    /// Returns the TLV and the bytes following it.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        if data.len() < PTSS_TLV_LEN {
            return Err(Error::Truncated {
                expected: PTSS_TLV_LEN,
                actual: data.len(),
            });
        }
        let mut input = data;
        let tlv = Self::parse_tlv(&mut input).map_err(|_| {
            Error::InvalidMessage(format!(
                "not a PTSS TLV: type {} length {}",
                data[0], data[1]
            ))
        })?;
        Ok((tlv, input))
    }

    /// Encode as a TLV, header included.
    pub fn encode(&self) -> [u8; PTSS_TLV_LEN] {
        let mut out = [0u8; PTSS_TLV_LEN];
        out[0] = tlv_type::PTSS;
        out[1] = PTSS_VALUE_LEN as u8;
        out[2..4].copy_from_slice(&self.rinfo.to_be_bytes());
        out[4..12].copy_from_slice(&self.timestamp.to_be_bytes());
        out[12..14].copy_from_slice(&self.session_id.to_be_bytes());
        out[14..16].copy_from_slice(&self.seq_number.to_be_bytes());
        out
    }
}
