//! Family resolution through the control family.

use super::header::split_payload;
use super::request::{ExchangeMode, GenlRequest};
use super::{CtrlAttr, CtrlCmd, GENL_CTRL_VERSION};
use crate::netlink::attr::{AttrSet, AttrTable, get};
use crate::netlink::error::{Error, Result};

/// Information about a Generic Netlink family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Registered family name.
    pub name: String,
    /// Family version.
    pub version: u32,
    /// Header size (additional bytes after genlmsghdr).
    pub hdr_size: u32,
    /// Maximum attribute number.
    pub max_attr: u32,
}

impl FamilyInfo {
    /// `CTRL_CMD_GETFAMILY` request for `name`.
    pub(crate) fn request(name: &str) -> Result<GenlRequest> {
        let mut value = name.as_bytes().to_vec();
        value.push(0);
        let mut attrs = AttrSet::new();
        attrs.set(CtrlAttr::FamilyName as u16, value)?;
        Ok(GenlRequest::new(CtrlCmd::GetFamily as u8, GENL_CTRL_VERSION, ExchangeMode::Reply).attrs(attrs))
    }

    /// Decode a `CTRL_CMD_NEWFAMILY` reply payload.
    pub(crate) fn parse(payload: &[u8], name: &str) -> Result<Self> {
        let (_, attrs) = split_payload(payload)?;
        let table = AttrTable::parse(attrs, CtrlAttr::MAX)?;

        let id = table
            .get(CtrlAttr::FamilyId as u16)
            .map(get::u16_ne)
            .transpose()?
            .ok_or(Error::MissingAttribute {
                attr: CtrlAttr::FamilyId as u16,
                record: "family",
            })?;

        let name = match table.get(CtrlAttr::FamilyName as u16) {
            Some(v) => get::string(v)?.to_string(),
            None => name.to_string(),
        };

        Ok(Self {
            id,
            name,
            version: table.u32(CtrlAttr::Version as u16)?.unwrap_or(0),
            hdr_size: table.u32(CtrlAttr::HdrSize as u16)?.unwrap_or(0),
            max_attr: table.u32(CtrlAttr::MaxAttr as u16)?.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;
    use crate::netlink::message::NLMSG_HDRLEN;

    #[test]
    fn test_request_carries_name() {
        let req = FamilyInfo::request("IPV6_HOPPT").unwrap();
        assert_eq!(req.cmd, CtrlCmd::GetFamily as u8);
        assert_eq!(req.mode, ExchangeMode::Reply);
        assert_eq!(
            req.attrs.get(CtrlAttr::FamilyName as u16),
            Some(&b"IPV6_HOPPT\0"[..])
        );
    }

    #[test]
    fn test_parse_reply() {
        let frame = fixtures::family_frame(1, "IPV6_HOPPT", 0x1c);
        let info = FamilyInfo::parse(&frame[NLMSG_HDRLEN..], "IPV6_HOPPT").unwrap();
        assert_eq!(info.id, 0x1c);
        assert_eq!(info.name, "IPV6_HOPPT");
        assert_eq!(info.version, 1);
        assert_eq!(info.max_attr, 3);
    }

    #[test]
    fn test_parse_reply_without_id() {
        let frame = fixtures::data_frame(0x10, 1, CtrlCmd::NewFamily as u8, &[]);
        assert!(matches!(
            FamilyInfo::parse(&frame[NLMSG_HDRLEN..], "IPV6_HOPPT"),
            Err(Error::MissingAttribute { attr: 1, .. })
        ));
    }
}
