//! Path Tracing requests and their attribute shapes.

use super::types::{HopptEntry, InterfaceBinding};
use super::{HOPPT_GENL_VERSION, attr, cmd, tts};
use crate::netlink::attr::AttrSet;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{ExchangeMode, GenlRequest};

/// Attributes a command must carry, and may carry; the two sets coincide
/// for every Path Tracing command.
struct Shape {
    name: &'static str,
    attrs: &'static [u16],
    mode: ExchangeMode,
}

fn shape(command: u8) -> Option<Shape> {
    fn of(name: &'static str, attrs: &'static [u16], mode: ExchangeMode) -> Option<Shape> {
        Some(Shape { name, attrs, mode })
    }
    match command {
        cmd::ADD_ID => of("add", &[attr::ID, attr::IFINDEX, attr::TTSTMPL], ExchangeMode::Ack),
        cmd::DEL_ID => of("del", &[attr::IFINDEX], ExchangeMode::Ack),
        cmd::SHOW_ID => of("show", &[attr::IFINDEX], ExchangeMode::Reply),
        cmd::DUMP_ID => of("dump", &[], ExchangeMode::Dump),
        cmd::TGRCV_ADD_ID => of("source add", &[attr::IFINDEX], ExchangeMode::Ack),
        cmd::TGRCV_DEL_ID => of("source del", &[attr::IFINDEX], ExchangeMode::Ack),
        cmd::TGRCV_DUMP_ID => of("source show", &[], ExchangeMode::Reply),
        _ => None,
    }
}

/// Build a Path Tracing request from a raw command id and attribute set.
///
/// The attribute set must match the command exactly: every required
/// attribute present, nothing else, integers four bytes wide, and a
/// template inside the known range. Anything else is
/// [`Error::InvalidRequest`].
pub fn build(command: u8, attrs: AttrSet) -> Result<GenlRequest> {
    let shape = shape(command)
        .ok_or_else(|| Error::InvalidRequest(format!("unknown path tracing command {}", command)))?;

    if let Some(missing) = shape.attrs.iter().find(|&&a| !attrs.contains(a)) {
        return Err(Error::InvalidRequest(format!(
            "{} requires attribute {}",
            shape.name, missing
        )));
    }
    if let Some(extra) = attrs.kinds().find(|a| !shape.attrs.contains(a)) {
        return Err(Error::InvalidRequest(format!(
            "{} does not accept attribute {}",
            shape.name, extra
        )));
    }
    for (kind, value) in attrs.iter() {
        if value.len() != 4 {
            return Err(Error::InvalidRequest(format!(
                "attribute {} must be 4 bytes, got {}",
                kind,
                value.len()
            )));
        }
    }
    if let Some(raw) = attrs.get(attr::TTSTMPL) {
        let raw = u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]);
        if raw > tts::MAX {
            return Err(Error::InvalidRequest(format!(
                "template {} is out of range 0..={}",
                raw,
                tts::MAX
            )));
        }
    }

    Ok(GenlRequest::new(command, HOPPT_GENL_VERSION, shape.mode).attrs(attrs))
}

/// A Path Tracing command with exactly the fields its wire shape needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopptCommand {
    /// Program an entry on an interface.
    Add(HopptEntry),
    /// Remove the entry of an interface.
    Del { ifindex: i32 },
    /// Query the entry of one interface.
    Show { ifindex: i32 },
    /// Enumerate all entries.
    Dump,
    /// Accept incoming probes on an interface.
    SourceAdd(InterfaceBinding),
    /// Stop accepting incoming probes on an interface.
    SourceDel(InterfaceBinding),
    /// Query the source interfaces.
    SourceDump,
}

impl HopptCommand {
    /// Command id on the wire.
    pub fn cmd(&self) -> u8 {
        match self {
            Self::Add(_) => cmd::ADD_ID,
            Self::Del { .. } => cmd::DEL_ID,
            Self::Show { .. } => cmd::SHOW_ID,
            Self::Dump => cmd::DUMP_ID,
            Self::SourceAdd(_) => cmd::TGRCV_ADD_ID,
            Self::SourceDel(_) => cmd::TGRCV_DEL_ID,
            Self::SourceDump => cmd::TGRCV_DUMP_ID,
        }
    }

    /// Attributes sent with the command.
    pub fn attributes(&self) -> AttrSet {
        match self {
            Self::Add(entry) => entry.to_attributes(),
            Self::Del { ifindex } | Self::Show { ifindex } => InterfaceBinding::new(*ifindex).to_attributes(),
            Self::SourceAdd(binding) | Self::SourceDel(binding) => binding.to_attributes(),
            Self::Dump | Self::SourceDump => AttrSet::new(),
        }
    }

    /// How the command is exchanged.
    pub fn mode(&self) -> ExchangeMode {
        match self {
            Self::Add(_) | Self::Del { .. } | Self::SourceAdd(_) | Self::SourceDel(_) => ExchangeMode::Ack,
            Self::Show { .. } | Self::SourceDump => ExchangeMode::Reply,
            Self::Dump => ExchangeMode::Dump,
        }
    }

    /// Build the request.
    ///
    /// Only an [`HopptCommand::Add`] whose template is
    /// [`TtsTemplate::Invalid`](super::TtsTemplate::Invalid) can fail.
    pub fn to_request(&self) -> Result<GenlRequest> {
        build(self.cmd(), self.attributes())
    }
}
