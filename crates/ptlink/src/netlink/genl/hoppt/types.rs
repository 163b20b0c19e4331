//! Path Tracing records.

use std::fmt;

use super::{attr, tts};
use crate::netlink::attr::{AttrSet, AttrTable};
use crate::netlink::error::{Error, Result};

/// Timestamp template selector.
///
/// `Unspecified` means the attribute was absent. `Invalid` holds a raw
/// value the kernel sent that is outside the known range; it is only
/// produced when decoding and is never a valid value to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TtsTemplate {
    #[default]
    Unspecified,
    Template1,
    Template2,
    Template3,
    Template4,
    Invalid(u32),
}

impl TtsTemplate {
    /// All named templates, in selector order.
    pub const NAMED: [TtsTemplate; 4] = [
        Self::Template1,
        Self::Template2,
        Self::Template3,
        Self::Template4,
    ];

    /// Map a raw selector.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            tts::UNSPEC => Self::Unspecified,
            tts::TMPL_1 => Self::Template1,
            tts::TMPL_2 => Self::Template2,
            tts::TMPL_3 => Self::Template3,
            tts::TMPL_4 => Self::Template4,
            other => Self::Invalid(other),
        }
    }

    /// Raw selector value.
    pub fn raw(self) -> u32 {
        match self {
            Self::Unspecified => tts::UNSPEC,
            Self::Template1 => tts::TMPL_1,
            Self::Template2 => tts::TMPL_2,
            Self::Template3 => tts::TMPL_3,
            Self::Template4 => tts::TMPL_4,
            Self::Invalid(raw) => raw,
        }
    }

    /// Look up a template by long (`template2`) or short (`tmpl2`) name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unspec" => Some(Self::Unspecified),
            "template1" | "tmpl1" => Some(Self::Template1),
            "template2" | "tmpl2" => Some(Self::Template2),
            "template3" | "tmpl3" => Some(Self::Template3),
            "template4" | "tmpl4" => Some(Self::Template4),
            _ => None,
        }
    }

    /// Long name; `<invalid>` for out-of-range values.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unspecified => "unspec",
            Self::Template1 => "template1",
            Self::Template2 => "template2",
            Self::Template3 => "template3",
            Self::Template4 => "template4",
            Self::Invalid(_) => "<invalid>",
        }
    }

    /// Short name (`tmpl1`..`tmpl4`).
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Template1 => "tmpl1",
            Self::Template2 => "tmpl2",
            Self::Template3 => "tmpl3",
            Self::Template4 => "tmpl4",
            other => other.name(),
        }
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

#[cfg(feature = "output")]
impl serde::Serialize for TtsTemplate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for TtsTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One Path Tracing entry: the interface id and template programmed on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct HopptEntry {
    /// Interface id stamped into probes (12 bits on the wire).
    pub id: u32,
    /// Owning interface.
    pub ifindex: i32,
    /// Timestamp template.
    pub template: TtsTemplate,
}

impl HopptEntry {
    /// Largest interface id that fits the 12-bit field of the PTSS TLV.
    pub const ID_MAX: u32 = 4095;

    pub fn new(id: u32, ifindex: i32, template: TtsTemplate) -> Self {
        Self {
            id,
            ifindex,
            template,
        }
    }

    /// Attributes describing this entry.
    pub fn to_attributes(&self) -> AttrSet {
        let mut attrs = AttrSet::new();
        attrs
            .set_u32(attr::ID, self.id)
            .set_i32(attr::IFINDEX, self.ifindex)
            .set_u32(attr::TTSTMPL, self.template.raw());
        attrs
    }

    /// Decode an entry from a reply's attributes.
    pub fn from_attributes(table: &AttrTable<'_>) -> Result<Self> {
        let ifindex = require_ifindex(table, "hoppt entry")?;
        let id = table.u32(attr::ID)?.ok_or(Error::MissingAttribute {
            attr: attr::ID,
            record: "hoppt entry",
        })?;
        let template = table
            .u32(attr::TTSTMPL)?
            .map_or(TtsTemplate::Unspecified, TtsTemplate::from_raw);

        Ok(Self {
            id,
            ifindex,
            template,
        })
    }
}

/// An interface on which incoming Path Tracing probes are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "output", derive(serde::Serialize))]
pub struct InterfaceBinding {
    pub ifindex: i32,
}

impl InterfaceBinding {
    pub fn new(ifindex: i32) -> Self {
        Self { ifindex }
    }

    pub fn to_attributes(&self) -> AttrSet {
        let mut attrs = AttrSet::new();
        attrs.set_i32(attr::IFINDEX, self.ifindex);
        attrs
    }

    pub fn from_attributes(table: &AttrTable<'_>) -> Result<Self> {
        Ok(Self {
            ifindex: require_ifindex(table, "source binding")?,
        })
    }
}

fn require_ifindex(table: &AttrTable<'_>, record: &'static str) -> Result<i32> {
    table.i32(attr::IFINDEX)?.ok_or(Error::MissingAttribute {
        attr: attr::IFINDEX,
        record,
    })
}
