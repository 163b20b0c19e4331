//! iproute2-style keyword arguments (`dev eth0 id 7 tts template2`).

use anyhow::{Result, bail};
use ptlink::{HopptEntry, TtsTemplate};

/// Keywords collected from a command's trailing arguments.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Keywords {
    pub dev: Option<String>,
    pub id: Option<u32>,
    pub tts: Option<TtsTemplate>,
}

impl Keywords {
    /// Parse `params`, accepting only the keywords in `allowed`.
    pub fn parse(params: &[String], allowed: &[&str]) -> Result<Self> {
        let mut kw = Self::default();
        let mut iter = params.iter();

        while let Some(key) = iter.next() {
            if !allowed.contains(&key.as_str()) {
                bail!("unknown argument \"{}\"", key);
            }
            let Some(value) = iter.next() else {
                bail!("missing value for \"{}\"", key);
            };
            match key.as_str() {
                "dev" => set_once(&mut kw.dev, "dev", value.clone())?,
                "id" => set_once(&mut kw.id, "id", parse_id(value)?)?,
                "tts" => set_once(&mut kw.tts, "tts", parse_tts(value)?)?,
                _ => bail!("unknown argument \"{}\"", key),
            }
        }

        Ok(kw)
    }

    /// The `dev` keyword, which every command with arguments requires.
    pub fn require_dev(&self) -> Result<&str> {
        match &self.dev {
            Some(dev) => Ok(dev),
            None => bail!("missing \"dev\" attribute"),
        }
    }
}

fn set_once<T>(slot: &mut Option<T>, key: &str, value: T) -> Result<()> {
    if slot.is_some() {
        bail!("duplicate \"{}\": is given more than once", key);
    }
    *slot = Some(value);
    Ok(())
}

/// Parse an unsigned integer in decimal, `0x` hex or leading-zero octal.
pub fn parse_u32(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if s.len() > 1 && s.starts_with('0') {
        u32::from_str_radix(&s[1..], 8).ok()
    } else {
        s.parse().ok()
    }
}

/// Parse an entry id; it must fit the 12-bit interface id field.
pub fn parse_id(s: &str) -> Result<u32> {
    match parse_u32(s) {
        Some(id) if id <= HopptEntry::ID_MAX => Ok(id),
        _ => bail!("invalid \"id\" value \"{}\" (expected 0..{})", s, HopptEntry::ID_MAX),
    }
}

/// Parse a template: a raw selector, or a long or short name.
///
/// Unknown names select `unspec`.
pub fn parse_tts(s: &str) -> Result<TtsTemplate> {
    if let Some(raw) = parse_u32(s) {
        return match TtsTemplate::from_raw(raw) {
            TtsTemplate::Invalid(_) => bail!("invalid \"tts\" value \"{}\"", s),
            tmpl => Ok(tmpl),
        };
    }
    Ok(TtsTemplate::from_name(s).unwrap_or_else(|| {
        tracing::warn!("unknown tts template {:?}, using unspec", s);
        TtsTemplate::Unspecified
    }))
}
