//! Shared utilities for ptlink.

pub mod ifname;

pub use ifname::{IfError, index_to_name, name_or_index, name_to_index};
