//! Fuzz target for attribute decoding.
//!
//! Feeds arbitrary bytes to the attribute table parser and the Path
//! Tracing record decoders. None of these operations should panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ptlink::netlink::AttrTable;
use ptlink::netlink::attr::AttrIter;
use ptlink::netlink::genl::hoppt::attr;
use ptlink::netlink::srh::PtssTlv;
use ptlink::{HopptEntry, InterfaceBinding};

fuzz_target!(|data: &[u8]| {
    // Strict iteration must stop at the first error and never read past `data`.
    let mut total = 0usize;
    for item in AttrIter::new(data) {
        match item {
            Ok((_, value)) => total += value.len(),
            Err(_) => break,
        }
    }
    assert!(total <= data.len());

    if let Ok(table) = AttrTable::parse(data, attr::MAX) {
        assert!(table.len() <= data.len() / 4);
        let _ = HopptEntry::from_attributes(&table);
        let _ = InterfaceBinding::from_attributes(&table);
    }

    let _ = PtssTlv::parse(data);
});
