//! Fuzz target for the response demultiplexer.
//!
//! Arbitrary datagrams are sliced into frames and every error frame is
//! converted into an error value, as the connection does on receive.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ptlink::netlink::genl::split_payload;
use ptlink::netlink::{FrameIter, FrameKind};

fuzz_target!(|data: &[u8]| {
    for frame in FrameIter::new(data).take(1024) {
        let Ok(frame) = frame else { break };
        match frame.kind {
            FrameKind::Data(payload) => {
                let _ = split_payload(payload);
            }
            FrameKind::Error(err) => {
                let _ = err.into_error().to_string();
            }
            FrameKind::Ack | FrameKind::Done | FrameKind::Noop => {}
        }
    }
});
