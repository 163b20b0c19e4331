//! Scripted transport and frame builders for unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use tokio::time::Instant;

use super::attr::encode;
use super::error::Result;
use super::genl::{CtrlAttr, CtrlCmd, GENL_ID_CTRL, GenlMsgHdr};
use super::message::{NLM_F_MULTI, NLMSG_HDRLEN, NlMsgHdr, NlMsgType, nlmsg_align};
use super::socket::Transport;

/// Family id handed out by [`family_frame`] in most tests.
pub(crate) const FAMILY: u16 = 0x1c;

/// Produces one datagram given the last message sent.
pub(crate) type Responder = Box<dyn FnOnce(&[u8]) -> Vec<u8> + Send>;

struct Step {
    /// Not delivered before this instant.
    at: Option<Instant>,
    respond: Responder,
}

/// In-memory transport replaying a fixed script.
///
/// Each `recv` pops one responder. Once the script runs dry `recv` never
/// completes, which is how tests provoke timeouts.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    sent: Mutex<Vec<Vec<u8>>>,
    script: Mutex<VecDeque<Step>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram built from the current request sequence.
    pub(crate) fn then(self, f: impl FnOnce(u32) -> Vec<u8> + Send + 'static) -> Self {
        self.then_request(move |msg| {
            let seq = NlMsgHdr::from_bytes(msg).map_or(0, |h| h.nlmsg_seq);
            f(seq)
        })
    }

    /// Queue a datagram built from the full last request.
    pub(crate) fn then_request(self, f: impl FnOnce(&[u8]) -> Vec<u8> + Send + 'static) -> Self {
        self.push(None, Box::new(f))
    }

    /// Queue a datagram that only becomes readable at `at`.
    pub(crate) fn then_at(self, at: Instant, f: impl FnOnce(u32) -> Vec<u8> + Send + 'static) -> Self {
        self.push(
            Some(at),
            Box::new(move |msg| f(NlMsgHdr::from_bytes(msg).map_or(0, |h| h.nlmsg_seq))),
        )
    }

    fn push(self, at: Option<Instant>, respond: Responder) -> Self {
        self.script.lock().unwrap().push_back(Step { at, respond });
        self
    }

    /// Queue a closed-channel indication.
    pub(crate) fn then_close(self) -> Self {
        self.then(|_| Vec::new())
    }

    /// Every message sent so far.
    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Header of the n-th sent message.
    pub(crate) fn sent_header(&self, n: usize) -> NlMsgHdr {
        let sent = self.sent.lock().unwrap();
        NlMsgHdr::from_bytes(&sent[n]).unwrap()
    }

    /// Responders not yet consumed.
    pub(crate) fn pending(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    fn last_sent(&self) -> Vec<u8> {
        self.sent.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, msg: &[u8]) -> impl Future<Output = Result<()>> + Send {
        self.sent.lock().unwrap().push(msg.to_vec());
        std::future::ready(Ok(()))
    }

    fn recv(&self) -> impl Future<Output = Result<Vec<u8>>> + Send {
        async move {
            let at = self.script.lock().unwrap().front().and_then(|step| step.at);
            if let Some(at) = at {
                tokio::time::sleep_until(at).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(step) => Ok((step.respond)(&self.last_sent())),
                None => std::future::pending().await,
            }
        }
    }

    fn pid(&self) -> u32 {
        4242
    }
}

/// One netlink message with an arbitrary header.
pub(crate) fn raw_frame(msg_type: u16, flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut hdr = NlMsgHdr::new(msg_type, flags);
    hdr.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
    hdr.nlmsg_seq = seq;
    let mut buf = hdr.as_bytes().to_vec();
    buf.extend_from_slice(payload);
    buf.resize(nlmsg_align(buf.len()), 0);
    buf
}

/// Generic Netlink data message: genl header (version 1) plus attributes.
pub(crate) fn data_frame(family: u16, seq: u32, cmd: u8, attrs: &[u8]) -> Vec<u8> {
    let mut payload = GenlMsgHdr::new(cmd, 1).as_bytes().to_vec();
    payload.extend_from_slice(attrs);
    raw_frame(family, 0, seq, &payload)
}

/// Error message carrying `error` and the (capped) request header.
pub(crate) fn error_frame(seq: u32, error: i32) -> Vec<u8> {
    let mut echoed = NlMsgHdr::new(FAMILY, 0);
    echoed.nlmsg_seq = seq;
    let mut payload = error.to_ne_bytes().to_vec();
    payload.extend_from_slice(echoed.as_bytes());
    raw_frame(NlMsgType::ERROR, 0, seq, &payload)
}

pub(crate) fn ack_frame(seq: u32) -> Vec<u8> {
    error_frame(seq, 0)
}

pub(crate) fn done_frame(seq: u32) -> Vec<u8> {
    raw_frame(NlMsgType::DONE, NLM_F_MULTI, seq, &0i32.to_ne_bytes())
}

/// Control family reply announcing `name` under `id`.
pub(crate) fn family_frame(seq: u32, name: &str, id: u16) -> Vec<u8> {
    let mut name = name.as_bytes().to_vec();
    name.push(0);
    let attrs = encode([
        (CtrlAttr::FamilyId as u16, &id.to_ne_bytes()[..]),
        (CtrlAttr::FamilyName as u16, &name[..]),
        (CtrlAttr::Version as u16, &1u32.to_ne_bytes()[..]),
        (CtrlAttr::MaxAttr as u16, &3u32.to_ne_bytes()[..]),
    ]);
    data_frame(GENL_ID_CTRL, seq, CtrlCmd::NewFamily as u8, &attrs)
}

/// Concatenate several messages into one datagram.
pub(crate) fn datagram(frames: impl IntoIterator<Item = Vec<u8>>) -> Vec<u8> {
    frames.into_iter().flatten().collect()
}
