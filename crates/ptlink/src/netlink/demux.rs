//! Response demultiplexing.
//!
//! A receive buffer may hold several netlink messages. [`FrameIter`]
//! slices them by their declared length and classifies each one, so the
//! exchange loops in [`Connection`](super::Connection) only deal with
//! data, acknowledgements, kernel errors and the dump terminator.

use super::attr::{NlAttr, get};
use super::error::{Error, Result};
use super::message::{MessageIter, NlMsgError, NlMsgHdr, NlMsgType, nlmsgerr_attr};

/// What a single netlink message turned out to be.
#[derive(Debug)]
pub enum FrameKind<'a> {
    /// Protocol data; the payload starts after the netlink header.
    Data(&'a [u8]),
    /// Error message with code 0.
    Ack,
    /// Error message carrying a negative errno, or a failed dump.
    Error(KernelError),
    /// End of a multipart dump.
    Done,
    /// Message the receiver must discard (NOOP, OVERRUN).
    Noop,
}

/// One classified netlink message.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Netlink header.
    pub header: NlMsgHdr,
    /// Classified content.
    pub kind: FrameKind<'a>,
}

impl Frame<'_> {
    /// Sequence number of the message.
    pub fn seq(&self) -> u32 {
        self.header.nlmsg_seq
    }

    /// Message type (the family id for data messages).
    pub fn msg_type(&self) -> u16 {
        self.header.nlmsg_type
    }
}

/// Error reply decoded from an `NLMSG_ERROR` (or failed `NLMSG_DONE`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelError {
    /// Raw error code, negative errno.
    pub error: i32,
    /// Extended ACK message.
    pub message: Option<String>,
    /// Byte offset of the rejected attribute within the original request.
    pub offset: Option<u32>,
    /// Type of the rejected attribute, when the request was echoed back.
    pub attr: Option<u16>,
}

impl KernelError {
    fn from_code(error: i32) -> Self {
        Self {
            error,
            message: None,
            offset: None,
            attr: None,
        }
    }

    fn parse(header: &NlMsgHdr, payload: &[u8]) -> Result<Self> {
        let err = NlMsgError::from_bytes(payload)?;
        let mut out = Self::from_code(err.error);

        for (kind, value) in err
            .ext_ack_attrs(payload, header.nlmsg_flags)
            .map_while(|a| a.ok())
        {
            match kind {
                nlmsgerr_attr::MSG => out.message = get::string(value).ok().map(str::to_owned),
                nlmsgerr_attr::OFFS => out.offset = get::u32_ne(value).ok(),
                _ => {}
            }
        }

        if let (Some(offset), Some(request)) =
            (out.offset, err.echoed_request(payload, header.nlmsg_flags))
        {
            out.attr = request
                .get(offset as usize..)
                .and_then(|rest| NlAttr::from_bytes(rest).ok())
                .map(|a| a.kind());
        }

        Ok(out)
    }

    /// Convert into the crate error type.
    pub fn into_error(self) -> Error {
        match Error::from_errno(self.error) {
            Error::Kernel { errno, message, .. } => Error::Kernel {
                errno,
                message,
                ext_ack: self.message,
                bad_attr: self.attr,
            },
            other => other,
        }
    }
}

/// Iterator over classified frames in a receive buffer.
pub struct FrameIter<'a> {
    inner: MessageIter<'a>,
}

impl<'a> FrameIter<'a> {
    /// Create a new frame iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            inner: MessageIter::new(data),
        }
    }
}

impl<'a> Iterator for FrameIter<'a> {
    type Item = Result<Frame<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (header, payload) = match self.inner.next()? {
            Ok(m) => m,
            Err(e) => return Some(Err(e)),
        };

        let kind = match header.nlmsg_type {
            NlMsgType::ERROR => match KernelError::parse(&header, payload) {
                Ok(err) if err.error == 0 => FrameKind::Ack,
                Ok(err) => FrameKind::Error(err),
                Err(e) => return Some(Err(e)),
            },
            NlMsgType::DONE => match get::i32_ne(payload) {
                // The kernel reports a failed dump through the DONE payload.
                Ok(code) if code < 0 => FrameKind::Error(KernelError::from_code(code)),
                _ => FrameKind::Done,
            },
            NlMsgType::NOOP | NlMsgType::OVERRUN => FrameKind::Noop,
            _ => FrameKind::Data(payload),
        };

        tracing::trace!(
            msg_type = header.nlmsg_type,
            seq = header.nlmsg_seq,
            len = header.nlmsg_len,
            "frame"
        );

        Some(Ok(Frame { header, kind }))
    }
}
