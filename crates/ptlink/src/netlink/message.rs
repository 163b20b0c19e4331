//! Netlink message header and framing.

use super::attr::AttrIter;
use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink message header alignment.
pub const NLMSG_ALIGNTO: usize = 4;

/// Align a length to NLMSG_ALIGNTO boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Size of the netlink message header.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// Netlink message header (mirrors struct nlmsghdr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Length of message including header.
    pub nlmsg_len: u32,
    /// Message type (family id for Generic Netlink).
    pub nlmsg_type: u16,
    /// Additional flags.
    pub nlmsg_flags: u16,
    /// Sequence number.
    pub nlmsg_seq: u32,
    /// Sending process port ID.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Create a new message header.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Get the payload length (total length minus header).
    pub fn payload_len(&self) -> usize {
        (self.nlmsg_len as usize).saturating_sub(NLMSG_HDRLEN)
    }

    /// Check if this is an error message.
    pub fn is_error(&self) -> bool {
        self.nlmsg_type == NlMsgType::ERROR
    }

    /// Check if this is a done message.
    pub fn is_done(&self) -> bool {
        self.nlmsg_type == NlMsgType::DONE
    }

    /// Check if this message has the multi flag.
    pub fn is_multi(&self) -> bool {
        self.nlmsg_flags & NLM_F_MULTI != 0
    }

    /// Check if the kernel flagged the dump as inconsistent.
    pub fn is_dump_interrupted(&self) -> bool {
        self.nlmsg_flags & NLM_F_DUMP_INTR != 0
    }

    /// Convert header to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse header from bytes. The input need not be aligned.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }
}

/// Standard netlink message types.
pub struct NlMsgType;

impl NlMsgType {
    /// No operation, message must be discarded.
    pub const NOOP: u16 = 1;
    /// Error message or ACK.
    pub const ERROR: u16 = 2;
    /// End of multipart message.
    pub const DONE: u16 = 3;
    /// Data lost, request resend.
    pub const OVERRUN: u16 = 4;
    /// First type available to protocols; the GENL control family starts here.
    pub const MIN_TYPE: u16 = 0x10;
}

/// Netlink message flags.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_ACK: u16 = 0x04;
pub const NLM_F_ECHO: u16 = 0x08;
pub const NLM_F_DUMP_INTR: u16 = 0x10;
pub const NLM_F_DUMP_FILTERED: u16 = 0x20;

// Modifiers to GET request
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_ATOMIC: u16 = 0x400;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

// Flags for ACK messages
pub const NLM_F_CAPPED: u16 = 0x100;
pub const NLM_F_ACK_TLVS: u16 = 0x200;

/// Extended ACK attributes (enum nlmsgerr_attrs).
pub mod nlmsgerr_attr {
    pub const MSG: u16 = 1;
    pub const OFFS: u16 = 2;
    pub const COOKIE: u16 = 3;
}

/// Iterator over netlink messages in a buffer.
///
/// Each item is the header plus the payload that follows it. A message
/// whose declared length runs past the buffer yields [`Error::Truncated`]
/// and ends the iteration.
pub struct MessageIter<'a> {
    data: &'a [u8],
}

impl<'a> MessageIter<'a> {
    /// Create a new message iterator.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<(NlMsgHdr, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        let header = match NlMsgHdr::from_bytes(self.data) {
            Ok(h) => h,
            Err(e) => {
                self.data = &[];
                return Some(Err(e));
            }
        };

        let msg_len = header.nlmsg_len as usize;
        if msg_len < NLMSG_HDRLEN {
            self.data = &[];
            return Some(Err(Error::InvalidMessage(format!(
                "invalid message length: {}",
                msg_len
            ))));
        }
        if msg_len > self.data.len() {
            let actual = self.data.len();
            self.data = &[];
            return Some(Err(Error::Truncated {
                expected: msg_len,
                actual,
            }));
        }

        let payload = &self.data[NLMSG_HDRLEN..msg_len];
        let aligned_len = nlmsg_align(msg_len);

        // Move to next message
        if aligned_len >= self.data.len() {
            self.data = &[];
        } else {
            self.data = &self.data[aligned_len..];
        }

        Some(Ok((header, payload)))
    }
}

/// Netlink error message payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgError {
    /// Error code (negative errno or 0 for ACK).
    pub error: i32,
    /// Original message header that caused the error.
    pub msg: NlMsgHdr,
}

impl NlMsgError {
    /// Parse error message from payload.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: std::mem::size_of::<Self>(),
                actual: data.len(),
            })
    }

    /// Check if this is an ACK (no error).
    pub fn is_ack(&self) -> bool {
        self.error == 0
    }

    /// Get the extended ACK attributes that follow the error.
    ///
    /// `flags` are the flags of the enclosing error message: unless the
    /// kernel set `NLM_F_CAPPED`, the full original request is echoed
    /// before the attributes.
    pub fn ext_ack_attrs<'a>(&self, payload: &'a [u8], flags: u16) -> AttrIter<'a> {
        if flags & NLM_F_ACK_TLVS == 0 {
            return AttrIter::new(&[]);
        }
        let offset = if flags & NLM_F_CAPPED != 0 {
            std::mem::size_of::<Self>()
        } else {
            nlmsg_align(std::mem::size_of::<i32>() + self.msg.nlmsg_len as usize)
        };
        AttrIter::new(payload.get(offset..).unwrap_or(&[]))
    }

    /// Get the echoed original request (header included) when not capped.
    pub fn echoed_request<'a>(&self, payload: &'a [u8], flags: u16) -> Option<&'a [u8]> {
        if flags & NLM_F_CAPPED != 0 {
            return None;
        }
        let start = std::mem::size_of::<i32>();
        payload.get(start..start + self.msg.nlmsg_len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(msg_type: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut hdr = NlMsgHdr::new(msg_type, 0);
        hdr.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
        hdr.nlmsg_seq = seq;
        let mut buf = hdr.as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(nlmsg_align(buf.len()), 0);
        buf
    }

    #[test]
    fn test_header_size() {
        assert_eq!(NLMSG_HDRLEN, 16);
    }

    #[test]
    fn test_iter_splits_messages() {
        let mut buf = frame(0x20, 1, &[1, 2, 3]);
        buf.extend(frame(NlMsgType::DONE, 1, &[0, 0, 0, 0]));

        let msgs: Vec<_> = MessageIter::new(&buf).collect::<Result<_>>().unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].0.nlmsg_type, 0x20);
        assert_eq!(msgs[0].1, &[1, 2, 3]);
        assert_eq!(msgs[0].0.payload_len(), 3);
        assert!(!msgs[0].0.is_error());
        assert!(msgs[1].0.is_done());
        assert!(!msgs[1].0.is_multi());
    }

    #[test]
    fn test_iter_unaligned_buffer() {
        let mut buf = vec![0u8];
        buf.extend(frame(0x20, 7, &[1, 2, 3, 4]));
        let (hdr, payload) = MessageIter::new(&buf[1..]).next().unwrap().unwrap();
        assert_eq!(hdr.nlmsg_seq, 7);
        assert_eq!(payload, &[1, 2, 3, 4]);

        let mut err = vec![0u8];
        err.extend_from_slice(&(-17i32).to_ne_bytes());
        err.extend_from_slice(NlMsgHdr::new(0x20, NLM_F_REQUEST).as_bytes());
        assert_eq!(NlMsgError::from_bytes(&err[1..]).unwrap().error, -17);
    }

    #[test]
    fn test_iter_truncated_message() {
        let mut buf = frame(0x20, 1, &[0; 8]);
        buf.truncate(20);
        let mut iter = MessageIter::new(&buf);
        assert!(matches!(
            iter.next(),
            Some(Err(Error::Truncated {
                expected: 24,
                actual: 20
            }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_iter_short_header() {
        let buf = [0u8; 10];
        assert!(matches!(
            MessageIter::new(&buf).next(),
            Some(Err(Error::Truncated { .. }))
        ));
    }

    #[test]
    fn test_iter_bogus_length() {
        let mut buf = frame(0x20, 1, &[]);
        buf[0..4].copy_from_slice(&4u32.to_ne_bytes());
        assert!(matches!(
            MessageIter::new(&buf).next(),
            Some(Err(Error::InvalidMessage(_)))
        ));
    }

    #[test]
    fn test_error_payload() {
        let mut payload = (-17i32).to_ne_bytes().to_vec();
        payload.extend_from_slice(NlMsgHdr::new(0x20, NLM_F_REQUEST).as_bytes());
        let err = NlMsgError::from_bytes(&payload).unwrap();
        assert!(!err.is_ack());
        assert_eq!(err.error, -17);
        assert_eq!(err.msg.nlmsg_type, 0x20);
    }
}
