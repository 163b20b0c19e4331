//! Error types for netlink operations.

use std::io;
use std::time::Duration;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations. The channel is unusable.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Kernel returned an error reply.
    #[error("kernel error: {message} (errno {errno}){}", ext_ack_suffix(.ext_ack, .bad_attr))]
    Kernel {
        /// The errno value from the kernel (positive).
        errno: i32,
        /// Human-readable error message.
        message: String,
        /// Extended ACK message, when the kernel attached one.
        ext_ack: Option<String>,
        /// Type of the attribute the kernel rejected, when known.
        bad_attr: Option<u16>,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno}){}", ext_ack_suffix(.ext_ack, .bad_attr))]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel (positive).
        errno: i32,
        /// Human-readable error message.
        message: String,
        /// Extended ACK message, when the kernel attached one.
        ext_ack: Option<String>,
        /// Type of the attribute the kernel rejected, when known.
        bad_attr: Option<u16>,
    },

    /// The requested Generic Netlink family is not registered.
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound {
        /// The family name that could not be resolved.
        name: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Attribute stream is structurally broken.
    #[error("malformed attributes: {0}")]
    MalformedAttributes(String),

    /// A required attribute was absent from a reply.
    #[error("missing attribute {attr} in {record}")]
    MissingAttribute {
        /// Attribute type id.
        attr: u16,
        /// Kind of record being decoded.
        record: &'static str,
    },

    /// The caller built a request that does not match its command's shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A reply carried a message type other than the session's family.
    #[error("unexpected message type {actual} (expected family {expected})")]
    ForeignMessage {
        /// The resolved family id.
        expected: u16,
        /// The message type that arrived.
        actual: u16,
    },

    /// No reply arrived within the configured bound.
    #[error("timed out after {0:?} waiting for reply")]
    Timeout(Duration),

    /// The dump callback asked to stop before the kernel finished.
    #[error("dump interrupted by caller")]
    Interrupted,

    /// Frames of an abandoned dump could not be accounted for. The
    /// connection refuses further exchanges.
    #[error("connection lost track of an abandoned dump; open a new connection")]
    Desynchronized,
}

fn ext_ack_suffix(ext_ack: &Option<String>, bad_attr: &Option<u16>) -> String {
    match (ext_ack, bad_attr) {
        (Some(msg), Some(attr)) => format!(": {} (attribute {})", msg, attr),
        (Some(msg), None) => format!(": {}", msg),
        (None, Some(attr)) => format!(" (attribute {})", attr),
        (None, None) => String::new(),
    }
}

impl Error {
    /// Create a kernel error from a negative errno value.
    ///
    /// Codes with no positive counterpart (`i32::MIN`) come from a corrupt
    /// reply and yield [`Error::InvalidMessage`].
    pub fn from_errno(errno: i32) -> Self {
        let Some(positive) = errno.checked_neg() else {
            return Self::InvalidMessage(format!("error code {} out of range", errno));
        };
        Self::Kernel {
            errno: positive,
            message: io::Error::from_raw_os_error(positive).to_string(),
            ext_ack: None,
            bad_attr: None,
        }
    }

    /// Create a kernel error with operation context.
    pub fn from_errno_with_context(errno: i32, operation: impl Into<String>) -> Self {
        Self::from_errno(errno).with_context(operation)
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel {
                errno,
                message,
                ext_ack,
                bad_attr,
            } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
                ext_ack,
                bad_attr,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, missing family).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::ENOENT | libc::ENODEV)
            }
            Self::FamilyNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, libc::EPERM | libc::EACCES)
            }
            _ => false,
        }
    }

    /// Check if this is a "already exists" error (EEXIST).
    pub fn is_already_exists(&self) -> bool {
        self.errno() == Some(libc::EEXIST)
    }

    /// Check if this error leaves the session unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::FamilyNotFound { .. } | Self::Desynchronized
        )
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}
