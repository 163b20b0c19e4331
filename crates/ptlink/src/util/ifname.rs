//! Interface name and index utilities.
//!
//! Path Tracing records carry interface indexes only. These helpers map
//! them to names through `/sys/class/net` for the CLI and output layers;
//! the protocol engine never calls them.

use std::path::Path;

/// Maximum interface name length (including null terminator).
pub const IFNAMSIZ: usize = 16;

const SYSFS_NET: &str = "/sys/class/net";

/// Error type for interface operations.
#[derive(Debug, thiserror::Error)]
pub enum IfError {
    #[error("interface not found: {0}")]
    NotFound(String),

    #[error("invalid interface name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IfError>;

/// Validate an interface name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(IfError::InvalidName("empty name".to_string()));
    }

    if name.len() >= IFNAMSIZ {
        return Err(IfError::InvalidName(format!(
            "name too long (max {} chars)",
            IFNAMSIZ - 1
        )));
    }

    if name == "." || name == ".." || name.contains('/') || name.contains('\0') {
        return Err(IfError::InvalidName(format!("{:?} is not a valid name", name)));
    }

    if name.chars().any(|c| c.is_whitespace()) {
        return Err(IfError::InvalidName("name contains whitespace".to_string()));
    }

    Ok(())
}

/// Convert an interface index to its name.
pub fn index_to_name(index: i32) -> Result<String> {
    index_to_name_in(Path::new(SYSFS_NET), index)
}

/// Convert an interface name to its index.
pub fn name_to_index(name: &str) -> Result<i32> {
    name_to_index_in(Path::new(SYSFS_NET), name)
}

/// Interface name for display, falling back to the index itself when the
/// interface is gone.
pub fn name_or_index(index: i32) -> String {
    index_to_name(index).unwrap_or_else(|_| index.to_string())
}

/// Parse a `dev` argument: an interface name, or a numeric index.
///
/// Names win over numbers, so an interface literally called `42` is
/// looked up by name first.
pub fn resolve(s: &str) -> Result<i32> {
    match name_to_index(s) {
        Ok(index) => Ok(index),
        Err(err) => match s.parse::<i32>() {
            Ok(index) if index > 0 => Ok(index),
            _ => Err(err),
        },
    }
}

fn index_to_name_in(root: &Path, index: i32) -> Result<String> {
    if index <= 0 {
        return Err(IfError::NotFound(format!("index {}", index)));
    }

    for entry in std::fs::read_dir(root)?.flatten() {
        let path = entry.path().join("ifindex");
        if let Ok(content) = std::fs::read_to_string(&path)
            && content.trim().parse::<i32>() == Ok(index)
        {
            return Ok(entry.file_name().to_string_lossy().to_string());
        }
    }

    Err(IfError::NotFound(format!("index {}", index)))
}

fn name_to_index_in(root: &Path, name: &str) -> Result<i32> {
    validate(name)?;

    let content = std::fs::read_to_string(root.join(name).join("ifindex"))
        .map_err(|_| IfError::NotFound(name.to_string()))?;

    content
        .trim()
        .parse()
        .map_err(|_| IfError::NotFound(name.to_string()))
}
