//! Common test utilities for integration tests.
//!
//! Provides `TestDummy` for throwaway interfaces and helper macros for
//! conditional test execution.

use ptlink::Result;
use ptlink::HopptConnection;
use std::io;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

/// Global counter for unique interface names.
static LINK_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique interface name (at most 15 characters).
fn unique_link_name(prefix: &str) -> String {
    let id = LINK_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id() % 100_000;
    let mut name = format!("{}{}x{}", prefix, pid, id);
    name.truncate(15);
    name
}

/// A dummy interface deleted again on drop.
pub struct TestDummy {
    name: String,
    ifindex: i32,
}

impl TestDummy {
    /// Create and bring up a dummy interface.
    pub fn new(prefix: &str) -> Result<Self> {
        let name = unique_link_name(prefix);

        run("ip", &["link", "add", &name, "type", "dummy"])?;
        let mut link = Self { name, ifindex: 0 };
        run("ip", &["link", "set", &link.name, "up"])?;

        link.ifindex = ptlink::util::name_to_index(&link.name).map_err(|e| {
            ptlink::Error::InvalidMessage(format!("dummy {} has no index: {}", link.name, e))
        })?;
        Ok(link)
    }

    /// Interface name.
    #[allow(dead_code)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Interface index.
    pub fn ifindex(&self) -> i32 {
        self.ifindex
    }
}

impl Drop for TestDummy {
    fn drop(&mut self) {
        let _ = Command::new("ip").args(["link", "del", &self.name]).output();
    }
}

fn run(cmd: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .map_err(|e| ptlink::Error::Io(io::Error::from(e.kind())))?;

    if !output.status.success() {
        return Err(ptlink::Error::InvalidMessage(format!(
            "command failed: {} {:?}: {}",
            cmd,
            args,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Check whether the kernel registers the Path Tracing family.
pub async fn has_family() -> bool {
    match HopptConnection::new() {
        Ok(conn) => conn.family_id().await.is_ok(),
        Err(_) => false,
    }
}

/// Skip the test if not running as root.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::is_root() {
            eprintln!("Skipping test: requires root");
            return Ok(());
        }
    };
}

/// Skip the test if the kernel has no `IPV6_HOPPT` family.
#[macro_export]
macro_rules! require_family {
    () => {
        if !crate::common::has_family().await {
            eprintln!(
                "Skipping test: {} family not available",
                ptlink::netlink::genl::hoppt::HOPPT_GENL_NAME
            );
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_link_name() {
        let a = unique_link_name("ptdummy");
        let b = unique_link_name("ptdummy");
        assert_ne!(a, b);
        assert!(a.len() <= 15);
    }
}
