//! Path Tracing integration tests.
//!
//! Each test programs state on its own dummy interface so tests can run
//! in parallel without seeing each other's entries.

use std::time::Duration;

use ptlink::netlink::genl::hoppt::HOPPT_GENL_NAME;
use ptlink::{ConnectionConfig, HopptConnection, HopptEntry, InterfaceBinding, Result, TtsTemplate};

use crate::common::TestDummy;

#[tokio::test]
async fn test_family_resolves() -> Result<()> {
    require_root!();
    require_family!();

    let conn = HopptConnection::new()?;
    let family = conn.genl().get_family(HOPPT_GENL_NAME).await?;
    assert_eq!(family.name, HOPPT_GENL_NAME);
    assert!(family.id > 0x10, "dynamic families come after the control family");
    assert_eq!(conn.family_id().await?, family.id);

    Ok(())
}

#[tokio::test]
async fn test_add_show_del() -> Result<()> {
    require_root!();
    require_family!();

    let dummy = TestDummy::new("ptadd")?;
    let conn = HopptConnection::new()?;

    let entry = HopptEntry::new(7, dummy.ifindex(), TtsTemplate::Template2);
    conn.add_entry(&entry).await?;
    assert_eq!(conn.get_entry(dummy.ifindex()).await?, entry);

    conn.del_entry(dummy.ifindex()).await?;
    assert!(conn.get_entry(dummy.ifindex()).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_dump_contains_entry() -> Result<()> {
    require_root!();
    require_family!();

    let dummy = TestDummy::new("ptdump")?;
    let conn = HopptConnection::new()?;

    let entry = HopptEntry::new(HopptEntry::ID_MAX, dummy.ifindex(), TtsTemplate::Template4);
    conn.add_entry(&entry).await?;

    let entries = conn.get_entries().await?;
    assert!(entries.contains(&entry), "dump should list {:?}", entry);

    conn.del_entry(dummy.ifindex()).await?;
    let entries = conn.get_entries().await?;
    assert!(!entries.iter().any(|e| e.ifindex == dummy.ifindex()));

    Ok(())
}

#[tokio::test]
async fn test_source_bindings() -> Result<()> {
    require_root!();
    require_family!();

    let dummy = TestDummy::new("ptsrc")?;
    let conn = HopptConnection::with_config(ConnectionConfig::new().timeout(Duration::from_secs(2)))?;

    conn.add_source(dummy.ifindex()).await?;
    let sources = conn.get_sources().await?;
    assert!(sources.contains(&InterfaceBinding::new(dummy.ifindex())));

    conn.del_source(dummy.ifindex()).await?;

    Ok(())
}

#[tokio::test]
async fn test_show_without_entry_fails() -> Result<()> {
    require_root!();
    require_family!();

    let dummy = TestDummy::new("ptnone")?;
    let conn = HopptConnection::new()?;

    let err = conn.get_entry(dummy.ifindex()).await.unwrap_err();
    assert!(err.errno().is_some(), "expected a kernel rejection, got {}", err);

    // The session stays usable after a rejection.
    conn.get_entries().await?;

    Ok(())
}
