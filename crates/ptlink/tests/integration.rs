//! Integration test entry point.
//!
//! The actual tests are organized in the `integration/` directory. They
//! talk to the running kernel, so they need root and a kernel carrying
//! the `IPV6_HOPPT` Generic Netlink family:
//!
//! ```bash
//! # Run all integration tests
//! sudo cargo test -p ptlink --test integration --features integration
//!
//! # Run a single test
//! sudo cargo test -p ptlink --test integration --features integration test_add_show_del
//! ```
//!
//! Tests skip themselves (and pass) when either requirement is missing.

#[macro_use]
#[path = "common/mod.rs"]
mod common;

#[path = "integration/hoppt.rs"]
mod hoppt;
