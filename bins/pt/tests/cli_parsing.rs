//! CLI argument parsing tests for the pt command.
//!
//! These tests exercise argument validation that happens before any
//! netlink traffic, so they need neither root nor the Path Tracing family.

use assert_cmd::Command;
use predicates::prelude::*;

fn pt_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pt"))
}

mod global_flags {
    use super::*;

    #[test]
    fn test_help() {
        pt_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Path Tracing"))
            .stdout(predicate::str::contains("--json"))
            .stdout(predicate::str::contains("--timeout"));
    }

    #[test]
    fn test_version() {
        pt_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pt"));
    }

    #[test]
    fn test_invalid_subcommand() {
        pt_cmd()
            .arg("invalid_command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn test_timeout_must_be_numeric() {
        pt_cmd()
            .args(["--timeout", "soon", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--timeout"));
    }
}

mod add_command {
    use super::*;

    #[test]
    fn test_add_help() {
        pt_cmd()
            .args(["add", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dev DEVICE id ID tts TMPL"));
    }

    #[test]
    fn test_add_id_out_of_range() {
        pt_cmd()
            .args(["add", "dev", "lo", "id", "4096", "tts", "template1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid \"id\" value"));
    }

    #[test]
    fn test_add_raw_template_out_of_range() {
        pt_cmd()
            .args(["add", "dev", "lo", "id", "1", "tts", "9"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid \"tts\" value"));
    }

    #[test]
    fn test_add_missing_tts() {
        pt_cmd()
            .args(["add", "dev", "lo", "id", "1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("missing \"tts template\" attribute"));
    }

    #[test]
    fn test_add_missing_dev() {
        pt_cmd()
            .args(["add", "id", "1", "tts", "tmpl1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("missing \"dev\" attribute"));
    }

    #[test]
    fn test_add_unknown_device() {
        pt_cmd()
            .args(["add", "dev", "nosuchdev0", "id", "1", "tts", "tmpl1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Cannot find device \"nosuchdev0\""));
    }

    #[test]
    fn test_add_unknown_keyword() {
        pt_cmd()
            .args(["add", "dev", "lo", "bogus", "1"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown argument \"bogus\""));
    }
}

mod del_command {
    use super::*;

    #[test]
    fn test_del_requires_dev() {
        pt_cmd()
            .arg("del")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("missing \"dev\" attribute"));
    }

    #[test]
    fn test_del_validates_ignored_id() {
        pt_cmd()
            .args(["del", "dev", "lo", "id", "99999"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid \"id\" value"));
    }
}

mod show_command {
    use super::*;

    #[test]
    fn test_show_aliases() {
        for alias in ["show", "list", "lst"] {
            pt_cmd().args([alias, "--help"]).assert().success();
        }
    }

    #[test]
    fn test_show_rejects_id() {
        pt_cmd()
            .args(["show", "id", "7"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown argument \"id\""));
    }
}

mod source_command {
    use super::*;

    #[test]
    fn test_source_alias() {
        pt_cmd()
            .args(["src", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("add"))
            .stdout(predicate::str::contains("del"))
            .stdout(predicate::str::contains("show"));
    }

    #[test]
    fn test_source_add_requires_dev() {
        pt_cmd()
            .args(["source", "add"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("missing \"dev\" attribute"));
    }

    #[test]
    fn test_source_del_unknown_device() {
        pt_cmd()
            .args(["src", "del", "dev", "nosuchdev0"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Cannot find device"));
    }
}
