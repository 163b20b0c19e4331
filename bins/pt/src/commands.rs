//! Turning parsed arguments into Path Tracing commands, and running them.

use anyhow::{Context, Result, anyhow};
use ptlink::output::{OutputFormat, OutputOptions, print_all};
use ptlink::util::ifname;
use ptlink::{HopptCommand, HopptConnection, HopptEntry, InterfaceBinding};

use crate::{Command, SourceCommand};
use crate::args::Keywords;

/// Validate arguments and resolve devices. No netlink traffic happens here.
pub fn plan(command: Option<Command>) -> Result<HopptCommand> {
    let command = match command {
        None => return Ok(HopptCommand::Dump),
        Some(command) => command,
    };

    match command {
        Command::Add { params } => {
            let kw = Keywords::parse(&params, &["dev", "id", "tts"])?;
            let ifindex = resolve_dev(kw.require_dev()?)?;
            let id = kw.id.ok_or_else(|| anyhow!("missing \"id\" attribute"))?;
            let tts = kw
                .tts
                .ok_or_else(|| anyhow!("missing \"tts template\" attribute"))?;
            Ok(HopptCommand::Add(HopptEntry::new(id, ifindex, tts)))
        }
        Command::Del { params } => {
            // id and tts are accepted for symmetry with add; the kernel
            // identifies the entry by interface alone.
            let kw = Keywords::parse(&params, &["dev", "id", "tts"])?;
            Ok(HopptCommand::Del {
                ifindex: resolve_dev(kw.require_dev()?)?,
            })
        }
        Command::Show { params } if params.is_empty() => Ok(HopptCommand::Dump),
        Command::Show { params } => {
            let kw = Keywords::parse(&params, &["dev"])?;
            Ok(HopptCommand::Show {
                ifindex: resolve_dev(kw.require_dev()?)?,
            })
        }
        Command::Source { command } => match command {
            None | Some(SourceCommand::Show) => Ok(HopptCommand::SourceDump),
            Some(SourceCommand::Add { params }) => Ok(HopptCommand::SourceAdd(source_binding(&params)?)),
            Some(SourceCommand::Del { params }) => Ok(HopptCommand::SourceDel(source_binding(&params)?)),
        },
    }
}

fn source_binding(params: &[String]) -> Result<InterfaceBinding> {
    let kw = Keywords::parse(params, &["dev"])?;
    Ok(InterfaceBinding::new(resolve_dev(kw.require_dev()?)?))
}

fn resolve_dev(dev: &str) -> Result<i32> {
    ifname::resolve(dev).map_err(|_| anyhow!("Cannot find device \"{}\"", dev))
}

/// Run one command, printing whatever it returns.
pub async fn execute(
    conn: &HopptConnection,
    command: HopptCommand,
    format: OutputFormat,
    opts: &OutputOptions,
) -> Result<()> {
    tracing::debug!(?command, "executing");

    match command {
        HopptCommand::Add(entry) => conn.add_entry(&entry).await?,
        HopptCommand::Del { ifindex } => conn.del_entry(ifindex).await?,
        HopptCommand::Show { ifindex } => {
            let entry = conn.get_entry(ifindex).await?;
            print_all(&[entry], format, opts).context("writing output")?;
        }
        HopptCommand::Dump => {
            let entries = conn.get_entries().await?;
            print_all(&entries, format, opts).context("writing output")?;
        }
        HopptCommand::SourceAdd(binding) => conn.add_source(binding.ifindex).await?,
        HopptCommand::SourceDel(binding) => conn.del_source(binding.ifindex).await?,
        HopptCommand::SourceDump => {
            let sources = conn.get_sources().await?;
            print_all(&sources, format, opts).context("writing output")?;
        }
    }

    Ok(())
}
