//! pt command - IPv6 hop-by-hop Path Tracing configuration.

mod args;
mod commands;

use std::time::Duration;

use clap::{Parser, Subcommand};
use ptlink::output::{OutputFormat, OutputOptions};
use ptlink::{ConnectionConfig, HopptConnection};

#[derive(Parser)]
#[command(name = "pt", version, about = "IPv6 hop-by-hop Path Tracing configuration")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Don't resolve interface names.
    #[arg(short = 'n', long)]
    numeric: bool,

    /// Netlink exchange timeout in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 5000)]
    timeout: u64,

    /// Log netlink exchanges.
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Program a Path Tracing entry: dev DEVICE id ID tts TMPL
    Add {
        #[arg(trailing_var_arg = true)]
        params: Vec<String>,
    },

    /// Remove the Path Tracing entry of an interface: dev DEVICE [id ID tts TMPL]
    Del {
        #[arg(trailing_var_arg = true)]
        params: Vec<String>,
    },

    /// Show Path Tracing entries: [dev DEVICE]
    #[command(visible_alias = "list", visible_alias = "lst")]
    Show {
        #[arg(trailing_var_arg = true)]
        params: Vec<String>,
    },

    /// Manage interfaces accepting incoming Path Tracing probes.
    #[command(visible_alias = "src")]
    Source {
        #[command(subcommand)]
        command: Option<SourceCommand>,
    },
}

#[derive(Subcommand)]
enum SourceCommand {
    /// Accept incoming probes: dev DEVICE
    Add {
        #[arg(trailing_var_arg = true)]
        params: Vec<String>,
    },

    /// Stop accepting incoming probes: dev DEVICE
    Del {
        #[arg(trailing_var_arg = true)]
        params: Vec<String>,
    },

    /// Show source interfaces.
    #[command(visible_alias = "list", visible_alias = "lst")]
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let opts = OutputOptions {
        numeric: cli.numeric,
        pretty: cli.pretty,
    };

    // Arguments are validated before the socket is opened.
    let result = match commands::plan(cli.command) {
        Ok(command) => {
            let config = ConnectionConfig::new().timeout(Duration::from_millis(cli.timeout));
            match HopptConnection::with_config(config) {
                Ok(conn) => commands::execute(&conn, command, format, &opts).await,
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
