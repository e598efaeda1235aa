//! Command-line arguments

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "turborpc-demo",
    version,
    about = "Correlated request/response over WebSocket",
    long_about = "Runs a small echo server, or connects to one and sends requests.\n\
                  Logs go to stderr; responses are printed to stdout as JSON."
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Run an echo server that answers PING with PONG
    Serve(ServeArgs),

    /// Connect to a server and send requests
    Call(CallArgs),
}

#[derive(Args, Debug)]
pub(crate) struct ServeArgs {
    /// Address to listen on
    #[arg(long, short = 'b', default_value = "127.0.0.1:9000")]
    pub bind: SocketAddr,

    /// Close every connection with this code instead of serving it (e.g. 1008)
    #[arg(long)]
    pub reject_with: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct CallArgs {
    /// Server URL
    #[arg(long, short = 'u', env = "TURBORPC_URL", default_value = "ws://127.0.0.1:9000")]
    pub url: String,

    /// Route of each request
    #[arg(long, short = 'r', default_value = "echo")]
    pub route: String,

    /// Request payload as JSON
    #[arg(long, short = 'p', default_value = "{}")]
    pub payload: String,

    /// Header added to every request, as key=value
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Session options file (TOML, YAML or JSON)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of requests to send concurrently
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))
}
