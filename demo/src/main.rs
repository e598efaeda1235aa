//! turborpc demo
//!
//! Start an echo server, then send requests to it:
//!
//! ```text
//! turborpc-demo serve --bind 127.0.0.1:9000
//! turborpc-demo call --url ws://127.0.0.1:9000 --route sayHello --payload '{"name":"X"}'
//! ```

mod call;
mod cli;
mod serve;

use clap::Parser;
use turborpc::LoggingConfig;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = LoggingConfig::new(&cli.log_level).structured(cli.json_logs);
    if let Err(e) = logging.init() {
        eprintln!("Error: failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Call(args) => call::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
