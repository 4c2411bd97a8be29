use std::process::ExitCode;

use clap::Parser;
use netprobe_lib::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    netprobe_lib::run(Cli::parse()).await
}
