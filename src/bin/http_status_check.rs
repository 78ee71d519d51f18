use std::process::ExitCode;

use clap::Parser;
use handshake_probe::cli::{self, TargetArgs};
use handshake_probe::{check_status, TcpConnector};
use tracing::info;

/// Check that an HTTP endpoint answers with the expected status code.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[command(flatten)]
    target: TargetArgs,

    /// status code the server must answer with
    #[arg(long, value_name = "CODE")]
    expect_status: u16,
}

fn main() -> ExitCode {
    let args: Args = cli::parse_or_exit();
    args.target.init_log();

    let result = args.target.config().and_then(|config| {
        let status = check_status(&TcpConnector::new(config.timeout), &config, args.expect_status)?;
        info!(status, "status matched");
        Ok(status)
    });
    cli::report(result)
}
