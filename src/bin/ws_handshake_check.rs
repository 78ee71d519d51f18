use std::process::ExitCode;

use clap::Parser;
use handshake_probe::cli::{self, TargetArgs};
use handshake_probe::{Handshake, RandomSource, TcpConnector};

/// Verify a server's WebSocket opening handshake (RFC 6455 §4.2).
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[command(flatten)]
    target: TargetArgs,

    /// draw the key from a seeded pseudo-random generator instead of the OS
    #[arg(long, value_name = "SEED")]
    insecure_seed: Option<u64>,
}

fn main() -> ExitCode {
    let args: Args = cli::parse_or_exit();
    args.target.init_log();

    let config = match args.target.config() {
        Ok(config) => config,
        Err(err) => return cli::report::<()>(Err(err)),
    };
    let source = args
        .insecure_seed
        .map_or_else(RandomSource::secure, RandomSource::seeded);

    let result = Handshake::new(TcpConnector::new(config.timeout), config)
        .with_source(source)
        .run();
    cli::report(result.into_result())
}
