//! Argument handling shared by both binaries.

use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Args, Parser};

use crate::config::{ProbeConfig, Target};
use crate::error::Result;
use crate::log::{init_log, LogFilterLevel};

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// server host name or address
    #[arg(long)]
    pub host: String,

    /// server port
    #[arg(long)]
    pub port: u16,

    /// request path, starting with '/'
    #[arg(long)]
    pub path: String,

    /// give up on connect, read or write after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// log progress to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl TargetArgs {
    pub fn config(&self) -> Result<ProbeConfig> {
        let target = Target::new(self.host.as_str(), self.port, self.path.as_str())?;
        Ok(ProbeConfig::new(target).with_timeout(self.timeout.map(Duration::from_secs)))
    }

    pub fn init_log(&self) {
        init_log(LogFilterLevel::from_verbosity(self.verbose));
    }
}

/// Parses the process arguments. Usage errors exit with status 1 before
/// any I/O; `--help` and `--version` exit with 0.
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                err.print().ok();
                std::process::exit(1)
            }
        },
    }
}

/// Prints the one-line diagnostic for a failed run.
pub fn report<T>(result: Result<T>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
