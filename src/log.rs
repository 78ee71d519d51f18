use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Enum for configuring log filtering levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFilterLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
    OFF,
}

impl LogFilterLevel {
    /// Maps a `-v` count onto a level. Zero keeps stderr for diagnostics only.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::ERROR,
            1 => Self::INFO,
            2 => Self::DEBUG,
            _ => Self::TRACE,
        }
    }
}

impl From<LogFilterLevel> for LevelFilter {
    fn from(level: LogFilterLevel) -> Self {
        match level {
            LogFilterLevel::TRACE => LevelFilter::TRACE,
            LogFilterLevel::DEBUG => LevelFilter::DEBUG,
            LogFilterLevel::INFO => LevelFilter::INFO,
            LogFilterLevel::WARN => LevelFilter::WARN,
            LogFilterLevel::ERROR => LevelFilter::ERROR,
            LogFilterLevel::OFF => LevelFilter::OFF,
        }
    }
}

/// Installs the global stderr logger.
///
/// The filter is built from `filter_level` alone; no environment variable is
/// consulted. Calling this twice keeps the first subscriber.
pub fn init_log(filter_level: LogFilterLevel) {
    let level = LevelFilter::from(filter_level);
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(level.to_string());

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);

    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
