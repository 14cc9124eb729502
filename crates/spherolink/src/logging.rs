use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// The codec logs every resync and dropped packet at debug.
const WIRE_TARGET: &str = "spherolink_frame";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    /// Engine detail, with the packet codec held at info.
    Debug,
    /// Everything, including per-packet codec output.
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    pub fn targets(self) -> Targets {
        let targets = Targets::new().with_default(self.as_filter());
        match self {
            LogLevel::Debug => targets.with_target(WIRE_TARGET, LevelFilter::INFO),
            _ => targets,
        }
    }

    fn verbose(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// Install the stderr subscriber. Verbose levels also show the module and
/// thread, which tells `spherolink-rx` apart from the handler workers.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(level.verbose())
        .with_thread_names(level.verbose());
    let layer = match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(layer.with_filter(level.targets()))
        .try_init();
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn debug_keeps_packet_codec_quiet() {
        let targets = LogLevel::Debug.targets();
        assert!(targets.would_enable("spherolink_device::dispatcher", &Level::DEBUG));
        assert!(!targets.would_enable("spherolink_frame::reader", &Level::DEBUG));
        assert!(targets.would_enable("spherolink_frame::reader", &Level::INFO));
    }

    #[test]
    fn trace_and_warn_apply_to_every_crate() {
        assert!(LogLevel::Trace
            .targets()
            .would_enable("spherolink_frame::codec", &Level::TRACE));
        let warn = LogLevel::Warn.targets();
        assert!(!warn.would_enable("spherolink_device::pool", &Level::INFO));
        assert!(warn.would_enable("spherolink_device::pool", &Level::WARN));
    }
}
