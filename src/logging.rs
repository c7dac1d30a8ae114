use std::path::PathBuf;
use tracing::Span;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Shape of the records written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable single line.
    Compact,
}

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    pub format: LogFormat,
    pub log_file: Option<PathBuf>,
}

/// Alphabet for generated correlation IDs.
const ID_ALPHABET: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// Generate an opaque correlation ID for one run.
pub fn new_correlation_id() -> String {
    nanoid::format(nanoid::rngs::default, &ID_ALPHABET, 16)
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("anokye={}", default_level)))
}

/// Initialize the logging system
///
/// All records go to stderr so stdout stays free for command output.
/// With `log_file`, records are also written as JSON to a daily-rolling file.
pub fn init(options: &LogOptions) {
    let stderr_layer = match options.format {
        LogFormat::Json => fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(options.verbose))
        .with(stderr_layer);

    if let Some(log_path) = &options.log_file {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file_appender = tracing_appender::rolling::daily(
            log_path
                .parent()
                .unwrap_or_else(|| std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("anokye.log")),
        );

        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true);

        let _ = subscriber.with(file_layer).try_init();
    } else {
        let _ = subscriber.try_init();
    }
}

/// Root span for a run. Records emitted inside it, including from nested
/// spans, carry the correlation ID in their span list.
pub fn run_span(correlation_id: &str, command: &str) -> Span {
    tracing::info_span!("run", correlation_id = %correlation_id, command = %command)
}
