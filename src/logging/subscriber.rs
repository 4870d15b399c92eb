//! Global `tracing` subscriber: coloured console output plus a plain-text
//! log file per command.
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::{Event, Level, Metadata};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::Context as LayerContext;
use tracing_subscriber::registry::LookupSpan;

use super::utils::{STAMP_DATETIME, STAMP_TIME, log_file_path, strip_ansi, utc_now};
use super::types::LogKind;
use super::{DRY_RUN_TARGET, STAGE_TARGET};

/// Environment variable holding an `EnvFilter` directive for the console.
pub const LOG_FILTER_ENV: &str = "SHOP_BUILD_LOG";

impl LogKind {
    /// Recover the kind of a line from its `tracing` metadata.
    fn of(meta: &Metadata<'_>) -> Self {
        match *meta.level() {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => match meta.target() {
                STAGE_TARGET => Self::Stage,
                DRY_RUN_TARGET => Self::DryRun,
                _ => Self::Info,
            },
            _ => Self::Debug,
        }
    }

    /// Prefix used in the log file, after the timestamp.
    const fn file_tag(self) -> &'static str {
        match self {
            Self::Stage => "==>",
            Self::DryRun => "    [dry run]",
            Self::Info => "   ",
            Self::Warn => "    [warn]",
            Self::Error => "    [error]",
            Self::Debug => "    [debug]",
        }
    }
}

/// The `message` field of an event, or an empty string.
fn message_of(event: &Event<'_>) -> String {
    struct Message(String);

    impl tracing::field::Visit for Message {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "message" {
                value.clone_into(&mut self.0);
            }
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    let mut visitor = Message(String::new());
    event.record(&mut visitor);
    visitor.0
}

/// Appends every event to the command's log file, timestamped and without
/// ANSI codes. Always receives `DEBUG` and above.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Truncate the log for `command` and write a run header.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let rule = "=".repeat(42);
        let header = format!(
            "{rule}\nshop-build {} {command} {}\n{rule}\n",
            crate::commands::version::version(),
            utc_now(STAMP_DATETIME),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
        let kind = LogKind::of(event.metadata());
        let line = format!(
            "[{}] {} {}",
            utc_now(STAMP_TIME),
            kind.file_tag(),
            strip_ansi(&message_of(event))
        );
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Console format: coloured level tags, bold stage headers, indented body.
#[derive(Debug)]
struct ConsoleFormatter;

impl<S, N> FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let msg = message_of(event);
        match LogKind::of(event.metadata()) {
            LogKind::Error => writeln!(writer, "\x1b[31mERROR\x1b[0m {msg}"),
            LogKind::Warn => writeln!(writer, "\x1b[33mWARN\x1b[0m  {msg}"),
            LogKind::Stage => writeln!(writer, "\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            LogKind::DryRun => writeln!(writer, "  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            LogKind::Info => writeln!(writer, "  {msg}"),
            LogKind::Debug => writeln!(writer, "  \x1b[2m{msg}\x1b[0m"),
        }
    }
}

/// Install the global subscriber: console output (warnings and errors on
/// stderr, the rest on stdout) plus the persistent log file for `command`.
///
/// The console shows `info` and above, `debug` with `verbose`; a directive
/// in `SHOP_BUILD_LOG` overrides both. Call once, before any logging.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let console = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormatter)
        .with_writer(
            std::io::stderr
                .with_max_level(Level::WARN)
                .and(std::io::stdout.with_min_level(Level::INFO)),
        )
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(console)
        .with(FileLayer::new(command).map(|layer| layer.with_filter(LevelFilter::DEBUG)))
        .init();
}
