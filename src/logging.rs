use std::ffi::OsStr;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log to a file and optionally to the console.
/// Keep the returned guards alive until exit or buffered lines are lost.
pub fn init(level: Level, console: bool, log_file: Option<&Path>) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let file_layer = log_file.map(|path| {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = path.file_name().unwrap_or(OsStr::new("arednmon.log"));
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        guards.push(guard);
        fmt::layer()
            .compact()
            .with_level(true) // include levels in formatted output
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    let console_layer = console.then(|| {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);
        fmt::layer()
            .compact()
            .with_level(true)
            .with_target(true)
            .with_thread_names(false)
            .with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(file_layer)
        .with(console_layer)
        .init();
    guards
}
