use colored::*;
use std::fmt;
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// A tracing event formatter that colors each line by level.
///
/// Info lines are printed bare so the console report reads cleanly; warnings
/// and errors get a short prefix so they stand out when the output is not a
/// terminal. Structured fields are printed after the message.
pub struct ColorizedFormatter;

impl<S, N> FormatEvent<S, N> for ColorizedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        // Fields are buffered so the whole line can be colored at once.
        let mut buffer = String::new();
        ctx.format_fields(Writer::new(&mut buffer), event)?;

        let level = *event.metadata().level();
        writeln!(writer, "{}", colorize(level, &buffer))
    }
}

fn colorize(level: Level, line: &str) -> ColoredString {
    match level {
        Level::ERROR => format!("error: {}", line).red().bold(),
        Level::WARN => format!("warning: {}", line).yellow(),
        Level::INFO => line.normal(),
        Level::DEBUG => line.blue(),
        Level::TRACE => line.purple(),
    }
}

/// Default level for the verbosity flags.
pub fn default_level(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (true, _) => LevelFilter::DEBUG,
        (false, true) => LevelFilter::WARN,
        (false, false) => LevelFilter::INFO,
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the flag-derived level.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, quiet).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(ColorizedFormatter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, false), LevelFilter::INFO);
        assert_eq!(default_level(true, false), LevelFilter::DEBUG);
        assert_eq!(default_level(false, true), LevelFilter::WARN);
    }

    #[test]
    fn test_prefixes() {
        colored::control::set_override(false);
        assert_eq!(colorize(Level::WARN, "empty run").to_string(), "warning: empty run");
        assert_eq!(colorize(Level::ERROR, "bad file").to_string(), "error: bad file");
        assert_eq!(colorize(Level::INFO, "done").to_string(), "done");
    }
}
