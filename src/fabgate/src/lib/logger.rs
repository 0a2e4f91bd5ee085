use slog::{Drain, Level, Logger, KV};
use std::fmt;
use std::fs::File;
use std::path::PathBuf;

/// The logging mode to use.
pub enum LoggingMode {
    /// Messages to STDERR, filtered by verbosity.
    Stderr,

    /// STDERR as above, plus the same records to a file.
    Tee(PathBuf),

    /// Everything that passes the verbosity filter goes to a file in full format; nothing is
    /// written to STDERR.
    File(PathBuf),
}

/// The STDERR format: the message followed by the record's own `key=value` pairs. Warnings and
/// errors are prefixed with their level. Logger-wide values (version, config path) are left to
/// log files.
pub struct FabgateFormat<D>
where
    D: slog_term::Decorator,
{
    decorator: D,
}

impl<D: slog_term::Decorator> FabgateFormat<D> {
    pub fn new(decorator: D) -> FabgateFormat<D> {
        FabgateFormat { decorator }
    }
}

struct RecordPairs<'a> {
    out: &'a mut dyn slog_term::RecordDecorator,
}

impl slog::Serializer for RecordPairs<'_> {
    fn emit_arguments(&mut self, key: slog::Key, val: &fmt::Arguments<'_>) -> slog::Result {
        self.out.start_whitespace()?;
        write!(self.out, " ")?;
        self.out.start_key()?;
        write!(self.out, "{}", key)?;
        self.out.start_separator()?;
        write!(self.out, "=")?;
        self.out.start_value()?;
        write!(self.out, "{}", val)?;
        Ok(())
    }
}

impl<D: slog_term::Decorator> slog::Drain for FabgateFormat<D> {
    type Ok = ();
    type Err = std::io::Error;

    fn log(
        &self,
        record: &slog::Record<'_>,
        values: &slog::OwnedKVList,
    ) -> Result<Self::Ok, Self::Err> {
        self.decorator.with_record(record, values, |decorator| {
            if record.level().is_at_least(Level::Warning) {
                decorator.start_level()?;
                write!(decorator, "{}: ", record.level().as_str())?;
                decorator.start_whitespace()?;
            }

            decorator.start_msg()?;
            write!(decorator, "{}", record.msg())?;
            record
                .kv()
                .serialize(record, &mut RecordPairs { out: &mut *decorator })?;

            decorator.start_whitespace()?;
            writeln!(decorator)?;
            decorator.flush()
        })
    }
}

fn create_drain(mode: LoggingMode) -> std::io::Result<Logger> {
    Ok(match mode {
        LoggingMode::Stderr => {
            let decorator = slog_term::TermDecorator::new().stderr().build();
            let drain = FabgateFormat::new(decorator).fuse();
            Logger::root(slog_async::Async::new(drain).build().fuse(), slog::o!())
        }
        LoggingMode::File(out) => {
            let decorator = slog_term::PlainDecorator::new(File::create(out)?);
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            Logger::root(slog_async::Async::new(drain).build().fuse(), slog::o!())
        }
        LoggingMode::Tee(out) => Logger::root(
            slog::Duplicate::new(
                create_drain(LoggingMode::Stderr)?,
                create_drain(LoggingMode::File(out))?,
            )
            .fuse(),
            slog::o!(),
        ),
    })
}

/// The level shown for a verbosity (`-v` count minus `-q` count); `None` silences everything.
fn level_for(verbose_level: i64) -> Option<Level> {
    match verbose_level {
        i64::MIN..=-4 => None,
        -3 => Some(Level::Critical),
        -2 => Some(Level::Error),
        -1 => Some(Level::Warning),
        0 => Some(Level::Info),
        1 => Some(Level::Debug),
        _ => Some(Level::Trace),
    }
}

pub fn create_root_logger(verbose_level: i64, mode: LoggingMode) -> std::io::Result<Logger> {
    let Some(log_level) = level_for(verbose_level) else {
        return Ok(Logger::root(slog::Discard, slog::o!()));
    };

    let drain = slog::LevelFilter::new(create_drain(mode)?, log_level).fuse();
    Ok(Logger::root(
        drain,
        slog::o!("version" => env!("CARGO_PKG_VERSION")),
    ))
}
