use std::io::{self, Write};

use env_logger::{fmt::Formatter, WriteStyle};
use log::{Level, LevelFilter, Record};

pub fn init(level: LevelFilter, style: WriteStyle) {
    env_logger::Builder::new()
        .format(format)
        .filter_level(level)
        .write_style(style)
        .init();
}

/// Lowers `level` to at least `Debug` when debug output was requested in config.
pub fn with_debug(level: LevelFilter, debug: bool) -> LevelFilter {
    if debug {
        level.max(LevelFilter::Debug)
    } else {
        level
    }
}

fn format(f: &mut Formatter, record: &Record) -> io::Result<()> {
    let args = record.args();
    let level = record.level();
    if let Some(prefix) = level_prefix(level) {
        let style = f.default_level_style(level);
        writeln!(f, "{style}{prefix}{style:#}{args}")
    } else if level >= Level::Debug {
        let target = record.target();
        writeln!(f, "[{target}] {args}")
    } else {
        writeln!(f, "{args}")
    }
}

fn level_prefix(level: Level) -> Option<&'static str> {
    match level {
        Level::Debug | Level::Trace | Level::Info => None,
        Level::Warn => Some("warning: "),
        Level::Error => Some("error: "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_raises_level() {
        assert_eq!(with_debug(LevelFilter::Info, true), LevelFilter::Debug);
        assert_eq!(with_debug(LevelFilter::Trace, true), LevelFilter::Trace);
        assert_eq!(with_debug(LevelFilter::Warn, false), LevelFilter::Warn);
    }
}
