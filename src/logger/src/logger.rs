use std::io::Write;

use env_logger::{fmt::Color, Builder, Env};
use log::{Level, LevelFilter};

/// Verbosity ladder: 0 shows errors only, each extra `-v` opens one more
/// level. Counts past the end of the table saturate at trace.
const LEVELS: [LevelFilter; 5] = [
    LevelFilter::Error,
    LevelFilter::Warn,
    LevelFilter::Info,
    LevelFilter::Debug,
    LevelFilter::Trace,
];

/// Initialize the process-wide logger.
///
/// The `GWAS_LOG` environment variable overrides the verbosity count with
/// the usual `env_logger` filter syntax. Calling this twice only refreshes
/// the maximum level, so tests may initialize freely.
pub fn init(verbosity: u8) {
    let env = Env::default().filter("GWAS_LOG");

    let mut builder = Builder::new();
    builder
        .filter_level(max_level(verbosity))
        .format(|buf, record| {
            let mut level_style = buf.style();
            level_style.set_color(level_color(record.level())).set_bold(true);

            write!(
                buf,
                "[{} {: <5} {}] ",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                level_style.value(record.level()),
                record.target(),
            )?;
            // Errors also name the source location they were raised from.
            if record.level() == Level::Error {
                if let (Some(file), Some(line)) = (record.file(), record.line()) {
                    write!(buf, "(@ {file}:{line}) ")?;
                }
            }
            writeln!(buf, "{}", record.args())
        })
        .parse_env(env);

    if builder.try_init().is_err() {
        set_level(verbosity);
    }
}

/// Adjust the maximum level of an already-initialized logger.
pub fn set_level(verbosity: u8) {
    log::set_max_level(max_level(verbosity));
}

fn max_level(verbosity: u8) -> LevelFilter {
    LEVELS[usize::from(verbosity).min(LEVELS.len() - 1)]
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn  => Color::Yellow,
        Level::Info  => Color::Green,
        Level::Debug => Color::Blue,
        Level::Trace => Color::Cyan,
    }
}
