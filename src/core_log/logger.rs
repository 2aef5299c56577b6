use std::io::Write;

use env_logger::{Builder, Env};

/// Initializes the process-wide logger with a `[timestamp] [LEVEL] message`
/// line format. The default filter is `info`, or `debug` when the CLI asked
/// for verbose output; `RUST_LOG` still overrides either.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();
}
