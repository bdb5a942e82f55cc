//! Logging setup shared by the CLI and by integration tests.
//!
//! Mirrors the origin workspace's CLI: an `EnvFilter`-driven `tracing`
//! subscriber, with verbosity controlled by repeated `-v` flags rather than
//! by `RUST_LOG` alone (though `RUST_LOG` still takes precedence if set).

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber. `verbosity` follows clap's
/// typical `-v`/`-vv` convention: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).without_time().try_init();
}
