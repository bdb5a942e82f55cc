//! Driver for the `nodable` binary: wires [`args::CliArgs`] to the
//! parse/serialize/compile/run pipeline. Kept free of `main`'s
//! `std::process::exit` so the dispatch logic stays testable.

pub mod args;
mod commands;

use anyhow::Result;
use args::{CliArgs, Command};

/// Parse/serialize/compile succeeded; `run` printed the program's result.
pub const EXIT_SUCCESS: i32 = 0;
/// Lexing, parsing, or identifier resolution failed.
pub const EXIT_SYNTAX_ERROR: i32 = 1;
/// The graph failed pre-compilation validity checks.
pub const EXIT_COMPILE_ERROR: i32 = 2;
/// The compiled program raised a runtime error while executing.
pub const EXIT_RUNTIME_ERROR: i32 = 3;

/// Installs a `tracing-subscriber` filter driven by repeated `-v` flags,
/// the same escalation `tsz-cli` uses: quiet by default, `-v` for debug,
/// `-vv` (or more) for trace.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| format!("nodable={level}"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Dispatches to the subcommand named in `args` and returns the process
/// exit code to use.
pub fn run(args: CliArgs) -> Result<i32> {
    match args.command {
        Command::Run { file } => commands::run_program(&file, args.permissive),
        Command::Fmt { file } => commands::fmt(&file, args.permissive),
        Command::Ast { file } => commands::ast(&file, args.permissive),
    }
}
