//! crossenv CLI entry point.

// The binary shares the library's output posture.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use crossenv::cli::{self, EXIT_OTHER, exit_code_for, render_error};
use crossenv::{commands, logging};

fn main() {
    // The tracing infrastructure may be unusable during a panic, so the
    // hook writes to stderr directly.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("crossenv panicked: {panic_info}");
        eprintln!("Internal error. Re-run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    let exit_code = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt.block_on(run(cli)),
        Err(e) => {
            eprintln!("fatal: failed to create tokio runtime: {e}");
            EXIT_OTHER
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: cli::Cli) -> i32 {
    logging::init(cli.level);
    let json_mode = cli.json;
    match commands::execute(cli).await {
        Ok(()) => cli::EXIT_OK,
        Err(err) => {
            render_error(&err, json_mode);
            exit_code_for(&err)
        }
    }
}
