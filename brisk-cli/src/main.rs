//! brisk CLI: verify, inspect and run encoded bytecode modules.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage/input/decode error
//! - 2: Verification failure
//! - 3: Runtime error

mod commands;

use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => commands::run(&args[2..]),
        "verify" => commands::verify(&args[2..]),
        "info" => commands::info(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

/// Diagnostics go to stderr, filtered by `BRISK_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("BRISK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    eprintln!("Usage: brisk <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run <module.bkm> [--entry NAME] [--max-frames N]   Verify and run a module");
    eprintln!("  verify <module.bkm>                                Verify a module");
    eprintln!("  info <module.bkm>                                  List a module's functions");
}
