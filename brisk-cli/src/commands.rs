//! CLI command implementations.

use brisk_common::{Function, FunctionId, Module};
use brisk_vm::{NativeRegistry, Program, Thread, VmConfig};
use std::fs;
use std::sync::Arc;
use tracing::debug;

/// Options accepted by `run` after the input path.
#[derive(Debug, Default, PartialEq)]
struct RunOptions {
    entry: Option<String>,
    max_frames: Option<usize>,
}

/// Verify, link and run a module, printing the value its entry returns.
pub fn run(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: run requires an input file");
        eprintln!("Usage: brisk run <module.bkm> [--entry NAME] [--max-frames N]");
        return Err(1);
    }

    let input = &args[0];
    let options = parse_run_options(&args[1..])?;
    let module = read_module(input)?;

    // Verify first
    if let Err(errors) = brisk_verifier::verify(&module) {
        for e in &errors {
            eprintln!("error: {e}");
        }
        return Err(2);
    }

    let entry = resolve_entry(&module, options.entry.as_deref())?;
    let mut config = VmConfig::default();
    if let Some(max_frames) = options.max_frames {
        config = config.with_max_frames(max_frames);
    }

    let program = Arc::new(Program::link(module, &NativeRegistry::core()));
    debug!(entry, max_frames = config.max_frames, "running {input}");

    match Thread::with_config(program, config).call_and_wait(entry, &[]) {
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(3)
        }
    }
}

/// Verify a module, printing `OK` or every error, plus dead-code warnings.
pub fn verify(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: verify requires an input file");
        eprintln!("Usage: brisk verify <module.bkm>");
        return Err(1);
    }

    let input = &args[0];
    let module = read_module(input)?;

    let result = brisk_verifier::verify(&module);
    for w in brisk_verifier::unreachable_instructions(&module) {
        eprintln!("warning: {w}");
    }

    match result {
        Ok(()) => {
            println!("OK: {input} ({} functions)", module.functions.len());
            Ok(())
        }
        Err(errors) => {
            for e in &errors {
                eprintln!("error: {e}");
            }
            Err(2)
        }
    }
}

/// List a module's functions: index, qualified name, arity and kind.
pub fn info(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: info requires an input file");
        eprintln!("Usage: brisk info <module.bkm>");
        return Err(1);
    }

    let module = read_module(&args[0])?;
    for (index, function) in module.functions.iter().enumerate() {
        let marker = if module.entry == Some(index as FunctionId) {
            "  (entry)"
        } else {
            ""
        };
        println!(
            "{index:>4}  {}  {}  {}{marker}",
            function.qualified_name(),
            arity(function),
            kind(function)
        );
    }
    if !module.globals.is_empty() {
        println!("globals:");
        for (name, value) in &module.globals {
            println!("  {name} = {value}");
        }
    }
    Ok(())
}

// --- Helpers ---

/// Read and decode an encoded module file.
fn read_module(path: &str) -> Result<Module, i32> {
    let bytes = fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    Module::decode(&bytes).map_err(|e| {
        eprintln!("error: invalid module: {e}");
        1
    })
}

fn parse_run_options(args: &[String]) -> Result<RunOptions, i32> {
    let mut options = RunOptions::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let Some(value) = args.get(i + 1) else {
            eprintln!("error: {flag} requires a value");
            return Err(1);
        };
        match flag {
            "--entry" => options.entry = Some(value.clone()),
            "--max-frames" => match value.parse::<usize>() {
                Ok(n) if n > 0 => options.max_frames = Some(n),
                _ => {
                    eprintln!("error: --max-frames expects a positive integer, got '{value}'");
                    return Err(1);
                }
            },
            other => {
                eprintln!("error: unknown option '{other}'");
                return Err(1);
            }
        }
        i += 2;
    }
    Ok(options)
}

/// The function `run` starts: `--entry NAME`, else the declared entry,
/// else function 0.
fn resolve_entry(module: &Module, name: Option<&str>) -> Result<FunctionId, i32> {
    if let Some(name) = name {
        return module.find_function(name).ok_or_else(|| {
            eprintln!("error: no function named '{name}'");
            1
        });
    }
    match module.entry {
        Some(entry) => Ok(entry),
        None if !module.functions.is_empty() => Ok(0),
        None => {
            eprintln!("error: module has no functions to run");
            Err(1)
        }
    }
}

fn arity(function: &Function) -> String {
    if function.min_argc == function.max_argc {
        format!("({})", function.min_argc)
    } else {
        format!("({}..{})", function.min_argc, function.max_argc)
    }
}

fn kind(function: &Function) -> &'static str {
    if function.is_native() {
        "native"
    } else {
        "bytecode"
    }
}
