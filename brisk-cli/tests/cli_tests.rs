//! Integration tests for the brisk CLI.
//!
//! These tests invoke the `brisk` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use brisk_common::{Code, Function, Instruction as I, Module, Value};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn brisk() -> Command {
    Command::cargo_bin("brisk").unwrap()
}

/// Helper: encode `module` into a `.bkm` file inside `dir`.
fn write_module(dir: &TempDir, module: &Module) -> PathBuf {
    let path = dir.path().join("test.bkm");
    fs::write(&path, module.encode()).unwrap();
    path
}

fn main_only(code: Code) -> Module {
    Module::new(vec![Function::bytecode("main", "app", code)])
}

/// `main` returns 40 + 2.
fn answer() -> Module {
    main_only(
        Code::new(vec![I::PushShort(40), I::PushShort(2), I::Add, I::Return]).with_stack(2),
    )
}

/// `main` consumes a value it never pushed.
fn underflowing() -> Module {
    main_only(Code::new(vec![I::Add, I::Return]).with_stack(2))
}

// ---- No-args / help ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    brisk()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: brisk"));
}

#[test]
fn help_flag_exits_0() {
    brisk()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Commands:"));
}

#[test]
fn unknown_command_exits_1() {
    brisk()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown command"));
}

// ---- Verify ----

#[test]
fn verify_valid_module() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, &answer());

    brisk()
        .args(["verify", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK:"))
        .stdout(predicate::str::contains("(1 functions)"));
}

#[test]
fn verify_invalid_module_exits_2() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, &underflowing());

    brisk()
        .args(["verify", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains(
            "error: app.main at 0: stack underflow (depth 0, pops 2)",
        ));
}

#[test]
fn verify_reports_dead_code_as_warning() {
    let dir = TempDir::new().unwrap();
    let module = main_only(Code::new(vec![I::PushInt1, I::Return, I::Leave]).with_stack(1));
    let path = write_module(&dir, &module);

    brisk()
        .args(["verify", path.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: app.main at 2: unreachable instruction",
        ));
}

#[test]
fn verify_missing_file_exits_1() {
    brisk()
        .args(["verify", "nonexistent.bkm"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn verify_garbage_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.bkm");
    fs::write(&path, b"definitely not a module").unwrap();

    brisk()
        .args(["verify", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid module"));
}

// ---- Run ----

#[test]
fn run_prints_return_value() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, &answer());

    brisk()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("42\n");
}

#[test]
fn run_leave_prints_null() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, &main_only(Code::new(vec![I::Leave])));

    brisk()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn run_invalid_module_exits_2() {
    let dir = TempDir::new().unwrap();
    let path = write_module(&dir, &underflowing());

    brisk()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn run_runtime_error_exits_3() {
    let dir = TempDir::new().unwrap();
    let module = main_only(
        Code::new(vec![I::PushInt1, I::PushInt0, I::Div, I::Return]).with_stack(2),
    );
    let path = write_module(&dir, &module);

    brisk()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("runtime error: division by zero"))
        .stderr(predicate::str::contains("at app.main"));
}

#[test]
fn run_named_entry() {
    let dir = TempDir::new().unwrap();
    let module = Module::new(vec![
        Function::bytecode("main", "app", Code::new(vec![I::Leave])),
        Function::bytecode(
            "other",
            "app",
            Code::new(vec![I::Ldc(0), I::Return])
                .with_constants(vec![Value::string("picked")])
                .with_stack(1),
        ),
    ]);
    let path = write_module(&dir, &module);

    brisk()
        .args(["run", path.to_str().unwrap(), "--entry", "app.other"])
        .assert()
        .success()
        .stdout("picked\n");

    brisk()
        .args(["run", path.to_str().unwrap(), "--entry", "nowhere"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no function named 'nowhere'"));
}

#[test]
fn run_declared_entry() {
    let dir = TempDir::new().unwrap();
    let module = Module::new(vec![
        Function::bytecode("helper", "app", Code::new(vec![I::Leave])),
        Function::bytecode(
            "main",
            "app",
            Code::new(vec![I::PushShort(7), I::Return]).with_stack(1),
        ),
    ])
    .with_entry(1);
    let path = write_module(&dir, &module);

    brisk()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn run_max_frames_bounds_recursion() {
    let dir = TempDir::new().unwrap();
    // main() recurses without end.
    let module = main_only(
        Code::new(vec![I::Call { function: 0, argc: 0 }, I::Return]).with_stack(1),
    );
    let path = write_module(&dir, &module);

    brisk()
        .args(["run", path.to_str().unwrap(), "--max-frames", "8"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("runtime error:"));

    brisk()
        .args(["run", path.to_str().unwrap(), "--max-frames", "none"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn run_calls_core_natives() {
    let dir = TempDir::new().unwrap();
    let module = Module::new(vec![
        Function::native("print", "core", 0, 8),
        Function::bytecode(
            "main",
            "app",
            Code::new(vec![
                I::Ldc(0),
                I::PushShort(3),
                I::CallAndPop { function: 0, argc: 2 },
                I::Leave,
            ])
            .with_constants(vec![Value::string("hello")])
            .with_stack(2),
        ),
    ])
    .with_entry(1);
    let path = write_module(&dir, &module);

    brisk()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout("hello 3\nnull\n");
}

// ---- Info ----

#[test]
fn info_lists_functions() {
    let dir = TempDir::new().unwrap();
    let module = Module::new(vec![
        Function::native("print", "core", 0, 8),
        Function::bytecode(
            "add",
            "app",
            Code::new(vec![I::Load0, I::Load1, I::Add, I::Return])
                .with_locals(2)
                .with_stack(2),
        )
        .with_params(&["a", "b"], vec![Value::Int(1)]),
    ])
    .with_entry(1)
    .with_globals(vec![("LIMIT".into(), Value::Int(10))]);
    let path = write_module(&dir, &module);

    brisk()
        .args(["info", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("0  core.print  (0..8)  native"))
        .stdout(predicate::str::contains("1  app.add  (1..2)  bytecode  (entry)"))
        .stdout(predicate::str::contains("LIMIT = 10"));
}

#[test]
fn info_requires_input() {
    brisk()
        .arg("info")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("info requires an input file"));
}
