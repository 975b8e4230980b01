//! brisk virtual machine: executes linked bytecode modules.
//!
//! The VM is a stack machine with:
//! - One contiguous slot vector per thread, split into frames of
//!   `[locals | operand stack]`
//! - Calls that run bytecode in place and natives on the host stack,
//!   with natives able to re-enter the interpreter
//! - Containers shared by reference across frames and threads
//!
//! # Usage
//!
//! ```
//! use brisk_common::{Code, Function, Instruction, Module, Value};
//! use brisk_vm::run;
//!
//! let code = Code::new(vec![
//!     Instruction::PushShort(40),
//!     Instruction::PushShort(2),
//!     Instruction::Add,
//!     Instruction::Return,
//! ])
//! .with_stack(2);
//! let module = Module::new(vec![Function::bytecode("main", "app", code)]);
//!
//! assert_eq!(run(module).unwrap(), Value::Int(42));
//! ```

pub mod config;
pub mod error;
mod execute;
mod frame;
pub mod native;
pub mod program;
mod switch;
pub mod thread;

pub use config::VmConfig;
pub use error::{ErrorKind, RuntimeError, TraceEntry, VmError};
pub use native::{Interrupter, NativeCall, NativeFn, NativeRegistry};
pub use program::Program;
pub use thread::{spawn, spawn_with_config, ScriptThread, Thread, ThreadState};

use brisk_common::{Module, Value};
use std::sync::Arc;

/// Link `module` against the core natives and run its entry function
/// (or function 0) with no arguments.
///
/// # Errors
///
/// Returns the crash, with its stack trace, if the script fails.
pub fn run(module: Module) -> Result<Value, VmError> {
    run_with(module, &NativeRegistry::core(), VmConfig::default())
}

/// [`run`] with a caller-supplied registry and limits.
pub fn run_with(
    module: Module,
    registry: &NativeRegistry,
    config: VmConfig,
) -> Result<Value, VmError> {
    let program = Arc::new(Program::link(module, registry));
    let entry = program.entry().unwrap_or(0);
    Thread::with_config(program, config).call_and_wait(entry, &[])
}

#[cfg(test)]
mod proptests {
    use super::*;
    use brisk_common::{Code, Function, Instruction};
    use proptest::prelude::*;

    fn sum_module(values: &[i16]) -> Module {
        let mut insns = vec![Instruction::PushInt0];
        for &v in values {
            insns.push(Instruction::PushShort(v));
            insns.push(Instruction::Add);
        }
        insns.push(Instruction::Return);
        let code = Code::new(insns).with_stack(2);
        Module::new(vec![Function::bytecode("sum", "t", code)])
    }

    proptest! {
        #[test]
        fn sums_match_host_arithmetic(values in prop::collection::vec(any::<i16>(), 0..64)) {
            let expected: i64 = values.iter().map(|&v| i64::from(v)).sum();
            prop_assert_eq!(run(sum_module(&values)), Ok(Value::Int(expected)));
        }

        #[test]
        fn call_depth_is_bounded(depth in 1usize..64) {
            // f() calls itself forever.
            let code = Code::new(vec![
                Instruction::Call { function: 0, argc: 0 },
                Instruction::Return,
            ])
            .with_stack(1);
            let module = Module::new(vec![Function::bytecode("f", "t", code)]);
            let config = VmConfig::default().with_max_frames(depth);
            let err = run_with(module, &NativeRegistry::new(), config).unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::StackOverflow);
            prop_assert_eq!(err.trace().len(), depth);
        }
    }
}
