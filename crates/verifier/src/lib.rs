//! brisk verifier: static analysis for bytecode modules.
//!
//! The verifier checks a `Module` for correctness BEFORE it is linked and
//! run. It collects ALL errors (not just the first) and returns them. The
//! VM trusts verified code: a module that passes cannot drive a frame's
//! operand stack out of its region or hit an internal fault.
//!
//! # Usage
//!
//! ```
//! use brisk_common::{Code, Function, Instruction, Module};
//! use brisk_verifier::verify;
//!
//! let code = Code::new(vec![Instruction::PushInt1, Instruction::Return]).with_stack(1);
//! let module = Module::new(vec![Function::bytecode("main", "app", code)]);
//!
//! assert!(verify(&module).is_ok());
//! ```
//!
//! # Passes
//!
//! 1. **Limits**: function count, code size, frame size
//! 2. **Structural**: descriptors, operands, switch tables, constants
//! 3. **Stack**: depth dataflow over every reachable path
//!
//! [`unreachable_instructions`] reports dead code separately, as warnings.

pub mod error;
pub mod limits;
pub mod reachability;
pub mod stack;
pub mod structural;

pub use error::VerifyError;
pub use reachability::unreachable_instructions;
pub use stack::required_stack;

use brisk_common::Module;

/// Verify a module for correctness.
///
/// Returns `Ok(())` if the module passes all checks, or
/// `Err(Vec<VerifyError>)` with all errors found.
///
/// The stack pass only runs when the structural pass is clean, since it
/// follows jump targets and switch tables.
pub fn verify(module: &Module) -> Result<(), Vec<VerifyError>> {
    let mut all_errors = Vec::new();

    // Pass 1: Limits
    all_errors.extend(limits::check_limits(module));

    // Pass 2: Structural
    let structural_errors = structural::check_structural(module);
    let sound = structural_errors.is_empty();
    all_errors.extend(structural_errors);

    // Pass 3: Stack
    if sound {
        all_errors.extend(stack::check_stack(module));
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}
