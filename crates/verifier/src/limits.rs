//! Size limits for brisk modules.

use crate::error::VerifyError;
use brisk_common::Module;

/// Maximum number of functions; calls address them with a `u16`.
pub const MAX_FUNCTIONS: usize = 65_535;

/// Maximum instructions in one function.
pub const MAX_INSTRUCTIONS: usize = 1_048_576;

/// Maximum declared operand stack per frame.
pub const MAX_STACK: u16 = 4_096;

/// Maximum declared locals per frame.
pub const MAX_LOCALS: u16 = 4_096;

/// Run the limits check.
pub fn check_limits(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    if module.functions.len() > MAX_FUNCTIONS {
        errors.push(VerifyError::TooManyFunctions {
            count: module.functions.len(),
        });
    }

    for function in &module.functions {
        let Some(code) = function.code() else {
            continue;
        };
        let name = function.qualified_name();
        if code.instructions.len() > MAX_INSTRUCTIONS {
            errors.push(VerifyError::FunctionTooLarge {
                function: name.clone(),
                size: code.instructions.len(),
            });
        }
        if code.max_stack > MAX_STACK {
            errors.push(VerifyError::StackTooLarge {
                function: name.clone(),
                max_stack: code.max_stack,
            });
        }
        if code.max_locals > MAX_LOCALS {
            errors.push(VerifyError::TooManyLocals {
                function: name,
                max_locals: code.max_locals,
            });
        }
    }

    errors
}
