//! Verification errors for brisk modules.
//!
//! Errors inside a function carry the function's qualified name and, where
//! one applies, the code index (`at`) of the offending instruction. The
//! verifier collects every error, not just the first.

use thiserror::Error;

/// Errors found during static verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    // --- Limits ---
    #[error("module has {count} functions (max 65535)")]
    TooManyFunctions { count: usize },

    #[error("{function} has {size} instructions (max 1048576)")]
    FunctionTooLarge { function: String, size: usize },

    #[error("{function} declares max_stack {max_stack} (max 4096)")]
    StackTooLarge { function: String, max_stack: u16 },

    #[error("{function} declares max_locals {max_locals} (max 4096)")]
    TooManyLocals { function: String, max_locals: u16 },

    // --- Descriptors ---
    #[error("{function} has min_argc {min} greater than max_argc {max}")]
    InvalidArity { function: String, min: u8, max: u8 },

    /// `defaults.len()` must be `max_argc - min_argc`.
    #[error("{function} has {found} defaults, expected {expected}")]
    DefaultCountMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("{function} names {found} parameters, expected {expected}")]
    ParamCountMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    /// Parameters are copied into locals, so there must be room for them.
    #[error("{function} has {locals} locals for {params} parameters")]
    TooFewLocals {
        function: String,
        locals: u16,
        params: u8,
    },

    #[error("{function} default {index} is undefined")]
    UndefinedDefault { function: String, index: usize },

    #[error("module constant {name} is undefined")]
    UndefinedGlobal { name: String },

    #[error("entry function {entry} out of range")]
    InvalidEntry { entry: u16 },

    // --- Operands ---
    #[error("{function} at {at}: local slot {slot} out of range")]
    LocalOutOfRange { function: String, at: usize, slot: u16 },

    #[error("{function} at {at}: constant {index} out of range")]
    ConstantOutOfRange {
        function: String,
        at: usize,
        index: u16,
    },

    #[error("{function} constant {index} is undefined")]
    UndefinedConstant { function: String, index: usize },

    /// `GetConst` operands name a module constant and must be strings.
    #[error("{function} at {at}: constant name {index} is not a string")]
    ConstNameNotString {
        function: String,
        at: usize,
        index: u16,
    },

    #[error("{function} at {at}: function {callee} out of range")]
    FunctionOutOfRange {
        function: String,
        at: usize,
        callee: u16,
    },

    #[error("{function} at {at}: jump target {target} out of range")]
    JumpOutOfRange {
        function: String,
        at: usize,
        target: u32,
    },

    #[error("{function} at {at}: switch table {table} out of range")]
    SwitchTableOutOfRange {
        function: String,
        at: usize,
        table: u16,
    },

    #[error("{function} switch table {table} has {keys} keys but {targets} targets")]
    SwitchTableMismatch {
        function: String,
        table: usize,
        keys: usize,
        targets: usize,
    },

    #[error("{function} switch table {table}: key constant {key} is missing or not a scalar")]
    InvalidSwitchKey {
        function: String,
        table: usize,
        key: u16,
    },

    /// Binary search needs every pair of keys to be ordered.
    #[error("{function} switch table {table}: keys are not mutually ordered")]
    UnorderedSwitchKeys { function: String, table: usize },

    // --- Stack ---
    #[error("{function} at {at}: stack underflow (depth {depth}, pops {pops})")]
    StackUnderflow {
        function: String,
        at: usize,
        depth: usize,
        pops: usize,
    },

    #[error("{function} at {at}: stack depth {depth} exceeds max_stack {max}")]
    StackOverflow {
        function: String,
        at: usize,
        depth: usize,
        max: usize,
    },

    /// Two paths reach the same instruction with different depths.
    #[error("{function} at {at}: inconsistent stack depth ({expected} vs {found})")]
    InconsistentStack {
        function: String,
        at: usize,
        expected: usize,
        found: usize,
    },

    #[error("{function} at {at}: execution falls off the end of the code")]
    FallsOffEnd { function: String, at: usize },

    /// The never-executed placeholder is reachable.
    #[error("{function} at {at}: UNREACHABLE placeholder is reachable")]
    PlaceholderReachable { function: String, at: usize },

    // --- Reachability (warning) ---
    #[error("{function} at {at}: unreachable instruction")]
    UnreachableInstruction { function: String, at: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_location() {
        let err = VerifyError::StackUnderflow {
            function: "app.main".into(),
            at: 3,
            depth: 0,
            pops: 2,
        };
        assert_eq!(
            err.to_string(),
            "app.main at 3: stack underflow (depth 0, pops 2)"
        );
        let err = VerifyError::TooFewLocals {
            function: "app.f".into(),
            locals: 1,
            params: 2,
        };
        assert_eq!(err.to_string(), "app.f has 1 locals for 2 parameters");
    }
}
