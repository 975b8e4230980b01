//! Control-flow reachability for brisk functions.
//!
//! Every function is entered at code index 0. Instructions no path reaches
//! are reported as warnings: compilers routinely leave a trailing `LEAVE`
//! after a final `RETURN`.

use crate::error::VerifyError;
use brisk_common::{Code, Instruction, Module};

/// Code indices control can transfer to directly after `at`, limited to
/// the function's code.
pub(crate) fn successors(code: &Code, at: usize) -> Vec<usize> {
    let len = code.instructions.len();
    let Some(insn) = code.instructions.get(at) else {
        return Vec::new();
    };

    let mut next = Vec::new();
    match *insn {
        Instruction::LinearSwitch(table) | Instruction::BinarySwitch(table) => {
            if let Some(table) = code.switch_tables.get(table as usize) {
                next.extend(table.targets.iter().map(|&t| t as usize));
                next.push(table.default as usize);
            }
        }
        _ => next.extend(insn.jump_target().map(|t| t as usize)),
    }
    if insn.falls_through() {
        next.push(at + 1);
    }
    next.retain(|&n| n < len);
    next
}

/// Reachable flags for each instruction of `code`.
pub fn reachable(code: &Code) -> Vec<bool> {
    let mut seen = vec![false; code.instructions.len()];
    if seen.is_empty() {
        return seen;
    }
    seen[0] = true;
    let mut worklist = vec![0];
    while let Some(at) = worklist.pop() {
        for next in successors(code, at) {
            if !seen[next] {
                seen[next] = true;
                worklist.push(next);
            }
        }
    }
    seen
}

/// Instructions no path reaches, in every bytecode function of `module`.
pub fn unreachable_instructions(module: &Module) -> Vec<VerifyError> {
    let mut warnings = Vec::new();
    for function in &module.functions {
        let Some(code) = function.code() else {
            continue;
        };
        let name = function.qualified_name();
        for (at, &seen) in reachable(code).iter().enumerate() {
            if !seen {
                warnings.push(VerifyError::UnreachableInstruction {
                    function: name.clone(),
                    at,
                });
            }
        }
    }
    warnings
}
