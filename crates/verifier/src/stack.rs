//! Operand-stack depth analysis for brisk functions.
//!
//! A worklist dataflow assigns every reachable instruction the stack depth
//! on entry and checks that each instruction's declared effect keeps the
//! depth within `[0, max_stack]`. Paths that merge must agree on depth, and
//! no path may run past the last instruction. A module that passes never
//! trips the VM's per-instruction bounds check.

use crate::error::VerifyError;
use crate::reachability::successors;
use brisk_common::{Code, Instruction, Module};

/// Run the stack check over every bytecode function.
pub fn check_stack(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    for function in &module.functions {
        if let Some(code) = function.code() {
            let name = function.qualified_name();
            analyze(&name, code, code.max_stack as usize, &mut errors);
        }
    }
    errors
}

/// Deepest operand stack any path through `code` needs, for compilers
/// filling in `max_stack`. Paths that underflow are cut off.
pub fn required_stack(code: &Code) -> usize {
    let mut ignored = Vec::new();
    analyze("", code, usize::MAX, &mut ignored)
}

/// Returns the maximum depth reached.
fn analyze(name: &str, code: &Code, limit: usize, errors: &mut Vec<VerifyError>) -> usize {
    let len = code.instructions.len();
    if len == 0 {
        errors.push(VerifyError::FallsOffEnd {
            function: name.to_string(),
            at: 0,
        });
        return 0;
    }

    let mut depths: Vec<Option<usize>> = vec![None; len];
    depths[0] = Some(0);
    let mut worklist = vec![0];
    let mut max = 0;

    while let Some(at) = worklist.pop() {
        let Some(depth) = depths[at] else {
            continue;
        };
        let insn = &code.instructions[at];

        if matches!(insn, Instruction::Unreachable) {
            errors.push(VerifyError::PlaceholderReachable {
                function: name.to_string(),
                at,
            });
            continue;
        }

        let pops = insn.pops();
        if depth < pops {
            errors.push(VerifyError::StackUnderflow {
                function: name.to_string(),
                at,
                depth,
                pops,
            });
            continue;
        }
        let after = depth - pops + insn.pushes();
        if after > limit {
            errors.push(VerifyError::StackOverflow {
                function: name.to_string(),
                at,
                depth: after,
                max: limit,
            });
            continue;
        }
        max = max.max(after);

        if insn.falls_through() && at + 1 == len {
            errors.push(VerifyError::FallsOffEnd {
                function: name.to_string(),
                at,
            });
        }

        for next in successors(code, at) {
            match depths[next] {
                None => {
                    depths[next] = Some(after);
                    worklist.push(next);
                }
                Some(seen) if seen != after => {
                    errors.push(VerifyError::InconsistentStack {
                        function: name.to_string(),
                        at: next,
                        expected: seen,
                        found: after,
                    });
                }
                Some(_) => {}
            }
        }
    }

    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use brisk_common::{Function, Instruction as I};

    fn check(code: Code) -> Vec<VerifyError> {
        check_stack(&Module::new(vec![Function::bytecode("f", "m", code)]))
    }

    #[test]
    fn balanced_function() {
        let code = Code::new(vec![I::PushInt1, I::PushInt1, I::Add, I::Return]).with_stack(2);
        assert!(check(code).is_empty());
    }

    #[test]
    fn underflow_detected() {
        let errors = check(Code::new(vec![I::Add, I::Return]).with_stack(2));
        assert_eq!(
            errors,
            vec![VerifyError::StackUnderflow {
                function: "m.f".into(),
                at: 0,
                depth: 0,
                pops: 2,
            }]
        );
    }

    #[test]
    fn overflow_past_declared_max() {
        let errors = check(Code::new(vec![I::PushInt1, I::Dup, I::Pop2, I::Leave]).with_stack(1));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::StackOverflow { at: 1, depth: 2, max: 1, .. })));
    }

    #[test]
    fn merge_points_must_agree() {
        // One branch pushes an extra value before the join at 3.
        let code = Code::new(vec![
            I::PushTrue,   // 0
            I::IfTrue(3),  // 1
            I::PushInt1,   // 2
            I::Nop,        // 3
            I::Leave,      // 4
        ])
        .with_stack(1);
        let errors = check(code);
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::InconsistentStack { at: 3, .. })));
    }

    #[test]
    fn falling_off_the_end() {
        let errors = check(Code::new(vec![I::Nop]));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::FallsOffEnd { at: 0, .. })));
        let errors = check(Code::new(vec![]));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::FallsOffEnd { at: 0, .. })));
    }

    #[test]
    fn reachable_placeholder_rejected() {
        let errors = check(Code::new(vec![I::Unreachable]));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::PlaceholderReachable { at: 0, .. })));
        // Dead placeholders are fine.
        assert!(check(Code::new(vec![I::Leave, I::Unreachable])).is_empty());
    }

    #[test]
    fn loops_settle() {
        let code = Code::new(vec![
            I::PushInt0,   // 0
            I::Store0,     // 1
            I::Inc(0),     // 2
            I::Load0,      // 3
            I::PushShort(10),
            I::IfLt(2),    // 5
            I::Leave,      // 6
        ])
        .with_locals(1)
        .with_stack(2);
        assert!(check(code).is_empty());
    }

    #[test]
    fn required_stack_reports_deepest_path() {
        let code = Code::new(vec![
            I::PushInt1,
            I::PushInt1,
            I::PushInt1,
            I::Add,
            I::Add,
            I::Return,
        ]);
        assert_eq!(required_stack(&code), 3);
        let calls = Code::new(vec![
            I::PushInt1,
            I::PushInt1,
            I::Call { function: 0, argc: 2 },
            I::Return,
        ]);
        assert_eq!(required_stack(&calls), 2);
    }
}
