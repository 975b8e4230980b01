//! Structural validation pass for brisk modules.
//!
//! Checks function descriptors, module constants, and every instruction
//! operand: local slots, pool indices, callees, jump targets and switch
//! tables must all resolve.

use crate::error::VerifyError;
use brisk_common::{Code, Function, Instruction, Module, Value};

/// Run the structural validation pass.
pub fn check_structural(module: &Module) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    if let Some(entry) = module.entry {
        if entry as usize >= module.functions.len() {
            errors.push(VerifyError::InvalidEntry { entry });
        }
    }

    for (name, value) in &module.globals {
        if value.is_undefined() {
            errors.push(VerifyError::UndefinedGlobal { name: name.clone() });
        }
    }

    for function in &module.functions {
        check_descriptor(function, &mut errors);
        if let Some(code) = function.code() {
            check_code(function, code, module.functions.len(), &mut errors);
        }
    }

    errors
}

fn check_descriptor(function: &Function, errors: &mut Vec<VerifyError>) {
    let name = function.qualified_name();
    if function.min_argc > function.max_argc {
        errors.push(VerifyError::InvalidArity {
            function: name,
            min: function.min_argc,
            max: function.max_argc,
        });
        return;
    }

    let optional = (function.max_argc - function.min_argc) as usize;
    if function.defaults.len() != optional {
        errors.push(VerifyError::DefaultCountMismatch {
            function: name.clone(),
            expected: optional,
            found: function.defaults.len(),
        });
    }
    if function.params.len() != function.max_argc as usize {
        errors.push(VerifyError::ParamCountMismatch {
            function: name.clone(),
            expected: function.max_argc as usize,
            found: function.params.len(),
        });
    }
    for (index, default) in function.defaults.iter().enumerate() {
        if default.is_undefined() {
            errors.push(VerifyError::UndefinedDefault {
                function: name.clone(),
                index,
            });
        }
    }
    if let Some(code) = function.code() {
        if code.max_locals < u16::from(function.max_argc) {
            errors.push(VerifyError::TooFewLocals {
                function: name,
                locals: code.max_locals,
                params: function.max_argc,
            });
        }
    }
}

fn check_code(
    function: &Function,
    code: &Code,
    function_count: usize,
    errors: &mut Vec<VerifyError>,
) {
    let name = function.qualified_name();
    let len = code.instructions.len();

    for (index, constant) in code.constants.iter().enumerate() {
        if constant.is_undefined() {
            errors.push(VerifyError::UndefinedConstant {
                function: name.clone(),
                index,
            });
        }
    }

    for (at, insn) in code.instructions.iter().enumerate() {
        if let Some(slot) = local_slot(insn) {
            if slot >= code.max_locals {
                errors.push(VerifyError::LocalOutOfRange {
                    function: name.clone(),
                    at,
                    slot,
                });
            }
        }

        match *insn {
            Instruction::Ldc(index) => {
                if index as usize >= code.constants.len() {
                    errors.push(VerifyError::ConstantOutOfRange {
                        function: name.clone(),
                        at,
                        index,
                    });
                }
            }
            Instruction::GetConst(index) => match code.constants.get(index as usize) {
                None => errors.push(VerifyError::ConstantOutOfRange {
                    function: name.clone(),
                    at,
                    index,
                }),
                Some(Value::Str(_)) => {}
                Some(_) => errors.push(VerifyError::ConstNameNotString {
                    function: name.clone(),
                    at,
                    index,
                }),
            },
            Instruction::Call { function: callee, .. }
            | Instruction::CallAndPop { function: callee, .. } => {
                if callee as usize >= function_count {
                    errors.push(VerifyError::FunctionOutOfRange {
                        function: name.clone(),
                        at,
                        callee,
                    });
                }
            }
            Instruction::LinearSwitch(table) | Instruction::BinarySwitch(table) => {
                if table as usize >= code.switch_tables.len() {
                    errors.push(VerifyError::SwitchTableOutOfRange {
                        function: name.clone(),
                        at,
                        table,
                    });
                }
            }
            _ => {}
        }

        if let Some(target) = insn.jump_target() {
            if target as usize >= len {
                errors.push(VerifyError::JumpOutOfRange {
                    function: name.clone(),
                    at,
                    target,
                });
            }
        }
    }

    check_switch_tables(&name, code, errors);
}

fn local_slot(insn: &Instruction) -> Option<u16> {
    match *insn {
        Instruction::Load0 | Instruction::Store0 => Some(0),
        Instruction::Load1 | Instruction::Store1 => Some(1),
        Instruction::Load2 | Instruction::Store2 => Some(2),
        Instruction::Load(slot)
        | Instruction::Store(slot)
        | Instruction::Inc(slot)
        | Instruction::Dec(slot)
        | Instruction::IncQuick(slot)
        | Instruction::DecQuick(slot) => Some(slot),
        _ => None,
    }
}

fn check_switch_tables(name: &str, code: &Code, errors: &mut Vec<VerifyError>) {
    let len = code.instructions.len();
    let binary: Vec<usize> = code
        .instructions
        .iter()
        .filter_map(|insn| match insn {
            Instruction::BinarySwitch(table) => Some(*table as usize),
            _ => None,
        })
        .collect();

    for (index, table) in code.switch_tables.iter().enumerate() {
        if table.keys.len() != table.targets.len() {
            errors.push(VerifyError::SwitchTableMismatch {
                function: name.to_string(),
                table: index,
                keys: table.keys.len(),
                targets: table.targets.len(),
            });
        }

        for &target in table.targets.iter().chain(std::iter::once(&table.default)) {
            if target as usize >= len {
                errors.push(VerifyError::JumpOutOfRange {
                    function: name.to_string(),
                    at: index,
                    target,
                });
            }
        }

        let mut keys = Vec::with_capacity(table.keys.len());
        for &key in &table.keys {
            match code.constants.get(key as usize) {
                Some(value) if value.is_scalar() => keys.push(value),
                _ => errors.push(VerifyError::InvalidSwitchKey {
                    function: name.to_string(),
                    table: index,
                    key,
                }),
            }
        }

        // Keys fall into one comparable class at most, so comparing each
        // against the first covers every pair.
        if binary.contains(&index) && keys.len() == table.keys.len() {
            if let Some(first) = keys.first() {
                let ordered = keys
                    .iter()
                    .all(|key| matches!(first.weak_compare(key), Ok(Some(_))));
                if !ordered {
                    errors.push(VerifyError::UnorderedSwitchKeys {
                        function: name.to_string(),
                        table: index,
                    });
                }
            }
        }
    }
}
