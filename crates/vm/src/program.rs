//! Linked, immutable program shared by every thread that runs it.

use crate::native::{NativeFn, NativeRegistry};
use crate::switch;
use brisk_common::{Function, FunctionId, FunctionKind, Instruction, Module, Value};
use std::collections::HashMap;
use tracing::warn;

/// A module with natives bound and binary switch tables sorted.
pub struct Program {
    functions: Vec<Function>,
    /// Parallel to `functions`; `Some` only for bound natives.
    natives: Vec<Option<NativeFn>>,
    globals: HashMap<String, Value>,
    names: HashMap<String, FunctionId>,
    entry: Option<FunctionId>,
}

impl Program {
    /// Resolve natives by qualified name and prepare switch tables.
    ///
    /// An unbound native stays declared; calling it crashes with
    /// `UndefinedFunction`.
    pub fn link(module: Module, registry: &NativeRegistry) -> Program {
        let Module {
            mut functions,
            globals,
            entry,
        } = module;

        let mut natives = Vec::with_capacity(functions.len());
        let mut names = HashMap::new();
        for (index, function) in functions.iter_mut().enumerate() {
            let id = index as FunctionId;
            let qualified = function.qualified_name();
            names.entry(qualified.clone()).or_insert(id);
            names.entry(function.name.clone()).or_insert(id);

            match &mut function.kind {
                FunctionKind::Native => {
                    let bound = registry.get(&qualified);
                    if bound.is_none() {
                        warn!(function = %qualified, "unresolved native");
                    }
                    natives.push(bound);
                }
                FunctionKind::Bytecode(code) => {
                    let sorted: Vec<usize> = code
                        .instructions
                        .iter()
                        .filter_map(|insn| match insn {
                            Instruction::BinarySwitch(table) => Some(*table as usize),
                            _ => None,
                        })
                        .collect();
                    for table in sorted {
                        if let Some(table) = code.switch_tables.get_mut(table) {
                            switch::sort_table(table, &code.constants);
                        }
                    }
                    natives.push(None);
                }
            }
        }

        Program {
            functions,
            natives,
            globals: globals.into_iter().collect(),
            names,
            entry,
        }
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id as usize)
    }

    pub(crate) fn native(&self, id: FunctionId) -> Option<&NativeFn> {
        self.natives.get(id as usize).and_then(Option::as_ref)
    }

    /// Look up a function by plain or qualified name.
    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        self.names.get(name).copied()
    }

    /// Module-level constant.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn entry(&self) -> Option<FunctionId> {
        self.entry
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// True if the native at `id` has a host binding.
    pub fn is_bound(&self, id: FunctionId) -> bool {
        self.native(id).is_some()
    }
}
