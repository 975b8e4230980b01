//! Loader output: the flat function table plus module-level constants.

use crate::function::Function;
use crate::instruction::FunctionId;
use crate::value::Value;

/// A loaded, not yet linked, program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    /// Index-addressed function table; `Call` operands index into it.
    pub functions: Vec<Function>,
    /// Named module constants, read by `GetConst`.
    pub globals: Vec<(String, Value)>,
    /// Function started by `brisk run` when no entry is named.
    pub entry: Option<FunctionId>,
}

impl Module {
    pub fn new(functions: Vec<Function>) -> Self {
        Self {
            functions,
            ..Self::default()
        }
    }

    pub fn with_globals(mut self, globals: Vec<(String, Value)>) -> Self {
        self.globals = globals;
        self
    }

    pub fn with_entry(mut self, entry: FunctionId) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Index of the first function called `name`, or `module.name` when
    /// the name is qualified.
    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|f| f.name == name || f.qualified_name() == name)
            .and_then(|i| FunctionId::try_from(i).ok())
    }

    pub fn function(&self, id: FunctionId) -> Option<&Function> {
        self.functions.get(id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Code;

    #[test]
    fn find_by_plain_or_qualified_name() {
        let module = Module::new(vec![
            Function::bytecode("main", "app", Code::default()),
            Function::native("print", "core", 0, 8),
        ]);
        assert_eq!(module.find_function("main"), Some(0));
        assert_eq!(module.find_function("core.print"), Some(1));
        assert_eq!(module.find_function("missing"), None);
        assert_eq!(module.function(1).map(|f| f.name.as_str()), Some("print"));
    }
}
