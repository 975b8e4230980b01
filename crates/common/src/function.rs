//! Function descriptors and compiled code.

use crate::instruction::Instruction;
use crate::value::Value;

/// Maps a run of code indices to a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEntry {
    /// First code index the line applies to.
    pub start_cp: u32,
    pub line: u32,
}

/// Multi-way branch table.
///
/// `keys[i]` is a constant-pool index whose value selects `targets[i]`.
/// A selector matching no key jumps to `default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTable {
    pub keys: Vec<u16>,
    pub targets: Vec<u32>,
    pub default: u32,
}

impl SwitchTable {
    pub fn new(cases: impl IntoIterator<Item = (u16, u32)>, default: u32) -> Self {
        let (keys, targets) = cases.into_iter().unzip();
        Self {
            keys,
            targets,
            default,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Compiled body of a user function.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    pub instructions: Vec<Instruction>,
    /// Literal pool referenced by `Ldc`, `GetConst` and switch keys.
    pub constants: Vec<Value>,
    pub switch_tables: Vec<SwitchTable>,
    /// Local slots, parameters first.
    pub max_locals: u16,
    /// Operand-stack cells the frame reserves above its locals.
    pub max_stack: u16,
    /// Run-length line table, sorted by `start_cp`.
    pub lines: Vec<LineEntry>,
}

impl Code {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            ..Self::default()
        }
    }

    pub fn with_constants(mut self, constants: Vec<Value>) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_switch_tables(mut self, tables: Vec<SwitchTable>) -> Self {
        self.switch_tables = tables;
        self
    }

    pub fn with_locals(mut self, max_locals: u16) -> Self {
        self.max_locals = max_locals;
        self
    }

    pub fn with_stack(mut self, max_stack: u16) -> Self {
        self.max_stack = max_stack;
        self
    }

    pub fn with_lines(mut self, lines: Vec<LineEntry>) -> Self {
        self.lines = lines;
        self
    }

    /// Source line of the instruction at `cp`, if the table covers it.
    pub fn line_at(&self, cp: usize) -> Option<u32> {
        let idx = self
            .lines
            .partition_point(|entry| entry.start_cp as usize <= cp);
        idx.checked_sub(1).map(|i| self.lines[i].line)
    }

    /// Slots a frame of this function occupies: locals plus operand stack.
    pub fn frame_size(&self) -> usize {
        self.max_locals as usize + self.max_stack as usize
    }
}

/// Native declaration or compiled body.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionKind {
    /// Host-implemented; bound by qualified name when the program is linked.
    Native,
    Bytecode(Code),
}

/// Immutable function descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// Declaring module.
    pub module: String,
    pub min_argc: u8,
    pub max_argc: u8,
    pub params: Vec<String>,
    /// Values for optional parameters `min_argc..max_argc`.
    pub defaults: Vec<Value>,
    pub kind: FunctionKind,
}

impl Function {
    /// A user function with no parameters.
    pub fn bytecode(name: impl Into<String>, module: impl Into<String>, code: Code) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            min_argc: 0,
            max_argc: 0,
            params: Vec::new(),
            defaults: Vec::new(),
            kind: FunctionKind::Bytecode(code),
        }
    }

    /// A native declaration taking `min_argc..=max_argc` arguments.
    pub fn native(
        name: impl Into<String>,
        module: impl Into<String>,
        min_argc: u8,
        max_argc: u8,
    ) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            min_argc,
            max_argc,
            params: (0..max_argc).map(|i| format!("arg{i}")).collect(),
            defaults: vec![Value::Null; (max_argc.saturating_sub(min_argc)) as usize],
            kind: FunctionKind::Native,
        }
    }

    /// Declare named parameters; the trailing `defaults.len()` are optional.
    pub fn with_params(mut self, params: &[&str], defaults: Vec<Value>) -> Self {
        self.max_argc = params.len() as u8;
        self.min_argc = (params.len() - defaults.len().min(params.len())) as u8;
        self.params = params.iter().map(|p| p.to_string()).collect();
        self.defaults = defaults;
        self
    }

    /// `module.name`, the key natives are registered under.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    pub fn is_native(&self) -> bool {
        matches!(self.kind, FunctionKind::Native)
    }

    pub fn code(&self) -> Option<&Code> {
        match &self.kind {
            FunctionKind::Bytecode(code) => Some(code),
            FunctionKind::Native => None,
        }
    }

    pub fn accepts(&self, argc: usize) -> bool {
        (self.min_argc as usize..=self.max_argc as usize).contains(&argc)
    }
}
