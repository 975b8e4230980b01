//! Opcode catalogue.
//!
//! The opcode byte is the first byte of every encoded instruction. Operand
//! bytes follow it; their layout is given by [`Opcode::operand_len`].

use crate::error::DecodeError;

/// Fieldless discriminant of an [`Instruction`](crate::Instruction).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Constants
    /// No operation.
    Nop = 0x01,
    /// Push `null`.
    PushNull = 0x02,
    /// Push `true`.
    PushTrue = 0x03,
    /// Push `false`.
    PushFalse = 0x04,
    /// Push the integer -1.
    PushIntM1 = 0x05,
    /// Push the integer 0.
    PushInt0 = 0x06,
    /// Push the integer 1.
    PushInt1 = 0x07,
    /// Push a sign-extended 16-bit immediate.
    PushShort = 0x08,
    /// Push a constant-pool literal.
    Ldc = 0x09,
    /// Push a module constant named by a pool string.
    GetConst = 0x0A,

    // Arithmetic
    Add = 0x10,
    Sub = 0x11,
    Mul = 0x12,
    /// Integer result only when exact, otherwise float.
    Div = 0x13,
    Rem = 0x14,
    Neg = 0x15,
    Plus = 0x16,

    // Bitwise and logic
    BitAnd = 0x18,
    BitOr = 0x19,
    BitXor = 0x1A,
    Shl = 0x1B,
    /// Arithmetic shift right.
    Shr = 0x1C,
    BitNot = 0x1D,
    /// Logical not of truthiness.
    Not = 0x1E,

    // Comparison
    Eq = 0x20,
    Ne = 0x21,
    Lt = 0x22,
    Le = 0x23,
    Gt = 0x24,
    Ge = 0x25,

    // Locals
    Load0 = 0x30,
    Load1 = 0x31,
    Load2 = 0x32,
    Load = 0x33,
    Store0 = 0x34,
    Store1 = 0x35,
    Store2 = 0x36,
    Store = 0x37,
    Inc = 0x38,
    Dec = 0x39,
    /// Increment without the initialization check.
    IncQuick = 0x3A,
    /// Decrement without the initialization check.
    DecQuick = 0x3B,

    // Stack shuffling
    Pop = 0x40,
    Pop2 = 0x41,
    Dup = 0x42,
    DupX1 = 0x43,
    DupX2 = 0x44,
    Dup2 = 0x45,
    Dup2X1 = 0x46,
    Dup2X2 = 0x47,
    Swap = 0x48,

    // Containers
    NewList = 0x50,
    /// Operand counts key/value pairs.
    NewMap = 0x51,
    /// Strict: missing keys and bad indices fail.
    LoadIndex = 0x52,
    /// Lenient: missing keys and bad indices yield null.
    LoadIndexOrNull = 0x53,
    StoreIndex = 0x54,
    IncIndex = 0x55,
    DecIndex = 0x56,
    Contains = 0x57,
    Len = 0x58,
    Append = 0x59,
    /// Deep copy.
    Clone = 0x5A,

    // Control transfer
    Goto = 0x60,
    IfTrue = 0x61,
    IfFalse = 0x62,
    IfNull = 0x63,
    IfNonNull = 0x64,
    IfEq = 0x65,
    IfNe = 0x66,
    IfLt = 0x67,
    IfGe = 0x68,
    IfGt = 0x69,
    IfLe = 0x6A,
    IfIn = 0x6B,
    IfNotIn = 0x6C,
    /// First matching key wins.
    LinearSwitch = 0x6D,
    /// Binary search over keys sorted at link time.
    BinarySwitch = 0x6E,

    // Calls
    Call = 0x70,
    /// Call and discard the result.
    CallAndPop = 0x71,
    Return = 0x72,
    /// Return `null` (end-of-function fallthrough).
    Leave = 0x73,

    // Thread control
    /// Placeholder that must never execute.
    Unreachable = 0xFD,
    /// Stop the whole thread.
    Halt = 0xFE,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 83] = [
    Opcode::Nop,
    Opcode::PushNull,
    Opcode::PushTrue,
    Opcode::PushFalse,
    Opcode::PushIntM1,
    Opcode::PushInt0,
    Opcode::PushInt1,
    Opcode::PushShort,
    Opcode::Ldc,
    Opcode::GetConst,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Rem,
    Opcode::Neg,
    Opcode::Plus,
    Opcode::BitAnd,
    Opcode::BitOr,
    Opcode::BitXor,
    Opcode::Shl,
    Opcode::Shr,
    Opcode::BitNot,
    Opcode::Not,
    Opcode::Eq,
    Opcode::Ne,
    Opcode::Lt,
    Opcode::Le,
    Opcode::Gt,
    Opcode::Ge,
    Opcode::Load0,
    Opcode::Load1,
    Opcode::Load2,
    Opcode::Load,
    Opcode::Store0,
    Opcode::Store1,
    Opcode::Store2,
    Opcode::Store,
    Opcode::Inc,
    Opcode::Dec,
    Opcode::IncQuick,
    Opcode::DecQuick,
    Opcode::Pop,
    Opcode::Pop2,
    Opcode::Dup,
    Opcode::DupX1,
    Opcode::DupX2,
    Opcode::Dup2,
    Opcode::Dup2X1,
    Opcode::Dup2X2,
    Opcode::Swap,
    Opcode::NewList,
    Opcode::NewMap,
    Opcode::LoadIndex,
    Opcode::LoadIndexOrNull,
    Opcode::StoreIndex,
    Opcode::IncIndex,
    Opcode::DecIndex,
    Opcode::Contains,
    Opcode::Len,
    Opcode::Append,
    Opcode::Clone,
    Opcode::Goto,
    Opcode::IfTrue,
    Opcode::IfFalse,
    Opcode::IfNull,
    Opcode::IfNonNull,
    Opcode::IfEq,
    Opcode::IfNe,
    Opcode::IfLt,
    Opcode::IfGe,
    Opcode::IfGt,
    Opcode::IfLe,
    Opcode::IfIn,
    Opcode::IfNotIn,
    Opcode::LinearSwitch,
    Opcode::BinarySwitch,
    Opcode::Call,
    Opcode::CallAndPop,
    Opcode::Return,
    Opcode::Leave,
    Opcode::Unreachable,
    Opcode::Halt,
];

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Err(DecodeError::IllegalOpcode),

            // Constants
            0x01 => Ok(Opcode::Nop),
            0x02 => Ok(Opcode::PushNull),
            0x03 => Ok(Opcode::PushTrue),
            0x04 => Ok(Opcode::PushFalse),
            0x05 => Ok(Opcode::PushIntM1),
            0x06 => Ok(Opcode::PushInt0),
            0x07 => Ok(Opcode::PushInt1),
            0x08 => Ok(Opcode::PushShort),
            0x09 => Ok(Opcode::Ldc),
            0x0A => Ok(Opcode::GetConst),

            // Arithmetic
            0x10 => Ok(Opcode::Add),
            0x11 => Ok(Opcode::Sub),
            0x12 => Ok(Opcode::Mul),
            0x13 => Ok(Opcode::Div),
            0x14 => Ok(Opcode::Rem),
            0x15 => Ok(Opcode::Neg),
            0x16 => Ok(Opcode::Plus),

            // Bitwise and logic
            0x18 => Ok(Opcode::BitAnd),
            0x19 => Ok(Opcode::BitOr),
            0x1A => Ok(Opcode::BitXor),
            0x1B => Ok(Opcode::Shl),
            0x1C => Ok(Opcode::Shr),
            0x1D => Ok(Opcode::BitNot),
            0x1E => Ok(Opcode::Not),

            // Comparison
            0x20 => Ok(Opcode::Eq),
            0x21 => Ok(Opcode::Ne),
            0x22 => Ok(Opcode::Lt),
            0x23 => Ok(Opcode::Le),
            0x24 => Ok(Opcode::Gt),
            0x25 => Ok(Opcode::Ge),

            // Locals
            0x30 => Ok(Opcode::Load0),
            0x31 => Ok(Opcode::Load1),
            0x32 => Ok(Opcode::Load2),
            0x33 => Ok(Opcode::Load),
            0x34 => Ok(Opcode::Store0),
            0x35 => Ok(Opcode::Store1),
            0x36 => Ok(Opcode::Store2),
            0x37 => Ok(Opcode::Store),
            0x38 => Ok(Opcode::Inc),
            0x39 => Ok(Opcode::Dec),
            0x3A => Ok(Opcode::IncQuick),
            0x3B => Ok(Opcode::DecQuick),

            // Stack shuffling
            0x40 => Ok(Opcode::Pop),
            0x41 => Ok(Opcode::Pop2),
            0x42 => Ok(Opcode::Dup),
            0x43 => Ok(Opcode::DupX1),
            0x44 => Ok(Opcode::DupX2),
            0x45 => Ok(Opcode::Dup2),
            0x46 => Ok(Opcode::Dup2X1),
            0x47 => Ok(Opcode::Dup2X2),
            0x48 => Ok(Opcode::Swap),

            // Containers
            0x50 => Ok(Opcode::NewList),
            0x51 => Ok(Opcode::NewMap),
            0x52 => Ok(Opcode::LoadIndex),
            0x53 => Ok(Opcode::LoadIndexOrNull),
            0x54 => Ok(Opcode::StoreIndex),
            0x55 => Ok(Opcode::IncIndex),
            0x56 => Ok(Opcode::DecIndex),
            0x57 => Ok(Opcode::Contains),
            0x58 => Ok(Opcode::Len),
            0x59 => Ok(Opcode::Append),
            0x5A => Ok(Opcode::Clone),

            // Control transfer
            0x60 => Ok(Opcode::Goto),
            0x61 => Ok(Opcode::IfTrue),
            0x62 => Ok(Opcode::IfFalse),
            0x63 => Ok(Opcode::IfNull),
            0x64 => Ok(Opcode::IfNonNull),
            0x65 => Ok(Opcode::IfEq),
            0x66 => Ok(Opcode::IfNe),
            0x67 => Ok(Opcode::IfLt),
            0x68 => Ok(Opcode::IfGe),
            0x69 => Ok(Opcode::IfGt),
            0x6A => Ok(Opcode::IfLe),
            0x6B => Ok(Opcode::IfIn),
            0x6C => Ok(Opcode::IfNotIn),
            0x6D => Ok(Opcode::LinearSwitch),
            0x6E => Ok(Opcode::BinarySwitch),

            // Calls
            0x70 => Ok(Opcode::Call),
            0x71 => Ok(Opcode::CallAndPop),
            0x72 => Ok(Opcode::Return),
            0x73 => Ok(Opcode::Leave),

            // Thread control
            0xFD => Ok(Opcode::Unreachable),
            0xFE => Ok(Opcode::Halt),

            _ => Err(DecodeError::ReservedOpcode(value)),
        }
    }
}

impl Opcode {
    /// Assembly-style mnemonic, used in diagnostics.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::PushNull => "PUSH_NULL",
            Opcode::PushTrue => "PUSH_TRUE",
            Opcode::PushFalse => "PUSH_FALSE",
            Opcode::PushIntM1 => "PUSH_M1",
            Opcode::PushInt0 => "PUSH_0",
            Opcode::PushInt1 => "PUSH_1",
            Opcode::PushShort => "PUSH_SHORT",
            Opcode::Ldc => "LDC",
            Opcode::GetConst => "GET_CONST",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Rem => "REM",
            Opcode::Neg => "NEG",
            Opcode::Plus => "PLUS",
            Opcode::BitAnd => "AND",
            Opcode::BitOr => "OR",
            Opcode::BitXor => "XOR",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::BitNot => "BIT_NOT",
            Opcode::Not => "NOT",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Gt => "GT",
            Opcode::Ge => "GE",
            Opcode::Load0 => "LOAD_0",
            Opcode::Load1 => "LOAD_1",
            Opcode::Load2 => "LOAD_2",
            Opcode::Load => "LOAD",
            Opcode::Store0 => "STORE_0",
            Opcode::Store1 => "STORE_1",
            Opcode::Store2 => "STORE_2",
            Opcode::Store => "STORE",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::IncQuick => "INC_QUICK",
            Opcode::DecQuick => "DEC_QUICK",
            Opcode::Pop => "POP",
            Opcode::Pop2 => "POP2",
            Opcode::Dup => "DUP",
            Opcode::DupX1 => "DUP_X1",
            Opcode::DupX2 => "DUP_X2",
            Opcode::Dup2 => "DUP2",
            Opcode::Dup2X1 => "DUP2_X1",
            Opcode::Dup2X2 => "DUP2_X2",
            Opcode::Swap => "SWAP",
            Opcode::NewList => "NEW_LIST",
            Opcode::NewMap => "NEW_MAP",
            Opcode::LoadIndex => "LOAD_INDEX",
            Opcode::LoadIndexOrNull => "LOAD_INDEX_OR_NULL",
            Opcode::StoreIndex => "STORE_INDEX",
            Opcode::IncIndex => "INC_INDEX",
            Opcode::DecIndex => "DEC_INDEX",
            Opcode::Contains => "CONTAINS",
            Opcode::Len => "LEN",
            Opcode::Append => "APPEND",
            Opcode::Clone => "CLONE",
            Opcode::Goto => "GOTO",
            Opcode::IfTrue => "IF_TRUE",
            Opcode::IfFalse => "IF_FALSE",
            Opcode::IfNull => "IF_NULL",
            Opcode::IfNonNull => "IF_NONNULL",
            Opcode::IfEq => "IF_EQ",
            Opcode::IfNe => "IF_NE",
            Opcode::IfLt => "IF_LT",
            Opcode::IfGe => "IF_GE",
            Opcode::IfGt => "IF_GT",
            Opcode::IfLe => "IF_LE",
            Opcode::IfIn => "IF_IN",
            Opcode::IfNotIn => "IF_NOT_IN",
            Opcode::LinearSwitch => "LINEAR_SWITCH",
            Opcode::BinarySwitch => "BINARY_SWITCH",
            Opcode::Call => "CALL",
            Opcode::CallAndPop => "CALL_POP",
            Opcode::Return => "RETURN",
            Opcode::Leave => "LEAVE",
            Opcode::Unreachable => "UNREACHABLE",
            Opcode::Halt => "HALT",
        }
    }

    /// Number of operand bytes following the opcode byte.
    pub fn operand_len(&self) -> usize {
        match self {
            Opcode::PushShort
            | Opcode::Ldc
            | Opcode::GetConst
            | Opcode::Load
            | Opcode::Store
            | Opcode::Inc
            | Opcode::Dec
            | Opcode::IncQuick
            | Opcode::DecQuick
            | Opcode::NewList
            | Opcode::NewMap
            | Opcode::LinearSwitch
            | Opcode::BinarySwitch => 2,
            Opcode::Call | Opcode::CallAndPop => 3,
            Opcode::Goto
            | Opcode::IfTrue
            | Opcode::IfFalse
            | Opcode::IfNull
            | Opcode::IfNonNull
            | Opcode::IfEq
            | Opcode::IfNe
            | Opcode::IfLt
            | Opcode::IfGe
            | Opcode::IfGt
            | Opcode::IfLe
            | Opcode::IfIn
            | Opcode::IfNotIn => 4,
            _ => 0,
        }
    }
}
