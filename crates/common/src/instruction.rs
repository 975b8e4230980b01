//! Decoded instructions and their static stack effects.
//!
//! Encoding is variable length, little-endian: the opcode byte followed by
//! its immediate operands.
//!
//! ```text
//! PushShort                 i16
//! Ldc .. BinarySwitch       u16   (pool index, slot, count or table)
//! Call, CallAndPop          u16 function index, u8 argc
//! Goto, If*                 u32   absolute code index
//! ```

use crate::error::DecodeError;
use crate::opcode::Opcode;
use std::fmt;

/// Index into a module's flat function table.
pub type FunctionId = u16;

/// One instruction with its immediate operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // Constants
    Nop,
    PushNull,
    PushTrue,
    PushFalse,
    PushIntM1,
    PushInt0,
    PushInt1,
    PushShort(i16),
    Ldc(u16),
    GetConst(u16),

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Plus,

    // Bitwise and logic
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    BitNot,
    Not,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Locals
    Load0,
    Load1,
    Load2,
    Load(u16),
    Store0,
    Store1,
    Store2,
    Store(u16),
    Inc(u16),
    Dec(u16),
    IncQuick(u16),
    DecQuick(u16),

    // Stack shuffling
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,

    // Containers
    NewList(u16),
    NewMap(u16),
    LoadIndex,
    LoadIndexOrNull,
    StoreIndex,
    IncIndex,
    DecIndex,
    Contains,
    Len,
    Append,
    Clone,

    // Control transfer
    Goto(u32),
    IfTrue(u32),
    IfFalse(u32),
    IfNull(u32),
    IfNonNull(u32),
    IfEq(u32),
    IfNe(u32),
    IfLt(u32),
    IfGe(u32),
    IfGt(u32),
    IfLe(u32),
    IfIn(u32),
    IfNotIn(u32),
    LinearSwitch(u16),
    BinarySwitch(u16),

    // Calls
    Call { function: FunctionId, argc: u8 },
    CallAndPop { function: FunctionId, argc: u8 },
    Return,
    Leave,

    // Thread control
    Unreachable,
    Halt,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::PushNull => Opcode::PushNull,
            Instruction::PushTrue => Opcode::PushTrue,
            Instruction::PushFalse => Opcode::PushFalse,
            Instruction::PushIntM1 => Opcode::PushIntM1,
            Instruction::PushInt0 => Opcode::PushInt0,
            Instruction::PushInt1 => Opcode::PushInt1,
            Instruction::PushShort(_) => Opcode::PushShort,
            Instruction::Ldc(_) => Opcode::Ldc,
            Instruction::GetConst(_) => Opcode::GetConst,
            Instruction::Add => Opcode::Add,
            Instruction::Sub => Opcode::Sub,
            Instruction::Mul => Opcode::Mul,
            Instruction::Div => Opcode::Div,
            Instruction::Rem => Opcode::Rem,
            Instruction::Neg => Opcode::Neg,
            Instruction::Plus => Opcode::Plus,
            Instruction::BitAnd => Opcode::BitAnd,
            Instruction::BitOr => Opcode::BitOr,
            Instruction::BitXor => Opcode::BitXor,
            Instruction::Shl => Opcode::Shl,
            Instruction::Shr => Opcode::Shr,
            Instruction::BitNot => Opcode::BitNot,
            Instruction::Not => Opcode::Not,
            Instruction::Eq => Opcode::Eq,
            Instruction::Ne => Opcode::Ne,
            Instruction::Lt => Opcode::Lt,
            Instruction::Le => Opcode::Le,
            Instruction::Gt => Opcode::Gt,
            Instruction::Ge => Opcode::Ge,
            Instruction::Load0 => Opcode::Load0,
            Instruction::Load1 => Opcode::Load1,
            Instruction::Load2 => Opcode::Load2,
            Instruction::Load(_) => Opcode::Load,
            Instruction::Store0 => Opcode::Store0,
            Instruction::Store1 => Opcode::Store1,
            Instruction::Store2 => Opcode::Store2,
            Instruction::Store(_) => Opcode::Store,
            Instruction::Inc(_) => Opcode::Inc,
            Instruction::Dec(_) => Opcode::Dec,
            Instruction::IncQuick(_) => Opcode::IncQuick,
            Instruction::DecQuick(_) => Opcode::DecQuick,
            Instruction::Pop => Opcode::Pop,
            Instruction::Pop2 => Opcode::Pop2,
            Instruction::Dup => Opcode::Dup,
            Instruction::DupX1 => Opcode::DupX1,
            Instruction::DupX2 => Opcode::DupX2,
            Instruction::Dup2 => Opcode::Dup2,
            Instruction::Dup2X1 => Opcode::Dup2X1,
            Instruction::Dup2X2 => Opcode::Dup2X2,
            Instruction::Swap => Opcode::Swap,
            Instruction::NewList(_) => Opcode::NewList,
            Instruction::NewMap(_) => Opcode::NewMap,
            Instruction::LoadIndex => Opcode::LoadIndex,
            Instruction::LoadIndexOrNull => Opcode::LoadIndexOrNull,
            Instruction::StoreIndex => Opcode::StoreIndex,
            Instruction::IncIndex => Opcode::IncIndex,
            Instruction::DecIndex => Opcode::DecIndex,
            Instruction::Contains => Opcode::Contains,
            Instruction::Len => Opcode::Len,
            Instruction::Append => Opcode::Append,
            Instruction::Clone => Opcode::Clone,
            Instruction::Goto(_) => Opcode::Goto,
            Instruction::IfTrue(_) => Opcode::IfTrue,
            Instruction::IfFalse(_) => Opcode::IfFalse,
            Instruction::IfNull(_) => Opcode::IfNull,
            Instruction::IfNonNull(_) => Opcode::IfNonNull,
            Instruction::IfEq(_) => Opcode::IfEq,
            Instruction::IfNe(_) => Opcode::IfNe,
            Instruction::IfLt(_) => Opcode::IfLt,
            Instruction::IfGe(_) => Opcode::IfGe,
            Instruction::IfGt(_) => Opcode::IfGt,
            Instruction::IfLe(_) => Opcode::IfLe,
            Instruction::IfIn(_) => Opcode::IfIn,
            Instruction::IfNotIn(_) => Opcode::IfNotIn,
            Instruction::LinearSwitch(_) => Opcode::LinearSwitch,
            Instruction::BinarySwitch(_) => Opcode::BinarySwitch,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::CallAndPop { .. } => Opcode::CallAndPop,
            Instruction::Return => Opcode::Return,
            Instruction::Leave => Opcode::Leave,
            Instruction::Unreachable => Opcode::Unreachable,
            Instruction::Halt => Opcode::Halt,
        }
    }

    /// Append the encoded form to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.opcode() as u8);
        match *self {
            Instruction::PushShort(v) => out.extend_from_slice(&v.to_le_bytes()),
            Instruction::Ldc(v)
            | Instruction::GetConst(v)
            | Instruction::Load(v)
            | Instruction::Store(v)
            | Instruction::Inc(v)
            | Instruction::Dec(v)
            | Instruction::IncQuick(v)
            | Instruction::DecQuick(v)
            | Instruction::NewList(v)
            | Instruction::NewMap(v)
            | Instruction::LinearSwitch(v)
            | Instruction::BinarySwitch(v) => out.extend_from_slice(&v.to_le_bytes()),
            Instruction::Call { function, argc } | Instruction::CallAndPop { function, argc } => {
                out.extend_from_slice(&function.to_le_bytes());
                out.push(argc);
            }
            _ => {
                if let Some(target) = self.jump_target() {
                    out.extend_from_slice(&target.to_le_bytes());
                }
            }
        }
    }

    /// Decode one instruction starting at `offset`.
    ///
    /// Returns the instruction and the offset just past it.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<(Instruction, usize), DecodeError> {
        let byte = *bytes
            .get(offset)
            .ok_or(DecodeError::UnexpectedEof { offset })?;
        let opcode = Opcode::try_from(byte)?;
        let start = offset + 1;
        let end = start + opcode.operand_len();
        let operands = bytes
            .get(start..end)
            .ok_or(DecodeError::UnexpectedEof { offset: bytes.len() })?;

        let u16_at = |i: usize| u16::from_le_bytes([operands[i], operands[i + 1]]);
        let u32_at = || u32::from_le_bytes([operands[0], operands[1], operands[2], operands[3]]);

        let instruction = match opcode {
            Opcode::Nop => Instruction::Nop,
            Opcode::PushNull => Instruction::PushNull,
            Opcode::PushTrue => Instruction::PushTrue,
            Opcode::PushFalse => Instruction::PushFalse,
            Opcode::PushIntM1 => Instruction::PushIntM1,
            Opcode::PushInt0 => Instruction::PushInt0,
            Opcode::PushInt1 => Instruction::PushInt1,
            Opcode::PushShort => Instruction::PushShort(u16_at(0) as i16),
            Opcode::Ldc => Instruction::Ldc(u16_at(0)),
            Opcode::GetConst => Instruction::GetConst(u16_at(0)),
            Opcode::Add => Instruction::Add,
            Opcode::Sub => Instruction::Sub,
            Opcode::Mul => Instruction::Mul,
            Opcode::Div => Instruction::Div,
            Opcode::Rem => Instruction::Rem,
            Opcode::Neg => Instruction::Neg,
            Opcode::Plus => Instruction::Plus,
            Opcode::BitAnd => Instruction::BitAnd,
            Opcode::BitOr => Instruction::BitOr,
            Opcode::BitXor => Instruction::BitXor,
            Opcode::Shl => Instruction::Shl,
            Opcode::Shr => Instruction::Shr,
            Opcode::BitNot => Instruction::BitNot,
            Opcode::Not => Instruction::Not,
            Opcode::Eq => Instruction::Eq,
            Opcode::Ne => Instruction::Ne,
            Opcode::Lt => Instruction::Lt,
            Opcode::Le => Instruction::Le,
            Opcode::Gt => Instruction::Gt,
            Opcode::Ge => Instruction::Ge,
            Opcode::Load0 => Instruction::Load0,
            Opcode::Load1 => Instruction::Load1,
            Opcode::Load2 => Instruction::Load2,
            Opcode::Load => Instruction::Load(u16_at(0)),
            Opcode::Store0 => Instruction::Store0,
            Opcode::Store1 => Instruction::Store1,
            Opcode::Store2 => Instruction::Store2,
            Opcode::Store => Instruction::Store(u16_at(0)),
            Opcode::Inc => Instruction::Inc(u16_at(0)),
            Opcode::Dec => Instruction::Dec(u16_at(0)),
            Opcode::IncQuick => Instruction::IncQuick(u16_at(0)),
            Opcode::DecQuick => Instruction::DecQuick(u16_at(0)),
            Opcode::Pop => Instruction::Pop,
            Opcode::Pop2 => Instruction::Pop2,
            Opcode::Dup => Instruction::Dup,
            Opcode::DupX1 => Instruction::DupX1,
            Opcode::DupX2 => Instruction::DupX2,
            Opcode::Dup2 => Instruction::Dup2,
            Opcode::Dup2X1 => Instruction::Dup2X1,
            Opcode::Dup2X2 => Instruction::Dup2X2,
            Opcode::Swap => Instruction::Swap,
            Opcode::NewList => Instruction::NewList(u16_at(0)),
            Opcode::NewMap => Instruction::NewMap(u16_at(0)),
            Opcode::LoadIndex => Instruction::LoadIndex,
            Opcode::LoadIndexOrNull => Instruction::LoadIndexOrNull,
            Opcode::StoreIndex => Instruction::StoreIndex,
            Opcode::IncIndex => Instruction::IncIndex,
            Opcode::DecIndex => Instruction::DecIndex,
            Opcode::Contains => Instruction::Contains,
            Opcode::Len => Instruction::Len,
            Opcode::Append => Instruction::Append,
            Opcode::Clone => Instruction::Clone,
            Opcode::Goto => Instruction::Goto(u32_at()),
            Opcode::IfTrue => Instruction::IfTrue(u32_at()),
            Opcode::IfFalse => Instruction::IfFalse(u32_at()),
            Opcode::IfNull => Instruction::IfNull(u32_at()),
            Opcode::IfNonNull => Instruction::IfNonNull(u32_at()),
            Opcode::IfEq => Instruction::IfEq(u32_at()),
            Opcode::IfNe => Instruction::IfNe(u32_at()),
            Opcode::IfLt => Instruction::IfLt(u32_at()),
            Opcode::IfGe => Instruction::IfGe(u32_at()),
            Opcode::IfGt => Instruction::IfGt(u32_at()),
            Opcode::IfLe => Instruction::IfLe(u32_at()),
            Opcode::IfIn => Instruction::IfIn(u32_at()),
            Opcode::IfNotIn => Instruction::IfNotIn(u32_at()),
            Opcode::LinearSwitch => Instruction::LinearSwitch(u16_at(0)),
            Opcode::BinarySwitch => Instruction::BinarySwitch(u16_at(0)),
            Opcode::Call => Instruction::Call {
                function: u16_at(0),
                argc: operands[2],
            },
            Opcode::CallAndPop => Instruction::CallAndPop {
                function: u16_at(0),
                argc: operands[2],
            },
            Opcode::Return => Instruction::Return,
            Opcode::Leave => Instruction::Leave,
            Opcode::Unreachable => Instruction::Unreachable,
            Opcode::Halt => Instruction::Halt,
        };
        Ok((instruction, end))
    }

    /// Number of operand-stack cells consumed.
    pub fn pops(&self) -> usize {
        match *self {
            Instruction::Pop
            | Instruction::Store0
            | Instruction::Store1
            | Instruction::Store2
            | Instruction::Store(_)
            | Instruction::Neg
            | Instruction::Plus
            | Instruction::BitNot
            | Instruction::Not
            | Instruction::Len
            | Instruction::Clone
            | Instruction::Dup
            | Instruction::IfTrue(_)
            | Instruction::IfFalse(_)
            | Instruction::IfNull(_)
            | Instruction::IfNonNull(_)
            | Instruction::LinearSwitch(_)
            | Instruction::BinarySwitch(_)
            | Instruction::Return => 1,
            Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Div
            | Instruction::Rem
            | Instruction::BitAnd
            | Instruction::BitOr
            | Instruction::BitXor
            | Instruction::Shl
            | Instruction::Shr
            | Instruction::Eq
            | Instruction::Ne
            | Instruction::Lt
            | Instruction::Le
            | Instruction::Gt
            | Instruction::Ge
            | Instruction::Pop2
            | Instruction::DupX1
            | Instruction::Dup2
            | Instruction::Swap
            | Instruction::LoadIndex
            | Instruction::LoadIndexOrNull
            | Instruction::IncIndex
            | Instruction::DecIndex
            | Instruction::Contains
            | Instruction::Append
            | Instruction::IfEq(_)
            | Instruction::IfNe(_)
            | Instruction::IfLt(_)
            | Instruction::IfGe(_)
            | Instruction::IfGt(_)
            | Instruction::IfLe(_)
            | Instruction::IfIn(_)
            | Instruction::IfNotIn(_) => 2,
            Instruction::DupX2 | Instruction::Dup2X1 | Instruction::StoreIndex => 3,
            Instruction::Dup2X2 => 4,
            Instruction::NewList(n) => n as usize,
            Instruction::NewMap(n) => 2 * n as usize,
            Instruction::Call { argc, .. } | Instruction::CallAndPop { argc, .. } => argc as usize,
            _ => 0,
        }
    }

    /// Number of operand-stack cells produced.
    pub fn pushes(&self) -> usize {
        match self {
            Instruction::PushNull
            | Instruction::PushTrue
            | Instruction::PushFalse
            | Instruction::PushIntM1
            | Instruction::PushInt0
            | Instruction::PushInt1
            | Instruction::PushShort(_)
            | Instruction::Ldc(_)
            | Instruction::GetConst(_)
            | Instruction::Add
            | Instruction::Sub
            | Instruction::Mul
            | Instruction::Div
            | Instruction::Rem
            | Instruction::Neg
            | Instruction::Plus
            | Instruction::BitAnd
            | Instruction::BitOr
            | Instruction::BitXor
            | Instruction::Shl
            | Instruction::Shr
            | Instruction::BitNot
            | Instruction::Not
            | Instruction::Eq
            | Instruction::Ne
            | Instruction::Lt
            | Instruction::Le
            | Instruction::Gt
            | Instruction::Ge
            | Instruction::Load0
            | Instruction::Load1
            | Instruction::Load2
            | Instruction::Load(_)
            | Instruction::NewList(_)
            | Instruction::NewMap(_)
            | Instruction::LoadIndex
            | Instruction::LoadIndexOrNull
            | Instruction::Contains
            | Instruction::Len
            | Instruction::Clone
            | Instruction::Call { .. } => 1,
            Instruction::Dup | Instruction::Swap => 2,
            Instruction::DupX1 => 3,
            Instruction::DupX2 | Instruction::Dup2 => 4,
            Instruction::Dup2X1 => 5,
            Instruction::Dup2X2 => 6,
            _ => 0,
        }
    }

    /// Net change of the stack cursor.
    pub fn stack_delta(&self) -> isize {
        self.pushes() as isize - self.pops() as isize
    }

    /// Target of a conditional or unconditional jump.
    pub fn jump_target(&self) -> Option<u32> {
        match *self {
            Instruction::Goto(t)
            | Instruction::IfTrue(t)
            | Instruction::IfFalse(t)
            | Instruction::IfNull(t)
            | Instruction::IfNonNull(t)
            | Instruction::IfEq(t)
            | Instruction::IfNe(t)
            | Instruction::IfLt(t)
            | Instruction::IfGe(t)
            | Instruction::IfGt(t)
            | Instruction::IfLe(t)
            | Instruction::IfIn(t)
            | Instruction::IfNotIn(t) => Some(t),
            _ => None,
        }
    }

    /// Conditional jump with the opposite condition, same target.
    pub fn negated(&self) -> Option<Instruction> {
        let negated = match *self {
            Instruction::IfTrue(t) => Instruction::IfFalse(t),
            Instruction::IfFalse(t) => Instruction::IfTrue(t),
            Instruction::IfNull(t) => Instruction::IfNonNull(t),
            Instruction::IfNonNull(t) => Instruction::IfNull(t),
            Instruction::IfEq(t) => Instruction::IfNe(t),
            Instruction::IfNe(t) => Instruction::IfEq(t),
            Instruction::IfLt(t) => Instruction::IfGe(t),
            Instruction::IfGe(t) => Instruction::IfLt(t),
            Instruction::IfGt(t) => Instruction::IfLe(t),
            Instruction::IfLe(t) => Instruction::IfGt(t),
            Instruction::IfIn(t) => Instruction::IfNotIn(t),
            Instruction::IfNotIn(t) => Instruction::IfIn(t),
            _ => return None,
        };
        Some(negated)
    }

    /// True if control can continue at the next code index.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            Instruction::Goto(_)
                | Instruction::LinearSwitch(_)
                | Instruction::BinarySwitch(_)
                | Instruction::Return
                | Instruction::Leave
                | Instruction::Halt
                | Instruction::Unreachable
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match *self {
            Instruction::PushShort(v) => write!(f, "{mnemonic} {v}"),
            Instruction::Ldc(v)
            | Instruction::GetConst(v)
            | Instruction::Load(v)
            | Instruction::Store(v)
            | Instruction::Inc(v)
            | Instruction::Dec(v)
            | Instruction::IncQuick(v)
            | Instruction::DecQuick(v)
            | Instruction::NewList(v)
            | Instruction::NewMap(v)
            | Instruction::LinearSwitch(v)
            | Instruction::BinarySwitch(v) => write!(f, "{mnemonic} {v}"),
            Instruction::Call { function, argc } | Instruction::CallAndPop { function, argc } => {
                write!(f, "{mnemonic} {function} {argc}")
            }
            _ => match self.jump_target() {
                Some(target) => write!(f, "{mnemonic} @{target}"),
                None => f.write_str(mnemonic),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(instruction: Instruction) -> Instruction {
        let mut bytes = Vec::new();
        instruction.encode(&mut bytes);
        assert_eq!(bytes.len(), 1 + instruction.opcode().operand_len());
        let (decoded, end) = Instruction::decode(&bytes, 0).unwrap();
        assert_eq!(end, bytes.len());
        decoded
    }

    #[test]
    fn operands_survive_encoding() {
        for instruction in [
            Instruction::PushShort(-300),
            Instruction::Ldc(0xBEEF),
            Instruction::IfLe(0x0102_0304),
            Instruction::Call {
                function: 7,
                argc: 3,
            },
            Instruction::Halt,
        ] {
            assert_eq!(roundtrip(instruction), instruction);
        }
    }

    #[test]
    fn little_endian_operands() {
        let mut bytes = Vec::new();
        Instruction::Goto(0x0A0B_0C0D).encode(&mut bytes);
        assert_eq!(bytes, vec![0x60, 0x0D, 0x0C, 0x0B, 0x0A]);
    }

    #[test]
    fn decode_rejects_illegal_and_reserved() {
        assert_eq!(
            Instruction::decode(&[0x00], 0),
            Err(DecodeError::IllegalOpcode)
        );
        assert_eq!(
            Instruction::decode(&[0x0F], 0),
            Err(DecodeError::ReservedOpcode(0x0F))
        );
    }

    #[test]
    fn decode_rejects_truncated_operands() {
        assert_eq!(
            Instruction::decode(&[0x60, 0x01, 0x02], 0),
            Err(DecodeError::UnexpectedEof { offset: 3 })
        );
        assert_eq!(
            Instruction::decode(&[], 0),
            Err(DecodeError::UnexpectedEof { offset: 0 })
        );
    }

    #[test]
    fn stack_effects() {
        assert_eq!(Instruction::Add.stack_delta(), -1);
        assert_eq!(Instruction::Dup2X2.pops(), 4);
        assert_eq!(Instruction::Dup2X2.pushes(), 6);
        assert_eq!(Instruction::NewMap(3).pops(), 6);
        assert_eq!(Instruction::NewMap(3).pushes(), 1);
        assert_eq!(
            Instruction::CallAndPop {
                function: 0,
                argc: 2
            }
            .stack_delta(),
            -2
        );
        assert_eq!(Instruction::StoreIndex.stack_delta(), -3);
        assert_eq!(Instruction::Inc(0).stack_delta(), 0);
    }

    #[test]
    fn negation_is_an_involution() {
        let conditionals = [
            Instruction::IfTrue(1),
            Instruction::IfNull(1),
            Instruction::IfEq(1),
            Instruction::IfLt(1),
            Instruction::IfGt(1),
            Instruction::IfIn(1),
        ];
        for instruction in conditionals {
            let negated = instruction.negated().unwrap();
            assert_ne!(negated, instruction);
            assert_eq!(negated.negated(), Some(instruction));
            assert_eq!(negated.jump_target(), Some(1));
        }
        assert_eq!(Instruction::Goto(1).negated(), None);
    }

    #[test]
    fn negated_pairs() {
        assert_eq!(Instruction::IfLt(4).negated(), Some(Instruction::IfGe(4)));
        assert_eq!(Instruction::IfGt(4).negated(), Some(Instruction::IfLe(4)));
    }

    #[test]
    fn fallthrough() {
        assert!(Instruction::IfTrue(0).falls_through());
        assert!(!Instruction::Goto(0).falls_through());
        assert!(!Instruction::Leave.falls_through());
        assert!(Instruction::Call {
            function: 0,
            argc: 0
        }
        .falls_through());
    }

    #[test]
    fn display() {
        assert_eq!(Instruction::Load(4).to_string(), "LOAD 4");
        assert_eq!(Instruction::IfEq(9).to_string(), "IF_EQ @9");
        assert_eq!(Instruction::Add.to_string(), "ADD");
    }
}
