//! Frame memory.
//!
//! All frames of a thread share one contiguous slot vector. A frame owns
//! the region `[base, base + max_locals + max_stack)`: locals first, then
//! its operand stack. The top-of-stack cursor `tos` is the next free cell,
//! and operand cells are addressed relative to it (`-1` is the top).
//!
//! ```text
//!  base                 base + locals            tos
//!   | local 0 | local 1 | ... | cell | cell | cell |  free ...  |
//! ```

use crate::error::RuntimeError;
use brisk_common::{FunctionId, Instruction, Value};

/// Where a frame's result goes when it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReturnDest {
    /// Pushed onto the caller's operand stack (`Call`).
    Push,
    /// Dropped (`CallAndPop`).
    Discard,
    /// Handed back to the host that started the activation.
    Host,
}

/// One activation record.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    pub function: FunctionId,
    /// First slot of the frame's region.
    pub base: usize,
    pub locals: usize,
    /// One past the last slot of the region.
    pub limit: usize,
    /// Absolute index of the next free operand cell.
    pub tos: usize,
    /// Index of the next instruction to execute.
    pub cp: usize,
    pub dest: ReturnDest,
}

impl Frame {
    /// Code index of the instruction executed last, for line lookup.
    pub fn last_cp(&self) -> usize {
        self.cp.saturating_sub(1)
    }
}

/// Mutable view of one frame's region, handed to the instruction
/// implementations.
pub(crate) struct FrameMemory<'a> {
    slots: &'a mut [Value],
    locals: usize,
    tos: usize,
}

impl<'a> FrameMemory<'a> {
    /// `tos` is relative to the start of `slots`.
    pub fn new(slots: &'a mut [Value], locals: usize, tos: usize) -> Self {
        Self { slots, locals, tos }
    }

    pub fn tos(&self) -> usize {
        self.tos
    }

    /// Cells currently on the operand stack.
    pub fn depth(&self) -> usize {
        self.tos - self.locals
    }

    /// Operand cells the region can hold.
    pub fn capacity(&self) -> usize {
        self.slots.len() - self.locals
    }

    /// True if `insn`'s declared stack effect stays inside the region.
    pub fn fits(&self, insn: &Instruction) -> bool {
        let depth = self.depth();
        depth >= insn.pops() && depth - insn.pops() + insn.pushes() <= self.capacity()
    }

    fn index(&self, offset: isize) -> usize {
        self.tos.wrapping_add_signed(offset)
    }

    pub fn at(&self, offset: isize) -> &Value {
        &self.slots[self.index(offset)]
    }

    pub fn at_mut(&mut self, offset: isize) -> &mut Value {
        let i = self.index(offset);
        &mut self.slots[i]
    }

    pub fn set(&mut self, offset: isize, value: Value) {
        *self.at_mut(offset) = value;
    }

    /// Move a cell out, leaving `undefined` behind.
    pub fn take(&mut self, offset: isize) -> Value {
        std::mem::take(self.at_mut(offset))
    }

    pub fn push(&mut self, value: Value) {
        self.slots[self.tos] = value;
        self.tos += 1;
    }

    /// Move the cursor by `delta`. Vacated cells are cleared so the frame
    /// does not keep containers alive.
    pub fn add_tos(&mut self, delta: isize) {
        let new_tos = self.tos.wrapping_add_signed(delta);
        if new_tos < self.tos {
            for cell in &mut self.slots[new_tos..self.tos] {
                *cell = Value::Undefined;
            }
        }
        self.tos = new_tos;
    }

    /// The top `n` operand cells, bottom first.
    pub fn top_mut(&mut self, n: usize) -> &mut [Value] {
        let tos = self.tos;
        &mut self.slots[tos - n..tos]
    }

    /// Move the top `n` cells out, bottom first, and shrink the stack.
    pub fn drain(&mut self, n: usize) -> Vec<Value> {
        let items = self.top_mut(n).iter_mut().map(std::mem::take).collect();
        self.tos -= n;
        items
    }

    pub fn local(&self, slot: u16) -> Result<&Value, RuntimeError> {
        let i = slot as usize;
        if i < self.locals {
            Ok(&self.slots[i])
        } else {
            Err(RuntimeError::fault(format!("local slot {slot} out of range")))
        }
    }

    pub fn local_mut(&mut self, slot: u16) -> Result<&mut Value, RuntimeError> {
        let i = slot as usize;
        if i < self.locals {
            Ok(&mut self.slots[i])
        } else {
            Err(RuntimeError::fault(format!("local slot {slot} out of range")))
        }
    }

    /// Local that must have been assigned.
    pub fn initialized(&self, slot: u16) -> Result<&Value, RuntimeError> {
        match self.local(slot)? {
            Value::Undefined => Err(RuntimeError::UninitializedLocal { slot }),
            value => Ok(value),
        }
    }
}
