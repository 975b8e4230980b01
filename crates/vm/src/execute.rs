//! Instruction semantics.
//!
//! [`step`] applies one instruction to a frame's memory and reports how
//! control continues. Arithmetic overwrites the left operand's cell and
//! shrinks the stack by one; nothing here allocates a frame or touches
//! another frame's region.

use crate::error::RuntimeError;
use crate::frame::FrameMemory;
use crate::program::Program;
use crate::switch;
use brisk_common::{Code, FunctionId, Instruction, MapKey, Value, ValueError};

/// Control-transfer result of one instruction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    /// Continue at the next code index.
    Next,
    /// Continue at an absolute code index.
    Jump(usize),
    /// Leave this frame to call `function` with the top `argc` cells.
    Call {
        function: FunctionId,
        argc: u8,
        keep: bool,
    },
    /// Pop the frame, handing its caller this value.
    Return(Value),
    /// Pop the frame, handing its caller `null`.
    Leave,
    /// Stop the thread.
    Halt,
}

type Binary = fn(&Value, &Value) -> Result<Value, ValueError>;
type Unary = fn(&Value) -> Result<Value, ValueError>;

/// `a op b` with `a` at `-2` and `b` at `-1`; the result replaces `a`.
fn binary(memory: &mut FrameMemory<'_>, op: Binary) -> Result<Flow, RuntimeError> {
    let rhs = memory.take(-1);
    let result = op(memory.at(-2), &rhs)?;
    memory.set(-2, result);
    memory.add_tos(-1);
    Ok(Flow::Next)
}

fn compare(
    memory: &mut FrameMemory<'_>,
    test: fn(&Value, &Value) -> Result<bool, ValueError>,
) -> Result<Flow, RuntimeError> {
    let rhs = memory.take(-1);
    let result = test(memory.at(-2), &rhs)?;
    memory.set(-2, Value::Bool(result));
    memory.add_tos(-1);
    Ok(Flow::Next)
}

fn unary(memory: &mut FrameMemory<'_>, op: Unary) -> Result<Flow, RuntimeError> {
    let result = op(memory.at(-1))?;
    memory.set(-1, result);
    Ok(Flow::Next)
}

fn push(memory: &mut FrameMemory<'_>, value: Value) -> Result<Flow, RuntimeError> {
    memory.push(value);
    Ok(Flow::Next)
}

fn load(memory: &mut FrameMemory<'_>, slot: u16) -> Result<Flow, RuntimeError> {
    let value = memory.initialized(slot)?.clone();
    push(memory, value)
}

fn store(memory: &mut FrameMemory<'_>, slot: u16) -> Result<Flow, RuntimeError> {
    let value = memory.take(-1);
    *memory.local_mut(slot)? = value;
    memory.add_tos(-1);
    Ok(Flow::Next)
}

fn step_local(
    memory: &mut FrameMemory<'_>,
    slot: u16,
    delta: i64,
    checked: bool,
) -> Result<Flow, RuntimeError> {
    if checked {
        memory.initialized(slot)?;
    }
    memory.local_mut(slot)?.increment(delta)?;
    Ok(Flow::Next)
}

/// Copy the top `n` cells and insert the copies `depth` cells further
/// down: `x_depth .. x_1 v_n .. v_1` becomes `v_n .. v_1 x_depth .. x_1 v_n .. v_1`.
fn dup(memory: &mut FrameMemory<'_>, n: usize, depth: usize) -> Result<Flow, RuntimeError> {
    let copies: Vec<Value> = memory.top_mut(n).to_vec();
    for value in copies {
        memory.push(value);
    }
    memory.top_mut(2 * n + depth).rotate_right(n);
    Ok(Flow::Next)
}

fn constant(code: &Code, index: u16) -> Result<&Value, RuntimeError> {
    code.constants
        .get(index as usize)
        .ok_or_else(|| RuntimeError::fault(format!("constant pool index {index} out of range")))
}

fn get_const(
    memory: &mut FrameMemory<'_>,
    code: &Code,
    program: &Program,
    index: u16,
) -> Result<Flow, RuntimeError> {
    let name = match constant(code, index)? {
        Value::Str(name) => name.snapshot(),
        other => {
            return Err(RuntimeError::fault(format!(
                "constant name must be a string, found {}",
                other.type_tag()
            )))
        }
    };
    let value = program
        .global(&name)
        .ok_or(RuntimeError::UndefinedKey { key: name })?
        .materialize();
    push(memory, value)
}

fn new_map(memory: &mut FrameMemory<'_>, pairs: u16) -> Result<Flow, RuntimeError> {
    let cells = memory.drain(2 * pairs as usize);
    let mut entries = Vec::with_capacity(pairs as usize);
    let mut cells = cells.into_iter();
    while let (Some(key), Some(value)) = (cells.next(), cells.next()) {
        entries.push((MapKey::from_value(&key)?, value));
    }
    push(memory, Value::map(entries))
}

fn load_index(memory: &mut FrameMemory<'_>, strict: bool) -> Result<Flow, RuntimeError> {
    let index = memory.take(-1);
    let container = memory.at(-2);
    let value = if strict {
        container.load_index(&index)?
    } else {
        container.load_index_or_null(&index)?
    };
    memory.set(-2, value);
    memory.add_tos(-1);
    Ok(Flow::Next)
}

fn store_index(memory: &mut FrameMemory<'_>) -> Result<Flow, RuntimeError> {
    let value = memory.take(-1);
    let index = memory.take(-2);
    let container = memory.take(-3);
    memory.add_tos(-3);
    container.store_index(&index, value)?;
    Ok(Flow::Next)
}

fn step_index(memory: &mut FrameMemory<'_>, delta: i64) -> Result<Flow, RuntimeError> {
    let index = memory.take(-1);
    let container = memory.take(-2);
    memory.add_tos(-2);
    container.increment_index(&index, delta)?;
    Ok(Flow::Next)
}

fn contains(memory: &mut FrameMemory<'_>) -> Result<Flow, RuntimeError> {
    let item = memory.take(-1);
    let found = memory.at(-2).contains(&item)?;
    memory.set(-2, Value::Bool(found));
    memory.add_tos(-1);
    Ok(Flow::Next)
}

fn append(memory: &mut FrameMemory<'_>) -> Result<Flow, RuntimeError> {
    let value = memory.take(-1);
    let container = memory.take(-2);
    memory.add_tos(-2);
    container.append(value)?;
    Ok(Flow::Next)
}

fn branch(taken: bool, target: u32) -> Flow {
    if taken {
        Flow::Jump(target as usize)
    } else {
        Flow::Next
    }
}

/// Pop one cell and branch on `test(cell)`.
fn if_unary(
    memory: &mut FrameMemory<'_>,
    target: u32,
    test: fn(&Value) -> bool,
) -> Result<Flow, RuntimeError> {
    let value = memory.take(-1);
    memory.add_tos(-1);
    Ok(branch(test(&value), target))
}

/// Pop two cells and branch on `test(lhs, rhs)`.
fn if_binary(
    memory: &mut FrameMemory<'_>,
    target: u32,
    test: fn(&Value, &Value) -> Result<bool, ValueError>,
) -> Result<Flow, RuntimeError> {
    let rhs = memory.take(-1);
    let lhs = memory.take(-2);
    memory.add_tos(-2);
    Ok(branch(test(&lhs, &rhs)?, target))
}

fn jump_table(
    memory: &mut FrameMemory<'_>,
    code: &Code,
    table: u16,
    sorted: bool,
) -> Result<Flow, RuntimeError> {
    let table = code
        .switch_tables
        .get(table as usize)
        .ok_or_else(|| RuntimeError::fault(format!("switch table {table} out of range")))?;
    let selector = memory.take(-1);
    memory.add_tos(-1);
    let target = if sorted {
        switch::binary_target(table, &code.constants, &selector)
    } else {
        switch::linear_target(table, &code.constants, &selector)
    };
    Ok(Flow::Jump(target as usize))
}

fn not_equal(a: &Value, b: &Value) -> Result<bool, ValueError> {
    Ok(!a.equals(b))
}

fn equal(a: &Value, b: &Value) -> Result<bool, ValueError> {
    Ok(a.equals(b))
}

fn contained_in(container: &Value, item: &Value) -> Result<bool, ValueError> {
    container.contains(item)
}

fn not_contained_in(container: &Value, item: &Value) -> Result<bool, ValueError> {
    container.contains(item).map(|found| !found)
}

/// Execute one instruction against the current frame.
///
/// The caller has already checked that the instruction's declared stack
/// effect fits the frame.
pub(crate) fn step(
    insn: Instruction,
    memory: &mut FrameMemory<'_>,
    code: &Code,
    program: &Program,
) -> Result<Flow, RuntimeError> {
    match insn {
        Instruction::Nop => Ok(Flow::Next),
        Instruction::PushNull => push(memory, Value::Null),
        Instruction::PushTrue => push(memory, Value::Bool(true)),
        Instruction::PushFalse => push(memory, Value::Bool(false)),
        Instruction::PushIntM1 => push(memory, Value::Int(-1)),
        Instruction::PushInt0 => push(memory, Value::Int(0)),
        Instruction::PushInt1 => push(memory, Value::Int(1)),
        Instruction::PushShort(v) => push(memory, Value::Int(i64::from(v))),
        Instruction::Ldc(index) => {
            let value = constant(code, index)?.materialize();
            push(memory, value)
        }
        Instruction::GetConst(index) => get_const(memory, code, program, index),

        Instruction::Add => binary(memory, Value::add),
        Instruction::Sub => binary(memory, Value::sub),
        Instruction::Mul => binary(memory, Value::mul),
        Instruction::Div => binary(memory, Value::div),
        Instruction::Rem => binary(memory, Value::rem),
        Instruction::Neg => unary(memory, Value::neg),
        Instruction::Plus => unary(memory, Value::plus),

        Instruction::BitAnd => binary(memory, Value::bit_and),
        Instruction::BitOr => binary(memory, Value::bit_or),
        Instruction::BitXor => binary(memory, Value::bit_xor),
        Instruction::Shl => binary(memory, Value::shl),
        Instruction::Shr => binary(memory, Value::shr),
        Instruction::BitNot => unary(memory, Value::bit_not),
        Instruction::Not => unary(memory, Value::not),

        Instruction::Eq => compare(memory, equal),
        Instruction::Ne => compare(memory, not_equal),
        Instruction::Lt => compare(memory, Value::less_than),
        Instruction::Le => compare(memory, Value::less_equal),
        Instruction::Gt => compare(memory, Value::greater_than),
        Instruction::Ge => compare(memory, Value::greater_equal),

        Instruction::Load0 => load(memory, 0),
        Instruction::Load1 => load(memory, 1),
        Instruction::Load2 => load(memory, 2),
        Instruction::Load(slot) => load(memory, slot),
        Instruction::Store0 => store(memory, 0),
        Instruction::Store1 => store(memory, 1),
        Instruction::Store2 => store(memory, 2),
        Instruction::Store(slot) => store(memory, slot),
        Instruction::Inc(slot) => step_local(memory, slot, 1, true),
        Instruction::Dec(slot) => step_local(memory, slot, -1, true),
        Instruction::IncQuick(slot) => step_local(memory, slot, 1, false),
        Instruction::DecQuick(slot) => step_local(memory, slot, -1, false),

        Instruction::Pop => {
            memory.add_tos(-1);
            Ok(Flow::Next)
        }
        Instruction::Pop2 => {
            memory.add_tos(-2);
            Ok(Flow::Next)
        }
        Instruction::Dup => dup(memory, 1, 0),
        Instruction::DupX1 => dup(memory, 1, 1),
        Instruction::DupX2 => dup(memory, 1, 2),
        Instruction::Dup2 => dup(memory, 2, 0),
        Instruction::Dup2X1 => dup(memory, 2, 1),
        Instruction::Dup2X2 => dup(memory, 2, 2),
        Instruction::Swap => {
            memory.top_mut(2).swap(0, 1);
            Ok(Flow::Next)
        }

        Instruction::NewList(n) => {
            let items = memory.drain(n as usize);
            push(memory, Value::list(items))
        }
        Instruction::NewMap(pairs) => new_map(memory, pairs),
        Instruction::LoadIndex => load_index(memory, true),
        Instruction::LoadIndexOrNull => load_index(memory, false),
        Instruction::StoreIndex => store_index(memory),
        Instruction::IncIndex => step_index(memory, 1),
        Instruction::DecIndex => step_index(memory, -1),
        Instruction::Contains => contains(memory),
        Instruction::Len => {
            let len = memory.at(-1).len()?;
            memory.set(-1, Value::Int(len as i64));
            Ok(Flow::Next)
        }
        Instruction::Append => append(memory),
        Instruction::Clone => {
            let copy = memory.at(-1).deep_clone();
            memory.set(-1, copy);
            Ok(Flow::Next)
        }

        Instruction::Goto(target) => Ok(Flow::Jump(target as usize)),
        Instruction::IfTrue(t) => if_unary(memory, t, Value::truthy),
        Instruction::IfFalse(t) => if_unary(memory, t, |v| !v.truthy()),
        Instruction::IfNull(t) => if_unary(memory, t, Value::is_null),
        Instruction::IfNonNull(t) => if_unary(memory, t, |v| !v.is_null()),
        Instruction::IfEq(t) => if_binary(memory, t, equal),
        Instruction::IfNe(t) => if_binary(memory, t, not_equal),
        Instruction::IfLt(t) => if_binary(memory, t, Value::less_than),
        Instruction::IfGe(t) => if_binary(memory, t, Value::greater_equal),
        Instruction::IfGt(t) => if_binary(memory, t, Value::greater_than),
        Instruction::IfLe(t) => if_binary(memory, t, Value::less_equal),
        Instruction::IfIn(t) => if_binary(memory, t, contained_in),
        Instruction::IfNotIn(t) => if_binary(memory, t, not_contained_in),
        Instruction::LinearSwitch(table) => jump_table(memory, code, table, false),
        Instruction::BinarySwitch(table) => jump_table(memory, code, table, true),

        Instruction::Call { function, argc } => Ok(Flow::Call {
            function,
            argc,
            keep: true,
        }),
        Instruction::CallAndPop { function, argc } => Ok(Flow::Call {
            function,
            argc,
            keep: false,
        }),
        Instruction::Return => {
            let value = memory.take(-1);
            memory.add_tos(-1);
            Ok(Flow::Return(value))
        }
        Instruction::Leave => Ok(Flow::Leave),
        Instruction::Halt => Ok(Flow::Halt),
        Instruction::Unreachable => Err(RuntimeError::fault("unreachable instruction executed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeRegistry;
    use brisk_common::Module;

    /// Run straight-line `code` in a scratch frame; return the stack.
    fn exec(
        instructions: Vec<Instruction>,
        locals: Vec<Value>,
    ) -> Result<Vec<Value>, RuntimeError> {
        let code = Code::new(instructions).with_stack(8);
        let program = Program::link(Module::default(), &NativeRegistry::new());
        let nlocals = locals.len();
        let mut slots = locals;
        slots.resize(nlocals + 8, Value::Undefined);
        let mut memory = FrameMemory::new(&mut slots, nlocals, nlocals);
        for &insn in &code.instructions {
            assert!(memory.fits(&insn), "{insn} overflows");
            assert_eq!(step(insn, &mut memory, &code, &program)?, Flow::Next);
        }
        let depth = memory.depth();
        Ok(memory.drain(depth))
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().map(|&v| Value::Int(v)).collect()
    }

    fn push_all(values: &[i64]) -> Vec<Instruction> {
        values.iter().map(|&v| Instruction::PushShort(v as i16)).collect()
    }

    fn shuffled(values: &[i64], insn: Instruction) -> Vec<Value> {
        let mut program = push_all(values);
        program.push(insn);
        exec(program, vec![]).unwrap()
    }

    #[test]
    fn dup_family_layouts() {
        assert_eq!(shuffled(&[1], Instruction::Dup), ints(&[1, 1]));
        assert_eq!(shuffled(&[2, 1], Instruction::DupX1), ints(&[1, 2, 1]));
        assert_eq!(shuffled(&[3, 2, 1], Instruction::DupX2), ints(&[1, 3, 2, 1]));
        assert_eq!(shuffled(&[2, 1], Instruction::Dup2), ints(&[2, 1, 2, 1]));
        assert_eq!(
            shuffled(&[3, 2, 1], Instruction::Dup2X1),
            ints(&[2, 1, 3, 2, 1])
        );
        assert_eq!(
            shuffled(&[4, 3, 2, 1], Instruction::Dup2X2),
            ints(&[2, 1, 4, 3, 2, 1])
        );
        assert_eq!(shuffled(&[2, 1], Instruction::Swap), ints(&[1, 2]));
        assert_eq!(shuffled(&[2, 1], Instruction::Pop), ints(&[2]));
        assert_eq!(shuffled(&[3, 2, 1], Instruction::Pop2), ints(&[3]));
    }

    #[test]
    fn arithmetic_overwrites_left_operand() {
        let stack = exec(
            vec![
                Instruction::PushShort(7),
                Instruction::PushShort(2),
                Instruction::Div,
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(stack, vec![Value::Float(3.5)]);
    }

    #[test]
    fn comparisons_push_booleans() {
        let stack = exec(
            vec![
                Instruction::PushInt1,
                Instruction::PushShort(2),
                Instruction::Lt,
                Instruction::PushInt1,
                Instruction::PushInt1,
                Instruction::Ne,
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(stack, vec![Value::Bool(true), Value::Bool(false)]);
    }

    #[test]
    fn locals_load_store_and_step() {
        let stack = exec(
            vec![
                Instruction::PushShort(41),
                Instruction::Store1,
                Instruction::Inc(1),
                Instruction::Load1,
                Instruction::DecQuick(0),
                Instruction::Load0,
            ],
            vec![Value::Float(1.5), Value::Undefined],
        )
        .unwrap();
        assert_eq!(stack, vec![Value::Int(42), Value::Float(0.5)]);
    }

    #[test]
    fn load_of_unassigned_local_fails() {
        assert_eq!(
            exec(vec![Instruction::Load2], vec![Value::Undefined; 3]),
            Err(RuntimeError::UninitializedLocal { slot: 2 })
        );
        assert_eq!(
            exec(vec![Instruction::Inc(0)], vec![Value::Undefined]),
            Err(RuntimeError::UninitializedLocal { slot: 0 })
        );
    }

    #[test]
    fn containers_through_the_stack() {
        let stack = exec(
            vec![
                Instruction::PushShort(10),
                Instruction::PushShort(20),
                Instruction::NewList(2),
                Instruction::Dup,
                Instruction::PushInt0,
                Instruction::IncIndex,
                Instruction::Dup,
                Instruction::PushShort(30),
                Instruction::Append,
                Instruction::Dup,
                Instruction::Len,
                Instruction::Swap,
                Instruction::PushInt0,
                Instruction::LoadIndex,
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(stack, ints(&[3, 11]));
    }

    #[test]
    fn new_map_pairs_in_push_order() {
        let code = vec![
            Instruction::Ldc(0),
            Instruction::PushInt1,
            Instruction::PushNull,
            Instruction::PushInt0,
            Instruction::NewMap(2),
        ];
        let constants = vec![Value::string("k")];
        let program = Program::link(Module::default(), &NativeRegistry::new());
        let code = Code::new(code).with_constants(constants).with_stack(4);
        let mut slots = vec![Value::Undefined; 4];
        let mut memory = FrameMemory::new(&mut slots, 0, 0);
        for &insn in &code.instructions {
            step(insn, &mut memory, &code, &program).unwrap();
        }
        assert_eq!(
            memory.at(-1),
            &Value::map([
                (MapKey::Null, Value::Int(0)),
                (MapKey::Str("k".into()), Value::Int(1)),
            ])
        );
    }

    #[test]
    fn strict_and_lenient_index_instructions() {
        let missing = vec![
            Instruction::NewList(0),
            Instruction::PushInt0,
            Instruction::LoadIndex,
        ];
        assert_eq!(
            exec(missing, vec![]),
            Err(RuntimeError::IndexOutOfBounds { index: 0, len: 0 })
        );
        let lenient = vec![
            Instruction::NewList(0),
            Instruction::PushInt0,
            Instruction::LoadIndexOrNull,
        ];
        assert_eq!(exec(lenient, vec![]).unwrap(), vec![Value::Null]);
    }

    #[test]
    fn branches_report_targets() {
        let code = Code::new(vec![]).with_stack(2);
        let program = Program::link(Module::default(), &NativeRegistry::new());
        let mut slots = vec![Value::Undefined; 2];
        let mut memory = FrameMemory::new(&mut slots, 0, 0);

        memory.push(Value::Float(f64::NAN));
        memory.push(Value::Float(1.0));
        assert_eq!(
            step(Instruction::IfLt(9), &mut memory, &code, &program),
            Ok(Flow::Next)
        );
        memory.push(Value::Float(f64::NAN));
        memory.push(Value::Float(1.0));
        assert_eq!(
            step(Instruction::IfGe(9), &mut memory, &code, &program),
            Ok(Flow::Next)
        );
        memory.push(Value::string(""));
        assert_eq!(
            step(Instruction::IfFalse(4), &mut memory, &code, &program),
            Ok(Flow::Jump(4))
        );
        assert_eq!(memory.depth(), 0);
    }

    #[test]
    fn unreachable_is_an_internal_fault() {
        assert!(matches!(
            exec(vec![Instruction::Unreachable], vec![]),
            Err(RuntimeError::InternalFault { .. })
        ));
    }

    #[test]
    fn get_const_reads_module_constants() {
        let module = Module::default().with_globals(vec![(
            "LIMIT".into(),
            Value::list(vec![Value::Int(1)]),
        )]);
        let program = Program::link(module, &NativeRegistry::new());
        let code = Code::new(vec![])
            .with_constants(vec![Value::string("LIMIT"), Value::string("NOPE")])
            .with_stack(1);
        let mut slots = vec![Value::Undefined; 1];
        let mut memory = FrameMemory::new(&mut slots, 0, 0);
        step(Instruction::GetConst(0), &mut memory, &code, &program).unwrap();
        assert_eq!(memory.at(-1), &Value::list(vec![Value::Int(1)]));

        // The pushed copy is detached from the module constant.
        if let Value::List(list) = memory.at(-1) {
            list.push(Value::Null);
        }
        assert_eq!(
            program.global("LIMIT"),
            Some(&Value::list(vec![Value::Int(1)]))
        );

        memory.add_tos(-1);
        assert_eq!(
            step(Instruction::GetConst(1), &mut memory, &code, &program),
            Err(RuntimeError::UndefinedKey {
                key: "NOPE".into()
            })
        );
    }
}
