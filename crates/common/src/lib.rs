//! Shared types for the brisk execution core.
//!
//! - [`Value`] and the heap containers ([`StrBuf`], [`List`], [`Map`])
//! - [`TypeTag`] for the eight value kinds
//! - [`Opcode`] and [`Instruction`], with static stack effects
//! - [`Function`], [`Code`] and [`Module`], the loader's output
//! - the versioned `.bkm` codec on [`Module`]
//! - [`ValueError`] and [`DecodeError`]

pub mod codec;
pub mod error;
pub mod function;
pub mod heap;
pub mod instruction;
pub mod module;
pub mod opcode;
mod ops;
pub mod type_tag;
pub mod value;

pub use error::{DecodeError, ValueError};
pub use function::{Code, Function, FunctionKind, LineEntry, SwitchTable};
pub use heap::{List, Map, MapKey, StrBuf};
pub use instruction::{FunctionId, Instruction};
pub use module::Module;
pub use opcode::Opcode;
pub use type_tag::TypeTag;
pub use value::Value;

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::cmp::Ordering;

    fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<i64>().prop_map(Value::Int),
            any::<f64>().prop_map(Value::Float),
            any::<bool>().prop_map(Value::Bool),
            "[a-z]{0,6}".prop_map(Value::string),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::list),
                prop::collection::vec((any::<i64>(), inner), 0..4).prop_map(|pairs| {
                    Value::map(pairs.into_iter().map(|(k, v)| (MapKey::Int(k), v)))
                }),
            ]
        })
    }

    fn arb_module() -> impl Strategy<Value = Module> {
        (
            prop::collection::vec(arb_value(), 0..6),
            prop::collection::vec(any::<u8>(), 0..4),
        )
            .prop_map(|(constants, ops)| {
                let instructions = ops
                    .into_iter()
                    .map(|b| match b % 4 {
                        0 => Instruction::PushShort(b as i16),
                        1 => Instruction::Goto(u32::from(b)),
                        2 => Instruction::Call {
                            function: u16::from(b),
                            argc: b,
                        },
                        _ => Instruction::Add,
                    })
                    .collect();
                let code = Code::new(instructions).with_constants(constants);
                Module::new(vec![Function::bytecode("f", "m", code)])
            })
    }

    proptest! {
        #[test]
        fn int_add_is_wrapping(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(
                Value::Int(a).add(&Value::Int(b)).unwrap(),
                Value::Int(a.wrapping_add(b))
            );
        }

        #[test]
        fn int_float_add_promotes(a in -1_000_000i64..1_000_000, b in -1e6f64..1e6) {
            prop_assert_eq!(
                Value::Int(a).add(&Value::Float(b)).unwrap(),
                Value::Float(a as f64 + b)
            );
            prop_assert_eq!(
                Value::Float(b).add(&Value::Int(a)).unwrap(),
                Value::Float(b + a as f64)
            );
        }

        #[test]
        fn int_division_is_int_only_when_exact(a in any::<i64>(), b in any::<i64>()) {
            prop_assume!(b != 0);
            let quotient = Value::Int(a).div(&Value::Int(b)).unwrap();
            if a.wrapping_rem(b) == 0 {
                prop_assert_eq!(quotient, Value::Int(a.wrapping_div(b)));
            } else {
                prop_assert_eq!(quotient.type_tag(), TypeTag::Float);
            }
        }

        #[test]
        fn comparison_is_antisymmetric(a in arb_scalar(), b in arb_scalar()) {
            match (a.weak_compare(&b), b.weak_compare(&a)) {
                (Ok(x), Ok(y)) => prop_assert_eq!(x, y.map(Ordering::reverse)),
                (Err(_), Err(_)) => {}
                other => prop_assert!(false, "asymmetric comparison: {:?}", other),
            }
        }

        #[test]
        fn deep_clone_is_equal_and_detached(v in arb_value()) {
            let copy = v.deep_clone();
            let nan_free = !v.to_string().contains("NaN");
            if nan_free {
                prop_assert_eq!(&copy, &v);
            }
            if let (Value::List(original), Value::List(cloned)) = (&v, &copy) {
                prop_assert!(!original.ptr_eq(cloned));
            }
        }

        #[test]
        fn string_concatenation_never_fails(v in arb_value()) {
            let joined = Value::string("x").add(&v).unwrap();
            prop_assert_eq!(joined.to_string(), format!("x{v}"));
        }

        #[test]
        fn random_instruction_bytes(bytes in prop::collection::vec(any::<u8>(), 0..8)) {
            match Instruction::decode(&bytes, 0) {
                Ok((instruction, end)) => {
                    let mut encoded = Vec::new();
                    instruction.encode(&mut encoded);
                    prop_assert_eq!(&encoded[..], &bytes[..end]);
                }
                Err(e) => prop_assert!(matches!(
                    e,
                    DecodeError::IllegalOpcode
                        | DecodeError::ReservedOpcode(_)
                        | DecodeError::UnexpectedEof { .. }
                ), "unexpected decode error: {:?}", e),
            }
        }

        #[test]
        fn random_module_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..128)) {
            let _ = Module::decode(&bytes);
        }

        #[test]
        fn module_roundtrip(module in arb_module()) {
            let decoded = Module::decode(&module.encode()).unwrap();
            // NaN constants defeat structural equality; compare encodings.
            prop_assert_eq!(decoded.encode(), module.encode());
        }
    }
}
