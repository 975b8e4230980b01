//! Versioned binary module format (`.bkm`).
//!
//! ```text
//! Bytes 0-3:    magic "BRSK"
//! Bytes 4-5:    format version (u16)
//! Bytes 6-9:    payload length (u32)
//! Bytes 10-41:  blake3 digest of the payload
//! Bytes 42..:   payload
//! ```
//!
//! All integers are little-endian. Strings and sequences carry a `u32`
//! length prefix. A value is its type tag byte followed by its payload.

use crate::error::DecodeError;
use crate::function::{Code, Function, FunctionKind, LineEntry, SwitchTable};
use crate::heap::MapKey;
use crate::instruction::Instruction;
use crate::module::Module;
use crate::type_tag::TypeTag;
use crate::value::Value;

pub const MAGIC: [u8; 4] = *b"BRSK";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 4 + 2 + 4 + 32;

/// Deepest container nesting accepted in encoded constants.
pub const MAX_VALUE_DEPTH: usize = 64;

const KIND_NATIVE: u8 = 0;
const KIND_BYTECODE: u8 = 1;

impl Module {
    /// Encode the module with header and digest.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        write_module(&mut payload, self);

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(blake3::hash(&payload).as_bytes());
        bytes.extend_from_slice(&payload);
        bytes
    }

    /// Decode and integrity-check an encoded module.
    pub fn decode(bytes: &[u8]) -> Result<Module, DecodeError> {
        if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
            return Err(DecodeError::BadMagic);
        }
        let mut header = Reader::new(bytes, 4);
        let version = header.u16()?;
        if version != FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let declared = header.u32()? as usize;
        let digest = header.take(32)?;

        let payload = &bytes[HEADER_LEN..];
        if payload.len() != declared {
            return Err(DecodeError::InvalidLength {
                declared,
                actual: payload.len(),
            });
        }
        if blake3::hash(payload).as_bytes()[..] != digest[..] {
            return Err(DecodeError::ChecksumMismatch);
        }

        let mut reader = Reader::new(bytes, HEADER_LEN);
        let module = reader.module()?;
        match bytes.len() - reader.pos {
            0 => Ok(module),
            n => Err(DecodeError::TrailingBytes(n)),
        }
    }
}

fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    write_u32(out, len as u32);
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_len(out, s.len());
    out.extend_from_slice(s.as_bytes());
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    out.push(value.type_tag() as u8);
    match value {
        Value::Undefined | Value::Null => {}
        Value::Int(i) => out.extend_from_slice(&i.to_le_bytes()),
        Value::Float(f) => out.extend_from_slice(&f.to_bits().to_le_bytes()),
        Value::Bool(b) => out.push(u8::from(*b)),
        Value::Str(s) => s.with(|text| write_str(out, text)),
        Value::List(l) => l.with(|items| {
            write_len(out, items.len());
            for item in items {
                write_value(out, item);
            }
        }),
        Value::Map(m) => m.with(|entries| {
            write_len(out, entries.len());
            for (key, item) in entries {
                write_value(out, &key.to_value());
                write_value(out, item);
            }
        }),
    }
}

fn write_code(out: &mut Vec<u8>, code: &Code) {
    out.extend_from_slice(&code.max_locals.to_le_bytes());
    out.extend_from_slice(&code.max_stack.to_le_bytes());
    write_len(out, code.constants.len());
    for constant in &code.constants {
        write_value(out, constant);
    }
    write_len(out, code.instructions.len());
    for instruction in &code.instructions {
        instruction.encode(out);
    }
    write_len(out, code.switch_tables.len());
    for table in &code.switch_tables {
        write_len(out, table.keys.len());
        for key in &table.keys {
            out.extend_from_slice(&key.to_le_bytes());
        }
        write_len(out, table.targets.len());
        for target in &table.targets {
            write_u32(out, *target);
        }
        write_u32(out, table.default);
    }
    write_len(out, code.lines.len());
    for entry in &code.lines {
        write_u32(out, entry.start_cp);
        write_u32(out, entry.line);
    }
}

fn write_module(out: &mut Vec<u8>, module: &Module) {
    write_len(out, module.functions.len());
    for function in &module.functions {
        write_str(out, &function.name);
        write_str(out, &function.module);
        out.push(function.min_argc);
        out.push(function.max_argc);
        write_len(out, function.params.len());
        for param in &function.params {
            write_str(out, param);
        }
        write_len(out, function.defaults.len());
        for default in &function.defaults {
            write_value(out, default);
        }
        match &function.kind {
            FunctionKind::Native => out.push(KIND_NATIVE),
            FunctionKind::Bytecode(code) => {
                out.push(KIND_BYTECODE);
                write_code(out, code);
            }
        }
    }
    write_len(out, module.globals.len());
    for (name, value) in &module.globals {
        write_str(out, name);
        write_value(out, value);
    }
    match module.entry {
        Some(entry) => {
            out.push(1);
            out.extend_from_slice(&entry.to_le_bytes());
        }
        None => out.push(0),
    }
}

/// Cursor over the encoded bytes. Offsets in errors are absolute.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(DecodeError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.array().map(u32::from_le_bytes)
    }

    /// Sequence length. Every element takes at least one byte, so a length
    /// beyond the remaining input is truncation, not an allocation request.
    fn len(&mut self) -> Result<usize, DecodeError> {
        let offset = self.pos;
        let n = self.u32()? as usize;
        if n > self.bytes.len() - self.pos {
            return Err(DecodeError::UnexpectedEof { offset });
        }
        Ok(n)
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let n = self.len()?;
        let offset = self.pos;
        let raw = self.take(n)?;
        String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    fn value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        let offset = self.pos;
        if depth > MAX_VALUE_DEPTH {
            return Err(DecodeError::NestingTooDeep { offset });
        }
        let value = match TypeTag::try_from(self.u8()?)? {
            TypeTag::Undefined => Value::Undefined,
            TypeTag::Null => Value::Null,
            TypeTag::Int => Value::Int(self.array().map(i64::from_le_bytes)?),
            TypeTag::Float => Value::Float(f64::from_bits(self.array().map(u64::from_le_bytes)?)),
            TypeTag::Bool => Value::Bool(self.u8()? != 0),
            TypeTag::Str => Value::string(self.string()?),
            TypeTag::List => {
                let n = self.len()?;
                let items = (0..n)
                    .map(|_| self.value(depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::list(items)
            }
            TypeTag::Map => {
                let n = self.len()?;
                let mut entries = Vec::new();
                for _ in 0..n {
                    let key_offset = self.pos;
                    let key = MapKey::from_value(&self.value(depth + 1)?)
                        .map_err(|_| DecodeError::InvalidMapKey { offset: key_offset })?;
                    entries.push((key, self.value(depth + 1)?));
                }
                Value::map(entries)
            }
        };
        Ok(value)
    }

    fn values(&mut self) -> Result<Vec<Value>, DecodeError> {
        let n = self.len()?;
        (0..n).map(|_| self.value(0)).collect()
    }

    fn code(&mut self) -> Result<Code, DecodeError> {
        let max_locals = self.u16()?;
        let max_stack = self.u16()?;
        let constants = self.values()?;

        let n = self.len()?;
        let mut instructions = Vec::new();
        for _ in 0..n {
            let (instruction, end) = Instruction::decode(self.bytes, self.pos)?;
            self.pos = end;
            instructions.push(instruction);
        }

        let n = self.len()?;
        let mut switch_tables = Vec::new();
        for _ in 0..n {
            let keys = (0..self.len()?)
                .map(|_| self.u16())
                .collect::<Result<Vec<_>, _>>()?;
            let targets = (0..self.len()?)
                .map(|_| self.u32())
                .collect::<Result<Vec<_>, _>>()?;
            let default = self.u32()?;
            switch_tables.push(SwitchTable {
                keys,
                targets,
                default,
            });
        }

        let n = self.len()?;
        let mut lines = Vec::new();
        for _ in 0..n {
            lines.push(LineEntry {
                start_cp: self.u32()?,
                line: self.u32()?,
            });
        }

        Ok(Code {
            instructions,
            constants,
            switch_tables,
            max_locals,
            max_stack,
            lines,
        })
    }

    fn function(&mut self) -> Result<Function, DecodeError> {
        let name = self.string()?;
        let module = self.string()?;
        let min_argc = self.u8()?;
        let max_argc = self.u8()?;
        let params = (0..self.len()?)
            .map(|_| self.string())
            .collect::<Result<Vec<_>, _>>()?;
        let defaults = self.values()?;
        let kind = match self.u8()? {
            KIND_NATIVE => FunctionKind::Native,
            KIND_BYTECODE => FunctionKind::Bytecode(self.code()?),
            other => return Err(DecodeError::InvalidFunctionKind(other)),
        };
        Ok(Function {
            name,
            module,
            min_argc,
            max_argc,
            params,
            defaults,
            kind,
        })
    }

    fn module(&mut self) -> Result<Module, DecodeError> {
        let functions = (0..self.len()?)
            .map(|_| self.function())
            .collect::<Result<Vec<_>, _>>()?;
        let n = self.len()?;
        let mut globals = Vec::new();
        for _ in 0..n {
            let name = self.string()?;
            globals.push((name, self.value(0)?));
        }
        let entry = match self.u8()? {
            0 => None,
            _ => Some(self.u16()?),
        };
        Ok(Module {
            functions,
            globals,
            entry,
        })
    }
}
