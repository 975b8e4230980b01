//! Host-implemented functions.
//!
//! A native receives a [`NativeCall`]: the materialized argument buffer
//! plus an execution context through which it sets its result, reports
//! failures, and re-enters the interpreter. Returning `false` means the
//! call failed; the failure must have been recorded with
//! [`NativeCall::fail`] or [`NativeCall::rethrow`] first.

use crate::error::{RuntimeError, TraceEntry, VmError};
use crate::program::Program;
use crate::thread::{Failure, Thread};
use brisk_common::{FunctionId, Value};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A bound native function.
pub type NativeFn = Arc<dyn Fn(&mut NativeCall<'_>) -> bool + Send + Sync>;

/// Natives by qualified name (`module.name`).
#[derive(Clone, Default)]
pub struct NativeRegistry {
    natives: HashMap<String, NativeFn>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The helpers every program can rely on.
    pub fn core() -> Self {
        let mut registry = Self::new();
        registry.register("core.invoke", invoke);
        registry.register("core.sleep", sleep);
        registry.register("core.print", print);
        registry.register("core.stack_trace", stack_trace);
        registry
    }

    /// Bind `name`, replacing any previous binding.
    pub fn register<F>(&mut self, name: impl Into<String>, native: F)
    where
        F: Fn(&mut NativeCall<'_>) -> bool + Send + Sync + 'static,
    {
        self.natives.insert(name.into(), Arc::new(native));
    }

    pub fn get(&self, name: &str) -> Option<NativeFn> {
        self.natives.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.natives.contains_key(name)
    }
}

/// Execution context of one native invocation.
pub struct NativeCall<'a> {
    thread: &'a mut Thread,
    function: FunctionId,
    name: String,
    args: Vec<Value>,
    argc: usize,
    result: Value,
    failure: Option<Failure>,
}

impl<'a> NativeCall<'a> {
    pub(crate) fn new(
        thread: &'a mut Thread,
        function: FunctionId,
        name: String,
        args: Vec<Value>,
        argc: usize,
    ) -> Self {
        Self {
            thread,
            function,
            name,
            args,
            argc,
            result: Value::Null,
            failure: None,
        }
    }

    pub(crate) fn finish(self) -> (Value, Option<Failure>, String) {
        (self.result, self.failure, self.name)
    }

    /// Supplied arguments followed by defaults for the omitted ones.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Number of arguments the caller actually supplied.
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Qualified name of the native being run.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn program(&self) -> &Arc<Program> {
        self.thread.program()
    }

    pub fn set_return(&mut self, value: Value) {
        self.result = value;
    }

    /// Record a failure. Returns `false` so natives can `return call.fail(..)`.
    pub fn fail(&mut self, error: RuntimeError) -> bool {
        self.failure = Some(Failure::Runtime(error));
        false
    }

    /// Shorthand for a free-form [`RuntimeError::NativeFailure`].
    pub fn fail_with(&mut self, message: impl Into<String>) -> bool {
        let function = self.name.clone();
        self.fail(RuntimeError::NativeFailure {
            function,
            message: message.into(),
        })
    }

    /// Propagate an error from a re-entrant call unchanged, trace included.
    pub fn rethrow(&mut self, error: VmError) -> bool {
        self.failure = Some(Failure::Rethrown(error));
        false
    }

    /// Re-enter the interpreter; returns when the callee's frame returns.
    pub fn call(&mut self, function: FunctionId, args: &[Value]) -> Result<Value, VmError> {
        self.thread.call_and_wait(function, args)
    }

    pub fn call_by_name(&mut self, name: &str, args: &[Value]) -> Result<Value, VmError> {
        self.thread.call_by_name(name, args)
    }

    /// Frames of the calling script, innermost first.
    pub fn stack_trace(&self, limit: Option<usize>) -> Vec<TraceEntry> {
        self.thread.stack_trace(limit)
    }

    pub fn interrupter(&self) -> &Interrupter {
        self.thread.interrupter_ref()
    }
}

#[derive(Default)]
struct Signal {
    raised: Mutex<bool>,
    wake: Condvar,
}

/// Wakes a thread blocked in an interruptible native.
///
/// Interruption is coarse: it only affects natives that wait on it, such
/// as `core.sleep`. An interrupt stays pending until a wait consumes it.
#[derive(Clone, Default)]
pub struct Interrupter {
    signal: Arc<Signal>,
}

impl Interrupter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        *self.signal.raised.lock() = true;
        self.signal.wake.notify_all();
    }

    pub fn is_interrupted(&self) -> bool {
        *self.signal.raised.lock()
    }

    pub fn clear(&self) {
        *self.signal.raised.lock() = false;
    }

    /// Block for `duration`. Returns `false`, consuming the interrupt, if
    /// interrupted before the time is up.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        let mut raised = self.signal.raised.lock();
        while !*raised {
            match deadline {
                Some(deadline) => {
                    if self.signal.wake.wait_until(&mut raised, deadline).timed_out() {
                        break;
                    }
                }
                None => self.signal.wake.wait(&mut raised),
            }
        }
        if *raised {
            *raised = false;
            false
        } else {
            true
        }
    }
}

fn type_error(call: &mut NativeCall<'_>, expected: &str, found: Option<&Value>) -> bool {
    let found = found.map_or("nothing".to_string(), |v| v.type_tag().to_string());
    let message = format!("{} expects {expected}, found {found}", call.name());
    call.fail(RuntimeError::TypeError { message })
}

/// `core.invoke(name, args...)`: late-bound call by function name.
fn invoke(call: &mut NativeCall<'_>) -> bool {
    let name = match call.arg(0) {
        Some(Value::Str(name)) => name.snapshot(),
        other => {
            let other = other.cloned();
            return type_error(call, "a function name", other.as_ref());
        }
    };
    let args = call
        .args()
        .get(1..call.argc())
        .map(<[Value]>::to_vec)
        .unwrap_or_default();
    match call.call_by_name(&name, &args) {
        Ok(value) => {
            call.set_return(value);
            true
        }
        Err(error) => call.rethrow(error),
    }
}

/// `core.sleep(ms)`: blocks the host thread; interruptible.
fn sleep(call: &mut NativeCall<'_>) -> bool {
    let millis = match call.arg(0) {
        Some(Value::Int(ms)) if *ms >= 0 => *ms as u64,
        other => {
            let other = other.cloned();
            return type_error(call, "a non-negative int", other.as_ref());
        }
    };
    if call.interrupter().sleep(Duration::from_millis(millis)) {
        true
    } else {
        let function = call.name().to_string();
        call.fail(RuntimeError::InterruptedNative { function })
    }
}

/// `core.print(values...)`: space-separated line on stdout.
fn print(call: &mut NativeCall<'_>) -> bool {
    let line = call.args()[..call.argc()]
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");
    true
}

/// `core.stack_trace([limit])`: the caller's frames as strings.
fn stack_trace(call: &mut NativeCall<'_>) -> bool {
    let limit = match call.arg(0) {
        None | Some(Value::Null) => None,
        Some(Value::Int(n)) if *n >= 0 => Some(*n as usize),
        other => {
            let other = other.cloned();
            return type_error(call, "an optional non-negative int", other.as_ref());
        }
    };
    let lines = call
        .stack_trace(limit)
        .iter()
        .map(|entry| Value::string(entry.to_string()))
        .collect();
    call.set_return(Value::list(lines));
    true
}
