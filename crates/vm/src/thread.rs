//! Script threads and the call protocol.
//!
//! A [`Thread`] owns a slot vector and a frame stack and runs one
//! activation at a time. Natives may re-enter it through
//! [`Thread::call_and_wait`]; each re-entry runs until the frame it pushed
//! returns, then hands control back to the native.
//!
//! ```text
//! Unstarted -> Calling -> Running <-> Calling/Returning -> Halted
//!                                \-> Crashed
//! ```

use crate::error::{RuntimeError, TraceEntry, VmError};
use crate::execute::{self, Flow};
use crate::frame::{Frame, FrameMemory, ReturnDest};
use crate::native::{Interrupter, NativeCall, NativeFn};
use crate::program::Program;
use crate::VmConfig;
use brisk_common::{Code, Function, FunctionId, FunctionKind, Value};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, trace};

/// Lifecycle of a [`Thread`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Never called.
    Unstarted,
    /// Executing bytecode.
    Running,
    /// Transferring control to a callee.
    Calling,
    /// Transferring a result back to a caller.
    Returning,
    /// The last activation ended in an error.
    Crashed,
    /// The last activation finished, or `Halt` stopped the thread.
    Halted,
}

/// Why an activation stopped early.
pub(crate) enum Failure {
    Runtime(RuntimeError),
    /// An error from a nested activation, already traced.
    Rethrown(VmError),
}

impl From<RuntimeError> for Failure {
    fn from(err: RuntimeError) -> Self {
        Failure::Runtime(err)
    }
}

/// One script thread.
pub struct Thread {
    program: Arc<Program>,
    config: VmConfig,
    state: ThreadState,
    slots: Vec<Value>,
    frames: Vec<Frame>,
    /// Host and native activations currently on the Rust stack.
    activations: usize,
    /// Set by an internal fault; the thread refuses further work.
    fault: Option<VmError>,
    interrupter: Interrupter,
}

impl Thread {
    pub fn new(program: Arc<Program>) -> Self {
        Self::with_config(program, VmConfig::default())
    }

    pub fn with_config(program: Arc<Program>, config: VmConfig) -> Self {
        Self {
            program,
            config,
            state: ThreadState::Unstarted,
            slots: Vec::new(),
            frames: Vec::new(),
            activations: 0,
            fault: None,
            interrupter: Interrupter::new(),
        }
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn config(&self) -> VmConfig {
        self.config
    }

    /// Handle that wakes this thread out of interruptible natives.
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    pub(crate) fn interrupter_ref(&self) -> &Interrupter {
        &self.interrupter
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True once an internal fault has been raised on this thread.
    pub fn is_poisoned(&self) -> bool {
        self.fault.is_some()
    }

    /// Live frames, innermost first, at most `limit` of them.
    pub fn stack_trace(&self, limit: Option<usize>) -> Vec<TraceEntry> {
        self.frames
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .map(|frame| {
                let function = self.program.function(frame.function);
                TraceEntry {
                    function: function
                        .map_or_else(|| format!("#{}", frame.function), |f| f.name.clone()),
                    module: function.map(|f| f.module.clone()).unwrap_or_default(),
                    line: function
                        .and_then(Function::code)
                        .and_then(|code| code.line_at(frame.last_cp())),
                }
            })
            .collect()
    }

    /// Call `function` with `args` and run until it returns.
    ///
    /// From the host this starts a fresh activation. From inside a native
    /// it pushes a frame on top of the running ones and returns when that
    /// frame does. If the callee halts the thread, the result is `null`
    /// and every enclosing activation stops as well.
    pub fn call_and_wait(
        &mut self,
        function: FunctionId,
        args: &[Value],
    ) -> Result<Value, VmError> {
        if let Some(fault) = &self.fault {
            return Err(fault.clone());
        }
        let nested = self.activations > 0;
        if nested && self.state == ThreadState::Halted {
            return Ok(Value::Null);
        }
        if !nested {
            self.frames.clear();
            self.slots.clear();
            debug!(function, argc = args.len(), "activation start");
        }

        let base = self.frames.len();
        self.activations += 1;
        self.state = ThreadState::Calling;
        let outcome = match self.invoke(function, args.to_vec(), ReturnDest::Host) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => self.run_until(base),
            Err(failure) => Err(failure),
        };
        self.activations -= 1;

        match outcome {
            Ok(value) => {
                if !nested {
                    self.state = ThreadState::Halted;
                    debug!(function, "activation finished");
                } else if self.state != ThreadState::Halted {
                    self.state = ThreadState::Running;
                }
                Ok(value)
            }
            Err(failure) => Err(self.crash(failure, base)),
        }
    }

    /// [`call_and_wait`](Self::call_and_wait) by plain or qualified name.
    pub fn call_by_name(&mut self, name: &str, args: &[Value]) -> Result<Value, VmError> {
        match self.program.find_function(name) {
            Some(id) => self.call_and_wait(id, args),
            None => Err(VmError::Crashed {
                error: RuntimeError::UndefinedFunction {
                    name: name.to_string(),
                },
                trace: self.stack_trace(None),
            }),
        }
    }

    /// Start a call. Natives run to completion and yield their result;
    /// bytecode functions get a frame and yield `None`.
    fn invoke(
        &mut self,
        id: FunctionId,
        args: Vec<Value>,
        dest: ReturnDest,
    ) -> Result<Option<Value>, Failure> {
        let program = Arc::clone(&self.program);
        let function = program
            .function(id)
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: format!("#{id}"),
            })?;
        if !function.accepts(args.len()) {
            return Err(RuntimeError::ArityMismatch {
                function: function.qualified_name(),
                min: function.min_argc,
                max: function.max_argc,
                argc: args.len(),
            }
            .into());
        }

        match &function.kind {
            FunctionKind::Native => {
                let native = program
                    .native(id)
                    .ok_or_else(|| RuntimeError::UndefinedFunction {
                        name: function.qualified_name(),
                    })?;
                self.call_native(id, function, native, args).map(Some)
            }
            FunctionKind::Bytecode(code) => {
                self.push_frame(id, function, code, args, dest)?;
                Ok(None)
            }
        }
    }

    fn call_native(
        &mut self,
        id: FunctionId,
        function: &Function,
        native: &NativeFn,
        mut args: Vec<Value>,
    ) -> Result<Value, Failure> {
        let argc = args.len();
        let omitted = argc - function.min_argc as usize;
        args.extend(function.defaults.iter().skip(omitted).map(Value::materialize));
        let name = function.qualified_name();
        trace!(native = %name, argc, "native call");

        let mut call = NativeCall::new(self, id, name, args, argc);
        let completed = (**native)(&mut call);
        let (result, failure, name) = call.finish();
        match failure {
            Some(failure) => Err(failure),
            None if completed => Ok(result),
            None => Err(RuntimeError::fault(format!(
                "native {name} failed without reporting an error"
            ))
            .into()),
        }
    }

    fn push_frame(
        &mut self,
        id: FunctionId,
        function: &Function,
        code: &Code,
        args: Vec<Value>,
        dest: ReturnDest,
    ) -> Result<(), RuntimeError> {
        let depth = self.frames.len();
        if depth >= self.config.max_frames {
            return Err(RuntimeError::StackOverflow { depth });
        }
        let base = self.slots.len();
        let limit = base + code.frame_size();
        if limit > self.config.max_slots {
            return Err(RuntimeError::StackOverflow { depth });
        }
        let locals = code.max_locals as usize;
        let params = function.max_argc as usize;
        if locals < params {
            return Err(RuntimeError::fault(format!(
                "{} declares {params} parameters but {locals} locals",
                function.qualified_name()
            )));
        }

        self.slots.resize(limit, Value::Undefined);
        let argc = args.len();
        for (slot, value) in self.slots[base..].iter_mut().zip(args) {
            *slot = value;
        }
        let omitted = argc - function.min_argc as usize;
        for (slot, default) in (argc..params).zip(function.defaults.iter().skip(omitted)) {
            self.slots[base + slot] = default.materialize();
        }

        self.frames.push(Frame {
            function: id,
            base,
            locals,
            limit,
            tos: base + locals,
            cp: 0,
            dest,
        });
        trace!(function = id, depth = depth + 1, "frame push");
        Ok(())
    }

    /// Drive frames until the one at index `base` returns.
    fn run_until(&mut self, base: usize) -> Result<Value, Failure> {
        loop {
            self.state = ThreadState::Running;
            match self.run_frame()? {
                Flow::Call {
                    function,
                    argc,
                    keep,
                } => {
                    self.state = ThreadState::Calling;
                    let args = self.pop_args(argc as usize)?;
                    let dest = if keep {
                        ReturnDest::Push
                    } else {
                        ReturnDest::Discard
                    };
                    if let Some(value) = self.invoke(function, args, dest)? {
                        if let Some(fault) = &self.fault {
                            return Err(Failure::Rethrown(fault.clone()));
                        }
                        if self.state == ThreadState::Halted {
                            self.unwind(base);
                            return Ok(Value::Null);
                        }
                        self.deliver(value, dest)?;
                    }
                }
                Flow::Return(value) => {
                    if let Some(value) = self.pop_frame(value, base)? {
                        return Ok(value);
                    }
                }
                Flow::Leave => {
                    if let Some(value) = self.pop_frame(Value::Null, base)? {
                        return Ok(value);
                    }
                }
                Flow::Halt => {
                    self.state = ThreadState::Halted;
                    debug!(depth = self.frames.len(), "halt");
                    self.unwind(base);
                    return Ok(Value::Null);
                }
                Flow::Next | Flow::Jump(_) => {
                    let fault = RuntimeError::fault("dispatch loop stopped on a local transfer");
                    return Err(fault.into());
                }
            }
        }
    }

    /// Run the innermost frame until it calls, returns, or halts.
    fn run_frame(&mut self) -> Result<Flow, RuntimeError> {
        let program = Arc::clone(&self.program);
        let Thread { frames, slots, .. } = self;
        let frame = frames
            .last_mut()
            .ok_or_else(|| RuntimeError::fault("no active frame"))?;
        let code = program
            .function(frame.function)
            .and_then(Function::code)
            .ok_or_else(|| RuntimeError::fault("active frame has no bytecode"))?;

        let mut memory = FrameMemory::new(
            &mut slots[frame.base..frame.limit],
            frame.locals,
            frame.tos - frame.base,
        );
        let mut cp = frame.cp;
        let result = loop {
            let Some(&insn) = code.instructions.get(cp) else {
                break Err(RuntimeError::fault(format!(
                    "code pointer {cp} past end of function"
                )));
            };
            cp += 1;
            if !memory.fits(&insn) {
                break Err(RuntimeError::fault(format!(
                    "{insn} does not fit the operand stack"
                )));
            }
            match execute::step(insn, &mut memory, code, &program) {
                Ok(Flow::Next) => {}
                Ok(Flow::Jump(target)) => cp = target,
                other => break other,
            }
        };
        frame.tos = frame.base + memory.tos();
        frame.cp = cp;
        result
    }

    /// Move the top `argc` cells of the current frame out as call arguments.
    fn pop_args(&mut self, argc: usize) -> Result<Vec<Value>, RuntimeError> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| RuntimeError::fault("call with no active frame"))?;
        let start = frame
            .tos
            .checked_sub(argc)
            .filter(|&start| start >= frame.base + frame.locals)
            .ok_or_else(|| RuntimeError::fault("call arguments underflow the operand stack"))?;
        let args = self.slots[start..frame.tos]
            .iter_mut()
            .map(std::mem::take)
            .collect();
        frame.tos = start;
        Ok(args)
    }

    /// Pop the innermost frame. Yields the value once the activation that
    /// started at `base` is done; otherwise delivers it to the caller.
    fn pop_frame(&mut self, value: Value, base: usize) -> Result<Option<Value>, RuntimeError> {
        self.state = ThreadState::Returning;
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| RuntimeError::fault("return with no active frame"))?;
        self.slots.truncate(frame.base);
        trace!(function = frame.function, depth = self.frames.len(), "frame pop");
        if self.frames.len() <= base {
            return Ok(Some(value));
        }
        self.deliver(value, frame.dest)?;
        Ok(None)
    }

    fn deliver(&mut self, value: Value, dest: ReturnDest) -> Result<(), RuntimeError> {
        match dest {
            ReturnDest::Push => {
                let frame = self
                    .frames
                    .last_mut()
                    .ok_or_else(|| RuntimeError::fault("result with no caller frame"))?;
                if frame.tos >= frame.limit {
                    return Err(RuntimeError::fault("call result overflows the caller's stack"));
                }
                self.slots[frame.tos] = value;
                frame.tos += 1;
                Ok(())
            }
            ReturnDest::Discard | ReturnDest::Host => Ok(()),
        }
    }

    /// Drop the frames pushed by the activation that started at `base`.
    fn unwind(&mut self, base: usize) {
        if let Some(frame) = self.frames.get(base) {
            self.slots.truncate(frame.base);
        }
        self.frames.truncate(base);
    }

    fn location(&self) -> (String, usize) {
        self.frames
            .last()
            .map(|frame| {
                let name = self
                    .program
                    .function(frame.function)
                    .map_or_else(|| format!("#{}", frame.function), Function::qualified_name);
                (name, frame.last_cp())
            })
            .unwrap_or_else(|| ("<host>".to_string(), 0))
    }

    /// Turn a failure into the host-facing error, record the crash, and
    /// unwind the failed activation.
    fn crash(&mut self, failure: Failure, base: usize) -> VmError {
        let error = match failure {
            Failure::Rethrown(error) => error,
            Failure::Runtime(RuntimeError::InternalFault { detail }) => {
                let (function, cp) = self.location();
                let error = VmError::InternalFault {
                    function,
                    cp,
                    detail,
                };
                self.fault = Some(error.clone());
                error
            }
            Failure::Runtime(error) => VmError::Crashed {
                error,
                trace: self.stack_trace(None),
            },
        };
        debug!(%error, depth = self.frames.len(), "thread crashed");
        self.state = ThreadState::Crashed;
        self.unwind(base);
        error
    }
}

/// A script thread running on its own OS thread.
pub struct ScriptThread {
    handle: JoinHandle<Result<Value, VmError>>,
    interrupter: Interrupter,
}

impl ScriptThread {
    pub fn interrupter(&self) -> Interrupter {
        self.interrupter.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread's result.
    pub fn join(self) -> Result<Value, VmError> {
        self.handle.join().unwrap_or_else(|_| {
            Err(VmError::InternalFault {
                function: "<host>".to_string(),
                cp: 0,
                detail: "script thread panicked".to_string(),
            })
        })
    }
}

/// Run `function` on a new OS thread. Containers passed in `args` stay
/// shared with the caller.
pub fn spawn(program: Arc<Program>, function: FunctionId, args: Vec<Value>) -> ScriptThread {
    spawn_with_config(program, VmConfig::default(), function, args)
}

pub fn spawn_with_config(
    program: Arc<Program>,
    config: VmConfig,
    function: FunctionId,
    args: Vec<Value>,
) -> ScriptThread {
    let mut thread = Thread::with_config(program, config);
    let interrupter = thread.interrupter();
    let handle = std::thread::spawn(move || thread.call_and_wait(function, &args));
    ScriptThread {
        handle,
        interrupter,
    }
}
