#![forbid(unsafe_code)]

//! Elm-style runtime for the overlay.
//!
//! The program owns a [`Model`], feeds it messages, and executes the
//! [`Cmd`]s it returns. Execution is single-threaded and cooperative: a
//! [`Cmd::Task`] is not run when it is returned but queued, and only runs
//! when the host yields to it via [`Program::run_next_task`] or
//! [`Program::run_until_idle`]. That yield is the only suspension point, so
//! model state never needs a lock.
//!
//! # Example
//!
//! ```
//! use overlay_runtime::program::{Cmd, Model, Program};
//!
//! struct Counter {
//!     count: i32,
//! }
//!
//! enum Msg {
//!     Increment,
//!     Fetched(i32),
//! }
//!
//! impl Model for Counter {
//!     type Message = Msg;
//!     type View = i32;
//!
//!     fn update(&mut self, msg: Msg) -> Cmd<Msg> {
//!         match msg {
//!             Msg::Increment => Cmd::task(|| Msg::Fetched(41)),
//!             Msg::Fetched(v) => {
//!                 self.count = v + 1;
//!                 Cmd::none()
//!             }
//!         }
//!     }
//!
//!     fn view(&self) -> i32 {
//!         self.count
//!     }
//! }
//!
//! let mut program = Program::new(Counter { count: 0 });
//! program.send(Msg::Increment);
//! assert_eq!(program.view(), 0);
//! program.run_until_idle();
//! assert_eq!(program.view(), 42);
//! ```

use std::collections::VecDeque;
use std::fmt;

use crate::effect_system::trace_command_effect;

/// The Model trait defines application state and behavior.
pub trait Model: Sized {
    /// Messages that drive state transitions.
    type Message: Send + 'static;

    /// What [`Model::view`] produces for the presentation layer.
    type View;

    /// Startup commands. Called once by [`Program::init`].
    fn init(&mut self) -> Cmd<Self::Message> {
        Cmd::none()
    }

    /// Core state transition function.
    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message>;

    /// Project the current state for rendering.
    fn view(&self) -> Self::View;
}

/// Metadata attached to a queued task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSpec {
    name: Option<String>,
}

impl TaskSpec {
    /// Attach a name used in logs and by test drivers.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Task name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

type TaskFn<M> = Box<dyn FnOnce() -> M + Send>;

/// Commands represent side effects to be executed by the runtime.
pub enum Cmd<M> {
    /// No operation.
    None,
    /// Stop the program. Queued tasks are no longer run.
    Quit,
    /// Execute multiple commands.
    Batch(Vec<Cmd<M>>),
    /// Execute commands in order.
    Sequence(Vec<Cmd<M>>),
    /// Send a message to the model.
    Msg(M),
    /// Deferred work whose result is fed back as a message.
    Task(TaskSpec, TaskFn<M>),
    /// Emit a log line.
    Log(String),
}

impl<M> Cmd<M> {
    /// Create a no-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Create a quit command.
    #[inline]
    pub fn quit() -> Self {
        Self::Quit
    }

    /// Create a message command.
    #[inline]
    pub fn msg(m: M) -> Self {
        Self::Msg(m)
    }

    /// Create a log command.
    #[inline]
    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Create an unnamed task.
    pub fn task<F>(f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(TaskSpec::default(), Box::new(f))
    }

    /// Create a task with a spec.
    pub fn task_with_spec<F>(spec: TaskSpec, f: F) -> Self
    where
        F: FnOnce() -> M + Send + 'static,
    {
        Self::Task(spec, Box::new(f))
    }

    /// Create a batch of commands.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Batch(cmds),
        }
    }

    /// Create a sequence of commands.
    pub fn sequence(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Sequence(cmds),
        }
    }

    /// Whether this is [`Cmd::None`].
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Variant name, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Quit => "Quit",
            Self::Batch(_) => "Batch",
            Self::Sequence(_) => "Sequence",
            Self::Msg(_) => "Msg",
            Self::Task(..) => "Task",
            Self::Log(_) => "Log",
        }
    }

    /// Number of tasks contained in this command tree.
    pub fn count_tasks(&self) -> usize {
        match self {
            Self::Task(..) => 1,
            Self::Batch(cmds) | Self::Sequence(cmds) => cmds.iter().map(Self::count_tasks).sum(),
            _ => 0,
        }
    }
}

impl<M> Default for Cmd<M> {
    fn default() -> Self {
        Self::None
    }
}

impl<M: fmt::Debug> fmt::Debug for Cmd<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Quit => f.write_str("Quit"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::Sequence(cmds) => f.debug_tuple("Sequence").field(cmds).finish(),
            Self::Msg(m) => f.debug_tuple("Msg").field(m).finish(),
            Self::Task(spec, _) => f.debug_tuple("Task").field(spec).finish(),
            Self::Log(text) => f.debug_tuple("Log").field(text).finish(),
        }
    }
}

/// A task waiting for the host to yield to it.
pub struct QueuedTask<M> {
    spec: TaskSpec,
    run: TaskFn<M>,
}

impl<M> QueuedTask<M> {
    /// The task's spec.
    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    /// Run the task to completion, producing its message.
    pub fn run(self) -> M {
        let name = self.spec.name().unwrap_or("task").to_string();
        trace_command_effect(&name, self.run)
    }
}

impl<M> fmt::Debug for QueuedTask<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedTask")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Log lines kept by a [`Program`]. Older lines are dropped first.
pub const LOG_CAPACITY: usize = 256;

/// The cooperative program runtime.
pub struct Program<M: Model> {
    model: M,
    tasks: VecDeque<QueuedTask<M::Message>>,
    logs: Vec<String>,
    running: bool,
}

impl<M: Model> Program<M> {
    /// Wrap a model. [`Model::init`] is not called until [`Program::init`].
    pub fn new(model: M) -> Self {
        Self {
            model,
            tasks: VecDeque::new(),
            logs: Vec::new(),
            running: true,
        }
    }

    /// Run the model's startup commands.
    pub fn init(&mut self) {
        let cmd = self.model.init();
        self.execute_cmd(cmd);
    }

    /// Deliver a message and execute the resulting commands.
    pub fn send(&mut self, msg: M::Message) {
        if !self.running {
            return;
        }
        let cmd = self.model.update(msg);
        self.execute_cmd(cmd);
    }

    /// Yield to the oldest queued task, if any. Returns whether one ran.
    pub fn run_next_task(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match self.tasks.pop_front() {
            Some(task) => {
                let msg = task.run();
                self.send(msg);
                true
            }
            None => false,
        }
    }

    /// Yield until no tasks remain or the program quits.
    ///
    /// Returns the number of tasks that ran.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while self.run_next_task() {
            ran += 1;
        }
        ran
    }

    /// Specs of the tasks waiting to run, oldest first.
    pub fn pending_tasks(&self) -> impl Iterator<Item = &TaskSpec> {
        self.tasks.iter().map(QueuedTask::spec)
    }

    /// Number of queued tasks.
    pub fn pending_count(&self) -> usize {
        self.tasks.len()
    }

    /// Remove a queued task without running it.
    ///
    /// Test drivers use this to complete tasks out of order or to simulate
    /// work that never finishes.
    pub fn take_task(&mut self, index: usize) -> Option<QueuedTask<M::Message>> {
        self.tasks.remove(index)
    }

    /// Current view of the model.
    pub fn view(&self) -> M::View {
        self.model.view()
    }

    /// Get a reference to the model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Get a mutable reference to the model.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// The most recent log lines emitted through [`Cmd::Log`], at most
    /// [`LOG_CAPACITY`].
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Take the buffered log lines, leaving the buffer empty.
    pub fn drain_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }

    /// Check if the program is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Request a quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    fn execute_cmd(&mut self, cmd: Cmd<M::Message>) {
        match cmd {
            Cmd::None => {}
            Cmd::Quit => self.running = false,
            Cmd::Msg(m) => self.send(m),
            Cmd::Batch(cmds) | Cmd::Sequence(cmds) => {
                for c in cmds {
                    self.execute_cmd(c);
                }
            }
            Cmd::Task(spec, run) => {
                tracing::trace!(
                    target: "overlay.effect",
                    task = spec.name().unwrap_or("task"),
                    queued = self.tasks.len() + 1,
                    "task queued"
                );
                self.tasks.push_back(QueuedTask { spec, run });
            }
            Cmd::Log(text) => {
                tracing::info!(target: "overlay.log", "{text}");
                if self.logs.len() == LOG_CAPACITY {
                    self.logs.remove(0);
                }
                self.logs.push(text);
            }
        }
    }
}
