// src/errors.rs
//! Kernel error handling
//!
//! Context-carrying errors shared across the kernel. Every fallible boundary
//! (task creation, timer programming, trap classification) reports a typed
//! error instead of corrupting state or silently continuing.

use core::fmt;

/// Kernel Result type
pub type KernelResult<T> = Result<T, KernelError>;

/// Kernel error with optional context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelError {
    kind: ErrorKind,
    context: Option<&'static str>,
}

impl KernelError {
    /// Create a new error
    #[inline]
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind, context: None }
    }

    /// Create an error with context information
    #[inline]
    pub const fn with_context(kind: ErrorKind, ctx: &'static str) -> Self {
        Self { kind, context: Some(ctx) }
    }

    /// Get the error kind
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the context
    #[inline]
    pub const fn context(&self) -> Option<&'static str> {
        self.context
    }
}

/// Error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Task table error
    Task(TaskError),
    /// Timer programming error
    Timer(TimerError),
    /// Trap dispatch error
    Trap(TrapError),
}

/// Task table errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// Task id outside the fixed table capacity
    InvalidId,
    /// Slot already holds a live task
    SlotInUse,
    /// All task slots are populated
    TableFull,
}

/// Timer programming errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Requested frequency yields a divisor of 0 or one that does not fit
    /// in the PIT's 16-bit reload register
    DivisorOutOfRange,
}

/// Trap dispatch errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapError {
    /// Vector outside the hardware-IRQ and syscall ranges (a CPU exception
    /// or a stray software interrupt); the faulting context is resumed
    UnexpectedVector(u32),
}

impl From<TaskError> for KernelError {
    fn from(e: TaskError) -> Self {
        KernelError::new(ErrorKind::Task(e))
    }
}

impl From<TimerError> for KernelError {
    fn from(e: TimerError) -> Self {
        KernelError::new(ErrorKind::Timer(e))
    }
}

impl From<TrapError> for KernelError {
    fn from(e: TrapError) -> Self {
        KernelError::new(ErrorKind::Trap(e))
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::Task(e) => write!(f, "Task error: {:?}", e)?,
            ErrorKind::Timer(e) => write!(f, "Timer error: {:?}", e)?,
            ErrorKind::Trap(TrapError::UnexpectedVector(v)) => {
                write!(f, "Unexpected vector {}", v)?;
            }
        }
        if let Some(ctx) = self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}
