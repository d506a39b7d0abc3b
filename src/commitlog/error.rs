use crate::commitlog::LogId;
use std::io;
use std::path::PathBuf;

/// Misuse of the log layer by calling code.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum PreconditionError {
    #[error("Buffer is empty")]
    EmptyBuffer,
    #[error("Index {index} out of range for buffer with {len} logs")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Accessed an invalid log iterator")]
    InvalidIteratorAccess,
    #[error("Buffer is frozen")]
    BufferFrozen,
}

#[derive(Debug, thiserror::Error)]
pub enum WalError {
    #[error("WAL IO failure")]
    Io(#[from] io::Error),
    #[error("Corrupt WAL file {path:?}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },
    #[error("Appending log {attempted:?} does not follow last log {last:?}")]
    NonContiguous { last: LogId, attempted: LogId },
    #[error("Cannot roll back to {target:?}, earliest retained log is {first:?}")]
    RollbackBeyondRetained { target: LogId, first: LogId },
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}
