mod error;
mod iterator;
mod log_buffer;
mod types;
mod wal;

pub use error::PreconditionError;
pub use error::WalError;
pub use iterator::ListLogIterator;
pub use iterator::LogIterator;
pub use log_buffer::InMemoryLogBuffer;
pub use log_buffer::RECORD_OVERHEAD;
pub use types::ClusterId;
pub use types::LogEntry;
pub use types::LogId;
pub use types::LogRecord;
pub use types::TermId;
pub use wal::FileBasedWal;
pub use wal::RangeLogIterator;
pub use wal::WalFileInfo;
pub use wal::WalPolicy;
