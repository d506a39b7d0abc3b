use crate::commitlog::{ClusterId, LogId, LogRecord, PreconditionError, TermId};
use bytes::Bytes;
use parking_lot::RwLock;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed bytes charged per entry on top of its payload.
pub const RECORD_OVERHEAD: usize = mem::size_of::<TermId>() + mem::size_of::<LogId>() + mem::size_of::<ClusterId>();

/// InMemoryLogBuffer stages the most recent entries of a partition's log before they reach disk.
///
/// The entry at position `i` has id `first_log_id + i`. Entries are never mutated or removed; a
/// buffer is only ever replaced as a whole (see [`InMemoryLogBuffer::truncated_copy`]).
///
/// A buffer is shared through `Arc` between the WAL that writes it and any number of readers.
/// Only the owning WAL calls [`InMemoryLogBuffer::push`], under its own writer lock.
pub struct InMemoryLogBuffer {
    first_log_id: LogId,
    inner: RwLock<BufferInner>,
    frozen: AtomicBool,
    rollover: AtomicBool,
}

#[derive(Default)]
struct BufferInner {
    logs: Vec<BufferedLog>,
    total_len: usize,
}

#[derive(Clone)]
struct BufferedLog {
    term: TermId,
    cluster: ClusterId,
    msg: Bytes,
}

impl InMemoryLogBuffer {
    pub fn new(first_log_id: LogId) -> Self {
        InMemoryLogBuffer {
            first_log_id,
            inner: RwLock::new(BufferInner::default()),
            frozen: AtomicBool::new(false),
            rollover: AtomicBool::new(false),
        }
    }

    /// Appends one entry and returns the id it was assigned.
    pub fn push(&self, term: TermId, cluster: ClusterId, msg: Bytes) -> Result<LogId, PreconditionError> {
        let mut inner = self.inner.write();
        if self.is_frozen() {
            return Err(PreconditionError::BufferFrozen);
        }

        inner.total_len += msg.len() + RECORD_OVERHEAD;
        inner.logs.push(BufferedLog { term, cluster, msg });

        Ok(self.first_log_id.plus(inner.logs.len() as u64 - 1))
    }

    /// Cumulative size in bytes, payloads plus per-entry overhead.
    pub fn size(&self) -> usize {
        self.inner.read().total_len
    }

    pub fn num_logs(&self) -> usize {
        self.inner.read().logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().logs.is_empty()
    }

    pub fn first_log_id(&self) -> LogId {
        self.first_log_id
    }

    /// `first_log_id + num_logs - 1`. An empty buffer reports the id right before its first.
    pub fn last_log_id(&self) -> LogId {
        let num_logs = self.inner.read().logs.len() as u64;
        match num_logs {
            0 => self.first_log_id.prev(),
            n => self.first_log_id.plus(n - 1),
        }
    }

    pub fn last_log_term(&self) -> Result<TermId, PreconditionError> {
        self.inner
            .read()
            .logs
            .last()
            .map(|log| log.term)
            .ok_or(PreconditionError::EmptyBuffer)
    }

    pub fn get_term(&self, idx: usize) -> Result<TermId, PreconditionError> {
        self.with_log(idx, |log| log.term)
    }

    pub fn get_cluster(&self, idx: usize) -> Result<ClusterId, PreconditionError> {
        self.with_log(idx, |log| log.cluster)
    }

    pub fn get_log(&self, idx: usize) -> Result<Bytes, PreconditionError> {
        self.with_log(idx, |log| log.msg.clone())
    }

    fn with_log<T>(&self, idx: usize, f: impl FnOnce(&BufferedLog) -> T) -> Result<T, PreconditionError> {
        let inner = self.inner.read();
        inner.logs.get(idx).map(f).ok_or(PreconditionError::IndexOutOfRange {
            index: idx,
            len: inner.logs.len(),
        })
    }

    /// Looks an entry up by log id. `None` if this buffer doesn't hold it.
    pub fn get_record(&self, id: LogId) -> Option<LogRecord> {
        let offset = id.as_u64().checked_sub(self.first_log_id.as_u64())?;
        let inner = self.inner.read();
        inner.logs.get(offset as usize).map(|log| LogRecord {
            id,
            term: log.term,
            cluster: log.cluster,
            msg: log.msg.clone(),
        })
    }

    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn rollover(&self) {
        self.rollover.store(true, Ordering::Release);
    }

    pub fn need_to_rollover(&self) -> bool {
        self.rollover.load(Ordering::Acquire)
    }

    /// Visits every entry in ascending id order while holding the read lock, so no push can
    /// interleave. Returns the `(last_log_id, last_log_term)` observed.
    pub fn access_all_logs<F>(&self, mut visitor: F) -> Result<(LogId, TermId), PreconditionError>
    where
        F: FnMut(LogId, TermId, ClusterId, &Bytes),
    {
        let inner = self.inner.read();
        let last = inner.logs.last().ok_or(PreconditionError::EmptyBuffer)?;

        let mut id = self.first_log_id;
        for log in inner.logs.iter() {
            visitor(id, log.term, log.cluster, &log.msg);
            id = id.next();
        }

        Ok((id.prev(), last.term))
    }

    /// New, writable buffer holding this buffer's entries up to and including `last_id`.
    pub fn truncated_copy(&self, last_id: LogId) -> InMemoryLogBuffer {
        let inner = self.inner.read();
        let keep = (self.first_log_id.distance_to(last_id.next()) as usize).min(inner.logs.len());

        let logs: Vec<BufferedLog> = inner.logs[..keep].to_vec();
        let total_len = logs.iter().map(|log| log.msg.len() + RECORD_OVERHEAD).sum();

        InMemoryLogBuffer {
            first_log_id: self.first_log_id,
            inner: RwLock::new(BufferInner { logs, total_len }),
            frozen: AtomicBool::new(false),
            rollover: AtomicBool::new(false),
        }
    }
}
