use crate::commitlog::{ClusterId, LogEntry, LogId, LogRecord, PreconditionError, RangeLogIterator, TermId};
use bytes::Bytes;

/// A forward-only cursor over `(LogId, TermId, ClusterId, msg)` positions in ascending id order.
///
/// Check [`LogIterator::valid`] before reading any field. Once the cursor moves past its last
/// position it stays invalid; build a new iterator to read again.
pub enum LogIterator {
    /// One term's worth of entries decoded from an append request.
    List(ListLogIterator),
    /// A `[start, last]` range of a WAL, spanning its files and in-memory buffers.
    Range(RangeLogIterator),
}

impl LogIterator {
    pub fn valid(&self) -> bool {
        match self {
            LogIterator::List(it) => it.valid(),
            LogIterator::Range(it) => it.valid(),
        }
    }

    pub fn advance(&mut self) {
        match self {
            LogIterator::List(it) => it.advance(),
            LogIterator::Range(it) => it.advance(),
        }
    }

    pub fn log_id(&self) -> Result<LogId, PreconditionError> {
        match self {
            LogIterator::List(it) => it.current_id(),
            LogIterator::Range(it) => it.current().map(|r| r.id),
        }
    }

    pub fn log_term(&self) -> Result<TermId, PreconditionError> {
        match self {
            LogIterator::List(it) => it.current_entry().map(|_| it.term),
            LogIterator::Range(it) => it.current().map(|r| r.term),
        }
    }

    pub fn log_source(&self) -> Result<ClusterId, PreconditionError> {
        match self {
            LogIterator::List(it) => it.current_entry().map(|e| e.cluster),
            LogIterator::Range(it) => it.current().map(|r| r.cluster),
        }
    }

    pub fn log_msg(&self) -> Result<&Bytes, PreconditionError> {
        match self {
            LogIterator::List(it) => it.current_entry().map(|e| &e.msg),
            LogIterator::Range(it) => it.current().map(|r| &r.msg),
        }
    }

    pub fn record(&self) -> Result<LogRecord, PreconditionError> {
        Ok(LogRecord {
            id: self.log_id()?,
            term: self.log_term()?,
            cluster: self.log_source()?,
            msg: self.log_msg()?.clone(),
        })
    }
}

impl From<ListLogIterator> for LogIterator {
    fn from(it: ListLogIterator) -> Self {
        LogIterator::List(it)
    }
}

impl From<RangeLogIterator> for LogIterator {
    fn from(it: RangeLogIterator) -> Self {
        LogIterator::Range(it)
    }
}

/// Entries of a single term with ids starting at `first_log_id`.
pub struct ListLogIterator {
    first_log_id: LogId,
    term: TermId,
    entries: Vec<LogEntry>,
    idx: usize,
}

impl ListLogIterator {
    pub fn new(first_log_id: LogId, term: TermId, entries: Vec<LogEntry>) -> Self {
        ListLogIterator {
            first_log_id,
            term,
            entries,
            idx: 0,
        }
    }

    fn valid(&self) -> bool {
        self.idx < self.entries.len()
    }

    fn advance(&mut self) {
        if self.valid() {
            self.idx += 1;
        }
    }

    fn current_entry(&self) -> Result<&LogEntry, PreconditionError> {
        self.entries
            .get(self.idx)
            .ok_or(PreconditionError::InvalidIteratorAccess)
    }

    fn current_id(&self) -> Result<LogId, PreconditionError> {
        self.current_entry()
            .map(|_| self.first_log_id.plus(self.idx as u64))
    }
}
