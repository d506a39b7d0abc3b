use bytes::Bytes;
use std::fmt;

/// Position of an entry within a partition's replicated log.
///
/// `LogId(0)` never identifies a real entry. It stands for "nothing" in positions such as
/// "last log id sent" before anything was replicated.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LogId(u64);

impl LogId {
    pub const fn new(id: u64) -> Self {
        LogId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn plus(&self, n: u64) -> Self {
        LogId(self.0 + n)
    }

    pub fn next(&self) -> Self {
        self.plus(1)
    }

    /// Saturates at `LogId(0)`.
    pub fn prev(&self) -> Self {
        LogId(self.0.saturating_sub(1))
    }

    pub fn checked_minus(&self, n: u64) -> Option<Self> {
        self.0.checked_sub(n).map(LogId)
    }

    /// Number of ids in `[self, other)`. Returns 0 if `other <= self`.
    pub fn distance_to(&self, other: LogId) -> u64 {
        other.0.saturating_sub(self.0)
    }
}

impl fmt::Debug for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Leadership epoch.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TermId(u64);

impl TermId {
    pub const fn new(term: u64) -> Self {
        TermId(term)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn incr(&self) -> Self {
        TermId(self.0 + 1)
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cluster an entry originated from.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClusterId(u64);

impl ClusterId {
    pub const fn new(id: u64) -> Self {
        ClusterId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entry as carried on the wire. The id and term are implied by the batch it travels in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    pub cluster: ClusterId,
    pub msg: Bytes,
}

/// One fully materialised position of the log.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogRecord {
    pub id: LogId,
    pub term: TermId,
    pub cluster: ClusterId,
    pub msg: Bytes,
}
