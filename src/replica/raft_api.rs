use crate::commitlog::{LogEntry, LogId, TermId, WalError};
use std::net::SocketAddr;
use std::sync::Arc;

pub type HostAddr = SocketAddr;
pub type SpaceId = u32;
pub type PartId = u32;

/// Outcome of a replication RPC. Anything other than `Succeeded` is a normal, recoverable
/// protocol condition that the caller decides how to handle.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    Succeeded,
    LogGap,
    LogStale,
    TermOutOfDate,
    NotALeader,
    HostStopped,
    TooManyRequests,
    Exception,
    NotReady,
    BadState,
    WalFail,
    WrongLeader,
    UnknownPart,
}

impl ErrorCode {
    pub fn to_wire(self) -> i32 {
        match self {
            ErrorCode::Succeeded => 0,
            ErrorCode::LogGap => 1,
            ErrorCode::LogStale => 2,
            ErrorCode::TermOutOfDate => 3,
            ErrorCode::NotALeader => 4,
            ErrorCode::HostStopped => 5,
            ErrorCode::TooManyRequests => 6,
            ErrorCode::Exception => 7,
            ErrorCode::NotReady => 8,
            ErrorCode::BadState => 9,
            ErrorCode::WalFail => 10,
            ErrorCode::WrongLeader => 11,
            ErrorCode::UnknownPart => 12,
        }
    }

    /// Unknown codes from a newer peer are treated as `Exception`.
    pub fn from_wire(code: i32) -> Self {
        match code {
            0 => ErrorCode::Succeeded,
            1 => ErrorCode::LogGap,
            2 => ErrorCode::LogStale,
            3 => ErrorCode::TermOutOfDate,
            4 => ErrorCode::NotALeader,
            5 => ErrorCode::HostStopped,
            6 => ErrorCode::TooManyRequests,
            8 => ErrorCode::NotReady,
            9 => ErrorCode::BadState,
            10 => ErrorCode::WalFail,
            11 => ErrorCode::WrongLeader,
            12 => ErrorCode::UnknownPart,
            _ => ErrorCode::Exception,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AskForVoteRequest {
    pub space: SpaceId,
    pub part: PartId,
    pub candidate_addr: HostAddr,
    pub term: TermId,
    pub last_log_id: LogId,
    pub last_log_term: TermId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AskForVoteResponse {
    pub error_code: ErrorCode,
    pub current_term: TermId,
}

impl AskForVoteResponse {
    pub fn granted(&self) -> bool {
        self.error_code == ErrorCode::Succeeded
    }

    pub(crate) fn failed(error_code: ErrorCode) -> Self {
        AskForVoteResponse {
            error_code,
            current_term: TermId::default(),
        }
    }
}

/// Entries `[last_log_id_sent + 1, last_log_id_sent + entries.len()]`, all of `log_term`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppendLogRequest {
    pub space: SpaceId,
    pub part: PartId,
    pub current_term: TermId,
    /// Log id the leader wants the follower to reach.
    pub last_log_id: LogId,
    pub committed_log_id: LogId,
    pub leader_addr: HostAddr,
    pub last_log_term_sent: TermId,
    pub last_log_id_sent: LogId,
    /// 0 when the batch is empty.
    pub log_term: TermId,
    pub entries: Vec<LogEntry>,
}

impl AppendLogRequest {
    pub fn is_heartbeat(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_log_id(&self) -> LogId {
        self.last_log_id_sent.next()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppendLogResponse {
    pub error_code: ErrorCode,
    pub current_term: TermId,
    pub leader_addr: Option<HostAddr>,
    pub committed_log_id: LogId,
    pub last_log_id: LogId,
    pub last_log_term: TermId,
}

impl AppendLogResponse {
    pub(crate) fn failed(error_code: ErrorCode) -> Self {
        AppendLogResponse {
            error_code,
            current_term: TermId::default(),
            leader_addr: None,
            committed_log_id: LogId::default(),
            last_log_id: LogId::default(),
            last_log_term: TermId::default(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error_code == ErrorCode::Succeeded
    }
}

/// Why a client write through [`crate::RaftPart::append_async`] was not committed.
#[derive(Clone, Debug, thiserror::Error)]
pub enum AppendLogError {
    #[error("Not the leader, current leader is {leader:?}")]
    NotALeader { leader: Option<HostAddr> },
    #[error("Partition is stopped")]
    Stopped,
    #[error("Partition is not ready")]
    NotReady,
    #[error("Term changed from {attempted:?} to {current:?} while replicating")]
    TermOutOfDate { attempted: TermId, current: TermId },
    #[error("Only {acks} of the {quorum} peer acknowledgements needed were received")]
    NoQuorum { acks: usize, quorum: usize },
    #[error("Write buffer is full, slow down")]
    BufferOverflow,
    #[error("Atomic operation produced no log")]
    AtomicOpFailure,
    #[error("Failed to write WAL: {0}")]
    Wal(Arc<WalError>),
}

impl From<WalError> for AppendLogError {
    fn from(e: WalError) -> Self {
        AppendLogError::Wal(Arc::new(e))
    }
}
