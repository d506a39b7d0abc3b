mod api;
mod commitlog;
mod replica;
mod server;
mod grpc {
    include!("../generated/raftex.rs");
}

pub use api::try_create_raft_part;
pub use api::RaftOptions;
pub use api::RaftPartConfig;
pub use api::RaftPartCreationError;
pub use commitlog::ClusterId;
pub use commitlog::FileBasedWal;
pub use commitlog::InMemoryLogBuffer;
pub use commitlog::ListLogIterator;
pub use commitlog::LogEntry;
pub use commitlog::LogId;
pub use commitlog::LogIterator;
pub use commitlog::LogRecord;
pub use commitlog::PreconditionError;
pub use commitlog::RangeLogIterator;
pub use commitlog::TermId;
pub use commitlog::WalError;
pub use commitlog::WalFileInfo;
pub use commitlog::WalPolicy;
pub use commitlog::RECORD_OVERHEAD;
pub use replica::create_commit_stream;
pub use replica::AppendLogError;
pub use replica::AppendLogRequest;
pub use replica::AppendLogResponse;
pub use replica::AskForVoteRequest;
pub use replica::AskForVoteResponse;
pub use replica::AtomicOp;
pub use replica::CommitStream;
pub use replica::CommitStreamPublisher;
pub use replica::CommittedEntry;
pub use replica::ErrorCode;
pub use replica::GrpcTransport;
pub use replica::Host;
pub use replica::HostAddr;
pub use replica::HostOptions;
pub use replica::HostPosition;
pub use replica::PartContext;
pub use replica::PartId;
pub use replica::PartOptions;
pub use replica::PartStatus;
pub use replica::RaftPart;
pub use replica::RaftTransport;
pub use replica::RetryHandle;
pub use replica::RetryPolicy;
pub use replica::RetryStrategy;
pub use replica::Role;
pub use replica::SpaceId;
pub use replica::StateMachine;
pub use replica::TransportError;
pub use server::shutdown_signal;
pub use server::RpcServer;
pub use server::RpcServerShutdownHandle;
pub use server::RpcServerShutdownSignal;
