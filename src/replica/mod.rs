mod context;
mod host;
mod part;
mod raft_api;
mod retry;
mod state_machine;
mod stop_signal;
#[cfg(test)]
mod test_utils;
mod transport;

pub use context::PartContext;
pub use host::Host;
pub use host::HostOptions;
pub use host::HostPosition;
pub use part::AtomicOp;
pub use part::PartOptions;
pub use part::PartStatus;
pub use part::RaftPart;
pub use part::Role;
pub use raft_api::AppendLogError;
pub use raft_api::AppendLogRequest;
pub use raft_api::AppendLogResponse;
pub use raft_api::AskForVoteRequest;
pub use raft_api::AskForVoteResponse;
pub use raft_api::ErrorCode;
pub use raft_api::HostAddr;
pub use raft_api::PartId;
pub use raft_api::SpaceId;
pub use retry::RetryHandle;
pub use retry::RetryPolicy;
pub use retry::RetryStrategy;
pub use state_machine::create_commit_stream;
pub use state_machine::CommitStream;
pub use state_machine::CommitStreamPublisher;
pub use state_machine::CommittedEntry;
pub use state_machine::StateMachine;
pub use transport::GrpcTransport;
pub use transport::RaftTransport;
pub use transport::TransportError;

// So the RPC server can translate between wire and domain types.
pub(crate) use transport::append_log_request_from_proto;
pub(crate) use transport::append_log_response_to_proto;
pub(crate) use transport::ask_for_vote_request_from_proto;
pub(crate) use transport::ask_for_vote_response_to_proto;
