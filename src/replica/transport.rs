use crate::commitlog::{ClusterId, LogEntry, LogId, TermId};
use crate::grpc::grpc_raftex_client::GrpcRaftexClient;
use crate::grpc::{
    ProtoAppendLogRequest, ProtoAppendLogResponse, ProtoAskForVoteRequest, ProtoAskForVoteResponse, ProtoLogEntry,
};
use crate::replica::{
    AppendLogRequest, AppendLogResponse, AskForVoteRequest, AskForVoteResponse, ErrorCode, HostAddr,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid peer address: {0}")]
    InvalidUri(String),
    #[error("Failed to connect to peer")]
    Connect(#[from] tonic::transport::Error),
    #[error("RPC failed: {0}")]
    Status(#[from] tonic::Status),
    #[error("RPC timed out")]
    Timeout,
    #[error("Malformed message: {0}")]
    Malformed(String),
    #[error("Peer {0} unreachable")]
    Unreachable(HostAddr),
}

/// Sends Raft RPCs to peers. Injected into every replication host of a partition.
#[async_trait::async_trait]
pub trait RaftTransport: Send + Sync {
    async fn ask_for_vote(
        &self,
        peer: &HostAddr,
        request: AskForVoteRequest,
    ) -> Result<AskForVoteResponse, TransportError>;

    async fn append_log(&self, peer: &HostAddr, request: AppendLogRequest)
        -> Result<AppendLogResponse, TransportError>;
}

/// RaftTransport over tonic gRPC. One lazily created client per peer, dropped on failure so the
/// next call reconnects.
pub struct GrpcTransport {
    logger: slog::Logger,
    rpc_timeout: Duration,
    clients: Mutex<HashMap<HostAddr, GrpcRaftexClient<Channel>>>,
}

impl GrpcTransport {
    pub fn new(logger: slog::Logger, rpc_timeout: Duration) -> Self {
        GrpcTransport {
            logger,
            rpc_timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    async fn client(&self, peer: &HostAddr) -> Result<GrpcRaftexClient<Channel>, TransportError> {
        let cached = self.clients.lock().get(peer).cloned();
        if let Some(client) = cached {
            return Ok(client);
        }

        let url = format!("http://{}", peer);
        slog::debug!(self.logger, "Connecting to {} ...", url);
        let endpoint = Endpoint::from_shared(url).map_err(|e| TransportError::InvalidUri(e.to_string()))?;
        let channel = tokio::time::timeout(self.rpc_timeout, endpoint.connect())
            .await
            .map_err(|_| TransportError::Timeout)??;

        let client = GrpcRaftexClient::new(channel);
        self.clients.lock().insert(*peer, client.clone());
        Ok(client)
    }

    fn evict(&self, peer: &HostAddr) {
        self.clients.lock().remove(peer);
    }

    fn on_result<T>(&self, peer: &HostAddr, result: Result<T, TransportError>) -> Result<T, TransportError> {
        if let Err(e) = &result {
            slog::debug!(self.logger, "ClientWire - {} failed: {}", peer, e);
            self.evict(peer);
        }
        result
    }

    async fn try_ask_for_vote(
        &self,
        peer: &HostAddr,
        request: AskForVoteRequest,
    ) -> Result<AskForVoteResponse, TransportError> {
        let mut client = self.client(peer).await?;
        let rpc_request = ask_for_vote_request_to_proto(request);
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);

        let rpc_reply = tokio::time::timeout(self.rpc_timeout, client.ask_for_vote(rpc_request))
            .await
            .map_err(|_| TransportError::Timeout)??
            .into_inner();
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Ok(ask_for_vote_response_from_proto(rpc_reply))
    }

    async fn try_append_log(
        &self,
        peer: &HostAddr,
        request: AppendLogRequest,
    ) -> Result<AppendLogResponse, TransportError> {
        let mut client = self.client(peer).await?;
        let rpc_request = append_log_request_to_proto(request);

        let rpc_reply = tokio::time::timeout(self.rpc_timeout, client.append_log(rpc_request))
            .await
            .map_err(|_| TransportError::Timeout)??
            .into_inner();
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        append_log_response_from_proto(rpc_reply)
    }
}

#[async_trait::async_trait]
impl RaftTransport for GrpcTransport {
    async fn ask_for_vote(
        &self,
        peer: &HostAddr,
        request: AskForVoteRequest,
    ) -> Result<AskForVoteResponse, TransportError> {
        let result = self.try_ask_for_vote(peer, request).await;
        self.on_result(peer, result)
    }

    async fn append_log(
        &self,
        peer: &HostAddr,
        request: AppendLogRequest,
    ) -> Result<AppendLogResponse, TransportError> {
        let result = self.try_append_log(peer, request).await;
        self.on_result(peer, result)
    }
}

fn parse_addr(addr: &str) -> Result<HostAddr, TransportError> {
    addr.parse()
        .map_err(|_| TransportError::Malformed(format!("Bad address '{}'", addr)))
}

fn parse_optional_addr(addr: &str) -> Result<Option<HostAddr>, TransportError> {
    match addr {
        "" => Ok(None),
        addr => parse_addr(addr).map(Some),
    }
}

pub(crate) fn ask_for_vote_request_to_proto(request: AskForVoteRequest) -> ProtoAskForVoteRequest {
    ProtoAskForVoteRequest {
        space: request.space,
        part: request.part,
        candidate_addr: request.candidate_addr.to_string(),
        term: request.term.as_u64(),
        last_log_id: request.last_log_id.as_u64(),
        last_log_term: request.last_log_term.as_u64(),
    }
}

pub(crate) fn ask_for_vote_request_from_proto(
    rpc_request: ProtoAskForVoteRequest,
) -> Result<AskForVoteRequest, TransportError> {
    Ok(AskForVoteRequest {
        space: rpc_request.space,
        part: rpc_request.part,
        candidate_addr: parse_addr(&rpc_request.candidate_addr)?,
        term: TermId::new(rpc_request.term),
        last_log_id: LogId::new(rpc_request.last_log_id),
        last_log_term: TermId::new(rpc_request.last_log_term),
    })
}

pub(crate) fn ask_for_vote_response_to_proto(response: AskForVoteResponse) -> ProtoAskForVoteResponse {
    ProtoAskForVoteResponse {
        error_code: response.error_code.to_wire(),
        current_term: response.current_term.as_u64(),
    }
}

fn ask_for_vote_response_from_proto(rpc_reply: ProtoAskForVoteResponse) -> AskForVoteResponse {
    AskForVoteResponse {
        error_code: ErrorCode::from_wire(rpc_reply.error_code),
        current_term: TermId::new(rpc_reply.current_term),
    }
}

pub(crate) fn append_log_request_to_proto(request: AppendLogRequest) -> ProtoAppendLogRequest {
    ProtoAppendLogRequest {
        space: request.space,
        part: request.part,
        current_term: request.current_term.as_u64(),
        last_log_id: request.last_log_id.as_u64(),
        committed_log_id: request.committed_log_id.as_u64(),
        leader_addr: request.leader_addr.to_string(),
        last_log_term_sent: request.last_log_term_sent.as_u64(),
        last_log_id_sent: request.last_log_id_sent.as_u64(),
        log_term: request.log_term.as_u64(),
        entries: request
            .entries
            .into_iter()
            .map(|entry| ProtoLogEntry {
                cluster: entry.cluster.as_u64(),
                msg: entry.msg.to_vec(),
            })
            .collect(),
    }
}

pub(crate) fn append_log_request_from_proto(
    rpc_request: ProtoAppendLogRequest,
) -> Result<AppendLogRequest, TransportError> {
    if rpc_request.log_term == 0 && !rpc_request.entries.is_empty() {
        return Err(TransportError::Malformed("Entries without a log term".to_string()));
    }

    Ok(AppendLogRequest {
        space: rpc_request.space,
        part: rpc_request.part,
        current_term: TermId::new(rpc_request.current_term),
        last_log_id: LogId::new(rpc_request.last_log_id),
        committed_log_id: LogId::new(rpc_request.committed_log_id),
        leader_addr: parse_addr(&rpc_request.leader_addr)?,
        last_log_term_sent: TermId::new(rpc_request.last_log_term_sent),
        last_log_id_sent: LogId::new(rpc_request.last_log_id_sent),
        log_term: TermId::new(rpc_request.log_term),
        entries: rpc_request
            .entries
            .into_iter()
            .map(|entry| LogEntry {
                cluster: ClusterId::new(entry.cluster),
                msg: Bytes::from(entry.msg),
            })
            .collect(),
    })
}

pub(crate) fn append_log_response_to_proto(response: AppendLogResponse) -> ProtoAppendLogResponse {
    ProtoAppendLogResponse {
        error_code: response.error_code.to_wire(),
        current_term: response.current_term.as_u64(),
        leader_addr: response.leader_addr.map(|a| a.to_string()).unwrap_or_default(),
        committed_log_id: response.committed_log_id.as_u64(),
        last_log_id: response.last_log_id.as_u64(),
        last_log_term: response.last_log_term.as_u64(),
    }
}

fn append_log_response_from_proto(rpc_reply: ProtoAppendLogResponse) -> Result<AppendLogResponse, TransportError> {
    Ok(AppendLogResponse {
        error_code: ErrorCode::from_wire(rpc_reply.error_code),
        current_term: TermId::new(rpc_reply.current_term),
        leader_addr: parse_optional_addr(&rpc_reply.leader_addr)?,
        committed_log_id: LogId::new(rpc_reply.committed_log_id),
        last_log_id: LogId::new(rpc_reply.last_log_id),
        last_log_term: TermId::new(rpc_reply.last_log_term),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> HostAddr {
        HostAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn append_log_request_proto_conversion() {
        let request = AppendLogRequest {
            space: 1,
            part: 2,
            current_term: TermId::new(3),
            last_log_id: LogId::new(12),
            committed_log_id: LogId::new(9),
            leader_addr: addr(9780),
            last_log_term_sent: TermId::new(3),
            last_log_id_sent: LogId::new(10),
            log_term: TermId::new(3),
            entries: vec![
                LogEntry {
                    cluster: ClusterId::new(1),
                    msg: Bytes::from_static(b"a"),
                },
                LogEntry {
                    cluster: ClusterId::new(1),
                    msg: Bytes::from_static(b"b"),
                },
            ],
        };

        let proto = append_log_request_to_proto(request.clone());
        assert_eq!(proto.leader_addr, "127.0.0.1:9780");
        assert_eq!(proto.entries.len(), 2);

        assert_eq!(append_log_request_from_proto(proto).unwrap(), request);
    }

    #[test]
    fn entries_without_term_are_rejected() {
        let proto = ProtoAppendLogRequest {
            leader_addr: "127.0.0.1:1".to_string(),
            log_term: 0,
            entries: vec![ProtoLogEntry {
                cluster: 0,
                msg: vec![1],
            }],
            ..ProtoAppendLogRequest::default()
        };

        assert!(matches!(
            append_log_request_from_proto(proto),
            Err(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn empty_leader_addr_in_response() {
        let reply = ProtoAppendLogResponse {
            error_code: ErrorCode::LogGap.to_wire(),
            current_term: 4,
            leader_addr: String::new(),
            committed_log_id: 1,
            last_log_id: 2,
            last_log_term: 3,
        };

        let response = append_log_response_from_proto(reply).unwrap();

        assert_eq!(response.error_code, ErrorCode::LogGap);
        assert_eq!(response.leader_addr, None);
        assert_eq!(response.last_log_id, LogId::new(2));
    }

    #[test]
    fn bad_candidate_addr() {
        let proto = ProtoAskForVoteRequest {
            candidate_addr: "not-an-addr".to_string(),
            ..ProtoAskForVoteRequest::default()
        };

        assert!(ask_for_vote_request_from_proto(proto).is_err());
    }
}
