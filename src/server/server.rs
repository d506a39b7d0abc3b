use crate::grpc::grpc_raftex_server::{GrpcRaftex, GrpcRaftexServer};
use crate::grpc::{ProtoAppendLogRequest, ProtoAppendLogResponse, ProtoAskForVoteRequest, ProtoAskForVoteResponse};
use crate::replica::{
    append_log_request_from_proto, append_log_response_to_proto, ask_for_vote_request_from_proto,
    ask_for_vote_response_to_proto, AppendLogResponse, AskForVoteResponse, ErrorCode, PartId, RaftPart, SpaceId,
};
use crate::server::RpcServerShutdownSignal;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// RpcServer is the type that implements the Raftex gRPC interface. It serves every partition
/// registered with it, routing by `(space, part)`.
#[derive(Clone)]
pub struct RpcServer {
    logger: slog::Logger,
    parts: Arc<RwLock<HashMap<(SpaceId, PartId), Arc<RaftPart>>>>,
}

impl RpcServer {
    pub fn new(logger: slog::Logger) -> Self {
        RpcServer {
            logger,
            parts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_part(&self, part: Arc<RaftPart>) {
        let key = (part.ctx().space(), part.ctx().part());
        slog::info!(self.logger, "Serving partition {}", part.ctx().id_str());
        self.parts.write().insert(key, part);
    }

    pub fn unregister_part(&self, space: SpaceId, part: PartId) -> Option<Arc<RaftPart>> {
        self.parts.write().remove(&(space, part))
    }

    fn find_part(&self, space: SpaceId, part: PartId) -> Option<Arc<RaftPart>> {
        self.parts.read().get(&(space, part)).cloned()
    }

    pub async fn run(self, socket_addr: SocketAddr, shutdown_signal: RpcServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", socket_addr);

        let result = Server::builder()
            .add_service(GrpcRaftexServer::new(self))
            .serve_with_shutdown(socket_addr, shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    fn handle_ask_for_vote(&self, rpc_request: ProtoAskForVoteRequest) -> Result<ProtoAskForVoteResponse, Status> {
        let request =
            ask_for_vote_request_from_proto(rpc_request).map_err(|e| Status::invalid_argument(e.to_string()))?;

        let response = match self.find_part(request.space, request.part) {
            Some(part) => part.process_ask_for_vote_request(&request),
            None => AskForVoteResponse::failed(ErrorCode::UnknownPart),
        };
        Ok(ask_for_vote_response_to_proto(response))
    }

    fn handle_append_log(&self, rpc_request: ProtoAppendLogRequest) -> Result<ProtoAppendLogResponse, Status> {
        let request = append_log_request_from_proto(rpc_request).map_err(|e| Status::invalid_argument(e.to_string()))?;

        let response = match self.find_part(request.space, request.part) {
            Some(part) => part.process_append_log_request(request),
            None => AppendLogResponse::failed(ErrorCode::UnknownPart),
        };
        Ok(append_log_response_to_proto(response))
    }
}

#[async_trait::async_trait]
impl GrpcRaftex for RpcServer {
    async fn ask_for_vote(
        &self,
        rpc_request_wrapped: Request<ProtoAskForVoteRequest>,
    ) -> Result<Response<ProtoAskForVoteResponse>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let server = self.clone();
        let rpc_result = tokio::task::spawn_blocking(move || server.handle_ask_for_vote(rpc_request))
            .await
            .unwrap_or_else(|e| Err(Status::internal(e.to_string())));
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn append_log(
        &self,
        rpc_request_wrapped: Request<ProtoAppendLogRequest>,
    ) -> Result<Response<ProtoAppendLogResponse>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        // WAL writes and fsyncs block.
        let server = self.clone();
        let rpc_result = tokio::task::spawn_blocking(move || server.handle_append_log(rpc_request))
            .await
            .unwrap_or_else(|e| Err(Status::internal(e.to_string())));
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitlog::{ClusterId, FileBasedWal, LogId, TermId, WalPolicy};
    use crate::replica::{PartContext, PartOptions, RaftTransport, StateMachine};

    struct NoTransport;

    #[async_trait::async_trait]
    impl RaftTransport for NoTransport {
        async fn ask_for_vote(
            &self,
            peer: &crate::replica::HostAddr,
            _: crate::replica::AskForVoteRequest,
        ) -> Result<AskForVoteResponse, crate::replica::TransportError> {
            Err(crate::replica::TransportError::Unreachable(*peer))
        }

        async fn append_log(
            &self,
            peer: &crate::replica::HostAddr,
            _: crate::replica::AppendLogRequest,
        ) -> Result<AppendLogResponse, crate::replica::TransportError> {
            Err(crate::replica::TransportError::Unreachable(*peer))
        }
    }

    struct Discard;

    impl StateMachine for Discard {
        fn commit_logs(&self, _: crate::commitlog::LogIterator) -> bool {
            true
        }
    }

    fn logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn vote_request(space: SpaceId, part: PartId) -> ProtoAskForVoteRequest {
        ProtoAskForVoteRequest {
            space,
            part,
            candidate_addr: "127.0.0.1:9001".to_string(),
            term: 1,
            last_log_id: 0,
            last_log_term: 0,
        }
    }

    #[tokio::test]
    async fn routes_by_space_and_part() {
        // -- setup --
        let dir = tempfile::tempdir().unwrap();
        let wal = Arc::new(FileBasedWal::open(logger(), dir.path(), WalPolicy::default()).unwrap());
        let ctx = Arc::new(PartContext::new(
            3,
            7,
            ClusterId::new(1),
            "127.0.0.1:9000".parse().unwrap(),
            wal,
            TermId::default(),
        ));
        let part = Arc::new(RaftPart::new(
            logger(),
            ctx,
            Arc::new(NoTransport),
            Arc::new(Discard),
            PartOptions::default(),
        ));
        part.start(vec!["127.0.0.1:9001".parse().unwrap()]);
        let server = RpcServer::new(logger());
        server.register_part(part.clone());

        // -- execute --
        let known = server.handle_ask_for_vote(vote_request(3, 7)).unwrap();
        let unknown = server.handle_ask_for_vote(vote_request(3, 8)).unwrap();
        let bad_addr = server.handle_ask_for_vote(ProtoAskForVoteRequest {
            candidate_addr: "nowhere".to_string(),
            ..vote_request(3, 7)
        });

        // -- verify --
        assert_eq!(ErrorCode::from_wire(known.error_code), ErrorCode::Succeeded);
        assert_eq!(known.current_term, 1);
        assert_eq!(ErrorCode::from_wire(unknown.error_code), ErrorCode::UnknownPart);
        assert_eq!(bad_addr.unwrap_err().code(), tonic::Code::InvalidArgument);

        server.unregister_part(3, 7);
        let gone = server
            .handle_append_log(ProtoAppendLogRequest {
                space: 3,
                part: 7,
                leader_addr: "127.0.0.1:9001".to_string(),
                ..ProtoAppendLogRequest::default()
            })
            .unwrap();
        assert_eq!(ErrorCode::from_wire(gone.error_code), ErrorCode::UnknownPart);
        assert_eq!(part.last_log_id(), LogId::default());
        part.stop().await;
    }
}
