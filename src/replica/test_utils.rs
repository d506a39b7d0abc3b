use crate::commitlog::{ClusterId, FileBasedWal, LogId, LogIterator, LogRecord, TermId, WalPolicy};
use crate::replica::{
    AppendLogRequest, AppendLogResponse, AskForVoteRequest, AskForVoteResponse, ErrorCode, HostAddr, PartContext,
    RaftPart, RaftTransport, StateMachine, TransportError,
};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub(crate) fn test_logger() -> slog::Logger {
    slog::Logger::root(slog::Discard, slog::o!())
}

pub(crate) fn addr(port: u16) -> HostAddr {
    HostAddr::from(([127, 0, 0, 1], port))
}

pub(crate) fn msg(id: u64) -> Bytes {
    Bytes::from(format!("log-{}", id))
}

/// WAL holding one entry per element of `terms`, with ids starting at 1.
pub(crate) fn test_wal(dir: &tempfile::TempDir, terms: &[u64]) -> Arc<FileBasedWal> {
    let wal = FileBasedWal::open(test_logger(), dir.path(), WalPolicy::default()).expect("open WAL");
    for (i, term) in terms.iter().enumerate() {
        let id = i as u64 + 1;
        wal.append_log(LogId::new(id), TermId::new(*term), ClusterId::new(1), msg(id))
            .expect("append to WAL");
    }
    Arc::new(wal)
}

pub(crate) fn test_context(wal: Arc<FileBasedWal>, term: u64) -> Arc<PartContext> {
    Arc::new(PartContext::new(1, 1, ClusterId::new(1), addr(9000), wal, TermId::new(term)))
}

/// What a follower that accepted `request` in full would answer.
pub(crate) fn accepted(request: &AppendLogRequest) -> AppendLogResponse {
    let (last_log_id, last_log_term) = match request.entries.len() {
        0 => (request.last_log_id_sent, request.last_log_term_sent),
        n => (request.last_log_id_sent.plus(n as u64), request.log_term),
    };
    AppendLogResponse {
        error_code: ErrorCode::Succeeded,
        current_term: request.current_term,
        leader_addr: Some(request.leader_addr),
        committed_log_id: request.committed_log_id.min(last_log_id),
        last_log_id,
        last_log_term,
    }
}

pub(crate) fn log_gap(request: &AppendLogRequest, follower_last: u64, follower_last_term: u64) -> AppendLogResponse {
    AppendLogResponse {
        error_code: ErrorCode::LogGap,
        current_term: request.current_term,
        leader_addr: Some(request.leader_addr),
        committed_log_id: LogId::default(),
        last_log_id: LogId::new(follower_last),
        last_log_term: TermId::new(follower_last_term),
    }
}

pub(crate) struct TestUtilReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T: Debug> TestUtilReceiver<T> {
    pub(crate) async fn recv(&mut self) -> T {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("Unexpected timeout")
            .expect("Expected value")
    }

    pub(crate) async fn recv_assert_timeout(&mut self, timeout: Duration) {
        if let Ok(value) = tokio::time::timeout(timeout, self.rx.recv()).await {
            panic!("Expected timeout, received {:?}", value);
        }
    }
}

/// An RPC seen by [`ScriptedTransport`], waiting for the test to answer it. Dropping the call
/// without answering fails the RPC at the transport level.
#[derive(Debug)]
pub(crate) struct RpcCall<Req, Resp> {
    pub(crate) peer: HostAddr,
    pub(crate) request: Req,
    responder: oneshot::Sender<Result<Resp, TransportError>>,
}

impl<Req, Resp> RpcCall<Req, Resp> {
    pub(crate) fn reply(self, response: Resp) {
        let _ = self.responder.send(Ok(response));
    }

    pub(crate) fn fail(self) {
        let peer = self.peer;
        let _ = self.responder.send(Err(TransportError::Unreachable(peer)));
    }
}

pub(crate) type AppendCall = RpcCall<AppendLogRequest, AppendLogResponse>;
pub(crate) type VoteCall = RpcCall<AskForVoteRequest, AskForVoteResponse>;

/// Transport whose every RPC is handed to the test, which decides when and how it completes.
pub(crate) struct ScriptedTransport {
    append_calls: mpsc::UnboundedSender<AppendCall>,
    vote_calls: mpsc::UnboundedSender<VoteCall>,
}

pub(crate) struct ScriptedPeer {
    pub(crate) append_calls: TestUtilReceiver<AppendCall>,
    pub(crate) vote_calls: TestUtilReceiver<VoteCall>,
}

pub(crate) fn scripted_transport() -> (Arc<ScriptedTransport>, ScriptedPeer) {
    let (append_tx, append_rx) = mpsc::unbounded_channel();
    let (vote_tx, vote_rx) = mpsc::unbounded_channel();

    let transport = ScriptedTransport {
        append_calls: append_tx,
        vote_calls: vote_tx,
    };
    let peer = ScriptedPeer {
        append_calls: TestUtilReceiver { rx: append_rx },
        vote_calls: TestUtilReceiver { rx: vote_rx },
    };

    (Arc::new(transport), peer)
}

async fn dispatch<Req, Resp>(
    calls: &mpsc::UnboundedSender<RpcCall<Req, Resp>>,
    peer: &HostAddr,
    request: Req,
) -> Result<Resp, TransportError> {
    let (tx, rx) = oneshot::channel();
    let call = RpcCall {
        peer: *peer,
        request,
        responder: tx,
    };
    if calls.send(call).is_err() {
        return Err(TransportError::Unreachable(*peer));
    }
    rx.await.unwrap_or(Err(TransportError::Unreachable(*peer)))
}

#[async_trait::async_trait]
impl RaftTransport for ScriptedTransport {
    async fn ask_for_vote(
        &self,
        peer: &HostAddr,
        request: AskForVoteRequest,
    ) -> Result<AskForVoteResponse, TransportError> {
        dispatch(&self.vote_calls, peer, request).await
    }

    async fn append_log(
        &self,
        peer: &HostAddr,
        request: AppendLogRequest,
    ) -> Result<AppendLogResponse, TransportError> {
        dispatch(&self.append_calls, peer, request).await
    }
}

/// Routes RPCs straight into registered partitions of the same process. A replica can be cut
/// off, after which every RPC to or from it fails at the transport level.
#[derive(Default)]
pub(crate) struct LocalTransport {
    parts: RwLock<HashMap<HostAddr, Weak<RaftPart>>>,
    isolated: RwLock<HashSet<HostAddr>>,
}

impl LocalTransport {
    pub(crate) fn register(&self, part: &Arc<RaftPart>) {
        self.parts.write().insert(part.addr(), Arc::downgrade(part));
    }

    pub(crate) fn isolate(&self, addr: HostAddr) {
        self.isolated.write().insert(addr);
    }

    pub(crate) fn is_isolated(&self, addr: &HostAddr) -> bool {
        self.isolated.read().contains(addr)
    }

    fn route(&self, from: &HostAddr, to: &HostAddr) -> Result<Arc<RaftPart>, TransportError> {
        if self.is_isolated(from) || self.is_isolated(to) {
            return Err(TransportError::Unreachable(*to));
        }
        self.parts
            .read()
            .get(to)
            .and_then(Weak::upgrade)
            .ok_or(TransportError::Unreachable(*to))
    }
}

#[async_trait::async_trait]
impl RaftTransport for LocalTransport {
    async fn ask_for_vote(
        &self,
        peer: &HostAddr,
        request: AskForVoteRequest,
    ) -> Result<AskForVoteResponse, TransportError> {
        let part = self.route(&request.candidate_addr, peer)?;
        Ok(part.process_ask_for_vote_request(&request))
    }

    async fn append_log(
        &self,
        peer: &HostAddr,
        request: AppendLogRequest,
    ) -> Result<AppendLogResponse, TransportError> {
        let part = self.route(&request.leader_addr, peer)?;
        Ok(part.process_append_log_request(request))
    }
}

/// Remembers every committed record and leadership change.
#[derive(Default)]
pub(crate) struct RecordingStateMachine {
    committed: Mutex<Vec<LogRecord>>,
    elected: Mutex<Vec<TermId>>,
    lost: Mutex<Vec<TermId>>,
}

impl RecordingStateMachine {
    pub(crate) fn committed_ids(&self) -> Vec<LogId> {
        self.committed.lock().iter().map(|r| r.id).collect()
    }

    pub(crate) fn committed_msgs(&self) -> Vec<Bytes> {
        self.committed.lock().iter().map(|r| r.msg.clone()).collect()
    }

    pub(crate) fn elected_terms(&self) -> Vec<TermId> {
        self.elected.lock().clone()
    }

    pub(crate) fn lost_terms(&self) -> Vec<TermId> {
        self.lost.lock().clone()
    }
}

impl StateMachine for RecordingStateMachine {
    fn commit_logs(&self, mut iter: LogIterator) -> bool {
        let mut committed = self.committed.lock();
        while iter.valid() {
            match iter.record() {
                Ok(record) => committed.push(record),
                Err(_) => return false,
            }
            iter.advance();
        }
        true
    }

    fn on_elected(&self, term: TermId) {
        self.elected.lock().push(term);
    }

    fn on_lost_leadership(&self, term: TermId) {
        self.lost.lock().push(term);
    }
}
