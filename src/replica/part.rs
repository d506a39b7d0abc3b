use crate::commitlog::{ClusterId, FileBasedWal, ListLogIterator, LogEntry, LogId, LogIterator, TermId};
use crate::replica::host::{Host, HostOptions};
use crate::replica::stop_signal::{self, StopCheck, Stopper};
use crate::replica::{
    AppendLogError, AppendLogRequest, AppendLogResponse, AskForVoteRequest, AskForVoteResponse, ErrorCode, HostAddr,
    PartContext, RaftTransport, StateMachine,
};
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Follower,
    Candidate,
    Leader,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PartStatus {
    Starting,
    Running,
    Stopped,
}

#[derive(Clone, Debug)]
pub struct PartOptions {
    pub heartbeat_interval: Duration,
    pub election_timeout_min: Duration,
    pub election_timeout_max: Duration,
    /// Client writes that may wait for the batch on the wire.
    pub max_batch_size: usize,
    pub host: HostOptions,
}

impl Default for PartOptions {
    fn default() -> Self {
        PartOptions {
            heartbeat_interval: Duration::from_millis(100),
            election_timeout_min: Duration::from_millis(500),
            election_timeout_max: Duration::from_millis(1500),
            max_batch_size: 256,
            host: HostOptions::default(),
        }
    }
}

struct PartState {
    status: PartStatus,
    role: Role,
    voted_for: Option<HostAddr>,
    leader: Option<HostAddr>,
    committed_log_id: LogId,
    election_deadline: Instant,
}

/// Computes the message of an atomic write once every write queued before it has committed.
/// Returning `None` fails the write and nothing is logged.
pub type AtomicOp = Box<dyn FnOnce() -> Option<Bytes> + Send>;

type WriteResult = Result<LogId, AppendLogError>;

enum LogKind {
    Normal(Bytes),
    // Only ever the first entry of a batch.
    AtomicOp(AtomicOp),
    // Always the last entry of a batch.
    Command(Bytes),
}

struct BufferedLog {
    cluster: ClusterId,
    kind: LogKind,
    responder: oneshot::Sender<WriteResult>,
}

#[derive(Default)]
struct WriteBuffer {
    logs: VecDeque<BufferedLog>,
    // Set while a task is draining `logs` batch by batch.
    replicating: bool,
}

/// Entries replicated in one quorum round, and the writers waiting on each of them.
#[derive(Default)]
struct Batch {
    entries: Vec<LogEntry>,
    responders: Vec<oneshot::Sender<WriteResult>>,
}

impl Batch {
    fn push(&mut self, cluster: ClusterId, msg: Bytes, responder: oneshot::Sender<WriteResult>) {
        self.entries.push(LogEntry { cluster, msg });
        self.responders.push(responder);
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// RaftPart is one replica of a partition. It owns the term, the role, and the commit point,
/// and drives one [`Host`] per peer while it leads.
///
/// The term itself lives in the shared [`PartContext`] so hosts can check it without going
/// through the partition. It is only written while holding the partition's state lock.
pub struct RaftPart {
    logger: slog::Logger,
    ctx: Arc<PartContext>,
    transport: Arc<dyn RaftTransport>,
    state_machine: Arc<dyn StateMachine>,
    options: PartOptions,
    state: Mutex<PartState>,
    hosts: RwLock<Vec<Arc<Host>>>,
    buffer: Mutex<WriteBuffer>,
    poller: Mutex<Option<Stopper>>,
}

impl RaftPart {
    pub fn new(
        logger: slog::Logger,
        ctx: Arc<PartContext>,
        transport: Arc<dyn RaftTransport>,
        state_machine: Arc<dyn StateMachine>,
        options: PartOptions,
    ) -> Self {
        let logger = logger.new(slog::o!("Part" => ctx.id_str()));

        RaftPart {
            logger,
            ctx,
            transport,
            state_machine,
            options,
            state: Mutex::new(PartState {
                status: PartStatus::Starting,
                role: Role::Follower,
                voted_for: None,
                leader: None,
                committed_log_id: LogId::default(),
                election_deadline: Instant::now(),
            }),
            hosts: RwLock::new(vec![]),
            buffer: Mutex::new(WriteBuffer::default()),
            poller: Mutex::new(None),
        }
    }

    /// Starts as a follower replicating with `peers`. The local address is ignored if listed.
    pub fn start(self: &Arc<Self>, peers: Vec<HostAddr>) {
        {
            let mut state = self.state.lock();
            if state.status != PartStatus::Starting {
                slog::warn!(self.logger, "Ignoring start in status {:?}", state.status);
                return;
            }

            let hosts: Vec<Arc<Host>> = peers
                .into_iter()
                .filter(|peer| *peer != self.ctx.addr())
                .map(|peer| {
                    let host = Host::new(
                        self.logger.clone(),
                        peer,
                        self.ctx.clone(),
                        self.transport.clone(),
                        self.options.host.clone(),
                    );
                    host.pause();
                    Arc::new(host)
                })
                .collect();
            slog::info!(
                self.logger,
                "Starting at term {:?} with {} peers, last log {:?}",
                self.ctx.term(),
                hosts.len(),
                self.ctx.wal().last_log_id()
            );
            *self.hosts.write() = hosts;

            state.status = PartStatus::Running;
            state.role = Role::Follower;
            self.reset_election_deadline(&mut state);
        }

        let (stopper, stop_check) = stop_signal::new();
        *self.poller.lock() = Some(stopper);
        tokio::spawn(run_status_poller(
            Arc::downgrade(self),
            stop_check,
            self.options.heartbeat_interval,
        ));
    }

    /// Stops the partition. Resolves once no replication request is on the wire.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock();
            if state.status == PartStatus::Stopped {
                return;
            }
            if state.role == Role::Leader {
                self.state_machine.on_lost_leadership(self.ctx.term());
            }
            state.status = PartStatus::Stopped;
            state.role = Role::Follower;
            state.leader = None;
        }
        self.poller.lock().take();

        let hosts = self.hosts();
        for host in &hosts {
            host.stop();
        }
        for host in &hosts {
            host.wait_for_stop().await;
        }
        slog::info!(self.logger, "Stopped");
    }

    pub fn ctx(&self) -> &Arc<PartContext> {
        &self.ctx
    }

    pub fn addr(&self) -> HostAddr {
        self.ctx.addr()
    }

    pub fn term(&self) -> TermId {
        self.ctx.term()
    }

    pub fn status(&self) -> PartStatus {
        self.state.lock().status
    }

    pub fn role(&self) -> Role {
        self.state.lock().role
    }

    pub fn is_leader(&self) -> bool {
        let state = self.state.lock();
        state.status == PartStatus::Running && state.role == Role::Leader
    }

    pub fn leader(&self) -> Option<HostAddr> {
        self.state.lock().leader
    }

    pub fn committed_log_id(&self) -> LogId {
        self.state.lock().committed_log_id
    }

    pub fn last_log_id(&self) -> LogId {
        self.ctx.wal().last_log_id()
    }

    pub fn wal(&self) -> &Arc<FileBasedWal> {
        self.ctx.wal()
    }

    pub fn hosts(&self) -> Vec<Arc<Host>> {
        self.hosts.read().clone()
    }

    /// Peer acknowledgements needed to commit, not counting this replica.
    pub fn quorum(&self) -> usize {
        (self.hosts.read().len() + 1) / 2
    }

    /// Client writes waiting for the batch currently being replicated.
    pub fn buffered_logs(&self) -> usize {
        self.buffer.lock().logs.len()
    }

    /// Appends `msg` as the leader. Writes that arrive while a batch is being replicated are
    /// buffered and go out together as the next batch. Resolves with the entry's id once a
    /// quorum holds it and the local state machine has applied it.
    pub async fn append_async(self: &Arc<Self>, cluster: ClusterId, msg: Bytes) -> WriteResult {
        self.append_buffered(cluster, LogKind::Normal(msg)).await
    }

    /// Replicates whatever `op` returns. `op` runs only after every write buffered before it has
    /// committed, so it can check and set against applied state.
    pub async fn atomic_op_async(self: &Arc<Self>, op: AtomicOp) -> WriteResult {
        self.append_buffered(self.ctx.cluster(), LogKind::AtomicOp(op)).await
    }

    /// Appends `msg` as the last entry of its batch. Writes buffered after it go out in a later
    /// batch.
    pub async fn send_command_async(self: &Arc<Self>, msg: Bytes) -> WriteResult {
        self.append_buffered(self.ctx.cluster(), LogKind::Command(msg)).await
    }

    async fn append_buffered(self: &Arc<Self>, cluster: ClusterId, kind: LogKind) -> WriteResult {
        {
            let state = self.state.lock();
            check_writable(&state)?;
        }

        let rx = self.enqueue(cluster, kind)?;
        rx.await.unwrap_or(Err(AppendLogError::Stopped))
    }

    fn enqueue(
        self: &Arc<Self>,
        cluster: ClusterId,
        kind: LogKind,
    ) -> Result<oneshot::Receiver<WriteResult>, AppendLogError> {
        let mut buffer = self.buffer.lock();
        if buffer.logs.len() >= self.options.max_batch_size {
            slog::warn!(self.logger, "Write buffer is full with {} logs", buffer.logs.len());
            return Err(AppendLogError::BufferOverflow);
        }

        let (tx, rx) = oneshot::channel();
        buffer.logs.push_back(BufferedLog {
            cluster,
            kind,
            responder: tx,
        });
        if !buffer.replicating {
            buffer.replicating = true;
            tokio::spawn(self.clone().replicate_buffered());
        }
        Ok(rx)
    }

    async fn replicate_buffered(self: Arc<Self>) {
        loop {
            let mut logs = {
                let mut buffer = self.buffer.lock();
                if buffer.logs.is_empty() {
                    buffer.replicating = false;
                    return;
                }
                std::mem::take(&mut buffer.logs)
            };

            while let Some(batch) = self.next_batch(&mut logs) {
                let Batch { entries, responders } = batch;
                match self.replicate_entries(entries).await {
                    Ok(first) => {
                        for (i, responder) in responders.into_iter().enumerate() {
                            let _ = responder.send(Ok(first.plus(i as u64)));
                        }
                    }
                    Err(e) => {
                        slog::debug!(self.logger, "Batch of {} failed: {}", responders.len(), e);
                        for responder in responders {
                            let _ = responder.send(Err(e.clone()));
                        }
                    }
                }
            }
        }
    }

    /// Cuts the next batch off the front of `logs`, running a leading atomic op if there is one.
    fn next_batch(&self, logs: &mut VecDeque<BufferedLog>) -> Option<Batch> {
        let mut batch = Batch::default();

        while let Some(BufferedLog { cluster, kind, responder }) = logs.pop_front() {
            match kind {
                LogKind::AtomicOp(op) if !batch.is_empty() => {
                    logs.push_front(BufferedLog {
                        cluster,
                        kind: LogKind::AtomicOp(op),
                        responder,
                    });
                    break;
                }
                LogKind::AtomicOp(op) => match op() {
                    Some(msg) => batch.push(cluster, msg, responder),
                    None => {
                        slog::debug!(self.logger, "Atomic op produced no log");
                        let _ = responder.send(Err(AppendLogError::AtomicOpFailure));
                    }
                },
                LogKind::Normal(msg) => batch.push(cluster, msg, responder),
                LogKind::Command(msg) => {
                    batch.push(cluster, msg, responder);
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }

    /// Writes `entries` to the local WAL, waits until a quorum of peers holds them, and commits
    /// them. Returns the id of the first entry.
    async fn replicate_entries(&self, entries: Vec<LogEntry>) -> Result<LogId, AppendLogError> {
        let count = entries.len() as u64;
        let (term, first, log_id, committed, prev_term, prev_id) = {
            let state = self.state.lock();
            check_writable(&state)?;

            let wal = self.ctx.wal();
            let term = self.ctx.term();
            let prev_id = wal.last_log_id();
            let prev_term = wal.last_log_term();
            let first = prev_id.next();
            let mut iter: LogIterator = ListLogIterator::new(first, term, entries).into();
            wal.append_logs(&mut iter)?;
            (term, first, prev_id.plus(count), state.committed_log_id, prev_term, prev_id)
        };

        let hosts = self.hosts();
        let quorum = (hosts.len() + 1) / 2;
        let (tx, mut rx) = mpsc::unbounded_channel();
        for host in hosts {
            let response = host.append_logs(term, log_id, committed, prev_term, prev_id);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(response.await);
            });
        }
        drop(tx);

        let mut acks = 0;
        while acks < quorum {
            match rx.recv().await {
                Some(response) if response.succeeded() && response.last_log_id >= log_id => acks += 1,
                Some(response) => self.observe_response(&response),
                None => break,
            }
        }

        let mut state = self.state.lock();
        let current = self.ctx.term();
        if current != term {
            return Err(AppendLogError::TermOutOfDate {
                attempted: term,
                current,
            });
        }
        check_writable(&state)?;
        if acks < quorum {
            slog::warn!(self.logger, "No quorum for {:?}: {} of {}", log_id, acks, quorum);
            return Err(AppendLogError::NoQuorum { acks, quorum });
        }

        self.commit_to(&mut state, log_id);
        Ok(first)
    }

    fn is_peer(&self, addr: &HostAddr) -> bool {
        self.hosts.read().iter().any(|host| host.addr() == *addr)
    }

    pub fn process_ask_for_vote_request(&self, req: &AskForVoteRequest) -> AskForVoteResponse {
        slog::debug!(self.logger, "ServerWire - {:?}", req);
        let mut state = self.state.lock();

        if state.status == PartStatus::Stopped {
            return AskForVoteResponse::failed(ErrorCode::BadState);
        }

        let term = self.ctx.term();
        let rejected = |error_code| AskForVoteResponse {
            error_code,
            current_term: term,
        };
        if !self.is_peer(&req.candidate_addr) {
            slog::info!(self.logger, "Refusing vote for {}, not a peer", req.candidate_addr);
            return rejected(ErrorCode::WrongLeader);
        }
        if req.term < term {
            return rejected(ErrorCode::TermOutOfDate);
        }

        let wal = self.ctx.wal();
        let ours = (wal.last_log_term(), wal.last_log_id());
        if (req.last_log_term, req.last_log_id) < ours {
            slog::info!(
                self.logger,
                "Refusing vote for {}, its log {:?} is behind ours {:?}",
                req.candidate_addr,
                (req.last_log_term, req.last_log_id),
                ours
            );
            return rejected(ErrorCode::LogStale);
        }

        if req.term == term {
            if let Some(voted_for) = state.voted_for {
                if voted_for != req.candidate_addr {
                    return rejected(ErrorCode::TermOutOfDate);
                }
            }
        }

        self.become_follower(&mut state, req.term, None);
        state.voted_for = Some(req.candidate_addr);
        slog::info!(self.logger, "Voted for {} in term {:?}", req.candidate_addr, req.term);

        AskForVoteResponse {
            error_code: ErrorCode::Succeeded,
            current_term: req.term,
        }
    }

    pub fn process_append_log_request(&self, mut req: AppendLogRequest) -> AppendLogResponse {
        slog::debug!(self.logger, "ServerWire - {:?}", req);
        let mut state = self.state.lock();

        match state.status {
            PartStatus::Stopped => return AppendLogResponse::failed(ErrorCode::BadState),
            PartStatus::Starting => return AppendLogResponse::failed(ErrorCode::NotReady),
            PartStatus::Running => {}
        }

        if !self.is_peer(&req.leader_addr) {
            slog::info!(self.logger, "Ignoring append from {}, not a peer", req.leader_addr);
            return self.position_response(&state, ErrorCode::WrongLeader);
        }
        if req.current_term < self.ctx.term() {
            return self.position_response(&state, ErrorCode::TermOutOfDate);
        }
        if req.current_term > self.ctx.term() || state.role != Role::Follower || state.leader != Some(req.leader_addr)
        {
            self.become_follower(&mut state, req.current_term, Some(req.leader_addr));
        }
        self.reset_election_deadline(&mut state);

        let wal = self.ctx.wal();
        if req.last_log_id_sent > wal.last_log_id() {
            slog::debug!(
                self.logger,
                "Gap: leader sent up to {:?}, we have {:?}",
                req.last_log_id_sent,
                wal.last_log_id()
            );
            return self.position_response(&state, ErrorCode::LogGap);
        }

        if wal.term_of(req.last_log_id_sent) != Some(req.last_log_term_sent) {
            slog::info!(
                self.logger,
                "Term mismatch at {:?}, rolling back to {:?}",
                req.last_log_id_sent,
                state.committed_log_id
            );
            if let Err(e) = wal.rollback_to_log(state.committed_log_id) {
                slog::error!(self.logger, "Rollback failed: {}", e);
                return self.position_response(&state, ErrorCode::WalFail);
            }
            return self.position_response(&state, ErrorCode::LogGap);
        }

        if req.last_log_id_sent < state.committed_log_id {
            let mut response = self.position_response(&state, ErrorCode::LogGap);
            response.last_log_id = state.committed_log_id;
            response.last_log_term = wal.term_of(state.committed_log_id).unwrap_or_default();
            return response;
        }

        // Entries we already hold in the leader's term stay. The log is only cut where it
        // first disagrees with the batch.
        let sent = req.last_log_id_sent;
        let count = req.entries.len();
        let mut held = 0;
        while held < count {
            let id = sent.plus(held as u64 + 1);
            match wal.term_of(id) {
                Some(term) if term == req.log_term => held += 1,
                Some(term) => {
                    slog::info!(
                        self.logger,
                        "Log {:?} has term {:?}, the leader's has {:?}. Dropping it and what follows",
                        id,
                        term,
                        req.log_term
                    );
                    if let Err(e) = wal.rollback_to_log(id.prev()) {
                        slog::error!(self.logger, "Rollback failed: {}", e);
                        return self.position_response(&state, ErrorCode::WalFail);
                    }
                    break;
                }
                None => break,
            }
        }

        if held < count {
            let first = sent.plus(held as u64 + 1);
            let entries = req.entries.split_off(held);
            let mut entries: LogIterator = ListLogIterator::new(first, req.log_term, entries).into();
            if let Err(e) = wal.append_logs(&mut entries) {
                slog::error!(self.logger, "Failed to append from {:?}: {}", first, e);
                return self.position_response(&state, ErrorCode::WalFail);
            }
        }

        // Only the prefix checked against this request is known to match the leader.
        let matched = sent.plus(count as u64);
        self.commit_to(&mut state, req.committed_log_id.min(matched));

        let mut response = self.position_response(&state, ErrorCode::Succeeded);
        response.last_log_id = matched;
        response.last_log_term = wal.term_of(matched).unwrap_or_default();
        response
    }

    fn position_response(&self, state: &PartState, error_code: ErrorCode) -> AppendLogResponse {
        let wal = self.ctx.wal();
        AppendLogResponse {
            error_code,
            current_term: self.ctx.term(),
            leader_addr: state.leader,
            committed_log_id: state.committed_log_id,
            last_log_id: wal.last_log_id(),
            last_log_term: wal.last_log_term(),
        }
    }

    fn commit_to(&self, state: &mut PartState, target: LogId) {
        if target <= state.committed_log_id {
            return;
        }

        let iter = self.ctx.wal().iterator(state.committed_log_id.next(), target);
        if !self.state_machine.commit_logs(iter) {
            slog::warn!(self.logger, "State machine refused logs up to {:?}", target);
            return;
        }
        slog::debug!(self.logger, "Committed up to {:?}", target);
        state.committed_log_id = target;
    }

    fn reset_election_deadline(&self, state: &mut PartState) {
        let timeout = rand::thread_rng().gen_range(self.options.election_timeout_min..=self.options.election_timeout_max);
        state.election_deadline = Instant::now() + timeout;
    }

    fn become_follower(&self, state: &mut PartState, term: TermId, leader: Option<HostAddr>) {
        let old_term = self.ctx.term();
        if term > old_term {
            self.ctx.set_term(term);
            state.voted_for = None;
        }
        if state.role == Role::Leader {
            slog::info!(self.logger, "Lost leadership of term {:?}, now at {:?}", old_term, term);
            for host in self.hosts.read().iter() {
                host.pause();
            }
            self.state_machine.on_lost_leadership(old_term);
        } else if state.role == Role::Candidate || term > old_term {
            slog::info!(self.logger, "Follower at term {:?}, leader {:?}", term, leader);
        }
        state.role = Role::Follower;
        state.leader = leader;
        self.reset_election_deadline(state);
    }

    fn observe_response(&self, response: &AppendLogResponse) {
        if response.error_code != ErrorCode::TermOutOfDate || response.current_term <= self.ctx.term() {
            return;
        }
        let mut state = self.state.lock();
        if state.status == PartStatus::Running && response.current_term > self.ctx.term() {
            self.become_follower(&mut state, response.current_term, None);
        }
    }

    async fn status_polling(self: &Arc<Self>) {
        let (role, deadline_passed) = {
            let state = self.state.lock();
            if state.status != PartStatus::Running {
                return;
            }
            (state.role, Instant::now() >= state.election_deadline)
        };

        match role {
            Role::Leader => self.send_heartbeat(),
            Role::Follower | Role::Candidate if deadline_passed => self.elect_leader().await,
            _ => {}
        }
    }

    fn send_heartbeat(self: &Arc<Self>) {
        let (term, committed) = {
            let state = self.state.lock();
            if state.role != Role::Leader {
                return;
            }
            (self.ctx.term(), state.committed_log_id)
        };

        for host in self.hosts() {
            let response = host.append_logs(term, LogId::default(), committed, TermId::default(), LogId::default());
            let part = self.clone();
            tokio::spawn(async move {
                let response = response.await;
                part.observe_response(&response);
            });
        }
    }

    async fn elect_leader(self: &Arc<Self>) {
        let request = {
            let mut state = self.state.lock();
            if state.status != PartStatus::Running || state.role == Role::Leader {
                return;
            }
            let term = self.ctx.term().incr();
            self.ctx.set_term(term);
            state.role = Role::Candidate;
            state.voted_for = Some(self.ctx.addr());
            state.leader = None;
            self.reset_election_deadline(&mut state);

            let wal = self.ctx.wal();
            AskForVoteRequest {
                space: self.ctx.space(),
                part: self.ctx.part(),
                candidate_addr: self.ctx.addr(),
                term,
                last_log_id: wal.last_log_id(),
                last_log_term: wal.last_log_term(),
            }
        };
        let term = request.term;
        slog::info!(self.logger, "Starting election for term {:?}", term);

        let hosts = self.hosts();
        let quorum = (hosts.len() + 1) / 2;
        let (tx, mut rx) = mpsc::unbounded_channel();
        for host in hosts {
            let request = request.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(host.ask_for_vote(request).await);
            });
        }
        drop(tx);

        let mut votes = 0;
        while votes < quorum {
            match rx.recv().await {
                Some(response) if response.granted() => votes += 1,
                Some(response) => {
                    if response.current_term > term {
                        let mut state = self.state.lock();
                        if state.status == PartStatus::Running && response.current_term > self.ctx.term() {
                            self.become_follower(&mut state, response.current_term, None);
                        }
                        return;
                    }
                }
                None => break,
            }
        }

        if votes >= quorum {
            self.become_leader(term);
        } else {
            slog::info!(self.logger, "Lost election for term {:?} with {} of {} votes", term, votes, quorum);
        }
    }

    fn become_leader(self: &Arc<Self>, term: TermId) {
        {
            let mut state = self.state.lock();
            if state.status != PartStatus::Running || state.role != Role::Candidate || self.ctx.term() != term {
                return;
            }
            state.role = Role::Leader;
            state.leader = Some(self.ctx.addr());

            let wal = self.ctx.wal();
            let (last_log_id, last_log_term) = (wal.last_log_id(), wal.last_log_term());
            for host in self.hosts.read().iter() {
                host.reset(last_log_id, last_log_term, state.committed_log_id);
            }
            slog::info!(self.logger, "Elected leader of term {:?} at log {:?}", term, last_log_id);
            self.state_machine.on_elected(term);

            // Entries of earlier terms only commit behind an entry of this term.
            if let Err(e) = self.enqueue(self.ctx.cluster(), LogKind::Command(Bytes::new())) {
                slog::warn!(self.logger, "Could not open term {:?}: {}", term, e);
            }
        }

        self.send_heartbeat();
    }
}

fn check_writable(state: &PartState) -> Result<(), AppendLogError> {
    match state.status {
        PartStatus::Starting => Err(AppendLogError::NotReady),
        PartStatus::Stopped => Err(AppendLogError::Stopped),
        PartStatus::Running if state.role != Role::Leader => {
            Err(AppendLogError::NotALeader { leader: state.leader })
        }
        PartStatus::Running => Ok(()),
    }
}

async fn run_status_poller(part: Weak<RaftPart>, stop_check: StopCheck, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if stop_check.should_stop() {
            return;
        }
        match part.upgrade() {
            Some(part) => part.status_polling().await,
            None => return,
        }
    }
}
