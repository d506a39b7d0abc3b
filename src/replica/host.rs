use crate::commitlog::{LogEntry, LogId, TermId};
use crate::replica::retry::{RetryHandle, RetryPolicy};
use crate::replica::{
    AppendLogRequest, AppendLogResponse, AskForVoteRequest, AskForVoteResponse, ErrorCode, HostAddr, PartContext,
    RaftTransport, TransportError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

#[derive(Clone, Debug)]
pub struct HostOptions {
    pub max_appendlog_batch_size: usize,
    pub max_outstanding_requests: usize,
    pub retry_policy: RetryPolicy,
}

impl Default for HostOptions {
    fn default() -> Self {
        HostOptions {
            max_appendlog_batch_size: 128,
            max_outstanding_requests: 1024,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Replication bookkeeping of a host, as seen from outside.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct HostPosition {
    pub log_term_to_send: TermId,
    pub log_id_to_send: LogId,
    pub last_log_term_sent: TermId,
    pub last_log_id_sent: LogId,
    pub committed_log_id: LogId,
}

#[derive(Copy, Clone, Debug)]
struct AppendLogsInput {
    term: TermId,
    log_id: LogId,
    committed_log_id: LogId,
    last_log_term_sent: TermId,
    last_log_id_sent: LogId,
}

struct PendingAppend {
    input: AppendLogsInput,
    responder: oneshot::Sender<AppendLogResponse>,
}

struct HostState {
    paused: bool,
    stopped: bool,
    request_on_going: bool,
    // Callers waiting on the request currently on the wire. More than one after coalescing.
    in_flight: Vec<oneshot::Sender<AppendLogResponse>>,
    pending: VecDeque<PendingAppend>,
    position: HostPosition,
}

impl HostState {
    fn check_status(&self) -> Option<ErrorCode> {
        if self.stopped {
            Some(ErrorCode::HostStopped)
        } else if self.paused {
            Some(ErrorCode::NotALeader)
        } else {
            None
        }
    }

    fn resolve_in_flight(&mut self, response: &AppendLogResponse) {
        for responder in self.in_flight.drain(..) {
            let _ = responder.send(response.clone());
        }
    }

    fn resolve_all(&mut self, response: &AppendLogResponse) {
        self.resolve_in_flight(response);
        for pending in self.pending.drain(..) {
            let _ = pending.responder.send(response.clone());
        }
        self.request_on_going = false;
    }

    /// Folds everything queued for `term` into the next request. Returns false when nothing is
    /// left to send.
    fn coalesce_pending(&mut self, term: TermId) -> bool {
        let mut coalesced = false;
        while let Some(pending) = self.pending.pop_front() {
            if pending.input.term != term {
                let _ = pending.responder.send(AppendLogResponse::failed(ErrorCode::TermOutOfDate));
                continue;
            }
            let position = &mut self.position;
            position.log_term_to_send = pending.input.term;
            position.log_id_to_send = position.log_id_to_send.max(pending.input.log_id);
            position.committed_log_id = position.committed_log_id.max(pending.input.committed_log_id);
            self.in_flight.push(pending.responder);
            coalesced = true;
        }

        if !coalesced {
            self.request_on_going = false;
        }
        coalesced
    }

    fn covered_response(&self, term: TermId) -> AppendLogResponse {
        AppendLogResponse {
            error_code: ErrorCode::Succeeded,
            current_term: term,
            leader_addr: None,
            committed_log_id: self.position.committed_log_id,
            last_log_id: self.position.last_log_id_sent,
            last_log_term: self.position.last_log_term_sent,
        }
    }
}

enum AppendOutcome {
    Ready(AppendLogResponse),
    Waiting(oneshot::Receiver<AppendLogResponse>),
}

enum NextStep {
    Send,
    RetryAfter(Duration),
    Done,
}

/// Host drives replication from the local leader to one peer.
///
/// At most one append request is on the wire at a time. Appends that arrive meanwhile are
/// queued, and when the wire request completes the whole queue is folded into the next request
/// covering `[last_log_id_sent + 1, log_id_to_send]`.
///
/// The host reads the partition's term from [`PartContext`] before every send and after every
/// response; a mismatch makes the result stale and it is discarded.
pub struct Host {
    logger: slog::Logger,
    addr: HostAddr,
    ctx: Arc<PartContext>,
    transport: Arc<dyn RaftTransport>,
    options: HostOptions,
    state: Mutex<HostState>,
    no_request_on_going: Notify,
}

impl Host {
    pub fn new(
        logger: slog::Logger,
        addr: HostAddr,
        ctx: Arc<PartContext>,
        transport: Arc<dyn RaftTransport>,
        options: HostOptions,
    ) -> Self {
        let logger = logger.new(slog::o!("Peer" => addr.to_string()));

        Host {
            logger,
            addr,
            ctx,
            transport,
            options,
            state: Mutex::new(HostState {
                paused: false,
                stopped: false,
                request_on_going: false,
                in_flight: vec![],
                pending: VecDeque::new(),
                position: HostPosition::default(),
            }),
            no_request_on_going: Notify::new(),
        }
    }

    pub fn addr(&self) -> HostAddr {
        self.addr
    }

    pub fn pause(&self) {
        let mut state = self.state.lock();
        if !state.paused {
            slog::debug!(self.logger, "Paused");
        }
        state.paused = true;
    }

    pub fn resume(&self) {
        let mut state = self.state.lock();
        if state.paused {
            slog::debug!(self.logger, "Resumed");
        }
        state.paused = false;
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.stopped = true;
        slog::debug!(self.logger, "Stopped");
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Number of appends queued behind the request on the wire.
    pub fn pending_requests(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn position(&self) -> HostPosition {
        self.state.lock().position
    }

    /// Seeds the host for a newly won term: the peer is assumed to be at `last_log_id` until it
    /// says otherwise. Resumes the host.
    pub fn reset(&self, last_log_id: LogId, last_log_term: TermId, committed_log_id: LogId) {
        let mut state = self.state.lock();
        state.position = HostPosition {
            log_term_to_send: self.ctx.term(),
            log_id_to_send: last_log_id,
            last_log_term_sent: last_log_term,
            last_log_id_sent: last_log_id,
            committed_log_id,
        };
        state.paused = false;
    }

    /// Resolves once no request is on the wire. Only meaningful after [`Host::stop`].
    pub async fn wait_for_stop(&self) {
        loop {
            let notified = self.no_request_on_going.notified();
            if !self.state.lock().request_on_going {
                return;
            }
            notified.await;
        }
    }

    pub async fn ask_for_vote(&self, request: AskForVoteRequest) -> AskForVoteResponse {
        if self.is_stopped() {
            return AskForVoteResponse::failed(ErrorCode::HostStopped);
        }

        match self.transport.ask_for_vote(&self.addr, request).await {
            Ok(response) => response,
            Err(e) => {
                slog::warn!(self.logger, "AskForVote failed: {}", e);
                AskForVoteResponse::failed(ErrorCode::Exception)
            }
        }
    }

    /// Asks the peer to reach `log_id`. The request is registered before this returns; the
    /// returned future resolves once the peer acknowledged it, or with the reason it could not.
    pub fn append_logs(
        self: &Arc<Self>,
        term: TermId,
        log_id: LogId,
        committed_log_id: LogId,
        last_log_term_sent: TermId,
        last_log_id_sent: LogId,
    ) -> impl Future<Output = AppendLogResponse> + Send + 'static {
        let input = AppendLogsInput {
            term,
            log_id,
            committed_log_id,
            last_log_term_sent,
            last_log_id_sent,
        };
        let outcome = self.register_append(input);

        async move {
            match outcome {
                AppendOutcome::Ready(response) => response,
                AppendOutcome::Waiting(rx) => rx
                    .await
                    .unwrap_or_else(|_| AppendLogResponse::failed(ErrorCode::Exception)),
            }
        }
    }

    fn register_append(self: &Arc<Self>, input: AppendLogsInput) -> AppendOutcome {
        let mut state = self.state.lock();

        if let Some(code) = state.check_status() {
            return AppendOutcome::Ready(AppendLogResponse::failed(code));
        }
        if input.term != self.ctx.term() {
            return AppendOutcome::Ready(AppendLogResponse::failed(ErrorCode::TermOutOfDate));
        }

        let position = state.position;
        let is_resend = input.log_id == LogId::default() || input.log_id == position.log_id_to_send;
        if state.request_on_going {
            if is_resend {
                // The request on the wire already covers it.
                return AppendOutcome::Ready(state.covered_response(input.term));
            }
            if state.pending.len() >= self.options.max_outstanding_requests {
                slog::warn!(self.logger, "Too many requests queued: {}", state.pending.len());
                return AppendOutcome::Ready(AppendLogResponse::failed(ErrorCode::TooManyRequests));
            }
            let (tx, rx) = oneshot::channel();
            state.pending.push_back(PendingAppend { input, responder: tx });
            return AppendOutcome::Waiting(rx);
        }

        if !is_resend && input.log_id < position.log_id_to_send {
            slog::warn!(
                self.logger,
                "Asked to send {:?}, already sending {:?}",
                input.log_id,
                position.log_id_to_send
            );
            return AppendOutcome::Ready(AppendLogResponse::failed(ErrorCode::LogStale));
        }

        let position = &mut state.position;
        position.log_term_to_send = input.term;
        if input.log_id != LogId::default() {
            position.log_id_to_send = input.log_id;
        }
        position.committed_log_id = position.committed_log_id.max(input.committed_log_id);
        if input.last_log_id_sent >= position.last_log_id_sent {
            position.last_log_id_sent = input.last_log_id_sent;
            position.last_log_term_sent = input.last_log_term_sent;
        }

        let (tx, rx) = oneshot::channel();
        state.in_flight.push(tx);
        state.request_on_going = true;
        drop(state);

        tokio::spawn(self.clone().replicate());
        AppendOutcome::Waiting(rx)
    }

    async fn replicate(self: Arc<Self>) {
        let mut retry: Option<RetryHandle> = None;

        loop {
            let request = match self.next_request() {
                Some(request) => request,
                None => return,
            };

            let term_sent = request.current_term;
            let had_entries = !request.entries.is_empty();
            let result = self.transport.append_log(&self.addr, request).await;

            match self.on_append_result(term_sent, had_entries, result, &mut retry) {
                NextStep::Send => {}
                NextStep::RetryAfter(delay) => tokio::time::sleep(delay).await,
                NextStep::Done => return,
            }
        }
    }

    fn finish(&self, state: &mut HostState, response: &AppendLogResponse) {
        state.resolve_all(response);
        self.no_request_on_going.notify_waiters();
    }

    fn next_request(&self) -> Option<AppendLogRequest> {
        let mut state = self.state.lock();

        if let Some(code) = state.check_status() {
            self.finish(&mut state, &AppendLogResponse::failed(code));
            return None;
        }

        let current_term = self.ctx.term();
        if state.position.log_term_to_send != current_term {
            slog::info!(
                self.logger,
                "Term moved from {:?} to {:?}, dropping stale append",
                state.position.log_term_to_send,
                current_term
            );
            state.resolve_in_flight(&AppendLogResponse::failed(ErrorCode::TermOutOfDate));
            if !state.coalesce_pending(current_term) {
                self.no_request_on_going.notify_waiters();
                return None;
            }
        }

        Some(self.prepare_append_log_request(&state.position))
    }

    fn prepare_append_log_request(&self, position: &HostPosition) -> AppendLogRequest {
        let mut it = self
            .ctx
            .wal()
            .iterator(position.last_log_id_sent.next(), position.log_id_to_send);

        let mut log_term = TermId::default();
        let mut entries = vec![];
        if let Ok(first_term) = it.log_term() {
            log_term = first_term;
            while entries.len() < self.options.max_appendlog_batch_size {
                match it.record() {
                    Ok(record) if record.term == log_term => entries.push(LogEntry {
                        cluster: record.cluster,
                        msg: record.msg,
                    }),
                    _ => break,
                }
                it.advance();
            }
        }

        AppendLogRequest {
            space: self.ctx.space(),
            part: self.ctx.part(),
            current_term: position.log_term_to_send,
            last_log_id: position.log_id_to_send,
            committed_log_id: position.committed_log_id,
            leader_addr: self.ctx.addr(),
            last_log_term_sent: position.last_log_term_sent,
            last_log_id_sent: position.last_log_id_sent,
            log_term,
            entries,
        }
    }

    fn on_append_result(
        &self,
        term_sent: TermId,
        had_entries: bool,
        result: Result<AppendLogResponse, TransportError>,
        retry: &mut Option<RetryHandle>,
    ) -> NextStep {
        let mut state = self.state.lock();

        let response = match result {
            Ok(response) => {
                *retry = None;
                response
            }
            Err(e) => {
                let handle = retry.get_or_insert_with(|| self.options.retry_policy.handle());
                return match handle.next_delay() {
                    Some(delay) => {
                        slog::warn!(
                            self.logger,
                            "AppendLog failed ({}), retry #{} in {:?}",
                            e,
                            handle.attempts(),
                            delay
                        );
                        NextStep::RetryAfter(delay)
                    }
                    None => {
                        slog::warn!(self.logger, "AppendLog failed ({}), giving up", e);
                        self.finish(&mut state, &AppendLogResponse::failed(ErrorCode::Exception));
                        NextStep::Done
                    }
                };
            }
        };

        // Stale: the partition moved to another term while this was on the wire.
        if term_sent != self.ctx.term() {
            slog::info!(self.logger, "Discarding response for stale term {:?}", term_sent);
            return NextStep::Send;
        }

        match response.error_code {
            ErrorCode::Succeeded => {
                if let Some(code) = state.check_status() {
                    self.finish(&mut state, &AppendLogResponse::failed(code));
                    return NextStep::Done;
                }
                if !self.adopt_follower_position(&mut state, &response) {
                    self.finish(&mut state, &AppendLogResponse::failed(ErrorCode::WalFail));
                    return NextStep::Done;
                }

                let position = state.position;
                if position.last_log_id_sent < position.log_id_to_send {
                    if !had_entries {
                        slog::error!(
                            self.logger,
                            "Follower at {:?} needs logs the WAL no longer has",
                            position.last_log_id_sent
                        );
                        self.finish(&mut state, &AppendLogResponse::failed(ErrorCode::WalFail));
                        return NextStep::Done;
                    }
                    return NextStep::Send;
                }

                state.resolve_in_flight(&response);
                if state.coalesce_pending(term_sent) {
                    NextStep::Send
                } else {
                    self.no_request_on_going.notify_waiters();
                    NextStep::Done
                }
            }
            ErrorCode::LogGap => {
                if let Some(code) = state.check_status() {
                    self.finish(&mut state, &AppendLogResponse::failed(code));
                    return NextStep::Done;
                }
                slog::debug!(self.logger, "Follower reports gap, it is at {:?}", response.last_log_id);
                if !self.adopt_follower_position(&mut state, &response) {
                    self.finish(&mut state, &AppendLogResponse::failed(ErrorCode::WalFail));
                    return NextStep::Done;
                }
                NextStep::Send
            }
            _ => {
                slog::warn!(self.logger, "AppendLog rejected: {:?}", response);
                self.finish(&mut state, &response);
                NextStep::Done
            }
        }
    }

    // The term sent next is always the leader's own term at that id, so a follower holding a
    // diverged suffix detects the mismatch on the next request.
    fn adopt_follower_position(&self, state: &mut HostState, response: &AppendLogResponse) -> bool {
        let id = response.last_log_id.min(state.position.log_id_to_send);
        match self.ctx.wal().term_of(id) {
            Some(term) => {
                state.position.last_log_id_sent = id;
                state.position.last_log_term_sent = term;
                true
            }
            None => false,
        }
    }
}
