use crate::commitlog::{ClusterId, LogId, LogIterator, TermId};
use bytes::Bytes;
use tokio::sync::mpsc;

/// StateMachine is the application's view of the replicated log: it is handed committed entries
/// in log order. The commit point is not persisted, so a restarted replica replays from the
/// start of its WAL.
///
/// Every leader opens its term with an entry whose message is empty.
///
/// Callbacks run while the partition holds its state lock. They must not call back into the
/// partition.
pub trait StateMachine: Send + Sync {
    /// Applies every entry the iterator yields. Returning false leaves the commit point where it
    /// was, and the same entries are offered again on the next commit.
    fn commit_logs(&self, iter: LogIterator) -> bool;

    fn on_elected(&self, _term: TermId) {}

    fn on_lost_leadership(&self, _term: TermId) {}
}

pub fn create_commit_stream(logger: slog::Logger) -> (CommitStreamPublisher, CommitStream) {
    let (tx, rx) = mpsc::unbounded_channel();

    let publisher = CommitStreamPublisher { logger, sender: tx };
    let stream = CommitStream { receiver: rx };

    (publisher, stream)
}

/// A [`StateMachine`] that forwards committed entries to a [`CommitStream`].
pub struct CommitStreamPublisher {
    logger: slog::Logger,
    sender: mpsc::UnboundedSender<CommittedEntry>,
}

impl StateMachine for CommitStreamPublisher {
    fn commit_logs(&self, mut iter: LogIterator) -> bool {
        while iter.valid() {
            let record = match iter.record() {
                Ok(record) => record,
                Err(e) => {
                    slog::error!(self.logger, "Failed to read committed log: {}", e);
                    return false;
                }
            };
            let entry = CommittedEntry {
                log_id: record.id,
                term: record.term,
                cluster: record.cluster,
                msg: record.msg,
            };
            if self.sender.send(entry).is_err() {
                slog::warn!(self.logger, "CommitStream has disconnected.");
            }
            iter.advance();
        }
        true
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommittedEntry {
    pub log_id: LogId,
    pub term: TermId,
    pub cluster: ClusterId,
    pub msg: Bytes,
}

// For external application to call into this library.
pub struct CommitStream {
    receiver: mpsc::UnboundedReceiver<CommittedEntry>,
}

impl CommitStream {
    /// Next committed entry, or `None` once the partition is gone.
    pub async fn next(&mut self) -> Option<CommittedEntry> {
        self.receiver.recv().await
    }
}
