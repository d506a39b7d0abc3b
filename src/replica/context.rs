use crate::commitlog::{ClusterId, FileBasedWal, TermId};
use crate::replica::{HostAddr, PartId, SpaceId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// What a partition shares with its replication hosts: identity, WAL, and the current term.
///
/// Hosts never own the term. They read it here on every send and every response, and the
/// partition is the only writer.
pub struct PartContext {
    space: SpaceId,
    part: PartId,
    cluster: ClusterId,
    addr: HostAddr,
    wal: Arc<FileBasedWal>,
    term: AtomicU64,
}

impl PartContext {
    pub fn new(
        space: SpaceId,
        part: PartId,
        cluster: ClusterId,
        addr: HostAddr,
        wal: Arc<FileBasedWal>,
        term: TermId,
    ) -> Self {
        PartContext {
            space,
            part,
            cluster,
            addr,
            wal,
            term: AtomicU64::new(term.as_u64()),
        }
    }

    pub fn space(&self) -> SpaceId {
        self.space
    }

    pub fn part(&self) -> PartId {
        self.part
    }

    pub fn cluster(&self) -> ClusterId {
        self.cluster
    }

    pub fn addr(&self) -> HostAddr {
        self.addr
    }

    pub fn wal(&self) -> &Arc<FileBasedWal> {
        &self.wal
    }

    pub fn term(&self) -> TermId {
        TermId::new(self.term.load(Ordering::Acquire))
    }

    pub(crate) fn set_term(&self, term: TermId) {
        self.term.store(term.as_u64(), Ordering::Release);
    }

    pub fn id_str(&self) -> String {
        format!("[{}:{}]", self.space, self.part)
    }
}
