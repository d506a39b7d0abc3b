use crate::api::options::RaftOptionsValidated;
use crate::commitlog::{ClusterId, FileBasedWal, WalError};
use crate::replica::{GrpcTransport, HostAddr, PartContext, PartId, RaftPart, RaftTransport, SpaceId, StateMachine};
use crate::RaftOptions;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::path::PathBuf;
use std::sync::Arc;

pub struct RaftPartConfig {
    pub cluster: ClusterId,
    pub space: SpaceId,
    pub part: PartId,
    pub local_addr: HostAddr,
    // The other replicas of this partition. The local address is ignored if present.
    pub peers: Vec<HostAddr>,
    // A directory where the partition may create WAL files. Created if missing.
    pub wal_directory: PathBuf,
    pub info_logger: slog::Logger,
    pub options: RaftOptions,
    pub state_machine: Arc<dyn StateMachine>,
    // Defaults to gRPC with the configured RPC timeout.
    pub transport: Option<Arc<dyn RaftTransport>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RaftPartCreationError {
    #[error("Illegal options for configuring partition: {0}")]
    IllegalOptions(String),
    #[error("Peer {0} listed more than once")]
    DuplicatePeer(HostAddr),
    #[error("WAL initialization failure")]
    WalInitialization(#[from] WalError),
}

/// Opens the partition's WAL and starts the partition as a follower. Must be called from within a
/// tokio runtime.
pub fn try_create_raft_part(config: RaftPartConfig) -> Result<Arc<RaftPart>, RaftPartCreationError> {
    let root_logger = config.info_logger;

    let options = RaftOptionsValidated::try_from(config.options)
        .map_err(|e| RaftPartCreationError::IllegalOptions(e.to_string()))?;

    let mut seen = HashSet::new();
    for peer in &config.peers {
        if !seen.insert(*peer) {
            return Err(RaftPartCreationError::DuplicatePeer(*peer));
        }
    }

    let wal = FileBasedWal::open(root_logger.clone(), &config.wal_directory, options.wal_policy.clone())?;
    let term = wal.last_log_term();
    let ctx = Arc::new(PartContext::new(
        config.space,
        config.part,
        config.cluster,
        config.local_addr,
        Arc::new(wal),
        term,
    ));

    let transport = config
        .transport
        .unwrap_or_else(|| Arc::new(GrpcTransport::new(root_logger.clone(), options.rpc_timeout)));

    let part = Arc::new(RaftPart::new(
        root_logger,
        ctx,
        transport,
        config.state_machine,
        options.part_options(),
    ));
    part.start(config.peers);

    Ok(part)
}
