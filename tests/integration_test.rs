use bytes::Bytes;
use raftex::{
    AppendLogError, ClusterId, CommitStream, CommittedEntry, HostAddr, LogId, RaftOptions, RaftPart, RaftPartConfig,
    RetryPolicy, RpcServerShutdownHandle,
};
use slog::Drain;
use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::time::{Duration, Instant};

struct Replica {
    part: Arc<RaftPart>,
    commit_stream: CommitStream,
    _server_shutdown: RpcServerShutdownHandle,
    _wal_dir: TempDir,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn leader_election_and_commit() -> Result<(), Box<dyn Error>> {
    // -- setup --
    let mut replicas = start_cluster(3, 4100)?;

    // -- execute --
    let leader = wait_for_leader(&replicas, Duration::from_secs(10)).await;
    let mut written = vec![];
    for i in 1..=3u64 {
        let data = Bytes::from(format!("Hello world {}", i));
        let log_id = leader.append_async(ClusterId::new(1), data.clone()).await?;
        written.push((log_id, data));
    }

    // -- verify --
    // The leader opens its term with an empty entry, so client writes start after it.
    let first = written[0].0;
    assert!(first > LogId::new(1));
    assert_eq!(
        written.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        vec![first, first.plus(1), first.plus(2)]
    );
    for replica in replicas.iter_mut() {
        for (log_id, data) in &written {
            let entry = next_written(&mut replica.commit_stream).await;
            assert_eq!(entry.log_id, *log_id);
            assert_eq!(entry.term, leader.term());
            assert_eq!(&entry.msg, data);
        }
    }

    stop_cluster(&replicas).await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn follower_redirects_to_leader() -> Result<(), Box<dyn Error>> {
    // -- setup --
    let mut replicas = start_cluster(3, 4200)?;
    let leader = wait_for_leader(&replicas, Duration::from_secs(10)).await;
    let first = leader.append_async(ClusterId::new(1), Bytes::from("first")).await?;
    for replica in replicas.iter_mut() {
        while next_committed(&mut replica.commit_stream).await.log_id < first {}
    }

    // -- execute --
    let follower = replicas
        .iter()
        .map(|r| &r.part)
        .find(|p| !p.is_leader())
        .expect("Cluster has no follower");
    let output = follower.append_async(ClusterId::new(1), Bytes::from("second")).await;

    // -- verify --
    match output {
        Err(AppendLogError::NotALeader { leader: Some(addr) }) => assert_eq!(addr, leader.addr()),
        other => panic!("Expected leader redirect, got {:?}", other),
    }

    stop_cluster(&replicas).await;
    Ok(())
}

fn start_cluster(num_members: u16, port_base: u16) -> Result<Vec<Replica>, Box<dyn Error>> {
    let addrs: Vec<HostAddr> = (0..num_members).map(|i| addr(port_base + i)).collect();

    let mut replicas = Vec::with_capacity(addrs.len());
    for local_addr in &addrs {
        let logger = create_root_logger_for_stdout(local_addr.to_string());
        let wal_dir = tempfile::tempdir()?;
        let (publisher, commit_stream) = raftex::create_commit_stream(logger.clone());

        let part = raftex::try_create_raft_part(RaftPartConfig {
            cluster: ClusterId::new(1),
            space: 1,
            part: 1,
            local_addr: *local_addr,
            peers: addrs.clone(),
            wal_directory: wal_dir.path().to_path_buf(),
            info_logger: logger.clone(),
            options: options(),
            state_machine: Arc::new(publisher),
            transport: None,
        })?;

        let server = raftex::RpcServer::new(logger);
        server.register_part(part.clone());
        let (shutdown_handle, shutdown_signal) = raftex::shutdown_signal();
        tokio::spawn(server.run(*local_addr, shutdown_signal));

        replicas.push(Replica {
            part,
            commit_stream,
            _server_shutdown: shutdown_handle,
            _wal_dir: wal_dir,
        });
    }

    Ok(replicas)
}

async fn stop_cluster(replicas: &[Replica]) {
    for replica in replicas {
        replica.part.stop().await;
    }
}

fn options() -> RaftOptions {
    RaftOptions {
        heartbeat_interval: Some(Duration::from_millis(50)),
        election_timeout_min: Some(Duration::from_millis(300)),
        election_timeout_max: Some(Duration::from_millis(600)),
        rpc_timeout: Some(Duration::from_millis(200)),
        retry_policy: Some(RetryPolicy::fixed(Duration::from_millis(20))),
        ..RaftOptions::default()
    }
}

fn addr(port: u16) -> HostAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

async fn wait_for_leader(replicas: &[Replica], timeout: Duration) -> Arc<RaftPart> {
    let deadline = Instant::now() + timeout;
    loop {
        let leaders: Vec<&Arc<RaftPart>> = replicas.iter().map(|r| &r.part).filter(|p| p.is_leader()).collect();
        if leaders.len() == 1 {
            return leaders[0].clone();
        }
        if Instant::now() > deadline {
            panic!("No leader elected within {:?}", timeout);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

async fn next_committed(commit_stream: &mut CommitStream) -> CommittedEntry {
    tokio::time::timeout(Duration::from_secs(10), commit_stream.next())
        .await
        .expect("Timed out waiting for a committed entry")
        .expect("Commit stream closed")
}

// Skips the empty entries leaders open their terms with.
async fn next_written(commit_stream: &mut CommitStream) -> CommittedEntry {
    loop {
        let entry = next_committed(commit_stream).await;
        if !entry.msg.is_empty() {
            return entry;
        }
    }
}

fn create_root_logger_for_stdout(replica_addr: String) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog::LevelFilter::new(drain, slog::Level::Info).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Replica" => replica_addr))
}
