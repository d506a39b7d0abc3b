mod file;
mod range_iterator;

pub use file::WalFileInfo;
pub use range_iterator::RangeLogIterator;

use crate::commitlog::{ClusterId, InMemoryLogBuffer, LogId, LogIterator, TermId, WalError};
use bytes::{Bytes, BytesMut};
use file::ScannedFile;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, VecDeque};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct WalPolicy {
    /// A file is closed once it grows past this many bytes.
    pub file_size: u64,
    /// The current buffer is frozen and flushed once it grows past this many bytes.
    pub buffer_size: usize,
    /// How many buffers, including the one being written, stay in memory for readers.
    pub num_buffers: usize,
}

impl Default for WalPolicy {
    fn default() -> Self {
        WalPolicy {
            file_size: 16 * 1024 * 1024,
            buffer_size: 8 * 1024 * 1024,
            num_buffers: 2,
        }
    }
}

/// FileBasedWal is a partition's write-ahead log: a chain of in-memory buffers in front of a
/// directory of append-only files.
///
/// Writes go into the newest buffer. A buffer that outgrows `buffer_size` is frozen and written
/// to the current file. Files are named after the first log id they hold.
///
/// Readers get a [`LogIterator`] over a range of ids through [`FileBasedWal::iterator`]. Each
/// iterator holds the rollover lock in shared mode, so rollback and cleanup wait for every
/// outstanding iterator to be dropped.
pub struct FileBasedWal {
    logger: slog::Logger,
    dir: PathBuf,
    policy: WalPolicy,
    rollover_lock: Arc<RwLock<()>>,
    state: Mutex<WalState>,
}

struct WalState {
    // Keyed by first log id.
    files: BTreeMap<LogId, WalFileInfo>,
    // Open file that flushes append to. `None` means the next flush starts a new file.
    current_file: Option<(LogId, File)>,
    // Oldest first. Only the last one may be unfrozen.
    buffers: VecDeque<Arc<InMemoryLogBuffer>>,
    // Everything up to here is on disk.
    flushed_log_id: LogId,
    last_log_id: LogId,
    last_log_term: TermId,
}

impl WalState {
    fn first_log_id(&self) -> LogId {
        if let Some(info) = self.files.values().next() {
            return info.first_log_id;
        }
        match self.buffers.iter().find(|b| !b.is_empty()) {
            Some(buffer) => buffer.first_log_id(),
            None => self.last_log_id.next(),
        }
    }

    fn writable_buffer(&mut self) -> Arc<InMemoryLogBuffer> {
        match self.buffers.back() {
            Some(buffer) if !buffer.is_frozen() => buffer.clone(),
            _ => {
                let buffer = Arc::new(InMemoryLogBuffer::new(self.last_log_id.next()));
                self.buffers.push_back(buffer.clone());
                buffer
            }
        }
    }
}

impl FileBasedWal {
    /// Opens the WAL in `dir`, creating the directory if needed, and recovers its position from
    /// the files found there.
    pub fn open<P: AsRef<Path>>(logger: slog::Logger, dir: P, policy: WalPolicy) -> Result<Self, WalError> {
        let dir = dir.as_ref().to_path_buf();
        let logger = logger.new(slog::o!("Wal" => dir.display().to_string()));
        fs::create_dir_all(&dir)?;

        let files = Self::scan_all_wal_files(&logger, &dir)?;
        let (last_log_id, last_log_term) = files
            .values()
            .next_back()
            .map(|info| (info.last_log_id, info.last_log_term))
            .unwrap_or_default();

        slog::info!(
            logger,
            "Opened WAL with {} files, last log {:?} in term {:?}",
            files.len(),
            last_log_id,
            last_log_term
        );

        Ok(FileBasedWal {
            logger,
            dir,
            policy,
            rollover_lock: Arc::new(RwLock::new(())),
            state: Mutex::new(WalState {
                files,
                current_file: None,
                buffers: VecDeque::new(),
                flushed_log_id: last_log_id,
                last_log_id,
                last_log_term,
            }),
        })
    }

    fn scan_all_wal_files(logger: &slog::Logger, dir: &Path) -> Result<BTreeMap<LogId, WalFileInfo>, WalError> {
        let mut found = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            match file::parse_file_name(&path) {
                Some(first_log_id) => {
                    found.insert(first_log_id, path);
                }
                None => slog::debug!(logger, "Ignoring non-WAL file {:?}", path),
            }
        }

        let mut files: BTreeMap<LogId, WalFileInfo> = BTreeMap::new();
        for (first_log_id, path) in found {
            let info = match file::scan_file(logger, &path, first_log_id)? {
                ScannedFile::Valid(info) => info,
                ScannedFile::Empty => {
                    slog::warn!(logger, "Removing empty WAL file {:?}", path);
                    fs::remove_file(&path)?;
                    continue;
                }
            };

            let prev_last = files.values().next_back().map(|prev| prev.last_log_id);
            if let Some(prev_last) = prev_last {
                if prev_last.next() != info.first_log_id {
                    // Only the files after the gap can be used.
                    slog::warn!(
                        logger,
                        "Gap between log {:?} and {:?}, dropping all earlier files",
                        prev_last,
                        info.first_log_id
                    );
                    for stale in files.values() {
                        fs::remove_file(&stale.path)?;
                    }
                    files.clear();
                }
            }
            files.insert(first_log_id, info);
        }

        Ok(files)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Earliest id still retained in files or buffers.
    pub fn first_log_id(&self) -> LogId {
        self.state.lock().first_log_id()
    }

    pub fn last_log_id(&self) -> LogId {
        self.state.lock().last_log_id
    }

    pub fn last_log_term(&self) -> TermId {
        self.state.lock().last_log_term
    }

    pub fn wal_files(&self) -> Vec<WalFileInfo> {
        self.state.lock().files.values().cloned().collect()
    }

    /// Term of the entry at `id`, if retained. `LogId(0)` has term 0.
    pub fn term_of(&self, id: LogId) -> Option<TermId> {
        if id == LogId::default() {
            return Some(TermId::default());
        }
        self.iterator(id, id).log_term().ok()
    }

    /// Appends one entry. `id` must follow the last log id, unless the WAL is empty.
    pub fn append_log(&self, id: LogId, term: TermId, cluster: ClusterId, msg: Bytes) -> Result<(), WalError> {
        let mut state = self.state.lock();
        self.append_log_locked(&mut state, id, term, cluster, msg)
    }

    /// Appends every remaining entry of `iter`. Returns the last id appended, or `None` if the
    /// iterator was already exhausted.
    pub fn append_logs(&self, iter: &mut LogIterator) -> Result<Option<LogId>, WalError> {
        let mut state = self.state.lock();
        let mut appended = None;
        while iter.valid() {
            let record = iter.record()?;
            self.append_log_locked(&mut state, record.id, record.term, record.cluster, record.msg)?;
            appended = Some(record.id);
            iter.advance();
        }
        Ok(appended)
    }

    fn append_log_locked(
        &self,
        state: &mut WalState,
        id: LogId,
        term: TermId,
        cluster: ClusterId,
        msg: Bytes,
    ) -> Result<(), WalError> {
        let is_empty = state.last_log_id == LogId::default() && state.buffers.is_empty() && state.files.is_empty();
        if is_empty {
            // An empty WAL starts wherever its first entry says.
            state.last_log_id = id.prev();
            state.flushed_log_id = id.prev();
        } else if id != state.last_log_id.next() {
            return Err(WalError::NonContiguous {
                last: state.last_log_id,
                attempted: id,
            });
        }

        let buffer = state.writable_buffer();
        buffer.push(term, cluster, msg)?;
        state.last_log_id = id;
        state.last_log_term = term;

        if buffer.size() > self.policy.buffer_size {
            buffer.freeze();
            self.flush_frozen(state)?;
        }

        Ok(())
    }

    /// Freezes the current buffer and writes everything unflushed to disk.
    pub fn flush(&self) -> Result<(), WalError> {
        let mut state = self.state.lock();
        if let Some(buffer) = state.buffers.back() {
            buffer.freeze();
        }
        self.flush_frozen(&mut state)
    }

    /// Like [`FileBasedWal::flush`], and the next write starts a new file.
    pub fn rollover(&self) -> Result<(), WalError> {
        let mut state = self.state.lock();
        if let Some(buffer) = state.buffers.back() {
            buffer.freeze();
            buffer.rollover();
        }
        self.flush_frozen(&mut state)?;
        state.current_file = None;
        Ok(())
    }

    fn flush_frozen(&self, state: &mut WalState) -> Result<(), WalError> {
        let frozen: Vec<Arc<InMemoryLogBuffer>> = state
            .buffers
            .iter()
            .filter(|b| b.is_frozen() && b.last_log_id() > state.flushed_log_id)
            .cloned()
            .collect();

        for buffer in frozen {
            self.flush_buffer(state, &buffer)?;
        }

        // Flushed buffers beyond the retention count are only reachable through files now.
        while state.buffers.len() > self.policy.num_buffers.max(1) {
            match state.buffers.front() {
                Some(front) if front.is_frozen() && front.last_log_id() <= state.flushed_log_id => {
                    state.buffers.pop_front();
                }
                _ => break,
            }
        }

        Ok(())
    }

    fn flush_buffer(&self, state: &mut WalState, buffer: &InMemoryLogBuffer) -> Result<(), WalError> {
        let flushed_log_id = state.flushed_log_id;
        let mut encoded = BytesMut::new();
        let mut first_written = None;
        let visited = buffer.access_all_logs(|id, term, cluster, msg| {
            if id > flushed_log_id {
                first_written.get_or_insert(id);
                file::encode_record(&mut encoded, id, term, cluster, msg);
            }
        });
        let (last_log_id, last_log_term) = match (visited, first_written) {
            (Ok(last), Some(_)) => last,
            _ => return Ok(()),
        };
        let first_written = first_written.unwrap_or(last_log_id);

        if state.current_file.is_none() {
            let path = file::file_path(&self.dir, first_written);
            let handle = OpenOptions::new().create(true).append(true).open(&path)?;
            state.files.insert(
                first_written,
                WalFileInfo {
                    path,
                    first_log_id: first_written,
                    last_log_id: first_written.prev(),
                    last_log_term: TermId::default(),
                    size: 0,
                    mtime: chrono::Utc::now(),
                },
            );
            state.current_file = Some((first_written, handle));
            slog::debug!(self.logger, "Started WAL file for log {:?}", first_written);
        }

        let file_key = match state.current_file.as_mut() {
            Some((key, handle)) => {
                handle.write_all(&encoded)?;
                handle.sync_data()?;
                *key
            }
            None => return Ok(()),
        };

        let mut close_file = buffer.need_to_rollover();
        if let Some(info) = state.files.get_mut(&file_key) {
            info.last_log_id = last_log_id;
            info.last_log_term = last_log_term;
            info.size += encoded.len() as u64;
            info.refresh_mtime();
            close_file |= info.size > self.policy.file_size;
        }
        state.flushed_log_id = last_log_id;

        if close_file {
            slog::debug!(self.logger, "Closing WAL file for log {:?} after {:?}", file_key, last_log_id);
            state.current_file = None;
        }

        Ok(())
    }

    /// Discards every entry after `id`. Waits for outstanding iterators to be dropped.
    pub fn rollback_to_log(&self, id: LogId) -> Result<(), WalError> {
        let _exclusive = self.rollover_lock.write();
        let mut state = self.state.lock();

        if id >= state.last_log_id {
            return Ok(());
        }
        let first = state.first_log_id();
        if id.next() < first {
            return Err(WalError::RollbackBeyondRetained { target: id, first });
        }

        slog::info!(self.logger, "Rolling back from {:?} to {:?}", state.last_log_id, id);

        // Buffers are replaced, never edited.
        while let Some(back) = state.buffers.back() {
            if back.first_log_id() > id {
                state.buffers.pop_back();
            } else {
                if back.last_log_id() > id {
                    let replacement = Arc::new(back.truncated_copy(id));
                    state.buffers.pop_back();
                    state.buffers.push_back(replacement);
                }
                break;
            }
        }

        state.current_file = None;
        let after: Vec<LogId> = state.files.range(id.next()..).map(|(k, _)| *k).collect();
        for key in after {
            if let Some(info) = state.files.remove(&key) {
                fs::remove_file(&info.path)?;
            }
        }
        let containing = state
            .files
            .values()
            .next_back()
            .filter(|info| info.last_log_id > id)
            .cloned();
        if let Some(info) = containing {
            match file::truncate_after(&info, id)? {
                Some(truncated) => {
                    state.files.insert(truncated.first_log_id, truncated);
                }
                None => {
                    state.files.remove(&info.first_log_id);
                }
            }
        }

        let last_term = state
            .buffers
            .back()
            .and_then(|b| b.get_record(id))
            .map(|r| r.term)
            .or_else(|| state.files.values().next_back().filter(|f| f.last_log_id == id).map(|f| f.last_log_term))
            .unwrap_or_default();

        state.last_log_id = id;
        state.last_log_term = last_term;
        if state.flushed_log_id > id {
            state.flushed_log_id = id;
        }

        Ok(())
    }

    /// Removes whole files whose entries all precede `keep_from`. Files still holding unflushed
    /// neighbours of the current file are never touched.
    pub fn clean_wal(&self, keep_from: LogId) -> Result<usize, WalError> {
        let _exclusive = self.rollover_lock.write();
        let mut state = self.state.lock();

        let current_key = state.current_file.as_ref().map(|(key, _)| *key);
        let removable: Vec<LogId> = state
            .files
            .values()
            .filter(|info| info.last_log_id < keep_from && Some(info.first_log_id) != current_key)
            .map(|info| info.first_log_id)
            .collect();

        for key in removable.iter() {
            if let Some(info) = state.files.remove(key) {
                slog::info!(self.logger, "Removing WAL file {:?}", info.path);
                fs::remove_file(&info.path)?;
            }
        }

        Ok(removable.len())
    }

    /// Iterator over `[start, last]`. `last` is clamped to the last log id; a range that starts
    /// before the earliest retained entry, or after the clamped end, yields an invalid iterator.
    pub fn iterator(&self, start: LogId, last: LogId) -> LogIterator {
        let guard = self.rollover_lock.read_arc();
        let state = self.state.lock();

        let last = last.min(state.last_log_id);
        if start == LogId::default() || start < state.first_log_id() || start > last {
            return RangeLogIterator::empty(guard).into();
        }

        let buffers: Vec<Arc<InMemoryLogBuffer>> = state
            .buffers
            .iter()
            .filter(|b| !b.is_empty() && b.last_log_id() >= start)
            .cloned()
            .collect();
        let first_buffered = buffers.first().map(|b| b.first_log_id()).unwrap_or_else(|| last.next());
        let files: VecDeque<WalFileInfo> = state
            .files
            .values()
            .filter(|f| f.last_log_id >= start && f.first_log_id < first_buffered)
            .cloned()
            .collect();

        RangeLogIterator::new(self.logger.clone(), guard, start, last, files, buffers).into()
    }
}

impl Drop for FileBasedWal {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            slog::error!(self.logger, "Failed to flush WAL on close: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitlog::{ListLogIterator, LogEntry, RECORD_OVERHEAD};

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    // Every buffer holds exactly 10 entries of `msg(..)` and every flush closes its file.
    fn small_policy() -> WalPolicy {
        WalPolicy {
            file_size: 1,
            buffer_size: 10 * (10 + RECORD_OVERHEAD) - 1,
            num_buffers: 2,
        }
    }

    fn msg(id: u64) -> Bytes {
        Bytes::from(format!("entry-{:04}", id))
    }

    fn append_range(wal: &FileBasedWal, ids: std::ops::RangeInclusive<u64>, term: u64) {
        for id in ids {
            wal.append_log(LogId::new(id), TermId::new(term), ClusterId::new(1), msg(id))
                .expect("append failed");
        }
    }

    fn collect_ids(mut it: LogIterator) -> Vec<u64> {
        let mut ids = vec![];
        while it.valid() {
            let record = it.record().unwrap();
            assert_eq!(record.msg, msg(record.id.as_u64()));
            ids.push(record.id.as_u64());
            it.advance();
        }
        ids
    }

    #[test]
    fn iterate_across_files_and_buffers() {
        // -- setup --
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();

        // -- execute --
        append_range(&wal, 1..=45, 1);

        // -- verify --
        assert_eq!(wal.wal_files().len(), 4);
        assert_eq!(wal.first_log_id(), LogId::new(1));
        assert_eq!(wal.last_log_id(), LogId::new(45));
        assert_eq!(collect_ids(wal.iterator(LogId::new(3), LogId::new(45))), (3..=45).collect::<Vec<_>>());
        assert_eq!(collect_ids(wal.iterator(LogId::new(38), LogId::new(100))), (38..=45).collect::<Vec<_>>());
    }

    #[test]
    fn range_starting_before_retained_logs_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), WalPolicy::default()).unwrap();
        append_range(&wal, 60..=70, 1);

        assert_eq!(wal.first_log_id(), LogId::new(60));
        assert!(!wal.iterator(LogId::new(50), LogId::new(70)).valid());
        assert!(!wal.iterator(LogId::new(71), LogId::new(80)).valid());
        assert!(!wal.iterator(LogId::new(65), LogId::new(64)).valid());
        assert!(wal.iterator(LogId::new(60), LogId::new(60)).valid());
    }

    #[test]
    fn iterator_ids_strictly_increase_then_stay_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();
        append_range(&wal, 1..=25, 2);

        let mut it = wal.iterator(LogId::new(1), LogId::new(25));
        let mut prev = LogId::default();
        while it.valid() {
            let id = it.log_id().unwrap();
            assert!(id > prev);
            prev = id;
            it.advance();
        }
        for _ in 0..3 {
            it.advance();
            assert!(!it.valid());
        }
        assert_eq!(prev, LogId::new(25));
    }

    #[test]
    fn non_contiguous_append_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), WalPolicy::default()).unwrap();
        append_range(&wal, 1..=3, 1);

        let result = wal.append_log(LogId::new(5), TermId::new(1), ClusterId::new(1), msg(5));

        assert!(matches!(result, Err(WalError::NonContiguous { .. })));
        assert_eq!(wal.last_log_id(), LogId::new(3));
    }

    #[test]
    fn reopen_recovers_position() {
        // -- setup --
        let dir = tempfile::tempdir().unwrap();
        {
            let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();
            append_range(&wal, 1..=15, 1);
            append_range(&wal, 16..=23, 2);
            // Dropping the WAL flushes what is left in memory.
        }

        // -- execute --
        let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();

        // -- verify --
        assert_eq!(wal.last_log_id(), LogId::new(23));
        assert_eq!(wal.last_log_term(), TermId::new(2));
        assert_eq!(wal.term_of(LogId::new(15)), Some(TermId::new(1)));
        assert_eq!(wal.term_of(LogId::new(16)), Some(TermId::new(2)));
        assert_eq!(collect_ids(wal.iterator(LogId::new(1), LogId::new(23))), (1..=23).collect::<Vec<_>>());

        append_range(&wal, 24..=26, 3);
        assert_eq!(collect_ids(wal.iterator(LogId::new(20), LogId::new(26))), (20..=26).collect::<Vec<_>>());
    }

    #[test]
    fn reopen_drops_files_before_gap() {
        let dir = tempfile::tempdir().unwrap();
        {
            let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();
            append_range(&wal, 1..=30, 1);
        }
        fs::remove_file(file::file_path(dir.path(), LogId::new(11))).unwrap();

        let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();

        assert_eq!(wal.first_log_id(), LogId::new(21));
        assert_eq!(wal.last_log_id(), LogId::new(30));
        assert!(!file::file_path(dir.path(), LogId::new(1)).exists());
    }

    #[test]
    fn rollback_truncates_buffers_and_files() {
        // -- setup --
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();
        append_range(&wal, 1..=35, 1);

        // -- execute --
        wal.rollback_to_log(LogId::new(14)).unwrap();

        // -- verify --
        assert_eq!(wal.last_log_id(), LogId::new(14));
        assert_eq!(wal.last_log_term(), TermId::new(1));
        assert_eq!(collect_ids(wal.iterator(LogId::new(1), LogId::new(35))), (1..=14).collect::<Vec<_>>());

        append_range(&wal, 15..=22, 4);
        assert_eq!(wal.term_of(LogId::new(22)), Some(TermId::new(4)));
        assert_eq!(collect_ids(wal.iterator(LogId::new(10), LogId::new(22))), (10..=22).collect::<Vec<_>>());

        drop(wal);
        let reopened = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();
        assert_eq!(reopened.last_log_id(), LogId::new(22));
        assert_eq!(reopened.term_of(LogId::new(15)), Some(TermId::new(4)));
    }

    #[test]
    fn rollback_within_current_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), WalPolicy::default()).unwrap();
        append_range(&wal, 1..=5, 1);

        wal.rollback_to_log(LogId::new(3)).unwrap();
        append_range(&wal, 4..=4, 2);

        assert_eq!(wal.last_log_id(), LogId::new(4));
        assert_eq!(wal.term_of(LogId::new(3)), Some(TermId::new(1)));
        assert_eq!(wal.term_of(LogId::new(4)), Some(TermId::new(2)));
        assert_eq!(wal.term_of(LogId::new(5)), None);
    }

    #[test]
    fn append_list_batch() {
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), WalPolicy::default()).unwrap();
        let entries = (1..=3)
            .map(|id| LogEntry {
                cluster: ClusterId::new(2),
                msg: msg(id),
            })
            .collect();
        let mut batch = ListLogIterator::new(LogId::new(1), TermId::new(6), entries).into();

        let last = wal.append_logs(&mut batch).unwrap();

        assert_eq!(last, Some(LogId::new(3)));
        assert!(!batch.valid());
        assert_eq!(wal.last_log_term(), TermId::new(6));
        assert_eq!(collect_ids(wal.iterator(LogId::new(1), LogId::new(3))), vec![1, 2, 3]);
    }

    #[test]
    fn rollover_starts_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), WalPolicy::default()).unwrap();

        append_range(&wal, 1..=3, 1);
        wal.rollover().unwrap();
        append_range(&wal, 4..=6, 1);
        wal.flush().unwrap();

        let files = wal.wal_files();
        assert_eq!(files.len(), 2);
        assert_eq!((files[0].first_log_id, files[0].last_log_id), (LogId::new(1), LogId::new(3)));
        assert_eq!((files[1].first_log_id, files[1].last_log_id), (LogId::new(4), LogId::new(6)));
    }

    #[test]
    fn clean_wal_removes_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let wal = FileBasedWal::open(test_logger(), dir.path(), small_policy()).unwrap();
        append_range(&wal, 1..=40, 1);

        let removed = wal.clean_wal(LogId::new(25)).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(wal.first_log_id(), LogId::new(21));
        assert!(!wal.iterator(LogId::new(5), LogId::new(40)).valid());
        assert_eq!(collect_ids(wal.iterator(LogId::new(21), LogId::new(40))), (21..=40).collect::<Vec<_>>());
    }
}
