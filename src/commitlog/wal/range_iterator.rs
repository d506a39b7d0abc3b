use crate::commitlog::wal::file::WalFileReader;
use crate::commitlog::wal::WalFileInfo;
use crate::commitlog::{InMemoryLogBuffer, LogId, LogRecord, PreconditionError, WalError};
use parking_lot::lock_api::ArcRwLockReadGuard;
use parking_lot::RawRwLock;
use std::collections::VecDeque;
use std::sync::Arc;

/// Cursor over `[curr, last]` of a WAL. Ids below the first buffered id are read from files,
/// the rest from the buffers captured at construction.
///
/// Holds the WAL's rollover lock in shared mode until dropped.
pub struct RangeLogIterator {
    logger: slog::Logger,
    _rollover_guard: ArcRwLockReadGuard<RawRwLock, ()>,
    curr: LogId,
    last: LogId,
    current: Option<LogRecord>,
    files: VecDeque<WalFileInfo>,
    reader: Option<WalFileReader>,
    buffers: Vec<Arc<InMemoryLogBuffer>>,
    buffer_idx: usize,
    first_buffered_id: LogId,
}

impl RangeLogIterator {
    pub(super) fn new(
        logger: slog::Logger,
        rollover_guard: ArcRwLockReadGuard<RawRwLock, ()>,
        start: LogId,
        last: LogId,
        files: VecDeque<WalFileInfo>,
        buffers: Vec<Arc<InMemoryLogBuffer>>,
    ) -> Self {
        let first_buffered_id = buffers
            .first()
            .map(|b| b.first_log_id())
            .unwrap_or_else(|| last.next());

        let mut it = RangeLogIterator {
            logger,
            _rollover_guard: rollover_guard,
            curr: start,
            last,
            current: None,
            files,
            reader: None,
            buffers,
            buffer_idx: 0,
            first_buffered_id,
        };
        it.load();
        it
    }

    pub(super) fn empty(rollover_guard: ArcRwLockReadGuard<RawRwLock, ()>) -> Self {
        RangeLogIterator {
            logger: slog::Logger::root(slog::Discard, slog::o!()),
            _rollover_guard: rollover_guard,
            curr: LogId::new(1),
            last: LogId::default(),
            current: None,
            files: VecDeque::new(),
            reader: None,
            buffers: vec![],
            buffer_idx: 0,
            first_buffered_id: LogId::default(),
        }
    }

    pub(crate) fn valid(&self) -> bool {
        self.current.is_some()
    }

    pub(crate) fn advance(&mut self) {
        if self.current.is_some() {
            self.curr = self.curr.next();
            self.load();
        }
    }

    pub(crate) fn current(&self) -> Result<&LogRecord, PreconditionError> {
        self.current.as_ref().ok_or(PreconditionError::InvalidIteratorAccess)
    }

    fn load(&mut self) {
        if self.curr > self.last {
            self.current = None;
            return;
        }

        let loaded = if self.curr >= self.first_buffered_id {
            self.load_from_buffers()
        } else {
            self.load_from_files()
        };

        match loaded {
            Ok(Some(record)) => self.current = Some(record),
            Ok(None) => {
                slog::error!(self.logger, "Log {:?} missing from WAL", self.curr);
                self.current = None;
            }
            Err(e) => {
                slog::error!(self.logger, "Failed to read log {:?} from WAL: {}", self.curr, e);
                self.current = None;
            }
        }
    }

    fn load_from_buffers(&mut self) -> Result<Option<LogRecord>, WalError> {
        // Drop the file reader once past the files.
        self.reader = None;

        while let Some(buffer) = self.buffers.get(self.buffer_idx) {
            if let Some(record) = buffer.get_record(self.curr) {
                return Ok(Some(record));
            }
            self.buffer_idx += 1;
        }
        Ok(None)
    }

    fn load_from_files(&mut self) -> Result<Option<LogRecord>, WalError> {
        let needs_open = match &self.reader {
            Some(reader) => !reader.info().contains(self.curr),
            None => true,
        };
        if needs_open && !self.open_file_containing_curr()? {
            return Ok(None);
        }

        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(None),
        };

        // Records are read in order; skip up to the position when first seeking into a file.
        loop {
            match reader.next_record()? {
                Some(record) if record.id == self.curr => return Ok(Some(record)),
                Some(record) if record.id < self.curr => continue,
                _ => return Ok(None),
            }
        }
    }

    fn open_file_containing_curr(&mut self) -> Result<bool, WalError> {
        self.reader = None;
        while let Some(info) = self.files.pop_front() {
            if info.contains(self.curr) {
                self.reader = Some(WalFileReader::open(info)?);
                return Ok(true);
            }
        }
        Ok(false)
    }
}
