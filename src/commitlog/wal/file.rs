use crate::commitlog::{ClusterId, LogId, LogRecord, TermId, WalError};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Byte representation of one record in a WAL file:
///
/// ```text
/// | 0 ... 7 | 8 ... 15 | 16 .. 19 | 20 ... 27 | 28 ...      | +0 .. +3 |
/// +---------+----------+----------+-----------+-------...---+----------+
/// | LogId   | TermId   | MsgLen   | ClusterId | Msg         | MsgLen   |
/// +---------+----------+----------+-----------+-------...---+----------+
/// ```
///
/// All integers are little endian. The trailing `MsgLen` repeats the header's and is how a torn
/// write at the tail of a file is detected.
const RECORD_HEADER_LEN: usize = 8 + 8 + 4 + 8;
const RECORD_FOOTER_LEN: usize = 4;

pub(super) const WAL_FILE_EXTENSION: &str = "wal";

pub(super) fn record_len(msg_len: usize) -> u64 {
    (RECORD_HEADER_LEN + msg_len + RECORD_FOOTER_LEN) as u64
}

pub(super) fn encode_record(buf: &mut BytesMut, id: LogId, term: TermId, cluster: ClusterId, msg: &[u8]) {
    buf.reserve(record_len(msg.len()) as usize);
    buf.put_u64_le(id.as_u64());
    buf.put_u64_le(term.as_u64());
    buf.put_u32_le(msg.len() as u32);
    buf.put_u64_le(cluster.as_u64());
    buf.put_slice(msg);
    buf.put_u32_le(msg.len() as u32);
}

#[derive(Debug, thiserror::Error)]
pub(super) enum RecordError {
    #[error("Record is truncated")]
    Torn,
    #[error("Record footer {footer} does not match length {len}")]
    FooterMismatch { len: u32, footer: u32 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Reads the next record. `Ok(None)` on a clean end of file.
pub(super) fn read_record<R: Read>(reader: &mut R) -> Result<Option<LogRecord>, RecordError> {
    let mut header = [0u8; RECORD_HEADER_LEN];
    match read_fully(reader, &mut header)? {
        0 => return Ok(None),
        n if n < RECORD_HEADER_LEN => return Err(RecordError::Torn),
        _ => {}
    }

    let mut header = &header[..];
    let id = LogId::new(header.get_u64_le());
    let term = TermId::new(header.get_u64_le());
    let len = header.get_u32_le();
    let cluster = ClusterId::new(header.get_u64_le());

    // Sized by the bytes actually present; the length in the header may be corrupt.
    let body_len = len as usize + RECORD_FOOTER_LEN;
    let mut body = Vec::new();
    reader.by_ref().take(body_len as u64).read_to_end(&mut body)?;
    if body.len() < body_len {
        return Err(RecordError::Torn);
    }

    let footer = (&body[len as usize..]).get_u32_le();
    if footer != len {
        return Err(RecordError::FooterMismatch { len, footer });
    }
    body.truncate(len as usize);

    Ok(Some(LogRecord {
        id,
        term,
        cluster,
        msg: Bytes::from(body),
    }))
}

// Like `read_exact`, but reports how much was read instead of failing on EOF.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}

/// Metadata about one WAL file on disk.
#[derive(Clone, Debug)]
pub struct WalFileInfo {
    pub path: PathBuf,
    pub first_log_id: LogId,
    pub last_log_id: LogId,
    pub last_log_term: TermId,
    pub size: u64,
    pub mtime: DateTime<Utc>,
}

impl WalFileInfo {
    pub fn contains(&self, id: LogId) -> bool {
        self.first_log_id <= id && id <= self.last_log_id
    }

    pub(super) fn refresh_mtime(&mut self) {
        if let Ok(modified) = fs::metadata(&self.path).and_then(|m| m.modified()) {
            self.mtime = DateTime::<Utc>::from(modified);
        }
    }
}

pub(super) fn file_path(dir: &Path, first_log_id: LogId) -> PathBuf {
    dir.join(format!("{:019}.{}", first_log_id.as_u64(), WAL_FILE_EXTENSION))
}

/// Parses `0000000000000000042.wal` into `LogId(42)`.
pub(super) fn parse_file_name(path: &Path) -> Option<LogId> {
    if path.extension()?.to_str()? != WAL_FILE_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse::<u64>().ok().map(LogId::new)
}

/// Outcome of validating a file found on startup.
pub(super) enum ScannedFile {
    Valid(WalFileInfo),
    Empty,
}

/// Walks every record of the file, checking ids are contiguous from the id in its name. A torn
/// or corrupt tail is cut off so the file ends at its last complete record.
pub(super) fn scan_file(logger: &slog::Logger, path: &Path, first_log_id: LogId) -> Result<ScannedFile, WalError> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut expected = first_log_id;
    let mut last_term = TermId::default();
    let mut valid_len = 0u64;

    loop {
        match read_record(&mut reader) {
            Ok(Some(record)) => {
                if record.id != expected {
                    return Err(WalError::CorruptFile {
                        path: path.to_path_buf(),
                        reason: format!("Expected log {:?}, found {:?}", expected, record.id),
                    });
                }
                valid_len += record_len(record.msg.len());
                last_term = record.term;
                expected = expected.next();
            }
            Ok(None) => break,
            Err(RecordError::Io(e)) => return Err(WalError::Io(e)),
            Err(e) => {
                slog::warn!(
                    logger,
                    "Truncating {:?} to {} bytes after last complete record: {}",
                    path,
                    valid_len,
                    e
                );
                truncate_file(path, valid_len)?;
                break;
            }
        }
    }

    if expected == first_log_id {
        return Ok(ScannedFile::Empty);
    }

    let mut info = WalFileInfo {
        path: path.to_path_buf(),
        first_log_id,
        last_log_id: expected.prev(),
        last_log_term: last_term,
        size: valid_len,
        mtime: Utc::now(),
    };
    info.refresh_mtime();

    Ok(ScannedFile::Valid(info))
}

/// Cuts the file right after record `last_id`. Returns the updated info, or `None` if nothing
/// remains and the file was removed.
pub(super) fn truncate_after(info: &WalFileInfo, last_id: LogId) -> Result<Option<WalFileInfo>, WalError> {
    let mut reader = BufReader::new(File::open(&info.path)?);

    let mut len = 0u64;
    let mut last_term = TermId::default();
    while let Some(record) = read_record(&mut reader).map_err(|e| corrupt(&info.path, e))? {
        if record.id > last_id {
            break;
        }
        len += record_len(record.msg.len());
        last_term = record.term;
    }

    if last_id < info.first_log_id {
        fs::remove_file(&info.path)?;
        return Ok(None);
    }

    truncate_file(&info.path, len)?;

    let mut truncated = WalFileInfo {
        last_log_id: last_id,
        last_log_term: last_term,
        size: len,
        ..info.clone()
    };
    truncated.refresh_mtime();

    Ok(Some(truncated))
}

fn truncate_file(path: &Path, len: u64) -> io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()
}

pub(super) fn corrupt(path: &Path, e: RecordError) -> WalError {
    match e {
        RecordError::Io(e) => WalError::Io(e),
        other => WalError::CorruptFile {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

/// Sequential reader over the records of one file.
pub(super) struct WalFileReader {
    info: WalFileInfo,
    reader: BufReader<File>,
}

impl WalFileReader {
    pub(super) fn open(info: WalFileInfo) -> io::Result<Self> {
        let reader = BufReader::new(File::open(&info.path)?);
        Ok(WalFileReader { info, reader })
    }

    pub(super) fn info(&self) -> &WalFileInfo {
        &self.info
    }

    pub(super) fn next_record(&mut self) -> Result<Option<LogRecord>, WalError> {
        read_record(&mut self.reader).map_err(|e| corrupt(&self.info.path, e))
    }
}
