//! Streaming record splitter for dump files
//!
//! A dump is a text stream of top-level JSON objects. Objects may be separated
//! by newlines, other ASCII whitespace, `;` or `,`, and the whole stream may be
//! wrapped in `[` `]`. The splitter finds object boundaries by tracking brace
//! depth and string state, so it never needs more than one record in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{PlayerError, Result, ResultExt};

/// Bytes that may appear between top-level records
const SEPARATORS: &[u8] = b";,[]";

/// Largest record accepted before the dump is treated as corrupt
pub const MAX_RECORD_BYTES: usize = 64 * 1024 * 1024;

/// Lazy sequence of raw text records read from a dump source
///
/// The first record yielded is the metadata record, every later one is an
/// event. After an error the splitter yields nothing more until rewound.
#[derive(Debug)]
pub struct RecordSplitter<R> {
    inner: R,
    buf: Vec<u8>,
    records_read: u64,
    finished: bool,
    max_record_bytes: usize,
}

impl<R: BufRead + Seek> RecordSplitter<R> {
    /// Wrap a source positioned at the start of a dump
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            records_read: 0,
            finished: false,
            max_record_bytes: MAX_RECORD_BYTES,
        }
    }

    /// Fail any record larger than `limit` bytes instead of buffering it
    pub fn with_max_record_bytes(mut self, limit: usize) -> Self {
        self.max_record_bytes = limit;
        self
    }

    /// Number of complete records yielded so far in this pass
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Seek the source back to the start and reset all split state
    pub fn rewind(&mut self) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(0))
            .context("Rewinding dump source")?;
        self.buf.clear();
        self.records_read = 0;
        self.finished = false;
        Ok(())
    }

    fn malformed(&self, reason: impl Into<String>) -> PlayerError {
        match self.records_read {
            0 => PlayerError::MalformedMetadata(reason.into()),
            n => PlayerError::MalformedRecord {
                index: n - 1,
                reason: reason.into(),
            },
        }
    }

    /// Read the next complete record, or `None` on a clean end of file
    pub fn next_record(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        loop {
            let available = match self.inner.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if available.is_empty() {
                if depth == 0 {
                    return Ok(None);
                }
                return Err(self.malformed("unterminated record at end of file"));
            }

            let mut consumed = 0;
            let mut complete = false;
            let mut oversized = false;
            let mut stray = None;

            for &byte in available {
                consumed += 1;

                if depth == 0 {
                    if byte == b'{' {
                        depth = 1;
                        self.buf.push(byte);
                        if self.buf.len() > self.max_record_bytes {
                            oversized = true;
                            break;
                        }
                    } else if !byte.is_ascii_whitespace() && !SEPARATORS.contains(&byte) {
                        stray = Some(byte);
                        break;
                    }
                    continue;
                }

                self.buf.push(byte);
                if self.buf.len() > self.max_record_bytes {
                    oversized = true;
                    break;
                }

                if in_string {
                    if escaped {
                        escaped = false;
                    } else if byte == b'\\' {
                        escaped = true;
                    } else if byte == b'"' {
                        in_string = false;
                    }
                    continue;
                }

                match byte {
                    b'"' => in_string = true,
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            complete = true;
                            break;
                        }
                    }
                    _ => {}
                }
            }

            self.inner.consume(consumed);

            if oversized {
                self.buf.clear();
                return Err(self.malformed(format!(
                    "record exceeds {} bytes",
                    self.max_record_bytes
                )));
            }

            if let Some(byte) = stray {
                return Err(self.malformed(format!(
                    "unexpected byte 0x{:02X} between records",
                    byte
                )));
            }

            if complete {
                let record = String::from_utf8(std::mem::take(&mut self.buf))
                    .map_err(|e| self.malformed(format!("record is not valid UTF-8: {}", e)))?;
                self.records_read += 1;
                return Ok(Some(record));
            }
        }
    }
}

impl<R: BufRead + Seek> Iterator for RecordSplitter<R> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.next_record().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.finished = true;
        }
        item
    }
}

/// An open dump file owned by one playback engine
///
/// Each playback pass calls [`DumpSource::pass`], which seeks the same handle
/// back to the start and builds a fresh splitter over it.
#[derive(Debug)]
pub struct DumpSource {
    path: PathBuf,
    reader: BufReader<File>,
}

impl DumpSource {
    /// Open a dump file for playback
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).with_context(|| format!("Opening dump {:?}", path))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
        })
    }

    /// Path the dump was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a new pass over the dump from its first record
    pub fn pass(&mut self) -> Result<RecordSplitter<&mut BufReader<File>>> {
        let mut splitter = RecordSplitter::new(&mut self.reader);
        splitter.rewind()?;
        Ok(splitter)
    }
}
