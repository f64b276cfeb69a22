//! Newline-delimited dump writer
//!
//! Produces dumps in the same record layout the player reads. Used to build
//! fixtures and to re-export trimmed recordings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, ResultExt};

use super::record::{DumpMetadata, EventEnvelope};

/// Writes a metadata record followed by event records, one per line
#[derive(Debug)]
pub struct DumpWriter<W: Write> {
    inner: W,
    events_written: u64,
}

impl DumpWriter<BufWriter<File>> {
    /// Create a dump file, truncating any existing one
    pub fn create(path: impl AsRef<Path>, metadata: &DumpMetadata) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Creating dump {:?}", path))?;
        Self::new(BufWriter::new(file), metadata)
    }
}

impl<W: Write> DumpWriter<W> {
    /// Start a dump on any writer by emitting the metadata record
    pub fn new(mut inner: W, metadata: &DumpMetadata) -> Result<Self> {
        writeln!(inner, "{}", metadata.encode()?)?;
        Ok(Self {
            inner,
            events_written: 0,
        })
    }

    /// Append one event record
    pub fn write_event(&mut self, event: &EventEnvelope) -> Result<()> {
        writeln!(self.inner, "{}", event.encode()?)?;
        self.events_written += 1;
        Ok(())
    }

    /// Number of events appended so far
    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::RecordSplitter;
    use std::io::Cursor;

    #[test]
    fn test_written_dump_splits_back() {
        let meta = DumpMetadata::new(vec!["camA".into()], 10.0);
        let mut writer = DumpWriter::new(Vec::new(), &meta).unwrap();
        for i in 0..3u64 {
            writer
                .write_event(&EventEnvelope {
                    index: i,
                    source_stream: "camA".into(),
                    record_time: 10.0 + i as f64,
                    payload: vec![i as u8],
                })
                .unwrap();
        }
        assert_eq!(writer.events_written(), 3);
        let bytes = writer.finish().unwrap();

        let mut records = RecordSplitter::new(Cursor::new(bytes));
        let first = records.next().unwrap().unwrap();
        assert_eq!(DumpMetadata::decode(&first).unwrap(), meta);

        let events: Vec<EventEnvelope> = records
            .enumerate()
            .map(|(i, r)| EventEnvelope::decode(&r.unwrap(), i as u64).unwrap())
            .collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].payload, vec![2]);
        assert_eq!(events[2].record_time, 12.0);
    }
}
