//! Test data builders for dumps and payloads

use saedump_player::dump::{DumpMetadata, EventEnvelope};
use std::path::PathBuf;

/// Recording start used by builders unless overridden
pub const START_TIME: f64 = 1_700_000_000.0;

#[derive(Clone, PartialEq, prost::Message)]
pub struct VideoFrame {
    #[prost(string, tag = "1")]
    pub source_id: String,
    #[prost(uint64, tag = "2")]
    pub timestamp_utc_ms: u64,
    #[prost(bytes = "vec", tag = "4")]
    pub frame_data: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Detection {
    #[prost(float, tag = "1")]
    pub confidence: f32,
    #[prost(uint32, tag = "2")]
    pub class_id: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SaeMessage {
    #[prost(message, optional, tag = "1")]
    pub frame: Option<VideoFrame>,
    #[prost(message, repeated, tag = "2")]
    pub detections: Vec<Detection>,
}

/// Builder for SaeMessage payloads
pub struct FrameBuilder {
    message: SaeMessage,
}

impl FrameBuilder {
    pub fn new(source_id: &str) -> Self {
        Self {
            message: SaeMessage {
                frame: Some(VideoFrame {
                    source_id: source_id.to_string(),
                    timestamp_utc_ms: 1,
                    frame_data: vec![0x5A; 32],
                }),
                detections: Vec::new(),
            },
        }
    }

    pub fn timestamp(mut self, timestamp_utc_ms: u64) -> Self {
        if let Some(frame) = self.message.frame.as_mut() {
            frame.timestamp_utc_ms = timestamp_utc_ms;
        }
        self
    }

    pub fn detection(mut self, confidence: f32, class_id: u32) -> Self {
        self.message.detections.push(Detection {
            confidence,
            class_id,
        });
        self
    }

    pub fn build(self) -> SaeMessage {
        self.message
    }

    pub fn encode(self) -> Vec<u8> {
        prost::Message::encode_to_vec(&self.message)
    }
}

/// Builder for dump files
pub struct DumpBuilder {
    metadata: DumpMetadata,
    records: Vec<String>,
    separator: String,
}

impl DumpBuilder {
    pub fn new(streams: &[&str]) -> Self {
        Self {
            metadata: DumpMetadata::new(streams.iter().map(|s| s.to_string()).collect(), START_TIME),
            records: Vec::new(),
            separator: "\n".to_string(),
        }
    }

    pub fn start_time(mut self, start_time: f64) -> Self {
        self.metadata.start_time = start_time;
        self
    }

    pub fn separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// Append an event recorded `offset` seconds after the start
    pub fn event(mut self, stream: &str, offset: f64, payload: Vec<u8>) -> Self {
        let event = EventEnvelope {
            index: self.records.len() as u64,
            source_stream: stream.to_string(),
            record_time: self.metadata.start_time + offset,
            payload,
        };
        self.records.push(event.encode().unwrap());
        self
    }

    /// Append an event with a default frame payload
    pub fn frame(self, stream: &str, offset: f64) -> Self {
        let payload = FrameBuilder::new(stream).encode();
        self.event(stream, offset, payload)
    }

    /// Append a record verbatim
    pub fn raw(mut self, record: &str) -> Self {
        self.records.push(record.to_string());
        self
    }

    pub fn contents(&self) -> String {
        let mut out = self.metadata.encode().unwrap();
        for record in &self.records {
            out.push_str(&self.separator);
            out.push_str(record);
        }
        out.push('\n');
        out
    }

    pub fn write(self, dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("capture.saedump");
        std::fs::write(&path, self.contents()).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_builder_layout() {
        let contents = DumpBuilder::new(&["camA"])
            .frame("camA", 0.5)
            .separator(";")
            .contents();
        assert!(contents.starts_with("{\"recorded_streams\":[\"camA\"]"));
        assert!(contents.contains("\"source_stream\":\"camA\""));
    }
}
