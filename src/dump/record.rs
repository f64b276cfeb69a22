//! Dump record decoding
//!
//! Record 0 of a dump is [`DumpMetadata`]; every later record is an event
//! envelope carrying a base64 encoded protobuf payload.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlayerError, Result};

/// Stream metadata from the first record of a dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpMetadata {
    /// Names of the streams captured in the recording
    pub recorded_streams: Vec<String>,
    /// Wall-clock time the recording started (seconds since epoch)
    pub start_time: f64,
}

impl DumpMetadata {
    /// Create metadata for a recording
    pub fn new(recorded_streams: Vec<String>, start_time: f64) -> Self {
        Self {
            recorded_streams,
            start_time,
        }
    }

    /// Decode the metadata record
    pub fn decode(record: &str) -> Result<Self> {
        serde_json::from_str(record).map_err(|e| PlayerError::MalformedMetadata(e.to_string()))
    }

    /// Encode as a single-line JSON record
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PlayerError::MalformedMetadata(e.to_string()))
    }

    /// Recording start as a UTC timestamp, if representable
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        if !self.start_time.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis((self.start_time * 1000.0) as i64)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EventMeta {
    source_stream: String,
    record_time: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventRecord {
    meta: EventMeta,
    data_b64: String,
}

/// One recorded event
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    /// Zero-based position of the event within the dump (metadata excluded)
    pub index: u64,
    /// Stream the event was recorded from
    pub source_stream: String,
    /// Wall-clock time the event was recorded (seconds since epoch)
    pub record_time: f64,
    /// Raw protobuf payload
    pub payload: Vec<u8>,
}

impl EventEnvelope {
    /// Decode an event record; `index` is the zero-based event index
    pub fn decode(record: &str, index: u64) -> Result<Self> {
        let malformed = |reason: String| PlayerError::MalformedRecord { index, reason };

        let raw: EventRecord = serde_json::from_str(record).map_err(|e| malformed(e.to_string()))?;
        let payload = BASE64
            .decode(raw.data_b64.as_bytes())
            .map_err(|e| malformed(format!("invalid base64 payload: {}", e)))?;

        Ok(Self {
            index,
            source_stream: raw.meta.source_stream,
            record_time: raw.meta.record_time,
            payload,
        })
    }

    /// Encode as a single-line JSON record
    pub fn encode(&self) -> Result<String> {
        let raw = EventRecord {
            meta: EventMeta {
                source_stream: self.source_stream.clone(),
                record_time: self.record_time,
            },
            data_b64: BASE64.encode(&self.payload),
        };
        serde_json::to_string(&raw).map_err(|e| PlayerError::MalformedRecord {
            index: self.index,
            reason: e.to_string(),
        })
    }

    /// Offset of this event into the recording, in seconds
    pub fn offset_from(&self, metadata: &DumpMetadata) -> f64 {
        self.record_time - metadata.start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_metadata() {
        let meta =
            DumpMetadata::decode(r#"{"recorded_streams":["camA","camB"],"start_time":1000}"#)
                .unwrap();
        assert_eq!(meta.recorded_streams, vec!["camA", "camB"]);
        assert_eq!(meta.start_time, 1000.0);
        assert_eq!(meta.started_at().unwrap().timestamp(), 1000);
    }

    #[test]
    fn test_metadata_missing_field() {
        let err = DumpMetadata::decode(r#"{"recorded_streams":["camA"]}"#).unwrap_err();
        assert!(matches!(err, PlayerError::MalformedMetadata(_)));
    }

    #[test]
    fn test_decode_event() {
        let record = r#"{"meta":{"source_stream":"camA","record_time":1000.5},"data_b64":"CAES"}"#;
        let event = EventEnvelope::decode(record, 4).unwrap();
        assert_eq!(event.index, 4);
        assert_eq!(event.source_stream, "camA");
        assert_eq!(event.record_time, 1000.5);
        assert_eq!(event.payload, vec![0x08, 0x01, 0x12]);
    }

    #[test]
    fn test_event_invalid_base64() {
        let record = r#"{"meta":{"source_stream":"camA","record_time":1.0},"data_b64":"!!not base64!!"}"#;
        let err = EventEnvelope::decode(record, 2).unwrap_err();
        match err {
            PlayerError::MalformedRecord { index, reason } => {
                assert_eq!(index, 2);
                assert!(reason.contains("base64"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_event_wrong_timestamp_type() {
        let record = r#"{"meta":{"source_stream":"camA","record_time":"soon"},"data_b64":""}"#;
        assert!(matches!(
            EventEnvelope::decode(record, 0),
            Err(PlayerError::MalformedRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_event_encode_decode() {
        let event = EventEnvelope {
            index: 7,
            source_stream: "videosource:cam1".to_string(),
            record_time: 1234.25,
            payload: vec![1, 2, 3, 255],
        };
        let decoded = EventEnvelope::decode(&event.encode().unwrap(), 7).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_offset_from() {
        let meta = DumpMetadata::new(vec!["camA".into()], 1000.0);
        let event = EventEnvelope {
            index: 0,
            source_stream: "camA".into(),
            record_time: 1000.5,
            payload: Vec::new(),
        };
        assert_eq!(event.offset_from(&meta), 0.5);
    }
}
