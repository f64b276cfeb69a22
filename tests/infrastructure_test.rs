//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{DumpBuilder, FrameBuilder, SaeMessage};
use prost::Message;
use saedump_player::dump::{DumpSource, EventEnvelope};
use std::time::Duration;

#[test]
fn test_infrastructure_setup() {
    let dir = tempfile::tempdir().unwrap();
    let path = DumpBuilder::new(&["camA"])
        .start_time(100.0)
        .frame("camA", 1.5)
        .write(&dir);

    let mut source = DumpSource::open(&path).unwrap();
    let records: Vec<String> = source.pass().unwrap().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);

    let event = EventEnvelope::decode(&records[1], 0).unwrap();
    assert_eq!(event.source_stream, "camA");
    assert_eq!(event.record_time, 101.5);

    let message = SaeMessage::decode(&event.payload[..]).unwrap();
    assert_eq!(message, FrameBuilder::new("camA").build());
}

#[test]
fn test_duration_comparison() {
    common::assert_duration_near(
        Duration::from_millis(505),
        Duration::from_millis(500),
        Duration::from_millis(10),
    );
}

#[test]
#[should_panic]
fn test_duration_comparison_fails() {
    common::assert_duration_near(
        Duration::from_millis(600),
        Duration::from_millis(500),
        Duration::from_millis(10),
    );
}
