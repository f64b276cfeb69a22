//! Mock construction helpers

use mockall::mock;
use saedump_player::backend::{MemoryPublisher, PublishStats, Publisher};
use saedump_player::session::StopSignal;
use std::time::{Duration, Instant};

mock! {
    pub Bus {}

    impl Publisher for Bus {
        fn publish(&mut self, channel: &str, payload: &[u8]) -> saedump_player::Result<()>;
        fn close(&mut self);
        fn describe(&self) -> String;
        fn stats(&self) -> PublishStats;
    }
}

/// Mock bus that accepts any publish and expects exactly one close
pub fn accepting_bus() -> MockBus {
    let mut bus = MockBus::new();
    bus.expect_describe().return_const("mock".to_string());
    bus.expect_close().times(1).return_const(());
    bus
}

/// Request a stop from another thread once `bus` holds `count` messages
pub fn stop_after_messages(
    bus: &MemoryPublisher,
    stop: &StopSignal,
    count: usize,
) -> std::thread::JoinHandle<()> {
    let bus = bus.clone();
    let stop = stop.clone();
    std::thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(10);
        while bus.len() < count && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(2));
        }
        stop.request_stop();
    })
}
