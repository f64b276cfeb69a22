//! Dump file access
//!
//! - [`RecordSplitter`] / [`DumpSource`] - lazy, restartable record stream over a dump file
//! - [`DumpMetadata`] / [`EventEnvelope`] - strict decoding of individual records
//! - [`DumpWriter`] - writes dumps in the layout the player reads

pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{DumpSource, RecordSplitter};
pub use record::{DumpMetadata, EventEnvelope};
pub use writer::DumpWriter;
