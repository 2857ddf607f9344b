//! Data Model: what one `execute` call reports about itself
use serde::{Deserialize, Serialize};

/// Summary of one compile-and-run round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub pipeline_id: String,
    /// blake3 fingerprint of every generated source file.
    pub source_hash: String,
    /// Bytes delivered to the driver's standard input.
    pub bytes_written: usize,
    /// Bytes collected from the driver's standard output.
    pub bytes_read: usize,
    pub build_ms: u64,
    pub run_ms: u64,
}
