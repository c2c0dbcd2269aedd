use serde::{Deserialize, Serialize};

/// Size of the fixed acknowledgement a worker attaches to every response it
/// answers itself.
pub const ACK_SIZE: usize = 512;

/// Sent by the head, or relayed verbatim by a forwarding worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchRequest {
    pub request_id: u64,
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    /// send time, nanoseconds since the unix epoch
    pub timestamp: i64,
}

/// Answer to one `BenchRequest`. For a forwarding chain this is produced by
/// the last hop and relayed back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchResponse {
    pub request_id: u64,
    #[serde(with = "serde_bytes")]
    pub acknowledgement: Vec<u8>,
    pub request_timestamp: i64,
    pub response_timestamp: i64,
    pub success: bool,
}

/// Synthetic request body of `size` bytes.
pub fn filler_payload(size: usize) -> Vec<u8> {
    vec![b'X'; size]
}

/// The deterministic 512-byte acknowledgement body.
pub fn ack_payload() -> Vec<u8> {
    (0..ACK_SIZE).map(|i| b'A' + (i % 26) as u8).collect()
}

pub fn now_nanos() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as i64
}
