use std::net::TcpStream;
use std::time::{Duration, Instant};

use tcpmsg::{utils, Node};

use crate::message::{self, BenchRequest, BenchResponse};

/// Per-call deadline, applied to connect, send and receive.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one timed call against one worker.
#[derive(Debug, Clone, Copy)]
pub struct CallOutcome {
    pub latency_ms: f64,
    pub success: bool,
    pub request_timestamp: i64,
    pub response_timestamp: i64,
}

/// Issues timed requests against a single worker over a cached connection.
/// A transport error drops the connection; the next call redials.
pub struct Caller {
    node: Node,
    stream: Option<TcpStream>,
}

impl Caller {
    pub fn new(node: Node) -> Self {
        Caller { node, stream: None }
    }

    #[inline]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Dial the worker eagerly, retrying with backoff. Only meant for
    /// startup; per-call redials use a single attempt so that a dead worker
    /// costs one failed sample, not a backoff sleep inside the measurement.
    pub fn ensure_connected(&mut self) -> anyhow::Result<()> {
        if self.stream.is_none() {
            let stream = utils::connect_retry(&self.node, 5)?;
            Self::configure(&stream)?;
            self.stream = Some(stream);
        }
        Ok(())
    }

    fn configure(stream: &TcpStream) -> anyhow::Result<()> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(CALL_TIMEOUT))?;
        stream.set_write_timeout(Some(CALL_TIMEOUT))?;
        Ok(())
    }

    /// One timed round trip. Never fails: a transport error or a worker
    /// answering success=false both come back as `success = false`, and the
    /// cause is logged for diagnostics.
    pub fn measure(&mut self, request_id: u64, payload_size: usize) -> CallOutcome {
        let request = BenchRequest {
            request_id,
            payload: message::filler_payload(payload_size),
            timestamp: message::now_nanos(),
        };

        let start = Instant::now();
        let result = self.round_trip(&request);
        let latency_ms = start.elapsed().as_nanos() as f64 / 1e6;

        match result {
            Ok(response) => {
                if !response.success {
                    log::warn!("request {} reported failure by {}", request_id, self.node);
                }
                CallOutcome {
                    latency_ms,
                    success: response.success,
                    request_timestamp: request.timestamp,
                    response_timestamp: response.response_timestamp,
                }
            }
            Err(e) => {
                self.stream = None;
                log::warn!("request {} to {} failed: {}", request_id, self.node, e);
                CallOutcome {
                    latency_ms,
                    success: false,
                    request_timestamp: request.timestamp,
                    response_timestamp: 0,
                }
            }
        }
    }

    fn round_trip(&mut self, request: &BenchRequest) -> anyhow::Result<BenchResponse> {
        if self.stream.is_none() {
            let stream = utils::connect_timeout(&self.node, CALL_TIMEOUT)?;
            Self::configure(&stream)?;
            self.stream = Some(stream);
        }
        let stream = self.stream.as_mut().unwrap();
        utils::send_cmd_sync(stream, request)?;
        let response = utils::recv_cmd_sync(stream)?;
        Ok(response)
    }
}
