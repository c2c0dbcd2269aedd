use std::time::Instant;

use tcpmsg::Node;

use crate::caller::Caller;
use crate::{Pattern, SampleResult};

/// Offset added to the logical request id for the i-th call of one
/// sequential round, so the per-worker ids never collide. The offset has no
/// meaning beyond uniqueness.
pub const SEQUENTIAL_ID_STRIDE: u64 = 1_000_000;

/// Dispatches one logical sample according to the selected pattern and
/// combines the per-worker outcomes into one `SampleResult`.
pub struct TopologyRunner {
    pattern: Pattern,
    callers: Vec<Caller>,
}

impl TopologyRunner {
    /// Refuses an empty worker list up front, before any sample is taken.
    pub fn new(pattern: Pattern, workers: &[Node]) -> anyhow::Result<Self> {
        if workers.is_empty() {
            anyhow::bail!("no workers configured for pattern {}", pattern);
        }
        let callers = workers.iter().cloned().map(Caller::new).collect();
        Ok(TopologyRunner { pattern, callers })
    }

    #[inline]
    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.callers.len()
    }

    /// Dial every worker once so the first samples do not pay connection
    /// setup. An unreachable worker is logged and left for its samples to
    /// record as failures; it does not abort the run.
    pub fn connect_all(&mut self) {
        for caller in &mut self.callers {
            match caller.ensure_connected() {
                Ok(()) => log::debug!("connected to worker {}", caller.node()),
                Err(e) => log::warn!("worker {} not reachable: {}", caller.node(), e),
            }
        }
    }

    pub fn execute(&mut self, request_id: u64, payload_size: usize) -> SampleResult {
        match self.pattern {
            Pattern::Direct => self.run_direct(request_id, payload_size),
            Pattern::Sequential => self.run_sequential(request_id, payload_size),
            Pattern::TwoHop => self.run_twohop(request_id, payload_size),
        }
    }

    fn run_direct(&mut self, request_id: u64, payload_size: usize) -> SampleResult {
        let index = direct_worker_index(request_id, self.callers.len());
        let outcome = self.callers[index].measure(request_id, payload_size);
        SampleResult {
            payload_size,
            latency_ms: outcome.latency_ms,
            success: outcome.success,
            pattern: Pattern::Direct,
            request_timestamp: outcome.request_timestamp,
            response_timestamp: outcome.response_timestamp,
        }
    }

    fn run_sequential(&mut self, request_id: u64, payload_size: usize) -> SampleResult {
        let mut success = true;
        let mut request_timestamp = 0;
        let mut response_timestamp = 0;

        // latency is the wall-clock span of the whole round, not a sum of
        // the per-call measurements
        let start = Instant::now();
        for (i, caller) in self.callers.iter_mut().enumerate() {
            let id = request_id + i as u64 * SEQUENTIAL_ID_STRIDE;
            let outcome = caller.measure(id, payload_size);
            // one worker failing must not cut the round short
            success &= outcome.success;
            if i == 0 {
                request_timestamp = outcome.request_timestamp;
            }
            response_timestamp = outcome.response_timestamp;
        }
        let latency_ms = start.elapsed().as_nanos() as f64 / 1e6;

        SampleResult {
            payload_size,
            latency_ms,
            success,
            pattern: Pattern::Sequential,
            request_timestamp,
            response_timestamp,
        }
    }

    fn run_twohop(&mut self, request_id: u64, payload_size: usize) -> SampleResult {
        // the chain behind the first worker is the workers' concern; the
        // head sees a single call
        let outcome = self.callers[0].measure(request_id, payload_size);
        SampleResult {
            payload_size,
            latency_ms: outcome.latency_ms,
            success: outcome.success,
            pattern: Pattern::TwoHop,
            request_timestamp: outcome.request_timestamp,
            response_timestamp: outcome.response_timestamp,
        }
    }
}

/// Round-robin assignment for the direct pattern. Request ids start at 1,
/// workers are zero-indexed, so id sequences map to workers
/// deterministically across runs.
#[inline]
pub fn direct_worker_index(request_id: u64, num_workers: usize) -> usize {
    debug_assert!(request_id >= 1);
    ((request_id - 1) % num_workers as u64) as usize
}
