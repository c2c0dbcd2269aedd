use crate::sink::ResultSink;
use crate::stats::{SizeSummary, SummaryMode};
use crate::topology::TopologyRunner;

/// Untimed samples run before the measured sweep.
pub const WARMUP_COUNT: usize = 10;
pub const WARMUP_PAYLOAD_SIZE: usize = 1024;

/// Payload-size sweep parameters.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub increment: usize,
    pub samples_per_size: usize,
    pub summary: SummaryMode,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            min_size: 16,
            max_size: 8192,
            increment: 16,
            samples_per_size: 100,
            summary: SummaryMode::Mean,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_size > self.max_size {
            anyhow::bail!(
                "min payload size {} exceeds max payload size {}",
                self.min_size,
                self.max_size
            );
        }
        if self.increment == 0 {
            anyhow::bail!("payload size increment must be positive");
        }
        if self.samples_per_size == 0 {
            anyhow::bail!("samples per size must be positive");
        }
        Ok(())
    }

    /// All payload sizes of the sweep in driving order.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::new();
        let mut size = self.min_size;
        while size <= self.max_size {
            sizes.push(size);
            size += self.increment;
        }
        sizes
    }
}

/// Drives warmup plus the measured sweep and owns the request id counter.
/// Ids start at 1, increase monotonically across the whole run (warmup
/// included) and are never reused.
pub struct SweepDriver {
    topology: TopologyRunner,
    config: SweepConfig,
    next_request_id: u64,
}

impl SweepDriver {
    /// Validates the configuration; an invalid sweep never issues a sample.
    pub fn new(topology: TopologyRunner, config: SweepConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(SweepDriver {
            topology,
            config,
            next_request_id: 1,
        })
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Run the whole benchmark, appending every measured sample to `sink`
    /// in dispatch order. Warmup results are discarded.
    pub fn run(&mut self, sink: &mut ResultSink) -> anyhow::Result<()> {
        log::info!(
            "pattern: {}",
            self.topology.pattern().describe(self.topology.num_workers())
        );
        log::info!(
            "sweep: {} to {} bytes, increment {}, {} samples per size",
            self.config.min_size,
            self.config.max_size,
            self.config.increment,
            self.config.samples_per_size
        );

        self.topology.connect_all();

        log::info!("warmup: {} samples of {} bytes", WARMUP_COUNT, WARMUP_PAYLOAD_SIZE);
        for _ in 0..WARMUP_COUNT {
            let id = self.next_request_id();
            let _ = self.topology.execute(id, WARMUP_PAYLOAD_SIZE);
        }
        log::info!("warmup complete");

        for size in self.config.sizes() {
            let mut latencies = Vec::with_capacity(self.config.samples_per_size);
            for _ in 0..self.config.samples_per_size {
                let id = self.next_request_id();
                let result = self.topology.execute(id, size);
                if result.success {
                    latencies.push(result.latency_ms);
                }
                sink.record(result);
            }
            self.report_size(size, &latencies);
        }

        Ok(())
    }

    fn report_size(&self, size: usize, latencies: &[f64]) {
        let total = self.config.samples_per_size;
        if latencies.is_empty() {
            log::warn!("payload {} bytes: all {} requests failed", size, total);
            return;
        }

        let summary = SizeSummary::compute(latencies);
        match self.config.summary {
            SummaryMode::Mean => log::info!(
                "payload {} bytes: mean {:.3} ms, success {}/{}",
                size,
                summary.mean,
                latencies.len(),
                total
            ),
            SummaryMode::Percentiles => log::info!(
                "payload {} bytes: mean {:.3} ms, median {:.3} ms, p95 {:.3} ms, p99 {:.3} ms, success {}/{}",
                size,
                summary.mean,
                summary.median,
                summary.p95,
                summary.p99,
                latencies.len(),
                total
            ),
        }
    }
}
