use std::path::PathBuf;

use structopt::StructOpt;

use latbench::sink::{ResultSink, Schema};
use latbench::stats::SummaryMode;
use latbench::sweep::{SweepConfig, SweepDriver};
use latbench::topology::TopologyRunner;
use latbench::{Node, Pattern};

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "head", about = "Benchmark head node")]
struct Opts {
    /// Communication pattern: direct, sequential or twohop
    #[structopt(long = "pattern", default_value = "direct")]
    pattern: Pattern,
    /// Comma-separated worker addresses
    #[structopt(long = "workers", use_delimiter = true, default_value = "localhost:50051")]
    workers: Vec<Node>,
    /// Minimum payload size in bytes
    #[structopt(long = "min-size", default_value = "16")]
    min_size: usize,
    /// Maximum payload size in bytes
    #[structopt(long = "max-size", default_value = "8192")]
    max_size: usize,
    /// Payload size increment in bytes
    #[structopt(long = "increment", default_value = "16")]
    increment: usize,
    /// Number of samples per payload size
    #[structopt(long = "samples", default_value = "100")]
    samples: usize,
    /// Directory the result csv is written to
    #[structopt(long = "output-dir", default_value = "csvfiles")]
    output_dir: PathBuf,
    /// Also write request/response timestamps to the csv
    #[structopt(long = "timestamps")]
    timestamps: bool,
    /// Report median/p95/p99 per payload size instead of mean only
    #[structopt(long = "percentiles")]
    percentiles: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init_log();
    let opts = Opts::from_args();

    log::info!("benchmark head starting, pattern: {}", opts.pattern);
    log::info!(
        "workers: {}",
        opts.workers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let topology = TopologyRunner::new(opts.pattern, &opts.workers)?;
    let config = SweepConfig {
        min_size: opts.min_size,
        max_size: opts.max_size,
        increment: opts.increment,
        samples_per_size: opts.samples,
        summary: if opts.percentiles {
            SummaryMode::Percentiles
        } else {
            SummaryMode::Mean
        },
    };
    let mut driver = SweepDriver::new(topology, config)?;

    let schema = if opts.timestamps {
        Schema::Timestamps
    } else {
        Schema::Minimal
    };
    let mut sink = ResultSink::new(opts.pattern, &opts.output_dir, schema);

    // give freshly started workers a moment to come up
    std::thread::sleep(std::time::Duration::from_millis(500));

    driver.run(&mut sink)?;

    let total = sink.len();
    let path = sink.flush()?;
    log::info!("{} measurements saved to {}", total, path.display());

    Ok(())
}
