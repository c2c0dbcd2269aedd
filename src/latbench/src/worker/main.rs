use std::sync::Arc;

use structopt::StructOpt;

use latbench::worker::{self, WorkerService};
use latbench::Node;

#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "worker", about = "Benchmark worker node")]
struct Opts {
    /// The listening port
    #[structopt(short = "p", long = "port", default_value = "50051")]
    port: u16,
    /// Relay every request to this worker (two-hop chains)
    #[structopt(long = "forward-to")]
    forward_to: Option<Node>,
}

fn main() -> anyhow::Result<()> {
    logging::init_log();
    let opts = Opts::from_args();

    log::info!("starting benchmark worker on port {}", opts.port);
    let listener = std::net::TcpListener::bind(("0.0.0.0", opts.port))?;
    let service = Arc::new(WorkerService::new(opts.forward_to));

    worker::serve(listener, service)
}
