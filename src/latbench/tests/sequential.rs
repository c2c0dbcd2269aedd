use std::path::PathBuf;
use std::sync::Arc;

use latbench::sink::{ResultSink, Schema};
use latbench::stats::SummaryMode;
use latbench::sweep::{SweepConfig, SweepDriver};
use latbench::topology::TopologyRunner;
use latbench::worker::{self, WorkerService};
use latbench::{Node, Pattern};

fn spawn_worker() -> (Node, Arc<WorkerService>) {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    let service = Arc::new(WorkerService::new(None));
    let serving = Arc::clone(&service);
    std::thread::spawn(move || worker::serve(listener, serving).unwrap());
    (
        Node {
            addr: "127.0.0.1".to_owned(),
            port,
        },
        service,
    )
}

/// A loopback address nobody listens on.
fn dead_node() -> Node {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Node {
        addr: "127.0.0.1".to_owned(),
        port,
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("latbench-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn one_size_config(samples: usize) -> SweepConfig {
    SweepConfig {
        min_size: 64,
        max_size: 64,
        increment: 64,
        samples_per_size: samples,
        summary: SummaryMode::Mean,
    }
}

#[test]
fn sequential_all_workers_succeed() {
    logging::init_log();

    let (node_a, service_a) = spawn_worker();
    let (node_b, service_b) = spawn_worker();

    let topology = TopologyRunner::new(Pattern::Sequential, &[node_a, node_b]).unwrap();
    let mut driver = SweepDriver::new(topology, one_size_config(4)).unwrap();

    let dir = scratch_dir("sequential-ok");
    let mut sink = ResultSink::new(Pattern::Sequential, &dir, Schema::Minimal);
    driver.run(&mut sink).unwrap();

    assert_eq!(sink.len(), 4);
    assert!(sink.results().iter().all(|r| r.success));
    assert!(sink.results().iter().all(|r| r.pattern == Pattern::Sequential));

    // every round contacts both workers once, warmup rounds included
    assert_eq!(service_a.requests_served(), 10 + 4);
    assert_eq!(service_b.requests_served(), 10 + 4);

    let path = sink.flush().unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.lines().skip(1).all(|l| l.ends_with(",sequential")));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn sequential_one_failure_fails_round_but_contacts_everyone() {
    logging::init_log();

    let (node_a, service_a) = spawn_worker();
    let dead = dead_node();
    let (node_c, service_c) = spawn_worker();

    let topology = TopologyRunner::new(Pattern::Sequential, &[node_a, dead, node_c]).unwrap();
    let mut driver = SweepDriver::new(topology, one_size_config(3)).unwrap();

    let dir = scratch_dir("sequential-fail");
    let mut sink = ResultSink::new(Pattern::Sequential, &dir, Schema::Minimal);
    driver.run(&mut sink).unwrap();

    // the dead middle worker fails every round, but the round never aborts:
    // the workers after it are still contacted exactly once per sample
    assert_eq!(sink.len(), 3);
    assert!(sink.results().iter().all(|r| !r.success));
    assert_eq!(service_a.requests_served(), 10 + 3);
    assert_eq!(service_c.requests_served(), 10 + 3);

    // a failed sweep still persists its rows, marked unsuccessful
    let path = sink.flush().unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<&str> = content.lines().skip(1).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.split(',').nth(2).unwrap() == "0"));

    std::fs::remove_dir_all(&dir).unwrap();
}
