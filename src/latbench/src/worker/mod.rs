use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tcpmsg::{utils, Node};

use crate::caller::CALL_TIMEOUT;
use crate::message::{self, BenchRequest, BenchResponse};

/// Serves benchmark requests. A worker with no next hop answers with the
/// fixed acknowledgement; a worker with a next hop relays the request
/// verbatim and passes the hop's answer back unchanged. The next hop is
/// fixed for the lifetime of the service.
pub struct WorkerService {
    ack: Vec<u8>,
    next_hop: Option<Node>,
    requests_served: AtomicU64,
}

impl WorkerService {
    pub fn new(next_hop: Option<Node>) -> Self {
        if let Some(ref hop) = next_hop {
            log::info!("worker will forward requests to {}", hop);
        }
        WorkerService {
            ack: message::ack_payload(),
            next_hop,
            requests_served: AtomicU64::new(0),
        }
    }

    pub fn next_hop(&self) -> Option<&Node> {
        self.next_hop.as_ref()
    }

    /// Total requests handled across all connections, forwarded ones
    /// included.
    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    fn process(&self, request: BenchRequest, forwarder: &mut Option<Forwarder>) -> BenchResponse {
        self.requests_served.fetch_add(1, Ordering::Relaxed);

        match forwarder {
            Some(forwarder) => {
                // log every 100th request to avoid spam
                if request.request_id % 100 == 0 {
                    log::info!("forwarding request {} to {}", request.request_id, forwarder.node);
                }
                forwarder.forward(request)
            }
            None => {
                if request.request_id % 100 == 0 {
                    log::info!(
                        "processed request {} with payload size {} bytes",
                        request.request_id,
                        request.payload.len()
                    );
                }
                BenchResponse {
                    request_id: request.request_id,
                    acknowledgement: self.ack.clone(),
                    request_timestamp: request.timestamp,
                    response_timestamp: message::now_nanos(),
                    success: true,
                }
            }
        }
    }
}

/// Relays requests to the next hop over its own cached connection, one per
/// serving thread.
struct Forwarder {
    node: Node,
    stream: Option<TcpStream>,
}

impl Forwarder {
    fn new(node: Node) -> Self {
        Forwarder { node, stream: None }
    }

    /// A transport failure toward the next hop becomes a success=false
    /// response, never a dropped or broken reply toward the original
    /// caller.
    fn forward(&mut self, request: BenchRequest) -> BenchResponse {
        let request_id = request.request_id;
        let request_timestamp = request.timestamp;
        match self.try_forward(request) {
            Ok(response) => response,
            Err(e) => {
                self.stream = None;
                log::warn!("forward of request {} to {} failed: {}", request_id, self.node, e);
                BenchResponse {
                    request_id,
                    acknowledgement: Vec::new(),
                    request_timestamp,
                    response_timestamp: message::now_nanos(),
                    success: false,
                }
            }
        }
    }

    fn try_forward(&mut self, request: BenchRequest) -> anyhow::Result<BenchResponse> {
        if self.stream.is_none() {
            let stream = utils::connect_timeout(&self.node, CALL_TIMEOUT)?;
            stream.set_nodelay(true)?;
            stream.set_read_timeout(Some(CALL_TIMEOUT))?;
            stream.set_write_timeout(Some(CALL_TIMEOUT))?;
            self.stream = Some(stream);
        }
        let stream = self.stream.as_mut().unwrap();
        utils::send_cmd_sync(stream, &request)?;
        let response = utils::recv_cmd_sync(stream)?;
        Ok(response)
    }
}

/// Blocking accept loop: one thread per inbound connection, requests on a
/// connection answered strictly in arrival order.
pub fn serve(listener: TcpListener, service: Arc<WorkerService>) -> anyhow::Result<()> {
    log::info!("worker listening on {}", listener.local_addr()?);
    loop {
        let (stream, addr) = listener.accept()?;
        log::debug!("worker accepts an incoming connection from addr: {}", addr);

        let service = Arc::clone(&service);
        std::thread::spawn(move || {
            if let Err(e) = serve_connection(&service, stream) {
                log::debug!("connection from {} closed: {}", addr, e);
            }
        });
    }
}

fn serve_connection(service: &WorkerService, mut stream: TcpStream) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;
    let mut forwarder = service.next_hop().cloned().map(Forwarder::new);

    loop {
        let request: BenchRequest = match utils::recv_cmd_sync(&mut stream) {
            Ok(request) => request,
            Err(e) => {
                // normal disconnect of the peer lands here as well
                log::trace!("stop serving connection: {}", e);
                break;
            }
        };
        let response = service.process(request, &mut forwarder);
        utils::send_cmd_sync(&mut stream, &response)?;
    }

    Ok(())
}
