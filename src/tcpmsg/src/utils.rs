use crate::Node;
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

// Wire format: an 8-byte big-endian length header followed by a
// bincode-serialized body. These APIs require a socket in blocking state.

pub fn read_payload_len(stream: &mut TcpStream) -> anyhow::Result<u64> {
    let mut buf = [0u8; 8];
    stream.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

pub fn recv_message_sync(stream: &mut TcpStream) -> anyhow::Result<Vec<u8>> {
    let payload_len = read_payload_len(stream)? as usize;
    let mut buf = vec![0u8; payload_len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn send_message_sync(stream: &mut TcpStream, buf: &[u8]) -> anyhow::Result<()> {
    let len_buf = (buf.len() as u64).to_be_bytes();
    stream.write_all(&len_buf)?;
    stream.write_all(buf)?;
    Ok(())
}

pub fn recv_cmd_sync<T: DeserializeOwned>(stream: &mut TcpStream) -> anyhow::Result<T> {
    let buf = recv_message_sync(stream)?;
    let cmd = bincode::deserialize(&buf)?;
    Ok(cmd)
}

pub fn send_cmd_sync(stream: &mut TcpStream, cmd: &impl Serialize) -> anyhow::Result<()> {
    let buf = bincode::serialize(cmd)?;
    send_message_sync(stream, &buf)
}

/// Single connection attempt bounded by `timeout`.
pub fn connect_timeout(node: &Node, timeout: Duration) -> anyhow::Result<TcpStream> {
    let addr = node
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("cannot resolve {}", node))?;
    let stream = TcpStream::connect_timeout(&addr, timeout)?;
    Ok(stream)
}

/// Connect with exponential backoff, for startup rendezvous where the peer
/// may not be listening yet.
pub fn connect_retry(node: &Node, max_retry: usize) -> anyhow::Result<TcpStream> {
    let mut retry = max_retry;
    let mut sleep_time = Duration::from_millis(5);
    loop {
        match TcpStream::connect(node) {
            Ok(stream) => {
                return Ok(stream);
            }
            Err(e) => {
                if retry == 0 {
                    return Err(anyhow::anyhow!(
                        "failed to connect to {} after {} retries: {}",
                        node,
                        max_retry,
                        e
                    ));
                }
                log::trace!("connect to {} failed, retrying: {}", node, e);
                std::thread::sleep(sleep_time);
                sleep_time *= 2;
                retry -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u64,
        body: Vec<u8>,
    }

    #[test]
    fn framed_round_trip() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let ping: Ping = recv_cmd_sync(&mut stream).unwrap();
            send_cmd_sync(&mut stream, &ping).unwrap();
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        let sent = Ping {
            seq: 42,
            body: vec![7; 1024],
        };
        send_cmd_sync(&mut stream, &sent).unwrap();
        let echoed: Ping = recv_cmd_sync(&mut stream).unwrap();
        assert_eq!(echoed, sent);

        handle.join().unwrap();
    }
}
