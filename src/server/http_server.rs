use super::pipeline::RequestPipeline;
use crate::config::ServerConfig;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Upper bound on the head of a request (request line + headers). A client
/// that sends this much without a blank line is cut off with the connection.
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Blocking TCP transport: one accept loop, one thread and one
/// request/response cycle per connection.
///
/// After the response is written the write half is shut down, signalling the
/// client that this exchange is over; there is no keep-alive.
pub struct HttpServer {
    config: ServerConfig,
}

impl HttpServer {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Bind the listener and start the accept loop on its own thread.
    pub fn start(self, pipeline: Arc<RequestPipeline>) -> io::Result<ServerHandle> {
        let listener = TcpListener::bind(&self.config.addr)?;
        let addr = listener.local_addr()?;
        info!(addr = %addr, "listening");

        let shutdown = Arc::new(AtomicBool::new(false));
        let accept_shutdown = Arc::clone(&shutdown);
        let config = self.config;
        let thread = thread::Builder::new()
            .name("gantry-accept".to_string())
            .spawn(move || {
                for stream in listener.incoming() {
                    if accept_shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    match stream {
                        Ok(stream) => {
                            let pipeline = Arc::clone(&pipeline);
                            let config = config.clone();
                            let spawned = thread::Builder::new()
                                .name("gantry-conn".to_string())
                                .spawn(move || {
                                    if let Err(e) = serve_connection(stream, &config, &pipeline) {
                                        debug!(error = %e, "connection ended with error");
                                    }
                                });
                            if let Err(e) = spawned {
                                error!(error = %e, "failed to spawn connection thread");
                            }
                        }
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
                info!("accept loop stopped");
            })?;

        Ok(ServerHandle {
            addr,
            shutdown,
            thread,
        })
    }
}

/// One request/response cycle on a fresh connection.
fn serve_connection(
    mut stream: TcpStream,
    config: &ServerConfig,
    pipeline: &RequestPipeline,
) -> io::Result<()> {
    stream.set_read_timeout(Some(config.read_timeout))?;
    stream.set_write_timeout(Some(config.write_timeout))?;
    let received_at = Instant::now();

    let message = read_message(&mut stream)?;
    let response = pipeline.handle(&message, received_at);
    stream.write_all(&response)?;
    stream.flush()?;
    stream.shutdown(Shutdown::Write)
}

/// Read one framed request: everything up to the blank line ending the
/// headers, then exactly `Content-Length` body bytes (zero when absent).
fn read_message(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut message = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = find_head_end(&message) {
            break pos;
        }
        if message.len() > MAX_HEAD_BYTES {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                "request head too large",
            ));
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed before end of headers",
            ));
        }
        message.extend_from_slice(&chunk[..n]);
    };

    let body_len = content_length(&message[..head_end]).unwrap_or(0);
    let total = head_end + 4 + body_len;
    while message.len() < total {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed mid-body",
            ));
        }
        message.extend_from_slice(&chunk[..n]);
    }
    message.truncate(total);
    Ok(message)
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Scan the head for `Content-Length`, case-insensitively. Framing needs the
/// length before the request is parsed, so the transport reads it itself.
fn content_length(head: &[u8]) -> Option<usize> {
    for line in head.split(|&b| b == b'\n') {
        let line = String::from_utf8_lossy(line);
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

/// Handle to a running server: its bound address, a readiness probe, and a
/// cooperative stop.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener actually bound, useful with port 0.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until the listener accepts connections.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(
            ErrorKind::TimedOut,
            "server did not become ready",
        ))
    }

    /// Signal the accept loop to stop and wait for it to exit. A throwaway
    /// connection unblocks the loop so it observes the flag.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = TcpStream::connect(self.addr);
        if self.thread.join().is_err() {
            warn!("accept loop panicked");
        }
    }

    /// Wait for the accept loop without stopping it.
    pub fn join(self) {
        if self.thread.join().is_err() {
            warn!("accept loop panicked");
        }
    }
}
