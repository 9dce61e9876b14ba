//! Control-channel client: one request/reply exchange with the renderer.
//!
//! The renderer (an ffmpeg/ffplay pipeline with a control endpoint in front
//! of its filter graph) speaks a plain-text request/reply protocol on a
//! fixed host/port. Each [`ChannelClient::exchange`] call performs exactly
//! one exchange:
//!
//! 1. open a fresh connection (never reused across calls - a stale peer
//!    must not poison a later exchange)
//! 2. send the command as a single message
//! 3. wait at most the configured timeout for the first chunk of reply bytes
//! 4. drop the connection, on every path
//!
//! Whatever bytes arrive before the deadline are the reply, even if the
//! peer is reporting a rejection - peer-level errors are forwarded
//! verbatim, not interpreted here. There is no internal retry.

use log::{debug, warn};
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Outcome of one exchange on the control channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlReply {
    /// Bytes the peer sent before the deadline, decoded lossily.
    Payload(String),
    /// No reply arrived within the configured timeout. The session was
    /// still closed; a late reply dies with the socket.
    Timeout,
    /// Connect, send or receive failed at the transport level.
    Transport(String),
}

/// Client for the renderer's control endpoint.
///
/// Holds only the address and the reply deadline; the connection itself
/// lives for a single [`exchange`](Self::exchange) call.
#[derive(Debug, Clone)]
pub struct ChannelClient {
    addr: String,
    timeout: Duration,
}

impl ChannelClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Perform exactly one request/reply exchange.
    ///
    /// The whole call is bounded by the configured timeout: connect eats
    /// into the reply budget, so a caller gets an answer no later than
    /// timeout plus scheduling noise. Retry policy belongs to the caller
    /// (the gateway does not retry).
    pub fn exchange(&self, command: &str) -> ControlReply {
        let deadline = Instant::now() + self.timeout;

        let sock_addr = match self.addr.to_socket_addrs().map(|mut a| a.next()) {
            Ok(Some(a)) => a,
            Ok(None) | Err(_) => {
                warn!("Control endpoint address does not resolve: {}", self.addr);
                return ControlReply::Transport(format!("bad address: {}", self.addr));
            }
        };

        let mut stream = match TcpStream::connect_timeout(&sock_addr, self.timeout) {
            Ok(s) => s,
            Err(e) => {
                debug!("Connect to {} failed: {}", self.addr, e);
                return ControlReply::Transport(format!("connect failed: {}", e));
            }
        };
        let _ = stream.set_nodelay(true);

        if let Err(e) = stream.write_all(command.as_bytes()).and_then(|_| stream.flush()) {
            debug!("Send to {} failed: {}", self.addr, e);
            return ControlReply::Transport(format!("send failed: {}", e));
        }

        // Reply wait gets whatever is left of the overall budget
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return ControlReply::Timeout;
        }
        if let Err(e) = stream.set_read_timeout(Some(remaining)) {
            return ControlReply::Transport(format!("socket setup failed: {}", e));
        }

        let mut buf = [0u8; 4096];
        match stream.read(&mut buf) {
            Ok(0) => ControlReply::Transport("peer closed the connection without replying".into()),
            Ok(n) => {
                let payload = String::from_utf8_lossy(&buf[..n]).into_owned();
                debug!("Reply from {}: {:?}", self.addr, payload);
                ControlReply::Payload(payload)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                debug!("No reply from {} within {:?}", self.addr, self.timeout);
                ControlReply::Timeout
            }
            Err(e) => ControlReply::Transport(format!("recv failed: {}", e)),
        }
        // stream dropped here on every path - the session never outlives
        // the exchange
    }
}
