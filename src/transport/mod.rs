// Transport module - One connection per exchange, with retry on transient failures

use crate::error::TlsError;
use crate::utils::network::Target;
use crate::utils::retry::{retry_with_sleeper, RetryConfig, Sleeper, ThreadSleeper};
use crate::Result;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// Largest response read for a single exchange
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024;

/// Timeouts and retry budget for one call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPolicy {
    pub connect_timeout: Duration,
    /// Applied to both reads and writes
    pub socket_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            socket_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl ConnectionPolicy {
    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Opens one stream to one address
pub trait Connector {
    type Stream: Read + Write;

    fn connect(&self, addr: SocketAddr, policy: &ConnectionPolicy) -> io::Result<Self::Stream>;
}

/// Plain TCP with connect, read and write timeouts applied
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, addr: SocketAddr, policy: &ConnectionPolicy) -> io::Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&addr, policy.connect_timeout)?;
        stream.set_read_timeout(Some(policy.socket_timeout))?;
        stream.set_write_timeout(Some(policy.socket_timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Send one message and collect the reply
pub trait Transport {
    fn send_and_receive(&self, target: &Target, payload: &[u8]) -> Result<Vec<u8>>;

    /// Like `send_and_receive` with a different read/write timeout
    fn send_and_receive_within(
        &self,
        target: &Target,
        payload: &[u8],
        socket_timeout: Duration,
    ) -> Result<Vec<u8>>;
}

/// Connection-per-call transport
pub struct TcpTransport<C = TcpConnector, S = ThreadSleeper> {
    connector: C,
    sleeper: S,
    policy: ConnectionPolicy,
}

impl TcpTransport {
    pub fn new(policy: ConnectionPolicy) -> Self {
        Self::with_connector(TcpConnector, ThreadSleeper, policy)
    }
}

impl<C: Connector, S: Sleeper> TcpTransport<C, S> {
    pub fn with_connector(connector: C, sleeper: S, policy: ConnectionPolicy) -> Self {
        Self {
            connector,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &ConnectionPolicy {
        &self.policy
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a stream to the target's primary address, retrying transient failures
    pub fn connect(&self, target: &Target) -> Result<C::Stream> {
        self.connect_with(target, &self.policy)
    }

    fn connect_with(&self, target: &Target, policy: &ConnectionPolicy) -> Result<C::Stream> {
        let addr = target
            .socket_addrs()
            .first()
            .copied()
            .ok_or_else(|| TlsError::InvalidInput {
                message: format!("no address known for {}", target.hostname),
            })?;

        tracing::debug!("Connecting to {} ({})", target, addr);

        retry_with_sleeper(&policy.retry, &self.sleeper, || {
            self.connector.connect(addr, policy)
        })
        .map_err(|failure| {
            if failure.error.kind() == ErrorKind::TimedOut {
                TlsError::ConnectionTimeout {
                    duration: policy.connect_timeout,
                    addr: addr.to_string(),
                }
            } else {
                TlsError::ConnectionFailed {
                    addr: addr.to_string(),
                    attempts: failure.attempts,
                    source: failure.error,
                }
            }
        })
    }
}

impl<C: Connector, S: Sleeper> Transport for TcpTransport<C, S> {
    fn send_and_receive(&self, target: &Target, payload: &[u8]) -> Result<Vec<u8>> {
        self.send_and_receive_within(target, payload, self.policy.socket_timeout)
    }

    fn send_and_receive_within(
        &self,
        target: &Target,
        payload: &[u8],
        socket_timeout: Duration,
    ) -> Result<Vec<u8>> {
        let policy = self.policy.clone().with_socket_timeout(socket_timeout);
        let mut stream = self.connect_with(target, &policy)?;
        let response = exchange(&mut stream, payload)?;
        tracing::debug!(
            "Sent {} bytes to {}, received {} bytes",
            payload.len(),
            target,
            response.len()
        );
        Ok(response)
        // stream dropped (closed) here and on every early return
    }
}

/// Write `payload` and read the reply.
///
/// Stops once the first record is complete, the peer closes, the size cap is
/// reached or the read times out. A timeout or reset before any data arrives
/// yields an empty reply.
pub fn exchange<S: Read + Write>(stream: &mut S, payload: &[u8]) -> io::Result<Vec<u8>> {
    stream.write_all(payload)?;
    stream.flush()?;

    let mut response = Vec::new();
    let mut chunk = [0u8; 4096];

    while response.len() < MAX_RESPONSE_SIZE {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = MAX_RESPONSE_SIZE - response.len();
                response.extend_from_slice(&chunk[..n.min(room)]);
                if first_record_complete(&response) {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock
                        | ErrorKind::TimedOut
                        | ErrorKind::ConnectionReset
                        | ErrorKind::ConnectionAborted
                ) =>
            {
                tracing::debug!("Read stopped after {} bytes: {}", response.len(), e);
                break;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(response)
}

/// True once `data` holds at least one whole TLS or SSLv2 record
pub fn first_record_complete(data: &[u8]) -> bool {
    match data.first() {
        Some(first) if first & 0x80 != 0 => {
            data.len() >= 2 && {
                let len = (((first & 0x7f) as usize) << 8) | data[1] as usize;
                data.len() >= len + 2
            }
        }
        Some(_) => {
            data.len() >= 5 && {
                let len = u16::from_be_bytes([data[3], data[4]]) as usize;
                data.len() >= len + 5
            }
        }
        None => false,
    }
}
