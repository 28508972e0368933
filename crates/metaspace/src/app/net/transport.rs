use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::WireMessage;

#[derive(Debug, Error)]
pub(crate) enum TransportError {
    #[error("connect to '{addr}' failed: {reason}")]
    Connect { addr: String, reason: String },
    #[error("send failed: {0}")]
    Send(String),
    #[error("transport is shut down")]
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransportEvent {
    Message(WireMessage),
    Closed { reason: String },
}

/// Channel capability: one established connection. Implementations must be
/// non-blocking on `poll`; inbound traffic queues until drained.
pub(crate) trait Transport: Send {
    fn send(&mut self, message: &WireMessage) -> Result<(), TransportError>;
    fn poll(&mut self) -> Vec<TransportEvent>;
    fn shutdown(&mut self);
}

/// JSON-lines over TCP. A reader thread parses inbound lines into events;
/// the owner drains them on its own tick. Malformed lines are dropped, an
/// io error or EOF surfaces as a single `Closed` event.
pub(crate) struct TcpTransport {
    stream: TcpStream,
    events: Receiver<TransportEvent>,
}

impl TcpTransport {
    pub(crate) fn connect(addr: &str, timeout: Duration) -> Result<Self, TransportError> {
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|error| TransportError::Connect {
                addr: addr.to_string(),
                reason: error.to_string(),
            })?
            .next()
            .ok_or_else(|| TransportError::Connect {
                addr: addr.to_string(),
                reason: "no resolvable address".to_string(),
            })?;
        let stream = TcpStream::connect_timeout(&socket_addr, timeout).map_err(|error| {
            TransportError::Connect {
                addr: addr.to_string(),
                reason: error.to_string(),
            }
        })?;
        let _ = stream.set_nodelay(true);

        let read_stream = stream.try_clone().map_err(|error| TransportError::Connect {
            addr: addr.to_string(),
            reason: error.to_string(),
        })?;
        let (event_sender, events) = mpsc::channel();
        thread::spawn(move || read_loop(read_stream, event_sender));

        debug!(addr, "transport_connected");
        Ok(Self { stream, events })
    }
}

fn read_loop(stream: TcpStream, events: Sender<TransportEvent>) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<WireMessage>(&line) {
                    Ok(message) => {
                        if events.send(TransportEvent::Message(message)).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        warn!(error = %error, "wire_message_malformed");
                    }
                }
            }
            Err(error) => {
                let _ = events.send(TransportEvent::Closed {
                    reason: error.to_string(),
                });
                return;
            }
        }
    }
    let _ = events.send(TransportEvent::Closed {
        reason: "connection closed by peer".to_string(),
    });
}

impl Transport for TcpTransport {
    fn send(&mut self, message: &WireMessage) -> Result<(), TransportError> {
        let mut line = serde_json::to_string(message)
            .map_err(|error| TransportError::Send(error.to_string()))?;
        line.push('\n');
        self.stream
            .write_all(line.as_bytes())
            .map_err(|error| TransportError::Send(error.to_string()))
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        let mut drained = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => drained.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    fn shutdown(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

#[derive(Debug, Default)]
struct MemoryQueues {
    inbound: VecDeque<TransportEvent>,
    sent: Vec<WireMessage>,
    closed: bool,
}

/// Shared peer handle for a [`MemoryTransport`]: tests and the offline mode
/// script inbound events and observe what the client sent.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryEndpoint {
    inner: Arc<Mutex<MemoryQueues>>,
}

fn lock_queues(inner: &Arc<Mutex<MemoryQueues>>) -> MutexGuard<'_, MemoryQueues> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MemoryEndpoint {
    pub(crate) fn transport(&self) -> MemoryTransport {
        MemoryTransport {
            inner: Arc::clone(&self.inner),
        }
    }

    pub(crate) fn push_message(&self, message: WireMessage) {
        lock_queues(&self.inner)
            .inbound
            .push_back(TransportEvent::Message(message));
    }

    pub(crate) fn push_closed(&self, reason: &str) {
        lock_queues(&self.inner)
            .inbound
            .push_back(TransportEvent::Closed {
                reason: reason.to_string(),
            });
    }

    pub(crate) fn sent(&self) -> Vec<WireMessage> {
        lock_queues(&self.inner).sent.clone()
    }

    pub(crate) fn take_sent(&self) -> Vec<WireMessage> {
        std::mem::take(&mut lock_queues(&self.inner).sent)
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        lock_queues(&self.inner).closed
    }
}

/// Deterministic in-process transport. Doubles as the offline mode: a
/// connection that accepts sends and never delivers anything.
pub(crate) struct MemoryTransport {
    inner: Arc<Mutex<MemoryQueues>>,
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: &WireMessage) -> Result<(), TransportError> {
        let mut queues = lock_queues(&self.inner);
        if queues.closed {
            return Err(TransportError::Closed);
        }
        queues.sent.push(message.clone());
        Ok(())
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        lock_queues(&self.inner).inbound.drain(..).collect()
    }

    fn shutdown(&mut self) {
        lock_queues(&self.inner).closed = true;
    }
}
