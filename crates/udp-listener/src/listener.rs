//! UDP Listener for force sensor datagrams
//!
//! One session is a bind-to-close lifetime of the socket. The receive loop
//! runs on its own tokio task; `stop` cancels the pending receive, which
//! drops (closes) the socket, and waits a bounded time for the task to end.

use crate::config::ListenerConfig;
use crate::error::ListenerError;
use crate::stats::ListenerStats;
use force_buffer::BufferHost;
use reading_parser::parse_datagram;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Largest payload a UDP datagram can carry
const MAX_UDP_PAYLOAD: usize = 65_507;

/// Listener lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Resources owned by a running session
struct Session {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

struct Inner {
    state: ListenerState,
    session: Option<Session>,
    /// `stop` arrived while `Starting`; honoured before the loop is spawned
    stop_requested: bool,
}

/// UDP listener that feeds parsed readings into a [`BufferHost`].
///
/// All lifecycle methods take `&self`, so the listener can be shared in an
/// `Arc` and stopped from a different task than the one that started it.
pub struct UdpForceListener {
    config: ListenerConfig,
    host: BufferHost,
    stats: Arc<ListenerStats>,
    inner: Mutex<Inner>,
}

impl UdpForceListener {
    /// Create a stopped listener
    pub fn new(config: ListenerConfig, host: BufferHost) -> Self {
        Self {
            config,
            host,
            stats: Arc::new(ListenerStats::default()),
            inner: Mutex::new(Inner {
                state: ListenerState::Stopped,
                session: None,
                stop_requested: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ListenerState {
        self.lock().state
    }

    /// Check if a session is running
    pub fn is_running(&self) -> bool {
        self.state() == ListenerState::Running
    }

    /// Bound address of the running session
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock().session.as_ref().map(|s| s.local_addr)
    }

    /// Receive statistics, accumulated across sessions
    pub fn stats(&self) -> &Arc<ListenerStats> {
        &self.stats
    }

    /// Listener configuration
    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Bind the socket and spawn the receive loop.
    ///
    /// On bind failure the listener returns to `Stopped` and the call may
    /// be retried. A `stop` issued while binding cancels the start.
    pub async fn start(&self) -> Result<SocketAddr, ListenerError> {
        self.begin_start()?;

        let addr = self.config.bind_addr();
        let socket = match UdpSocket::bind(addr).await {
            Ok(socket) => socket,
            Err(source) => {
                let mut inner = self.lock();
                inner.state = ListenerState::Stopped;
                inner.stop_requested = false;
                error!("[UdpListener] Failed to bind {}: {}", addr, source);
                return Err(ListenerError::Bind { addr, source });
            }
        };

        self.finish_start(socket)
    }

    fn begin_start(&self) -> Result<(), ListenerError> {
        let mut inner = self.lock();
        if inner.state != ListenerState::Stopped {
            return Err(ListenerError::InvalidState(inner.state));
        }
        inner.state = ListenerState::Starting;
        inner.stop_requested = false;
        Ok(())
    }

    fn finish_start(&self, socket: UdpSocket) -> Result<SocketAddr, ListenerError> {
        let local_addr = socket
            .local_addr()
            .unwrap_or_else(|_| self.config.bind_addr());

        let mut inner = self.lock();
        if inner.stop_requested {
            inner.stop_requested = false;
            inner.state = ListenerState::Stopped;
            info!("[UdpListener] Stopped while starting, closing {}", local_addr);
            return Err(ListenerError::Cancelled);
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(receive_loop(
            socket,
            self.host.clone(),
            self.stats.clone(),
            shutdown_rx,
            self.config.max_datagram_size.clamp(1, MAX_UDP_PAYLOAD),
        ));

        inner.state = ListenerState::Running;
        inner.session = Some(Session {
            local_addr,
            shutdown: shutdown_tx,
            task,
        });
        info!("[UdpListener] Listening on UDP {}", local_addr);
        Ok(local_addr)
    }

    /// Close the socket and wait for the receive loop to exit.
    ///
    /// No-op when stopped. While `Starting`, the pending start is cancelled
    /// instead. If the loop has not exited after `stop_timeout_ms`, the task
    /// is aborted.
    pub async fn stop(&self) {
        let session = {
            let mut inner = self.lock();
            match inner.session.take() {
                Some(session) => {
                    inner.state = ListenerState::Stopping;
                    session
                }
                None if inner.state == ListenerState::Starting => {
                    inner.stop_requested = true;
                    info!("[UdpListener] Stop requested while starting");
                    return;
                }
                None => {
                    debug!("[UdpListener] Stop requested while {:?}", inner.state);
                    return;
                }
            }
        };

        let Session {
            local_addr,
            shutdown,
            mut task,
        } = session;

        // Receiver may already be gone if the task ended on its own.
        let _ = shutdown.send(());

        match tokio::time::timeout(self.config.stop_timeout(), &mut task).await {
            Ok(Ok(())) => debug!("[UdpListener] Receive loop joined"),
            Ok(Err(e)) => warn!("[UdpListener] Receive loop ended abnormally: {}", e),
            Err(_) => {
                warn!(
                    "[UdpListener] Receive loop still running after {:?}, aborting",
                    self.config.stop_timeout()
                );
                task.abort();
            }
        }

        self.lock().state = ListenerState::Stopped;
        info!("[UdpListener] Stopped listening on {}", local_addr);
    }
}

impl Drop for UdpForceListener {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = inner.session.take() {
            debug!("[UdpListener] Dropped while running, aborting receive loop");
            session.task.abort();
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    host: BufferHost,
    stats: Arc<ListenerStats>,
    mut shutdown: oneshot::Receiver<()>,
    max_datagram_size: usize,
) {
    // One spare byte: a datagram that fills the buffer was truncated.
    let mut buffer = vec![0u8; max_datagram_size + 1];

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,
            received = socket.recv_from(&mut buffer) => match received {
                Ok((len, peer)) if len > max_datagram_size => {
                    let raw = String::from_utf8_lossy(&buffer[..max_datagram_size]);
                    stats.record_datagram(raw.trim().to_string());
                    stats.record_parse_failure();
                    warn!(
                        "[UdpListener] Datagram from {} exceeds {} bytes, dropped",
                        peer, max_datagram_size
                    );
                }
                Ok((len, peer)) => handle_datagram(&buffer[..len], peer, &host, &stats),
                Err(e) => {
                    stats.record_transport_error();
                    warn!("[UdpListener] Receive error: {}", e);
                }
            },
        }
    }

    debug!("[UdpListener] Receive loop exiting, closing socket");
}

fn handle_datagram(payload: &[u8], peer: SocketAddr, host: &BufferHost, stats: &ListenerStats) {
    let raw = String::from_utf8_lossy(payload).trim().to_string();
    trace!("[UdpListener] {} bytes from {}: {:?}", payload.len(), peer, raw);
    stats.record_datagram(raw);

    match parse_datagram(payload) {
        Ok(value) => match host.insert(value) {
            Some(_) => stats.record_reading(),
            None => stats.record_dropped(),
        },
        Err(e) => {
            stats.record_parse_failure();
            warn!("[UdpListener] {} from {}", e, peer);
        }
    }
}
