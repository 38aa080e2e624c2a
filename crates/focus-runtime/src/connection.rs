//! Reconnecting WebSocket link to the EEG analysis service.
//!
//! [`ConnectionManager`] keeps at most one live connection to the configured
//! endpoint. A dropped or failed connection is retried after a fixed delay,
//! forever, without back-off growth. A handshake that does not complete
//! within the handshake timeout counts as a failed attempt, and a live link
//! that goes quiet for longer than the idle timeout is treated as dropped.
//! Every text frame is run through
//! [`validator::parse`]; valid readings go to the registered reading
//! callback, malformed ones are logged and dropped.
//!
//! Callbacks run on the manager's driver task while an internal lock is
//! held. They must be quick and must not call back into the manager; the
//! usual pattern is to forward into a channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use focus_core::models::{ConnectionPhase, Reading};
use focus_core::validator;

/// Delay between a disconnect and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Upper bound on TCP connect plus WebSocket handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Silence after which a live link is considered dead. The service pushes a
/// frame every 500 ms, so this allows for ten missed frames.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long shutdown waits for the server to acknowledge the close frame.
const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

pub type ReadingCallback = Box<dyn FnMut(Reading) + Send + 'static>;
pub type PhaseCallback = Box<dyn FnMut(ConnectionPhase) + Send + 'static>;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Shared state ──────────────────────────────────────────────────────────────

struct Inner {
    phase: ConnectionPhase,
    device_status: Option<String>,
    shut_down: bool,
    on_reading: Option<ReadingCallback>,
    on_phase: Option<PhaseCallback>,
}

impl Inner {
    fn transition(&mut self, phase: ConnectionPhase) {
        if self.shut_down || self.phase == phase {
            return;
        }
        self.phase = phase;
        if phase == ConnectionPhase::Disconnected {
            self.device_status = None;
        }
        tracing::info!(phase = %phase, "connection phase changed");
        if let Some(cb) = self.on_phase.as_mut() {
            cb(phase);
        }
    }

    fn deliver(&mut self, reading: Reading) {
        if self.shut_down {
            return;
        }
        if let Some(status) = &reading.device_status {
            self.device_status = Some(status.clone());
        }
        if let Some(cb) = self.on_reading.as_mut() {
            cb(reading);
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    cancel: CancellationToken,
    /// Wakes the driver out of a pending reconnect wait.
    reconnect_now: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        self.lock().transition(phase);
    }

    fn handle_frame(&self, text: &str) {
        match validator::parse(text) {
            Ok(reading) => self.lock().deliver(reading),
            Err(rejection) => {
                tracing::debug!(reason = %rejection, "discarding malformed frame");
            }
        }
    }
}

/// Delays and limits the driver task works with.
#[derive(Debug, Clone, Copy)]
struct Timing {
    reconnect_delay: Duration,
    handshake_timeout: Duration,
    idle_timeout: Duration,
}

// ── ConnectionManager ─────────────────────────────────────────────────────────

/// Owner of the single logical connection to the concentration endpoint.
///
/// # Example
/// ```no_run
/// # async fn demo() {
/// use focus_runtime::connection::{ConnectionManager, DEFAULT_RECONNECT_DELAY};
///
/// let mut conn = ConnectionManager::new("ws://127.0.0.1:8000/ws/focus", DEFAULT_RECONNECT_DELAY);
/// conn.on_reading(|r| println!("{:?}", r.concentration));
/// conn.connect();
/// // ...
/// conn.shutdown().await;
/// # }
/// ```
pub struct ConnectionManager {
    endpoint: String,
    timing: Timing,
    shared: Arc<Shared>,
    driver: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(endpoint: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timing: Timing {
                reconnect_delay,
                handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
                idle_timeout: DEFAULT_IDLE_TIMEOUT,
            },
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    phase: ConnectionPhase::Disconnected,
                    device_status: None,
                    shut_down: false,
                    on_reading: None,
                    on_phase: None,
                }),
                cancel: CancellationToken::new(),
                reconnect_now: Notify::new(),
            }),
            driver: None,
        }
    }

    /// Limit each connection attempt, handshake included, to `timeout`.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.timing.handshake_timeout = timeout;
        self
    }

    /// Drop a live link that delivers no frame at all for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.timing.idle_timeout = timeout;
        self
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register the consumer of validated readings, replacing any previous one.
    pub fn on_reading<F>(&self, callback: F)
    where
        F: FnMut(Reading) + Send + 'static,
    {
        self.shared.lock().on_reading = Some(Box::new(callback));
    }

    /// Register the observer of phase transitions, replacing any previous one.
    pub fn on_phase_change<F>(&self, callback: F)
    where
        F: FnMut(ConnectionPhase) + Send + 'static,
    {
        self.shared.lock().on_phase = Some(Box::new(callback));
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Open the connection if none is active or in flight.
    ///
    /// No-op while `Connecting` or `Online`, and after [`shutdown`]. While a
    /// reconnect is pending the timer is cut short and the attempt starts
    /// immediately. Must be called from within a tokio runtime.
    ///
    /// [`shutdown`]: ConnectionManager::shutdown
    pub fn connect(&mut self) {
        {
            let mut inner = self.shared.lock();
            if inner.shut_down {
                tracing::debug!("connect ignored after shutdown");
                return;
            }
            if inner.phase != ConnectionPhase::Disconnected {
                tracing::debug!(phase = %inner.phase, "connect ignored; connection already live");
                return;
            }
            inner.transition(ConnectionPhase::Connecting);
        }

        match &self.driver {
            Some(driver) if !driver.is_finished() => {
                tracing::debug!("cutting reconnect wait short");
                self.shared.reconnect_now.notify_waiters();
            }
            _ => {
                let shared = Arc::clone(&self.shared);
                let endpoint = self.endpoint.clone();
                self.driver = Some(tokio::spawn(drive(shared, endpoint, self.timing)));
            }
        }
    }

    /// Stop reconnecting and close the connection with a normal-closure frame.
    ///
    /// Safe to call at any time and more than once. Once this returns no
    /// callback fires again, even if an attempt that was in flight completes.
    pub async fn shutdown(&mut self) {
        {
            let mut inner = self.shared.lock();
            if inner.shut_down {
                return;
            }
            inner.shut_down = true;
            inner.phase = ConnectionPhase::Disconnected;
            inner.device_status = None;
        }
        self.shared.cancel.cancel();

        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                tracing::warn!(error = %e, "connection driver ended abnormally");
            }
        }
        tracing::info!(endpoint = %self.endpoint, "connection manager shut down");
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn phase(&self) -> ConnectionPhase {
        self.shared.lock().phase
    }

    /// Last device status received on the current connection; cleared on
    /// disconnect.
    pub fn device_status(&self) -> Option<String> {
        self.shared.lock().device_status.clone()
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.timing.reconnect_delay
    }

    pub fn handshake_timeout(&self) -> Duration {
        self.timing.handshake_timeout
    }

    pub fn idle_timeout(&self) -> Duration {
        self.timing.idle_timeout
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lock().shut_down
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shared.lock().shut_down = true;
        self.shared.cancel.cancel();
    }
}

// ── Driver task ───────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Ended {
    Closed,
    Cancelled,
}

/// Connect, pump frames until the link drops, wait, repeat.
async fn drive(shared: Arc<Shared>, endpoint: String, timing: Timing) {
    let delay = timing.reconnect_delay;
    loop {
        shared.set_phase(ConnectionPhase::Connecting);
        tracing::debug!(endpoint = %endpoint, "connecting");

        let attempt = tokio::select! {
            _ = shared.cancel.cancelled() => return,
            res = tokio::time::timeout(timing.handshake_timeout, connect_async(endpoint.as_str())) => res,
        };

        match attempt {
            Ok(Ok((socket, _response))) => {
                shared.set_phase(ConnectionPhase::Online);
                if pump(&shared, socket, timing.idle_timeout).await == Ended::Cancelled {
                    return;
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %endpoint, error = %e, "connection attempt failed");
            }
            Err(_) => {
                tracing::warn!(
                    endpoint = %endpoint,
                    timeout_secs = timing.handshake_timeout.as_secs_f64(),
                    "connection attempt timed out"
                );
            }
        }

        // Register interest before publishing Disconnected so a connect()
        // racing the Disconnected publication is not lost.
        let wake = shared.reconnect_now.notified();
        tokio::pin!(wake);
        wake.as_mut().enable();

        shared.set_phase(ConnectionPhase::Disconnected);
        tracing::info!(delay_secs = delay.as_secs_f64(), "reconnect scheduled");

        tokio::select! {
            _ = shared.cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
            _ = &mut wake => tracing::debug!("reconnect requested early"),
        }
    }
}

/// Forward frames from `socket` until it closes, goes quiet for `idle`, or
/// the manager is cancelled.
async fn pump(shared: &Shared, mut socket: Socket, idle: Duration) -> Ended {
    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => {
                close_normally(&mut socket).await;
                return Ended::Cancelled;
            }
            frame = tokio::time::timeout(idle, socket.next()) => match frame {
                Ok(Some(Ok(Message::Text(text)))) => shared.handle_frame(&text),
                Ok(Some(Ok(Message::Close(frame)))) => {
                    tracing::info!(?frame, "server closed the connection");
                    return Ended::Closed;
                }
                // Binary, ping, pong: nothing to do, tungstenite answers pings.
                Ok(Some(Ok(_))) => {}
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "connection error");
                    return Ended::Closed;
                }
                Ok(None) => return Ended::Closed,
                Err(_) => {
                    tracing::warn!(idle_secs = idle.as_secs_f64(), "no frame received, dropping link");
                    return Ended::Closed;
                }
            },
        }
    }
}

async fn close_normally(socket: &mut Socket) {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: "client shutdown".into(),
    };
    if let Err(e) = socket.close(Some(frame)).await {
        tracing::debug!(error = %e, "close frame not delivered");
        return;
    }
    // Drain until the server echoes the close or the socket ends.
    let drained = tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, async {
        while let Some(Ok(_)) = socket.next().await {}
    })
    .await;
    if drained.is_err() {
        tracing::debug!("server did not acknowledge close in time");
    }
}
