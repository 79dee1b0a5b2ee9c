//! Datagram channel plumbing.
//!
//! Each logical channel (settings, start, disconnect, prediction) owns one
//! UDP socket serviced by a dedicated listener thread that decodes and
//! dispatches datagrams in arrival order. Listeners never gate on session
//! state; state gating lives in the session machine and the control loop.
//!
//! Safety: each `ChannelListener` spawns exactly one thread that is shut
//! down and joined when the listener is dropped, preventing thread leaks.

use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel as xch;

use crate::classifier::Classification;
use crate::error::ControlError;
use crate::registry;
use crate::runtime::RuntimeConfig;

/// Poll interval for the shutdown flag while blocked in recv.
const RECV_TIMEOUT: Duration = Duration::from_millis(50);
/// Largest datagram any channel accepts.
const MAX_DATAGRAM: usize = 2048;

/// A socket-owning listener thread for one inbound channel.
pub struct ChannelListener {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl ChannelListener {
    /// Spawn the listener. The handler runs on the listener thread, one
    /// datagram at a time, so per-channel arrival order is preserved.
    pub fn spawn<F>(name: &'static str, socket: UdpSocket, mut handler: F) -> std::io::Result<Self>
    where
        F: FnMut(&[u8], SocketAddr) + Send + 'static,
    {
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut buf = [0u8; MAX_DATAGRAM];
            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    tracing::debug!(channel = name, "listener received shutdown signal");
                    break;
                }
                match socket.recv_from(&mut buf) {
                    Ok((len, addr)) => handler(&buf[..len], addr),
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        // recv timeout; loop around to poll the flag
                    }
                    Err(e) => {
                        tracing::warn!(channel = name, error = %e, "recv failed");
                    }
                }
            }
            tracing::trace!(channel = name, "listener thread exiting cleanly");
        });

        Ok(Self {
            shutdown,
            join_handle: Some(join_handle),
        })
    }
}

impl Drop for ChannelListener {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take()
            && let Err(e) = handle.join()
        {
            // Thread panicked; log but don't propagate (we're in Drop).
            tracing::warn!(?e, "listener thread panicked during shutdown");
        }
    }
}

/// Single-slot, last-write-wins handoff from the prediction listener to
/// the control loop. Exactly one producer and one consumer; a newer
/// classification always fully replaces an unconsumed older one.
#[derive(Clone)]
pub struct PredictionSlot {
    tx: xch::Sender<Classification>,
    rx: xch::Receiver<Classification>,
}

impl Default for PredictionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionSlot {
    pub fn new() -> Self {
        let (tx, rx) = xch::bounded(1);
        Self { tx, rx }
    }

    /// Overwrite the slot with the newest classification.
    pub fn publish(&self, c: Classification) {
        // Drain the stale value first; with a single producer the
        // subsequent try_send can only fail if the consumer raced a value
        // in, which cannot happen (the consumer only takes).
        let _ = self.rx.try_recv();
        let _ = self.tx.try_send(c);
    }

    /// Take the newest classification, if any arrived since the last take.
    pub fn latest(&self) -> Option<Classification> {
        self.rx.try_iter().last()
    }
}

/// Outbound acknowledgment path: JSON status datagrams sent to the
/// sender's address on the fixed confirmation port.
#[derive(Debug, Clone, Copy)]
pub struct Acknowledger {
    confirmation_port: u16,
}

impl Acknowledger {
    pub fn new(confirmation_port: u16) -> Self {
        Self { confirmation_port }
    }

    pub fn send(&self, peer: IpAddr, ok: bool, message: &str) -> std::io::Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", 0))?;
        let body = serde_json::json!({
            "status": if ok { "success" } else { "error" },
            "message": message,
        });
        socket.send_to(body.to_string().as_bytes(), (peer, self.confirmation_port))?;
        Ok(())
    }
}

/// Outcome of one settings batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsReport {
    /// Fields validated and written to the runtime configuration.
    pub applied: usize,
    /// Fields skipped (unknown key, non-numeric or non-finite value).
    pub skipped: usize,
}

/// Decode and apply one settings datagram.
///
/// The payload is a JSON object of wire keys to numeric values. Fields
/// validate independently: one bad field is skipped with a warning and
/// does not block the others. All successfully validated fields are
/// written under a single lock so readers never observe a half-applied
/// batch. Malformed JSON is a `Decode` error; the caller drops the
/// datagram and sends no acknowledgment.
pub fn apply_settings_payload(
    payload: &[u8],
    config: &RwLock<RuntimeConfig>,
) -> Result<SettingsReport, ControlError> {
    let parsed: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| ControlError::Decode(format!("settings JSON: {e}")))?;
    let fields = parsed
        .as_object()
        .ok_or_else(|| ControlError::Decode("settings payload is not a JSON object".into()))?;

    let mut batch: Vec<(&str, f64)> = Vec::with_capacity(fields.len());
    let mut skipped = 0usize;
    for (wire_key, value) in fields {
        let name = registry::resolve_wire_key(wire_key);
        let Some(raw) = value.as_f64() else {
            tracing::warn!(key = %wire_key, "non-numeric settings value, skipping");
            skipped += 1;
            continue;
        };
        match registry::validate(name, raw) {
            Ok(v) => batch.push((name, v)),
            Err(e) => {
                tracing::warn!(key = %wire_key, error = %e, "skipping settings field");
                skipped += 1;
            }
        }
    }

    let applied = batch.len();
    if applied > 0 {
        let mut cfg = config.write().unwrap_or_else(|e| e.into_inner());
        for (name, value) in batch {
            // validate() guaranteed the name; apply cannot fail here.
            let _ = cfg.apply(name, value);
            tracing::info!(name, value, "updated parameter");
        }
    }

    Ok(SettingsReport { applied, skipped })
}

/// Decode a `{"command": ...}` payload. Malformed JSON is a `Decode`
/// error; a missing or non-string command field is simply absent.
pub fn parse_command(payload: &[u8]) -> Result<Option<String>, ControlError> {
    let parsed: serde_json::Value = serde_json::from_slice(payload)
        .map_err(|e| ControlError::Decode(format!("command JSON: {e}")))?;
    Ok(parsed
        .get("command")
        .and_then(|c| c.as_str())
        .map(str::to_string))
}

/// Decode one prediction datagram: exactly 4 little-endian f64 values.
pub fn decode_prediction(payload: &[u8]) -> Result<[f64; 4], ControlError> {
    if payload.len() % 8 != 0 {
        return Err(ControlError::Decode(format!(
            "prediction payload of {} bytes is not a whole number of f64s",
            payload.len()
        )));
    }
    let count = payload.len() / 8;
    if count != 4 {
        return Err(ControlError::Decode(format!(
            "expected 4 prediction values, got {count}"
        )));
    }
    let mut values = [0.0; 4];
    for (v, chunk) in values.iter_mut().zip(payload.chunks_exact(8)) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        *v = f64::from_le_bytes(bytes);
    }
    Ok(values)
}
