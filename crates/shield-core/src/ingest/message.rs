//! Queue-based ingestion (spec §4.1 "Message adapter"), grounded in the
//! `(id, severity, type)`-keyed accumulation scheme spec.md describes and
//! in `cybertop.py::start`'s broker-connect-with-bounded-attempts shape
//! (the pika client there is the direct ancestor of the reconnect policy
//! below; spec §9 asks for it to be a fixed-delay, attempt-bounded loop
//! rather than the library's own retry behavior).

use std::collections::HashMap;
use std::time::Duration;

use shield_policy::{Attack, AttackEvent, FieldValue};
use tracing::{debug, info, warn};

use crate::error::{Result, ShieldError};

/// A transport that yields one CSV-field line at a time from a broker
/// topic/queue, abstracting over the concrete message broker (spec §9:
/// "the emitter blocks must be replaced by a reconnect loop").
pub trait MessageTransport: Send {
    /// Opens the connection, retrying internally is NOT expected here —
    /// callers drive the reconnect loop via [`run`].
    fn connect(&mut self) -> Result<()>;
    /// Blocks for the next message, or returns `Ok(None)` on a clean close.
    fn recv(&mut self) -> Result<Option<Vec<String>>>;
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Accumulates `start`/body/`stop`-framed events into attacks keyed by
/// `(id, severity, type)` (spec §4.1). Duplicate `start` is logged and
/// ignored; `stop` without a matching `start`, and bare events without one,
/// are logged and dropped.
#[derive(Default)]
pub struct AttackAccumulator {
    open: HashMap<(i64, u8, String), Attack>,
}

impl AttackAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one decoded CSV line `[id, severity, type, marker, ...]`.
    /// Returns a completed [`Attack`] when `marker == "stop"` closes one.
    pub fn feed(&mut self, fields: &[String]) -> Option<Attack> {
        if fields.len() < 4 {
            warn!(?fields, "message line too short, dropping");
            return None;
        }
        let id: i64 = fields[0].parse().ok()?;
        let severity: u8 = fields[1].parse().ok()?;
        let attack_type = fields[2].clone();
        let marker = fields[3].as_str();
        let key = (id, severity, attack_type.clone());

        match marker {
            "start" => {
                if self.open.contains_key(&key) {
                    warn!(id, severity, attack_type, "duplicate start, ignoring");
                } else {
                    debug!(id, severity, attack_type, "attack accumulation started");
                    self.open.insert(key, Attack::new(severity, attack_type, Some(id)));
                }
                None
            }
            "stop" => match self.open.remove(&key) {
                Some(attack) => {
                    info!(id, severity, attack_type, events = attack.events.len(), "attack accumulation closed");
                    Some(attack)
                }
                None => {
                    warn!(id, severity, attack_type, "stop without start, dropping");
                    None
                }
            },
            _ => {
                let Some(attack) = self.open.get_mut(&key) else {
                    warn!(id, severity, attack_type, "event without start, dropping");
                    return None;
                };
                let body = &fields[3..];
                attack.events.push(body_to_event(body));
                None
            }
        }
    }
}

/// Turns a bare event body (`marker, ...`) into an [`AttackEvent`].
/// Source/destination are the first two body tokens; the remainder is
/// stored as opaque text fields indexed by position.
fn body_to_event(body: &[String]) -> AttackEvent {
    let now = chrono::Utc::now();
    let attacker = body.first().cloned().unwrap_or_default();
    let target = body.get(1).cloned().unwrap_or_default();
    let mut event = AttackEvent::new(now, attacker, target);
    for (index, value) in body.iter().enumerate().skip(2) {
        event.fields.insert(format!("field{index}"), FieldValue::Text(value.clone()));
    }
    event
}

/// An in-memory transport over a fixed list of pre-framed lines, for tests
/// that exercise [`run`] without a real broker. `connect` always succeeds;
/// `recv` yields each line once, then signals a clean close.
#[derive(Default)]
pub struct InMemoryTransport {
    lines: std::collections::VecDeque<Vec<String>>,
}

impl InMemoryTransport {
    pub fn new(lines: Vec<Vec<String>>) -> Self {
        Self {
            lines: lines.into(),
        }
    }
}

impl MessageTransport for InMemoryTransport {
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn recv(&mut self) -> Result<Option<Vec<String>>> {
        Ok(self.lines.pop_front())
    }

    fn close(&mut self) {}
}

/// A file-replay transport: reads a CSV file of `[id, severity, type,
/// marker, ...]` rows eagerly on `connect`, then yields them one at a time,
/// for exercising the reconnect/accumulation plumbing against a recorded
/// session instead of a live broker.
#[derive(Default)]
pub struct FileReplayTransport {
    path: std::path::PathBuf,
    lines: std::collections::VecDeque<Vec<String>>,
}

impl FileReplayTransport {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: std::collections::VecDeque::new(),
        }
    }
}

impl MessageTransport for FileReplayTransport {
    fn connect(&mut self) -> Result<()> {
        let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(&self.path)?;
        self.lines = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|record| record.iter().map(str::to_string).collect())
            .collect();
        Ok(())
    }

    fn recv(&mut self) -> Result<Option<Vec<String>>> {
        Ok(self.lines.pop_front())
    }

    fn close(&mut self) {}
}

/// Drives `transport` with a fixed-delay, attempt-bounded reconnect loop,
/// calling `on_attack` for every attack the accumulator closes.
pub fn run(
    transport: &mut dyn MessageTransport,
    policy: ReconnectPolicy,
    mut on_attack: impl FnMut(Attack),
) -> Result<()> {
    let mut accumulator = AttackAccumulator::new();
    let mut attempt = 0;

    loop {
        match transport.connect() {
            Ok(()) => attempt = 0,
            Err(err) => {
                attempt += 1;
                warn!(attempt, max_attempts = policy.max_attempts, error = %err, "broker connect failed");
                if attempt >= policy.max_attempts {
                    return Err(ShieldError::Transport(format!(
                        "exhausted {} reconnect attempts: {err}",
                        policy.max_attempts
                    )));
                }
                std::thread::sleep(policy.retry_delay);
                continue;
            }
        }

        loop {
            match transport.recv() {
                Ok(Some(fields)) => {
                    if let Some(attack) = accumulator.feed(&fields) {
                        on_attack(attack);
                    }
                }
                Ok(None) => {
                    info!("broker connection closed cleanly");
                    return Ok(());
                }
                Err(err) => {
                    warn!(error = %err, "broker recv failed, reconnecting");
                    break;
                }
            }
        }
    }
}
