//! Attack / attack-event value types (spec §3 [EVENT MODEL]).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A single attribute value populated by a parser plug-in (spec §3:
/// `fields: mapping from attribute name to typed value`).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }
}

/// One observed event within an attack's flow stream.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackEvent {
    pub timestamp: DateTime<Utc>,
    /// Canonical `ADDR[/PREFIX][:PORT]` text, or an opaque non-IPv4 token.
    pub attacker: String,
    /// Canonical `ADDR[/PREFIX][:PORT]` text, or an opaque non-IPv4 token.
    pub target: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl AttackEvent {
    pub fn new(timestamp: DateTime<Utc>, attacker: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            timestamp,
            attacker: attacker.into(),
            target: target.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn protocol(&self) -> Option<&str> {
        self.fields.get("protocol").and_then(FieldValue::as_str)
    }
}

/// A detected attack: severity, type, an ingestion-assigned identifier, and
/// its ordered event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Attack {
    pub severity: u8,
    pub r#type: String,
    pub identifier: Option<i64>,
    pub anomaly_name: String,
    pub events: Vec<AttackEvent>,
}

impl Attack {
    /// `anomaly_name` defaults to the attack type, the only human-readable
    /// label every ingestion adapter has in hand; callers with a richer name
    /// (e.g. a dashboard-assigned label) can overwrite the field directly.
    pub fn new(severity: u8, r#type: impl Into<String>, identifier: Option<i64>) -> Self {
        let r#type = r#type.into();
        let anomaly_name = r#type.clone();
        Self {
            severity,
            r#type,
            identifier,
            anomaly_name,
            events: Vec::new(),
        }
    }

    /// The minimum event timestamp, or `None` if the attack has no events
    /// (spec §3: `timestamp(): minimum event timestamp, or undefined if empty`).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.events.iter().map(|e| e.timestamp).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_is_none_for_empty_attack() {
        let attack = Attack::new(4, "DoS", Some(1));
        assert_eq!(attack.timestamp(), None);
    }

    #[test]
    fn timestamp_is_the_minimum_event_timestamp() {
        let mut attack = Attack::new(4, "DoS", Some(1));
        let t1: DateTime<Utc> = "2026-01-01T00:00:10Z".parse().unwrap();
        let t2: DateTime<Utc> = "2026-01-01T00:00:05Z".parse().unwrap();
        attack.events.push(AttackEvent::new(t1, "1.2.3.4:1", "10.0.0.1:80"));
        attack.events.push(AttackEvent::new(t2, "1.2.3.5:1", "10.0.0.1:80"));
        assert_eq!(attack.timestamp(), Some(t2));
    }
}
