//! Built-in filter plug-ins (spec §4.2 step 4), ported from
//! `original_source/cybertop/plugins/FilterInputBytes.py`.

use std::sync::OnceLock;

use regex::Regex;
use shield_policy::{AttackEvent, FieldValue};

use crate::registry::FilterPlugin;

fn relationship_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(==|!=|<=|>=|<|>)\s*(\d+)").expect("static regex"))
}

/// Evaluates a recipe predicate of the form `<relationship><number>` (e.g.
/// `>=1000`) against an event's `inputBytes` field.
pub struct FilterInputBytes;

impl FilterPlugin for FilterInputBytes {
    fn tag(&self) -> &str {
        "inputBytes"
    }

    fn filter(&self, value: &str, event: &AttackEvent) -> bool {
        let Some(input_bytes) = event.fields.get("inputBytes").and_then(FieldValue::as_i64) else {
            return false;
        };
        let Some(caps) = relationship_regex().captures(value) else {
            return false;
        };
        let Ok(threshold) = caps[2].parse::<i64>() else {
            return false;
        };
        match &caps[1] {
            "==" => input_bytes == threshold,
            "!=" => input_bytes != threshold,
            "<" => input_bytes < threshold,
            "<=" => input_bytes <= threshold,
            ">" => input_bytes > threshold,
            ">=" => input_bytes >= threshold,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event_with_bytes(bytes: i64) -> AttackEvent {
        AttackEvent::new(Utc::now(), "1.2.3.4:1", "10.0.0.1:80").with_field("inputBytes", FieldValue::Int(bytes))
    }

    #[test]
    fn evaluates_greater_than_or_equal() {
        let filter = FilterInputBytes;
        assert!(filter.filter(">=1000", &event_with_bytes(1500)));
        assert!(!filter.filter(">=1000", &event_with_bytes(500)));
    }

    #[test]
    fn missing_field_fails_the_filter() {
        let filter = FilterInputBytes;
        assert!(!filter.filter(">=1000", &AttackEvent::new(Utc::now(), "a", "b")));
    }
}
