//! Built-in parser plug-ins (spec §4 [FILTER & PLUG-IN REGISTRY], ported from
//! `original_source/cybertop/plugins/ParserDoS.py`,
//! `ParserDNSTunneling.py` and `ParserCryptomining.py`). Each plug-in turns
//! one already-comma-split CSV line into an [`AttackEvent`], or `None` to
//! silently skip the line (header rows, comments, blanks).

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use shield_policy::{AttackEvent, FieldValue};

use crate::registry::ParserPlugin;

fn parse_timestamp(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let combined = format!("{date} {time}");
    for format in ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S", "%d-%m-%Y %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&combined, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// The header row `timereceived,Year,M,D,h,m,s,dur,src_ip,dst_ip,s_prt,...`
/// that `ParserDoS.py` recognizes and silently skips.
const DOS_HEADER: &[&str] = &[
    "timereceived",
    "Year",
    "M",
    "D",
    "h",
    "m",
    "s",
    "dur",
    "src_ip",
    "dst_ip",
    "s_prt",
    "d_prt",
    "proto",
    "in_pkt",
    "in_bytes",
    "out_pkts",
    "out_bytes",
    "score",
];

pub struct ParserDoS {
    type_regex: Regex,
}

impl ParserDoS {
    pub fn new() -> Self {
        Self {
            type_regex: Regex::new("^DoS$").expect("static regex"),
        }
    }
}

impl Default for ParserDoS {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserPlugin for ParserDoS {
    fn id(&self) -> &str {
        "ParserDoS"
    }

    fn type_regex(&self) -> &Regex {
        &self.type_regex
    }

    fn parse(&self, line_number: usize, fields: &[&str]) -> Result<Option<AttackEvent>, String> {
        if line_number == 1 && fields == DOS_HEADER {
            return Ok(None);
        }
        if fields.len() != 19 {
            return Err(format!("expected 19 fields, found {}", fields.len()));
        }
        let timestamp = parse_timestamp(fields[0], fields[1]).ok_or("unparsable timestamp")?;
        let source_port: u16 = fields[11].parse().map_err(|_| "invalid source port")?;
        let destination_port: u16 = fields[12].parse().map_err(|_| "invalid destination port")?;
        let protocol = fields[13].to_string();
        let input_packets: i64 = fields[14].parse().map_err(|_| "invalid in_pkt")?;
        let input_bytes: i64 = fields[15].parse().map_err(|_| "invalid in_bytes")?;
        let output_packets: i64 = fields[16].parse().map_err(|_| "invalid out_pkts")?;
        let output_bytes: i64 = fields[17].parse().map_err(|_| "invalid out_bytes")?;

        let event = AttackEvent::new(
            timestamp,
            format!("{}:{source_port}", fields[9]),
            format!("{}:{destination_port}", fields[10]),
        )
        .with_field("protocol", FieldValue::Text(protocol))
        .with_field("inputPackets", FieldValue::Int(input_packets))
        .with_field("inputBytes", FieldValue::Int(input_bytes))
        .with_field("outputPackets", FieldValue::Int(output_packets))
        .with_field("outputBytes", FieldValue::Int(output_bytes));
        Ok(Some(event))
    }
}

pub struct ParserDnsTunneling {
    type_regex: Regex,
}

impl ParserDnsTunneling {
    pub fn new() -> Self {
        Self {
            type_regex: Regex::new("(?i)^DNS tunneling$").expect("static regex"),
        }
    }
}

impl Default for ParserDnsTunneling {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserPlugin for ParserDnsTunneling {
    fn id(&self) -> &str {
        "ParserDnsTunneling"
    }

    fn type_regex(&self) -> &Regex {
        &self.type_regex
    }

    /// Every resolved query is attributed to the open DNS resolver port, so
    /// the subject/object are synthesized rather than read verbatim (ported
    /// from `ParserDNSTunneling.py`: `"0.0.0.0/0:53"` / `"<dest>:*"`). Any
    /// parse failure is swallowed as a header row on line 1 and fails the
    /// attack on every later line, matching that plug-in's bare `except:`
    /// around the whole parse, not just the timestamp.
    fn parse(&self, line_number: usize, fields: &[&str]) -> Result<Option<AttackEvent>, String> {
        parse_dns_tunneling_line(fields).or_else(|err| if line_number == 1 { Ok(None) } else { Err(err) })
    }
}

fn parse_dns_tunneling_line(fields: &[&str]) -> Result<Option<AttackEvent>, String> {
    if fields.len() < 12 {
        return Err("expected at least 12 fields".to_string());
    }
    let joined = fields[0..5].join(" ");
    let timestamp = NaiveDateTime::parse_from_str(&joined, "%Y %m %d %H %M")
        .map_err(|_| "unparsable timestamp")?
        .and_utc();
    let destination_address = fields[7];
    let query = fields[8].to_string();
    let query_class = i64::from_str_radix(fields[9].trim_start_matches("0x"), 16).map_err(|_| "invalid query class")?;
    let query_type: i64 = fields[10].parse().map_err(|_| "invalid query type")?;
    let query_response_code: i64 = fields[11].parse().map_err(|_| "invalid response code")?;

    let event = AttackEvent::new(timestamp, "0.0.0.0/0:53", format!("{destination_address}:*"))
        .with_field("query", FieldValue::Text(query))
        .with_field("queryClass", FieldValue::Int(query_class))
        .with_field("queryType", FieldValue::Int(query_type))
        .with_field("queryResponseCode", FieldValue::Int(query_response_code));
    Ok(Some(event))
}

pub struct ParserCryptomining {
    type_regex: Regex,
}

impl ParserCryptomining {
    pub fn new() -> Self {
        Self {
            type_regex: Regex::new("(?i)^Cryptomining$").expect("static regex"),
        }
    }
}

impl Default for ParserCryptomining {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserPlugin for ParserCryptomining {
    fn id(&self) -> &str {
        "ParserCryptomining"
    }

    fn type_regex(&self) -> &Regex {
        &self.type_regex
    }

    /// A parse failure is a header row on line 1 and skipped; on any later
    /// line it fails the attack (ported from `ParserCryptomining.py`'s
    /// `except: if count == 1: return None else: raise IOError(...)`).
    fn parse(&self, line_number: usize, fields: &[&str]) -> Result<Option<AttackEvent>, String> {
        parse_cryptomining_line(fields).or_else(|err| if line_number == 1 { Ok(None) } else { Err(err) })
    }
}

fn parse_cryptomining_line(fields: &[&str]) -> Result<Option<AttackEvent>, String> {
    if fields.len() < 18 {
        return Err(format!("expected at least 18 fields, found {}", fields.len()));
    }
    let timestamp = parse_timestamp(fields[0], fields[1]).ok_or("unparsable timestamp")?;
    let source_port: u16 = fields[11].parse().map_err(|_| "invalid source port")?;
    let destination_port: u16 = fields[12].parse().map_err(|_| "invalid destination port")?;

    let event = AttackEvent::new(
        timestamp,
        format!("{}:{source_port}", fields[9]),
        format!("{}:{destination_port}", fields[10]),
    )
    .with_field("protocol", FieldValue::Text(fields[13].to_string()))
    .with_field("inputPackets", FieldValue::Int(fields[14].parse().map_err(|_| "invalid in_pkt")?))
    .with_field("inputBytes", FieldValue::Int(fields[15].parse().map_err(|_| "invalid in_bytes")?))
    .with_field("outputPackets", FieldValue::Int(fields[16].parse().map_err(|_| "invalid out_pkt")?))
    .with_field("outputBytes", FieldValue::Int(fields[17].parse().map_err(|_| "invalid out_bytes")?));
    Ok(Some(event))
}
