//! Parsing of the `ADDR[/PREFIX][:PORT]` endpoint text used by HSPL objects
//! and `AttackEvent.attacker`/`.target` (spec §3, §4.3).

use std::sync::OnceLock;

use ipnet::Ipv4Net;
use regex::Regex;

/// A parsed IPv4 `ADDR[/PREFIX][:PORT]` object. Non-matching (opaque) text is
/// represented as `None` by [`parse`] rather than by a variant here, since
/// non-IPv4 objects are simply left untouched by the optimizer (spec §4.3:
/// "non-matching HSPLs are left untouched").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Object {
    pub net: Ipv4Net,
    pub port: Port,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    Number(u16),
    Any,
}

impl Port {
    fn parse(s: Option<&str>) -> Port {
        match s {
            None | Some("*") | Some("any") => Port::Any,
            Some(n) => n.parse::<u16>().map(Port::Number).unwrap_or(Port::Any),
        }
    }

    /// Port equality per the inclusion predicate (spec §4.3): exact match, or
    /// the covering HSPL's port is the any-port wildcard.
    pub fn covers(self, other: Port) -> bool {
        self == Port::Any || self == other
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Port::Number(n) => write!(f, "{n}"),
            Port::Any => write!(f, "*"),
        }
    }
}

fn object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+\.\d+\.\d+\.\d+)(/(\d+))?(:(\d+|\*|any))?$").expect("static regex")
    })
}

/// Parses an endpoint object string. Returns `None` for anything that is not
/// a dotted-quad IPv4 address, matching the optimizer's object regex in
/// spec §4.3 — callers must treat `None` as "leave the HSPL alone", not as an
/// error.
pub fn parse(text: &str) -> Option<Ipv4Object> {
    let caps = object_regex().captures(text)?;
    let addr = caps.get(1)?.as_str();
    let prefix: u8 = caps
        .get(3)
        .map(|m| m.as_str().parse().unwrap_or(32))
        .unwrap_or(32);
    if prefix > 32 {
        return None;
    }
    let net = format!("{addr}/{prefix}").parse::<Ipv4Net>().ok()?;
    let port = Port::parse(caps.get(5).map(|m| m.as_str()));
    Some(Ipv4Object {
        net: net.trunc(),
        port,
    })
}

/// Renders `ADDR:*` for the any-port merge pass (spec §4.3 Pass 2).
pub fn render_any_port(addr: std::net::Ipv4Addr) -> String {
    format!("{addr}:*")
}

/// Renders `NET/bits:*` for the subnet merge pass (spec §4.3 Pass 3).
pub fn render_subnet_any_port(net: Ipv4Net) -> String {
    format!("{}/{}:*", net.network(), net.prefix_len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_defaults_to_slash_32_and_any_port() {
        let o = parse("10.0.0.1").unwrap();
        assert_eq!(o.net.prefix_len(), 32);
        assert_eq!(o.port, Port::Any);
    }

    #[test]
    fn port_any_and_star_are_equivalent() {
        assert_eq!(parse("10.0.0.1:any").unwrap().port, Port::Any);
        assert_eq!(parse("10.0.0.1:*").unwrap().port, Port::Any);
    }

    #[test]
    fn numeric_port_is_preserved() {
        assert_eq!(parse("10.0.0.1:80").unwrap().port, Port::Number(80));
    }

    #[test]
    fn non_ipv4_text_does_not_parse() {
        assert!(parse("host.example.com").is_none());
        assert!(parse("not-an-ip:80").is_none());
    }

    #[test]
    fn prefix_is_truncated_to_network_address() {
        let o = parse("10.0.0.5/24:80").unwrap();
        assert_eq!(o.net.network().to_string(), "10.0.0.0");
        assert_eq!(o.net.prefix_len(), 24);
    }
}
