//! Extensible `parser`/`filter`/`action` plug-ins (spec §4 [FILTER & PLUG-IN
//! REGISTRY]), reimplemented as a statically-populated registry of trait
//! objects per spec §9's redesign note ("replace dynamic discovery with a
//! statically-registered capability set") rather than the original's
//! `yapsy.PluginManager` live-discovery protocol. Grounded in the category
//! filtering idiom of `getPluginsOfCategory(...)` and in `assay-core`'s
//! tagged-enum discovery convention (`discovery::types::DiscoveredServer`).

use std::collections::HashSet;

use shield_policy::{AttackEvent, FilteringConfiguration, HsplSet};

/// A parser plug-in turns one ingestion line into an [`AttackEvent`],
/// chosen by matching the attack's `type` against [`ParserPlugin::type_regex`]
/// (spec §4.1).
pub trait ParserPlugin: Send + Sync {
    fn id(&self) -> &str;
    fn type_regex(&self) -> &regex::Regex;
    /// Parses one CSV-field line into an event, or `None` to silently skip
    /// it. `line_number` is 1-based; a parse failure on line 1 is a header
    /// row and should be swallowed as `Ok(None)`, while the same failure on
    /// any later line must fail the whole attack (spec §4.1: "Parsing
    /// errors on line 1 are treated as a header and skipped; on subsequent
    /// lines they fail the attack").
    fn parse(&self, line_number: usize, fields: &[&str]) -> Result<Option<AttackEvent>, String>;
}

/// A filter plug-in evaluates one recipe predicate against one event
/// (spec §4.2 step 4).
pub trait FilterPlugin: Send + Sync {
    /// The XML tag this plug-in is dispatched for (e.g. `inputBytes`).
    fn tag(&self) -> &str;
    fn filter(&self, value: &str, event: &AttackEvent) -> bool;
}

/// An action plug-in refines an HSPL set into a concrete
/// [`FilteringConfiguration`] for one IT resource (spec §4.4).
pub trait ActionPlugin: Send + Sync {
    fn id(&self) -> &str;
    /// The HSPL `action` string this plug-in refines (e.g. `"drop"`).
    fn action(&self) -> &str;
    /// Capabilities this plug-in requires from the target node.
    fn capabilities(&self) -> &HashSet<String>;
    fn configure(&self, hspl_set: &HsplSet, limit_config: &crate::config::LimitConfig) -> FilteringConfiguration;
}

/// A fixed, read-only-after-init collection of plug-ins, initialized once at
/// startup (spec §5: "shared only the plug-in registry, read-only after
/// init").
pub struct Registry {
    parsers: Vec<Box<dyn ParserPlugin>>,
    filters: Vec<Box<dyn FilterPlugin>>,
    actions: Vec<Box<dyn ActionPlugin>>,
}

impl Registry {
    pub fn new(
        parsers: Vec<Box<dyn ParserPlugin>>,
        filters: Vec<Box<dyn FilterPlugin>>,
        actions: Vec<Box<dyn ActionPlugin>>,
    ) -> Self {
        Self {
            parsers,
            filters,
            actions,
        }
    }

    /// The built-in registry: `ParserDoS`/`ParserDnsTunneling`/`ParserCryptomining`,
    /// `FilterInputBytes`, `Drop`/`Limit` (spec §4: the nine named components'
    /// built-in plug-in set).
    pub fn with_builtins() -> Self {
        use crate::actions::{DropAction, Limit};
        use crate::parsers::{ParserCryptomining, ParserDnsTunneling, ParserDoS};

        Self::new(
            vec![
                Box::new(ParserDoS::new()),
                Box::new(ParserDnsTunneling::new()),
                Box::new(ParserCryptomining::new()),
            ],
            vec![Box::new(crate::filters::FilterInputBytes)],
            vec![Box::new(DropAction::new()), Box::new(Limit::new())],
        )
    }

    pub fn parser_for(&self, attack_type: &str) -> Option<&dyn ParserPlugin> {
        self.parsers
            .iter()
            .find(|p| p.type_regex().is_match(attack_type))
            .map(AsRef::as_ref)
    }

    pub fn filter_by_tag(&self, tag: &str) -> Option<&dyn FilterPlugin> {
        self.filters.iter().find(|f| f.tag() == tag).map(AsRef::as_ref)
    }

    pub fn actions(&self) -> impl Iterator<Item = &dyn ActionPlugin> {
        self.actions.iter().map(AsRef::as_ref)
    }

    /// Action plug-ins whose declared action matches `action` (spec §4.2
    /// step 3 / §4.4 step 1).
    pub fn actions_for(&self, action: &str) -> impl Iterator<Item = &dyn ActionPlugin> {
        self.actions.iter().filter(move |p| p.action() == action).map(AsRef::as_ref)
    }
}
