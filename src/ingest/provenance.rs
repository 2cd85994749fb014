//! Origins of tools ingested through this client
//!
//! The backend listing only knows "builtin or not" (and sometimes "from
//! GitHub"). The ledger remembers how each tool was ingested here so the
//! descriptors built from the next listing carry the precise origin.

use std::collections::HashMap;

use crate::backend::ToolListing;
use crate::domain::{ToolDescriptor, ToolOrigin};

/// How one tool entered the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub origin: ToolOrigin,
    pub source_ref: Option<String>,
}

impl Provenance {
    pub fn new(origin: ToolOrigin) -> Self {
        Self {
            origin,
            source_ref: None,
        }
    }

    pub fn git(url: impl Into<String>) -> Self {
        Self {
            origin: ToolOrigin::Git,
            source_ref: Some(url.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ProvenanceLedger {
    entries: HashMap<String, Provenance>,
}

impl ProvenanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember how `name` was ingested; a later ingestion of the same name replaces it
    pub fn record(&mut self, name: impl Into<String>, provenance: Provenance) {
        self.entries.insert(name.into(), provenance);
    }

    pub fn get(&self, name: &str) -> Option<&Provenance> {
        self.entries.get(name)
    }

    /// Build the descriptor for one listing entry.
    ///
    /// Precedence: an explicit origin in the listing, then this ledger, then
    /// the listing's legacy custom/GitHub flags.
    pub fn resolve(&self, listing: ToolListing) -> ToolDescriptor {
        let (origin, source_ref) = match (listing.origin, self.entries.get(&listing.name)) {
            (Some(origin), _) => (origin, listing.listed_source_ref().map(str::to_string)),
            (None, Some(known)) => (
                known.origin,
                known
                    .source_ref
                    .clone()
                    .or_else(|| listing.listed_source_ref().map(str::to_string)),
            ),
            (None, None) => (
                listing.listed_origin(),
                listing.listed_source_ref().map(str::to_string),
            ),
        };

        ToolDescriptor {
            name: listing.name,
            description: listing.description,
            parameters: listing.parameters,
            origin,
            source_ref,
        }
    }

    pub fn resolve_all(&self, listings: Vec<ToolListing>) -> Vec<ToolDescriptor> {
        listings.into_iter().map(|listing| self.resolve(listing)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_builtin() {
        let ledger = ProvenanceLedger::new();
        let tool = ledger.resolve(ToolListing::new("send_mail", "Send mail"));
        assert_eq!(tool.origin, ToolOrigin::Builtin);
        assert_eq!(tool.source_ref, None);
    }

    #[test]
    fn test_ledger_refines_custom_flag() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record("joke", Provenance::new(ToolOrigin::Generated));

        let tool = ledger.resolve(ToolListing::new("joke", "Tell a joke").custom());
        assert_eq!(tool.origin, ToolOrigin::Generated);
    }

    #[test]
    fn test_git_provenance_sets_source_ref() {
        let url = "https://github.com/u/r/blob/main/weather.py";
        let mut ledger = ProvenanceLedger::new();
        ledger.record("weather.py", Provenance::git(url));

        let tool = ledger.resolve(ToolListing::new("weather.py", "").custom());
        assert_eq!(tool.origin, ToolOrigin::Git);
        assert_eq!(tool.source_ref.as_deref(), Some(url));
    }

    #[test]
    fn test_explicit_origin_beats_ledger() {
        let mut ledger = ProvenanceLedger::new();
        ledger.record("joke", Provenance::new(ToolOrigin::Generated));

        let tool = ledger.resolve(ToolListing::new("joke", "").with_origin(ToolOrigin::Custom));
        assert_eq!(tool.origin, ToolOrigin::Custom);
    }

    #[test]
    fn test_legacy_github_flag() {
        let ledger = ProvenanceLedger::new();
        let tool = ledger.resolve(ToolListing::new("x.py", "").github("https://github.com/a/b/blob/main/x.py"));
        assert_eq!(tool.origin, ToolOrigin::Git);
        assert_eq!(tool.source_ref.as_deref(), Some("https://github.com/a/b/blob/main/x.py"));
    }
}
