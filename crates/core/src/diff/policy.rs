use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Knobs controlling what the diff engine treats as a difference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffPolicy {
    /// Compare ids of unresolvable types instead of assuming they match.
    pub treat_opaque_as_different: bool,
    /// Also diff records and enums that no exported symbol reaches.
    pub check_all_apis: bool,
    /// Ignore additions and removals of weakly bound symbols.
    pub allow_adding_removing_weak_symbols: bool,
    /// Linker set keys skipped entirely.
    pub ignored_symbols: BTreeSet<String>,
}

impl DiffPolicy {
    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored_symbols.contains(key)
    }
}
