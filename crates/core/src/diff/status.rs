use std::fmt;

/// Result of comparing one pair of entities.
///
/// Variants are ordered by severity; combining two results keeps the worse one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DiffStatus {
    /// ABI-equivalent at this level.
    #[default]
    NoDiff,
    /// Only something nested (a field, base or vtable entry) differs.
    IndirectDiff,
    /// The entities themselves are incompatible.
    DirectDiff,
    /// One side could not be resolved and the policy counts that as a difference.
    OpaqueDiff,
}

impl DiffStatus {
    pub fn combine(self, other: DiffStatus) -> DiffStatus {
        self.max(other)
    }

    pub fn has_diff(self) -> bool {
        self != DiffStatus::NoDiff
    }

    /// Direct and opaque differences both mean "not the same type" to a caller.
    pub fn is_direct(self) -> bool {
        matches!(self, DiffStatus::DirectDiff | DiffStatus::OpaqueDiff)
    }
}

bitflags::bitflags! {
    /// Aggregate verdict of one comparison. The empty set means compatible.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CompatibilityStatus: u32 {
        /// Something changed, but only in types no exported symbol reaches.
        const UNREFERENCED_CHANGES = 1;
        /// Backward-compatible growth: new enumerators, functions or globals.
        const EXTENSION = 1 << 2;
        /// A referenced entity changed or was removed.
        const INCOMPATIBLE = 1 << 3;
        /// An exported ELF symbol disappeared.
        const ELF_INCOMPATIBLE = 1 << 4;
    }
}

impl CompatibilityStatus {
    pub const COMPATIBLE: CompatibilityStatus = CompatibilityStatus::empty();

    pub fn is_compatible(self) -> bool {
        self.is_empty()
    }

    /// Names of the raised flags, `["COMPATIBLE"]` when none are.
    pub fn flag_names(self) -> Vec<&'static str> {
        if self.is_empty() {
            return vec!["COMPATIBLE"];
        }
        self.iter_names().map(|(name, _)| name).collect()
    }
}

impl fmt::Display for CompatibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flag_names().join(" | "))
    }
}

/// Whether an entity was reached from an exported symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reachability {
    Referenced,
    Unreferenced,
}

/// Direction of a lone (one-sided) entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Added,
    Removed,
}
