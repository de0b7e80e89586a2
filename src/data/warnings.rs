//! Warning bitmask decoding.

use std::fmt;

/// Operational warning flags a node can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    AmendmentBlocked,
    UnlBlocked,
    AmendmentWarned,
    NotSynced,
}

impl Warning {
    /// All warnings in bit order, which is also display order.
    pub const ALL: [Warning; 4] = [
        Warning::AmendmentBlocked,
        Warning::UnlBlocked,
        Warning::AmendmentWarned,
        Warning::NotSynced,
    ];

    pub fn bit(self) -> u32 {
        match self {
            Warning::AmendmentBlocked => 1 << 0,
            Warning::UnlBlocked => 1 << 1,
            Warning::AmendmentWarned => 1 << 2,
            Warning::NotSynced => 1 << 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Warning::AmendmentBlocked => "AMENDMENT BLOCKED",
            Warning::UnlBlocked => "UNL BLOCKED",
            Warning::AmendmentWarned => "AMENDMENT WARNED",
            Warning::NotSynced => "NOT SYNCED",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set of warnings decoded from the wire bitmask. Reserved bits are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct WarningSet(u32);

impl WarningSet {
    const KNOWN: u32 = 0b1111;

    pub fn from_bits(bits: u32) -> Self {
        Self(bits & Self::KNOWN)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, warning: Warning) -> bool {
        self.0 & warning.bit() != 0
    }

    /// True when `self` holds every warning in `other` and at least one more.
    pub fn is_strict_superset_of(self, other: WarningSet) -> bool {
        self.0 & other.0 == other.0 && self.0 != other.0
    }

    /// Warnings in `self` that are not in `other`.
    pub fn difference(self, other: WarningSet) -> WarningSet {
        WarningSet(self.0 & !other.0)
    }

    /// Warnings in bit order.
    pub fn iter(self) -> impl Iterator<Item = Warning> {
        Warning::ALL.into_iter().filter(move |w| self.contains(*w))
    }

    /// Comma-separated labels, e.g. "UNL BLOCKED, NOT SYNCED".
    pub fn labels(self) -> String {
        self.iter().map(Warning::label).collect::<Vec<_>>().join(", ")
    }
}
