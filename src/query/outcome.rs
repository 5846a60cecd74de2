//! Query result shaping.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::nuclide::{element_symbol, Selector};
use crate::reaction::{Reaction, ReactionKind};

/// Why a query returned nothing without looking at the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryDiagnostic {
    /// No input slot carried a well-formed constraint.
    NoInputSpecified,
    /// The energy range has `min > max`.
    InvertedEnergyRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

impl fmt::Display for QueryDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoInputSpecified => write!(f, "no fuel/input specified"),
            Self::InvertedEnergyRange { min, max } => {
                write!(f, "energy range is empty (min {min} MeV > max {max} MeV)")
            }
        }
    }
}

/// Where a pinned element or nuclide was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinnedPresence {
    /// Appears in the returned rows.
    InResults,
    /// Matches exist but were cut by the limit.
    OnlyInFullDataset,
    /// No matching row involves it.
    Absent,
}

impl fmt::Display for PinnedPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InResults => write!(f, "present in results"),
            Self::OnlyInFullDataset => {
                write!(f, "exists in full dataset but not in limited results")
            }
            Self::Absent => write!(f, "does not exist in matching reactions"),
        }
    }
}

/// Pinned selector with its resolved presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedStatus {
    /// The pinned element or nuclide.
    pub selector: Selector,
    /// Where it was found.
    pub presence: PinnedPresence,
}

/// Result of a reaction query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Queried table.
    pub kind: ReactionKind,
    /// Returned rows, energy descending.
    pub reactions: Vec<Reaction>,
    /// Matches in the full dataset, regardless of limit.
    pub total_count: usize,
    /// Limit applied, or `None` when the full dataset was requested.
    pub applied_limit: Option<usize>,
    /// Pinned selector status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<PinnedStatus>,
    /// Elements present in the returned rows.
    pub elements: BTreeSet<u8>,
    /// Input strings that did not parse.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_inputs: Vec<String>,
    /// Set when the query short-circuited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<QueryDiagnostic>,
}

impl QueryOutcome {
    pub(crate) fn empty(kind: ReactionKind, diagnostic: QueryDiagnostic) -> Self {
        Self {
            kind,
            reactions: Vec::new(),
            total_count: 0,
            applied_limit: None,
            pinned: None,
            elements: BTreeSet::new(),
            ignored_inputs: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }

    /// Number of rows returned.
    #[must_use]
    pub fn shown_count(&self) -> usize {
        self.reactions.len()
    }

    /// True if the limit cut matching rows.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.reactions.len() < self.total_count
    }

    /// Summary line, e.g. `showing 10 of 240 reactions`.
    #[must_use]
    pub fn caption(&self) -> String {
        format!(
            "showing {} of {} reactions",
            self.reactions.len(),
            self.total_count
        )
    }

    /// Symbols of the elements present in the returned rows.
    #[must_use]
    pub fn element_symbols(&self) -> Vec<&'static str> {
        self.elements
            .iter()
            .filter_map(|z| element_symbol(*z))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_messages() {
        assert_eq!(
            QueryDiagnostic::NoInputSpecified.to_string(),
            "no fuel/input specified"
        );
        let msg = QueryDiagnostic::InvertedEnergyRange { min: 5.0, max: 1.0 }.to_string();
        assert!(msg.contains("min 5"));
    }

    #[test]
    fn pinned_presence_messages_are_distinct() {
        assert_ne!(
            PinnedPresence::OnlyInFullDataset.to_string(),
            PinnedPresence::Absent.to_string()
        );
        assert!(PinnedPresence::OnlyInFullDataset
            .to_string()
            .contains("not in limited results"));
    }

    #[test]
    fn empty_outcome_caption() {
        let outcome = QueryOutcome::empty(ReactionKind::Fusion, QueryDiagnostic::NoInputSpecified);
        assert_eq!(outcome.caption(), "showing 0 of 0 reactions");
        assert!(!outcome.is_truncated());
    }
}
