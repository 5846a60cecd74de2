//! Output product distribution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cascade::DiscoveredReaction;
use crate::nuclide::NuclideId;

/// Occurrences of one output nuclide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCount {
    /// Output nuclide.
    pub nuclide: NuclideId,
    /// Occurrences, weighted by reaction frequency.
    pub count: usize,
}

/// Output nuclides ranked by occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDistribution {
    entries: Vec<ProductCount>,
    summary_size: usize,
}

impl ProductDistribution {
    /// Counts every output of every reaction, weighted by its frequency.
    /// A reaction with two identical outputs counts that nuclide twice.
    #[must_use]
    pub fn from_reactions(reactions: &[DiscoveredReaction], summary_size: usize) -> Self {
        let mut counts: BTreeMap<NuclideId, usize> = BTreeMap::new();
        for discovered in reactions {
            for output in discovered.reaction.outputs() {
                *counts.entry(*output).or_default() += discovered.frequency;
            }
        }

        let mut entries: Vec<ProductCount> = counts
            .into_iter()
            .map(|(nuclide, count)| ProductCount { nuclide, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.nuclide.cmp(&b.nuclide)));

        Self {
            entries,
            summary_size,
        }
    }

    /// All entries, most frequent first.
    #[must_use]
    pub fn entries(&self) -> &[ProductCount] {
        &self.entries
    }

    /// The `n` most frequent products.
    #[must_use]
    pub fn top(&self, n: usize) -> &[ProductCount] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// The configured "top products" summary.
    #[must_use]
    pub fn top_products(&self) -> &[ProductCount] {
        self.top(self.summary_size)
    }

    /// Number of distinct output nuclides.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.entries.len()
    }

    /// Count for one nuclide, zero if never produced.
    #[must_use]
    pub fn count_of(&self, nuclide: NuclideId) -> usize {
        self.entries
            .iter()
            .find(|e| e.nuclide == nuclide)
            .map_or(0, |e| e.count)
    }

    /// Sum over all entries.
    #[must_use]
    pub fn total_occurrences(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::Reaction;

    fn n(s: &str) -> NuclideId {
        NuclideId::parse(s).unwrap()
    }

    fn discovered(reaction: Reaction, frequency: usize) -> DiscoveredReaction {
        DiscoveredReaction {
            reaction,
            first_loop: 1,
            frequency,
            via_feedback: false,
        }
    }

    #[test]
    fn counts_are_weighted_by_frequency() {
        let reactions = [
            discovered(
                Reaction::two_to_two([n("H-1"), n("Li-7")], [n("He-4"), n("He-4")], 17.347),
                3,
            ),
            discovered(Reaction::fusion([n("H-1"), n("Li-7")], n("Be-8"), 17.255), 2),
            discovered(Reaction::fusion([n("H-1"), n("H-2")], n("He-3"), 5.493), 2),
        ];
        let dist = ProductDistribution::from_reactions(&reactions, 2);
        assert_eq!(dist.count_of(n("He-4")), 6);
        assert_eq!(dist.distinct_count(), 3);
        assert_eq!(dist.total_occurrences(), 10);
        assert_eq!(dist.top_products().len(), 2);
        assert_eq!(dist.top(1)[0].nuclide, n("He-4"));
        // Ties break by ascending nuclide.
        assert_eq!(dist.entries()[1].nuclide, n("He-3"));
        assert_eq!(dist.top(100).len(), 3);
    }
}
