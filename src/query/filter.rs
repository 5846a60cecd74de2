//! Typed query filters.
//!
//! Filters are built from user strings but stored as resolved, typed sets.
//! Within a slot, elements and nuclides are OR'd; across slots they are AND'd.
//! An empty slot means "any". A slot that only ever received unparseable
//! strings matches nothing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::nuclide::{Nuclide, NuclideId, ParticleClass, Selector};
use crate::reaction::NeutrinoType;

/// Constraint on one input or output position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFilter {
    /// Permitted elements (atomic numbers).
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub elements: BTreeSet<u8>,
    /// Permitted nuclides.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub nuclides: BTreeSet<NuclideId>,
    /// Strings that did not parse; kept so the slot can match nothing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
}

impl SlotFilter {
    /// Unconstrained slot.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Slot restricted to exactly these nuclides.
    #[must_use]
    pub fn nuclides(ids: impl IntoIterator<Item = NuclideId>) -> Self {
        Self {
            nuclides: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Adds a user selector string. Unknown strings are recorded, not raised.
    pub fn select(&mut self, raw: &str) {
        match Selector::parse(raw) {
            Some(selector) => self.add(selector),
            None => self.rejected.push(raw.to_string()),
        }
    }

    /// Adds a parsed selector.
    pub fn add(&mut self, selector: Selector) {
        match selector {
            Selector::Element(z) => {
                self.elements.insert(z);
            }
            Selector::Nuclide(id) => {
                self.nuclides.insert(id);
            }
        }
    }

    /// True if the caller supplied anything for this slot.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.is_well_formed() || !self.rejected.is_empty()
    }

    /// True if at least one element or nuclide resolved.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.elements.is_empty() || !self.nuclides.is_empty()
    }

    /// Slot membership test.
    #[must_use]
    pub fn matches(&self, id: NuclideId) -> bool {
        if !self.is_well_formed() {
            return self.rejected.is_empty();
        }
        self.elements.contains(&id.z) || self.nuclides.contains(&id)
    }
}

/// Inclusive release-energy bounds in MeV. Absent bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyRange {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl EnergyRange {
    /// Range with only a lower bound.
    #[must_use]
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// True when both bounds exist and `min > max`.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        matches!((self.min, self.max), (Some(lo), Some(hi)) if lo > hi)
    }

    /// True when neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Inclusive range check.
    #[must_use]
    pub fn contains(&self, energy_mev: f64) -> bool {
        self.min.map_or(true, |lo| energy_mev >= lo) && self.max.map_or(true, |hi| energy_mev <= hi)
    }
}

/// Optional boson/fermion requirements on nuclides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsFilter {
    /// Required nuclear class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nuclear: Option<ParticleClass>,
    /// Required atomic class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomic: Option<ParticleClass>,
}

impl StatisticsFilter {
    /// True if no class is required.
    #[must_use]
    pub const fn is_any(&self) -> bool {
        self.nuclear.is_none() && self.atomic.is_none()
    }

    /// Class check against nuclide reference data.
    #[must_use]
    pub fn matches(&self, nuclide: &Nuclide) -> bool {
        self.nuclear.map_or(true, |c| nuclide.nuclear == c)
            && self.atomic.map_or(true, |c| nuclide.atomic == c)
    }
}

/// Input position for builder calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSlot {
    /// First input (the only input of a fission).
    First,
    /// Second input.
    Second,
}

impl InputSlot {
    const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }
}

/// A complete reaction query filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Input slot constraints. Fission only consults the first slot.
    #[serde(default)]
    pub inputs: [SlotFilter; 2],
    /// Output constraint: at least one output must match.
    #[serde(default)]
    pub outputs: SlotFilter,
    /// Release-energy bounds.
    #[serde(default)]
    pub energy: EnergyRange,
    /// Neutrino classes to include; empty includes all.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub neutrinos: BTreeSet<NeutrinoType>,
    /// Class requirement applied to every input.
    #[serde(default)]
    pub input_statistics: StatisticsFilter,
    /// Class requirement applied to every output.
    #[serde(default)]
    pub output_statistics: StatisticsFilter,
    /// Element or nuclide whose presence the caller wants reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<Selector>,
    /// Maximum rows returned; the engine default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Return every match, ignoring `limit`.
    #[serde(default)]
    pub use_full_dataset: bool,
}

impl QueryFilter {
    /// Start building a filter.
    #[must_use]
    pub fn builder() -> QueryFilterBuilder {
        QueryFilterBuilder::default()
    }

    /// Filter matching reactions whose inputs are exactly `inputs`.
    #[must_use]
    pub fn exact_inputs(inputs: &[NuclideId]) -> Self {
        let mut filter = Self {
            use_full_dataset: true,
            ..Self::default()
        };
        for (slot, id) in filter.inputs.iter_mut().zip(inputs) {
            slot.nuclides.insert(*id);
        }
        filter
    }

    /// True when nothing beyond input nuclides constrains the match.
    pub(crate) fn is_input_only(&self) -> bool {
        self.inputs.iter().all(|s| s.elements.is_empty() && s.rejected.is_empty())
            && !self.outputs.is_constrained()
            && self.energy.is_unbounded()
            && self.neutrinos.is_empty()
            && self.input_statistics.is_any()
            && self.output_statistics.is_any()
    }
}

/// Fluent builder for `QueryFilter`.
///
/// # Example
/// ```
/// use cascadeql::query::{InputSlot, QueryFilter};
///
/// let filter = QueryFilter::builder()
///     .input(InputSlot::First, "H")
///     .input(InputSlot::Second, "Li-7")
///     .min_energy(1.0)
///     .limit(10)
///     .build();
/// assert_eq!(filter.limit, Some(10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryFilterBuilder {
    filter: QueryFilter,
}

impl QueryFilterBuilder {
    /// Permit an element or nuclide in an input slot.
    #[must_use]
    pub fn input(mut self, slot: InputSlot, selector: &str) -> Self {
        self.filter.inputs[slot.index()].select(selector);
        self
    }

    /// Permit specific nuclides in an input slot.
    #[must_use]
    pub fn input_nuclides(
        mut self,
        slot: InputSlot,
        ids: impl IntoIterator<Item = NuclideId>,
    ) -> Self {
        self.filter.inputs[slot.index()].nuclides.extend(ids);
        self
    }

    /// Permit an element or nuclide among the outputs.
    #[must_use]
    pub fn output(mut self, selector: &str) -> Self {
        self.filter.outputs.select(selector);
        self
    }

    /// Inclusive lower energy bound.
    #[must_use]
    pub fn min_energy(mut self, mev: f64) -> Self {
        self.filter.energy.min = Some(mev);
        self
    }

    /// Inclusive upper energy bound.
    #[must_use]
    pub fn max_energy(mut self, mev: f64) -> Self {
        self.filter.energy.max = Some(mev);
        self
    }

    /// Include a neutrino class (all are included until one is named).
    #[must_use]
    pub fn neutrino(mut self, neutrino: NeutrinoType) -> Self {
        self.filter.neutrinos.insert(neutrino);
        self
    }

    /// Class requirement on inputs.
    #[must_use]
    pub fn input_statistics(mut self, stats: StatisticsFilter) -> Self {
        self.filter.input_statistics = stats;
        self
    }

    /// Class requirement on outputs.
    #[must_use]
    pub fn output_statistics(mut self, stats: StatisticsFilter) -> Self {
        self.filter.output_statistics = stats;
        self
    }

    /// Pin an element or nuclide. Unparseable strings are ignored.
    #[must_use]
    pub fn pin(mut self, selector: &str) -> Self {
        self.filter.pinned = Selector::parse(selector);
        self
    }

    /// Maximum rows returned.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.filter.limit = Some(limit);
        self
    }

    /// Return every match.
    #[must_use]
    pub fn use_full_dataset(mut self) -> Self {
        self.filter.use_full_dataset = true;
        self
    }

    /// Finish the filter.
    #[must_use]
    pub fn build(self) -> QueryFilter {
        self.filter
    }
}
