//! Reaction query engine.
//!
//! A query resolves each constrained input slot to candidate nuclides, drives
//! the store's per-input index from the narrowest slot, post-filters rows, and
//! shapes the result (limit, true total, pinned presence). Empty results are
//! reported through `QueryOutcome::diagnostic`, never as errors.

mod filter;
mod outcome;

pub use filter::{
    EnergyRange, InputSlot, QueryFilter, QueryFilterBuilder, SlotFilter, StatisticsFilter,
};
pub use outcome::{PinnedPresence, PinnedStatus, QueryDiagnostic, QueryOutcome};

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use log::debug;

use crate::config::QueryConfig;
use crate::error::{storage_err, TransmuteError, TransmuteResult, ValidationError};
use crate::nuclide::{Nuclide, NuclideId, Selector};
use crate::reaction::{Reaction, ReactionId, ReactionKind};
use crate::storage::{require_nuclide, ReactionStore};

/// Canonical row order: energy descending, then identity.
pub(crate) fn by_energy_desc(a: &Reaction, b: &Reaction) -> Ordering {
    b.energy_mev
        .total_cmp(&a.energy_mev)
        .then_with(|| a.id.cmp(&b.id))
}

/// Per-query nuclide cache for statistics checks.
struct NuclideCache<'a> {
    store: &'a dyn ReactionStore,
    entries: HashMap<NuclideId, Nuclide>,
}

impl<'a> NuclideCache<'a> {
    fn new(store: &'a dyn ReactionStore) -> Self {
        Self {
            store,
            entries: HashMap::new(),
        }
    }

    fn get(&mut self, id: NuclideId) -> TransmuteResult<&Nuclide> {
        if !self.entries.contains_key(&id) {
            let nuclide = require_nuclide(self.store, id).map_err(storage_err)?;
            self.entries.insert(id, nuclide);
        }
        self.entries
            .get(&id)
            .ok_or_else(|| TransmuteError::internal("nuclide cache miss"))
    }
}

/// Read-only query engine over a shared reaction store.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn ReactionStore>,
    config: QueryConfig,
}

impl QueryEngine {
    /// Engine with default limits.
    #[must_use]
    pub fn new(store: Arc<dyn ReactionStore>) -> Self {
        Self::with_config(store, QueryConfig::default())
    }

    /// Engine with explicit limits.
    #[must_use]
    pub fn with_config(store: Arc<dyn ReactionStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ReactionStore> {
        &self.store
    }

    /// Active limits.
    #[must_use]
    pub const fn config(&self) -> QueryConfig {
        self.config
    }

    /// Runs a filter against one reaction table.
    pub fn query(&self, filter: &QueryFilter, kind: ReactionKind) -> TransmuteResult<QueryOutcome> {
        let ignored_inputs = ignored_strings(filter, kind);

        if let Some(diagnostic) = precheck(filter, kind) {
            debug!("query {kind} short-circuited: {diagnostic}");
            let mut outcome = QueryOutcome::empty(kind, diagnostic);
            outcome.ignored_inputs = ignored_inputs;
            return Ok(outcome);
        }

        let mut matches = self.matching(filter, kind)?;
        let total_count = matches.len();
        let applied_limit = if filter.use_full_dataset {
            None
        } else {
            Some(self.effective_limit(filter.limit))
        };
        let shown = applied_limit.map_or(total_count, |limit| limit.min(total_count));

        let pinned = filter.pinned.map(|selector| PinnedStatus {
            selector,
            presence: pinned_presence(selector, &matches, shown),
        });

        matches.truncate(shown);
        let elements = matches
            .iter()
            .flat_map(Reaction::participants)
            .map(|id| id.z)
            .collect();

        Ok(QueryOutcome {
            kind,
            reactions: matches,
            total_count,
            applied_limit,
            pinned,
            elements,
            ignored_inputs,
            diagnostic: None,
        })
    }

    /// Number of rows the filter matches in the full table.
    ///
    /// Exact-input filters are answered from the store's count index without
    /// materializing rows.
    pub fn true_total_count(&self, filter: &QueryFilter, kind: ReactionKind) -> TransmuteResult<usize> {
        if precheck(filter, kind).is_some() {
            return Ok(0);
        }

        let slots = &filter.inputs[..kind.input_arity()];
        if filter.is_input_only() && slots.iter().all(|s| s.nuclides.len() == 1) {
            let inputs: Vec<NuclideId> = slots
                .iter()
                .filter_map(|s| s.nuclides.iter().next().copied())
                .collect();
            return self
                .store
                .count_with_inputs(kind, &inputs)
                .map_err(storage_err);
        }

        Ok(self.matching(filter, kind)?.len())
    }

    /// Fusion or two-to-two reactions whose inputs both come from
    /// `candidates`, at or above `min_mev`, in canonical order.
    pub fn pair_reactions(
        &self,
        kind: ReactionKind,
        candidates: &[NuclideId],
        min_mev: f64,
    ) -> TransmuteResult<Vec<Reaction>> {
        let mut rows = match kind {
            ReactionKind::Fusion => self.store.lookup_fusion(candidates),
            ReactionKind::TwoToTwo => self.store.lookup_two_to_two(candidates),
            ReactionKind::Fission => {
                return Err(ValidationError::InvalidParameter {
                    field: "kind".to_string(),
                    reason: "fission is looked up per nuclide, not per pair".to_string(),
                }
                .into())
            }
        }
        .map_err(storage_err)?;

        rows.retain(|r| r.energy_mev >= min_mev);
        rows.sort_by(by_energy_desc);
        Ok(rows)
    }

    /// Fission reactions of every nuclide in `pool`, at or above `min_mev`,
    /// in canonical order.
    pub fn fission_reactions(
        &self,
        pool: impl IntoIterator<Item = NuclideId>,
        min_mev: f64,
    ) -> TransmuteResult<Vec<Reaction>> {
        let mut rows = Vec::new();
        for id in pool {
            let found = self.store.lookup_fission(id).map_err(storage_err)?;
            rows.extend(found.into_iter().filter(|r| r.energy_mev >= min_mev));
        }
        rows.sort_by(by_energy_desc);
        Ok(rows)
    }

    fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_limit)
            .min(self.config.max_limit)
    }

    fn resolve_slot(&self, slot: &SlotFilter) -> TransmuteResult<BTreeSet<NuclideId>> {
        let mut candidates = slot.nuclides.clone();
        for z in &slot.elements {
            candidates.extend(self.store.nuclides_of_element(*z).map_err(storage_err)?);
        }
        Ok(candidates)
    }

    /// Every matching row, sorted.
    fn matching(&self, filter: &QueryFilter, kind: ReactionKind) -> TransmuteResult<Vec<Reaction>> {
        let slots = &filter.inputs[..kind.input_arity()];

        let mut driver: Option<BTreeSet<NuclideId>> = None;
        for slot in slots {
            if !slot.is_constrained() {
                continue;
            }
            let resolved = self.resolve_slot(slot)?;
            if resolved.is_empty() {
                // A constrained slot with no candidates cannot match any row.
                return Ok(Vec::new());
            }
            if driver.as_ref().map_or(true, |d| resolved.len() < d.len()) {
                driver = Some(resolved);
            }
        }
        let Some(driver) = driver else {
            return Ok(Vec::new());
        };

        debug!(
            "query {kind}: driving lookup from {} candidate nuclides",
            driver.len()
        );

        let mut seen: HashSet<ReactionId> = HashSet::new();
        let mut cache = NuclideCache::new(self.store.as_ref());
        let mut out = Vec::new();
        for id in driver {
            for reaction in self.store.reactions_with_input(kind, id).map_err(storage_err)? {
                if !seen.insert(reaction.id) {
                    continue;
                }
                if row_matches(filter, &reaction, &mut cache)? {
                    out.push(reaction);
                }
            }
        }
        out.sort_by(by_energy_desc);
        Ok(out)
    }
}

fn precheck(filter: &QueryFilter, kind: ReactionKind) -> Option<QueryDiagnostic> {
    let slots = &filter.inputs[..kind.input_arity()];
    if !slots.iter().any(SlotFilter::is_well_formed) {
        return Some(QueryDiagnostic::NoInputSpecified);
    }
    if let (true, Some(min), Some(max)) =
        (filter.energy.is_inverted(), filter.energy.min, filter.energy.max)
    {
        return Some(QueryDiagnostic::InvertedEnergyRange { min, max });
    }
    None
}

fn ignored_strings(filter: &QueryFilter, kind: ReactionKind) -> Vec<String> {
    filter.inputs[..kind.input_arity()]
        .iter()
        .chain(std::iter::once(&filter.outputs))
        .flat_map(|slot| slot.rejected.iter().cloned())
        .collect()
}

fn inputs_match(filter: &QueryFilter, inputs: &[NuclideId]) -> bool {
    let [first, second] = &filter.inputs;
    match inputs {
        [only] => first.matches(*only),
        [a, b] => {
            (first.matches(*a) && second.matches(*b)) || (first.matches(*b) && second.matches(*a))
        }
        _ => false,
    }
}

fn row_matches(
    filter: &QueryFilter,
    reaction: &Reaction,
    cache: &mut NuclideCache<'_>,
) -> TransmuteResult<bool> {
    if !inputs_match(filter, reaction.inputs()) {
        return Ok(false);
    }
    if !reaction.outputs().iter().any(|o| filter.outputs.matches(*o)) {
        return Ok(false);
    }
    if !filter.energy.contains(reaction.energy_mev) {
        return Ok(false);
    }
    if !filter.neutrinos.is_empty() && !filter.neutrinos.contains(&reaction.neutrino) {
        return Ok(false);
    }
    if !filter.input_statistics.is_any() {
        for id in reaction.inputs() {
            if !filter.input_statistics.matches(cache.get(*id)?) {
                return Ok(false);
            }
        }
    }
    if !filter.output_statistics.is_any() {
        for id in reaction.outputs() {
            if !filter.output_statistics.matches(cache.get(*id)?) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn pinned_presence(selector: Selector, matches: &[Reaction], shown: usize) -> PinnedPresence {
    let involves = |r: &Reaction| r.participants().any(|id| selector.covers(id));
    if matches[..shown].iter().any(involves) {
        PinnedPresence::InResults
    } else if matches[shown..].iter().any(involves) {
        PinnedPresence::OnlyInFullDataset
    } else {
        PinnedPresence::Absent
    }
}
