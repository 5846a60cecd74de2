//! In-memory storage backend.
//!
//! The store is assembled once through `ReactionStoreBuilder` and is immutable
//! afterwards, so it needs no locking: it is `Send + Sync` by construction and
//! can be shared behind `Arc` by any number of readers.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::debug;

use crate::nuclide::{Nuclide, NuclideId};
use crate::reaction::{InputKey, Reaction, ReactionId, ReactionKind};
use crate::storage::traits::{ReactionStore, StorageError};

fn row_index(len: usize) -> Result<u32, StorageError> {
    u32::try_from(len).map_err(|_| {
        StorageError::BackendError(format!("reaction table exceeds {} rows", u32::MAX))
    })
}

#[derive(Debug, Default)]
struct ReactionTable {
    rows: Vec<Reaction>,
    by_input: HashMap<NuclideId, Vec<u32>>,
    by_input_key: HashMap<InputKey, Vec<u32>>,
}

impl ReactionTable {
    fn push(&mut self, reaction: Reaction) -> Result<(), StorageError> {
        let idx = row_index(self.rows.len())?;

        // A self-pair (e.g. D + D) is indexed once under its nuclide.
        let distinct_inputs: BTreeSet<NuclideId> = reaction.inputs().iter().copied().collect();
        for input in distinct_inputs {
            self.by_input.entry(input).or_default().push(idx);
        }
        self.by_input_key
            .entry(reaction.input_key())
            .or_default()
            .push(idx);
        self.rows.push(reaction);
        Ok(())
    }

    fn rows_at(&self, indices: Option<&Vec<u32>>) -> Vec<Reaction> {
        indices
            .map(|idx| idx.iter().map(|&i| self.rows[i as usize]).collect())
            .unwrap_or_default()
    }

    fn lookup_pairs(&self, inputs: &[NuclideId]) -> Vec<Reaction> {
        let distinct: Vec<NuclideId> = inputs
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut out = Vec::new();
        for (i, a) in distinct.iter().enumerate() {
            for b in &distinct[i..] {
                let key = InputKey::new(&[*a, *b]);
                if let Some(indices) = self.by_input_key.get(&key) {
                    out.extend(indices.iter().map(|&idx| self.rows[idx as usize]));
                }
            }
        }
        out
    }
}

/// Thread-safe, immutable, indexed in-memory reaction store.
#[derive(Debug, Default)]
pub struct InMemoryReactionStore {
    nuclides: HashMap<NuclideId, Nuclide>,
    by_element: BTreeMap<u8, BTreeSet<NuclideId>>,
    fusion: ReactionTable,
    fission: ReactionTable,
    two_to_two: ReactionTable,
}

impl InMemoryReactionStore {
    /// Start building a store.
    #[must_use]
    pub fn builder() -> ReactionStoreBuilder {
        ReactionStoreBuilder::default()
    }

    const fn table(&self, kind: ReactionKind) -> &ReactionTable {
        match kind {
            ReactionKind::Fusion => &self.fusion,
            ReactionKind::Fission => &self.fission,
            ReactionKind::TwoToTwo => &self.two_to_two,
        }
    }

    /// Number of nuclides in the store.
    #[must_use]
    pub fn nuclide_count(&self) -> usize {
        self.nuclides.len()
    }

    /// All nuclide ids, ascending by `(Z, A)`.
    #[must_use]
    pub fn nuclide_ids(&self) -> Vec<NuclideId> {
        self.by_element.values().flatten().copied().collect()
    }
}

impl ReactionStore for InMemoryReactionStore {
    fn nuclide(&self, id: NuclideId) -> Result<Option<Nuclide>, StorageError> {
        Ok(self.nuclides.get(&id).cloned())
    }

    fn nuclides_of_element(&self, z: u8) -> Result<Vec<NuclideId>, StorageError> {
        Ok(self
            .by_element
            .get(&z)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn reactions_with_input(
        &self,
        kind: ReactionKind,
        id: NuclideId,
    ) -> Result<Vec<Reaction>, StorageError> {
        let table = self.table(kind);
        Ok(table.rows_at(table.by_input.get(&id)))
    }

    fn lookup_fusion(&self, inputs: &[NuclideId]) -> Result<Vec<Reaction>, StorageError> {
        Ok(self.fusion.lookup_pairs(inputs))
    }

    fn lookup_fission(&self, input: NuclideId) -> Result<Vec<Reaction>, StorageError> {
        Ok(self
            .fission
            .rows_at(self.fission.by_input_key.get(&InputKey::new(&[input]))))
    }

    fn lookup_two_to_two(&self, inputs: &[NuclideId]) -> Result<Vec<Reaction>, StorageError> {
        Ok(self.two_to_two.lookup_pairs(inputs))
    }

    fn count_with_inputs(
        &self,
        kind: ReactionKind,
        inputs: &[NuclideId],
    ) -> Result<usize, StorageError> {
        if inputs.len() != kind.input_arity() {
            return Err(StorageError::MalformedEntry(format!(
                "{kind} lookup expects {} inputs, got {}",
                kind.input_arity(),
                inputs.len()
            )));
        }
        Ok(self
            .table(kind)
            .by_input_key
            .get(&InputKey::new(inputs))
            .map_or(0, Vec::len))
    }

    fn table_len(&self, kind: ReactionKind) -> Result<usize, StorageError> {
        Ok(self.table(kind).rows.len())
    }
}

/// Builder for `InMemoryReactionStore`.
///
/// By default `build` rejects reactions that reference nuclides missing from
/// the nuclide table. `lenient` skips that check; lookups of the missing
/// nuclides then surface as `None` at query time.
#[derive(Debug, Default)]
pub struct ReactionStoreBuilder {
    nuclides: HashMap<NuclideId, Nuclide>,
    reactions: Vec<Reaction>,
    lenient: bool,
}

impl ReactionStoreBuilder {
    /// Add a nuclide. Returns error if the id already exists.
    pub fn add_nuclide(&mut self, nuclide: Nuclide) -> Result<&mut Self, StorageError> {
        if self.nuclides.contains_key(&nuclide.id) {
            return Err(StorageError::DuplicateNuclide(nuclide.id));
        }
        self.nuclides.insert(nuclide.id, nuclide);
        Ok(self)
    }

    /// Add a reaction row.
    pub fn add_reaction(&mut self, reaction: Reaction) -> &mut Self {
        self.reactions.push(reaction);
        self
    }

    /// Add many reaction rows.
    pub fn extend_reactions(&mut self, reactions: impl IntoIterator<Item = Reaction>) -> &mut Self {
        self.reactions.extend(reactions);
        self
    }

    /// Skip referential checks on reaction participants.
    pub fn lenient(&mut self) -> &mut Self {
        self.lenient = true;
        self
    }

    /// Validate and index everything.
    ///
    /// Rows with an identity already seen are dropped; the first row wins.
    pub fn build(self) -> Result<InMemoryReactionStore, StorageError> {
        let mut store = InMemoryReactionStore {
            nuclides: self.nuclides,
            ..InMemoryReactionStore::default()
        };

        for id in store.nuclides.keys() {
            store.by_element.entry(id.z).or_default().insert(*id);
        }

        let mut seen: HashSet<ReactionId> = HashSet::with_capacity(self.reactions.len());
        let mut duplicates = 0usize;
        for reaction in self.reactions {
            if !reaction.energy_mev.is_finite() {
                return Err(StorageError::MalformedEntry(format!(
                    "non-finite energy on {}",
                    reaction.id
                )));
            }
            if !self.lenient {
                if let Some(missing) = reaction
                    .participants()
                    .find(|id| !store.nuclides.contains_key(id))
                {
                    return Err(StorageError::MalformedEntry(format!(
                        "reaction {reaction} references unknown nuclide {missing}"
                    )));
                }
            }
            if !seen.insert(reaction.id) {
                duplicates += 1;
                continue;
            }
            match reaction.kind() {
                ReactionKind::Fusion => store.fusion.push(reaction)?,
                ReactionKind::Fission => store.fission.push(reaction)?,
                ReactionKind::TwoToTwo => store.two_to_two.push(reaction)?,
            }
        }

        debug!(
            "reaction store built: nuclides={} fusion={} fission={} two_to_two={} duplicates_dropped={}",
            store.nuclides.len(),
            store.fusion.rows.len(),
            store.fission.rows.len(),
            store.two_to_two.rows.len(),
            duplicates
        );
        Ok(store)
    }
}
