//! Abstract storage trait for the reaction dataset.
//!
//! The store is read-only reference data: nuclide properties plus the three
//! reaction tables. Backends must answer every lookup through an index; the
//! query engine never asks for a whole table when a narrower path exists.

use thiserror::Error;

use crate::nuclide::{Nuclide, NuclideId};
use crate::reaction::{Reaction, ReactionKind};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nuclide not found.
    #[error("Nuclide not found: {0}")]
    NuclideNotFound(NuclideId),

    /// Nuclide inserted twice while building a store.
    #[error("Duplicate nuclide: {0}")]
    DuplicateNuclide(NuclideId),

    /// A record is internally inconsistent.
    #[error("Malformed entry: {0}")]
    MalformedEntry(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Read-only access to nuclides and reactions.
///
/// # Concurrency
/// Implementations are shared behind `Arc` across query workers and cascade
/// runs. No method may mutate observable state.
pub trait ReactionStore: Send + Sync {
    /// Get a nuclide by identity.
    fn nuclide(&self, id: NuclideId) -> Result<Option<Nuclide>, StorageError>;

    /// All nuclides of one element, ascending by mass number.
    fn nuclides_of_element(&self, z: u8) -> Result<Vec<NuclideId>, StorageError>;

    /// Reactions of `kind` that list `id` among their inputs.
    fn reactions_with_input(
        &self,
        kind: ReactionKind,
        id: NuclideId,
    ) -> Result<Vec<Reaction>, StorageError>;

    /// Fusion reactions whose inputs both belong to `inputs`.
    fn lookup_fusion(&self, inputs: &[NuclideId]) -> Result<Vec<Reaction>, StorageError>;

    /// Fission reactions of a single input nuclide.
    fn lookup_fission(&self, input: NuclideId) -> Result<Vec<Reaction>, StorageError>;

    /// Two-to-two reactions whose inputs both belong to `inputs`.
    fn lookup_two_to_two(&self, inputs: &[NuclideId]) -> Result<Vec<Reaction>, StorageError>;

    /// Number of reactions of `kind` with exactly this input multiset.
    fn count_with_inputs(
        &self,
        kind: ReactionKind,
        inputs: &[NuclideId],
    ) -> Result<usize, StorageError>;

    /// Total rows in a reaction table.
    fn table_len(&self, kind: ReactionKind) -> Result<usize, StorageError>;
}

/// Resolves a nuclide or fails with `NuclideNotFound`.
pub fn require_nuclide(store: &dyn ReactionStore, id: NuclideId) -> Result<Nuclide, StorageError> {
    store.nuclide(id)?.ok_or(StorageError::NuclideNotFound(id))
}
