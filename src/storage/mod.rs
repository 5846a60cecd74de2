//! Storage for the nuclide and reaction dataset.
//!
//! `ReactionStore` is the read-only contract the engine consumes;
//! `InMemoryReactionStore` is the indexed reference backend.

mod memory;
mod traits;

pub use memory::{InMemoryReactionStore, ReactionStoreBuilder};
pub use traits::{require_nuclide, ReactionStore, StorageError};
