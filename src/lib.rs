//! # CascadeQL - Reaction Query & Cascade Simulation Engine
//!
//! CascadeQL searches a static, read-only table of nuclides and precomputed
//! nuclear reactions. It answers bounded single-step lookups and runs
//! multi-generation cascades that chain reactions together from a fuel set.
//!
//! ## Core Concepts
//!
//! - **Nuclide**: an isotope identified by `(Z, A)`
//! - **Reaction**: fusion (2→1), fission (1→2) or two-to-two (2→2) with a release energy
//! - **QueryFilter**: typed per-slot element/nuclide sets, energy range, neutrino and statistics classes
//! - **Cascade**: a cancellable loop that pairs pool nuclides and feeds outputs back
//! - **Pathway**: a recurring chain of reactions with frequency, energy and rarity
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cascadeql::{
//!     CancellationToken, CascadeParameters, CascadeSimulator, InMemoryReactionStore, Nuclide,
//!     NuclideId, QueryEngine, Reaction,
//! };
//!
//! let h1: NuclideId = "H-1".parse()?;
//! let li7: NuclideId = "Li-7".parse()?;
//! let be8: NuclideId = "Be-8".parse()?;
//!
//! let mut builder = InMemoryReactionStore::builder();
//! builder.add_nuclide(Nuclide::stable(h1, 0.0))?;
//! builder.add_nuclide(Nuclide::stable(li7, 39.244))?;
//! builder.add_nuclide(Nuclide::stable(be8, 56.5))?;
//! builder.add_reaction(Reaction::fusion([h1, li7], be8, 17.255));
//! let store = Arc::new(builder.build()?);
//!
//! let simulator = CascadeSimulator::new(QueryEngine::new(store));
//! let params = CascadeParameters::builder().fuel("H-1").fuel("Li-7").build()?;
//! let result = simulator.run(&params, |_| {}, &CancellationToken::new())?;
//! assert_eq!(result.reactions.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Reference data
pub mod error;
pub mod nuclide;
pub mod reaction;
pub mod storage;

// Engine
pub mod cascade;
pub mod config;
pub mod pathway;
pub mod query;
pub mod runtime;

pub use cascade::{
    CancellationToken, CascadeEvent, CascadeParameters, CascadePhase, CascadeResult,
    CascadeSimulator, DiscoveredReaction, LoopProgress, TerminationReason, MAX_LOOPS,
};
pub use config::{EngineConfig, PathwayConfig, QueryConfig, RuntimeConfig};
pub use error::{ExecutionError, TransmuteError, TransmuteResult, ValidationError};
pub use nuclide::{Nuclide, NuclideId, ParticleClass, Selector};
pub use pathway::{
    CascadeSummary, FlowGraph, GraphOutcome, Pathway, PathwayAnalyzer, PathwaySelection,
    PathwaySort, PathwaySummary, ProductDistribution,
};
pub use query::{
    InputSlot, PinnedPresence, QueryDiagnostic, QueryEngine, QueryFilter, QueryOutcome,
};
pub use reaction::{NeutrinoType, Reaction, ReactionId, ReactionKind};
pub use runtime::{CascadeHandle, CascadeUpdate, EngineRuntime, QueryHandle};
pub use storage::{InMemoryReactionStore, ReactionStore, StorageError};
