//! Cascade outputs and progress events.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::nuclide::NuclideId;
use crate::pathway::{PathwaySummary, ProductDistribution};
use crate::reaction::{Reaction, ReactionId, ReactionKind};

use super::params::CascadeParameters;

/// A reaction found during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredReaction {
    /// The reaction fact.
    pub reaction: Reaction,
    /// Loop that first returned it (1-based).
    pub first_loop: usize,
    /// Number of loops that returned it.
    pub frequency: usize,
    /// True if any input came from feedback rather than the fuel.
    pub via_feedback: bool,
}

impl DiscoveredReaction {
    /// Identity of the underlying reaction.
    #[must_use]
    pub const fn id(&self) -> ReactionId {
        self.reaction.id
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// A loop found nothing new and the pool did not grow.
    Converged,
    /// `max_loops` loops ran.
    MaxLoopsReached,
    /// The cancellation token was set.
    Cancelled,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "converged"),
            Self::MaxLoopsReached => write!(f, "max_loops_reached"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Per-loop progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopProgress {
    /// 1-based loop index.
    pub loop_index: usize,
    /// Reactions first discovered in this loop.
    pub new_reactions: usize,
    /// Discovered reactions so far.
    pub total_reactions: usize,
    /// Active pool size when the loop ran.
    pub pool_size: usize,
}

/// Progress notifications delivered during a run.
#[derive(Debug, Clone, Copy)]
pub enum CascadeEvent<'a> {
    /// A loop finished merging.
    Loop(LoopProgress),
    /// The run terminated normally or by cancellation.
    Finished {
        /// Termination reason.
        reason: TerminationReason,
        /// The final result.
        result: &'a CascadeResult,
    },
    /// The run aborted on a data error.
    Failed {
        /// Diagnostic message.
        message: &'a str,
    },
}

/// Immutable snapshot of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeResult {
    /// Run identity.
    pub run_id: Uuid,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Parameters the run used.
    pub parameters: CascadeParameters,
    /// Discovered reactions, in discovery order.
    pub reactions: Vec<DiscoveredReaction>,
    /// Loops actually executed.
    pub loops_executed: usize,
    /// Why the run stopped.
    pub termination: TerminationReason,
    /// Sum of release energy over `reactions`.
    pub total_energy_mev: f64,
    /// Wall-clock run time.
    pub execution_time: Duration,
    /// One entry per executed loop.
    pub loop_history: Vec<LoopProgress>,
    /// Active pool at termination.
    pub final_pool: BTreeSet<NuclideId>,
    /// Output occurrence counts.
    pub products: ProductDistribution,
    /// Reconstructed pathways.
    pub pathways: PathwaySummary,
}

impl CascadeResult {
    /// Identities in discovery order.
    #[must_use]
    pub fn reaction_ids(&self) -> Vec<ReactionId> {
        self.reactions.iter().map(DiscoveredReaction::id).collect()
    }

    /// Discovered reactions of one kind.
    pub fn reactions_of_kind(&self, kind: ReactionKind) -> impl Iterator<Item = &DiscoveredReaction> {
        self.reactions
            .iter()
            .filter(move |d| d.reaction.kind() == kind)
    }

    /// Looks up a discovered reaction.
    #[must_use]
    pub fn get(&self, id: ReactionId) -> Option<&DiscoveredReaction> {
        self.reactions.iter().find(|d| d.id() == id)
    }

    /// Nuclides added to the pool by feedback.
    #[must_use]
    pub fn feedback_nuclides(&self) -> BTreeSet<NuclideId> {
        self.final_pool
            .difference(&self.parameters.fuel)
            .copied()
            .collect()
    }
}
