//! Run state owned by a single cascade.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExecutionError, TransmuteResult};
use crate::nuclide::NuclideId;
use crate::reaction::{Reaction, ReactionId};

use super::result::{DiscoveredReaction, LoopProgress};

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePhase {
    /// Created, not started.
    Idle,
    /// Loops are executing.
    Running,
    /// Converged or reached the loop cap.
    Completed,
    /// Stopped by the cancellation token.
    Cancelled,
    /// Aborted on a data error.
    Failed,
}

impl CascadePhase {
    /// True for phases a run never leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Allowed edges of the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed | Self::Cancelled | Self::Failed)
        )
    }
}

impl fmt::Display for CascadePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Mutable state of one run: active pool, discovered set, loop bookkeeping.
///
/// The discovered set is insertion-ordered so pathway reconstruction sees the
/// same order on every run.
#[derive(Debug)]
pub struct CascadeRunState {
    phase: CascadePhase,
    fuel: BTreeSet<NuclideId>,
    pool: BTreeSet<NuclideId>,
    discovered: Vec<DiscoveredReaction>,
    index: HashMap<ReactionId, usize>,
    loop_index: usize,
    history: Vec<LoopProgress>,
}

impl CascadeRunState {
    /// Fresh state; the pool starts equal to the fuel.
    #[must_use]
    pub fn new(fuel: &BTreeSet<NuclideId>) -> Self {
        Self {
            phase: CascadePhase::Idle,
            fuel: fuel.clone(),
            pool: fuel.clone(),
            discovered: Vec::new(),
            index: HashMap::new(),
            loop_index: 0,
            history: Vec::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> CascadePhase {
        self.phase
    }

    /// Moves to `next`, rejecting edges outside the lifecycle.
    pub fn transition(&mut self, next: CascadePhase) -> TransmuteResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(ExecutionError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        self.phase = next;
        Ok(())
    }

    /// Active pool.
    #[must_use]
    pub const fn pool(&self) -> &BTreeSet<NuclideId> {
        &self.pool
    }

    /// Discovered reactions in insertion order.
    #[must_use]
    pub fn discovered(&self) -> &[DiscoveredReaction] {
        &self.discovered
    }

    /// Index of the last loop started.
    #[must_use]
    pub const fn loop_index(&self) -> usize {
        self.loop_index
    }

    /// Progress records so far.
    #[must_use]
    pub fn history(&self) -> &[LoopProgress] {
        &self.history
    }

    /// Marks the start of loop `index`.
    pub fn begin_loop(&mut self, index: usize) {
        self.loop_index = index;
    }

    /// The first `max` pool nuclides by ascending `(Z, A)`.
    #[must_use]
    pub fn pairing_candidates(&self, max: usize) -> Vec<NuclideId> {
        self.pool.iter().take(max).copied().collect()
    }

    /// Merges a batch by identity and returns the reactions that were new.
    ///
    /// Known reactions gain one frequency per loop that returns them.
    pub fn merge(&mut self, batch: &[Reaction]) -> Vec<Reaction> {
        let mut seen_this_loop: HashSet<ReactionId> = HashSet::with_capacity(batch.len());
        let mut fresh = Vec::new();
        for reaction in batch {
            if !seen_this_loop.insert(reaction.id) {
                continue;
            }
            if let Some(&slot) = self.index.get(&reaction.id) {
                self.discovered[slot].frequency += 1;
                continue;
            }
            let via_feedback = reaction.inputs().iter().any(|id| !self.fuel.contains(id));
            self.index.insert(reaction.id, self.discovered.len());
            self.discovered.push(DiscoveredReaction {
                reaction: *reaction,
                first_loop: self.loop_index,
                frequency: 1,
                via_feedback,
            });
            fresh.push(*reaction);
        }
        fresh
    }

    /// Records loop progress and returns the record.
    pub fn record_progress(&mut self, new_reactions: usize, pool_size: usize) -> LoopProgress {
        let progress = LoopProgress {
            loop_index: self.loop_index,
            new_reactions,
            total_reactions: self.discovered.len(),
            pool_size,
        };
        self.history.push(progress);
        progress
    }

    /// Adds nuclides to the pool and returns how many were not already there.
    pub fn grow_pool(&mut self, ids: impl IntoIterator<Item = NuclideId>) -> usize {
        let before = self.pool.len();
        self.pool.extend(ids);
        self.pool.len() - before
    }

    /// Sum of release energy over the discovered set.
    #[must_use]
    pub fn total_energy_mev(&self) -> f64 {
        self.discovered.iter().map(|d| d.reaction.energy_mev).sum()
    }

    /// Consumes the state into its discovered set, history and pool.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        Vec<DiscoveredReaction>,
        Vec<LoopProgress>,
        BTreeSet<NuclideId>,
    ) {
        (self.discovered, self.history, self.pool)
    }
}
