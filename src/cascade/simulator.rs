//! The cascade loop driver.

use std::time::Instant;

use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::PathwayConfig;
use crate::error::{storage_err, TransmuteResult, ValidationError};
use crate::nuclide::NuclideId;
use crate::pathway::PathwayAnalyzer;
use crate::query::QueryEngine;
use crate::reaction::{Reaction, ReactionKind};
use crate::storage::require_nuclide;

use super::cancel::CancellationToken;
use super::params::CascadeParameters;
use super::result::{CascadeEvent, CascadeResult, TerminationReason};
use super::state::{CascadePhase, CascadeRunState};

/// Runs cascades against a query engine.
///
/// The simulator holds no per-run state; every call to `run` owns a fresh
/// `CascadeRunState`, so one simulator may serve concurrent runs.
#[derive(Clone)]
pub struct CascadeSimulator {
    engine: QueryEngine,
    analyzer: PathwayAnalyzer,
}

impl CascadeSimulator {
    /// Simulator with default pathway bounds.
    #[must_use]
    pub fn new(engine: QueryEngine) -> Self {
        Self::with_config(engine, PathwayConfig::default())
    }

    /// Simulator with explicit pathway bounds.
    #[must_use]
    pub fn with_config(engine: QueryEngine, pathways: PathwayConfig) -> Self {
        let analyzer = PathwayAnalyzer::with_config(engine.clone(), pathways);
        Self { engine, analyzer }
    }

    /// The query engine used for lookups.
    #[must_use]
    pub const fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Runs one cascade.
    ///
    /// `on_progress` receives one `Loop` event per executed loop and then
    /// either `Finished` or `Failed`. Validation failures return before any
    /// event is emitted. Cancellation is checked at the start of each loop
    /// and again right after its progress event.
    pub fn run<F>(
        &self,
        params: &CascadeParameters,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> TransmuteResult<CascadeResult>
    where
        F: FnMut(CascadeEvent<'_>),
    {
        params.validate()?;
        for id in &params.fuel {
            if self.engine.store().nuclide(*id).map_err(storage_err)?.is_none() {
                return Err(ValidationError::FuelNotInStore { id: *id }.into());
            }
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut state = CascadeRunState::new(&params.fuel);
        state.transition(CascadePhase::Running)?;
        info!(
            "cascade {run_id} started: fuel={} max_loops={} pair_cap={}",
            params.fuel.len(),
            params.max_loops,
            params.max_nuclides_to_pair
        );

        let outcome = self.drive(params, &mut state, &mut on_progress, cancel).and_then(|reason| {
            let summary = self.analyzer.summarize(state.discovered(), &params.fuel)?;
            Ok((reason, summary))
        });

        let (reason, summary) = match outcome {
            Ok(done) => done,
            Err(err) => {
                state.transition(CascadePhase::Failed)?;
                let message = err.to_string();
                warn!("cascade {run_id} failed after {} loops: {message}", state.loop_index());
                on_progress(CascadeEvent::Failed { message: &message });
                return Err(err);
            }
        };

        state.transition(match reason {
            TerminationReason::Cancelled => CascadePhase::Cancelled,
            TerminationReason::Converged | TerminationReason::MaxLoopsReached => {
                CascadePhase::Completed
            }
        })?;

        let loops_executed = state.loop_index();
        let total_energy_mev = state.total_energy_mev();
        let (reactions, loop_history, final_pool) = state.into_parts();
        let result = CascadeResult {
            run_id,
            started_at,
            parameters: params.clone(),
            reactions,
            loops_executed,
            termination: reason,
            total_energy_mev,
            execution_time: clock.elapsed(),
            loop_history,
            final_pool,
            products: summary.products,
            pathways: summary.pathways,
        };

        info!(
            "cascade {run_id} {reason} after {loops_executed} loops: reactions={} energy={:.3} MeV",
            result.reactions.len(),
            result.total_energy_mev
        );
        on_progress(CascadeEvent::Finished {
            reason,
            result: &result,
        });
        Ok(result)
    }

    fn drive<F>(
        &self,
        params: &CascadeParameters,
        state: &mut CascadeRunState,
        on_progress: &mut F,
        cancel: &CancellationToken,
    ) -> TransmuteResult<TerminationReason>
    where
        F: FnMut(CascadeEvent<'_>),
    {
        for loop_index in 1..=params.max_loops {
            if cancel.is_cancelled() {
                return Ok(TerminationReason::Cancelled);
            }
            state.begin_loop(loop_index);
            let pool_size = state.pool().len();

            let batch = self.loop_batch(params, state)?;
            let fresh = state.merge(&batch);
            let progress = state.record_progress(fresh.len(), pool_size);
            debug!(
                "cascade loop {loop_index}: returned={} new={} total={} pool={pool_size}",
                batch.len(),
                progress.new_reactions,
                progress.total_reactions
            );
            on_progress(CascadeEvent::Loop(progress));

            if cancel.is_cancelled() {
                return Ok(TerminationReason::Cancelled);
            }

            let grown = if params.feedback_enabled() {
                let admitted = self.feedback(params, &fresh)?;
                state.grow_pool(admitted)
            } else {
                0
            };

            if fresh.is_empty() && grown == 0 {
                return Ok(TerminationReason::Converged);
            }
        }
        Ok(TerminationReason::MaxLoopsReached)
    }

    /// Fusion, fission, then two-to-two; each already in canonical order.
    fn loop_batch(
        &self,
        params: &CascadeParameters,
        state: &CascadeRunState,
    ) -> TransmuteResult<Vec<Reaction>> {
        let candidates = state.pairing_candidates(params.max_nuclides_to_pair);
        let mut batch = self.engine.pair_reactions(
            ReactionKind::Fusion,
            &candidates,
            params.min_energy(ReactionKind::Fusion),
        )?;
        batch.extend(self.engine.fission_reactions(
            state.pool().iter().copied(),
            params.min_energy(ReactionKind::Fission),
        )?);
        batch.extend(self.engine.pair_reactions(
            ReactionKind::TwoToTwo,
            &candidates,
            params.min_energy(ReactionKind::TwoToTwo),
        )?);
        Ok(batch)
    }

    /// Outputs of `fresh` whose nuclear class has feedback enabled.
    fn feedback(
        &self,
        params: &CascadeParameters,
        fresh: &[Reaction],
    ) -> TransmuteResult<Vec<NuclideId>> {
        let store = self.engine.store().as_ref();
        let mut admitted = Vec::new();
        for output in fresh.iter().flat_map(|r| r.outputs().iter().copied()) {
            let nuclide = require_nuclide(store, output).map_err(storage_err)?;
            if params.feeds_back(nuclide.nuclear) {
                admitted.push(output);
            }
        }
        Ok(admitted)
    }
}
