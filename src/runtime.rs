//! Bounded worker runtime.
//!
//! Queries and cascades run on separate thread pools so a long cascade never
//! delays interactive lookups. Each pool is fed by a bounded channel; a full
//! queue fails fast instead of blocking the caller.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use log::debug;

use crate::cascade::{
    CancellationToken, CascadeEvent, CascadeParameters, CascadeResult, CascadeSimulator,
    LoopProgress, TerminationReason,
};
use crate::config::EngineConfig;
use crate::error::{ExecutionError, TransmuteError, TransmuteResult};
use crate::query::{QueryEngine, QueryFilter, QueryOutcome};
use crate::reaction::ReactionKind;
use crate::storage::ReactionStore;

/// Worker pool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPath {
    /// Single-table queries.
    Query,
    /// Cascade runs.
    Cascade,
}

impl ExecutionPath {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Cascade => "cascade",
        }
    }
}

/// Owned progress notification sent over a cascade's event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeUpdate {
    /// A loop finished.
    Loop(LoopProgress),
    /// The run terminated; the full result is available from `join`.
    Finished {
        /// Termination reason.
        reason: TerminationReason,
        /// Loops executed.
        loops_executed: usize,
        /// Reactions discovered.
        total_reactions: usize,
    },
    /// The run aborted.
    Failed {
        /// Diagnostic message.
        message: String,
    },
}

impl From<CascadeEvent<'_>> for CascadeUpdate {
    fn from(event: CascadeEvent<'_>) -> Self {
        match event {
            CascadeEvent::Loop(progress) => Self::Loop(progress),
            CascadeEvent::Finished { reason, result } => Self::Finished {
                reason,
                loops_executed: result.loops_executed,
                total_reactions: result.reactions.len(),
            },
            CascadeEvent::Failed { message } => Self::Failed {
                message: message.to_string(),
            },
        }
    }
}

enum Job {
    Query {
        filter: QueryFilter,
        kind: ReactionKind,
        reply: Sender<TransmuteResult<QueryOutcome>>,
    },
    Cascade {
        params: CascadeParameters,
        cancel: CancellationToken,
        events: Sender<CascadeUpdate>,
        reply: Sender<TransmuteResult<CascadeResult>>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

fn run_job(simulator: &CascadeSimulator, job: Job) {
    match job {
        Job::Query {
            filter,
            kind,
            reply,
        } => {
            let _ = reply.send(simulator.engine().query(&filter, kind));
        }
        Job::Cascade {
            params,
            cancel,
            events,
            reply,
        } => {
            let result = simulator.run(
                &params,
                |event| {
                    // Events beyond the channel capacity are dropped; the
                    // result itself always travels on `reply`.
                    if let Err(TrySendError::Full(_)) = events.try_send(event.into()) {
                        debug!("cascade event channel full, dropping event");
                    }
                },
                &cancel,
            );
            let _ = reply.send(result);
        }

        #[cfg(test)]
        Job::Sleep { duration, reply } => {
            thread::sleep(duration);
            let _ = reply.send(());
        }
    }
}

struct WorkerPool {
    path: ExecutionPath,
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl WorkerPool {
    fn start(
        path: ExecutionPath,
        workers: usize,
        queue_capacity: usize,
        simulator: &Arc<CascadeSimulator>,
    ) -> TransmuteResult<Self> {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let simulator = Arc::clone(simulator);
            let handle = thread::Builder::new()
                .name(format!("cascadeql-{}-{idx}", path.as_str()))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        run_job(&simulator, job);
                    }
                })
                .map_err(|e| TransmuteError::internal(format!("failed to spawn worker: {e}")))?;
            handles.push(handle);
        }

        Ok(Self {
            path,
            tx,
            workers: handles,
            queue_capacity,
        })
    }

    fn try_submit(&self, job: Job) -> TransmuteResult<()> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ExecutionError::QueueFull {
                path: self.path.as_str().to_string(),
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected {
                path: self.path.as_str().to_string(),
            }
            .into()),
        }
    }

    fn shutdown(self) {
        // Closing the channel lets workers drain queued jobs, then exit.
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

fn wait<T>(
    rx: &Receiver<TransmuteResult<T>>,
    path: ExecutionPath,
    timeout: Option<Duration>,
) -> TransmuteResult<T> {
    let disconnected = || {
        TransmuteError::from(ExecutionError::Disconnected {
            path: path.as_str().to_string(),
        })
    };
    match timeout {
        None => rx.recv().map_err(|_| disconnected())?,
        Some(timeout) => rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => TransmuteError::from(ExecutionError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            RecvTimeoutError::Disconnected => disconnected(),
        })?,
    }
}

/// Handle to a submitted query.
pub struct QueryHandle {
    rx: Receiver<TransmuteResult<QueryOutcome>>,
}

impl QueryHandle {
    /// Waits for the outcome.
    pub fn join(self) -> TransmuteResult<QueryOutcome> {
        wait(&self.rx, ExecutionPath::Query, None)
    }

    /// Waits for the outcome, at most `timeout`.
    pub fn join_timeout(self, timeout: Duration) -> TransmuteResult<QueryOutcome> {
        wait(&self.rx, ExecutionPath::Query, Some(timeout))
    }
}

/// Handle to a submitted cascade.
pub struct CascadeHandle {
    rx: Receiver<TransmuteResult<CascadeResult>>,
    events: Receiver<CascadeUpdate>,
    cancel: CancellationToken,
}

impl CascadeHandle {
    /// Requests cancellation; the run stops at its next loop boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The run's cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Progress stream. Closed once the run ends.
    #[must_use]
    pub fn events(&self) -> &Receiver<CascadeUpdate> {
        &self.events
    }

    /// Next progress event if one is buffered.
    pub fn try_next_event(&self) -> Option<CascadeUpdate> {
        match self.events.try_recv() {
            Ok(update) => Some(update),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits for the result.
    pub fn join(self) -> TransmuteResult<CascadeResult> {
        wait(&self.rx, ExecutionPath::Cascade, None)
    }

    /// Waits for the result, at most `timeout`. This bounds the caller's
    /// wait only; the run itself keeps going unless cancelled.
    pub fn join_timeout(self, timeout: Duration) -> TransmuteResult<CascadeResult> {
        wait(&self.rx, ExecutionPath::Cascade, Some(timeout))
    }
}

/// Runtime owning the query and cascade worker pools.
pub struct EngineRuntime {
    simulator: Arc<CascadeSimulator>,
    query: Option<WorkerPool>,
    cascade: Option<WorkerPool>,
    event_capacity: usize,
}

impl EngineRuntime {
    /// Validates `config` and starts both pools over `store`.
    pub fn new(store: Arc<dyn ReactionStore>, config: EngineConfig) -> TransmuteResult<Self> {
        config.validate()?;
        let engine = QueryEngine::with_config(store, config.query);
        let simulator = Arc::new(CascadeSimulator::with_config(engine, config.pathways));
        let query = WorkerPool::start(
            ExecutionPath::Query,
            config.runtime.query_workers,
            config.runtime.queue_capacity,
            &simulator,
        )?;
        let cascade = WorkerPool::start(
            ExecutionPath::Cascade,
            config.runtime.cascade_workers,
            config.runtime.queue_capacity,
            &simulator,
        )?;
        Ok(Self {
            simulator,
            query: Some(query),
            cascade: Some(cascade),
            event_capacity: config.runtime.event_capacity,
        })
    }

    fn pool(&self, path: ExecutionPath) -> TransmuteResult<&WorkerPool> {
        let pool = match path {
            ExecutionPath::Query => self.query.as_ref(),
            ExecutionPath::Cascade => self.cascade.as_ref(),
        };
        pool.ok_or_else(|| {
            ExecutionError::Disconnected {
                path: path.as_str().to_string(),
            }
            .into()
        })
    }

    /// Queues a query on the query pool.
    pub fn submit_query(&self, filter: QueryFilter, kind: ReactionKind) -> TransmuteResult<QueryHandle> {
        let (reply, rx) = bounded(1);
        self.pool(ExecutionPath::Query)?.try_submit(Job::Query {
            filter,
            kind,
            reply,
        })?;
        Ok(QueryHandle { rx })
    }

    /// Runs a query on the query pool and waits for it.
    pub fn query(&self, filter: QueryFilter, kind: ReactionKind) -> TransmuteResult<QueryOutcome> {
        self.submit_query(filter, kind)?.join()
    }

    /// Queues a cascade on the cascade pool.
    pub fn submit_cascade(&self, params: CascadeParameters) -> TransmuteResult<CascadeHandle> {
        self.submit_cascade_with(params, CancellationToken::new())
    }

    /// Queues a cascade that observes a caller-owned cancellation token.
    pub fn submit_cascade_with(
        &self,
        params: CascadeParameters,
        cancel: CancellationToken,
    ) -> TransmuteResult<CascadeHandle> {
        let (reply, rx) = bounded(1);
        let (event_tx, events) = bounded(self.event_capacity);
        self.pool(ExecutionPath::Cascade)?.try_submit(Job::Cascade {
            params,
            cancel: cancel.clone(),
            events: event_tx,
            reply,
        })?;
        Ok(CascadeHandle { rx, events, cancel })
    }

    /// The simulator shared by the workers.
    #[must_use]
    pub fn simulator(&self) -> &CascadeSimulator {
        &self.simulator
    }

    #[cfg(test)]
    fn submit_sleep(&self, path: ExecutionPath, duration: Duration) -> TransmuteResult<Receiver<()>> {
        let (reply, rx) = bounded(1);
        self.pool(path)?.try_submit(Job::Sleep { duration, reply })?;
        Ok(rx)
    }
}

impl Drop for EngineRuntime {
    fn drop(&mut self) {
        if let Some(pool) = self.query.take() {
            pool.shutdown();
        }
        if let Some(pool) = self.cascade.take() {
            pool.shutdown();
        }
    }
}
