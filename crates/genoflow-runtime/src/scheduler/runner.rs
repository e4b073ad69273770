//! Reference driver that runs a context to completion on tokio.
//!
//! The runner seeds the source places, builds a [`ReadyTransitionIndex`] and
//! spawns one task per ready transition, bounded by [`ConcurrencyControl`].
//! Each task fires its transition and applies the outcome through
//! [`complete_firing`], which makes downstream transitions ready; the loop
//! then dispatches whatever the index holds. The run ends when nothing is
//! ready and nothing is in flight.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use genoflow_core::{
    gf_sched, EngineError, EngineResult, ExecutionError, ExecutionResult, JobError, PlaceId,
    TransitionId, Value,
};
use serde::Serialize;
use tokio::task::{Id, JoinSet};
use uuid::Uuid;

use super::concurrency_control::ConcurrencyControl;
use super::config::RunnerConfig;
use crate::execution::{
    complete_firing, ExecutionContext, FireOutcome, FireStatus, FireTransition,
    ReadyTransitionIndex, ELAPSED_MS_ANNOTATION,
};

/// Firing counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Firings that stored (or offered) an output.
    pub fired: usize,
    /// Firings whose Job failed or panicked.
    pub failed: usize,
    /// Firings discarded because their generation ended.
    pub stale: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub duration_ms: u128,
}

impl RunStats {
    pub fn total_firings(&self) -> usize {
        self.fired + self.failed + self.stale
    }
}

/// Result of a run that was not aborted.
#[derive(Debug)]
pub struct RunReport {
    pub execution_id: Uuid,
    /// Generation the run executed in.
    pub generation: u64,
    /// Every sink holds a token.
    pub finished: bool,
    /// Values on sink places.
    pub outputs: BTreeMap<PlaceId, Value>,
    /// Job failures, as [`EngineError::Job`].
    pub failures: Vec<EngineError>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn output(&self, place: PlaceId) -> Option<&Value> {
        self.outputs.get(&place)
    }

    pub fn is_success(&self) -> bool {
        self.finished && self.failures.is_empty()
    }
}

type TaskOutput = (
    TransitionId,
    EngineResult<FireOutcome>,
    ExecutionResult<Vec<TransitionId>>,
);

/// Drives execution contexts to completion.
#[derive(Debug, Clone)]
pub struct NetRunner {
    config: RunnerConfig,
}

impl NetRunner {
    pub fn new(config: RunnerConfig) -> EngineResult<Self> {
        config.validate()?;

        if config.enable_tracing {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_target(true)
                .try_init()
                .ok(); // Ignore if already initialized
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Seed `seeds` and fire until nothing more can fire.
    pub async fn run<I>(&self, ctx: &Arc<ExecutionContext>, seeds: I) -> EngineResult<RunReport>
    where
        I: IntoIterator<Item = (PlaceId, Value)>,
    {
        self.drive(ctx, seeds, None).await
    }

    /// Like [`run`](Self::run), but only fire what feeds `goal`.
    pub async fn run_goal<I>(
        &self,
        ctx: &Arc<ExecutionContext>,
        seeds: I,
        goal: TransitionId,
    ) -> EngineResult<RunReport>
    where
        I: IntoIterator<Item = (PlaceId, Value)>,
    {
        self.drive(ctx, seeds, Some(goal)).await
    }

    async fn drive<I>(
        &self,
        ctx: &Arc<ExecutionContext>,
        seeds: I,
        goal: Option<TransitionId>,
    ) -> EngineResult<RunReport>
    where
        I: IntoIterator<Item = (PlaceId, Value)>,
    {
        let started = Instant::now();
        let generation = ctx.start_execution();
        let net = Arc::clone(ctx.net());

        if self.config.record_timings {
            ctx.new_context::<u64>(ELAPSED_MS_ANNOTATION)?;
        }
        if let Some(goal) = goal {
            ctx.use_goal(goal)?;
            ctx.disable_unnecessary(Some(goal));
        }

        for (place, value) in seeds {
            ctx.put_token(place, value)?;
        }
        for &place in net.sources() {
            let consumed = net
                .consumers_of(place)
                .iter()
                .any(|&t| !ctx.is_disabled(t));
            if consumed && ctx.needs_input(place)? {
                return Err(ExecutionError::MissingInput { place }.into());
            }
        }

        let index = Arc::new(ReadyTransitionIndex::new(Arc::clone(ctx))?);
        let control = ConcurrencyControl::new(self.config.max_concurrency);
        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
        let mut running: HashMap<Id, TransitionId> = HashMap::new();
        let mut stats = RunStats::default();
        let mut failures = Vec::new();

        gf_sched!(info,
            execution_id = %ctx.execution_id(),
            generation,
            transitions = net.transitions().len(),
            ready = index.ready().len(),
            max_concurrency = self.config.max_concurrency,
            "Run started"
        );

        loop {
            while !index.is_empty() {
                let Some(permit) = control.try_acquire() else {
                    break;
                };
                let Some(t) = index.take() else {
                    break;
                };
                let fire = FireTransition::new(Arc::clone(ctx), t)?;
                let task_ctx = Arc::clone(ctx);
                let task_index = Arc::clone(&index);
                let handle = tasks.spawn(async move {
                    let _permit = permit;
                    let mut completion = Ok(Vec::new());
                    let result = fire
                        .run(|outcome| completion = complete_firing(&task_ctx, &task_index, outcome))
                        .await;
                    if let Ok(outcome) = &result {
                        if outcome.status == FireStatus::Stale {
                            task_index.stale(t);
                        }
                    }
                    (t, result, completion)
                });
                running.insert(handle.id(), t);
                gf_sched!(trace, transition = %t, in_flight = control.in_flight_count(), "Dispatched");
            }

            let Some(joined) = tasks.join_next_with_id().await else {
                break;
            };

            let failure = match joined {
                Ok((id, (t, result, completion))) => {
                    running.remove(&id);
                    if let Err(err) = completion {
                        return Err(self.abort(ctx, &control, &mut tasks, err.into()).await);
                    }
                    match result {
                        Ok(outcome) if outcome.status == FireStatus::Stale => {
                            stats.stale += 1;
                            None
                        }
                        Ok(_) => {
                            stats.fired += 1;
                            None
                        }
                        Err(err @ EngineError::Job { .. }) => Some(err),
                        Err(err) => {
                            gf_sched!(error, transition = %t, error = %err, "Firing aborted");
                            return Err(self.abort(ctx, &control, &mut tasks, err).await);
                        }
                    }
                }
                Err(join_err) => {
                    let Some(t) = running.remove(&join_err.id()) else {
                        continue;
                    };
                    index.failed(t);
                    let job = net
                        .transition(t)
                        .map(|tr| tr.job_name().to_string())
                        .unwrap_or_default();
                    Some(EngineError::Job {
                        transition: t,
                        job,
                        source: JobError::failed(format!("firing task failed: {join_err}")),
                    })
                }
            };

            if let Some(err) = failure {
                stats.failed += 1;
                if self.config.fail_fast {
                    gf_sched!(warn, error = %err, "Stopping run at first failure");
                    return Err(self.abort(ctx, &control, &mut tasks, err).await);
                }
                failures.push(err);
            }
        }

        stats.duration_ms = started.elapsed().as_millis();
        let finished = ctx.is_finished()?;
        let outputs = ctx.sink_values()?;

        gf_sched!(info,
            execution_id = %ctx.execution_id(),
            generation,
            finished,
            fired = stats.fired,
            failed = stats.failed,
            stale = stats.stale,
            duration_ms = stats.duration_ms as u64,
            "Run complete"
        );

        Ok(RunReport {
            execution_id: ctx.execution_id(),
            generation,
            finished,
            outputs,
            failures,
            stats,
        })
    }

    /// Cancel the generation and every in-flight firing; returns `err`.
    async fn abort(
        &self,
        ctx: &ExecutionContext,
        control: &ConcurrencyControl,
        tasks: &mut JoinSet<TaskOutput>,
        err: EngineError,
    ) -> EngineError {
        control.close();
        ctx.reset();
        tasks.shutdown().await;
        err
    }
}
