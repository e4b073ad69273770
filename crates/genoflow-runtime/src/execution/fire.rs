//! One firing of one transition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use genoflow_core::{
    gf_fire, AnnotationError, EngineError, EngineResult, ExecutionError, ExecutionResult,
    JobError, TokenMeta, TransitionId, Value,
};
use tokio_util::sync::CancellationToken;

use super::context::{ExecutionContext, Token, TokenWrite};
use super::ready_index::ReadyTransitionIndex;
use crate::job::JobContext;

/// Name of the optional `u64` context annotation that receives per-transition
/// firing times in milliseconds. Create it with
/// [`ExecutionContext::new_context`] to enable timing capture.
pub const ELAPSED_MS_ANNOTATION: &str = "fire.elapsed_ms";

/// How a firing ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireStatus {
    /// The Job produced a value.
    Completed,
    /// The Job returned an error.
    Failed,
    /// The generation ended before or while the Job ran.
    Stale,
}

/// Result of a firing, handed to the completion callback.
#[derive(Debug)]
pub struct FireOutcome {
    pub transition: TransitionId,
    /// Generation the firing was submitted under.
    pub generation: u64,
    pub status: FireStatus,
    /// Produced value, for completed firings.
    pub value: Option<Value>,
    /// Metadata cascaded from the inputs.
    pub meta: TokenMeta,
    /// Job error, for failed firings.
    pub error: Option<JobError>,
    pub elapsed: Duration,
}

impl FireOutcome {
    fn stale(transition: TransitionId, generation: u64, elapsed: Duration) -> Self {
        Self {
            transition,
            generation,
            status: FireStatus::Stale,
            value: None,
            meta: TokenMeta::new(),
            error: None,
            elapsed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == FireStatus::Completed
    }
}

/// A firing of `transition` bound to the generation it was created in.
///
/// The generation and its cancellation token are captured at construction.
/// A reset of the context invalidates the firing: it is reported as
/// [`FireStatus::Stale`] and its result is never delivered.
#[derive(Debug)]
pub struct FireTransition {
    ctx: Arc<ExecutionContext>,
    transition: TransitionId,
    generation: u64,
    cancel: CancellationToken,
}

impl FireTransition {
    pub fn new(ctx: Arc<ExecutionContext>, transition: TransitionId) -> ExecutionResult<Self> {
        if ctx.net().transition(transition).is_none() {
            return Err(ExecutionError::UnknownTransition(transition));
        }
        let (generation, cancel) = ctx.generation_token();
        Ok(Self {
            ctx,
            transition,
            generation,
            cancel,
        })
    }

    pub fn transition(&self) -> TransitionId {
        self.transition
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The captured generation is still current and was not cancelled.
    pub fn is_valid_execution(&self) -> bool {
        !self.cancel.is_cancelled() && self.ctx.generation() == self.generation
    }

    /// Execute the Job and report the outcome.
    ///
    /// `callback` runs once for completed and failed firings, never for stale
    /// ones. A failed firing is returned as [`EngineError::Job`] after the
    /// callback has seen it.
    pub async fn run<F>(self, callback: F) -> EngineResult<FireOutcome>
    where
        F: FnOnce(&FireOutcome) + Send,
    {
        let t = self.transition;
        if !self.is_valid_execution() {
            gf_fire!(debug, generation = self.generation, transition = %t, "Skipped stale firing");
            return Ok(FireOutcome::stale(t, self.generation, Duration::ZERO));
        }

        let Some(transition) = self.ctx.net().transition(t) else {
            return Err(ExecutionError::UnknownTransition(t).into());
        };
        let job = transition.job().clone();

        let prepared = self
            .ctx
            .create_input(t)
            .and_then(|inputs| Ok((inputs, self.ctx.create_meta(t)?)));
        let (inputs, meta) = match prepared {
            Ok(prepared) => prepared,
            // A reset between the validity check and reading the tokens.
            Err(_) if !self.is_valid_execution() => {
                return Ok(FireOutcome::stale(t, self.generation, Duration::ZERO));
            }
            Err(err) => return Err(err.into()),
        };

        gf_fire!(trace, generation = self.generation, transition = %t, job = job.name(), "Firing");

        let started = Instant::now();
        let result = {
            let job_ctx = JobContext::new(&self.ctx, t, self.generation, &meta, &self.cancel);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(JobError::Cancelled),
                result = job.execute(job_ctx, inputs) => result,
            }
        };
        let elapsed = started.elapsed();

        if !self.is_valid_execution() {
            gf_fire!(debug,
                generation = self.generation,
                transition = %t,
                elapsed_ms = elapsed.as_millis() as u64,
                "Discarded result of stale firing"
            );
            return Ok(FireOutcome::stale(t, self.generation, elapsed));
        }

        let result = result.and_then(|value| {
            if value.conforms_to(job.output_type()) {
                Ok(value)
            } else {
                Err(JobError::InvalidOutput {
                    expected: job.output_type().clone(),
                    found: value.to_string(),
                })
            }
        });

        self.record_elapsed(elapsed);

        let mut outcome = FireOutcome {
            transition: t,
            generation: self.generation,
            status: FireStatus::Completed,
            value: None,
            meta,
            error: None,
            elapsed,
        };
        match result {
            Ok(value) => {
                gf_fire!(debug,
                    generation = self.generation,
                    transition = %t,
                    job = job.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Transition fired"
                );
                outcome.value = Some(value);
            }
            Err(err) => {
                gf_fire!(warn,
                    generation = self.generation,
                    transition = %t,
                    job = job.name(),
                    error = %err,
                    "Job failed"
                );
                outcome.status = FireStatus::Failed;
                outcome.error = Some(err);
            }
        }

        callback(&outcome);

        match outcome.error.take() {
            Some(source) => Err(EngineError::Job {
                transition: t,
                job: job.name().to_string(),
                source,
            }),
            None => Ok(outcome),
        }
    }

    fn record_elapsed(&self, elapsed: Duration) {
        let ms = elapsed.as_millis() as u64;
        let Err(err) = self.ctx.set_context::<u64>(ELAPSED_MS_ANNOTATION, self.transition, ms)
        else {
            return;
        };
        // Timing capture is opt-in; an absent map is not an error.
        if !matches!(err, AnnotationError::Unknown(_)) {
            gf_fire!(warn, transition = %self.transition, error = %err, "Could not record firing time");
        }
    }
}

/// Apply a firing outcome to the context and the ready index.
///
/// Completed firings store their value on the output place (only if the
/// generation is still current) and re-check the affected transitions.
/// Returns the transitions that became ready.
pub fn complete_firing(
    ctx: &ExecutionContext,
    index: &ReadyTransitionIndex,
    outcome: &FireOutcome,
) -> ExecutionResult<Vec<TransitionId>> {
    let t = outcome.transition;
    match outcome.status {
        FireStatus::Completed => {
            let output = ctx
                .net()
                .transition(t)
                .and_then(|transition| transition.output())
                .ok_or(ExecutionError::UnknownTransition(t))?;
            let value = outcome.value.clone().unwrap_or_default();
            let token = Token::with_meta(value, outcome.meta.clone());
            match ctx.put_token_if_current(outcome.generation, output, token)? {
                TokenWrite::Stored | TokenWrite::AlreadyPresent => index.fired(t),
                TokenWrite::Stale => {
                    index.stale(t);
                    Ok(Vec::new())
                }
            }
        }
        FireStatus::Failed => {
            index.failed(t);
            Ok(Vec::new())
        }
        FireStatus::Stale => {
            index.stale(t);
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use genoflow_core::{JobResult, TypeTag};
    use tokio::sync::Notify;

    use super::*;
    use crate::execution::TransitionState;
    use crate::job::{FnJob, Inputs, Job};
    use crate::net::PetriNet;
    use crate::testing::chain_net;

    fn started(net: PetriNet) -> Arc<ExecutionContext> {
        let ctx = Arc::new(ExecutionContext::new(Arc::new(net)).unwrap());
        ctx.start_execution();
        ctx
    }

    /// Integer identity that parks until released.
    struct Gate {
        entered: Arc<Notify>,
        release: Arc<Notify>,
        inputs: Vec<TypeTag>,
        output: TypeTag,
    }

    impl Gate {
        fn new() -> Self {
            Self {
                entered: Arc::new(Notify::new()),
                release: Arc::new(Notify::new()),
                inputs: vec![TypeTag::Integer],
                output: TypeTag::Integer,
            }
        }
    }

    #[async_trait]
    impl Job for Gate {
        fn name(&self) -> &str {
            "gate"
        }
        fn input_types(&self) -> &[TypeTag] {
            &self.inputs
        }
        fn output_type(&self) -> &TypeTag {
            &self.output
        }
        async fn execute(&self, _ctx: JobContext<'_>, inputs: Inputs) -> JobResult<Value> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(inputs[0].clone())
        }
    }

    #[tokio::test]
    async fn test_fire_and_complete_chain() {
        let (net, ids) = chain_net();
        let ctx = started(net);
        ctx.put_token(ids.a, 5i64).unwrap();
        let index = ReadyTransitionIndex::new(ctx.clone()).unwrap();

        while let Some(t) = index.take() {
            let fire = FireTransition::new(ctx.clone(), t).unwrap();
            assert!(fire.is_valid_execution());
            let mut completion = Ok(Vec::new());
            let outcome = fire
                .run(|outcome| completion = complete_firing(&ctx, &index, outcome))
                .await
                .unwrap();
            assert!(outcome.is_completed());
            completion.unwrap();
        }

        assert_eq!(ctx.token(ids.b).unwrap().unwrap().value, Value::from(6i64));
        assert_eq!(ctx.token(ids.c).unwrap().unwrap().value, Value::from(12i64));
        assert!(ctx.is_finished().unwrap());
        assert_eq!(index.count(TransitionState::Done), 2);
    }

    #[tokio::test]
    async fn test_failure_reaches_callback_then_error() {
        let mut net = PetriNet::new();
        let t = net
            .create_transition(Arc::new(FnJob::new(
                "bad-region",
                vec![TypeTag::String],
                TypeTag::Integer,
                |_: &[Value]| Err(JobError::failed("malformed region")),
            )))
            .unwrap();
        net.prepare().unwrap();
        let input = net.transition(t).unwrap().input(0).unwrap();
        let ctx = started(net);
        ctx.put_token(input, "chr1:x-y").unwrap();

        let mut seen = None;
        let err = FireTransition::new(ctx.clone(), t)
            .unwrap()
            .run(|outcome| seen = Some(outcome.status))
            .await
            .unwrap_err();

        assert_eq!(seen, Some(FireStatus::Failed));
        assert_eq!(err.failed_transition(), Some(t));
        assert!(err.to_string().contains("malformed region"));
    }

    #[tokio::test]
    async fn test_output_type_is_checked() {
        let mut net = PetriNet::new();
        let t = net
            .create_transition(Arc::new(FnJob::new(
                "liar",
                vec![],
                TypeTag::Integer,
                |_: &[Value]| Ok(Value::from("not a number")),
            )))
            .unwrap();
        net.prepare().unwrap();
        let ctx = started(net);

        let err = FireTransition::new(ctx, t)
            .unwrap()
            .run(|_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Job {
                source: JobError::InvalidOutput { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_before_run_is_stale() {
        let (net, ids) = chain_net();
        let ctx = started(net);
        ctx.put_token(ids.a, 5i64).unwrap();

        let fire = FireTransition::new(ctx.clone(), ids.t1).unwrap();
        ctx.reset();
        assert!(!fire.is_valid_execution());

        let mut called = false;
        let outcome = fire.run(|_| called = true).await.unwrap();
        assert_eq!(outcome.status, FireStatus::Stale);
        assert!(!called);
    }

    #[tokio::test]
    async fn test_reset_during_execute_discards_result() {
        let gate = Arc::new(Gate::new());
        let mut net = PetriNet::new();
        let t = net.create_transition(gate.clone()).unwrap();
        net.prepare().unwrap();
        let input = net.transition(t).unwrap().input(0).unwrap();
        let ctx = started(net);
        ctx.put_token(input, 7i64).unwrap();

        let fire = FireTransition::new(ctx.clone(), t).unwrap();
        let handle = tokio::spawn(async move { fire.run(|_| panic!("stale callback")).await });

        gate.entered.notified().await;
        ctx.reset();
        ctx.start_execution();

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.status, FireStatus::Stale);
        assert!(!ctx.is_finished().unwrap());
    }

    #[tokio::test]
    async fn test_elapsed_recorded_when_requested() {
        let (net, ids) = chain_net();
        let ctx = started(net);
        ctx.new_context::<u64>(ELAPSED_MS_ANNOTATION).unwrap();
        ctx.put_token(ids.a, 1i64).unwrap();

        FireTransition::new(ctx.clone(), ids.t1)
            .unwrap()
            .run(|_| {})
            .await
            .unwrap();
        assert!(ctx
            .get_context::<u64>(ELAPSED_MS_ANNOTATION, ids.t1)
            .unwrap()
            .is_some());
        assert!(ctx
            .get_context::<u64>(ELAPSED_MS_ANNOTATION, ids.t2)
            .unwrap()
            .is_none());
    }
}
