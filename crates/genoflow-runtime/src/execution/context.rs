use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use genoflow_core::{
    gf_exec, AnnotationError, Annotations, ExecutionError, ExecutionResult, NodeKey, PlaceId,
    TokenMeta, TransitionId, Value,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::job::Inputs;
use crate::net::{PetriNet, Place, Transition};

/// A value stored on a place, with its cascaded metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Token {
    pub value: Value,
    pub meta: TokenMeta,
}

impl Token {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            meta: TokenMeta::new(),
        }
    }

    pub fn with_meta(value: impl Into<Value>, meta: TokenMeta) -> Self {
        Self {
            value: value.into(),
            meta,
        }
    }
}

/// Result of a generation-checked token write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenWrite {
    /// The token was stored.
    Stored,
    /// The place already held a token; nothing changed.
    AlreadyPresent,
    /// The write belonged to an earlier generation and was dropped.
    Stale,
}

/// Everything that resets together when a generation ends.
#[derive(Debug)]
struct RunState {
    executing: bool,
    generation: u64,
    cancel: CancellationToken,
    tokens: Vec<Option<Token>>,
}

impl RunState {
    fn ensure_started(&self) -> ExecutionResult<()> {
        if self.executing {
            Ok(())
        } else {
            Err(ExecutionError::NotStarted)
        }
    }

    fn has_token(&self, place: PlaceId) -> bool {
        matches!(self.tokens.get(place.index()), Some(Some(_)))
    }
}

/// Per-run mutable state over a shared, prepared net.
///
/// One context drives one execution at a time. [`reset`](Self::reset) ends
/// the current generation: tokens and the disabled set are cleared and the
/// generation's cancellation token fires, so in-flight firings that were
/// submitted under it can no longer store results.
///
/// Lock order is run state, then disabled set. Job callbacks (such as
/// [`Job::is_disabled`](crate::job::Job::is_disabled)) are never invoked with
/// a lock held.
#[derive(Debug)]
pub struct ExecutionContext {
    net: Arc<PetriNet>,
    execution_id: Uuid,
    run: Mutex<RunState>,
    disabled: Mutex<HashSet<TransitionId>>,
    annotations: RwLock<Annotations>,
}

impl ExecutionContext {
    /// Create a context over a prepared net.
    pub fn new(net: Arc<PetriNet>) -> ExecutionResult<Self> {
        if !net.is_prepared() {
            return Err(ExecutionError::NetNotPrepared);
        }
        let place_count = net.places().len();
        Ok(Self {
            net,
            execution_id: Uuid::new_v4(),
            run: Mutex::new(RunState {
                executing: false,
                generation: 0,
                cancel: CancellationToken::new(),
                tokens: vec![None; place_count],
            }),
            disabled: Mutex::new(HashSet::new()),
            annotations: RwLock::new(Annotations::new()),
        })
    }

    pub fn net(&self) -> &Arc<PetriNet> {
        &self.net
    }

    /// Identifier of this context, stable across generations.
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    pub fn generation(&self) -> u64 {
        self.run.lock().generation
    }

    pub fn is_executing(&self) -> bool {
        self.run.lock().executing
    }

    /// Token that fires when the current generation is reset.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.run.lock().cancel.clone()
    }

    /// Current generation and its cancellation token, read under one lock.
    pub fn generation_token(&self) -> (u64, CancellationToken) {
        let run = self.run.lock();
        (run.generation, run.cancel.clone())
    }

    /// Begin executing; returns the current generation.
    pub fn start_execution(&self) -> u64 {
        let mut run = self.run.lock();
        if !run.executing {
            run.executing = true;
            gf_exec!(debug,
                execution_id = %self.execution_id,
                generation = run.generation,
                "Execution started"
            );
        }
        run.generation
    }

    /// End the current generation. No-op when not executing.
    pub fn reset(&self) {
        let mut run = self.run.lock();
        if !run.executing {
            return;
        }
        run.executing = false;
        run.generation += 1;
        run.cancel.cancel();
        run.cancel = CancellationToken::new();
        run.tokens.iter_mut().for_each(|slot| *slot = None);
        self.disabled.lock().clear();

        gf_exec!(debug,
            execution_id = %self.execution_id,
            generation = run.generation,
            "Execution reset"
        );
    }

    /// Whether `transition` can fire now.
    ///
    /// False when disabled (explicitly or by its Job), when a non-void input
    /// holds no token, or when the output already holds one.
    pub fn is_ready(&self, transition: TransitionId) -> ExecutionResult<bool> {
        let t = self.transition_checked(transition)?;
        let run = self.run.lock();
        run.ensure_started()?;
        let inputs_present = t
            .inputs()
            .all(|place| self.is_void(place) || run.has_token(place));
        let output_free = t.output().is_some_and(|place| !run.has_token(place));
        drop(run);

        Ok(inputs_present && output_free && !self.is_disabled(transition))
    }

    /// Whether `place` must still be supplied from outside.
    pub fn needs_input(&self, place: PlaceId) -> ExecutionResult<bool> {
        let p = self.place_checked(place)?;
        let run = self.run.lock();
        run.ensure_started()?;
        Ok(!p.is_sink() && !p.is_void() && !run.has_token(place))
    }

    /// Input tuple for firing `transition`, in slot order.
    ///
    /// Void inputs contribute [`Value::Null`].
    pub fn create_input(&self, transition: TransitionId) -> ExecutionResult<Inputs> {
        let t = self.transition_checked(transition)?;
        let run = self.run.lock();
        run.ensure_started()?;

        let mut values = Vec::with_capacity(t.arity());
        for place in t.inputs() {
            if self.is_void(place) {
                values.push(Value::Null);
                continue;
            }
            match &run.tokens[place.index()] {
                Some(token) => values.push(token.value.clone()),
                None => return Err(ExecutionError::MissingToken { transition, place }),
            }
        }
        Ok(Inputs::new(values))
    }

    /// Metadata for the output of `transition`, cascaded by its Job.
    pub fn create_meta(&self, transition: TransitionId) -> ExecutionResult<TokenMeta> {
        let t = self.transition_checked(transition)?;
        let metas: Vec<TokenMeta> = {
            let run = self.run.lock();
            run.ensure_started()?;
            t.inputs()
                .map(|place| {
                    run.tokens[place.index()]
                        .as_ref()
                        .map(|token| token.meta.clone())
                        .unwrap_or_default()
                })
                .collect()
        };
        Ok(t.job().cascade_meta(&metas))
    }

    /// Store `value` on `place` unless it already holds a token.
    ///
    /// Returns whether the value was stored.
    pub fn put_token(&self, place: PlaceId, value: impl Into<Value>) -> ExecutionResult<bool> {
        self.put_token_with_meta(place, value, TokenMeta::new())
    }

    /// Like [`put_token`](Self::put_token), carrying `meta` on the token.
    ///
    /// Fails with [`ExecutionError::TypeMismatch`] if `value` does not
    /// conform to the type of `place`.
    pub fn put_token_with_meta(
        &self,
        place: PlaceId,
        value: impl Into<Value>,
        meta: TokenMeta,
    ) -> ExecutionResult<bool> {
        let p = self.place_checked(place)?;
        let value = value.into();
        if !value.conforms_to(p.type_tag()) {
            return Err(ExecutionError::TypeMismatch {
                place,
                expected: p.type_tag().clone(),
                found: value.to_string(),
            });
        }
        let mut run = self.run.lock();
        run.ensure_started()?;
        Ok(self.store_locked(&mut run, place, Token::with_meta(value, meta)))
    }

    /// Store `token` only if `generation` is still the current one.
    ///
    /// The generation is compared under the token lock, so a firing that
    /// raced a [`reset`](Self::reset) can never write into the next run.
    pub fn put_token_if_current(
        &self,
        generation: u64,
        place: PlaceId,
        token: Token,
    ) -> ExecutionResult<TokenWrite> {
        self.place_checked(place)?;
        let mut run = self.run.lock();
        if !run.executing || run.generation != generation {
            gf_exec!(trace,
                place = %place,
                captured = generation,
                current = run.generation,
                "Dropped stale token"
            );
            return Ok(TokenWrite::Stale);
        }
        if self.store_locked(&mut run, place, token) {
            Ok(TokenWrite::Stored)
        } else {
            Ok(TokenWrite::AlreadyPresent)
        }
    }

    fn store_locked(&self, run: &mut RunState, place: PlaceId, token: Token) -> bool {
        match &run.tokens[place.index()] {
            Some(existing) => {
                if existing.value != token.value {
                    gf_exec!(warn,
                        place = %place,
                        stored = %existing.value,
                        offered = %token.value,
                        "Place already holds a different value; keeping the first"
                    );
                }
                false
            }
            None => {
                run.tokens[place.index()] = Some(token);
                true
            }
        }
    }

    /// True when every sink holds a token (vacuously true without sinks).
    pub fn is_finished(&self) -> ExecutionResult<bool> {
        let run = self.run.lock();
        run.ensure_started()?;
        Ok(self.net.sinks().iter().all(|&sink| run.has_token(sink)))
    }

    /// Token currently stored on `place`.
    pub fn token(&self, place: PlaceId) -> ExecutionResult<Option<Token>> {
        self.place_checked(place)?;
        let run = self.run.lock();
        run.ensure_started()?;
        Ok(run.tokens[place.index()].clone())
    }

    /// Values stored on sink places, keyed by place.
    pub fn sink_values(&self) -> ExecutionResult<BTreeMap<PlaceId, Value>> {
        let run = self.run.lock();
        run.ensure_started()?;
        Ok(self
            .net
            .sinks()
            .iter()
            .filter_map(|&sink| {
                run.tokens[sink.index()]
                    .as_ref()
                    .map(|token| (sink, token.value.clone()))
            })
            .collect())
    }

    /// Exclude `transition` from the current generation.
    pub fn disable(&self, transition: TransitionId) -> ExecutionResult<()> {
        self.transition_checked(transition)?;
        self.disabled.lock().insert(transition);
        Ok(())
    }

    /// Disabled explicitly or by its own Job.
    pub fn is_disabled(&self, transition: TransitionId) -> bool {
        if self.disabled.lock().contains(&transition) {
            return true;
        }
        self.net
            .transition(transition)
            .is_some_and(|t| t.job().is_disabled(self))
    }

    /// Propagate explicit disabling to a fixpoint.
    ///
    /// Forward: a transition whose producers are all disabled is disabled.
    /// Backward: a transition whose consumers are all disabled is disabled,
    /// unless it is `goal`. A transition with no producers (or consumers) is
    /// never disabled by the corresponding rule. Returns how many
    /// transitions this call disabled.
    pub fn disable_unnecessary(&self, goal: Option<TransitionId>) -> usize {
        let transitions = self.net.transitions();
        let producers: Vec<Vec<TransitionId>> =
            transitions.iter().map(|t| self.producers_of(t)).collect();
        let consumers: Vec<Vec<TransitionId>> =
            transitions.iter().map(|t| self.consumers_of(t)).collect();

        let mut disabled = self.disabled.lock();
        let before = disabled.len();
        loop {
            let mut changed = false;

            for t in transitions {
                let up = &producers[t.id().index()];
                if !disabled.contains(&t.id())
                    && !up.is_empty()
                    && up.iter().all(|p| disabled.contains(p))
                {
                    disabled.insert(t.id());
                    changed = true;
                }
            }

            for t in transitions.iter().rev() {
                let down = &consumers[t.id().index()];
                if Some(t.id()) != goal
                    && !disabled.contains(&t.id())
                    && !down.is_empty()
                    && down.iter().all(|c| disabled.contains(c))
                {
                    disabled.insert(t.id());
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        let newly_disabled = disabled.len() - before;
        gf_exec!(debug,
            execution_id = %self.execution_id,
            newly_disabled,
            "Disabled unnecessary transitions"
        );
        newly_disabled
    }

    /// Disable everything that does not feed `goal`.
    pub fn use_goal(&self, goal: TransitionId) -> ExecutionResult<()> {
        self.transition_checked(goal)?;

        let mut keep = vec![false; self.net.transitions().len()];
        let mut stack = vec![goal];
        while let Some(t) = stack.pop() {
            if std::mem::replace(&mut keep[t.index()], true) {
                continue;
            }
            if let Some(transition) = self.net.transition(t) {
                stack.extend(self.producers_of(transition));
            }
        }

        let mut disabled = self.disabled.lock();
        disabled.extend(
            self.net
                .transitions()
                .iter()
                .map(Transition::id)
                .filter(|t| !keep[t.index()]),
        );
        gf_exec!(debug,
            execution_id = %self.execution_id,
            goal = %goal,
            kept = keep.iter().filter(|&&k| k).count(),
            "Restricted execution to goal"
        );
        Ok(())
    }

    /// Register the context annotation `name` holding `V`.
    pub fn new_context<V>(&self, name: &str) -> Result<(), AnnotationError>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.annotations.write().create::<V>(name).map(|_| ())
    }

    /// Read an annotation entry. Use [`NodeKey::context`] for run-global data.
    pub fn get_context<V: Clone + 'static>(
        &self,
        name: &str,
        key: impl Into<NodeKey>,
    ) -> Result<Option<V>, AnnotationError> {
        self.annotations.read().value(name, key)
    }

    /// Write an annotation entry, returning the previous value.
    pub fn set_context<V: 'static>(
        &self,
        name: &str,
        key: impl Into<NodeKey>,
        value: V,
    ) -> Result<Option<V>, AnnotationError> {
        self.annotations.write().set_value(name, key, value)
    }

    /// Shared view of every context annotation.
    pub fn annotations(&self) -> RwLockReadGuard<'_, Annotations> {
        self.annotations.read()
    }

    fn producers_of(&self, transition: &Transition) -> Vec<TransitionId> {
        let mut producers: Vec<TransitionId> = transition
            .inputs()
            .filter_map(|place| self.net.producer_of(place))
            .collect();
        producers.sort_unstable();
        producers.dedup();
        producers
    }

    fn consumers_of(&self, transition: &Transition) -> Vec<TransitionId> {
        transition
            .output()
            .map(|place| self.net.consumers_of(place).to_vec())
            .unwrap_or_default()
    }

    fn is_void(&self, place: PlaceId) -> bool {
        self.net.place(place).is_some_and(Place::is_void)
    }

    fn place_checked(&self, place: PlaceId) -> ExecutionResult<&Place> {
        self.net
            .place(place)
            .ok_or(ExecutionError::UnknownPlace(place))
    }

    fn transition_checked(&self, transition: TransitionId) -> ExecutionResult<&Transition> {
        self.net
            .transition(transition)
            .ok_or(ExecutionError::UnknownTransition(transition))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use genoflow_core::{JobResult, TypeTag};

    use super::*;
    use crate::job::{FnJob, Job, JobContext};
    use crate::testing::{chain_net, inc_job};

    fn started(net: PetriNet) -> ExecutionContext {
        let ctx = ExecutionContext::new(Arc::new(net)).unwrap();
        ctx.start_execution();
        ctx
    }

    #[test]
    fn test_requires_prepared_net() {
        let net = PetriNet::new();
        assert_eq!(
            ExecutionContext::new(Arc::new(net)).unwrap_err(),
            ExecutionError::NetNotPrepared
        );
    }

    #[test]
    fn test_token_ops_require_start() {
        let (net, ids) = chain_net();
        let ctx = ExecutionContext::new(Arc::new(net)).unwrap();
        assert_eq!(ctx.put_token(ids.a, 5i64), Err(ExecutionError::NotStarted));
        assert_eq!(ctx.is_ready(ids.t1), Err(ExecutionError::NotStarted));
        assert_eq!(ctx.is_finished(), Err(ExecutionError::NotStarted));

        assert_eq!(ctx.start_execution(), 0);
        assert!(ctx.is_executing());
        assert_eq!(ctx.put_token(ids.a, 5i64), Ok(true));
    }

    #[test]
    fn test_readiness_follows_tokens() {
        let (net, ids) = chain_net();
        let ctx = started(net);

        assert!(!ctx.is_ready(ids.t1).unwrap());
        assert!(!ctx.is_ready(ids.t2).unwrap());
        assert!(ctx.needs_input(ids.a).unwrap());
        assert!(!ctx.needs_input(ids.c).unwrap());

        ctx.put_token(ids.a, 5i64).unwrap();
        assert!(ctx.is_ready(ids.t1).unwrap());
        assert!(!ctx.needs_input(ids.a).unwrap());

        ctx.put_token(ids.b, 6i64).unwrap();
        assert!(!ctx.is_ready(ids.t1).unwrap(), "output already present");
        assert!(ctx.is_ready(ids.t2).unwrap());
    }

    #[test]
    fn test_put_token_first_writer_wins() {
        let (net, ids) = chain_net();
        let ctx = started(net);

        assert!(ctx.put_token(ids.a, 5i64).unwrap());
        assert!(!ctx.put_token(ids.a, 9i64).unwrap());
        assert_eq!(ctx.token(ids.a).unwrap().unwrap().value, Value::from(5i64));
    }

    #[test]
    fn test_put_token_rejects_nonconforming_value() {
        let (net, ids) = chain_net();
        let ctx = started(net);
        assert_eq!(
            ctx.put_token(ids.a, "many"),
            Err(ExecutionError::TypeMismatch {
                place: ids.a,
                expected: TypeTag::Integer,
                found: "\"many\"".to_string(),
            })
        );
        assert!(ctx.token(ids.a).unwrap().is_none());
        assert!(ctx.put_token(ids.a, 5i64).unwrap());
    }

    #[test]
    fn test_generation_token_follows_reset() {
        let (net, _) = chain_net();
        let ctx = started(net);
        let (generation, token) = ctx.generation_token();
        assert_eq!(generation, 0);
        assert!(!token.is_cancelled());

        ctx.reset();
        assert!(token.is_cancelled());
        let (next, fresh) = ctx.generation_token();
        assert_eq!(next, 1);
        assert!(!fresh.is_cancelled());
    }

    #[test]
    fn test_put_token_if_current_rejects_old_generation() {
        let (net, ids) = chain_net();
        let ctx = started(net);
        let generation = ctx.generation();

        ctx.reset();
        ctx.start_execution();
        assert_eq!(
            ctx.put_token_if_current(generation, ids.c, Token::new(12i64)),
            Ok(TokenWrite::Stale)
        );
        assert!(!ctx.is_finished().unwrap());

        let current = ctx.generation();
        assert_eq!(
            ctx.put_token_if_current(current, ids.c, Token::new(12i64)),
            Ok(TokenWrite::Stored)
        );
        assert_eq!(
            ctx.put_token_if_current(current, ids.c, Token::new(13i64)),
            Ok(TokenWrite::AlreadyPresent)
        );
        assert!(ctx.is_finished().unwrap());
    }

    #[test]
    fn test_reset_matches_fresh_context() {
        let (net, ids) = chain_net();
        let net = Arc::new(net);
        let ctx = ExecutionContext::new(net.clone()).unwrap();
        let first_token = {
            ctx.start_execution();
            ctx.cancellation_token()
        };
        ctx.put_token(ids.a, 5i64).unwrap();
        ctx.put_token(ids.c, 12i64).unwrap();
        ctx.disable(ids.t2).unwrap();

        ctx.reset();
        assert!(first_token.is_cancelled());
        assert!(!ctx.is_executing());
        assert_eq!(ctx.generation(), 1);
        ctx.reset(); // no-op when idle
        assert_eq!(ctx.generation(), 1);

        ctx.start_execution();
        assert!(!ctx.cancellation_token().is_cancelled());

        let fresh = ExecutionContext::new(net.clone()).unwrap();
        fresh.start_execution();
        assert!(!ctx.is_finished().unwrap());
        for t in net.transitions() {
            assert_eq!(ctx.is_ready(t.id()), fresh.is_ready(t.id()));
            assert_eq!(ctx.is_disabled(t.id()), fresh.is_disabled(t.id()));
        }
    }

    #[test]
    fn test_create_input_and_missing_token() {
        let (net, ids) = chain_net();
        let ctx = started(net);

        assert_eq!(
            ctx.create_input(ids.t1),
            Err(ExecutionError::MissingToken {
                transition: ids.t1,
                place: ids.a
            })
        );
        ctx.put_token(ids.a, 5i64).unwrap();
        assert_eq!(ctx.create_input(ids.t1).unwrap().into_vec(), vec![Value::from(5i64)]);
    }

    #[test]
    fn test_create_meta_cascades_inputs() {
        let (net, ids) = chain_net();
        let ctx = started(net);
        ctx.put_token_with_meta(ids.a, 5i64, TokenMeta::new().with("sample", "NA12878"))
            .unwrap();
        let meta = ctx.create_meta(ids.t1).unwrap();
        assert_eq!(meta.get("sample"), Some(&Value::from("NA12878")));
    }

    #[test]
    fn test_void_inputs_do_not_block() {
        let after_barrier = FnJob::new(
            "after-barrier",
            vec![TypeTag::Void, TypeTag::Integer],
            TypeTag::Integer,
            |inputs: &[Value]| Ok(inputs[1].clone()),
        );

        let mut net = PetriNet::new();
        let t = net.create_transition(Arc::new(after_barrier)).unwrap();
        net.prepare().unwrap();
        let barrier = net.transition(t).unwrap().input(0).unwrap();
        let value = net.transition(t).unwrap().input(1).unwrap();
        let ctx = started(net);

        assert!(!ctx.needs_input(barrier).unwrap());
        assert!(ctx.needs_input(value).unwrap());
        ctx.put_token(value, 3i64).unwrap();
        assert!(ctx.is_ready(t).unwrap());
        assert_eq!(
            ctx.create_input(t).unwrap().into_vec(),
            vec![Value::Null, Value::from(3i64)]
        );
    }

    #[test]
    fn test_job_can_disable_itself() {
        struct Toggle {
            off: AtomicBool,
            output: TypeTag,
        }

        #[async_trait]
        impl Job for Toggle {
            fn name(&self) -> &str {
                "toggle"
            }
            fn input_types(&self) -> &[TypeTag] {
                &[]
            }
            fn output_type(&self) -> &TypeTag {
                &self.output
            }
            async fn execute(&self, _ctx: JobContext<'_>, _inputs: Inputs) -> JobResult<Value> {
                Ok(Value::Bool(true))
            }
            fn is_disabled(&self, _ctx: &ExecutionContext) -> bool {
                self.off.load(Ordering::SeqCst)
            }
        }

        let job = Arc::new(Toggle {
            off: AtomicBool::new(false),
            output: TypeTag::Bool,
        });
        let mut net = PetriNet::new();
        let t = net.create_transition(job.clone()).unwrap();
        net.prepare().unwrap();
        let ctx = started(net);

        assert!(ctx.is_ready(t).unwrap());
        job.off.store(true, Ordering::SeqCst);
        assert!(ctx.is_disabled(t));
        assert!(!ctx.is_ready(t).unwrap());
    }

    /// a -> t0 -> b -> t1 -> c -> t2 -> d, and b -> t3 -> e
    fn fork_net() -> (PetriNet, [TransitionId; 4]) {
        let mut net = PetriNet::new();
        let t: Vec<TransitionId> = (0..4)
            .map(|_| net.create_transition(inc_job()).unwrap())
            .collect();
        let b = net.create_place(TypeTag::Integer).unwrap();
        let c = net.create_place(TypeTag::Integer).unwrap();
        net.connect_output(t[0], b).unwrap();
        net.connect_input(b, t[1], 0).unwrap();
        net.connect_input(b, t[3], 0).unwrap();
        net.connect_output(t[1], c).unwrap();
        net.connect_input(c, t[2], 0).unwrap();
        net.prepare().unwrap();
        (net, [t[0], t[1], t[2], t[3]])
    }

    #[test]
    fn test_disable_unnecessary_forward_and_backward() {
        let (net, [t0, t1, t2, t3]) = fork_net();
        let ctx = started(net);

        // Forward: disabling t1 takes t2 with it.
        ctx.disable(t1).unwrap();
        assert_eq!(ctx.disable_unnecessary(None), 1);
        assert!(ctx.is_disabled(t2));
        assert!(!ctx.is_disabled(t0), "t3 still consumes b");
        assert!(!ctx.is_disabled(t3));

        // Backward: with t3 gone too, nothing consumes t0's output.
        ctx.disable(t3).unwrap();
        assert_eq!(ctx.disable_unnecessary(None), 1);
        assert!(ctx.is_disabled(t0));
        assert_eq!(ctx.disable_unnecessary(None), 0);
    }

    #[test]
    fn test_disable_unnecessary_keeps_goal() {
        let (net, [t0, t1, _t2, t3]) = fork_net();
        let ctx = started(net);
        ctx.disable(t1).unwrap();
        ctx.disable(t3).unwrap();
        assert_eq!(ctx.disable_unnecessary(Some(t0)), 1);
        assert!(!ctx.is_disabled(t0));
    }

    #[test]
    fn test_use_goal_keeps_ancestors() {
        let (net, [t0, t1, t2, t3]) = fork_net();
        let ctx = started(net);
        ctx.use_goal(t2).unwrap();
        assert!(!ctx.is_disabled(t0));
        assert!(!ctx.is_disabled(t1));
        assert!(!ctx.is_disabled(t2));
        assert!(ctx.is_disabled(t3));

        assert_eq!(
            ctx.use_goal(TransitionId(99)),
            Err(ExecutionError::UnknownTransition(TransitionId(99)))
        );
    }

    #[test]
    fn test_annotation_channel() {
        let (net, ids) = chain_net();
        let ctx = ExecutionContext::new(Arc::new(net)).unwrap();

        ctx.new_context::<String>("reference").unwrap();
        ctx.set_context("reference", NodeKey::context(), "GRCh38".to_string())
            .unwrap();
        ctx.new_context::<u64>("reads").unwrap();
        ctx.set_context("reads", ids.a, 1_000u64).unwrap();

        assert_eq!(
            ctx.get_context::<String>("reference", NodeKey::context())
                .unwrap()
                .as_deref(),
            Some("GRCh38")
        );
        assert_eq!(ctx.get_context::<u64>("reads", ids.a).unwrap(), Some(1_000));
        assert_eq!(ctx.get_context::<u64>("reads", ids.b).unwrap(), None);
        assert!(matches!(
            ctx.get_context::<i32>("reads", ids.a),
            Err(AnnotationError::TypeMismatch { .. })
        ));
        assert_eq!(
            ctx.get_context::<u64>("missing", ids.a),
            Err(AnnotationError::Unknown("missing".to_string()))
        );
    }

    #[test]
    fn test_sink_values() {
        let (net, ids) = chain_net();
        let ctx = started(net);
        assert!(ctx.sink_values().unwrap().is_empty());
        ctx.put_token(ids.c, 12i64).unwrap();
        let sinks = ctx.sink_values().unwrap();
        assert_eq!(sinks.get(&ids.c), Some(&Value::from(12i64)));
        assert!(ctx.is_finished().unwrap());
    }
}
