//! Incremental tracking of which transitions can fire.
//!
//! The index scans the net once when built and afterwards only re-checks the
//! transitions a state change can affect: the consumers of a newly filled
//! place and the fired transition itself. Firing a transition therefore costs
//! O(out-degree) instead of a full scan.

use std::collections::BTreeSet;
use std::sync::Arc;

use genoflow_core::{gf_sched, ExecutionResult, PlaceId, TransitionId};
use parking_lot::Mutex;

use super::context::ExecutionContext;

/// Lifecycle of a transition within one generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionState {
    /// Waiting for inputs, disabled, or output already present.
    NotReady,
    /// All inputs present; waiting to be taken.
    Ready,
    /// Taken by a driver; a firing is in flight.
    Firing,
    /// Fired and stored its output.
    Done,
    /// The Job reported an error.
    Failed,
    /// The firing outlived its generation.
    Stale,
}

impl TransitionState {
    /// No further state change is expected in this generation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Stale)
    }
}

#[derive(Debug)]
struct IndexState {
    states: Vec<TransitionState>,
    ready: BTreeSet<TransitionId>,
}

/// Ready set for one generation of an [`ExecutionContext`].
///
/// Readiness is evaluated while the index lock is held, so overlapping
/// updates apply in the order they observed the context. Lock order is
/// index, then context; the context never calls back into the index.
#[derive(Debug)]
pub struct ReadyTransitionIndex {
    ctx: Arc<ExecutionContext>,
    generation: u64,
    inner: Mutex<IndexState>,
}

impl ReadyTransitionIndex {
    /// Build the index by scanning every transition. The context must be
    /// executing.
    pub fn new(ctx: Arc<ExecutionContext>) -> ExecutionResult<Self> {
        let transitions: Vec<TransitionId> =
            ctx.net().transitions().iter().map(|t| t.id()).collect();

        let mut states = vec![TransitionState::NotReady; transitions.len()];
        let mut ready = BTreeSet::new();
        for &t in &transitions {
            if ctx.is_ready(t)? {
                states[t.index()] = TransitionState::Ready;
                ready.insert(t);
            }
        }
        let generation = ctx.generation();

        gf_sched!(debug,
            execution_id = %ctx.execution_id(),
            generation,
            transitions = transitions.len(),
            ready = ready.len(),
            "Ready index built"
        );

        Ok(Self {
            ctx,
            generation,
            inner: Mutex::new(IndexState { states, ready }),
        })
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.ctx
    }

    /// Generation the index was built for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pop the lowest-id ready transition and mark it firing.
    pub fn take(&self) -> Option<TransitionId> {
        let mut inner = self.inner.lock();
        let t = inner.ready.pop_first()?;
        inner.states[t.index()] = TransitionState::Firing;
        Some(t)
    }

    /// Pop every ready transition, in id order.
    pub fn take_all(&self) -> Vec<TransitionId> {
        let mut inner = self.inner.lock();
        let taken: Vec<TransitionId> = std::mem::take(&mut inner.ready).into_iter().collect();
        for t in &taken {
            inner.states[t.index()] = TransitionState::Firing;
        }
        taken
    }

    pub fn contains(&self, transition: TransitionId) -> bool {
        self.inner.lock().ready.contains(&transition)
    }

    /// Snapshot of the ready set, in id order.
    pub fn ready(&self) -> Vec<TransitionId> {
        self.inner.lock().ready.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().ready.is_empty()
    }

    pub fn state(&self, transition: TransitionId) -> Option<TransitionState> {
        self.inner.lock().states.get(transition.index()).copied()
    }

    /// Number of transitions currently in `state`.
    pub fn count(&self, state: TransitionState) -> usize {
        self.inner
            .lock()
            .states
            .iter()
            .filter(|&&s| s == state)
            .count()
    }

    /// Record a successful firing and re-check the transitions it affects.
    ///
    /// Returns the transitions that became ready.
    pub fn fired(&self, transition: TransitionId) -> ExecutionResult<Vec<TransitionId>> {
        self.set_state(transition, TransitionState::Done);

        let mut affected: Vec<TransitionId> = self
            .ctx
            .net()
            .transition(transition)
            .and_then(|t| t.output())
            .map(|place| self.ctx.net().consumers_of(place).to_vec())
            .unwrap_or_default();
        affected.push(transition);
        self.recheck(&affected)
    }

    /// Record a failed firing.
    pub fn failed(&self, transition: TransitionId) {
        self.set_state(transition, TransitionState::Failed);
    }

    /// Record a firing that outlived its generation.
    pub fn stale(&self, transition: TransitionId) {
        self.set_state(transition, TransitionState::Stale);
    }

    /// Re-check the consumers of a place seeded from outside.
    ///
    /// Returns the transitions that became ready.
    pub fn token_added(&self, place: PlaceId) -> ExecutionResult<Vec<TransitionId>> {
        let consumers = self.ctx.net().consumers_of(place).to_vec();
        self.recheck(&consumers)
    }

    fn set_state(&self, transition: TransitionId, state: TransitionState) {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.states.get_mut(transition.index()) {
            *slot = state;
        }
        inner.ready.remove(&transition);
    }

    fn recheck(&self, candidates: &[TransitionId]) -> ExecutionResult<Vec<TransitionId>> {
        let mut inner = self.inner.lock();
        let mut newly_ready = Vec::new();
        for &t in candidates {
            let Some(&state) = inner.states.get(t.index()) else {
                continue;
            };
            if !matches!(state, TransitionState::NotReady | TransitionState::Ready) {
                continue;
            }
            match (state, self.ctx.is_ready(t)?) {
                (TransitionState::NotReady, true) => {
                    inner.states[t.index()] = TransitionState::Ready;
                    inner.ready.insert(t);
                    newly_ready.push(t);
                }
                (TransitionState::Ready, false) => {
                    inner.states[t.index()] = TransitionState::NotReady;
                    inner.ready.remove(&t);
                }
                _ => {}
            }
        }
        Ok(newly_ready)
    }
}
