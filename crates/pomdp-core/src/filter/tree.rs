//! Opaque belief-tree handles and the lookup contract consumed from the
//! solver's belief-tree storage.

use crate::model::ObservationPool;
use std::collections::HashMap;

/// Identity token for an action child in the solver's belief tree.
///
/// The wrapped value carries no meaning beyond identity: two handles compare
/// equal iff they denote the same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionNodeHandle(u64);

impl ActionNodeHandle {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identity token for a belief node — the observation equivalence class
/// reached under some action child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BeliefNodeHandle(u64);

impl BeliefNodeHandle {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Read-only lookup into the solver's belief-tree storage.
///
/// Observation equality for belief purposes is resolved through
/// [`observation_child`](BeliefTreeView::observation_child), never through
/// raw observation comparison; that indirection is what lets continuous and
/// aggregated observations share an equivalence class.
pub trait BeliefTreeView<A, O> {
    /// Handle of the action child under `belief`, or `None` if the action
    /// was never expanded there.
    fn action_child(&self, belief: BeliefNodeHandle, action: &A) -> Option<ActionNodeHandle>;

    /// Belief node representing the equivalence class of `obs` under
    /// `node`, or `None` if no such class was ever materialized.
    fn observation_child(&self, node: ActionNodeHandle, obs: &O) -> Option<BeliefNodeHandle>;
}

/// Minimal in-memory belief-tree index.
///
/// Reference implementation of [`BeliefTreeView`] backed by a model's
/// observation pool; the tests and the evaluation harness build their trees
/// with it, production solvers supply their own storage.
#[derive(Debug)]
pub struct BeliefTreeIndex<A, O> {
    next_id: u64,
    root: BeliefNodeHandle,
    action_edges: Vec<(BeliefNodeHandle, A, ActionNodeHandle)>,
    observation_edges: HashMap<(ActionNodeHandle, usize), BeliefNodeHandle>,
    pool: Box<dyn ObservationPool<O>>,
}

impl<A, O> BeliefTreeIndex<A, O>
where
    A: PartialEq,
{
    pub fn new(pool: Box<dyn ObservationPool<O>>) -> Self {
        Self {
            next_id: 1,
            root: BeliefNodeHandle::from_raw(0),
            action_edges: Vec::new(),
            observation_edges: HashMap::new(),
            pool,
        }
    }

    pub fn root(&self) -> BeliefNodeHandle {
        self.root
    }

    /// Expands (or returns) the action child of `belief` for `action`.
    pub fn expand_action(&mut self, belief: BeliefNodeHandle, action: A) -> ActionNodeHandle {
        if let Some(existing) = self.lookup_action(belief, &action) {
            return existing;
        }
        let handle = ActionNodeHandle::from_raw(self.next_id);
        self.next_id += 1;
        self.action_edges.push((belief, action, handle));
        handle
    }

    /// Expands (or returns) the belief child for `obs`'s equivalence class.
    ///
    /// Returns `None` when the pool does not classify `obs`.
    pub fn expand_observation(
        &mut self,
        node: ActionNodeHandle,
        obs: &O,
    ) -> Option<BeliefNodeHandle> {
        let class = self.pool.classify(obs)?;
        if let Some(existing) = self.observation_edges.get(&(node, class)) {
            return Some(*existing);
        }
        let handle = BeliefNodeHandle::from_raw(self.next_id);
        self.next_id += 1;
        self.observation_edges.insert((node, class), handle);
        Some(handle)
    }

    fn lookup_action(&self, belief: BeliefNodeHandle, action: &A) -> Option<ActionNodeHandle> {
        self.action_edges
            .iter()
            .find(|(parent, known, _)| *parent == belief && known == action)
            .map(|(_, _, handle)| *handle)
    }
}

impl<A, O> BeliefTreeView<A, O> for BeliefTreeIndex<A, O>
where
    A: PartialEq,
{
    fn action_child(&self, belief: BeliefNodeHandle, action: &A) -> Option<ActionNodeHandle> {
        self.lookup_action(belief, action)
    }

    fn observation_child(&self, node: ActionNodeHandle, obs: &O) -> Option<BeliefNodeHandle> {
        let class = self.pool.classify(obs)?;
        self.observation_edges.get(&(node, class)).copied()
    }
}
