//! Capability contract the framework requires of a program graph.
//!
//! The IR itself lives outside this crate. Passes, patterns, and the rewrite
//! driver reach it exclusively through [`ProgramGraph`], so any SSA-style
//! graph that can enumerate its operations and rewire value uses can be
//! driven by the pipeline.

use std::fmt::Debug;
use std::hash::Hash;

/// Minimal query and mutation surface over a mutable program graph.
///
/// Identifiers must stay stable across mutations: erasing an operation must
/// not recycle its id within the lifetime of one rewrite, and [`contains`]
/// must report erased ids as dead rather than panic. The driver relies on
/// this to tolerate stale worklist entries.
///
/// [`contains`]: ProgramGraph::contains
pub trait ProgramGraph {
    /// Stable handle for an operation.
    type OpId: Copy + Eq + Ord + Hash + Debug;
    /// Stable handle for an SSA value.
    type ValueId: Copy + Eq + Hash + Debug;
    /// Operation kind identifier; rewrite rules are bucketed by this.
    type OpKind: Copy + Eq + Hash + Debug + Send + Sync;
    /// Dialect payload attached to newly created operations.
    type Attribute: Clone;
    /// Opaque dialect context handed to pass initialization.
    type Context;

    /// All operations reachable from the graph root in definition (pre)
    /// order, nested regions included. The order must be deterministic.
    fn ops_pre_order(&self) -> Vec<Self::OpId>;

    /// Whether `op` is still live. Must return `false` (not panic) for ids
    /// of erased operations.
    fn contains(&self, op: Self::OpId) -> bool;

    fn kind(&self, op: Self::OpId) -> Self::OpKind;

    fn operands(&self, op: Self::OpId) -> &[Self::ValueId];

    fn results(&self, op: Self::OpId) -> &[Self::ValueId];

    /// Operations contained in the regions nested under `op`, definition
    /// order. Flat dialects keep the default.
    fn nested_ops(&self, op: Self::OpId) -> Vec<Self::OpId> {
        let _ = op;
        Vec::new()
    }

    /// Operations using `value` as an operand, in a deterministic order.
    fn users(&self, value: Self::ValueId) -> Vec<Self::OpId>;

    /// Whether erasing `op` would change observable behavior even if its
    /// results are unused. Such operations survive the cleanup sweep.
    fn has_side_effects(&self, op: Self::OpId) -> bool;

    /// Whether `value` escapes the graph (a root output). Producers of
    /// live-out values are never considered dead.
    fn is_live_out(&self, value: Self::ValueId) -> bool;

    /// Redirects every use of `from` to `to`.
    fn replace_all_uses(&mut self, from: Self::ValueId, to: Self::ValueId);

    /// Removes `op` from the graph, invalidating its id.
    fn erase_op(&mut self, op: Self::OpId);

    /// Creates an operation of `kind` immediately before `before`, returning
    /// its id. Result values are allocated by the graph.
    fn create_op(
        &mut self,
        before: Self::OpId,
        kind: Self::OpKind,
        operands: &[Self::ValueId],
        attribute: Self::Attribute,
    ) -> Self::OpId;
}
