//! Accounting wrapper patterns mutate the graph through.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::graph::ProgramGraph;

/// Mutation interface handed to rewrite rules.
///
/// Every structural edit goes through this wrapper so the driver can observe
/// what a rewrite touched: created operations and operations whose operands
/// were rewired are collected and re-queued, and per-operation version
/// counters feed the driver's failure cache.
pub struct GraphRewriter<'g, G: ProgramGraph> {
    graph: &'g mut G,
    created: Vec<G::OpId>,
    touched: Vec<G::OpId>,
    versions: HashMap<G::OpId, u32>,
    erased: usize,
}

impl<'g, G: ProgramGraph> GraphRewriter<'g, G> {
    pub fn new(graph: &'g mut G) -> Self {
        Self {
            graph,
            created: Vec::new(),
            touched: Vec::new(),
            versions: HashMap::new(),
            erased: 0,
        }
    }

    /// Read access to the underlying graph for dialect-specific queries.
    pub fn graph(&self) -> &G {
        self.graph
    }

    /// Raw mutable access. Edits made here bypass the driver's change
    /// tracking; callers must report them via [`notify_modified`].
    ///
    /// [`notify_modified`]: GraphRewriter::notify_modified
    pub fn graph_mut(&mut self) -> &mut G {
        self.graph
    }

    pub fn contains(&self, op: G::OpId) -> bool {
        self.graph.contains(op)
    }

    pub fn kind(&self, op: G::OpId) -> G::OpKind {
        self.graph.kind(op)
    }

    pub fn operands(&self, op: G::OpId) -> &[G::ValueId] {
        self.graph.operands(op)
    }

    pub fn results(&self, op: G::OpId) -> &[G::ValueId] {
        self.graph.results(op)
    }

    pub fn users(&self, value: G::ValueId) -> Vec<G::OpId> {
        self.graph.users(value)
    }

    /// Version counter for `op`, bumped whenever a rewrite touches it.
    pub fn version(&self, op: G::OpId) -> u32 {
        self.versions.get(&op).copied().unwrap_or(0)
    }

    /// Creates an operation before `before` and records it for re-queueing.
    pub fn create_op(
        &mut self,
        before: G::OpId,
        kind: G::OpKind,
        operands: &[G::ValueId],
        attribute: G::Attribute,
    ) -> G::OpId {
        let op = self.graph.create_op(before, kind, operands, attribute);
        self.created.push(op);
        op
    }

    /// Redirects every use of `from` to `to`, recording the rewired users.
    pub fn replace_all_uses(&mut self, from: G::ValueId, to: G::ValueId) {
        let users: SmallVec<[G::OpId; 4]> = SmallVec::from_vec(self.graph.users(from));
        self.graph.replace_all_uses(from, to);
        for user in users {
            self.mark_touched(user);
        }
    }

    /// Erases `op`.
    ///
    /// Panics if any result of `op` still has uses; callers must rewire
    /// uses first (or use [`replace_op`]).
    ///
    /// [`replace_op`]: GraphRewriter::replace_op
    pub fn erase_op(&mut self, op: G::OpId) {
        for &result in self.graph.results(op) {
            if !self.graph.users(result).is_empty() {
                panic!("attempting to erase operation {op:?} with live uses");
            }
        }
        self.graph.erase_op(op);
        self.versions.remove(&op);
        self.erased += 1;
    }

    /// Replaces `op` with `replacements` (one value per result) and erases it.
    pub fn replace_op(&mut self, op: G::OpId, replacements: &[G::ValueId]) {
        let results: SmallVec<[G::ValueId; 2]> = SmallVec::from_slice(self.graph.results(op));
        assert_eq!(
            results.len(),
            replacements.len(),
            "replacement count must match result count of {op:?}"
        );
        for (&result, &replacement) in results.iter().zip(replacements) {
            self.replace_all_uses(result, replacement);
        }
        self.erase_op(op);
    }

    /// Records an out-of-band edit to `op` so the driver re-examines it.
    pub fn notify_modified(&mut self, op: G::OpId) {
        self.mark_touched(op);
    }

    /// Total operations erased through this rewriter.
    pub fn erased_count(&self) -> usize {
        self.erased
    }

    /// Drains the change log accumulated since the last call: operations
    /// created by rewrites, then operations whose operands were rewired.
    pub(crate) fn take_changes(&mut self) -> (Vec<G::OpId>, Vec<G::OpId>) {
        (
            std::mem::take(&mut self.created),
            std::mem::take(&mut self.touched),
        )
    }

    fn mark_touched(&mut self, op: G::OpId) {
        *self.versions.entry(op).or_insert(0) += 1;
        self.touched.push(op);
    }
}
