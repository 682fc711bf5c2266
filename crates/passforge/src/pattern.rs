//! Rewrite rules and the build-then-freeze pattern set.

use std::collections::HashMap;

use crate::graph::ProgramGraph;
use crate::rewriter::GraphRewriter;

/// A match-and-replace rule rooted at one operation kind.
///
/// `match_and_rewrite` either leaves the graph untouched and returns `false`,
/// or performs the rewrite through the provided rewriter and returns `true`.
/// Partial matches that mutate the graph before bailing out are a bug in the
/// rule, not something the driver can recover from.
pub trait Pattern<G: ProgramGraph>: Send + Sync {
    /// Kind this rule is rooted at; `None` makes the rule a candidate for
    /// every operation.
    fn root_kind(&self) -> Option<G::OpKind>;

    /// Relative priority among rules matching the same operation. Higher
    /// benefit is tried first; ties fall back to registration order.
    fn benefit(&self) -> u16 {
        1
    }

    fn match_and_rewrite(&self, op: G::OpId, rewriter: &mut GraphRewriter<'_, G>) -> bool;
}

/// Mutable collection of rules, sealed into a [`FrozenRewritePatternSet`]
/// before use. Sealing is one-way.
pub struct RewritePatternSet<G: ProgramGraph> {
    patterns: Vec<Box<dyn Pattern<G>>>,
}

impl<G: ProgramGraph> RewritePatternSet<G> {
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn add<P>(&mut self, pattern: P) -> &mut Self
    where
        P: Pattern<G> + 'static,
    {
        self.patterns.push(Box::new(pattern));
        self
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Seals the set. Candidate order per kind is fixed here: benefit
    /// descending, registration order breaking ties.
    pub fn freeze(self) -> FrozenRewritePatternSet<G> {
        let mut generic: Vec<usize> = Vec::new();
        let mut buckets: HashMap<G::OpKind, Vec<usize>> = HashMap::new();
        for (index, pattern) in self.patterns.iter().enumerate() {
            match pattern.root_kind() {
                Some(kind) => buckets.entry(kind).or_default().push(index),
                None => generic.push(index),
            }
        }

        let order_key = |&index: &usize| {
            (
                std::cmp::Reverse(self.patterns[index].benefit()),
                index,
            )
        };
        generic.sort_by_key(order_key);
        for bucket in buckets.values_mut() {
            bucket.extend_from_slice(&generic);
            bucket.sort_by_key(order_key);
        }

        FrozenRewritePatternSet {
            patterns: self.patterns,
            by_kind: buckets,
            generic,
        }
    }
}

impl<G: ProgramGraph> Default for RewritePatternSet<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable, kind-bucketed rule collection consumed by the rewrite driver.
pub struct FrozenRewritePatternSet<G: ProgramGraph> {
    patterns: Vec<Box<dyn Pattern<G>>>,
    by_kind: HashMap<G::OpKind, Vec<usize>>,
    generic: Vec<usize>,
}

impl<G: ProgramGraph> FrozenRewritePatternSet<G> {
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Candidate rule indices for an operation of `kind`, in application
    /// order. Kind-agnostic rules are already merged into each bucket.
    pub fn candidates(&self, kind: &G::OpKind) -> &[usize] {
        self.by_kind
            .get(kind)
            .map(Vec::as_slice)
            .unwrap_or(&self.generic)
    }

    pub fn pattern(&self, index: usize) -> &dyn Pattern<G> {
        &*self.patterns[index]
    }
}
