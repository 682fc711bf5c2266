//! Greedy worklist-based pattern-rewrite driver.

use std::collections::{HashMap, VecDeque};

use crate::graph::ProgramGraph;
use crate::pattern::FrozenRewritePatternSet;
use crate::rewriter::GraphRewriter;

/// Seed order for the driver's worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Definition (pre) order.
    TopDown,
    /// Reverse definition order.
    BottomUp,
}

#[derive(Debug, Clone)]
pub struct GreedyRewriteConfig {
    pub traversal: TraversalOrder,
    /// Hard bound on fixed-point iterations; the driver stops here whether
    /// or not the rewrite closure converged.
    pub max_iterations: usize,
    /// Erase trivially dead operations once rewriting settles.
    pub enable_cleanup: bool,
}

impl Default for GreedyRewriteConfig {
    fn default() -> Self {
        Self {
            traversal: TraversalOrder::TopDown,
            max_iterations: 10,
            enable_cleanup: true,
        }
    }
}

/// Outcome of one driver invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GreedyRewriteResult {
    /// Worklist sweeps executed.
    pub iterations: usize,
    /// Successful rule applications across all sweeps.
    pub rewrites_applied: usize,
    /// Operations erased, by rewrites and by the cleanup sweep.
    pub ops_erased: usize,
    /// Whether the rewrite closure was exhausted before the iteration
    /// bound. `false` here is a reported condition, not an error.
    pub converged: bool,
}

/// Applies `patterns` over `graph` until no rule fires or the iteration
/// bound is reached.
///
/// The worklist is seeded once in the configured traversal order. Each
/// successful application re-queues the operations it created, the users it
/// rewired, and the root if it survived; those are processed in the next
/// sweep. Candidate rules for an operation are tried in frozen-set order
/// (benefit descending, then registration order) and the first one whose
/// match succeeds is applied, so two runs over the same graph apply the
/// same rules in the same order.
pub fn apply_patterns_greedily<G: ProgramGraph>(
    graph: &mut G,
    patterns: &FrozenRewritePatternSet<G>,
    config: &GreedyRewriteConfig,
) -> GreedyRewriteResult {
    let mut result = GreedyRewriteResult::default();
    if patterns.is_empty() {
        result.converged = true;
        return result;
    }

    let mut rewriter = GraphRewriter::new(graph);
    let mut pending: VecDeque<G::OpId> = seed_worklist(&rewriter, config.traversal);

    // A rule that failed on an operation is not retried until something
    // touches that operation again (versions bump on touch).
    let mut failure_cache: HashMap<(usize, G::OpId), u32> = HashMap::new();

    while !pending.is_empty() && result.iterations < config.max_iterations {
        result.iterations += 1;
        let mut requeued: VecDeque<G::OpId> = VecDeque::new();

        while let Some(op) = pending.pop_front() {
            // Stale entries are expected: earlier rewrites in this run may
            // have erased the operation.
            if !rewriter.contains(op) {
                continue;
            }
            let kind = rewriter.kind(op);
            let version = rewriter.version(op);

            for &index in patterns.candidates(&kind) {
                if failure_cache.get(&(index, op)) == Some(&version) {
                    continue;
                }
                if patterns.pattern(index).match_and_rewrite(op, &mut rewriter) {
                    result.rewrites_applied += 1;
                    let (created, touched) = rewriter.take_changes();
                    for new_op in created {
                        if !rewriter.contains(new_op) {
                            continue;
                        }
                        requeued.push_back(new_op);
                        for &value in rewriter.results(new_op) {
                            for user in rewriter.users(value) {
                                requeued.push_back(user);
                            }
                        }
                    }
                    requeued.extend(touched);
                    if rewriter.contains(op) {
                        requeued.push_back(op);
                    }
                    break;
                }
                failure_cache.insert((index, op), version);
            }
        }

        pending = requeued;
    }

    result.converged = pending.is_empty();

    if config.enable_cleanup {
        erase_dead_ops(&mut rewriter);
    }
    result.ops_erased = rewriter.erased_count();
    result
}

fn seed_worklist<G: ProgramGraph>(
    rewriter: &GraphRewriter<'_, G>,
    traversal: TraversalOrder,
) -> VecDeque<G::OpId> {
    let ops = rewriter.graph().ops_pre_order();
    match traversal {
        TraversalOrder::TopDown => ops.into_iter().collect(),
        TraversalOrder::BottomUp => ops.into_iter().rev().collect(),
    }
}

/// Repeatedly erases operations with no users, no side effects, and no
/// live-out results, until a sweep removes nothing.
fn erase_dead_ops<G: ProgramGraph>(rewriter: &mut GraphRewriter<'_, G>) {
    loop {
        let mut removed = 0;
        for op in rewriter.graph().ops_pre_order().into_iter().rev() {
            if !rewriter.contains(op) {
                continue;
            }
            if rewriter.graph().has_side_effects(op) {
                continue;
            }
            let dead = rewriter.results(op).iter().all(|&value| {
                !rewriter.graph().is_live_out(value) && rewriter.users(value).is_empty()
            });
            if dead {
                rewriter.erase_op(op);
                removed += 1;
            }
        }
        if removed == 0 {
            break;
        }
    }
}
