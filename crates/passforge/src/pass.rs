//! Pass interface, per-run execution state, and the pattern-rewrite pass
//! adapter.

use crate::analysis::{Analysis, AnalysisManager, AnalysisScope, PreservedAnalyses};
use crate::driver::{apply_patterns_greedily, GreedyRewriteConfig, GreedyRewriteResult, TraversalOrder};
use crate::error::ConfigError;
use crate::graph::ProgramGraph;
use crate::pattern::{FrozenRewritePatternSet, RewritePatternSet};

/// Iteration bound used by [`PatternRewritePass`]. Predictable bounded cost
/// is preferred over exhaustive convergence; passes needing a different
/// bound drive [`apply_patterns_greedily`] themselves.
pub const PATTERN_PASS_MAX_ITERATIONS: usize = 10;

/// Ordered tier classifying a pass's purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptLevel {
    /// Required by the framework regardless of optimization settings.
    Required = 0,
    /// Canonicalization, CSE, memory cleanups.
    Canonicalization = 1,
    /// Fusion.
    Fusion = 2,
    /// Layout and everything else.
    Layout = 3,
}

impl OptLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Pass identity: name, tier, and the names of passes it requires to have
/// run earlier in the same pipeline.
#[derive(Debug, Clone)]
pub struct PassInfo {
    name: String,
    opt_level: OptLevel,
    dependencies: Vec<String>,
}

impl PassInfo {
    pub fn new(name: impl Into<String>, opt_level: OptLevel) -> Self {
        Self {
            name: name.into(),
            opt_level,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opt_level(&self) -> OptLevel {
        self.opt_level
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// Per-(pass, graph) execution state, created immediately before `run` and
/// consumed by the manager immediately after.
pub struct PassExecutionState<'am, G: ProgramGraph> {
    failed: bool,
    diagnostic: Option<String>,
    preserved: PreservedAnalyses,
    rewrite: Option<GreedyRewriteResult>,
    analyses: &'am mut AnalysisManager<G>,
}

impl<'am, G: ProgramGraph> PassExecutionState<'am, G> {
    pub fn new(analyses: &'am mut AnalysisManager<G>) -> Self {
        Self {
            failed: false,
            diagnostic: None,
            preserved: PreservedAnalyses::none(),
            rewrite: None,
            analyses,
        }
    }

    /// Marks this run as failed. Sticky: once set it cannot be unset, and
    /// repeated calls are no-ops. The manager checks the flag only after
    /// `run` returns; a pass must not expect to be interrupted.
    pub fn signal_failure(&mut self) {
        self.failed = true;
    }

    /// [`signal_failure`] with diagnostic text for the abort report. The
    /// first diagnostic wins.
    ///
    /// [`signal_failure`]: PassExecutionState::signal_failure
    pub fn signal_failure_with(&mut self, diagnostic: impl Into<String>) {
        self.failed = true;
        if self.diagnostic.is_none() {
            self.diagnostic = Some(diagnostic.into());
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Shared analysis cache for this manager run.
    pub fn analyses(&mut self) -> &mut AnalysisManager<G> {
        self.analyses
    }

    /// Convenience for [`AnalysisManager::get`] at a given scope.
    pub fn analysis<A: Analysis<G>>(&mut self, graph: &G, scope: AnalysisScope<G::OpId>) -> &A {
        self.analyses.get::<A>(graph, scope)
    }

    /// Declares that this pass did not invalidate `A`.
    ///
    /// Trusted, not verified: preserving an analysis the pass actually
    /// invalidated hands stale results to every later pass.
    pub fn preserve<A: Analysis<G>>(&mut self) {
        self.preserved.preserve::<A>();
    }

    /// Declares that this pass invalidated nothing.
    pub fn preserve_all(&mut self) {
        self.preserved = PreservedAnalyses::all();
    }

    /// Records driver statistics for the run report.
    pub fn record_rewrite(&mut self, result: GreedyRewriteResult) {
        self.rewrite = Some(result);
    }

    pub(crate) fn finish(self) -> PassOutcome {
        PassOutcome {
            failed: self.failed,
            diagnostic: self.diagnostic,
            preserved: self.preserved,
            rewrite: self.rewrite,
        }
    }
}

pub(crate) struct PassOutcome {
    pub(crate) failed: bool,
    pub(crate) diagnostic: Option<String>,
    pub(crate) preserved: PreservedAnalyses,
    pub(crate) rewrite: Option<GreedyRewriteResult>,
}

/// A named unit of graph transformation or analysis, run once per graph per
/// manager invocation.
pub trait Pass<G: ProgramGraph>: Send + Sync {
    fn info(&self) -> &PassInfo;

    fn name(&self) -> &str {
        self.info().name()
    }

    /// Prepares pass-local state. Called once per manager run, before
    /// `run`; an error here aborts the whole pipeline without running
    /// anything.
    fn initialize(&mut self, context: &G::Context) -> Result<(), ConfigError> {
        let _ = context;
        Ok(())
    }

    /// Fast applicability check consulted before `initialize`. Returning
    /// `false` is a configuration error, not a silent skip.
    fn can_apply_on(&self, graph: &G) -> bool {
        let _ = graph;
        true
    }

    /// Transforms `graph`. Outcome is communicated through `state`: the
    /// sticky failure flag and the preserved-analyses declaration.
    fn run(&mut self, graph: &mut G, state: &mut PassExecutionState<'_, G>);
}

/// The pattern-building half of a [`PatternRewritePass`].
pub trait PatternPass<G: ProgramGraph>: Send + Sync {
    fn info(&self) -> &PassInfo;

    /// Builds the rule set this pass applies. Registering zero rules is a
    /// programming error, reported at initialization.
    fn initialize_patterns(&self, context: &G::Context) -> RewritePatternSet<G>;

    fn can_apply_on(&self, graph: &G) -> bool {
        let _ = graph;
        true
    }
}

/// Adapter running a [`PatternPass`]'s rules to a fixed point: top-down
/// traversal, [`PATTERN_PASS_MAX_ITERATIONS`] sweeps.
pub struct PatternRewritePass<G: ProgramGraph, P: PatternPass<G>> {
    inner: P,
    patterns: Option<FrozenRewritePatternSet<G>>,
}

impl<G: ProgramGraph, P: PatternPass<G>> PatternRewritePass<G, P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            patterns: None,
        }
    }
}

impl<G: ProgramGraph, P: PatternPass<G>> Pass<G> for PatternRewritePass<G, P> {
    fn info(&self) -> &PassInfo {
        self.inner.info()
    }

    fn initialize(&mut self, context: &G::Context) -> Result<(), ConfigError> {
        let patterns = self.inner.initialize_patterns(context);
        if patterns.is_empty() {
            return Err(ConfigError::EmptyPatternSet {
                pass: self.inner.info().name().to_string(),
            });
        }
        self.patterns = Some(patterns.freeze());
        Ok(())
    }

    fn can_apply_on(&self, graph: &G) -> bool {
        self.inner.can_apply_on(graph)
    }

    fn run(&mut self, graph: &mut G, state: &mut PassExecutionState<'_, G>) {
        let patterns = self
            .patterns
            .as_ref()
            .expect("initialize() must succeed before run()");
        let config = GreedyRewriteConfig {
            traversal: TraversalOrder::TopDown,
            max_iterations: PATTERN_PASS_MAX_ITERATIONS,
            enable_cleanup: true,
        };
        let result = apply_patterns_greedily(graph, patterns, &config);
        state.record_rewrite(result);
    }
}
