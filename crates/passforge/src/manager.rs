//! Ordered pass pipeline over one graph.

use std::time::{Duration, Instant, SystemTime};

use crate::analysis::AnalysisManager;
use crate::driver::GreedyRewriteResult;
use crate::error::{ConfigError, RunError};
use crate::graph::ProgramGraph;
use crate::pass::{OptLevel, Pass, PassExecutionState, PatternPass, PatternRewritePass};
use crate::{env, trace};

/// Outcome of one pass within a completed manager run.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass: String,
    pub opt_level: OptLevel,
    pub elapsed: Duration,
    /// Driver statistics, for pattern-rewrite passes.
    pub rewrite: Option<GreedyRewriteResult>,
}

/// Per-pass reports for a run that completed without failure.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub passes: Vec<PassReport>,
}

impl RunSummary {
    pub fn pass(&self, name: &str) -> Option<&PassReport> {
        self.passes.iter().find(|report| report.pass == name)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

/// Runs an ordered sequence of passes over a graph, sharing one analysis
/// cache across them.
///
/// The manager owns the graph and the cache exclusively for the duration of
/// a run; passes execute strictly sequentially. A pass that signals failure
/// aborts the remaining sequence — its mutations are not rolled back, so
/// passes must leave the graph structurally valid even on failure.
pub struct PassManager<G: ProgramGraph> {
    passes: Vec<Box<dyn Pass<G>>>,
}

impl<G: ProgramGraph> PassManager<G> {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn add_pass<P>(&mut self, pass: P) -> &mut Self
    where
        P: Pass<G> + 'static,
    {
        self.passes.push(Box::new(pass));
        self
    }

    /// Wraps a [`PatternPass`] in the greedy-driver adapter and appends it.
    pub fn add_pattern_pass<P>(&mut self, pass: P) -> &mut Self
    where
        P: PatternPass<G> + 'static,
        G: 'static,
    {
        self.add_pass(PatternRewritePass::new(pass))
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.info().name()).collect()
    }

    /// Runs every registered pass in order.
    ///
    /// Configuration problems (duplicate names, unsatisfied dependencies)
    /// are reported before any pass runs. Per pass: applicability gate,
    /// one-time initialization, a fresh execution state, `run`, the sticky
    /// failure check, then the preserved-analyses sweep over the cache.
    pub fn run(&mut self, graph: &mut G, context: &G::Context) -> Result<RunSummary, RunError> {
        self.validate()?;

        let mut analyses = AnalysisManager::new();
        let mut summary = RunSummary::default();

        for pass in &mut self.passes {
            let name = pass.info().name().to_string();
            let opt_level = pass.info().opt_level();

            if !pass.can_apply_on(graph) {
                return Err(ConfigError::NotApplicable { pass: name }.into());
            }
            pass.initialize(context)?;

            let started = Instant::now();
            let mut state = PassExecutionState::new(&mut analyses);
            pass.run(graph, &mut state);
            let outcome = state.finish();
            let elapsed = started.elapsed();

            if outcome.failed {
                emit_failed(&name, outcome.diagnostic.clone());
                return Err(RunError::PassFailed {
                    pass: name,
                    diagnostic: outcome.diagnostic,
                });
            }

            analyses.invalidate_all_except(&outcome.preserved);
            emit_ran(&name, opt_level, elapsed, outcome.rewrite);
            summary.passes.push(PassReport {
                pass: name,
                opt_level,
                elapsed,
                rewrite: outcome.rewrite,
            });
        }

        Ok(summary)
    }

    /// Name uniqueness plus fail-fast dependency gating: every declared
    /// dependency must name a pass that runs earlier in this pipeline.
    fn validate(&self) -> Result<(), ConfigError> {
        for (index, pass) in self.passes.iter().enumerate() {
            let name = pass.info().name();
            let earlier = &self.passes[..index];
            if earlier.iter().any(|prior| prior.info().name() == name) {
                return Err(ConfigError::DuplicatePassName {
                    pass: name.to_string(),
                });
            }
            for dependency in pass.info().dependencies() {
                if !earlier.iter().any(|prior| prior.info().name() == dependency) {
                    return Err(ConfigError::UnsatisfiedDependency {
                        pass: name.to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<G: ProgramGraph> Default for PassManager<G> {
    fn default() -> Self {
        Self::new()
    }
}

fn emit_ran(pass: &str, opt_level: OptLevel, elapsed: Duration, rewrite: Option<GreedyRewriteResult>) {
    if !trace::sink_installed() && !env::pass_stats_enabled() {
        return;
    }
    trace::emit_pass_event(trace::PassEvent {
        timestamp: SystemTime::now(),
        pass: pass.to_string(),
        kind: trace::PassEventKind::PassRan {
            stats: trace::PassRunStats {
                opt_level: opt_level.as_u8(),
                elapsed_micros: elapsed.as_micros(),
                rewrite: rewrite.map(Into::into),
            },
        },
    });
}

fn emit_failed(pass: &str, diagnostic: Option<String>) {
    if !trace::sink_installed() && !env::pass_stats_enabled() {
        return;
    }
    trace::emit_pass_event(trace::PassEvent {
        timestamp: SystemTime::now(),
        pass: pass.to_string(),
        kind: trace::PassEventKind::PassFailed { diagnostic },
    });
}
