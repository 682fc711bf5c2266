//! Pass-execution framework for mutable program-graph IRs.
//!
//! The crate hosts user-supplied transformation and analysis passes: a
//! [`PassManager`] runs an ordered pipeline over one graph, an
//! [`AnalysisManager`] memoizes analysis results between passes and evicts
//! whatever a pass did not declare preserved, and pattern-based passes
//! drive [`apply_patterns_greedily`], a deterministic worklist rewrite
//! engine with a hard iteration bound.
//!
//! The IR itself is not defined here. Anything implementing the
//! [`ProgramGraph`] capability trait — enumerate operations, rewire value
//! uses, erase and create operations — can be put through the pipeline.

pub mod analysis;
pub mod driver;
mod env;
pub mod error;
pub mod graph;
pub mod manager;
pub mod pass;
pub mod pattern;
pub mod rewriter;
pub mod trace;

pub use analysis::{Analysis, AnalysisLocality, AnalysisManager, AnalysisScope, PreservedAnalyses};
pub use driver::{
    apply_patterns_greedily, GreedyRewriteConfig, GreedyRewriteResult, TraversalOrder,
};
pub use error::{ConfigError, RunError};
pub use graph::ProgramGraph;
pub use manager::{PassManager, PassReport, RunSummary};
pub use pass::{
    OptLevel, Pass, PassExecutionState, PassInfo, PatternPass, PatternRewritePass,
    PATTERN_PASS_MAX_ITERATIONS,
};
pub use pattern::{FrozenRewritePatternSet, Pattern, RewritePatternSet};
pub use rewriter::GraphRewriter;
