//! Pipeline error types.
//!
//! Two tiers, checked at different times: [`ConfigError`] is detected before
//! or at pass initialization and always aborts the whole run; a pass-level
//! run failure is signalled through the execution state after `run` returns
//! and surfaces as [`RunError::PassFailed`].

use thiserror::Error;

/// Fatal pipeline misconfiguration, detected before any pass transforms the
/// graph it applies to.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pattern pass `{pass}` registered an empty pattern set")]
    EmptyPatternSet { pass: String },

    #[error("pass `{pass}` depends on `{dependency}`, which does not run earlier in the pipeline")]
    UnsatisfiedDependency { pass: String, dependency: String },

    #[error("pass name `{pass}` is registered more than once")]
    DuplicatePassName { pass: String },

    #[error("pass `{pass}` cannot apply to the given graph")]
    NotApplicable { pass: String },

    /// Pass-specific initialization failure (bad option, missing resource).
    #[error("pass `{pass}` failed to initialize: {message}")]
    Initialization { pass: String, message: String },
}

/// Failure of one pass-manager run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A pass signalled failure while running. Mutations the pass already
    /// made are not rolled back; remaining passes were not run.
    #[error("pass `{pass}` signalled failure")]
    PassFailed {
        pass: String,
        diagnostic: Option<String>,
    },
}

impl RunError {
    /// Diagnostic text attached by the failing pass, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            RunError::PassFailed { diagnostic, .. } => diagnostic.as_deref(),
            RunError::Config(_) => None,
        }
    }
}
