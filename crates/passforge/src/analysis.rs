//! Analysis results, memoized across passes and invalidated per pass
//! declaration.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use crate::graph::ProgramGraph;

/// How far an analysis result reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisLocality {
    /// Valid only for the scope it was computed over; invalidation at one
    /// scope leaves results for other scopes untouched.
    Scoped,
    /// Derived from the whole graph; invalidating it anywhere evicts every
    /// cached scope.
    Global,
}

/// Structural scope an analysis is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisScope<Op> {
    /// The whole graph root.
    Root,
    /// The subregion rooted at an operation.
    Op(Op),
}

/// A derived fact about the graph, computed lazily and cached by the
/// [`AnalysisManager`] until a pass invalidates it.
pub trait Analysis<G: ProgramGraph>: Sized + 'static {
    const LOCALITY: AnalysisLocality = AnalysisLocality::Scoped;

    fn analyze(graph: &G, scope: AnalysisScope<G::OpId>) -> Self;
}

/// Set of analysis kinds a pass declares it did not invalidate.
///
/// This is a trust contract: the framework evicts everything outside the
/// declared set, but it cannot verify the declaration itself. A pass that
/// preserves an analysis it actually invalidated silently corrupts every
/// later pass that reads the cache.
#[derive(Debug, Clone)]
pub struct PreservedAnalyses {
    state: PreservedState,
}

#[derive(Debug, Clone)]
enum PreservedState {
    All,
    Subset(HashSet<TypeId>),
}

impl PreservedAnalyses {
    /// Nothing survives; the conservative default.
    pub fn none() -> Self {
        Self {
            state: PreservedState::Subset(HashSet::new()),
        }
    }

    /// Everything survives; for analysis-only passes.
    pub fn all() -> Self {
        Self {
            state: PreservedState::All,
        }
    }

    pub fn preserve<A: 'static>(&mut self) -> &mut Self {
        if let PreservedState::Subset(kinds) = &mut self.state {
            kinds.insert(TypeId::of::<A>());
        }
        self
    }

    pub fn is_all(&self) -> bool {
        matches!(self.state, PreservedState::All)
    }

    pub fn is_preserved<A: 'static>(&self) -> bool {
        self.preserves_id(TypeId::of::<A>())
    }

    pub(crate) fn preserves_id(&self, kind: TypeId) -> bool {
        match &self.state {
            PreservedState::All => true,
            PreservedState::Subset(kinds) => kinds.contains(&kind),
        }
    }
}

impl Default for PreservedAnalyses {
    fn default() -> Self {
        Self::none()
    }
}

/// Memoizes analysis results keyed by (analysis kind, scope).
///
/// Owned by the pass manager for the duration of one run; passes reach it
/// through their execution state.
pub struct AnalysisManager<G: ProgramGraph> {
    cache: HashMap<(TypeId, AnalysisScope<G::OpId>), Box<dyn Any>>,
}

impl<G: ProgramGraph> AnalysisManager<G> {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Returns the cached result for `A` at `scope`, computing it first if
    /// absent.
    pub fn get<A: Analysis<G>>(&mut self, graph: &G, scope: AnalysisScope<G::OpId>) -> &A {
        self.cache
            .entry((TypeId::of::<A>(), scope))
            .or_insert_with(|| Box::new(A::analyze(graph, scope)))
            .downcast_ref::<A>()
            .expect("analysis cache entry has the keyed type")
    }

    /// Cached result for `A` at `scope`, without computing.
    pub fn get_cached<A: Analysis<G>>(&self, scope: AnalysisScope<G::OpId>) -> Option<&A> {
        self.cache
            .get(&(TypeId::of::<A>(), scope))
            .and_then(|entry| entry.downcast_ref::<A>())
    }

    /// Evicts `A` at `scope`; for a [`AnalysisLocality::Global`] analysis
    /// this evicts every cached scope of `A`.
    pub fn invalidate<A: Analysis<G>>(&mut self, scope: AnalysisScope<G::OpId>) {
        let kind = TypeId::of::<A>();
        match A::LOCALITY {
            AnalysisLocality::Scoped => {
                self.cache.remove(&(kind, scope));
            }
            AnalysisLocality::Global => {
                self.cache.retain(|(cached, _), _| *cached != kind);
            }
        }
    }

    /// Evicts every entry whose kind is not in `preserved`. Called once per
    /// pass completion, before the next pass may observe the cache.
    pub fn invalidate_all_except(&mut self, preserved: &PreservedAnalyses) {
        if preserved.is_all() {
            return;
        }
        self.cache.retain(|(kind, _), _| preserved.preserves_id(*kind));
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

impl<G: ProgramGraph> Default for AnalysisManager<G> {
    fn default() -> Self {
        Self::new()
    }
}
