//! Structured pass events for an embedding host.
//!
//! The pipeline does not log; it emits [`PassEvent`]s through a
//! process-global sink the host installs (a CLI printing progress, a test
//! capturing reports). Without a sink, events go to stderr as JSON lines
//! when `PASSFORGE_PASS_STATS` is set, and are dropped otherwise.

use std::sync::{Mutex, OnceLock};
use std::time::SystemTime;

use serde::Serialize;

use crate::driver::GreedyRewriteResult;

#[derive(Debug, Clone, Serialize)]
pub struct PassEvent {
    pub timestamp: SystemTime,
    pub pass: String,
    pub kind: PassEventKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PassEventKind {
    PassRan { stats: PassRunStats },
    PassFailed { diagnostic: Option<String> },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PassRunStats {
    pub opt_level: u8,
    pub elapsed_micros: u128,
    pub rewrite: Option<RewriteStats>,
}

/// Serializable mirror of [`GreedyRewriteResult`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RewriteStats {
    pub iterations: usize,
    pub rewrites_applied: usize,
    pub ops_erased: usize,
    pub converged: bool,
}

impl From<GreedyRewriteResult> for RewriteStats {
    fn from(result: GreedyRewriteResult) -> Self {
        Self {
            iterations: result.iterations,
            rewrites_applied: result.rewrites_applied,
            ops_erased: result.ops_erased,
            converged: result.converged,
        }
    }
}

type PassEventSink = Box<dyn Fn(&PassEvent) + Send + Sync>;

static SINK: OnceLock<Mutex<Option<PassEventSink>>> = OnceLock::new();

fn slot() -> &'static Mutex<Option<PassEventSink>> {
    SINK.get_or_init(|| Mutex::new(None))
}

/// Installs the event sink, replacing any previous one.
pub fn set_sink<F>(sink: F)
where
    F: Fn(&PassEvent) + Send + Sync + 'static,
{
    *slot().lock().expect("pass event sink lock") = Some(Box::new(sink));
}

pub fn clear_sink() {
    *slot().lock().expect("pass event sink lock") = None;
}

pub fn sink_installed() -> bool {
    slot().lock().expect("pass event sink lock").is_some()
}

pub fn emit_pass_event(event: PassEvent) {
    let slot = slot().lock().expect("pass event sink lock");
    if let Some(sink) = slot.as_ref() {
        sink(&event);
    } else if crate::env::pass_stats_enabled() {
        if let Ok(line) = serde_json::to_string(&event) {
            eprintln!("{line}");
        }
    }
}
