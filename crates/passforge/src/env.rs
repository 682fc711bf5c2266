use std::env;
use std::sync::OnceLock;

static PASS_STATS: OnceLock<bool> = OnceLock::new();

fn parse_bool(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
}

/// `PASSFORGE_PASS_STATS` forces per-pass stat events out even when no sink
/// is installed (they go to stderr as JSON lines).
pub(crate) fn pass_stats_enabled() -> bool {
    *PASS_STATS.get_or_init(|| match env::var("PASSFORGE_PASS_STATS") {
        Ok(value) if !value.trim().is_empty() => parse_bool(&value),
        _ => false,
    })
}
