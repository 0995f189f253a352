use std::env;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// The pipeline phase a status line belongs to. Every line is tagged with
/// its phase so the stderr of a long batch can be grepped per concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cache,
    Ocr,
    Columns,
    Extract,
    Normalize,
    Dataset,
    Progress,
}

impl Stage {
    fn label(self) -> &'static str {
        match self {
            Stage::Cache => "cache",
            Stage::Ocr => "ocr",
            Stage::Columns => "columns",
            Stage::Extract => "extract",
            Stage::Normalize => "normalize",
            Stage::Dataset => "dataset",
            Stage::Progress => "progress",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn init(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
    if enabled {
        info("verbose logging enabled");
    }
}

pub fn verbose_enabled() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Untagged status line for process-level messages.
pub fn info(message: impl fmt::Display) {
    eprintln!("[paper2data] {message}");
}

pub fn stage(stage: Stage, message: impl fmt::Display) {
    eprintln!("[paper2data::{stage}] {message}");
}

/// Stage-tagged line emitted only when verbose logging is on.
pub fn verbose(stage: Stage, message: impl fmt::Display) {
    if verbose_enabled() {
        eprintln!("[paper2data::{stage}] {message}");
    }
}

pub fn env_flag() -> bool {
    env::var("PAPER2DATA_VERBOSE")
        .map(|value| parse_bool(value.trim()))
        .unwrap_or(false)
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_are_lowercase_tags() {
        assert_eq!(Stage::Cache.to_string(), "cache");
        assert_eq!(Stage::Normalize.to_string(), "normalize");
    }

    #[test]
    fn env_flag_accepts_common_truthy_spellings() {
        for raw in ["1", "true", "YES", " on "] {
            assert!(parse_bool(raw), "{raw:?} should enable verbose output");
        }
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
        assert!(!parse_bool("verbose"));
    }
}
