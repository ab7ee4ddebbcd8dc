//! Count formatting for summaries.

/// `1 error`, `3 errors`, `0 warnings`.
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
