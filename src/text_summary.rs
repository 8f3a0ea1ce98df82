//! Text output builders for one-shot CLI modes.

use crate::model::HistoryRecord;
use std::time::Duration;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Numbered caption variants, multi-line captions indented under their number.
pub(crate) fn build_results_summary(variants: &[String]) -> TextSummary {
    let mut lines = Vec::new();
    for (i, v) in variants.iter().enumerate() {
        let mut caption_lines = v.lines();
        lines.push(format!("{:>2}. {}", i + 1, caption_lines.next().unwrap_or("")));
        for rest in caption_lines {
            lines.push(format!("    {rest}"));
        }
    }
    TextSummary { lines }
}

pub(crate) fn build_history_summary(records: &[HistoryRecord]) -> TextSummary {
    let mut lines = Vec::new();
    if records.is_empty() {
        lines.push("No history yet.".to_string());
        return TextSummary { lines };
    }
    for r in records {
        let star = if r.favorite { " [favorite]" } else { "" };
        lines.push(format!("{} ({}){}", r.topic, r.id, star));
        lines.push(format!(
            "  {} | {} • {} • {}",
            r.created_at_display(),
            r.tone,
            r.platform,
            r.length
        ));
        for (idx, v) in r.variants.iter().enumerate() {
            lines.push(format!("  [{idx}] {}", v.replace('\n', " ")));
        }
    }
    TextSummary { lines }
}

/// Status line for a completed generation, e.g. "Generated 3 caption(s) in 1s 200ms".
pub(crate) fn generation_status(count: usize, elapsed: Duration) -> String {
    let rounded = Duration::from_millis(elapsed.as_millis() as u64);
    format!(
        "Generated {count} caption(s) in {}",
        humantime::format_duration(rounded)
    )
}
