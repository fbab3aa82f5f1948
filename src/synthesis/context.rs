//! Short-term session context for free-form prompts.

use super::prompts::{CONTEXT_END, CONTEXT_START};
use crate::vault::SessionEntry;

/// Most recent entries included in the block.
pub const MAX_CONTEXT_ENTRIES: usize = 10;
/// Characters of each entry's text kept in the block.
pub const MAX_ENTRY_CHARS: usize = 80;

/// Render `HH:MM [type] text` lines for the last [`MAX_CONTEXT_ENTRIES`]
/// entries between the context markers. Empty input gives an empty string.
/// Entries with no text are left out.
pub fn render_session_context(entries: &[SessionEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let start = entries.len().saturating_sub(MAX_CONTEXT_ENTRIES);
    let mut lines = vec![CONTEXT_START.to_string()];
    for entry in &entries[start..] {
        if entry.text.is_empty() {
            continue;
        }
        let text: String = entry.text.chars().take(MAX_ENTRY_CHARS).collect();
        lines.push(format!("{} [{}] {}", entry.ts.format("%H:%M"), entry.kind, text));
    }
    lines.push(format!("{CONTEXT_END}\n\n"));
    lines.join("\n")
}
