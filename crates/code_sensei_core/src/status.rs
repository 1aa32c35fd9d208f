//! crates/code_sensei_core/src/status.rs
//!
//! Formats the editor status-bar text for the authorship ratio.

use crate::domain::AuthorshipCounters;

/// Returns the status-bar text, or `None` while there is nothing to report
/// and the item should be hidden.
pub fn status_text(counters: &AuthorshipCounters) -> Option<String> {
    counters
        .ratio()
        .map(|ratio| format!("✍️ Hand-Written: {:.1}%", ratio * 100.0))
}
