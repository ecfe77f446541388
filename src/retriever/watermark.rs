//! Pull-category cursor tracking.

use std::cmp::Ordering;

/// Cursor over the item identifiers a pull category has already dispatched.
///
/// Identifiers compare length-first, then lexicographically. That orders plain
/// decimal identifiers numerically ("9" before "10") and fixed-width tokens
/// lexicographically, matching the remote contract of batches returned
/// oldest-first with ascending identifiers.
#[derive(Debug, Clone, Default)]
pub struct Watermark {
    last: Option<String>,
}

impl Watermark {
    /// Start below every identifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `id` lies beyond the current position.
    pub fn admits(&self, id: &str) -> bool {
        match &self.last {
            None => true,
            Some(last) => compare_ids(id, last) == Ordering::Greater,
        }
    }

    /// Move the cursor past `id`. Identifiers at or below the cursor are
    /// ignored.
    pub fn advance(&mut self, id: &str) {
        if self.admits(id) {
            self.last = Some(id.to_owned());
        }
    }

    /// Identifier of the last admitted item, if any.
    pub fn position(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

/// Length-first identifier ordering.
fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
