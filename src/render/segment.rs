//! Splitting answers into display lines

use std::collections::HashMap;
use std::sync::Arc;

/// Split `text` on line breaks, trim each line and drop the empty ones.
pub fn segment_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Memoizes [`segment_lines`] keyed on the content text.
#[derive(Debug, Default)]
pub struct SegmentCache {
    entries: HashMap<Arc<str>, Arc<[String]>>,
}

impl SegmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&mut self, content: &Arc<str>) -> Arc<[String]> {
        if let Some(lines) = self.entries.get(content) {
            return Arc::clone(lines);
        }
        let lines: Arc<[String]> = segment_lines(content).into();
        self.entries.insert(Arc::clone(content), Arc::clone(&lines));
        lines
    }
}
