//! Text edits collected against one buffer and applied in a single pass.
//!
//! Rewriters first describe what to change as `(range, replacement)` pairs; the
//! list is validated (no overlaps, same-length when required) and applied from the
//! last edit to the first so earlier offsets stay valid.

use std::ops::Range;

use anyhow::Result;

use crate::errors::BuildError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn new(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// Replacement left-padded with spaces to the span's exact length.
    ///
    /// Fails when the replacement is longer than the span, since the output could
    /// no longer line up with existing source maps.
    pub fn same_length(range: Range<usize>, replacement: &str) -> Result<Self> {
        let span_len = range.end - range.start;
        if replacement.len() > span_len {
            return Err(BuildError::ReplacementTooLong {
                start: range.start,
                end: range.end,
                replacement_len: replacement.len(),
            }
            .into());
        }
        let padded = " ".repeat(span_len - replacement.len()) + replacement;
        Ok(Self::new(range, padded))
    }

    /// Same-length blanking of a span. Newlines are kept so line numbers survive.
    pub fn blank(range: Range<usize>, original: &str) -> Self {
        let blanked: String = original
            .chars()
            .map(|c| if c == '\n' || c == '\r' { c } else { ' ' })
            .collect();
        // Multi-byte characters would shrink to one space each; pad back up.
        let padded = blanked.clone() + " ".repeat(original.len() - blanked.len()).as_str();
        Self::new(range, padded)
    }

    pub fn preserves_length(&self) -> bool {
        self.replacement.len() == self.range.end - self.range.start
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    pub fn preserves_length(&self) -> bool {
        self.edits.iter().all(Edit::preserves_length)
    }

    /// Sorts edits by position and rejects overlapping ranges.
    fn validated(mut self) -> Result<Vec<Edit>> {
        self.edits.sort_by_key(|e| (e.range.start, e.range.end));
        for pair in self.edits.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if second.range.start < first.range.end {
                return Err(BuildError::OverlappingEdits {
                    first_start: first.range.start,
                    first_end: first.range.end,
                    second_start: second.range.start,
                    second_end: second.range.end,
                }
                .into());
            }
        }
        Ok(self.edits)
    }

    /// Applies every edit to `text`, last to first.
    pub fn apply(self, text: &str) -> Result<String> {
        let edits = self.validated()?;
        let mut output = text.to_string();
        for edit in edits.iter().rev() {
            output.replace_range(edit.range.clone(), &edit.replacement);
        }
        Ok(output)
    }
}
