use crate::foundation::error::{ReelError, ReelResult};

/// One timed caption unit.
///
/// `start`/`end` are millisecond offsets from the beginning of the audio track.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Word {
    /// Entrance time in milliseconds.
    pub start: u64,
    /// Exit time in milliseconds.
    pub end: u64,
    /// Caption text.
    pub text: String,
    /// Render with the highlight color.
    #[serde(default)]
    pub is_hl: bool,
}

impl Word {
    /// Convenience constructor used by tests and builders.
    pub fn new(start: u64, end: u64, text: impl Into<String>, is_hl: bool) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            is_hl,
        }
    }
}

/// Largest accepted `start`/`end`. Hold arithmetic is signed.
pub const MAX_TIMESTAMP_MS: u64 = i64::MAX as u64;

/// Immutable ordered word sequence driving one render job.
///
/// Non-empty by construction. Ordering by `start` and `end >= start` are assumed, not enforced:
/// negative holds that fall out of malformed windows are clamped at capture time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordTimeline {
    words: Vec<Word>,
}

impl WordTimeline {
    /// Build a timeline, rejecting an empty word list and timestamps above
    /// [`MAX_TIMESTAMP_MS`].
    pub fn new(words: Vec<Word>) -> ReelResult<Self> {
        if words.is_empty() {
            return Err(ReelError::validation(
                "word list is empty; a job needs at least one word",
            ));
        }
        if let Some((i, w)) = words
            .iter()
            .enumerate()
            .find(|(_, w)| w.start > MAX_TIMESTAMP_MS || w.end > MAX_TIMESTAMP_MS)
        {
            return Err(ReelError::validation(format!(
                "words[{i}] timestamp out of range (start {}, end {}, max {MAX_TIMESTAMP_MS})",
                w.start, w.end
            )));
        }
        Ok(Self { words })
    }

    /// Parse the inbound `word_json` payload: `{"words": [{start, end, text, is_hl}, ...]}`.
    pub fn from_word_json(word_json: &str) -> ReelResult<Self> {
        let value: serde_json::Value = serde_json::from_str(word_json)
            .map_err(|e| ReelError::validation(format!("word_json is not valid JSON: {e}")))?;
        let Some(list) = value.get("words").and_then(|w| w.as_array()) else {
            return Err(ReelError::validation("word_json field 'words' must be a list"));
        };

        let mut words = Vec::with_capacity(list.len());
        for (i, item) in list.iter().enumerate() {
            let word: Word = serde_json::from_value(item.clone())
                .map_err(|e| ReelError::validation(format!("words[{i}] is malformed: {e}")))?;
            words.push(word);
        }
        Self::new(words)
    }

    /// Read and parse a word payload from disk.
    pub fn from_path(path: &std::path::Path) -> ReelResult<Self> {
        use anyhow::Context as _;
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read word file '{}'", path.display()))?;
        Self::from_word_json(&raw)
    }

    /// Borrow the words in order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/word.rs"]
mod tests;
