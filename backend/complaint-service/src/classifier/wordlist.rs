//! Offline classifier backed by a sensitive word list and spam heuristics.
//!
//! Used when no remote analysis service is configured. Scores are coarse:
//! any listed word pushes profanity over the default threshold, while the
//! heuristics only raise toxicity.

use super::{AbuseClassifier, ClassifierError};
use crate::error::{ComplaintError, Result};
use crate::models::AbuseScores;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

const FIRST_HIT_SCORE: f32 = 0.75;
const EXTRA_HIT_SCORE: f32 = 0.1;
const WORD_TOXICITY: f32 = 0.3;
const HEURISTIC_TOXICITY: f32 = 0.2;

pub struct WordListClassifier {
    sensitive_words: HashSet<String>,
    punctuation: Regex,
}

impl WordListClassifier {
    /// Load one word per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ComplaintError::Config(format!(
                "Failed to load sensitive words from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let words = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect::<Vec<_>>();

        tracing::info!(count = words.len(), "Loaded sensitive word list");
        Self::from_words(words)
    }

    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sensitive_words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let punctuation = Regex::new(r"[!?؟]{4,}")
            .map_err(|e| ComplaintError::Internal(format!("punctuation pattern: {}", e)))?;

        Ok(Self {
            sensitive_words,
            punctuation,
        })
    }

    pub fn word_count(&self) -> usize {
        self.sensitive_words.len()
    }

    fn sensitive_hits(&self, normalized: &str) -> usize {
        normalized
            .unicode_words()
            .filter(|w| self.sensitive_words.contains(*w))
            .count()
    }

    /// More than 70% uppercase among at least 10 letters.
    fn has_excessive_caps(text: &str) -> bool {
        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() < 10 {
            return false;
        }
        let caps = letters.iter().filter(|c| c.is_uppercase()).count();
        caps as f32 / letters.len() as f32 > 0.7
    }

    /// A run of five or more identical characters, e.g. "hellooooo".
    fn has_repeated_chars(text: &str) -> bool {
        let mut run = 0;
        let mut previous = None;
        for c in text.chars() {
            if Some(c) == previous {
                run += 1;
                if run >= 5 {
                    return true;
                }
            } else {
                previous = Some(c);
                run = 1;
            }
        }
        false
    }

    pub fn score(&self, text: &str) -> AbuseScores {
        if text.trim().is_empty() {
            return AbuseScores::zero();
        }

        let normalized = text.to_lowercase();
        let hits = self.sensitive_hits(&normalized);

        let profanity = match hits {
            0 => 0.0,
            n => FIRST_HIT_SCORE + EXTRA_HIT_SCORE * (n - 1) as f32,
        };

        let mut toxicity = WORD_TOXICITY * hits as f32;
        if Self::has_excessive_caps(text) {
            toxicity += HEURISTIC_TOXICITY;
        }
        if Self::has_repeated_chars(text) {
            toxicity += HEURISTIC_TOXICITY;
        }
        if self.punctuation.is_match(text) {
            toxicity += HEURISTIC_TOXICITY;
        }

        if hits > 0 {
            tracing::debug!(hits, "Sensitive words matched");
        }

        AbuseScores::new(toxicity, profanity, 0.0, 0.0)
    }
}

#[async_trait]
impl AbuseClassifier for WordListClassifier {
    /// Word lists are matched regardless of language.
    async fn analyze(&self, text: &str, _language: &str) -> std::result::Result<AbuseScores, ClassifierError> {
        Ok(self.score(text))
    }
}
