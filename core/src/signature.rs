use std::collections::{HashMap, HashSet};

use crate::tokenizer::tokenize;

/// Token -> number of distinct captions containing it. Built in one pass over
/// the whole corpus, read-only afterwards; shared by every signature
/// extraction.
#[derive(Debug, Clone, Default)]
pub struct DocumentFrequencies {
    counts: HashMap<String, u32>,
    num_captions: u32,
}

impl DocumentFrequencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every token of `text` once, regardless of how many times it
    /// occurs within the caption.
    pub fn add_caption(&mut self, text: &str) {
        let mut seen: HashSet<String> = HashSet::new();
        for token in tokenize(text) {
            if seen.insert(token.clone()) {
                *self.counts.entry(token).or_insert(0) += 1;
            }
        }
        self.num_captions += 1;
    }

    /// Document frequency of `token`. Tokens never seen in the corpus report
    /// a frequency of 1; the table is built from every caption, so this only
    /// happens for text from outside the corpus.
    pub fn get(&self, token: &str) -> u32 {
        self.counts.get(token).copied().unwrap_or(1)
    }

    /// Informativeness score: ln(1 / df). Higher means rarer.
    pub fn score(&self, token: &str) -> f64 {
        (1.0 / f64::from(self.get(token))).ln()
    }

    pub fn num_tokens(&self) -> usize {
        self.counts.len()
    }

    pub fn num_captions(&self) -> u32 {
        self.num_captions
    }
}

/// Reduce caption text to its signature: the deduplicated token set ordered
/// by ascending informativeness (common tokens first), so that trie prefixes
/// start with the vocabulary captions share. `reverse` flips the order to
/// rarest-first. Ties are broken by token identity to keep signatures
/// deterministic.
pub fn extract_signature(text: &str, dfs: &DocumentFrequencies, reverse: bool) -> Vec<String> {
    let tokens: HashSet<String> = tokenize(text).into_iter().collect();
    let mut signature: Vec<String> = tokens.into_iter().collect();

    signature.sort_by(|a, b| {
        let (sa, sb) = (dfs.score(a), dfs.score(b));
        let by_score = if reverse {
            sb.total_cmp(&sa)
        } else {
            sa.total_cmp(&sb)
        };
        by_score.then_with(|| a.cmp(b))
    });

    signature
}
