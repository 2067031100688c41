//! Sparse lexical vectorizer: the fallback similarity representation when no
//! dense embedding provider is available.
//!
//! TF-IDF with smoothed idf and L2-normalized rows. Weights are
//! non-negative, so cosine scores land in [0, 1] in practice.

use std::collections::HashMap;

/// A sparse term-weighted vector: (term index, weight) pairs sorted by
/// term index.
pub type SparseVector = Vec<(usize, f32)>;

/// Common English words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "if", "in", "include", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no",
    "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

/// Lexical TF-IDF vectorizer.
///
/// Must be fit on the reference corpus before the first transform and again
/// whenever the corpus changes composition; terms unseen at fit time
/// contribute zero weight when transforming.
#[derive(Debug, Clone, Default)]
pub struct LexicalProvider {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl LexicalProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the vocabulary on `corpus` and return one row vector per text,
    /// aligned with the input order.
    pub fn fit_transform(&mut self, corpus: &[String]) -> Vec<SparseVector> {
        self.vocabulary.clear();
        self.idf.clear();

        let tokenized: Vec<Vec<String>> = corpus.iter().map(|text| tokenize(text)).collect();

        // Vocabulary in first-seen order; document frequency per term.
        let mut doc_freq: Vec<usize> = Vec::new();
        for tokens in &tokenized {
            let mut seen: Vec<usize> = Vec::new();
            for token in tokens {
                let next_index = self.vocabulary.len();
                let index = *self
                    .vocabulary
                    .entry(token.clone())
                    .or_insert_with(|| {
                        doc_freq.push(0);
                        next_index
                    });
                if !seen.contains(&index) {
                    seen.push(index);
                    doc_freq[index] += 1;
                }
            }
        }

        // Smoothed idf, as if one extra document contained every term.
        let n = corpus.len() as f32;
        self.idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        tokenized
            .iter()
            .map(|tokens| self.weigh(tokens))
            .collect()
    }

    /// Project `text` into the fitted vocabulary space.
    #[must_use]
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&tokenize(text))
    }

    /// Number of terms in the fitted vocabulary
    #[must_use]
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();
        vector.sort_unstable_by_key(|&(index, _)| index);

        let norm = vector.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for entry in &mut vector {
                entry.1 /= norm;
            }
        }
        vector
    }
}

/// Lowercase alphanumeric tokens of two or more characters, stop words
/// removed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Dot product of two sparse vectors sorted by term index.
///
/// Rows coming out of the vectorizer are L2-normalized, so this is their
/// cosine similarity.
#[must_use]
pub fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut sum = 0.0;
    let mut ia = 0;
    let mut ib = 0;
    while ia < a.len() && ib < b.len() {
        match a[ia].0.cmp(&b[ib].0) {
            std::cmp::Ordering::Less => ia += 1,
            std::cmp::Ordering::Greater => ib += 1,
            std::cmp::Ordering::Equal => {
                sum += a[ia].1 * b[ib].1;
                ia += 1;
                ib += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn test_rows_are_normalized() {
        let mut provider = LexicalProvider::new();
        let rows = provider.fit_transform(&corpus(&[
            "kubernetes runs containers",
            "cats chase mice",
        ]));
        for row in &rows {
            let norm = row.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_unseen_terms_contribute_zero() {
        let mut provider = LexicalProvider::new();
        provider.fit_transform(&corpus(&["kubernetes runs containers"]));
        let query = provider.transform("zeppelin flight");
        assert!(query.is_empty());
    }

    #[test]
    fn test_stop_words_are_excluded() {
        let mut provider = LexicalProvider::new();
        provider.fit_transform(&corpus(&["the cat and the hat"]));
        assert_eq!(provider.vocabulary_len(), 2); // cat, hat
    }

    #[test]
    fn test_self_similarity_is_one() {
        let mut provider = LexicalProvider::new();
        let rows = provider.fit_transform(&corpus(&["rust borrow checker"]));
        let query = provider.transform("rust borrow checker");
        assert!((sparse_dot(&rows[0], &query) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        let mut provider = LexicalProvider::new();
        let rows = provider.fit_transform(&corpus(&["alpha beta", "gamma delta"]));
        assert_eq!(sparse_dot(&rows[0], &rows[1]), 0.0);
    }

    #[test]
    fn test_query_prefers_matching_document() {
        let mut provider = LexicalProvider::new();
        let rows = provider.fit_transform(&corpus(&[
            "kubernetes orchestrates containers across nodes",
            "cats sleep most afternoons",
        ]));
        let query = provider.transform("what is kubernetes");
        assert!(sparse_dot(&rows[0], &query) > sparse_dot(&rows[1], &query));
        assert!(sparse_dot(&rows[0], &query) > 0.0);
    }

    #[test]
    fn test_refit_replaces_vocabulary() {
        let mut provider = LexicalProvider::new();
        provider.fit_transform(&corpus(&["alpha beta"]));
        provider.fit_transform(&corpus(&["gamma delta"]));
        assert!(provider.transform("alpha").is_empty());
        assert!(!provider.transform("gamma").is_empty());
    }
}
