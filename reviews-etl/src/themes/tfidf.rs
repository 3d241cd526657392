//! Corpus-level salient term ranking
//!
//! TF-IDF over unigrams and bigrams with smooth IDF
//! `ln((1 + n) / (1 + df)) + 1`, raw counts as TF and per-document L2
//! normalization. The vocabulary is capped to the highest-variance terms, then
//! terms are ranked by mean weight across all documents.

use reviews_common::text;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Vocabulary cap applied before ranking
pub const MAX_FEATURES: usize = 500;

/// Term with its mean TF-IDF weight across the corpus
#[derive(Debug, Clone, PartialEq)]
pub struct SalientTerm {
    pub term: String,
    pub score: f64,
}

/// Top `top_k` terms of `corpus` by mean TF-IDF weight, descending
pub fn salient_terms<S: AsRef<str>>(corpus: &[S], top_k: usize) -> Vec<SalientTerm> {
    let n_docs = corpus.len();
    if n_docs == 0 || top_k == 0 {
        return Vec::new();
    }

    let counts: Vec<HashMap<String, f64>> = corpus
        .iter()
        .map(|doc| {
            let mut tf = HashMap::new();
            for term in text::unigrams_and_bigrams(doc.as_ref()) {
                *tf.entry(term).or_insert(0.0) += 1.0;
            }
            tf
        })
        .collect();

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for doc in &counts {
        for term in doc.keys() {
            *doc_freq.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let n = n_docs as f64;
    let idf: HashMap<&str, f64> = doc_freq
        .iter()
        .map(|(term, &df)| (*term, ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
        .collect();

    // Sum and sum of squares of normalized weights per term
    let mut sums: HashMap<&str, (f64, f64)> = HashMap::new();
    for doc in &counts {
        let weights: Vec<(&str, f64)> = doc
            .iter()
            .map(|(term, &tf)| (term.as_str(), tf * idf[term.as_str()]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (term, w) in weights {
            let w = w / norm;
            let entry = sums.entry(term).or_insert((0.0, 0.0));
            entry.0 += w;
            entry.1 += w * w;
        }
    }

    let mut stats: Vec<(&str, f64, f64)> = sums
        .into_iter()
        .map(|(term, (sum, sum_sq))| {
            let mean = sum / n;
            let variance = (sum_sq / n - mean * mean).max(0.0);
            (term, mean, variance)
        })
        .collect();

    stats.sort_by(|a, b| desc(a.2, b.2).then_with(|| a.0.cmp(b.0)));
    stats.truncate(MAX_FEATURES);

    stats.sort_by(|a, b| desc(a.1, b.1).then_with(|| a.0.cmp(b.0)));
    stats
        .into_iter()
        .take(top_k)
        .map(|(term, mean, _)| SalientTerm {
            term: term.to_string(),
            score: mean,
        })
        .collect()
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_corpus() {
        let corpus: Vec<String> = Vec::new();
        assert!(salient_terms(&corpus, 10).is_empty());
    }

    #[test]
    fn test_frequent_term_ranks_first() {
        let corpus = [
            "transfer failed again",
            "transfer slow",
            "transfer works",
            "nice colours",
        ];
        let terms = salient_terms(&corpus, 3);

        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].term, "transfer");
        assert!(terms.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_bigrams_and_stopwords() {
        let corpus = ["the login page is broken", "login page broken again"];
        let terms: Vec<String> = salient_terms(&corpus, 50).into_iter().map(|t| t.term).collect();

        assert!(terms.contains(&"login page".to_string()));
        assert!(!terms.iter().any(|t| t == "the" || t == "is"));
    }

    #[test]
    fn test_top_k_truncates() {
        let corpus = ["alpha beta gamma delta epsilon"];
        assert_eq!(salient_terms(&corpus, 2).len(), 2);
    }
}
