//! String similarity for free-text matching.
//!
//! Both inputs are lowercased, turned into term-frequency vectors and
//! compared by cosine similarity. Term counts are integers, so the dot
//! product and both squared norms are exact; the only rounding happens in
//! the final division. Identical inputs therefore score exactly `1.0`.

use std::collections::BTreeMap;

/// A pure, case-insensitive similarity metric returning a score in `[0, 1]`.
pub trait Similarity {
    fn score(&self, a: &str, b: &str) -> f64;

    /// Short name recorded in run metadata.
    fn name(&self) -> String;
}

/// How a string is split into terms before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vectorizer {
    /// Maximal runs of alphanumeric characters.
    Word,
    /// Overlapping character n-grams over the whitespace-collapsed string.
    CharNgram(usize),
}

impl Vectorizer {
    fn terms(&self, input: &str) -> BTreeMap<String, u64> {
        let lowered = input.to_lowercase();
        let mut counts = BTreeMap::new();

        match *self {
            Vectorizer::Word => {
                for word in lowered
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                {
                    *counts.entry(word.to_string()).or_insert(0) += 1;
                }
            }
            Vectorizer::CharNgram(n) => {
                let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
                let chars: Vec<char> = collapsed.chars().collect();
                if chars.is_empty() {
                    return counts;
                }
                let n = n.max(1);
                if chars.len() < n {
                    counts.insert(collapsed, 1);
                    return counts;
                }
                for gram in chars.windows(n) {
                    *counts.entry(gram.iter().collect::<String>()).or_insert(0) += 1;
                }
            }
        }

        counts
    }
}

/// Cosine similarity over term-frequency vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CosineSimilarity {
    pub vectorizer: Vectorizer,
}

impl Default for CosineSimilarity {
    fn default() -> Self {
        Self {
            vectorizer: Vectorizer::Word,
        }
    }
}

impl CosineSimilarity {
    pub fn new(vectorizer: Vectorizer) -> Self {
        Self { vectorizer }
    }
}

impl Similarity for CosineSimilarity {
    fn score(&self, a: &str, b: &str) -> f64 {
        let va = self.vectorizer.terms(a);
        let vb = self.vectorizer.terms(b);

        let norm_a: u64 = va.values().map(|c| c * c).sum();
        let norm_b: u64 = vb.values().map(|c| c * c).sum();
        if norm_a == 0 || norm_b == 0 {
            return 0.0;
        }

        let dot: u64 = va
            .iter()
            .filter_map(|(term, ca)| vb.get(term).map(|cb| ca * cb))
            .sum();

        let score = dot as f64 / ((norm_a as f64) * (norm_b as f64)).sqrt();
        score.clamp(0.0, 1.0)
    }

    fn name(&self) -> String {
        match self.vectorizer {
            Vectorizer::Word => "cosine/word".into(),
            Vectorizer::CharNgram(n) => format!("cosine/char_{n}gram"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(a: &str, b: &str) -> f64 {
        CosineSimilarity::default().score(a, b)
    }

    fn bigram() -> CosineSimilarity {
        CosineSimilarity::new(Vectorizer::CharNgram(2))
    }

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(score("gold monthly", "gold monthly"), 1.0);
        assert_eq!(score("Premium 12-Month Pass", "Premium 12-Month Pass"), 1.0);
        assert_eq!(bigram().score("silver", "silver"), 1.0);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(score("Gold Plan", "gold plan"), score("gold plan", "gold plan"));
        assert_eq!(score("GOLD PLAN", "gold plan"), 1.0);
        assert_eq!(bigram().score("Gold Plan", "gold plan"), 1.0);
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(score("", "anything"), 0.0);
        assert_eq!(score("anything", ""), 0.0);
        assert_eq!(score("", ""), 0.0);
        assert_eq!(score("   ", "--"), 0.0);
        assert_eq!(bigram().score("", "anything"), 0.0);
        assert_eq!(bigram().score("anything", "   "), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("gold monthly plan", "Gold Monthly"),
            ("silver", "silver monthly annual"),
            ("abc", "abd"),
        ];
        for (a, b) in pairs {
            assert_eq!(score(a, b), score(b, a));
            assert_eq!(bigram().score(a, b), bigram().score(b, a));
        }
    }

    #[test]
    fn score_decreases_as_strings_diverge() {
        let base = "gold monthly";
        let s0 = score(base, "gold monthly");
        let s1 = score(base, "gold monthly plan");
        let s2 = score(base, "gold monthly plan extra");
        let s3 = score(base, "gold monthly plan extra special");
        assert!(s0 > s1 && s1 > s2 && s2 > s3, "{s0} {s1} {s2} {s3}");

        let b0 = bigram().score("gold", "gold");
        let b1 = bigram().score("gold", "golden");
        let b2 = bigram().score("gold", "golden hour");
        assert!(b0 > b1 && b1 > b2, "{b0} {b1} {b2}");
    }

    #[test]
    fn known_values() {
        // 2 shared words, norms 3 and 2
        let s = score("gold monthly plan", "Gold Monthly");
        assert!((s - 2.0 / 6f64.sqrt()).abs() < 1e-12);

        // 1 shared word, norms 4 and 1: exactly one half
        assert_eq!(score("a b c d", "a"), 0.5);

        assert_eq!(score("xyz completely unrelated", "Gold Monthly"), 0.0);
    }

    #[test]
    fn repeated_terms_are_weighted() {
        let once = score("gold", "gold silver");
        let twice = score("gold gold", "gold silver");
        assert!((once - twice).abs() < 1e-12);
        assert!(score("gold gold silver", "gold silver") < 1.0);
    }

    #[test]
    fn punctuation_separates_words() {
        assert_eq!(score("gold-monthly", "gold monthly"), 1.0);
        assert_eq!(score("gold/monthly (plan)", "GOLD MONTHLY PLAN"), 1.0);
    }

    #[test]
    fn short_strings_under_ngram_size() {
        let tri = CosineSimilarity::new(Vectorizer::CharNgram(3));
        assert_eq!(tri.score("ab", "ab"), 1.0);
        assert_eq!(tri.score("ab", "abc"), 0.0);
    }

    #[test]
    fn ngram_collapses_whitespace() {
        assert_eq!(bigram().score("gold   monthly", "gold monthly"), 1.0);
    }

    #[test]
    fn scorer_names() {
        assert_eq!(CosineSimilarity::default().name(), "cosine/word");
        assert_eq!(bigram().name(), "cosine/char_2gram");
    }
}
