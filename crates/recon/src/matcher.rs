use crate::model::{Candidate, CatalogEntry, ReconRecord};
use crate::similarity::Similarity;

/// Scan the whole catalog and return the best-scoring entry for `record`.
///
/// Linear scan, no pruning. A later entry replaces the running best only on
/// a strictly greater score, so the first entry wins ties. An empty catalog
/// yields no entry and a score of zero.
pub fn best_match<'a, S: Similarity + ?Sized>(
    record: &ReconRecord,
    catalog: &'a [CatalogEntry],
    scorer: &S,
) -> Candidate<'a> {
    let mut best: Option<(&'a CatalogEntry, f64)> = None;

    for entry in catalog {
        let score = scorer.score(&record.free_text, &entry.label);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((entry, score)),
        }
    }

    match best {
        Some((entry, score)) => Candidate {
            entry: Some(entry),
            score,
        },
        None => Candidate {
            entry: None,
            score: 0.0,
        },
    }
}
