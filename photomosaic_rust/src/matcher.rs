use crate::histogram::Histogram;

/// Winning candidate for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub similarity: f64,
}

/// Pearson correlation between two fingerprints over all bins, in `[-1, 1]`.
///
/// A constant fingerprint (all-zero included) has no variance; its
/// correlation with anything is reported as `0.0`.
pub fn similarity(t: &Histogram, c: &Histogram) -> f64 {
    debug_assert_eq!(t.len(), c.len(), "fingerprints must share bin dimensions");
    let (t, c) = (t.counts(), c.counts());
    let n = t.len() as f64;
    let mean_t = t.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_c = c.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut num = 0.0;
    let mut var_t = 0.0;
    let mut var_c = 0.0;
    for (&a, &b) in t.iter().zip(c) {
        let dt = a as f64 - mean_t;
        let dc = b as f64 - mean_c;
        num += dt * dc;
        var_t += dt * dt;
        var_c += dc * dc;
    }
    let denom = var_t * var_c;
    if denom <= 0.0 { return 0.0; }
    num / denom.sqrt()
}

/// Best candidate for `target`.
///
/// The running best starts at index 0 with similarity 0.0 and is replaced only
/// by a strictly greater score: ties keep the earliest index, and when no
/// candidate correlates positively index 0 is chosen. `None` only if
/// `candidates` is empty.
pub fn best_match(target: &Histogram, candidates: &[Histogram]) -> Option<Match> {
    if candidates.is_empty() { return None; }
    let mut best = Match { index: 0, similarity: 0.0 };
    for (i, cand) in candidates.iter().enumerate() {
        let sim = similarity(target, cand);
        if sim > best.similarity {
            best = Match { index: i, similarity: sim };
        }
    }
    Some(best)
}
