//! Vector distance and ranking.

use rayon::prelude::*;

/// Cosine distance (`1 - cosine similarity`), in `[0, 2]`.
///
/// A zero vector has no direction; it is treated as unrelated to everything
/// (distance 1.0).
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank indexed vectors by distance to `query`.
///
/// Returns up to `top_k` `(position, distance)` pairs, nearest first. Equal
/// distances keep index order. Entries farther than `max_distance` (when
/// set) and non-finite distances are dropped.
pub fn rank_by_distance(
    query: &[f32],
    vectors: &[Vec<f32>],
    top_k: usize,
    max_distance: Option<f32>,
) -> Vec<(usize, f32)> {
    if top_k == 0 {
        return Vec::new();
    }

    // Indexed parallel iterators collect in input order
    let mut scored: Vec<(usize, f32)> = vectors
        .par_iter()
        .enumerate()
        .map(|(position, vector)| (position, cosine_distance(query, vector)))
        .filter(|(_, distance)| distance.is_finite())
        .filter(|(_, distance)| max_distance.is_none_or(|max| *distance <= max))
        .collect();

    // Stable sort, so ties stay in catalog order
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(top_k);
    scored
}
