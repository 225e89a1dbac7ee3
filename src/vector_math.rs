use std::cmp::Ordering;

/// Cosine similarity of two equal-length vectors. Zero vectors score 0.
pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> f32 {
    if query.len() != candidate.len() || query.is_empty() {
        return 0.0;
    }

    let dot: f64 = query
        .iter()
        .zip(candidate.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_q: f64 = query.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_c: f64 = candidate.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_q <= f64::EPSILON || norm_c <= f64::EPSILON {
        return 0.0;
    }

    (dot / (norm_q * norm_c)).clamp(-1.0, 1.0) as f32
}

/// Indices and scores ordered by descending similarity. The sort is stable,
/// so equal scores keep candidate order.
pub fn rank_descending_by_cosine<'a, I, C>(query: &[f32], candidates: I) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a C>,
    C: AsRef<[f32]> + 'a + ?Sized,
{
    let mut scores: Vec<(usize, f32)> = candidates
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| (idx, cosine_similarity(query, candidate.as_ref())))
        .collect();

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    scores
}
