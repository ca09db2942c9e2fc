//! Guessing which candidate an answer recommends.

use retrieval::Candidate;

/// First candidate (in candidate order) whose title appears in `answer`,
/// compared case-insensitively; otherwise the first candidate.
///
/// `None` only when there are no candidates.
pub fn resolve_title(answer: &str, candidates: &[Candidate]) -> Option<String> {
    let haystack = answer.to_lowercase();
    candidates
        .iter()
        .find(|c| haystack.contains(&c.title.to_lowercase()))
        .or_else(|| candidates.first())
        .map(|c| c.title.clone())
}
