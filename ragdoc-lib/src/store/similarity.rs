use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction. A zero
/// magnitude on either side yields 0.0. Orthogonal vectors score `+0.0`,
/// never `-0.0`, so equal scores stay equal under `total_cmp`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // adding +0.0 turns -0.0 into +0.0
    dot / (norm_a * norm_b) + 0.0
}

/// A scored candidate, ordered so that "better" compares greater: higher
/// score first, then lexicographically smaller identity.
#[derive(Debug, Clone)]
pub struct Scored<'a> {
    pub identity: &'a str,
    pub score: f32,
}

impl PartialEq for Scored<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored<'_> {}

impl PartialOrd for Scored<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.identity.cmp(self.identity))
    }
}

/// Keep the best `k` candidates, returned best first.
///
/// Uses a min-heap of size `k`, so memory stays bounded by `k` rather than
/// by the number of candidates.
pub fn top_k<'a, I>(candidates: I, k: usize) -> Vec<Scored<'a>>
where
    I: IntoIterator<Item = Scored<'a>>,
{
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Scored<'a>>> = BinaryHeap::with_capacity(k + 1);
    for candidate in candidates {
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if heap.peek().is_some_and(|Reverse(worst)| candidate > *worst) {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    // ascending Reverse order is descending candidate order
    heap.into_sorted_vec().into_iter().map(|Reverse(s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(identity: &str, score: f32) -> Scored<'_> {
        Scored { identity, score }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let zero = vec![0.0, 0.0];
        let a = vec![3.0, 4.0];
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_is_positive_zero() {
        let q = vec![-1.0, 0.0];
        let down = cosine_similarity(&q, &[0.0, -5.0]);
        let up = cosine_similarity(&q, &[0.0, 5.0]);
        assert!(down.is_sign_positive());
        assert!(up.is_sign_positive());
        assert_eq!(down.total_cmp(&up), Ordering::Equal);
    }

    #[test]
    fn test_top_k_orthogonal_ties_by_identity() {
        let q = vec![-1.0, 0.0];
        let candidates = vec![
            scored("b", cosine_similarity(&q, &[0.0, 5.0])),
            scored("a", cosine_similarity(&q, &[0.0, -5.0])),
        ];

        let ids: Vec<&str> = top_k(candidates, 2).iter().map(|s| s.identity).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_cosine_similarity_scale_invariant() {
        let a = vec![1.0, 2.0];
        let b = vec![10.0, 20.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_orders_and_bounds() {
        let candidates = vec![
            scored("c", 0.1),
            scored("a", 0.9),
            scored("d", -0.5),
            scored("b", 0.5),
        ];

        let best = top_k(candidates, 3);
        let ids: Vec<&str> = best.iter().map(|s| s.identity).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_top_k_ties_by_identity() {
        let candidates = vec![scored("z", 0.5), scored("m", 0.5), scored("a", 0.5)];

        let ids: Vec<&str> = top_k(candidates.clone(), 3).iter().map(|s| s.identity).collect();
        assert_eq!(ids, vec!["a", "m", "z"]);

        // the cut keeps the smallest identities among equals
        let ids: Vec<&str> = top_k(candidates, 2).iter().map(|s| s.identity).collect();
        assert_eq!(ids, vec!["a", "m"]);
    }

    #[test]
    fn test_top_k_zero() {
        assert!(top_k(vec![scored("a", 1.0)], 0).is_empty());
    }

    #[test]
    fn test_top_k_larger_than_input() {
        assert_eq!(top_k(vec![scored("a", 1.0)], 10).len(), 1);
    }
}
