//! Brute-force Hamming matching between the descriptor sets of two frames.
//!
//! A query descriptor is matched to its nearest train descriptor only when the
//! match is close in absolute terms, clearly better than the runner-up (ratio
//! test) and, optionally, mutual (cross-check).

use pano_brief::hamming_distance;
use pano_core::Descriptor;
use rayon::prelude::*;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hypothesised match between keypoint `query` of one frame and `train` of the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    pub query: usize,
    pub train: usize,
    /// Hamming distance, lower is better
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchConfig {
    /// Largest accepted Hamming distance
    pub max_distance: u32,
    /// Best distance must be below `ratio` times the second best
    pub ratio: f32,
    /// Require the match to be nearest in both directions
    pub cross_check: bool,
    /// Fewer surviving matches than this makes the pair unalignable
    pub min_matches: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_distance: 64,
            ratio: 0.8,
            cross_check: true,
            min_matches: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("too few confident matches: found {found}, need {needed}")]
    TooFewMatches { found: usize, needed: usize },
}

/// Nearest neighbour with its distance and the runner-up distance
#[derive(Debug, Clone, Copy)]
struct Nearest {
    index: usize,
    best: u32,
    second: Option<u32>,
}

fn nearest(needle: &Descriptor, haystack: &[Descriptor]) -> Option<Nearest> {
    let mut result: Option<Nearest> = None;
    for (index, candidate) in haystack.iter().enumerate() {
        let d = hamming_distance(needle, candidate);
        result = Some(match result {
            None => Nearest { index, best: d, second: None },
            // Strict comparison keeps the lowest index on ties
            Some(n) if d < n.best => Nearest { index, best: d, second: Some(n.best) },
            Some(n) => Nearest { second: Some(n.second.map_or(d, |s| s.min(d))), ..n },
        });
    }
    result
}

/// Match every `query` descriptor against `train`; output is sorted by query index.
pub fn match_descriptors(query: &[Descriptor], train: &[Descriptor], cfg: &MatchConfig) -> Vec<Correspondence> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let reverse: Vec<usize> = if cfg.cross_check {
        train
            .par_iter()
            .map(|d| nearest(d, query).map_or(usize::MAX, |n| n.index))
            .collect()
    } else {
        Vec::new()
    };

    query
        .par_iter()
        .enumerate()
        .filter_map(|(qi, d)| {
            let n = nearest(d, train)?;
            if n.best > cfg.max_distance {
                return None;
            }
            if let Some(second) = n.second {
                if n.best as f32 >= cfg.ratio * second as f32 {
                    return None;
                }
            }
            if cfg.cross_check && reverse[n.index] != qi {
                return None;
            }
            Some(Correspondence { query: qi, train: n.index, distance: n.best })
        })
        .collect()
}

/// [`match_descriptors`] plus the minimum-count check that decides alignability
pub fn match_pair(query: &[Descriptor], train: &[Descriptor], cfg: &MatchConfig) -> Result<Vec<Correspondence>, MatchError> {
    let matches = match_descriptors(query, train, cfg);
    if matches.len() < cfg.min_matches {
        return Err(MatchError::TooFewMatches { found: matches.len(), needed: cfg.min_matches });
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_descriptors(n: usize, seed: u64) -> Vec<Descriptor> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen::<[u8; 32]>()).collect()
    }

    /// Flip `bits` distinct bits of `d`
    fn perturb(d: &Descriptor, bits: usize) -> Descriptor {
        let mut out = *d;
        for i in 0..bits {
            let bit = i * 7 % 256;
            out[bit / 8] ^= 1 << (bit % 8);
        }
        out
    }

    #[test]
    fn test_identical_sets_match_one_to_one() {
        let a = random_descriptors(50, 1);
        let matches = match_descriptors(&a, &a, &MatchConfig::default());
        assert_eq!(matches.len(), 50);
        for (i, m) in matches.iter().enumerate() {
            assert_eq!((m.query, m.train, m.distance), (i, i, 0));
        }
    }

    #[test]
    fn test_shuffled_and_noisy_matches_are_recovered() {
        let a = random_descriptors(40, 2);
        let b: Vec<Descriptor> = a.iter().rev().map(|d| perturb(d, 10)).collect();
        let matches = match_descriptors(&a, &b, &MatchConfig::default());
        assert_eq!(matches.len(), 40);
        for m in &matches {
            assert_eq!(m.train, 39 - m.query);
            assert_eq!(m.distance, 10);
        }
    }

    #[test]
    fn test_ratio_test_rejects_ambiguous_matches() {
        let base = random_descriptors(1, 3)[0];
        let train = vec![perturb(&base, 4), perturb(&base, 5)];
        let cfg = MatchConfig { cross_check: false, ..MatchConfig::default() };
        assert!(match_descriptors(&[base], &train, &cfg).is_empty());

        let train = vec![perturb(&base, 4), random_descriptors(1, 4)[0]];
        assert_eq!(match_descriptors(&[base], &train, &cfg).len(), 1);
    }

    #[test]
    fn test_duplicate_train_descriptors_are_ambiguous() {
        let d = random_descriptors(1, 5)[0];
        let cfg = MatchConfig { cross_check: false, ..MatchConfig::default() };
        assert!(match_descriptors(&[d], &[d, d], &cfg).is_empty());
        // A lone candidate only faces the absolute test
        assert_eq!(match_descriptors(&[d], &[d], &cfg).len(), 1);
    }

    #[test]
    fn test_max_distance_rejects_unrelated_descriptors() {
        let a = random_descriptors(30, 6);
        let b = random_descriptors(30, 7);
        let matches = match_descriptors(&a, &b, &MatchConfig::default());
        assert!(matches.is_empty());
    }

    #[test]
    fn test_cross_check_requires_mutual_nearest() {
        let base = random_descriptors(1, 8)[0];
        let query = vec![perturb(&base, 2), perturb(&base, 20)];
        let train = vec![base];
        let cfg = MatchConfig { cross_check: true, ..MatchConfig::default() };
        let matches = match_descriptors(&query, &train, &cfg);
        assert_eq!(matches, vec![Correspondence { query: 0, train: 0, distance: 2 }]);

        let cfg = MatchConfig { cross_check: false, ..cfg };
        assert_eq!(match_descriptors(&query, &train, &cfg).len(), 2);
    }

    #[test]
    fn test_match_pair_enforces_minimum() {
        let a = random_descriptors(5, 9);
        let result = match_pair(&a, &a, &MatchConfig::default());
        assert_eq!(result, Err(MatchError::TooFewMatches { found: 5, needed: 8 }));

        let a = random_descriptors(12, 10);
        assert_eq!(match_pair(&a, &a, &MatchConfig::default()).unwrap().len(), 12);
    }

    #[test]
    fn test_empty_inputs() {
        let a = random_descriptors(3, 11);
        assert!(match_descriptors(&a, &[], &MatchConfig::default()).is_empty());
        assert!(match_descriptors(&[], &a, &MatchConfig::default()).is_empty());
    }
}
