//! Roulette-wheel and uniform draws.

use knobel_core::{Choice, ChoiceSet, ScoreEntry};
use rand::Rng;
use std::time::Duration;

/// Draws one id with probability proportional to its clamped score.
///
/// Negative scores are clamped to 0 so a hostile weighting cannot invert the
/// distribution. Returns `None` when the clamped total is zero; the caller
/// must surface that as "no usable weighting", not pick a default.
pub fn pick_weighted(scores: &[ScoreEntry], rng: &mut impl Rng) -> Option<String> {
    let clamped: Vec<i64> = scores.iter().map(|e| e.score.max(0)).collect();
    if scores.iter().any(|e| e.score < 0) {
        warn_negative();
    }
    let total: i64 = clamped.iter().sum();
    if total <= 0 {
        return None;
    }
    let roll = rng.gen_range(0..total);
    let mut acc = 0i64;
    for (entry, weight) in scores.iter().zip(clamped) {
        acc += weight;
        if roll < acc {
            return Some(entry.id.clone());
        }
    }
    // Unreachable for total > 0; keep the last id as a guard.
    scores.last().map(|e| e.id.clone())
}

/// Uniform draw over the choice set; the plain (non-AI) modes use this.
pub fn pick_uniform<'a>(set: &'a ChoiceSet, rng: &mut impl Rng) -> &'a Choice {
    &set.choices()[rng.gen_range(0..set.len())]
}

/// How long the "thinking" animation runs before a plain draw resolves.
/// 1700 ms plus up to 1200 ms of jitter, as in the original pacing.
pub fn suspense_duration(rng: &mut impl Rng) -> Duration {
    Duration::from_millis(1700 + rng.gen_range(0..1200))
}

fn warn_negative() {
    #[cfg(feature = "telemetry")]
    tracing::warn!("negative score clamped to 0 before sampling");
    #[cfg(not(feature = "telemetry"))]
    eprintln!("warning: negative score clamped to 0 before sampling");
}

#[cfg(test)]
#[allow(clippy::expect_used)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entries(pairs: &[(&str, i64)]) -> Vec<ScoreEntry> {
        pairs
            .iter()
            .map(|(id, score)| ScoreEntry {
                id: (*id).to_string(),
                score: *score,
            })
            .collect()
    }

    #[test]
    fn zero_and_negative_totals_yield_none() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 2..=12 {
            let zeros: Vec<ScoreEntry> = (0..n)
                .map(|i| ScoreEntry {
                    id: format!("ID_{i}"),
                    score: 0,
                })
                .collect();
            assert_eq!(pick_weighted(&zeros, &mut rng), None);

            let negatives: Vec<ScoreEntry> = (0..n)
                .map(|i| ScoreEntry {
                    id: format!("ID_{i}"),
                    score: -5,
                })
                .collect();
            assert_eq!(pick_weighted(&negatives, &mut rng), None);
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let scores = entries(&[("YES", 70), ("NO", 30)]);
        let first: Vec<Option<String>> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..20).map(|_| pick_weighted(&scores, &mut rng)).collect()
        };
        let second: Vec<Option<String>> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..20).map(|_| pick_weighted(&scores, &mut rng)).collect()
        };
        assert_eq!(first, second);
    }

    #[test]
    fn empirical_distribution_follows_the_weights() {
        let scores = entries(&[("YES", 70), ("NO", 30)]);
        let mut rng = StdRng::seed_from_u64(1);
        let trials = 20_000;
        let yes = (0..trials)
            .filter(|_| pick_weighted(&scores, &mut rng).as_deref() == Some("YES"))
            .count();
        let ratio = yes as f64 / trials as f64;
        assert!((ratio - 0.7).abs() < 0.02, "ratio was {ratio}");
    }

    #[test]
    fn certain_weight_always_wins() {
        let scores = entries(&[("YES", 100), ("NO", 0)]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(pick_weighted(&scores, &mut rng).as_deref(), Some("YES"));
        }
    }

    #[test]
    fn negative_entries_are_clamped_not_inverted() {
        let scores = entries(&[("YES", -50), ("NO", 10)]);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            assert_eq!(pick_weighted(&scores, &mut rng).as_deref(), Some("NO"));
        }
    }

    #[test]
    fn uniform_draw_covers_every_choice() {
        let set = ChoiceSet::dice();
        let mut rng = StdRng::seed_from_u64(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(pick_uniform(&set, &mut rng).id.clone());
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn suspense_stays_in_the_expected_window() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let d = suspense_duration(&mut rng);
            assert!(d >= Duration::from_millis(1700));
            assert!(d < Duration::from_millis(2900));
        }
    }
}
