use std::collections::{BTreeSet, HashMap, HashSet};

use anyhow::{bail, Result};
use rand::Rng;
use tracing::debug;

/// A prefix with its sampling weight, after any flooring.
#[derive(Debug, Clone)]
pub struct WeightedPrefix {
    pub prefix: String,
    pub weight: f64,
}

/// Percentile of `values` using linear interpolation between closest ranks.
pub fn percentile(values: &[f64], pct: f64) -> Result<f64> {
    if values.is_empty() {
        bail!("cannot take a percentile of an empty distribution");
    }
    if !(0.0..=100.0).contains(&pct) {
        bail!("percentile must be within [0, 100], got {pct}");
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (sorted.len() - 1) as f64 * pct / 100.0;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Ok(sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Replace every weight strictly below `threshold` with the threshold itself.
/// A floor, not a cap: heavy prefixes keep their full mass while the long
/// tail of rare prefixes stays selectable.
pub fn floor_weights(items: &mut [WeightedPrefix], threshold: f64) {
    for item in items.iter_mut() {
        if item.weight < threshold {
            item.weight = threshold;
        }
    }
}

/// Draw exactly `k` distinct prefixes, selection probability proportional to
/// weight, by inverse-CDF sampling with rejection of duplicate draws.
///
/// Zero-weight items occupy an empty CDF interval and are never drawn, so
/// `k` must not exceed the number of positively weighted items; violating
/// that is a configuration error, not a truncation.
pub fn weighted_sample<R: Rng>(items: &[WeightedPrefix], k: usize, rng: &mut R) -> Result<Vec<String>> {
    if k > items.len() {
        bail!(
            "cannot sample {k} distinct prefixes from {} candidates",
            items.len()
        );
    }
    let selectable = items.iter().filter(|item| item.weight > 0.0).count();
    if k > selectable {
        bail!("cannot sample {k} distinct prefixes: only {selectable} have positive weight");
    }
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut cdf = Vec::with_capacity(items.len());
    let mut total = 0.0;
    for item in items {
        total += item.weight;
        cdf.push(total);
    }

    let mut picked: BTreeSet<usize> = BTreeSet::new();
    let mut draws = 0usize;
    while picked.len() != k {
        let r = rng.gen::<f64>() * total;
        let idx = cdf.partition_point(|&c| c <= r).min(items.len() - 1);
        picked.insert(idx);
        draws += 1;
    }
    debug!(k, draws, "weighted sample drawn");

    Ok(picked
        .into_iter()
        .map(|idx| items[idx].prefix.clone())
        .collect())
}

/// Full sampling policy over a prefix weight table: percentile floor, then
/// `k` distinct draws. Candidates are laid out in sorted prefix order so the
/// CDF is a fixed function of the table.
pub fn sample_prefixes<R: Rng>(
    weights: &HashMap<String, u64>,
    pct: f64,
    k: usize,
    rng: &mut R,
) -> Result<HashSet<String>> {
    let mut items: Vec<WeightedPrefix> = weights
        .iter()
        .map(|(prefix, weight)| WeightedPrefix {
            prefix: prefix.clone(),
            weight: *weight as f64,
        })
        .collect();
    items.sort_by(|a, b| a.prefix.cmp(&b.prefix));

    let raw: Vec<f64> = items.iter().map(|item| item.weight).collect();
    let threshold = percentile(&raw, pct)?;
    floor_weights(&mut items, threshold);

    Ok(weighted_sample(&items, k, rng)?.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn weighted(pairs: &[(&str, f64)]) -> Vec<WeightedPrefix> {
        pairs
            .iter()
            .map(|(prefix, weight)| WeightedPrefix {
                prefix: prefix.to_string(),
                weight: *weight,
            })
            .collect()
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let p = percentile(&[1.0, 2.0, 3.0, 4.0], 75.0).unwrap();
        assert!((p - 3.25).abs() < 1e-9);

        let p = percentile(&[1.0, 1.0, 100.0], 75.0).unwrap();
        assert!((p - 50.5).abs() < 1e-9);

        let p = percentile(&[7.0], 75.0).unwrap();
        assert!((p - 7.0).abs() < 1e-9);
    }

    #[test]
    fn percentile_rejects_empty_input() {
        assert!(percentile(&[], 75.0).is_err());
    }

    #[test]
    fn flooring_lifts_only_the_tail() {
        let mut items = weighted(&[("a", 1.0), ("b", 1.0), ("c", 100.0)]);
        floor_weights(&mut items, 50.5);
        assert_eq!(items[0].weight, 50.5);
        assert_eq!(items[1].weight, 50.5);
        assert_eq!(items[2].weight, 100.0);
    }

    #[test]
    fn returns_exactly_k_distinct_items() {
        let items = weighted(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        let sample = weighted_sample(&items, 3, &mut rng).unwrap();
        assert_eq!(sample.len(), 3);
        let distinct: HashSet<&String> = sample.iter().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn zero_weight_items_are_never_selected() {
        let items = weighted(&[("dead", 0.0), ("a", 1.0), ("b", 1.0)]);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let sample = weighted_sample(&items, 2, &mut rng).unwrap();
            assert!(!sample.contains(&"dead".to_string()));
        }
    }

    #[test]
    fn oversampling_is_a_fatal_error() {
        let items = weighted(&[("a", 1.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(weighted_sample(&items, 2, &mut rng).is_err());

        // k within bounds but beyond the positively weighted items.
        let items = weighted(&[("a", 1.0), ("dead", 0.0)]);
        assert!(weighted_sample(&items, 2, &mut rng).is_err());
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let items = weighted(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0)]);
        let a = weighted_sample(&items, 2, &mut StdRng::seed_from_u64(99)).unwrap();
        let b = weighted_sample(&items, 2, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn floored_tail_prefixes_remain_selectable() {
        let weights: HashMap<String, u64> =
            [("low1".to_string(), 1), ("low2".to_string(), 1), ("heavy".to_string(), 100)].into();

        // With the floor in place every prefix has positive mass, so asking
        // for all three must succeed and include both low-weight prefixes.
        let mut rng = StdRng::seed_from_u64(3);
        let sample = sample_prefixes(&weights, 75.0, 3, &mut rng).unwrap();
        assert!(sample.contains("low1"));
        assert!(sample.contains("low2"));
        assert!(sample.contains("heavy"));
    }

    #[test]
    fn sampling_zero_returns_nothing() {
        let items = weighted(&[("a", 1.0)]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(weighted_sample(&items, 0, &mut rng).unwrap().is_empty());
    }
}
