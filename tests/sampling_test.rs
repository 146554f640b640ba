// Statistical properties of the masked-position sampler: the truncated
// binomial concentrates where the per-position probability pushes it.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use pwmask::probability::ProbCache;
use pwmask::sampler::draw_masked_count;

const DRAWS: usize = 20000;

fn empirical_counts(p: f64, n: usize, min_visible: usize, min_masked: usize, seed: u64) -> Vec<usize> {
    let cache = ProbCache::new(p, min_visible, min_masked);
    let cumulative = cache.cumulative(n).unwrap();
    let plan = cache.plan(n).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    let mut counts = vec![0usize; plan.max_masked - plan.min_masked + 1];
    for _ in 0..DRAWS {
        let m = draw_masked_count(&cumulative, plan.min_masked, &mut rng);
        assert!(m >= plan.min_masked && m <= plan.max_masked);
        counts[m - plan.min_masked] += 1;
    }
    counts
}

#[test]
fn test_low_p_concentrates_at_min_masked() {
    let counts = empirical_counts(0.01, 10, 2, 1, 1234);
    let at_min = counts[0] as f64 / DRAWS as f64;
    assert!(
        at_min > 0.85,
        "with p near 0 the mass should sit at min_masked, got {:.3}",
        at_min
    );
}

#[test]
fn test_high_p_concentrates_at_max_masked() {
    let counts = empirical_counts(0.99, 10, 2, 1, 5678);
    let at_max = *counts.last().unwrap() as f64 / DRAWS as f64;
    assert!(
        at_max > 0.85,
        "with p near 1 the mass should sit at max_masked, got {:.3}",
        at_max
    );
}

#[test]
fn test_balanced_p_centers_the_mass() {
    let counts = empirical_counts(0.5, 10, 2, 1, 91011);
    let total: usize = counts.iter().sum();
    let mean: f64 = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| (i + 1) as f64 * c as f64)
        .sum::<f64>()
        / total as f64;
    assert!(
        (4.0..=6.0).contains(&mean),
        "with p = 0.5 the mean masked count should sit near n/2, got {:.2}",
        mean
    );
}
