// External crates
use anyhow::{bail, Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;

// Standard library
use std::collections::HashMap;

// Internal crate imports
use crate::corpus::Password;
use crate::probability::ProbCache;
use crate::report::format_number_with_commas;
use crate::template::{Template, TemplateIndex, Token};

/// Read-only sampling tunables, shared across length groups.
#[derive(Debug, Clone, Copy)]
pub struct SamplerParams {
    /// Samples drawn per password.
    pub dup_factor: usize,
    /// Cleanup cadence in passwords (already normalized from the configured
    /// unit).
    pub cleanup_every: usize,
    /// Templates with at most this many distinct sources are pruned.
    pub threshold4cleanup: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CleanupStats {
    pub passes: usize,
    pub removed: usize,
}

/// Locate a uniform draw in a cumulative distribution: the smallest index
/// whose cumulative probability strictly exceeds the draw, so a draw landing
/// exactly on a boundary resolves to the higher bucket.
pub fn locate(cumulative: &[f64], draw: f64) -> usize {
    cumulative
        .partition_point(|&c| c <= draw)
        .min(cumulative.len() - 1)
}

/// Draw the number of positions to mask via inverse-CDF sampling.
pub fn draw_masked_count(
    cumulative: &[f64],
    min_masked: usize,
    rng: &mut ChaCha20Rng,
) -> usize {
    min_masked + locate(cumulative, rng.gen::<f64>())
}

/// Delete every index entry whose source set is at or below the threshold.
/// Surviving entries are untouched. Returns (before, after) entry counts.
pub fn cleanup_templates(index: &mut TemplateIndex, threshold: usize) -> (usize, usize) {
    let before = index.len();
    index.retain(|_, sources| sources.len() > threshold);
    (before, index.len())
}

/// Sample masked variants for every password in one length group.
///
/// Each password yields `dup_factor` templates: draw m from the cached
/// distribution, shuffle a boolean mask with exactly m trues so every
/// m-subset of positions is equally likely, substitute the mask sentinel,
/// and upsert the password id into the template's source set. A cleanup pass
/// runs every `cleanup_every` passwords and once more at the end of the
/// group.
///
/// Pruning is lossy by design: a template deleted early never re-accumulates
/// the lost associations. That is the memory/fidelity tradeoff, not an error.
pub fn sample_group(
    passwords: &[Password],
    params: &SamplerParams,
    cache: &ProbCache,
    rng: &mut ChaCha20Rng,
) -> Result<(TemplateIndex, CleanupStats), Error> {
    let mut index: TemplateIndex = HashMap::default();
    let mut stats = CleanupStats::default();
    let total = passwords.len();
    let mut since_cleanup = 0;

    for (pwd_idx, pwd) in passwords.iter().enumerate() {
        let n = pwd.len();
        let plan = match cache.plan(n) {
            Some(plan) => plan,
            None => bail!(
                "the password should have at least {} items, but {}: {:?}",
                cache.required_items(),
                n,
                pwd
            ),
        };
        let cumulative = cache.cumulative(n)?;

        for _ in 0..params.dup_factor {
            let m = draw_masked_count(&cumulative, plan.min_masked, rng);
            let mut is_masked = vec![true; m];
            is_masked.resize(n, false);
            is_masked.shuffle(rng);

            let masked_pwd: Template = pwd
                .iter()
                .zip(is_masked.iter())
                .map(|(unit, &mask)| {
                    if mask {
                        Token::Mask
                    } else {
                        Token::Unit(unit.clone())
                    }
                })
                .collect();
            index.entry(masked_pwd).or_default().insert(pwd_idx as u32);
        }

        since_cleanup += 1;
        if since_cleanup >= params.cleanup_every || pwd_idx + 1 == total {
            let (before, after) = cleanup_templates(&mut index, params.threshold4cleanup);
            stats.passes += 1;
            stats.removed += before - after;
            println!(
                "[{:5.2}%] cleanup: {} -> {} templates",
                (pwd_idx + 1) as f64 / total as f64 * 100.0,
                format_number_with_commas(before),
                format_number_with_commas(after)
            );
            since_cleanup = 0;
        }
    }

    Ok((index, stats))
}
