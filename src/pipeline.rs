// External crates
use anyhow::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

// Standard library
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::time::Instant;

// Internal crate imports
use mj_io::build_pbar;

use crate::classify::classify_templates;
use crate::config::{read_config, Config};
use crate::corpus::{read_corpus, Password, Splitter};
use crate::debug_println;
use crate::probability::ProbCache;
use crate::report::{
    format_number_with_commas, print_class_summary, write_group_classes, write_group_templates,
    write_manifest, ManifestEntry,
};
use crate::sampler::{sample_group, SamplerParams};

/*=================================================================
=                         MASKING PIPELINE                        =
=================================================================*/

pub fn execute_mask(config_path: &PathBuf) -> Result<(), Error> {
    let config = read_config(config_path)?;
    run_masking(&config)
}

/// Run the whole pipeline: read and group the corpus, then sample, clean up,
/// classify, and persist each length group. Groups carry no shared mutable
/// state beyond the read-only config and the probability cache, so they are
/// scheduled on rayon workers.
pub fn run_masking(config: &Config) -> Result<(), Error> {
    println!("Starting template masking...");
    let start_main = Instant::now();

    if config.output.is_none() {
        println!("Note: no `output` directory is configured, so results will not be saved.");
    }

    let splitter = config.splitter();
    let lower = config.length_lower_bound();
    let upper = config.length_upper_bound;
    let (groups, stats) = read_corpus(&config.input, &splitter, |pwd: &Password| {
        (lower..=upper).contains(&pwd.len())
    })?;
    println!(
        "Read {} passwords: {} valid, {} unique",
        format_number_with_commas(stats.total_lines),
        format_number_with_commas(stats.valid_lines),
        format_number_with_commas(stats.unique_passwords)
    );

    if let Some(output) = &config.output {
        create_dir_all(output)?;
    }

    let cache = ProbCache::new(config.p, config.min_visible, config.min_masked);
    let params = SamplerParams {
        dup_factor: config.dup_factor,
        cleanup_every: config.cleanup_cadence_passwords(),
        threshold4cleanup: config.threshold4cleanup,
    };

    // Item-count order keeps the manifest independent of scheduling
    let mut group_list: Vec<(usize, Vec<Password>)> = groups.into_iter().collect();
    group_list.sort_unstable_by_key(|(item_count, _)| *item_count);

    let pbar = build_pbar(group_list.len(), "Length groups");
    let entries: Result<Vec<Option<ManifestEntry>>, Error> = group_list
        .into_par_iter()
        .map(|(item_count, passwords)| {
            let entry = process_group(item_count, passwords, config, &splitter, &cache, &params);
            pbar.inc(1);
            entry
        })
        .collect();
    let manifest_entries: Vec<ManifestEntry> = entries?.into_iter().flatten().collect();

    if let Some(output) = &config.output {
        let manifest_path = write_manifest(manifest_entries, output)?;
        println!("Run manifest saved to: {:?}", manifest_path);
    }

    println!(
        "Template masking completed in {:.2}s",
        start_main.elapsed().as_secs_f64()
    );
    Ok(())
}

/// One length group: shuffle, sample with interleaved cleanup, classify,
/// persist. The RNG is seeded from the run seed and the group's item count so
/// parallel groups stay deterministic.
fn process_group(
    item_count: usize,
    mut passwords: Vec<Password>,
    config: &Config,
    splitter: &Splitter,
    cache: &ProbCache,
    params: &SamplerParams,
) -> Result<Option<ManifestEntry>, Error> {
    println!(
        "Parsing {} passwords with {:2} items",
        format_number_with_commas(passwords.len()),
        item_count
    );
    let mut rng = ChaCha20Rng::seed_from_u64(config.seed.wrapping_add(item_count as u64));
    passwords.shuffle(&mut rng);

    let (index, cleanup_stats) = sample_group(&passwords, params, cache, &mut rng)?;
    debug_println!(
        config,
        "group {}: {} templates survived, {} removed over {} cleanup passes",
        item_count,
        index.len(),
        cleanup_stats.removed,
        cleanup_stats.passes
    );

    let classified = classify_templates(&index, &config.classes, config.surface_unclassified);
    print_class_summary(&classified, &config.classes);

    match &config.output {
        Some(output) => {
            let templates_file = write_group_templates(
                &index,
                &passwords,
                splitter,
                &config.mask,
                output,
                item_count,
            )?;
            let classes_file = write_group_classes(
                &classified,
                &config.classes,
                splitter,
                &config.mask,
                output,
                item_count,
            )?;
            Ok(Some(ManifestEntry {
                item_count,
                templates_file,
                classes_file,
            }))
        }
        None => Ok(None),
    }
}
