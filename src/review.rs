// External crates
use anyhow::{bail, Error, Result};

// Standard library
use std::path::PathBuf;

// Internal crate imports
use crate::config::read_config;
use crate::report::{
    format_number_with_commas, load_class_records, load_template_records, read_manifest,
};

/*=================================================================
=                         TEMPLATE REVIEW                         =
=================================================================*/

/// Walk a finished run's artifacts and print per-class counts plus sample
/// templates, or per-group source-set statistics with `stats`.
pub fn execute_review(
    config_path: &PathBuf,
    item_count: Option<usize>,
    samples: Option<usize>,
    stats: bool,
) -> Result<(), Error> {
    println!("=== TEMPLATE REVIEW ===");

    let config = read_config(config_path)?;
    let output = match &config.output {
        Some(output) => output.clone(),
        None => bail!("review requires an `output` directory in the config"),
    };
    let manifest = read_manifest(&output)?;
    if manifest.groups.is_empty() {
        println!("The manifest lists no length groups; nothing to review.");
        return Ok(());
    }
    let num_samples = samples.unwrap_or(config.num_samples);

    let mut reviewed = 0;
    for entry in &manifest.groups {
        if let Some(filter) = item_count {
            if entry.item_count != filter {
                continue;
            }
        }
        reviewed += 1;
        println!("\n--- passwords with {} items ---", entry.item_count);
        if stats {
            display_group_stats(&output.join(&entry.templates_file))?;
        } else {
            display_group_classes(&output.join(&entry.classes_file), num_samples)?;
        }
    }

    if reviewed == 0 {
        println!("No length group matches the requested item count.");
    }
    println!("\n=== REVIEW COMPLETE ===");
    Ok(())
}

fn display_group_classes(classes_file: &PathBuf, num_samples: usize) -> Result<(), Error> {
    let records = load_class_records(classes_file)?;
    if records.is_empty() {
        println!("(no templates fell into any popularity class)");
        return Ok(());
    }
    for record in records {
        println!(
            "{:>12}: {} templates",
            record.class,
            format_number_with_commas(record.num_templates)
        );
        for rendered in record.templates.iter().take(num_samples) {
            println!("    {:?}", rendered);
        }
        if record.templates.len() > num_samples {
            println!("    ... and {} more", record.templates.len() - num_samples);
        }
    }
    Ok(())
}

fn display_group_stats(templates_file: &PathBuf) -> Result<(), Error> {
    let records = load_template_records(templates_file)?;
    if records.is_empty() {
        println!("(no surviving templates)");
        return Ok(());
    }
    let sizes: Vec<usize> = records.iter().map(|r| r.num_sources).collect();
    let total: usize = sizes.iter().sum();
    let min = sizes.iter().min().copied().unwrap_or(0);
    let max = sizes.iter().max().copied().unwrap_or(0);
    println!(
        "Templates: {}",
        format_number_with_commas(records.len())
    );
    println!(
        "Source-set sizes: min {}, mean {:.1}, max {}",
        min,
        total as f64 / records.len() as f64,
        max
    );
    Ok(())
}
