// External crates
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};

// Standard library
use std::path::PathBuf;

// Internal crate imports
use mj_io::{read_pathbuf_to_mem, write_mem_to_pathbuf};

use crate::classify::{ClassifiedTemplates, UNCLASSIFIED};
use crate::config::ClassRange;
use crate::corpus::{Password, Splitter};
use crate::template::{render, to_json_tokens, Template, TemplateIndex};

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// One surviving template with the distinct passwords that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// Token sequence; masked positions are `null`.
    pub template: Vec<Option<String>>,
    /// The template rendered with the configured mask string.
    pub rendered: String,
    pub sources: Vec<String>,
    pub num_sources: usize,
}

/// One popularity class and the rendered templates assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    pub class: String,
    pub num_templates: usize,
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub item_count: usize,
    pub templates_file: String,
    pub classes_file: String,
}

/// Which serialized artifacts belong together for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub groups: Vec<ManifestEntry>,
}

// Helper function to format numbers with commas
pub fn format_number_with_commas(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;

    for ch in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn templates_filename(item_count: usize) -> String {
    format!("templates_{:02}.jsonl", item_count)
}

pub fn classes_filename(item_count: usize) -> String {
    format!("classes_{:02}.jsonl", item_count)
}

fn write_jsonl<T: Serialize>(records: &[T], output_file: &PathBuf) -> Result<(), Error> {
    let mut output_bytes = Vec::new();
    for record in records {
        output_bytes.extend(serde_json::to_vec(record)?);
        output_bytes.push(b'\n');
    }
    write_mem_to_pathbuf(&output_bytes, output_file)?;
    Ok(())
}

/// Write the raw template index for one length group: one JSON line per
/// surviving template, sorted by token sequence so identical runs produce
/// byte-identical files.
pub fn write_group_templates(
    index: &TemplateIndex,
    passwords: &[Password],
    splitter: &Splitter,
    mask: &str,
    output_dir: &PathBuf,
    item_count: usize,
) -> Result<String, Error> {
    let mut entries: Vec<_> = index.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut records = Vec::with_capacity(entries.len());
    for (template, sources) in entries {
        let mut origins: Vec<String> = sources
            .iter()
            .map(|&id| splitter.join(&passwords[id as usize]))
            .collect();
        origins.sort();
        records.push(TemplateRecord {
            template: to_json_tokens(template),
            rendered: render(template, mask, splitter),
            num_sources: origins.len(),
            sources: origins,
        });
    }

    let filename = templates_filename(item_count);
    write_jsonl(&records, &output_dir.join(&filename))?;
    Ok(filename)
}

/// Write the classified partition for one length group: one JSON line per
/// non-empty class, in configured class order, templates sorted within each.
pub fn write_group_classes(
    classified: &ClassifiedTemplates,
    classes: &[ClassRange],
    splitter: &Splitter,
    mask: &str,
    output_dir: &PathBuf,
    item_count: usize,
) -> Result<String, Error> {
    let mut records = Vec::new();
    let class_names = classes
        .iter()
        .map(|c| c.name.as_str())
        .chain(std::iter::once(UNCLASSIFIED));
    for name in class_names {
        if let Some(templates) = classified.get(name) {
            let mut ordered: Vec<&Template> = templates.iter().collect();
            ordered.sort();
            records.push(ClassRecord {
                class: name.to_string(),
                num_templates: ordered.len(),
                templates: ordered
                    .iter()
                    .map(|t| render(t, mask, splitter))
                    .collect(),
            });
        }
    }

    let filename = classes_filename(item_count);
    write_jsonl(&records, &output_dir.join(&filename))?;
    Ok(filename)
}

pub fn write_manifest(entries: Vec<ManifestEntry>, output_dir: &PathBuf) -> Result<PathBuf, Error> {
    let manifest = Manifest { groups: entries };
    let output_file = output_dir.join(MANIFEST_FILENAME);
    let output_bytes = serde_json::to_vec_pretty(&manifest)?;
    write_mem_to_pathbuf(&output_bytes, &output_file)?;
    Ok(output_file)
}

pub fn read_manifest(output_dir: &PathBuf) -> Result<Manifest, Error> {
    let contents = read_pathbuf_to_mem(&output_dir.join(MANIFEST_FILENAME))?;
    let manifest: Manifest = serde_json::from_reader(contents)?;
    Ok(manifest)
}

pub fn load_class_records(path: &PathBuf) -> Result<Vec<ClassRecord>, Error> {
    load_jsonl(path)
}

pub fn load_template_records(path: &PathBuf) -> Result<Vec<TemplateRecord>, Error> {
    load_jsonl(path)
}

fn load_jsonl<T: for<'de> Deserialize<'de>>(path: &PathBuf) -> Result<Vec<T>, Error> {
    use std::io::BufRead;
    let contents = read_pathbuf_to_mem(path)?;
    let mut records = Vec::new();
    for line in contents.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Per-class counts for one finished length group, printed in configured
/// class order.
pub fn print_class_summary(classified: &ClassifiedTemplates, classes: &[ClassRange]) {
    for class in classes {
        if let Some(templates) = classified.get(&class.name) {
            println!(
                "{:>12}: {:>8}",
                class.name,
                format_number_with_commas(templates.len())
            );
        }
    }
    if let Some(templates) = classified.get(UNCLASSIFIED) {
        println!(
            "{:>12}: {:>8}",
            UNCLASSIFIED,
            format_number_with_commas(templates.len())
        );
    }
}
