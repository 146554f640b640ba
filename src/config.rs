// External crates
use anyhow::{bail, Error, Result};
use serde::{Deserialize, Serialize};

// Standard library
use std::path::PathBuf;

// Internal crate imports
use mj_io::read_pathbuf_to_mem;

use crate::corpus::Splitter;

/*=================================================================
=                             CONFIG                              =
=================================================================*/

/// One popularity class: an inclusive [lower, upper] range over the number
/// of distinct passwords that collapse onto a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassRange {
    pub name: String,
    pub lower: usize,
    pub upper: usize,
}

/// What the cleanup cadence counts. `Samples` matches the historical
/// behavior: the configured value is divided by `dup_factor` (ceiling
/// division) so a pass still runs "every N samples". `Passwords` takes the
/// configured value literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupUnit {
    Samples,
    Passwords,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Corpus input: a password file (one per line, optionally .gz/.zst
    // compressed) or a directory of such files
    pub input: PathBuf,

    // Where per-group artifacts and the manifest land; when absent the run
    // only reports and nothing is saved
    #[serde(default)]
    pub output: Option<PathBuf>,

    // Splitting rule: "empty" (per grapheme), "space", "tab", or a literal
    // delimiter string
    #[serde(default = "default_splitter")]
    pub splitter: String,

    // Masking parameters
    #[serde(default = "default_prob")]
    pub p: f64,
    #[serde(default = "default_min_visible")]
    pub min_visible: usize,
    #[serde(default = "default_min_masked")]
    pub min_masked: usize,
    #[serde(default = "default_length_upper_bound")]
    pub length_upper_bound: usize,
    #[serde(default = "default_mask")]
    pub mask: String,
    #[serde(default = "default_dup_factor")]
    pub dup_factor: usize,

    // Cleanup parameters
    #[serde(default = "default_cleanup_every")]
    pub cleanup_every: usize,
    #[serde(default = "default_cleanup_unit")]
    pub cleanup_unit: CleanupUnit,
    #[serde(default = "default_threshold4cleanup")]
    pub threshold4cleanup: usize,

    // Popularity classes, ordered and non-overlapping
    #[serde(default = "default_classes")]
    pub classes: Vec<ClassRange>,
    #[serde(default)]
    pub surface_unclassified: bool,

    // Review options
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,

    // Reproducibility / debug
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub debug: bool,
}

fn default_splitter() -> String {
    "empty".to_string() // One atomic unit per grapheme cluster
}

fn default_prob() -> f64 {
    0.5 // Per-position masking probability
}

fn default_min_visible() -> usize {
    4
}

fn default_min_masked() -> usize {
    5
}

fn default_length_upper_bound() -> usize {
    16 // Passwords longer than this are ignored
}

fn default_mask() -> String {
    "\t".to_string() // Render sentinel only; internally the mask is a tagged value
}

fn default_dup_factor() -> usize {
    1 // Samples drawn per password
}

fn default_cleanup_every() -> usize {
    100000
}

fn default_cleanup_unit() -> CleanupUnit {
    CleanupUnit::Samples // Historical behavior: cadence normalized by dup_factor
}

fn default_threshold4cleanup() -> usize {
    1 // Delete singleton templates
}

fn default_num_samples() -> usize {
    30 // Sample templates shown per class during review
}

fn default_classes() -> Vec<ClassRange> {
    vec![
        class("super-rare", 1, 5),
        class("rare", 10, 15),
        class("uncommon", 50, 150),
        class("common", 1000, 15000),
        class("pervasive", 50000, 1000000),
    ]
}

fn class(name: &str, lower: usize, upper: usize) -> ClassRange {
    ClassRange {
        name: name.to_string(),
        lower,
        upper,
    }
}

impl Config {
    /// The splitting rule derived from the configured splitter name.
    pub fn splitter(&self) -> Splitter {
        Splitter::from_name(&self.splitter)
    }

    /// Shortest password that can satisfy both visibility constraints.
    pub fn length_lower_bound(&self) -> usize {
        self.min_visible + self.min_masked
    }

    /// Cleanup cadence expressed in passwords, whatever unit it was
    /// configured in. Each password yields `dup_factor` samples per pass.
    pub fn cleanup_cadence_passwords(&self) -> usize {
        let cadence = match self.cleanup_unit {
            CleanupUnit::Passwords => self.cleanup_every,
            CleanupUnit::Samples => {
                (self.cleanup_every + self.dup_factor - 1) / self.dup_factor
            }
        };
        cadence.max(1)
    }
}

pub fn read_config(config_path: &PathBuf) -> Result<Config, Error> {
    let contents = read_pathbuf_to_mem(config_path)?;
    let config: Config = serde_yaml::from_reader(contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Every multi-field constraint is checked here, before any corpus work
/// begins. A config that passes validation cannot fail later for
/// configuration reasons.
pub fn validate_config(config: &Config) -> Result<(), Error> {
    if !(0.0..=1.0).contains(&config.p) {
        bail!("p must lie in [0, 1], got {}", config.p);
    }
    if config.p == 0.0 && config.min_masked > 0 {
        bail!("p = 0 can never produce the {} masked positions required by min_masked", config.min_masked);
    }
    if config.p == 1.0 && config.min_visible > 0 {
        bail!("p = 1 can never leave the {} visible positions required by min_visible", config.min_visible);
    }
    if config.dup_factor == 0 {
        bail!("dup_factor must be positive");
    }
    if config.cleanup_every == 0 {
        bail!("cleanup_every must be positive");
    }
    if config.length_upper_bound == 0 {
        bail!("length_upper_bound must be positive");
    }
    if config.length_lower_bound() > config.length_upper_bound {
        bail!(
            "min_visible + min_masked = {} exceeds length_upper_bound = {}; no password can be valid",
            config.length_lower_bound(),
            config.length_upper_bound
        );
    }
    if config.mask.is_empty() {
        bail!("mask must be a non-empty string");
    }
    if let Splitter::Delimiter(delimiter) = config.splitter() {
        if config.mask.contains(delimiter.as_str()) {
            bail!(
                "mask {:?} contains the splitter delimiter {:?}; rendered templates would be ambiguous",
                config.mask,
                delimiter
            );
        }
    }
    if config.classes.is_empty() {
        bail!("at least one popularity class must be configured");
    }
    let mut prev: Option<&ClassRange> = None;
    for range in &config.classes {
        if range.name.is_empty() {
            bail!("popularity class names must be non-empty");
        }
        if range.lower == 0 {
            bail!("class {:?}: lower bound must be at least 1 (empty source sets never survive cleanup)", range.name);
        }
        if range.lower > range.upper {
            bail!("class {:?}: lower bound {} exceeds upper bound {}", range.name, range.lower, range.upper);
        }
        if let Some(prev) = prev {
            if range.lower <= prev.upper {
                bail!(
                    "classes {:?} and {:?} overlap or are out of order ([{}, {}] then [{}, {}])",
                    prev.name, range.name, prev.lower, prev.upper, range.lower, range.upper
                );
            }
        }
        prev = Some(range);
    }
    Ok(())
}
