// External crates
use ahash::RandomState;
use anyhow::{Error, Result};
use flate2::read::GzDecoder;
use unicode_segmentation::UnicodeSegmentation;
use zstd::stream::read::Decoder as ZstdDecoder;

// Standard library
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, Cursor, Read};
use std::path::PathBuf;

// Internal crate imports
use mj_io::expand_dirs;

/// A password split into atomic units (grapheme clusters, or chunks produced
/// by a delimiter splitter). Immutable once read.
pub type Password = Vec<String>;

/// Passwords partitioned by item count. The probability distribution over
/// masked-position counts depends only on the item count, so each group is an
/// independent unit of work.
pub type LengthGroups = HashMap<usize, Vec<Password>>;

/*=================================================================
=                           SPLITTING                             =
=================================================================*/

/// How a raw line becomes atomic units. `Empty` splits per grapheme cluster;
/// `Delimiter` splits on a literal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splitter {
    Empty,
    Delimiter(String),
}

impl Splitter {
    pub fn from_name(name: &str) -> Splitter {
        match name {
            "" | "empty" => Splitter::Empty,
            "space" => Splitter::Delimiter(" ".to_string()),
            "tab" => Splitter::Delimiter("\t".to_string()),
            other => Splitter::Delimiter(other.to_string()),
        }
    }

    pub fn split(&self, line: &str) -> Password {
        match self {
            Splitter::Empty => line.graphemes(true).map(|g| g.to_string()).collect(),
            Splitter::Delimiter(delimiter) => {
                line.split(delimiter.as_str()).map(|c| c.to_string()).collect()
            }
        }
    }

    pub fn join(&self, units: &[String]) -> String {
        match self {
            Splitter::Empty => units.concat(),
            Splitter::Delimiter(delimiter) => units.join(delimiter),
        }
    }
}

/*=================================================================
=                         CORPUS READING                          =
=================================================================*/

#[derive(Debug, Default, Clone, Copy)]
pub struct CorpusStats {
    pub total_lines: usize,
    pub valid_lines: usize,
    pub unique_passwords: usize,
}

// Helper function to read corpus files (supporting .gz and .zst)
fn read_corpus_file(path: &PathBuf) -> Result<Vec<u8>, Error> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();

    match path.extension().and_then(|s| s.to_str()) {
        Some("gz") => {
            let mut decoder = GzDecoder::new(file);
            decoder.read_to_end(&mut buffer)?;
        }
        Some("zst") => {
            let mut decoder = ZstdDecoder::new(file)?;
            decoder.read_to_end(&mut buffer)?;
        }
        _ => {
            // No compression, read file directly
            file.read_to_end(&mut buffer)?;
        }
    }

    Ok(buffer)
}

fn corpus_files(input: &PathBuf) -> Result<Vec<PathBuf>, Error> {
    let mut files = if input.is_file() {
        vec![input.clone()]
    } else {
        expand_dirs(
            vec![input.clone()],
            Some(vec![".txt", ".gz", ".zst"].as_slice()),
        )?
    };
    // Deterministic read order regardless of directory enumeration
    files.sort();
    Ok(files)
}

/// Read a password corpus: one password per line, line terminators stripped.
/// Lines failing `is_valid` are dropped (but counted); surviving lines are
/// deduplicated with occurrence counts and grouped by item count. Occurrence
/// counts are instrumentation only; each distinct password is sampled
/// independently of its corpus frequency.
///
/// First-occurrence order is preserved within each group so a fixed seed
/// reproduces a run exactly.
pub fn read_corpus<F>(
    input: &PathBuf,
    splitter: &Splitter,
    is_valid: F,
) -> Result<(LengthGroups, CorpusStats), Error>
where
    F: Fn(&Password) -> bool,
{
    let mut stats = CorpusStats::default();
    let mut seen: HashMap<String, u64, RandomState> = HashMap::default();
    let mut unique: Vec<Password> = Vec::new();

    for path in corpus_files(input)? {
        let buffer = read_corpus_file(&path)?;
        for line in Cursor::new(buffer).lines() {
            let line = line?;
            stats.total_lines += 1;
            if let Some(count) = seen.get_mut(&line) {
                // Already known valid; only the occurrence count changes
                *count += 1;
                stats.valid_lines += 1;
                continue;
            }
            let pwd = splitter.split(&line);
            if !is_valid(&pwd) {
                continue;
            }
            stats.valid_lines += 1;
            seen.insert(line, 1);
            unique.push(pwd);
        }
    }
    stats.unique_passwords = unique.len();

    let mut groups: LengthGroups = HashMap::new();
    for pwd in unique {
        groups.entry(pwd.len()).or_default().push(pwd);
    }
    Ok((groups, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_splitter_uses_grapheme_clusters() {
        let splitter = Splitter::from_name("empty");
        let units = splitter.split("pä55");
        assert_eq!(units, vec!["p", "ä", "5", "5"]);
        assert_eq!(splitter.join(&units), "pä55");
    }

    #[test]
    fn test_delimiter_splitter_round_trips() {
        let splitter = Splitter::from_name("space");
        let units = splitter.split("correct horse battery");
        assert_eq!(units.len(), 3);
        assert_eq!(splitter.join(&units), "correct horse battery");

        let literal = Splitter::from_name("::");
        assert_eq!(literal.split("a::b::c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_read_corpus_dedups_and_groups() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("passwords.txt");
        let mut file = File::create(&path)?;
        writeln!(file, "abcde")?;
        writeln!(file, "abcde")?;
        writeln!(file, "abXYe")?;
        writeln!(file, "longerpassword")?;
        writeln!(file, "no")?; // too short, dropped
        drop(file);

        let splitter = Splitter::Empty;
        let (groups, stats) =
            read_corpus(&path, &splitter, |pwd| (3..=16).contains(&pwd.len()))?;

        assert_eq!(stats.total_lines, 5);
        assert_eq!(stats.valid_lines, 4); // duplicate counted, "no" dropped
        assert_eq!(stats.unique_passwords, 3);
        assert_eq!(groups[&5].len(), 2);
        assert_eq!(groups[&14].len(), 1);
        assert!(!groups.contains_key(&2));
        Ok(())
    }
}
