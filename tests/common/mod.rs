use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnvironment {
    _temp_dir: TempDir, // Prefixed with _ to indicate it's kept for Drop cleanup
    pub corpus_path: PathBuf,
    pub output_dir: PathBuf,
    pub config_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let corpus_path = temp_dir.path().join("passwords.txt");
        let output_dir = temp_dir.path().join("output");
        let config_path = temp_dir.path().join("config.yaml");

        fs::create_dir_all(&output_dir)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            corpus_path,
            output_dir,
            config_path,
        })
    }
}

/// Write a one-password-per-line corpus file
pub fn write_corpus(env: &TestEnvironment, lines: &[&str]) -> Result<()> {
    let mut file = File::create(&env.corpus_path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

/// Write a config from a YAML body, injecting the environment's input and
/// output paths
pub fn write_config(env: &TestEnvironment, yaml_body: &str) -> Result<()> {
    let mut config: HashMap<String, serde_yaml::Value> = if yaml_body.trim().is_empty() {
        HashMap::new()
    } else {
        serde_yaml::from_str(yaml_body)?
    };

    config.insert(
        "input".to_string(),
        serde_yaml::Value::String(env.corpus_path.to_str().unwrap().to_string()),
    );
    config.insert(
        "output".to_string(),
        serde_yaml::Value::String(env.output_dir.to_str().unwrap().to_string()),
    );

    let yaml_content = serde_yaml::to_string(&config)?;
    let mut file = File::create(&env.config_path)?;
    file.write_all(yaml_content.as_bytes())?;

    Ok(())
}

/// Load a JSONL artifact as parsed JSON values
pub fn load_jsonl(path: &Path) -> Result<Vec<Value>> {
    let file = File::open(path)?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Load the run manifest written at the output root
pub fn load_manifest(env: &TestEnvironment) -> Result<Value> {
    let contents = fs::read_to_string(env.output_dir.join("manifest.json"))?;
    Ok(serde_json::from_str(&contents)?)
}
