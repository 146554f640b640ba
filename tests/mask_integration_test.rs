use anyhow::Result;
use serde_json::Value;
use std::fs;

use pwmask::{execute_mask, execute_review};

mod common;

fn find_rendered<'a>(templates: &'a [Value], rendered: &str) -> Option<&'a Value> {
    templates.iter().find(|t| t["rendered"] == rendered)
}

fn sources(record: &Value) -> Vec<String> {
    record["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_shared_prefix_template_accumulates_both_sources() -> Result<()> {
    let env = common::TestEnvironment::new()?;
    common::write_corpus(&env, &["abcde", "abcde", "abXYe"])?;
    common::write_config(
        &env,
        r#"
splitter: empty
p: 0.5
min_visible: 2
min_masked: 1
length_upper_bound: 5
dup_factor: 1000
threshold4cleanup: 0
seed: 42
classes:
  - { name: super-rare, lower: 1, upper: 5 }
  - { name: rare, lower: 10, upper: 15 }
"#,
    )?;
    execute_mask(&env.config_path)?;

    let templates = common::load_jsonl(&env.output_dir.join("templates_05.jsonl"))?;

    // Both passwords share the "ab" prefix, so masking positions 2..4 of
    // either collapses them onto the same template
    let ab_masked = find_rendered(&templates, "ab\t\t\t")
        .expect("template with the ab prefix and three masked items should be sampled");
    assert_eq!(sources(ab_masked), vec!["abXYe", "abcde"]);

    // A template exposing "bcde" can only ever come from "abcde"
    let leading_mask = find_rendered(&templates, "\tbcde")
        .expect("template with only the first item masked should be sampled");
    assert_eq!(sources(leading_mask), vec!["abcde"]);

    // Two distinct sources lands in the low-count class
    let classes = common::load_jsonl(&env.output_dir.join("classes_05.jsonl"))?;
    let super_rare = classes
        .iter()
        .find(|c| c["class"] == "super-rare")
        .expect("super-rare class should be present");
    assert!(super_rare["templates"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| *t == "ab\t\t\t"));
    Ok(())
}

#[test]
fn test_fixed_seed_runs_are_byte_identical() -> Result<()> {
    let corpus = &[
        "abcdef", "uvwxyz", "aardvark1", "q1w2e3r4", "hunter22", "letmein1",
    ];
    let config = r#"
splitter: empty
p: 0.5
min_visible: 2
min_masked: 1
length_upper_bound: 16
dup_factor: 50
threshold4cleanup: 0
seed: 7
"#;

    let mut artifact_bytes: Vec<Vec<u8>> = Vec::new();
    for _ in 0..2 {
        let env = common::TestEnvironment::new()?;
        common::write_corpus(&env, corpus)?;
        common::write_config(&env, config)?;
        execute_mask(&env.config_path)?;

        let manifest = common::load_manifest(&env)?;
        let mut run_bytes = serde_json::to_vec(&manifest)?;
        for group in manifest["groups"].as_array().unwrap() {
            for key in ["templates_file", "classes_file"] {
                let filename = group[key].as_str().unwrap();
                run_bytes.extend(fs::read(env.output_dir.join(filename))?);
            }
        }
        artifact_bytes.push(run_bytes);
    }

    assert_eq!(
        artifact_bytes[0], artifact_bytes[1],
        "two runs with the same seed, config, and corpus must produce identical artifacts"
    );
    Ok(())
}

#[test]
fn test_final_cleanup_prunes_singleton_templates() -> Result<()> {
    let env = common::TestEnvironment::new()?;
    // No two passwords share a unit at any position, so every template maps
    // to exactly one source and the default threshold prunes them all
    common::write_corpus(&env, &["aaaaa", "bbbbb", "ccccc"])?;
    common::write_config(
        &env,
        r#"
splitter: empty
p: 0.5
min_visible: 2
min_masked: 1
length_upper_bound: 5
dup_factor: 100
threshold4cleanup: 1
seed: 3
"#,
    )?;
    execute_mask(&env.config_path)?;

    let templates = common::load_jsonl(&env.output_dir.join("templates_05.jsonl"))?;
    assert!(
        templates.is_empty(),
        "all templates are singletons and must be pruned"
    );
    let classes = common::load_jsonl(&env.output_dir.join("classes_05.jsonl"))?;
    assert!(classes.is_empty());
    Ok(())
}

#[test]
fn test_empty_corpus_degrades_gracefully() -> Result<()> {
    let env = common::TestEnvironment::new()?;
    common::write_corpus(&env, &[])?;
    common::write_config(&env, "")?;
    execute_mask(&env.config_path)?;

    let manifest = common::load_manifest(&env)?;
    assert_eq!(manifest["groups"].as_array().unwrap().len(), 0);
    Ok(())
}

#[test]
fn test_infeasible_config_fails_before_sampling() -> Result<()> {
    let env = common::TestEnvironment::new()?;
    common::write_corpus(&env, &["abcd"])?;
    common::write_config(
        &env,
        r#"
min_visible: 10
min_masked: 10
length_upper_bound: 5
"#,
    )?;
    let err = execute_mask(&env.config_path).unwrap_err();
    assert!(err.to_string().contains("no password can be valid"));
    Ok(())
}

#[test]
fn test_review_over_finished_run() -> Result<()> {
    let env = common::TestEnvironment::new()?;
    common::write_corpus(&env, &["abcde", "abcde", "abXYe"])?;
    common::write_config(
        &env,
        r#"
p: 0.5
min_visible: 2
min_masked: 1
length_upper_bound: 5
dup_factor: 200
threshold4cleanup: 0
seed: 42
"#,
    )?;
    execute_mask(&env.config_path)?;

    execute_review(&env.config_path, None, Some(5), false)?;
    execute_review(&env.config_path, Some(5), None, true)?;
    Ok(())
}
