// External crates
use ahash::RandomState;

// Standard library
use std::collections::{HashMap, HashSet};

// Internal crate imports
use crate::config::ClassRange;
use crate::template::{Template, TemplateIndex};

pub type TemplateSet = HashSet<Template, RandomState>;

// Maps class name to the templates whose source-set size falls in the
// class's range
pub type ClassifiedTemplates = HashMap<String, TemplateSet>;

/// Bucket name for templates whose source-set size falls in none of the
/// configured ranges, when surfacing them is enabled.
pub const UNCLASSIFIED: &str = "unclassified";

/// Bucket each surviving template by the size of its source set, first
/// matching class wins. Ranges are validated non-overlapping up front, so
/// order only affects the short-circuit, never the assignment. Templates
/// matching no class are dropped unless `surface_unclassified` is set.
pub fn classify_templates(
    index: &TemplateIndex,
    classes: &[ClassRange],
    surface_unclassified: bool,
) -> ClassifiedTemplates {
    let mut classified: ClassifiedTemplates = HashMap::new();
    for (template, sources) in index.iter() {
        let size = sources.len();
        let matched = classes
            .iter()
            .find(|class| class.lower <= size && size <= class.upper);
        match matched {
            Some(class) => {
                classified
                    .entry(class.name.clone())
                    .or_default()
                    .insert(template.clone());
            }
            None if surface_unclassified => {
                classified
                    .entry(UNCLASSIFIED.to_string())
                    .or_default()
                    .insert(template.clone());
            }
            None => {}
        }
    }
    classified
}
