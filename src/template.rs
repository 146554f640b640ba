// Standard library
use std::collections::{HashMap, HashSet};

// External crates
use ahash::RandomState;

use crate::corpus::Splitter;

/// One position of a template: the original atomic unit, or the mask
/// sentinel. The sentinel is a distinct variant so it can never collide with
/// a legitimate unit value; the configured mask string is applied only when
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    Unit(String),
    Mask,
}

/// A password with some atomic units replaced by the mask sentinel.
pub type Template = Vec<Token>;

// Source sets hold group-local password ids, resolved back to passwords at
// output time
pub type SourceSet = HashSet<u32>;

// Maps each template to the set of distinct passwords that produced it. Live
// entries always have non-empty sets; cleanup deletes entries outright.
pub type TemplateIndex = HashMap<Template, SourceSet, RandomState>;

pub fn masked_count(template: &Template) -> usize {
    template.iter().filter(|t| matches!(t, Token::Mask)).count()
}

/// Rendered form using the configured mask string, joined the same way the
/// source password was split.
pub fn render(template: &Template, mask: &str, splitter: &Splitter) -> String {
    let parts: Vec<String> = template
        .iter()
        .map(|token| match token {
            Token::Unit(unit) => unit.clone(),
            Token::Mask => mask.to_string(),
        })
        .collect();
    splitter.join(&parts)
}

/// Lossless JSON form: masked positions become `null`, which lives outside
/// the space of unit strings.
pub fn to_json_tokens(template: &Template) -> Vec<Option<String>> {
    template
        .iter()
        .map(|token| match token {
            Token::Unit(unit) => Some(unit.clone()),
            Token::Mask => None,
        })
        .collect()
}
