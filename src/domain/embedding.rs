//! Embedding Reference Extraction
//!
//! Prompt text can pull in textual-inversion embeddings inline, either as a
//! bare `embedding:name` tag or wrapped as `<embedding:name>`. Both forms are
//! collected and normalized to a `.pt` filename.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    // Bare tag. Also matches the payload of the bracketed form.
    static ref BARE_EMBEDDING_REGEX: Regex = Regex::new(r"embedding:([\w.\-]+)").unwrap();

    // Bracketed tag: <embedding:name>
    static ref BRACKETED_EMBEDDING_REGEX: Regex = Regex::new(r"<embedding:([\w.\-]+)>").unwrap();
}

/// Extract every embedding filename referenced in `text`.
///
/// Tokens that do not already end in `.pt` get the suffix appended. Text with
/// no `embedding:` tag yields an empty set.
pub fn extract_embeddings(text: &str) -> BTreeSet<String> {
    let mut results = BTreeSet::new();

    for regex in [&*BARE_EMBEDDING_REGEX, &*BRACKETED_EMBEDDING_REGEX] {
        for caps in regex.captures_iter(text) {
            results.insert(normalize_embedding_name(&caps[1]));
        }
    }

    results
}

fn normalize_embedding_name(token: &str) -> String {
    if token.ends_with(".pt") {
        token.to_string()
    } else {
        format!("{}.pt", token)
    }
}
