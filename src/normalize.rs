// 🔤 Name Normalizer - Canonicalize person and company name strings
//
// Total function: any input string produces a normalized output, and
// normalizing twice gives the same result as normalizing once. The
// rules are tuned to the accounting-export domain:
//   - "Peterson, Chris"  -> "CHRIS PETERSON"   (last-first rewrite)
//   - "EISEN GROUP LLC"  -> "EISEN GROUP"      (trailing suffix strip)
//   - "White Cap 30%:Whitecap Edmonton Canada" stays verbatim apart
//     from case/whitespace (colon marks parent/child or percentage
//     notation that must not be restructured)
//
// Suffix stripping runs before the comma rewrite: "Smith, John LLC"
// must normalize to "JOHN SMITH", and the suffix sits at the raw end
// of the string, not at the end of the reordered one.

use log::info;

use crate::config::{EngineConfig, DEFAULT_NAME_SUFFIXES};
use crate::mappings::NameIndex;

// ============================================================================
// RULE-BASED NORMALIZATION
// ============================================================================

/// Normalize with the default suffix list
pub fn normalize_name(raw: &str) -> String {
    normalize_name_with(raw, DEFAULT_NAME_SUFFIXES)
}

/// Normalize with a caller-supplied suffix list
pub fn normalize_name_with<S: AsRef<str>>(raw: &str, suffixes: &[S]) -> String {
    let mut name = collapse_whitespace(&raw.to_uppercase());

    // Colon marks a preserved parent/child or percentage notation;
    // only case and whitespace may change.
    if name.contains(':') {
        return name;
    }

    name = strip_trailing_suffixes(name, suffixes);

    // "{last}, {first}" -> "{first} {last}". Only a single comma is
    // unambiguous; multi-comma strings are lists and pass through
    // (rewriting them would also break idempotence).
    if name.matches(',').count() == 1 {
        if let Some((last, first)) = name.split_once(',') {
            name = collapse_whitespace(&format!("{} {}", first.trim(), last.trim()));
        }
    }

    // A second strip covers suffixes uncovered by the rewrite
    // ("Acme, Inc" -> "ACME," -> "ACME").
    name = strip_trailing_suffixes(name, suffixes);

    collapse_whitespace(&name)
}

/// Collapse internal whitespace runs to single spaces and trim
fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove listed business suffixes from the end of the string, one at
/// a time until none remains. Matches only whole trailing tokens, so
/// "TELCO" survives even though it ends in "CO".
fn strip_trailing_suffixes<S: AsRef<str>>(mut name: String, suffixes: &[S]) -> String {
    loop {
        let mut stripped = false;

        for suffix in suffixes {
            let suffix = suffix.as_ref().trim().to_uppercase();
            if suffix.is_empty() || !name.ends_with(&suffix) {
                continue;
            }

            let boundary = name.len() - suffix.len();
            if name[..boundary].ends_with(' ') {
                name.truncate(boundary);
                let trimmed_len = name.trim_end().len();
                name.truncate(trimmed_len);
                stripped = true;
                break;
            }
        }

        if !stripped {
            return name;
        }
    }
}

// ============================================================================
// NAME NORMALIZER (mapping table + rules)
// ============================================================================

/// Normalizer that consults the maintained name mapping table first
/// and falls back to the rule-based normalization on a miss.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    suffixes: Vec<String>,
    overrides: NameIndex,
}

impl NameNormalizer {
    pub fn new(config: &EngineConfig, overrides: NameIndex) -> Self {
        NameNormalizer {
            suffixes: config
                .name_suffixes
                .iter()
                .map(|s| s.trim().to_uppercase())
                .collect(),
            overrides,
        }
    }

    /// Rule-based normalization only, skipping the mapping table
    pub fn rule_based(&self, raw: &str) -> String {
        normalize_name_with(raw, &self.suffixes)
    }

    /// Mapping-table entry when one exists, rule-based otherwise
    pub fn canonicalize(&self, raw: &str) -> String {
        if let Some(entry) = self.overrides.lookup(raw) {
            return collapse_whitespace(&entry.normalized_name.to_uppercase());
        }

        if !self.overrides.is_empty() && !raw.trim().is_empty() {
            info!("Name not in mapping table, using rule-based normalization: {}", raw);
        }
        self.rule_based(raw)
    }
}

// ============================================================================
// TESTS
// ============================================================================
