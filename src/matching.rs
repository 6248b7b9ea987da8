// 🎯 Matching Engine - Link external order records to companies
//
// Three tiers, cheapest first, each applied only to records the
// previous tier left unmatched:
//
//   1. exact      - case-insensitive name equality (hash lookup)
//   2. normalized - equality after normalize_name on both sides
//   3. similarity - bounded Jaro-Winkler comparison, OFF by default
//
// Measured behavior on this data: the normalized tier recovers most of
// the similarity tier's value at a fraction of the cost, so similarity
// is a configurable last resort. It is quadratic in the unmatched set
// and runs under a hard wall-clock budget; when the budget runs out the
// remaining records report no match instead of blocking the run.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use strsim::jaro_winkler;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::consolidate::Company;
use crate::normalize::NameNormalizer;

// ============================================================================
// EXTERNAL RECORD
// ============================================================================

/// One order/transaction record from the external system, carrying the
/// party name to resolve against consolidated companies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub external_id: String,
    pub party_name: String,
}

// ============================================================================
// MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    Normalized,
    Similarity,
    None,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Normalized => "normalized",
            MatchTier::Similarity => "similarity",
            MatchTier::None => "none",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub external_record_id: String,
    pub company_id: Option<Uuid>,
    pub match_tier: MatchTier,
}

// ============================================================================
// MATCHING ENGINE
// ============================================================================

pub struct MatchingEngine<'a> {
    config: &'a EngineConfig,
    normalizer: &'a NameNormalizer,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(config: &'a EngineConfig, normalizer: &'a NameNormalizer) -> Self {
        MatchingEngine { config, normalizer }
    }

    /// Match every external record, returning results in input order.
    pub fn match_records(
        &self,
        externals: &[ExternalRecord],
        companies: &[Company],
    ) -> Vec<MatchResult> {
        // Companies arrive ordered by domain key; first insertion wins
        // on alias collisions, keeping matches deterministic.
        let mut exact_index: HashMap<String, Uuid> = HashMap::new();
        let mut normalized_index: HashMap<String, Uuid> = HashMap::new();
        for company in companies {
            for name in company_names(company) {
                let upper = name.trim().to_uppercase();
                if !upper.is_empty() {
                    exact_index.entry(upper).or_insert(company.id);
                }
                let normalized = self.normalizer.canonicalize(name);
                if !normalized.is_empty() {
                    normalized_index.entry(normalized).or_insert(company.id);
                }
            }
        }

        let mut results: Vec<MatchResult> = externals
            .iter()
            .map(|external| {
                let trimmed = external.party_name.trim();
                if trimmed.is_empty() {
                    return MatchResult {
                        external_record_id: external.external_id.clone(),
                        company_id: None,
                        match_tier: MatchTier::None,
                    };
                }

                // Tier 1: exact (case-insensitive)
                if let Some(&company_id) = exact_index.get(&trimmed.to_uppercase()) {
                    return MatchResult {
                        external_record_id: external.external_id.clone(),
                        company_id: Some(company_id),
                        match_tier: MatchTier::Exact,
                    };
                }

                // Tier 2: normalized
                let normalized = self.normalizer.canonicalize(trimmed);
                if let Some(&company_id) = normalized_index.get(&normalized) {
                    return MatchResult {
                        external_record_id: external.external_id.clone(),
                        company_id: Some(company_id),
                        match_tier: MatchTier::Normalized,
                    };
                }

                MatchResult {
                    external_record_id: external.external_id.clone(),
                    company_id: None,
                    match_tier: MatchTier::None,
                }
            })
            .collect();

        // Tier 3: similarity over what is still unmatched
        if self.config.similarity_matching_enabled {
            self.apply_similarity_tier(externals, companies, &mut results);
        }

        results
    }

    /// Quadratic in the unmatched set, bounded by the configured
    /// wall-clock budget. On overrun the remaining records keep
    /// MatchTier::None.
    fn apply_similarity_tier(
        &self,
        externals: &[ExternalRecord],
        companies: &[Company],
        results: &mut [MatchResult],
    ) {
        let budget = Duration::from_millis(self.config.similarity_budget_ms);
        let threshold = self.config.similarity_threshold;
        let started = Instant::now();

        // Normalize company names once up front
        let normalized_companies: Vec<(Uuid, Vec<String>)> = companies
            .iter()
            .map(|company| {
                let names = company_names(company)
                    .into_iter()
                    .map(|name| self.normalizer.canonicalize(name))
                    .filter(|name| !name.is_empty())
                    .collect();
                (company.id, names)
            })
            .collect();

        for (index, external) in externals.iter().enumerate() {
            if results[index].match_tier != MatchTier::None {
                continue;
            }

            if started.elapsed() >= budget {
                let skipped = results[index..]
                    .iter()
                    .filter(|r| r.match_tier == MatchTier::None)
                    .count();
                warn!(
                    "Similarity tier budget of {:?} exceeded; {} records left unmatched",
                    budget, skipped
                );
                return;
            }

            let target = self.normalizer.canonicalize(&external.party_name);
            if target.is_empty() {
                continue;
            }

            let mut best: Option<(f64, Uuid)> = None;
            for (company_id, names) in &normalized_companies {
                for name in names {
                    let similarity = jaro_winkler(&target, name);
                    if similarity >= threshold
                        && best.map_or(true, |(score, _)| similarity > score)
                    {
                        best = Some((similarity, *company_id));
                    }
                }
            }

            if let Some((_, company_id)) = best {
                results[index].company_id = Some(company_id);
                results[index].match_tier = MatchTier::Similarity;
            }
        }
    }
}

/// Representative name plus every member alias
fn company_names(company: &Company) -> Vec<&str> {
    let mut names = vec![company.name.as_str()];
    names.extend(company.aliases.iter().map(|alias| alias.as_str()));
    names
}

// ============================================================================
// TESTS
// ============================================================================
