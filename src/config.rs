// ⚙️ Engine Configuration - Every recognized option, typed and validated
//
// Replaces the late-bound option dictionaries of the source system with
// one struct. Matching and consolidation code read their thresholds
// from here; nothing is hard-coded at the call sites.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// DEFAULTS
// ============================================================================

/// Trailing business suffixes removed by the Name Normalizer.
/// "COMPANY" is deliberately absent - it occurs inside real business
/// names ("FIRST COMPANY OF TEXAS") and stripping it corrupts them.
pub const DEFAULT_NAME_SUFFIXES: &[&str] = &[
    "LLC", "INC", "CORP", "CORP.", "LTD", "CO", "CO.", "CORPORATION", "LIMITED",
];

/// Auto-generated order-relay domains whose addresses are not real
/// contacts and must never reach the Contact stage.
pub const DEFAULT_MARKETPLACE_DOMAINS: &[&str] =
    &["marketplace.amazon.com", "members.ebay.com"];

// ============================================================================
// CLASSIFICATION BUCKETS
// ============================================================================

/// One revenue-tier bucket: applies when aggregated revenue >= min_revenue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueTier {
    pub min_revenue: f64,
    pub label: String,
}

/// One business-size bucket: applies when member count >= min_members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSizeBucket {
    pub min_members: usize,
    pub label: String,
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trailing suffixes stripped by the Name Normalizer (matched
    /// case-insensitively at the end of the string only)
    #[serde(default = "default_name_suffixes")]
    pub name_suffixes: Vec<String>,

    /// Marketplace relay domains filtered out by the Contact Splitter
    #[serde(default = "default_marketplace_domains")]
    pub marketplace_domains: Vec<String>,

    /// Whether the similarity tier of the Matching Engine runs at all.
    /// Off by default: the normalized tier recovers most of its value
    /// at a fraction of the cost.
    #[serde(default)]
    pub similarity_matching_enabled: bool,

    /// Minimum Jaro-Winkler similarity for a similarity-tier match
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Wall-clock budget for the similarity tier. When exceeded, the
    /// remaining comparisons are skipped and those records report no
    /// match instead of blocking the run.
    #[serde(default = "default_similarity_budget_ms")]
    pub similarity_budget_ms: u64,

    /// Revenue-tier buckets, ascending by min_revenue
    #[serde(default = "default_revenue_tiers")]
    pub revenue_tiers: Vec<RevenueTier>,

    /// Business-size buckets, ascending by min_members
    #[serde(default = "default_business_sizes")]
    pub business_sizes: Vec<BusinessSizeBucket>,
}

fn default_name_suffixes() -> Vec<String> {
    DEFAULT_NAME_SUFFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_marketplace_domains() -> Vec<String> {
    DEFAULT_MARKETPLACE_DOMAINS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_similarity_threshold() -> f64 {
    0.8
}

fn default_similarity_budget_ms() -> u64 {
    10_000
}

fn default_revenue_tiers() -> Vec<RevenueTier> {
    vec![
        RevenueTier { min_revenue: 0.0, label: "none".to_string() },
        RevenueTier { min_revenue: 0.01, label: "low".to_string() },
        RevenueTier { min_revenue: 10_000.0, label: "mid".to_string() },
        RevenueTier { min_revenue: 100_000.0, label: "high".to_string() },
    ]
}

fn default_business_sizes() -> Vec<BusinessSizeBucket> {
    vec![
        BusinessSizeBucket { min_members: 1, label: "solo".to_string() },
        BusinessSizeBucket { min_members: 2, label: "small".to_string() },
        BusinessSizeBucket { min_members: 5, label: "medium".to_string() },
        BusinessSizeBucket { min_members: 10, label: "large".to_string() },
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name_suffixes: default_name_suffixes(),
            marketplace_domains: default_marketplace_domains(),
            similarity_matching_enabled: false,
            similarity_threshold: default_similarity_threshold(),
            similarity_budget_ms: default_similarity_budget_ms(),
            revenue_tiers: default_revenue_tiers(),
            business_sizes: default_business_sizes(),
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("name suffix list must not be empty")]
    EmptySuffixList,

    #[error("similarity threshold must be in (0.0, 1.0], got {0}")]
    InvalidSimilarityThreshold(f64),

    #[error("{0} buckets must not be empty")]
    EmptyBuckets(&'static str),

    #[error("{0} buckets must be sorted ascending by their threshold")]
    UnsortedBuckets(&'static str),
}

impl EngineConfig {
    /// Validate once at startup. The engine assumes a validated config
    /// everywhere else.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name_suffixes.is_empty() {
            return Err(ConfigError::EmptySuffixList);
        }

        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidSimilarityThreshold(
                self.similarity_threshold,
            ));
        }

        if self.revenue_tiers.is_empty() {
            return Err(ConfigError::EmptyBuckets("revenue_tiers"));
        }
        if !self
            .revenue_tiers
            .windows(2)
            .all(|w| w[0].min_revenue <= w[1].min_revenue)
        {
            return Err(ConfigError::UnsortedBuckets("revenue_tiers"));
        }

        if self.business_sizes.is_empty() {
            return Err(ConfigError::EmptyBuckets("business_sizes"));
        }
        if !self
            .business_sizes
            .windows(2)
            .all(|w| w[0].min_members <= w[1].min_members)
        {
            return Err(ConfigError::UnsortedBuckets("business_sizes"));
        }

        Ok(())
    }

    /// Label of the highest revenue tier whose threshold the value meets
    pub fn revenue_tier_label(&self, revenue: f64) -> &str {
        self.revenue_tiers
            .iter()
            .rev()
            .find(|t| revenue >= t.min_revenue)
            .map(|t| t.label.as_str())
            .unwrap_or("none")
    }

    /// Label of the highest business-size bucket the member count meets
    pub fn business_size_label(&self, member_count: usize) -> &str {
        self.business_sizes
            .iter()
            .rev()
            .find(|b| member_count >= b.min_members)
            .map(|b| b.label.as_str())
            .unwrap_or("solo")
    }

    /// Parse from a TOML string and validate
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let config: EngineConfig =
            toml::from_str(raw).context("Failed to parse engine config TOML")?;
        config.validate().context("Invalid engine config")?;
        Ok(config)
    }

    /// Load from a TOML file and validate
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.similarity_matching_enabled);
        assert_eq!(config.similarity_threshold, 0.8);
    }

    #[test]
    fn test_invalid_similarity_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.similarity_threshold = 1.5;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSimilarityThreshold(_))
        ));
    }

    #[test]
    fn test_empty_suffix_list_rejected() {
        let mut config = EngineConfig::default();
        config.name_suffixes.clear();

        assert!(matches!(config.validate(), Err(ConfigError::EmptySuffixList)));
    }

    #[test]
    fn test_unsorted_buckets_rejected() {
        let mut config = EngineConfig::default();
        config.business_sizes.reverse();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsortedBuckets("business_sizes"))
        ));
    }

    #[test]
    fn test_revenue_tier_labels() {
        let config = EngineConfig::default();

        assert_eq!(config.revenue_tier_label(0.0), "none");
        assert_eq!(config.revenue_tier_label(500.0), "low");
        assert_eq!(config.revenue_tier_label(10_000.0), "mid");
        assert_eq!(config.revenue_tier_label(250_000.0), "high");
    }

    #[test]
    fn test_business_size_labels() {
        let config = EngineConfig::default();

        assert_eq!(config.business_size_label(1), "solo");
        assert_eq!(config.business_size_label(3), "small");
        assert_eq!(config.business_size_label(7), "medium");
        assert_eq!(config.business_size_label(40), "large");
    }

    #[test]
    fn test_from_toml_str() {
        let toml = r#"
            similarity_matching_enabled = true
            similarity_threshold = 0.85
            similarity_budget_ms = 5000
        "#;

        let config = EngineConfig::from_toml_str(toml).unwrap();

        assert!(config.similarity_matching_enabled);
        assert_eq!(config.similarity_threshold, 0.85);
        assert_eq!(config.similarity_budget_ms, 5000);
        // Unspecified options keep their defaults
        assert_eq!(config.name_suffixes.len(), DEFAULT_NAME_SUFFIXES.len());
    }

    #[test]
    fn test_from_toml_str_rejects_invalid() {
        let toml = "similarity_threshold = 0.0";
        assert!(EngineConfig::from_toml_str(toml).is_err());
    }
}
