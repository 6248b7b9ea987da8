// 🌐 Domain Extractor / Classifier - Email domains to company keys
//
// Pulls the first valid address out of a multi-valued email field and
// resolves its domain through the maintained mapping table. The result
// is the single source of truth for company_domain_key: every record
// either resolves to a normalized domain or to the NO_EMAIL_DOMAIN
// sentinel and is flagged is_missing_email.

use log::info;
use serde::{Deserialize, Serialize};

use crate::mappings::DomainIndex;

/// Sentinel key for records with no resolvable email domain. Such
/// records are excluded from company consolidation but retained in the
/// contact output for audit.
pub const NO_EMAIL_DOMAIN: &str = "NO_EMAIL_DOMAIN";

// ============================================================================
// DOMAIN TYPE
// ============================================================================

/// Classification carried by the domain mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainType {
    /// Business domain - groups into a company
    Corporate,

    /// Personal mail provider (gmail, hotmail, ...) - one-person "company"
    Individual,

    /// Known junk/relay domain - excluded from consolidation entirely
    Skip,
}

impl DomainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::Corporate => "corporate",
            DomainType::Individual => "individual",
            DomainType::Skip => "skip",
        }
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// First syntactically valid address in a delimited email field,
/// lowercased, reduced to its domain part. Fields are ';'-delimited;
/// ',' is accepted too because older exports used it.
pub fn extract_domain(multi_valued_email_field: &str) -> Option<String> {
    for part in multi_valued_email_field.split([';', ',']) {
        let part = part.trim();
        if let Some((local, domain)) = part.split_once('@') {
            if !local.is_empty() && !domain.is_empty() {
                return Some(domain.to_lowercase());
            }
        }
    }
    None
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Outcome of classifying one record's email domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResolution {
    /// Normalized domain, or NO_EMAIL_DOMAIN
    pub company_domain_key: String,

    /// None when the record has no resolvable domain at all
    pub domain_type: Option<DomainType>,

    /// Whether the type came from the mapping table (false = heuristic
    /// corporate default for an unmapped domain)
    pub from_mapping: bool,

    pub is_missing_email: bool,
}

impl DomainResolution {
    pub fn missing_email() -> Self {
        DomainResolution {
            company_domain_key: NO_EMAIL_DOMAIN.to_string(),
            domain_type: None,
            from_mapping: false,
            is_missing_email: true,
        }
    }

    /// Records consolidation groups on: corporate or individual key,
    /// never the sentinel or a skip domain
    pub fn is_consolidatable(&self) -> bool {
        matches!(
            self.domain_type,
            Some(DomainType::Corporate) | Some(DomainType::Individual)
        )
    }

    /// Ranking bucket for the deduplication tie-break: mapped corporate
    /// domains outrank mapped individual ones, everything else is
    /// "unknown" and ranks last.
    pub fn dedup_rank(&self) -> u8 {
        match (self.domain_type, self.from_mapping) {
            (Some(DomainType::Corporate), true) => 0,
            (Some(DomainType::Individual), true) => 1,
            _ => 2,
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Resolves domains through the injected DomainIndex with the
/// corporate-heuristic fallback for unmapped domains.
#[derive(Debug, Clone, Default)]
pub struct DomainClassifier {
    index: DomainIndex,
}

impl DomainClassifier {
    pub fn new(index: DomainIndex) -> Self {
        DomainClassifier { index }
    }

    /// Classify an already-extracted domain
    pub fn classify(&self, domain: &str) -> DomainResolution {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return DomainResolution::missing_email();
        }

        if let Some(entry) = self.index.lookup(&domain) {
            return DomainResolution {
                company_domain_key: entry.normalized_domain.trim().to_lowercase(),
                domain_type: Some(entry.domain_type),
                from_mapping: true,
                is_missing_email: false,
            };
        }

        // Heuristic fallback: a resolvable domain defaults to corporate
        info!("Domain not in mapping table, defaulting to corporate: {}", domain);
        DomainResolution {
            company_domain_key: domain,
            domain_type: Some(DomainType::Corporate),
            from_mapping: false,
            is_missing_email: false,
        }
    }

    /// Extract + classify a record's multi-valued email field
    pub fn resolve_field(&self, multi_valued_email_field: &str) -> DomainResolution {
        match extract_domain(multi_valued_email_field) {
            Some(domain) => self.classify(&domain),
            None => DomainResolution::missing_email(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::DomainMappingEntry;

    fn classifier_with(entries: Vec<DomainMappingEntry>) -> DomainClassifier {
        DomainClassifier::new(DomainIndex::from_entries(entries))
    }

    fn entry(original: &str, normalized: &str, domain_type: DomainType) -> DomainMappingEntry {
        DomainMappingEntry {
            original_domain: original.to_string(),
            normalized_domain: normalized.to_string(),
            domain_type,
        }
    }

    #[test]
    fn test_extract_first_valid_address() {
        assert_eq!(
            extract_domain("JDoe@Acme.com;info@other.com"),
            Some("acme.com".to_string())
        );
    }

    #[test]
    fn test_extract_skips_invalid_tokens() {
        assert_eq!(
            extract_domain("not-an-email; @nolocal.com; jdoe@"),
            None
        );
        assert_eq!(
            extract_domain("garbage;jdoe@acme.com"),
            Some("acme.com".to_string())
        );
    }

    #[test]
    fn test_extract_accepts_comma_delimiters() {
        assert_eq!(
            extract_domain("a@x.com, b@y.com"),
            Some("x.com".to_string())
        );
    }

    #[test]
    fn test_extract_empty_field() {
        assert_eq!(extract_domain(""), None);
        assert_eq!(extract_domain("   "), None);
    }

    #[test]
    fn test_classify_uses_mapping_table() {
        let classifier = classifier_with(vec![entry(
            "acme-corp.com",
            "acme.com",
            DomainType::Corporate,
        )]);

        let resolution = classifier.classify("ACME-CORP.COM");
        assert_eq!(resolution.company_domain_key, "acme.com");
        assert_eq!(resolution.domain_type, Some(DomainType::Corporate));
        assert!(resolution.from_mapping);
        assert!(!resolution.is_missing_email);
    }

    #[test]
    fn test_classify_falls_back_to_corporate() {
        let classifier = classifier_with(vec![]);

        let resolution = classifier.classify("unknown-widgets.com");
        assert_eq!(resolution.company_domain_key, "unknown-widgets.com");
        assert_eq!(resolution.domain_type, Some(DomainType::Corporate));
        assert!(!resolution.from_mapping);
    }

    #[test]
    fn test_resolve_field_without_email() {
        let classifier = classifier_with(vec![]);

        let resolution = classifier.resolve_field("");
        assert_eq!(resolution.company_domain_key, NO_EMAIL_DOMAIN);
        assert!(resolution.is_missing_email);
        assert!(!resolution.is_consolidatable());
    }

    #[test]
    fn test_skip_domains_not_consolidatable() {
        let classifier = classifier_with(vec![entry(
            "relay.example.com",
            "relay.example.com",
            DomainType::Skip,
        )]);

        let resolution = classifier.resolve_field("order-123@relay.example.com");
        assert!(!resolution.is_consolidatable());
        assert!(!resolution.is_missing_email);
    }

    #[test]
    fn test_dedup_rank_ordering() {
        let classifier = classifier_with(vec![
            entry("acme.com", "acme.com", DomainType::Corporate),
            entry("gmail.com", "gmail.com", DomainType::Individual),
        ]);

        let corporate = classifier.classify("acme.com");
        let individual = classifier.classify("gmail.com");
        let unknown = classifier.classify("mystery.io");

        assert!(corporate.dedup_rank() < individual.dedup_rank());
        assert!(individual.dedup_rank() < unknown.dedup_rank());
    }
}
