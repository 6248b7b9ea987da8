// ✂️ Contact Splitter - Explode multi-valued email fields
//
// One RawRecord can carry several addresses across its primary and cc
// fields ("jdoe@acme.com;billing@acme.com"). The splitter emits one
// ContactCandidate per non-empty token, tagged with (source_tag,
// position) provenance. Position is 1-based within its field and is
// used for ordering/debugging only - it never feeds an identity key.
//
// Business rule: addresses on known marketplace relay domains are
// auto-generated order-fulfillment aliases, not real contacts, and are
// dropped before they can reach the Contact stage.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::quality::NameQuality;
use crate::records::RawRecord;

// ============================================================================
// SOURCE TAG
// ============================================================================

/// Which multi-valued field the candidate came from. Part of the
/// stable identity key, unlike position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Primary,
    Secondary,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Primary => "primary",
            SourceTag::Secondary => "secondary",
        }
    }
}

// ============================================================================
// CONTACT PRIORITY
// ============================================================================

/// Ranking attribute derived from (source_tag, position): the first
/// address of the primary field outranks the rest of that field, which
/// outranks anything from the cc field. Used by the deduplication
/// tie-break, not by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactPriority {
    Primary,
    AdditionalMain,
    Cc,
}

impl ContactPriority {
    pub fn rank(&self) -> u8 {
        match self {
            ContactPriority::Primary => 0,
            ContactPriority::AdditionalMain => 1,
            ContactPriority::Cc => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactPriority::Primary => "primary",
            ContactPriority::AdditionalMain => "additional_main",
            ContactPriority::Cc => "cc",
        }
    }

    fn derive(tag: SourceTag, position: usize) -> Self {
        match (tag, position) {
            (SourceTag::Primary, 1) => ContactPriority::Primary,
            (SourceTag::Primary, _) => ContactPriority::AdditionalMain,
            (SourceTag::Secondary, _) => ContactPriority::Cc,
        }
    }
}

// ============================================================================
// CONTACT CANDIDATE
// ============================================================================

/// One email extracted from a record's multi-valued field. Consumed by
/// the deduplicator and discarded; only the winning candidate's fields
/// survive into the canonical Contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactCandidate {
    /// Owning raw-record id
    pub record_id: String,

    /// Trimmed, lowercased address; None for the minimal pass-through
    /// candidate of a record with no usable address
    pub email: Option<String>,

    pub source_tag: SourceTag,

    /// 1-based index within the source field. Provenance only - never
    /// part of any identity key.
    pub position: usize,

    pub priority: ContactPriority,

    /// Record name for the first primary address, derived from the
    /// email local part for the rest
    pub display_name: String,

    pub name_quality: NameQuality,
}

// ============================================================================
// SPLITTER
// ============================================================================

pub struct ContactSplitter {
    /// Lowercased marketplace relay domains to drop
    marketplace_domains: Vec<String>,
}

impl ContactSplitter {
    pub fn new(config: &EngineConfig) -> Self {
        ContactSplitter {
            marketplace_domains: config
                .marketplace_domains
                .iter()
                .map(|d| d.trim().to_lowercase())
                .collect(),
        }
    }

    /// Candidates for one record: every non-empty token of both email
    /// fields, plus a single minimal candidate when the record has no
    /// usable address at all (so it stays auditable downstream).
    pub fn split_record(&self, record: &RawRecord) -> Vec<ContactCandidate> {
        let mut candidates = Vec::new();

        self.split_field(record, &record.email, SourceTag::Primary, &mut candidates);
        self.split_field(record, &record.cc_email, SourceTag::Secondary, &mut candidates);

        if candidates.is_empty() {
            candidates.push(self.minimal_candidate(record));
        }

        candidates
    }

    /// Split one field on ';', trim, discard empties, drop marketplace
    /// relays, warn-and-skip malformed tokens.
    pub fn split_field(
        &self,
        record: &RawRecord,
        field: &str,
        tag: SourceTag,
        out: &mut Vec<ContactCandidate>,
    ) {
        if field.trim().is_empty() {
            return;
        }

        for (index, token) in field.split(';').enumerate() {
            let position = index + 1;
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let email = token.to_lowercase();
            let Some((local, domain)) = email.split_once('@') else {
                warn!(
                    "Skipping malformed email token in record {} ({} field, position {}): {}",
                    record.record_id,
                    tag.as_str(),
                    position,
                    token
                );
                continue;
            };
            if local.is_empty() || domain.is_empty() {
                warn!(
                    "Skipping malformed email token in record {} ({} field, position {}): {}",
                    record.record_id,
                    tag.as_str(),
                    position,
                    token
                );
                continue;
            }

            if self.is_marketplace_domain(domain) {
                debug!(
                    "Dropping marketplace relay address in record {}: {}",
                    record.record_id, email
                );
                continue;
            }

            let priority = ContactPriority::derive(tag, position);
            let (display_name, name_quality) = match priority {
                // The record's own name belongs to its first primary address
                ContactPriority::Primary => record_name(record),
                _ => derived_name(local),
            };

            out.push(ContactCandidate {
                record_id: record.record_id.clone(),
                email: Some(email.clone()),
                source_tag: tag,
                position,
                priority,
                display_name,
                name_quality,
            });
        }
    }

    fn minimal_candidate(&self, record: &RawRecord) -> ContactCandidate {
        let (display_name, name_quality) = record_name(record);
        ContactCandidate {
            record_id: record.record_id.clone(),
            email: None,
            source_tag: SourceTag::Primary,
            position: 1,
            priority: ContactPriority::Primary,
            display_name,
            name_quality,
        }
    }

    fn is_marketplace_domain(&self, domain: &str) -> bool {
        self.marketplace_domains.iter().any(|d| d == domain)
    }
}

/// Name + quality taken from the record's own fields
fn record_name(record: &RawRecord) -> (String, NameQuality) {
    if record.has_structured_name() {
        (record.full_name(), NameQuality::Complete)
    } else if !record.display_name.trim().is_empty() {
        (record.display_name.trim().to_string(), NameQuality::Partial)
    } else {
        (String::new(), NameQuality::Missing)
    }
}

/// Title-cased name derived from an email local part:
/// "john.doe" -> "John Doe". Digit-only segments are dropped
/// ("orders-4417" -> "Orders").
fn derived_name(local: &str) -> (String, NameQuality) {
    let words: Vec<String> = local
        .split(['.', '_', '-', '+'])
        .filter(|part| !part.is_empty() && !part.chars().all(|c| c.is_ascii_digit()))
        .map(title_case)
        .collect();

    if words.is_empty() {
        (String::new(), NameQuality::Missing)
    } else {
        (words.join(" "), NameQuality::Derived)
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter() -> ContactSplitter {
        ContactSplitter::new(&EngineConfig::default())
    }

    fn record_with_email(id: &str, email: &str) -> RawRecord {
        let mut record = RawRecord::new(id, "qb");
        record.email = email.to_string();
        record
    }

    #[test]
    fn test_split_three_addresses() {
        let record = record_with_email("1", "a@x.com;b@x.com;c@x.com");
        let candidates = splitter().split_record(&record);

        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].email.as_deref(), Some("a@x.com"));
        assert_eq!(candidates[0].position, 1);
        assert_eq!(candidates[0].priority, ContactPriority::Primary);
        assert_eq!(candidates[1].position, 2);
        assert_eq!(candidates[1].priority, ContactPriority::AdditionalMain);
        assert_eq!(candidates[2].position, 3);
    }

    #[test]
    fn test_split_empty_field_yields_nothing() {
        let record = RawRecord::new("1", "qb");
        let mut out = Vec::new();
        splitter().split_field(&record, "", SourceTag::Primary, &mut out);

        assert!(out.is_empty());
    }

    #[test]
    fn test_record_without_email_gets_minimal_candidate() {
        let mut record = RawRecord::new("1", "qb");
        record.display_name = "ACME Supply".to_string();

        let candidates = splitter().split_record(&record);

        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].email.is_none());
        assert_eq!(candidates[0].source_tag, SourceTag::Primary);
        assert_eq!(candidates[0].display_name, "ACME Supply");
        assert_eq!(candidates[0].name_quality, NameQuality::Partial);
    }

    #[test]
    fn test_tokens_trimmed_and_lowercased() {
        let record = record_with_email("1", "  JDoe@Acme.com ; info@acme.com ");
        let candidates = splitter().split_record(&record);

        assert_eq!(candidates[0].email.as_deref(), Some("jdoe@acme.com"));
        assert_eq!(candidates[1].email.as_deref(), Some("info@acme.com"));
    }

    #[test]
    fn test_malformed_tokens_skipped() {
        let record = record_with_email("1", "not-an-email;@nolocal.com;jdoe@;ok@acme.com");
        let candidates = splitter().split_record(&record);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].email.as_deref(), Some("ok@acme.com"));
        // Provenance keeps the raw field position
        assert_eq!(candidates[0].position, 4);
    }

    #[test]
    fn test_marketplace_relay_dropped() {
        let record = record_with_email(
            "1",
            "real@acme.com;x7k2p9q@marketplace.amazon.com",
        );
        let candidates = splitter().split_record(&record);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].email.as_deref(), Some("real@acme.com"));
    }

    #[test]
    fn test_cc_field_tagged_secondary() {
        let mut record = record_with_email("1", "main@acme.com");
        record.cc_email = "assistant@acme.com".to_string();

        let candidates = splitter().split_record(&record);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].source_tag, SourceTag::Secondary);
        assert_eq!(candidates[1].priority, ContactPriority::Cc);
        // Position restarts per field
        assert_eq!(candidates[1].position, 1);
    }

    #[test]
    fn test_derived_names_for_additional_addresses() {
        let mut record = record_with_email("1", "jdoe@acme.com;mary.jane-smith@acme.com");
        record.first_name = "John".to_string();
        record.last_name = "Doe".to_string();

        let candidates = splitter().split_record(&record);

        assert_eq!(candidates[0].display_name, "John Doe");
        assert_eq!(candidates[0].name_quality, NameQuality::Complete);
        assert_eq!(candidates[1].display_name, "Mary Jane Smith");
        assert_eq!(candidates[1].name_quality, NameQuality::Derived);
    }

    #[test]
    fn test_derived_name_drops_numeric_segments() {
        let record = record_with_email("1", "a@x.com;orders-4417@x.com");
        let candidates = splitter().split_record(&record);

        assert_eq!(candidates[1].display_name, "Orders");
    }
}
