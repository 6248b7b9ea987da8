// 🧬 Contact Deduplicator - One canonical contact per real email
//
// Candidates are grouped by lowercased email across the ENTIRE
// dataset: the same address may legitimately appear under several raw
// records and must collapse to one Contact system-wide. Within each
// group exactly one representative wins, selected by a documented
// total order so the same input always produces the same winner:
//
//   1. higher completeness score
//   2. primary before additional_main before cc
//   3. mapped corporate domain before mapped individual before unknown
//   4. higher account balance, nulls last
//   5. owning record id ascending (guarantees no ties survive)
//
// Candidates without any email are never deduplicated against
// email-bearing ones; they pass through as minimal contacts.

use log::warn;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::domain::{DomainClassifier, DomainResolution, DomainType};
use crate::identity::stable_contact_id;
use crate::quality::{CompletenessScore, EngagementFlags, NameQuality, QualityScorer, QualityTier};
use crate::records::RawRecord;
use crate::split::{ContactCandidate, ContactPriority, SourceTag};

// ============================================================================
// CONTACT
// ============================================================================

/// Canonical, deduplicated person entity. Invariant: no two Contacts
/// in one run share the same lowercased email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Stable id: pure function of (record id, canonical email, source
    /// tag) - reordering the source field never changes it
    pub id: Uuid,

    /// Owning record of the winning candidate (best representative)
    pub record_id: String,

    /// Canonical lowercased email; None for minimal no-email contacts
    pub email: Option<String>,

    pub display_name: String,
    pub name_quality: NameQuality,
    pub priority: ContactPriority,
    pub source_tag: SourceTag,

    /// Winning candidate's position within its field (provenance only)
    pub position: usize,

    pub company_domain_key: String,
    pub domain_type: Option<DomainType>,
    pub is_missing_email: bool,

    pub completeness_score: u8,
    pub quality_tier: QualityTier,
    pub flags: EngagementFlags,

    /// How many candidates collapsed into this contact
    pub merged_candidate_count: usize,
}

// ============================================================================
// RANKED CANDIDATE (internal)
// ============================================================================

struct RankedCandidate<'a> {
    candidate: &'a ContactCandidate,
    record: &'a RawRecord,
    score: CompletenessScore,
    resolution: DomainResolution,
}

impl RankedCandidate<'_> {
    /// The documented total order. "Less" means "wins".
    fn cmp_rank(&self, other: &Self) -> Ordering {
        other
            .score
            .score
            .cmp(&self.score.score)
            .then_with(|| {
                self.candidate
                    .priority
                    .rank()
                    .cmp(&other.candidate.priority.rank())
            })
            .then_with(|| self.resolution.dedup_rank().cmp(&other.resolution.dedup_rank()))
            .then_with(|| cmp_balance_desc_nulls_last(self.record.balance, other.record.balance))
            .then_with(|| self.candidate.record_id.cmp(&other.candidate.record_id))
            // Within one record the same email can only recur at
            // different provenance; position settles it.
            .then_with(|| self.candidate.position.cmp(&other.candidate.position))
    }
}

fn cmp_balance_desc_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ============================================================================
// DEDUPLICATOR
// ============================================================================

pub struct ContactDeduplicator<'a> {
    classifier: &'a DomainClassifier,
}

impl<'a> ContactDeduplicator<'a> {
    pub fn new(classifier: &'a DomainClassifier) -> Self {
        ContactDeduplicator { classifier }
    }

    /// Collapse candidates into canonical contacts. Total over any
    /// candidate list: an empty list yields an empty result, and no
    /// input aborts the run.
    pub fn dedupe(
        &self,
        candidates: &[ContactCandidate],
        records: &[RawRecord],
    ) -> Vec<Contact> {
        let records_by_id: HashMap<&str, &RawRecord> = records
            .iter()
            .map(|record| (record.record_id.as_str(), record))
            .collect();

        // BTreeMap keyed by lowercased email keeps the output order
        // deterministic regardless of candidate order.
        let mut groups: BTreeMap<String, Vec<RankedCandidate<'_>>> = BTreeMap::new();
        let mut no_email: Vec<RankedCandidate<'_>> = Vec::new();

        for candidate in candidates {
            let Some(record) = records_by_id.get(candidate.record_id.as_str()).copied() else {
                warn!(
                    "Skipping candidate with unknown owning record: {}",
                    candidate.record_id
                );
                continue;
            };

            let resolution = match candidate.email.as_deref() {
                Some(email) => match email.split_once('@') {
                    Some((_, domain)) => self.classifier.classify(domain),
                    None => DomainResolution::missing_email(),
                },
                None => DomainResolution::missing_email(),
            };

            let score = QualityScorer::score(
                record,
                candidate.email.is_some(),
                &candidate.display_name,
                candidate.name_quality,
            );

            let ranked = RankedCandidate {
                candidate,
                record,
                score,
                resolution,
            };

            match candidate.email.as_deref() {
                Some(email) => groups.entry(email.to_lowercase()).or_default().push(ranked),
                None => no_email.push(ranked),
            }
        }

        let mut contacts = Vec::with_capacity(groups.len() + no_email.len());

        for (canonical_email, mut group) in groups {
            group.sort_by(|a, b| a.cmp_rank(b));
            let merged = group.len();
            let winner = &group[0];
            contacts.push(build_contact(winner, Some(&canonical_email), merged));
        }

        // Minimal contacts, ordered by owning record for determinism
        no_email.sort_by(|a, b| {
            a.candidate
                .record_id
                .cmp(&b.candidate.record_id)
                .then_with(|| a.candidate.position.cmp(&b.candidate.position))
        });
        for ranked in &no_email {
            contacts.push(build_contact(ranked, None, 1));
        }

        contacts
    }
}

fn build_contact(
    winner: &RankedCandidate<'_>,
    canonical_email: Option<&str>,
    merged_candidate_count: usize,
) -> Contact {
    let candidate = winner.candidate;
    let has_email = canonical_email.is_some();

    Contact {
        id: stable_contact_id(&candidate.record_id, canonical_email, candidate.source_tag),
        record_id: candidate.record_id.clone(),
        email: canonical_email.map(|e| e.to_string()),
        display_name: candidate.display_name.clone(),
        name_quality: candidate.name_quality,
        priority: candidate.priority,
        source_tag: candidate.source_tag,
        position: candidate.position,
        company_domain_key: winner.resolution.company_domain_key.clone(),
        domain_type: winner.resolution.domain_type,
        is_missing_email: winner.resolution.is_missing_email,
        completeness_score: winner.score.score,
        quality_tier: winner.score.tier,
        flags: QualityScorer::flags(winner.record, has_email),
        merged_candidate_count,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappings::{DomainIndex, DomainMappingEntry};
    use std::collections::HashSet;

    fn classifier() -> DomainClassifier {
        DomainClassifier::new(DomainIndex::from_entries(vec![
            DomainMappingEntry {
                original_domain: "acme.com".to_string(),
                normalized_domain: "acme.com".to_string(),
                domain_type: DomainType::Corporate,
            },
            DomainMappingEntry {
                original_domain: "gmail.com".to_string(),
                normalized_domain: "gmail.com".to_string(),
                domain_type: DomainType::Individual,
            },
        ]))
    }

    fn candidate(
        record_id: &str,
        email: Option<&str>,
        tag: SourceTag,
        position: usize,
        priority: ContactPriority,
    ) -> ContactCandidate {
        ContactCandidate {
            record_id: record_id.to_string(),
            email: email.map(|e| e.to_string()),
            source_tag: tag,
            position,
            priority,
            display_name: String::new(),
            name_quality: NameQuality::Missing,
        }
    }

    fn record(id: &str, balance: Option<f64>) -> RawRecord {
        let mut record = RawRecord::new(id, "qb");
        record.balance = balance;
        record
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let classifier = classifier();
        let deduper = ContactDeduplicator::new(&classifier);
        assert!(deduper.dedupe(&[], &[]).is_empty());
    }

    #[test]
    fn test_case_variants_collapse_system_wide() {
        // Duplicate case-variant within one field plus the same address
        // from a different record with a higher balance: exactly one
        // contact survives, represented by the higher-balance record.
        let records = vec![record("1", Some(100.0)), record("2", Some(500.0))];
        let candidates = vec![
            candidate("1", Some("jdoe@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("1", Some("jdoe@acme.com"), SourceTag::Primary, 2, ContactPriority::AdditionalMain),
            candidate("2", Some("jdoe@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
        ];

        let classifier = classifier();
        let contacts = ContactDeduplicator::new(&classifier).dedupe(&candidates, &records);

        assert_eq!(contacts.len(), 1);
        let contact = &contacts[0];
        assert_eq!(contact.email.as_deref(), Some("jdoe@acme.com"));
        assert_eq!(contact.record_id, "2");
        assert_eq!(contact.merged_candidate_count, 3);
    }

    #[test]
    fn test_no_two_contacts_share_an_email() {
        let records = vec![record("1", None), record("2", None), record("3", None)];
        let candidates = vec![
            candidate("1", Some("a@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("2", Some("A@ACME.COM"), SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("3", Some("b@acme.com"), SourceTag::Secondary, 1, ContactPriority::Cc),
        ];

        let classifier = classifier();
        let contacts = ContactDeduplicator::new(&classifier).dedupe(&candidates, &records);

        let emails: HashSet<String> = contacts
            .iter()
            .filter_map(|c| c.email.as_ref().map(|e| e.to_lowercase()))
            .collect();
        assert_eq!(emails.len(), contacts.len());
        assert_eq!(contacts.len(), 2);
    }

    #[test]
    fn test_priority_breaks_score_ties_before_balance() {
        // Same score, primary priority on the poorer record: priority
        // (rule 2) is consulted before balance (rule 4).
        let records = vec![record("1", Some(10.0)), record("2", Some(9999.0))];
        let candidates = vec![
            candidate("1", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("2", Some("x@acme.com"), SourceTag::Secondary, 1, ContactPriority::Cc),
        ];

        let classifier = classifier();
        let contacts = ContactDeduplicator::new(&classifier).dedupe(&candidates, &records);

        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].record_id, "1");
        assert_eq!(contacts[0].priority, ContactPriority::Primary);
    }

    #[test]
    fn test_nulls_last_in_balance_tie_break() {
        let records = vec![record("1", None), record("2", Some(1.0))];
        let candidates = vec![
            candidate("1", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("2", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
        ];

        let classifier = classifier();
        let contacts = ContactDeduplicator::new(&classifier).dedupe(&candidates, &records);

        assert_eq!(contacts[0].record_id, "2");
    }

    #[test]
    fn test_record_id_is_final_tie_break() {
        let records = vec![record("9", Some(5.0)), record("3", Some(5.0))];
        let candidates = vec![
            candidate("9", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("3", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
        ];

        let classifier = classifier();
        let contacts = ContactDeduplicator::new(&classifier).dedupe(&candidates, &records);

        assert_eq!(contacts[0].record_id, "3");
    }

    #[test]
    fn test_winner_independent_of_candidate_order() {
        let records = vec![record("1", Some(100.0)), record("2", Some(500.0))];
        let forward = vec![
            candidate("1", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("2", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let classifier = classifier();
        let deduper = ContactDeduplicator::new(&classifier);
        let a = deduper.dedupe(&forward, &records);
        let b = deduper.dedupe(&reversed, &records);

        assert_eq!(a.len(), 1);
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[0].record_id, b[0].record_id);
    }

    #[test]
    fn test_no_email_candidates_pass_through() {
        let records = vec![record("1", None), record("2", None)];
        let candidates = vec![
            candidate("1", None, SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("2", None, SourceTag::Primary, 1, ContactPriority::Primary),
            candidate("2", Some("x@acme.com"), SourceTag::Primary, 1, ContactPriority::Primary),
        ];

        let classifier = classifier();
        let contacts = ContactDeduplicator::new(&classifier).dedupe(&candidates, &records);

        // Two minimal contacts plus one email contact
        assert_eq!(contacts.len(), 3);
        let minimal: Vec<_> = contacts.iter().filter(|c| c.email.is_none()).collect();
        assert_eq!(minimal.len(), 2);
        assert!(minimal.iter().all(|c| c.is_missing_email));
        assert!(minimal.iter().all(|c| c.company_domain_key == crate::domain::NO_EMAIL_DOMAIN));
    }

    #[test]
    fn test_corporate_domain_outranks_individual() {
        // Same address is impossible across different domains, so this
        // exercises rule 3 via two candidates for one address where the
        // classifier resolution differs only through the record's field
        // - here both resolve identically, so instead verify the rank
        // ordering drives the comparator as documented.
        let classifier = classifier();
        let corporate = classifier.classify("acme.com");
        let individual = classifier.classify("gmail.com");

        assert!(corporate.dedup_rank() < individual.dedup_rank());
    }

    #[test]
    fn test_contact_id_matches_stable_key() {
        let records = vec![record("1", None)];
        let candidates = vec![candidate(
            "1",
            Some("JDoe@Acme.com"),
            SourceTag::Primary,
            1,
            ContactPriority::Primary,
        )];

        let classifier = classifier();
        let contacts = ContactDeduplicator::new(&classifier).dedupe(&candidates, &records);

        assert_eq!(
            contacts[0].id,
            stable_contact_id("1", Some("jdoe@acme.com"), SourceTag::Primary)
        );
    }
}
