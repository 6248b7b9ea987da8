// 🔁 Identity Pipeline - Ordered stages over one input snapshot
//
// Single-pass, set-based batch transformation: split -> dedupe/score
// -> consolidate -> relate, each stage a pure function of the passed-
// along collections. Everything is recomputed from scratch on every
// run; the stable ids guarantee that the same inputs re-derive the
// same identities (idempotent), while new inputs get deterministic new
// ones. Nothing in here is fatal - the pipeline always produces a
// complete best-effort output set.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, EngineConfig};
use crate::consolidate::{Company, CompanyConsolidator, CompanyContactRelationship};
use crate::dedup::{Contact, ContactDeduplicator};
use crate::domain::DomainClassifier;
use crate::mappings::{DomainIndex, NameIndex};
use crate::matching::{ExternalRecord, MatchResult, MatchingEngine};
use crate::normalize::NameNormalizer;
use crate::records::{CustomerAggregate, RawRecord};
use crate::split::ContactSplitter;

// ============================================================================
// PIPELINE OUTPUT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub contacts: Vec<Contact>,
    pub companies: Vec<Company>,
    pub relationships: Vec<CompanyContactRelationship>,
    pub report: PipelineReport,
}

/// Per-run counters for the orchestrating collaborator's logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub record_count: usize,
    pub candidate_count: usize,
    pub contact_count: usize,
    pub missing_email_contact_count: usize,
    pub company_count: usize,
    pub relationship_count: usize,
    pub generated_at: DateTime<Utc>,
}

impl PipelineReport {
    pub fn summary(&self) -> String {
        format!(
            "{} records -> {} candidates -> {} contacts ({} without email), {} companies, {} relationships",
            self.record_count,
            self.candidate_count,
            self.contact_count,
            self.missing_email_contact_count,
            self.company_count,
            self.relationship_count
        )
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct IdentityPipeline {
    config: EngineConfig,
    classifier: DomainClassifier,
    normalizer: NameNormalizer,
}

impl IdentityPipeline {
    /// Validates the configuration once; every stage after this
    /// assumes a valid config.
    pub fn new(
        config: EngineConfig,
        domain_index: DomainIndex,
        name_index: NameIndex,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let normalizer = NameNormalizer::new(&config, name_index);
        Ok(IdentityPipeline {
            config,
            classifier: DomainClassifier::new(domain_index),
            normalizer,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Run the full consolidation over one immutable snapshot.
    pub fn run(
        &self,
        records: &[RawRecord],
        aggregates: &[CustomerAggregate],
    ) -> PipelineOutput {
        info!("Identity pipeline starting over {} records", records.len());

        // Stage 1: explode multi-valued email fields
        let splitter = ContactSplitter::new(&self.config);
        let mut candidates = Vec::new();
        for record in records {
            candidates.extend(splitter.split_record(record));
        }
        info!("Split stage produced {} candidates", candidates.len());

        // Stage 2: dedupe into canonical contacts (scoring happens
        // inside the tie-break and on the surviving contact)
        let deduper = ContactDeduplicator::new(&self.classifier);
        let contacts = deduper.dedupe(&candidates, records);
        let missing_email = contacts.iter().filter(|c| c.is_missing_email).count();
        info!(
            "Dedup stage produced {} contacts ({} without email)",
            contacts.len(),
            missing_email
        );

        // Stage 3: consolidate companies and rank their contacts
        let consolidator = CompanyConsolidator::new(&self.config, &self.classifier);
        let companies = consolidator.consolidate(records, aggregates);
        let relationships = consolidator.relate(&companies, &contacts, records);
        info!(
            "Consolidation produced {} companies, {} relationships",
            companies.len(),
            relationships.len()
        );

        let report = PipelineReport {
            record_count: records.len(),
            candidate_count: candidates.len(),
            contact_count: contacts.len(),
            missing_email_contact_count: missing_email,
            company_count: companies.len(),
            relationship_count: relationships.len(),
            generated_at: Utc::now(),
        };
        info!("{}", report.summary());

        PipelineOutput {
            contacts,
            companies,
            relationships,
            report,
        }
    }

    /// Downstream matching of external order records against an
    /// already-consolidated company set.
    pub fn match_external(
        &self,
        externals: &[ExternalRecord],
        companies: &[Company],
    ) -> Vec<MatchResult> {
        let engine = MatchingEngine::new(&self.config, &self.normalizer);
        engine.match_records(externals, companies)
    }
}

// ============================================================================
// TESTS
// ============================================================================
