// Identity Graph Engine - Core Library
// Entity resolution and consolidation for messy accounting-system
// exports: one canonical contact per real email address, one company
// per real organization, traceable links from raw rows to both.

pub mod config;      // Typed engine configuration
pub mod records;     // Raw input records + external aggregates
pub mod mappings;    // Domain/name mapping tables + injected indexes
pub mod normalize;   // Name Normalizer
pub mod domain;      // Domain Extractor / Classifier
pub mod split;       // Contact Splitter
pub mod identity;    // Stable Key Generator
pub mod quality;     // Quality Scorer
pub mod dedup;       // Contact Deduplicator
pub mod consolidate; // Company Consolidator
pub mod matching;    // Matching Engine
pub mod pipeline;    // Staged batch orchestration

// Re-export commonly used types
pub use config::{BusinessSizeBucket, ConfigError, EngineConfig, RevenueTier};
pub use records::{CustomerAggregate, RawRecord};
pub use mappings::{
    load_domain_mappings, load_name_mappings,
    DomainIndex, DomainMappingEntry, NameIndex, NameMappingEntry,
};
pub use normalize::{normalize_name, normalize_name_with, NameNormalizer};
pub use domain::{
    extract_domain, DomainClassifier, DomainResolution, DomainType, NO_EMAIL_DOMAIN,
};
pub use split::{ContactCandidate, ContactPriority, ContactSplitter, SourceTag};
pub use identity::{stable_company_id, stable_contact_id};
pub use quality::{
    CompletenessScore, EngagementFlags, NameQuality, QualityScorer, QualityTier,
};
pub use dedup::{Contact, ContactDeduplicator};
pub use consolidate::{
    Company, CompanyConsolidator, CompanyContactRelationship, ContactRole,
};
pub use matching::{ExternalRecord, MatchResult, MatchTier, MatchingEngine};
pub use pipeline::{IdentityPipeline, PipelineOutput, PipelineReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
