// ✅ Quality Scorer - Completeness scoring for canonical contacts
//
// Deterministic 0-100 point sum over the contact's declared inputs,
// plus the derived tier label and engagement flags. Each component is
// independent and additive; the weights total exactly 100.

use serde::{Deserialize, Serialize};

use crate::records::RawRecord;

// ============================================================================
// SCORE WEIGHTS
// ============================================================================

pub const POINTS_EMAIL: u8 = 25;
pub const POINTS_FULL_NAME: u8 = 20;
pub const POINTS_PRIMARY_PHONE: u8 = 15;
pub const POINTS_JOB_TITLE: u8 = 10;
pub const POINTS_ADDRESS: u8 = 10;
pub const POINTS_NAME_COMPLETE: u8 = 10;
pub const POINTS_NAME_OTHER: u8 = 5;
pub const POINTS_SECONDARY_PHONE: u8 = 5;
pub const POINTS_HONORIFIC: u8 = 5;

// ============================================================================
// NAME QUALITY
// ============================================================================

/// How trustworthy the contact's name is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameQuality {
    /// Both structured first/last parts present, not derived
    Complete,

    /// Only a free-form display name
    Partial,

    /// Derived from the email local part
    Derived,

    /// No usable name at all
    Missing,
}

impl NameQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameQuality::Complete => "complete",
            NameQuality::Partial => "partial",
            NameQuality::Derived => "derived",
            NameQuality::Missing => "missing",
        }
    }
}

// ============================================================================
// QUALITY TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Complete,
    Good,
    Partial,
    Minimal,
}

impl QualityTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            75..=u8::MAX => QualityTier::Complete,
            50..=74 => QualityTier::Good,
            25..=49 => QualityTier::Partial,
            _ => QualityTier::Minimal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Complete => "complete",
            QualityTier::Good => "good",
            QualityTier::Partial => "partial",
            QualityTier::Minimal => "minimal",
        }
    }
}

// ============================================================================
// COMPLETENESS SCORE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessScore {
    pub score: u8,
    pub tier: QualityTier,
}

// ============================================================================
// ENGAGEMENT FLAGS
// ============================================================================

/// Derived booleans computed from the same inputs as the score.
/// These are not re-scored: a marketable email adds nothing beyond
/// the email points themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementFlags {
    /// Has an email and the source record is active
    pub email_marketable: bool,

    /// Has a primary phone and the source record is active
    pub phone_callable: bool,

    /// Has a street address and the source record is active
    pub mail_reachable: bool,
}

// ============================================================================
// SCORER
// ============================================================================

pub struct QualityScorer;

impl QualityScorer {
    /// Score one contact's inputs. Pure function of its arguments:
    /// the owning record's fields plus the candidate-level email and
    /// name facts.
    pub fn score(
        record: &RawRecord,
        has_email: bool,
        display_name: &str,
        name_quality: NameQuality,
    ) -> CompletenessScore {
        let mut points: u32 = 0;

        if has_email {
            points += POINTS_EMAIL as u32;
        }
        if has_full_name(record, display_name) {
            points += POINTS_FULL_NAME as u32;
        }
        if record.has_primary_phone() {
            points += POINTS_PRIMARY_PHONE as u32;
        }
        if !record.job_title.trim().is_empty() {
            points += POINTS_JOB_TITLE as u32;
        }
        if record.has_address() {
            points += POINTS_ADDRESS as u32;
        }
        points += if name_quality == NameQuality::Complete {
            POINTS_NAME_COMPLETE as u32
        } else {
            POINTS_NAME_OTHER as u32
        };
        if record.has_secondary_phone() {
            points += POINTS_SECONDARY_PHONE as u32;
        }
        if !record.name_title.trim().is_empty() {
            points += POINTS_HONORIFIC as u32;
        }

        let score = points.min(100) as u8;
        CompletenessScore {
            score,
            tier: QualityTier::from_score(score),
        }
    }

    /// Engagement flags for the same inputs
    pub fn flags(record: &RawRecord, has_email: bool) -> EngagementFlags {
        EngagementFlags {
            email_marketable: has_email && record.is_active,
            phone_callable: record.has_primary_phone() && record.is_active,
            mail_reachable: record.has_address() && record.is_active,
        }
    }
}

/// A full name is either both structured parts or a display name with
/// at least two words
fn has_full_name(record: &RawRecord, display_name: &str) -> bool {
    record.has_structured_name() || display_name.split_whitespace().count() >= 2
}

// ============================================================================
// TESTS
// ============================================================================
