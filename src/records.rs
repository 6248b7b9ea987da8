// 📇 Raw Records - Snapshot rows from the external accounting export
// Owned by the ingestion collaborator; the engine only reads them.
//
// One RawRecord per exported customer/contact row. The multi-valued
// email fields keep their raw delimited form here - splitting them
// into individual contacts is the Contact Splitter's job.

use serde::{Deserialize, Serialize};

// ============================================================================
// RAW RECORD
// ============================================================================

/// One input row as handed over by the ingestion collaborator.
/// Core fields are immutable for the duration of a run; metadata can
/// grow without breaking changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Source-system identifier (unique per row, stable across exports)
    pub record_id: String,

    /// Which external system exported this row
    #[serde(default)]
    pub source_system: String,

    // ========================================================================
    // NAME FIELDS
    // ========================================================================
    /// Free-form display name as exported ("Peterson, Chris", "ACME LLC", ...)
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    /// Honorific ("Mr.", "Dr.", ...)
    #[serde(default)]
    pub name_title: String,

    #[serde(default)]
    pub job_title: String,

    /// Explicit company name, when the source system carries one
    #[serde(default)]
    pub company_name: String,

    // ========================================================================
    // CONTACT FIELDS (email fields are multi-valued, ';'-delimited)
    // ========================================================================
    #[serde(default)]
    pub email: String,

    /// Secondary / cc addresses
    #[serde(default)]
    pub cc_email: String,

    #[serde(default)]
    pub primary_phone: String,

    #[serde(default)]
    pub alt_phone: String,

    #[serde(default)]
    pub mobile_phone: String,

    // ========================================================================
    // ADDRESS FIELDS
    // ========================================================================
    #[serde(default)]
    pub address_line1: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub postal_code: String,

    // ========================================================================
    // BUSINESS FIELDS
    // ========================================================================
    /// Account balance in the source system; None when the export had no value
    #[serde(default)]
    pub balance: Option<f64>,

    /// Active/inactive status flag from the source system
    #[serde(default = "default_active")]
    pub is_active: bool,

    // ========================================================================
    // METADATA (extensible)
    // ========================================================================
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_active() -> bool {
    true
}

impl RawRecord {
    /// Minimal record with only the identifying fields set.
    /// Everything else defaults to empty, matching a sparse export row.
    pub fn new(record_id: &str, source_system: &str) -> Self {
        RawRecord {
            record_id: record_id.to_string(),
            source_system: source_system.to_string(),
            display_name: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            name_title: String::new(),
            job_title: String::new(),
            company_name: String::new(),
            email: String::new(),
            cc_email: String::new(),
            primary_phone: String::new(),
            alt_phone: String::new(),
            mobile_phone: String::new(),
            address_line1: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            balance: None,
            is_active: true,
            metadata: serde_json::Value::Null,
        }
    }

    /// Both structured name parts present
    pub fn has_structured_name(&self) -> bool {
        !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty()
    }

    /// "First Last" when both parts are present, otherwise the display name
    pub fn full_name(&self) -> String {
        if self.has_structured_name() {
            format!("{} {}", self.first_name.trim(), self.last_name.trim())
        } else {
            self.display_name.trim().to_string()
        }
    }

    pub fn has_primary_phone(&self) -> bool {
        !self.primary_phone.trim().is_empty()
    }

    /// Any phone beyond the primary one
    pub fn has_secondary_phone(&self) -> bool {
        !self.alt_phone.trim().is_empty() || !self.mobile_phone.trim().is_empty()
    }

    pub fn has_address(&self) -> bool {
        !self.address_line1.trim().is_empty()
    }
}

// ============================================================================
// EXTERNAL AGGREGATES
// ============================================================================

/// Per-customer revenue/order totals computed by the external
/// aggregation job and joined in by record id during consolidation.
/// The engine never derives these numbers itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub record_id: String,
    pub total_revenue: f64,
    pub order_count: u64,
}

// ============================================================================
// TESTS
// ============================================================================
