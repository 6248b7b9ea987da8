// 🏢 Company Consolidator - One company per normalized domain key
//
// Groups customer records by company_domain_key and selects
// representative attributes instead of merging fields: the name is the
// longest explicit company name among members, everything else comes
// from the most financially significant member record. Aggregated
// revenue/order metrics arrive precomputed from the external
// aggregation job and are only summed per domain key here.
//
// Records resolving to NO_EMAIL_DOMAIN (or a skip domain) never form a
// company; they stay in the contact output for audit.

use log::info;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::dedup::Contact;
use crate::domain::{DomainClassifier, DomainResolution, DomainType};
use crate::identity::stable_company_id;
use crate::records::{CustomerAggregate, RawRecord};

// ============================================================================
// COMPANY
// ============================================================================

/// Consolidated company entity keyed by its normalized email domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    /// Stable id: content hash of the domain key
    pub id: Uuid,

    pub company_domain_key: String,
    pub domain_type: DomainType,

    /// Representative name: longest explicit company name among members
    pub name: String,

    /// Distinct raw company names seen across members (sorted)
    pub aliases: Vec<String>,

    // Representative contact attributes, all taken from the most
    // financially significant member record (not merged across members)
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,

    /// Member record ids, ascending
    pub member_record_ids: Vec<String>,
    pub member_count: usize,
    pub distinct_name_count: usize,

    pub total_balance: f64,

    /// Summed from the externally supplied per-customer aggregates
    pub total_revenue: f64,
    pub total_order_count: u64,

    pub business_size: String,
    pub revenue_tier: String,
}

// ============================================================================
// COMPANY / CONTACT RELATIONSHIP
// ============================================================================

/// Role classification derived from the contact's job title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactRole {
    Executive,
    Finance,
    Operations,
    General,
}

impl ContactRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactRole::Executive => "executive",
            ContactRole::Finance => "finance",
            ContactRole::Operations => "operations",
            ContactRole::General => "general",
        }
    }

    /// Keyword classification over the lowercased job title
    pub fn from_job_title(job_title: &str) -> Self {
        let title = job_title.to_lowercase();
        if title.is_empty() {
            return ContactRole::General;
        }

        const EXECUTIVE: &[&str] =
            &["ceo", "president", "founder", "owner", "chief", "director", "vp", "vice president"];
        const FINANCE: &[&str] =
            &["cfo", "account", "billing", "finance", "controller", "bookkeep", "treasurer"];
        const OPERATIONS: &[&str] =
            &["operations", "manager", "coordinator", "admin", "office", "purchasing", "buyer"];

        if EXECUTIVE.iter().any(|k| title.contains(k)) {
            ContactRole::Executive
        } else if FINANCE.iter().any(|k| title.contains(k)) {
            ContactRole::Finance
        } else if OPERATIONS.iter().any(|k| title.contains(k)) {
            ContactRole::Operations
        } else {
            ContactRole::General
        }
    }
}

/// Link between a Contact and its Company. Exactly one relationship
/// per company carries rank 1 when the company has any contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyContactRelationship {
    pub company_id: Uuid,
    pub contact_id: Uuid,

    /// 1 = primary contact for the company
    pub rank: usize,
    pub role: ContactRole,
    pub is_primary_company_contact: bool,
}

// ============================================================================
// CONSOLIDATOR
// ============================================================================

pub struct CompanyConsolidator<'a> {
    config: &'a EngineConfig,
    classifier: &'a DomainClassifier,
}

impl<'a> CompanyConsolidator<'a> {
    pub fn new(config: &'a EngineConfig, classifier: &'a DomainClassifier) -> Self {
        CompanyConsolidator { config, classifier }
    }

    /// Resolve a record's company domain key: primary email field
    /// first, cc field as fallback, sentinel when neither resolves.
    pub fn resolve_record(&self, record: &RawRecord) -> DomainResolution {
        let resolution = self.classifier.resolve_field(&record.email);
        if !resolution.is_missing_email {
            return resolution;
        }
        self.classifier.resolve_field(&record.cc_email)
    }

    /// Group records by domain key and build one Company per
    /// consolidatable key, ordered by key.
    pub fn consolidate(
        &self,
        records: &[RawRecord],
        aggregates: &[CustomerAggregate],
    ) -> Vec<Company> {
        let aggregates_by_record: HashMap<&str, &CustomerAggregate> = aggregates
            .iter()
            .map(|a| (a.record_id.as_str(), a))
            .collect();

        // BTreeMap keeps company output ordered by domain key
        let mut groups: BTreeMap<String, (DomainType, Vec<&RawRecord>)> = BTreeMap::new();
        let mut excluded = 0usize;

        for record in records {
            let resolution = self.resolve_record(record);
            if !resolution.is_consolidatable() {
                excluded += 1;
                continue;
            }
            let domain_type = resolution
                .domain_type
                .unwrap_or(DomainType::Corporate);
            groups
                .entry(resolution.company_domain_key)
                .or_insert_with(|| (domain_type, Vec::new()))
                .1
                .push(record);
        }

        if excluded > 0 {
            info!(
                "{} records excluded from consolidation (no resolvable domain or skip domain)",
                excluded
            );
        }

        groups
            .into_iter()
            .map(|(key, (domain_type, members))| {
                self.build_company(&key, domain_type, &members, &aggregates_by_record)
            })
            .collect()
    }

    fn build_company(
        &self,
        domain_key: &str,
        domain_type: DomainType,
        members: &[&RawRecord],
        aggregates_by_record: &HashMap<&str, &CustomerAggregate>,
    ) -> Company {
        // Representative record: balance desc (nulls last), record id asc
        let mut ordered: Vec<&RawRecord> = members.to_vec();
        ordered.sort_by(|a, b| {
            cmp_balance_desc_nulls_last(a.balance, b.balance)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        let representative = ordered[0];

        let name = representative_name(&ordered).unwrap_or_else(|| domain_key.to_string());

        let mut aliases: Vec<String> = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        for member in &ordered {
            let raw = member.company_name.trim();
            if raw.is_empty() {
                continue;
            }
            if seen_names.insert(raw.to_uppercase()) {
                aliases.push(raw.to_string());
            }
        }
        let distinct_name_count = aliases.len();
        aliases.sort();

        let mut member_record_ids: Vec<String> =
            ordered.iter().map(|m| m.record_id.clone()).collect();
        member_record_ids.sort();

        let total_balance: f64 = ordered.iter().filter_map(|m| m.balance).sum();
        let (total_revenue, total_order_count) = ordered.iter().fold(
            (0.0f64, 0u64),
            |(revenue, orders), member| match aggregates_by_record.get(member.record_id.as_str()) {
                Some(aggregate) => (
                    revenue + aggregate.total_revenue,
                    orders + aggregate.order_count,
                ),
                None => (revenue, orders),
            },
        );

        Company {
            id: stable_company_id(domain_key),
            company_domain_key: domain_key.to_string(),
            domain_type,
            name,
            aliases,
            email: representative.email.trim().to_string(),
            phone: representative.primary_phone.trim().to_string(),
            address_line1: representative.address_line1.trim().to_string(),
            city: representative.city.trim().to_string(),
            state: representative.state.trim().to_string(),
            postal_code: representative.postal_code.trim().to_string(),
            member_count: ordered.len(),
            member_record_ids,
            distinct_name_count,
            total_balance,
            total_revenue,
            total_order_count,
            business_size: self.config.business_size_label(ordered.len()).to_string(),
            revenue_tier: self.config.revenue_tier_label(total_revenue).to_string(),
        }
    }

    /// Rank each company's contacts with the deduplication tie-break
    /// order (completeness desc, priority, balance desc, record id) and
    /// flag rank 1 as the primary company contact.
    pub fn relate(
        &self,
        companies: &[Company],
        contacts: &[Contact],
        records: &[RawRecord],
    ) -> Vec<CompanyContactRelationship> {
        let records_by_id: HashMap<&str, &RawRecord> = records
            .iter()
            .map(|record| (record.record_id.as_str(), record))
            .collect();

        let mut contacts_by_domain: HashMap<&str, Vec<&Contact>> = HashMap::new();
        for contact in contacts {
            contacts_by_domain
                .entry(contact.company_domain_key.as_str())
                .or_default()
                .push(contact);
        }

        let mut relationships = Vec::new();

        for company in companies {
            let Some(members) = contacts_by_domain.get(company.company_domain_key.as_str())
            else {
                continue;
            };

            let mut ranked: Vec<&Contact> = members.clone();
            ranked.sort_by(|a, b| {
                b.completeness_score
                    .cmp(&a.completeness_score)
                    .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
                    .then_with(|| {
                        cmp_balance_desc_nulls_last(
                            records_by_id.get(a.record_id.as_str()).and_then(|r| r.balance),
                            records_by_id.get(b.record_id.as_str()).and_then(|r| r.balance),
                        )
                    })
                    .then_with(|| a.record_id.cmp(&b.record_id))
                    .then_with(|| a.id.cmp(&b.id))
            });

            for (index, contact) in ranked.iter().enumerate() {
                let rank = index + 1;
                let record = records_by_id.get(contact.record_id.as_str());
                let role = record
                    .map(|r| ContactRole::from_job_title(&r.job_title))
                    .unwrap_or(ContactRole::General);

                relationships.push(CompanyContactRelationship {
                    company_id: company.id,
                    contact_id: contact.id,
                    rank,
                    role,
                    is_primary_company_contact: rank == 1,
                });
            }
        }

        relationships
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

/// Longest non-empty explicit company name; ties go to the member with
/// the higher balance, then the lower record id.
fn representative_name(ordered_members: &[&RawRecord]) -> Option<String> {
    let mut named: Vec<&RawRecord> = ordered_members
        .iter()
        .copied()
        .filter(|m| !m.company_name.trim().is_empty())
        .collect();
    if named.is_empty() {
        return None;
    }

    named.sort_by(|a, b| {
        b.company_name
            .trim()
            .chars()
            .count()
            .cmp(&a.company_name.trim().chars().count())
            .then_with(|| cmp_balance_desc_nulls_last(a.balance, b.balance))
            .then_with(|| a.record_id.cmp(&b.record_id))
    });

    Some(named[0].company_name.trim().to_string())
}

// ============================================================================
// TESTS
// ============================================================================
