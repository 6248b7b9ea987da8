// 🔑 Stable Key Generator - Content-derived identity that survives reordering
//
// The id of a contact is a pure function of (owning record id,
// canonical email, source tag). Position within the multi-valued field
// is deliberately NOT an input: re-exports reorder those fields, and
// the same real contact must keep the same id across runs. Folding the
// position into the hash is the historical defect this module exists
// to prevent.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::split::SourceTag;

/// Field separator inside the hash input. Keeps ("ab", "c") and
/// ("a", "bc") from colliding.
const SEP: &[u8] = &[0x1f];

/// Stable contact id: Sha256 over exactly (record id, canonical email,
/// source tag), rendered as a UUID from the first 16 digest bytes.
/// `canonical_email` is None for the minimal no-email contacts.
pub fn stable_contact_id(
    record_id: &str,
    canonical_email: Option<&str>,
    source_tag: SourceTag,
) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(b"contact");
    hasher.update(SEP);
    hasher.update(record_id.as_bytes());
    hasher.update(SEP);
    hasher.update(canonical_email.unwrap_or("").to_lowercase().as_bytes());
    hasher.update(SEP);
    hasher.update(source_tag.as_str().as_bytes());

    digest_to_uuid(hasher)
}

/// Stable company id: content hash of the company domain key, so the
/// same organization gets the same id on every run.
pub fn stable_company_id(company_domain_key: &str) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(b"company");
    hasher.update(SEP);
    hasher.update(company_domain_key.to_lowercase().as_bytes());

    digest_to_uuid(hasher)
}

fn digest_to_uuid(hasher: Sha256) -> Uuid {
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

// ============================================================================
// TESTS
// ============================================================================
