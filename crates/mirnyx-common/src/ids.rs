//! Identifier canonicalisation for TCGA sample barcodes and miRNA accessions.
//!
//! Both functions are fixed points under repeated application, so callers
//! may re-canonicalise already-clean identifiers without damage.

/// Canonicalise a TCGA-style sample barcode to its patient portion:
/// the first three hyphen-delimited segments.
///
/// `TCGA-05-4244-01A` → `TCGA-05-4244`. Inputs with fewer than three
/// segments are returned unchanged.
pub fn canonicalize_sample_id(raw: &str) -> String {
    let segments: Vec<&str> = raw.split('-').collect();
    if segments.len() <= 3 {
        return raw.to_string();
    }
    segments[..3].join("-")
}

/// Canonicalise a miRNA accession to the precursor base form used by
/// miRBase/TargetScan:
///
/// 1. the lowercase substring `mir` becomes the conventional `miR`;
/// 2. a trailing copy-number segment is stripped
///    (`hsa-mir-21-1` → `hsa-miR-21`, `hsa-let-7a-2` → `hsa-let-7a`).
///
/// The copy-number strip only fires when the segment before it carries a
/// digit (the miRNA number). Without that guard a second application
/// would eat the miRNA number itself (`hsa-miR-21` → `hsa-miR`).
pub fn canonicalize_mirna_id(raw: &str) -> String {
    let id = raw.replace("mir", "miR");
    let segments: Vec<&str> = id.split('-').collect();
    if segments.len() >= 2 {
        let last = segments[segments.len() - 1];
        let prev = segments[segments.len() - 2];
        let last_is_copy_number = !last.is_empty() && last.chars().all(|c| c.is_ascii_digit());
        if last_is_copy_number && prev.chars().any(|c| c.is_ascii_digit()) {
            return segments[..segments.len() - 1].join("-");
        }
    }
    id
}
