//! Candidate interaction tables.
//!
//! Two sources feed the candidate set: an experimentally validated
//! database (miRTarBase-style) and a sequence-prediction database
//! (TargetScan-style, family-expanded upstream). The merge tags
//! provenance with an explicit boolean and concatenates validated rows
//! first, so keep-first deduplication makes validated status win on
//! conflict.

use std::collections::HashSet;
use std::path::Path;

use mirnyx_common::error::{MirnyxError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One (miRNA, gene) pair as stored in a processed interaction CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub mirna_id: String,
    pub gene_id: String,
}

/// A provenance-tagged candidate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateInteraction {
    pub mirna_id: String,
    pub gene_id: String,
    pub validated: bool,
}

/// Load a processed interaction CSV (`mirna_id,gene_id` header).
pub fn load_interactions_csv(path: impl AsRef<Path>) -> Result<Vec<InteractionRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MirnyxError::MissingInput(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut records = Vec::new();
    for record in reader.deserialize::<InteractionRecord>() {
        records.push(record.map_err(|e| MirnyxError::Csv(e.to_string()))?);
    }
    info!("Loaded {} interactions from {:?}", records.len(), path);
    Ok(records)
}

/// Write interaction records as a processed CSV.
pub fn write_interactions_csv(
    path: impl AsRef<Path>,
    records: &[InteractionRecord],
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| MirnyxError::Csv(e.to_string()))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| MirnyxError::Csv(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Merge validated and predicted pairs into one deduplicated candidate
/// set. Validated rows come first; the first occurrence of each
/// (mirna_id, gene_id) pair wins, so a pair present in both sources
/// keeps `validated = true`.
pub fn merge_candidates(
    validated: Vec<InteractionRecord>,
    predicted: Vec<InteractionRecord>,
) -> Vec<CandidateInteraction> {
    let tagged = validated
        .into_iter()
        .map(|r| CandidateInteraction { mirna_id: r.mirna_id, gene_id: r.gene_id, validated: true })
        .chain(predicted.into_iter().map(|r| CandidateInteraction {
            mirna_id: r.mirna_id,
            gene_id: r.gene_id,
            validated: false,
        }));

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut merged = Vec::new();
    for candidate in tagged {
        if seen.insert((candidate.mirna_id.clone(), candidate.gene_id.clone())) {
            merged.push(candidate);
        }
    }
    info!("Merged candidate set: {} unique interactions", merged.len());
    merged
}

// ── Raw-dump preprocessing ─────────────────────────────────────────────────

/// Column headers in the raw validated-interaction dump.
const RAW_MIRNA_COLUMN: &str = "miRNA";
const RAW_GENE_COLUMN: &str = "Target Gene";
const RAW_SPECIES_COLUMN: &str = "Species (miRNA)";
/// Species tag kept by the filter.
const HUMAN_SPECIES_TAG: &str = "hsa";

/// Filter a raw validated-interaction dump to human rows and project it
/// to the canonical (mirna_id, gene_id) shape, dropping duplicates.
pub fn preprocess_validated(path: impl AsRef<Path>) -> Result<Vec<InteractionRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MirnyxError::MissingInput(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| MirnyxError::Csv(e.to_string()))?
        .clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| MirnyxError::Csv(format!("column '{}' not found", name)))
    };
    let mirna_idx = col(RAW_MIRNA_COLUMN)?;
    let gene_idx = col(RAW_GENE_COLUMN)?;
    let species_idx = col(RAW_SPECIES_COLUMN)?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| MirnyxError::Csv(e.to_string()))?;
        if record.get(species_idx).map(str::trim) != Some(HUMAN_SPECIES_TAG) {
            continue;
        }
        if let (Some(mirna), Some(gene)) = (record.get(mirna_idx), record.get(gene_idx)) {
            let pair = (mirna.trim().to_string(), gene.trim().to_string());
            if pair.0.is_empty() || pair.1.is_empty() {
                continue;
            }
            if seen.insert(pair.clone()) {
                records.push(InteractionRecord { mirna_id: pair.0, gene_id: pair.1 });
            }
        }
    }
    info!("Preprocessed validated dump: {} human interactions", records.len());
    Ok(records)
}
