//! Edge collision resolution and output.
//!
//! Distinct mature arms resolving to the same precursor can produce
//! duplicate (mirna_id, gene_id) candidates with different weights; the
//! final table keeps the best-supported edge per pair.

use std::collections::HashSet;
use std::path::Path;

use mirnyx_common::error::{MirnyxError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One weighted interaction edge, precursor-keyed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub mirna_id: String,
    pub gene_id: String,
    pub weight: f64,
}

/// Sort candidates descending by weight and keep the first occurrence of
/// each (mirna_id, gene_id) pair. Ties break on the identifiers so the
/// output order is deterministic.
pub fn resolve_collisions(mut edges: Vec<Edge>) -> Vec<Edge> {
    let before = edges.len();
    edges.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.mirna_id.cmp(&b.mirna_id))
            .then_with(|| a.gene_id.cmp(&b.gene_id))
    });
    let mut seen: HashSet<(String, String)> = HashSet::new();
    edges.retain(|e| seen.insert((e.mirna_id.clone(), e.gene_id.clone())));
    if edges.len() < before {
        info!("Collision resolution: {} candidates reduced to {} edges", before, edges.len());
    }
    edges
}

/// Write the final edge table (`mirna_id,gene_id,weight`).
pub fn write_edges_csv(path: impl AsRef<Path>, edges: &[Edge]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|e| MirnyxError::Csv(e.to_string()))?;
    // serialize() only emits the header alongside a first record, so an
    // empty result still gets a well-formed header-only file.
    if edges.is_empty() {
        writer
            .write_record(["mirna_id", "gene_id", "weight"])
            .map_err(|e| MirnyxError::Csv(e.to_string()))?;
    }
    for edge in edges {
        writer
            .serialize(edge)
            .map_err(|e| MirnyxError::Csv(e.to_string()))?;
    }
    writer.flush()?;
    info!("Wrote {} edges to {:?}", edges.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(mirna: &str, gene: &str, weight: f64) -> Edge {
        Edge { mirna_id: mirna.to_string(), gene_id: gene.to_string(), weight }
    }

    #[test]
    fn test_collision_keeps_highest_weight() {
        // Two mature arms of hsa-mir-21 both resolved to the precursor.
        let edges = resolve_collisions(vec![
            edge("hsa-mir-21", "TP53", 0.6),
            edge("hsa-mir-21", "TP53", 0.8),
        ]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].weight, 0.8);
    }

    #[test]
    fn test_output_sorted_descending() {
        let edges = resolve_collisions(vec![
            edge("hsa-mir-21", "TP53", 0.3),
            edge("hsa-let-7a", "MYC", 0.9),
            edge("hsa-mir-122", "KRAS", 0.5),
        ]);
        let weights: Vec<f64> = edges.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![0.9, 0.5, 0.3]);
    }

    #[test]
    fn test_no_duplicate_pairs_in_output() {
        let edges = resolve_collisions(vec![
            edge("hsa-mir-21", "TP53", 0.6),
            edge("hsa-mir-21", "TP53", 0.8),
            edge("hsa-mir-21", "KRAS", 0.8),
        ]);
        let mut pairs: Vec<(String, String)> = edges
            .iter()
            .map(|e| (e.mirna_id.clone(), e.gene_id.clone()))
            .collect();
        pairs.sort();
        pairs.dedup();
        assert_eq!(pairs.len(), edges.len());
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.csv");
        let edges = vec![edge("hsa-mir-21", "TP53", 0.8), edge("hsa-let-7a", "MYC", 0.5)];
        write_edges_csv(&path, &edges).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let parsed: Vec<Edge> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(parsed, edges);
        assert!(content.starts_with("mirna_id,gene_id,weight"));
    }
}
