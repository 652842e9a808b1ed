//! miRNA family expansion for prediction databases.
//!
//! TargetScan-style dumps key interactions by family label (e.g.
//! `miR-21-5p` covering every family member); expression data is per
//! miRNA. The family-info table maps each family to its member miRBase
//! accessions so predicted rows can be expanded one-per-member before
//! they reach the candidate merger.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use mirnyx_common::error::{MirnyxError, Result};
use tracing::{info, warn};

use crate::interactions::InteractionRecord;

/// Column headers in the family-info TSV.
const FAMILY_COLUMN: &str = "miR family";
const MEMBER_COLUMN: &str = "MiRBase ID";
const SPECIES_COLUMN: &str = "Species ID";
/// NCBI taxonomy id for human.
const HUMAN_SPECIES_ID: &str = "9606";

/// Column headers in the raw predicted-interaction TSV.
const PREDICTED_FAMILY_COLUMN: &str = "miR Family";
const PREDICTED_GENE_COLUMN: &str = "Gene Symbol";

/// Family label → member miRBase accessions, human rows only.
#[derive(Debug, Clone, Default)]
pub struct FamilyMap {
    members: HashMap<String, Vec<String>>,
}

impl FamilyMap {
    /// Build from the family-info TSV on disk.
    pub fn from_tsv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MirnyxError::MissingInput(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let map = Self::from_tsv(&content)?;
        info!("Loaded family map from {:?}: {} families", path, map.n_families());
        Ok(map)
    }

    /// Build from family-info TSV text.
    pub fn from_tsv(tsv: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(tsv.as_bytes());
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
        let family_idx = col(FAMILY_COLUMN)?;
        let member_idx = col(MEMBER_COLUMN)?;
        let species_idx = col(SPECIES_COLUMN)?;

        let mut members: HashMap<String, Vec<String>> = HashMap::new();
        for record in reader.records() {
            let record = record.map_err(|e| MirnyxError::Csv(e.to_string()))?;
            if record.get(species_idx).map(str::trim) != Some(HUMAN_SPECIES_ID) {
                continue;
            }
            if let (Some(family), Some(member)) =
                (record.get(family_idx), record.get(member_idx))
            {
                if family.trim().is_empty() || member.trim().is_empty() {
                    continue;
                }
                members
                    .entry(family.trim().to_string())
                    .or_default()
                    .push(member.trim().to_string());
            }
        }
        Ok(Self { members })
    }

    pub fn members(&self, family: &str) -> Option<&[String]> {
        self.members.get(family).map(|v| v.as_slice())
    }

    pub fn n_families(&self) -> usize {
        self.members.len()
    }
}

/// Expand a raw predicted-interaction TSV (family label, gene symbol)
/// into per-miRNA records, deduplicated on (mirna_id, gene_id).
///
/// Families absent from the map fall back to the label itself, with an
/// `hsa-` prefix added when the label is a bare `miR` form; such rows
/// usually fail precursor resolution later and drop out there.
pub fn expand_predicted(path: impl AsRef<Path>, families: &FamilyMap) -> Result<Vec<InteractionRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MirnyxError::MissingInput(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(content.as_bytes());
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
    let family_idx = col(PREDICTED_FAMILY_COLUMN)?;
    let gene_idx = col(PREDICTED_GENE_COLUMN)?;

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut expanded = Vec::new();
    let mut unmapped_families: HashSet<String> = HashSet::new();

    for record in reader.records() {
        let record = record.map_err(|e| MirnyxError::Csv(e.to_string()))?;
        let (family, gene) = match (record.get(family_idx), record.get(gene_idx)) {
            (Some(f), Some(g)) if !f.trim().is_empty() && !g.trim().is_empty() => {
                (f.trim().to_string(), g.trim().to_string())
            }
            _ => continue,
        };

        let member_ids: Vec<String> = match families.members(&family) {
            Some(ids) => ids.to_vec(),
            None => {
                unmapped_families.insert(family.clone());
                vec![fallback_member_id(&family)]
            }
        };

        for mirna_id in member_ids {
            let pair = (mirna_id, gene.clone());
            if seen.insert(pair.clone()) {
                expanded.push(InteractionRecord { mirna_id: pair.0, gene_id: pair.1 });
            }
        }
    }

    if !unmapped_families.is_empty() {
        warn!(
            "{} predicted families had no family-info mapping; kept their labels as-is",
            unmapped_families.len()
        );
    }
    info!("Expanded predicted interactions: {} records", expanded.len());
    Ok(expanded)
}

/// Fallback identifier for a family label missing from the map.
fn fallback_member_id(family: &str) -> String {
    if !family.starts_with("hsa-") && family.contains("miR") {
        format!("hsa-{}", family)
    } else {
        family.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY_TSV: &str = "\
miR family\tSeed+m8\tSpecies ID\tMiRBase ID\n\
miR-21-5p\tAGCUUAU\t9606\thsa-miR-21-5p\n\
let-7-5p\tGAGGUAG\t9606\thsa-let-7a-5p\n\
let-7-5p\tGAGGUAG\t9606\thsa-let-7b-5p\n\
let-7-5p\tGAGGUAG\t10090\tmmu-let-7a-5p\n";

    #[test]
    fn test_family_map_is_species_filtered() {
        let map = FamilyMap::from_tsv(FAMILY_TSV).unwrap();
        assert_eq!(map.n_families(), 2);
        let let7 = map.members("let-7-5p").unwrap();
        assert_eq!(let7, ["hsa-let-7a-5p".to_string(), "hsa-let-7b-5p".to_string()]);
    }

    #[test]
    fn test_expand_predicted_per_member() {
        let dir = tempfile::tempdir().unwrap();
        let predicted = dir.path().join("predicted.txt");
        std::fs::write(
            &predicted,
            "miR Family\tGene Symbol\nlet-7-5p\tMYC\nmiR-21-5p\tTP53\n",
        )
        .unwrap();
        let map = FamilyMap::from_tsv(FAMILY_TSV).unwrap();
        let expanded = expand_predicted(&predicted, &map).unwrap();
        assert_eq!(expanded.len(), 3);
        assert!(expanded.iter().any(|r| r.mirna_id == "hsa-let-7a-5p" && r.gene_id == "MYC"));
        assert!(expanded.iter().any(|r| r.mirna_id == "hsa-let-7b-5p" && r.gene_id == "MYC"));
        assert!(expanded.iter().any(|r| r.mirna_id == "hsa-miR-21-5p" && r.gene_id == "TP53"));
    }

    #[test]
    fn test_expand_unmapped_family_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let predicted = dir.path().join("predicted.txt");
        std::fs::write(&predicted, "miR Family\tGene Symbol\nmiR-9999-5p\tEGFR\n").unwrap();
        let expanded = expand_predicted(&predicted, &FamilyMap::default()).unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].mirna_id, "hsa-miR-9999-5p");
    }
}
