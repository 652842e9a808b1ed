//! Merge per-sample miRNA quantification files into one expression matrix.
//!
//! A GDC-style download yields one two-column TSV per sample plus a
//! manifest TSV listing the file names and a metadata JSON mapping each
//! file to its sample barcode. The merged matrix is keyed by canonical
//! precursor accession with one column per patient.

use std::collections::HashMap;
use std::path::Path;

use mirnyx_common::error::{MirnyxError, Result};
use mirnyx_common::ids::canonicalize_sample_id;
use tracing::{info, warn};

/// Header of the manifest column holding the per-sample file name.
const MANIFEST_FILENAME_COLUMN: &str = "filename";
/// Columns read from each per-sample quantification file.
const QUANT_ID_COLUMN: &str = "miRNA_ID";
const QUANT_VALUE_COLUMN: &str = "reads_per_million_miRNA_mapped";

/// Per-file outcomes of a merge run.
#[derive(Debug, Default, Clone)]
pub struct MergeStats {
    pub files_merged: usize,
    pub files_missing: usize,
    pub files_unmapped: usize,
    pub files_unreadable: usize,
}

impl MergeStats {
    pub fn log_summary(&self) {
        info!(
            "miRNA merge: {} files merged, {} missing on disk, {} without metadata mapping, {} unreadable",
            self.files_merged, self.files_missing, self.files_unmapped, self.files_unreadable
        );
    }
}

/// Parse the metadata JSON into a file-name → canonical sample id map.
///
/// Each entry carries a `file_name` and a list of `associated_entities`;
/// the first entity's `entity_submitter_id` is the sample barcode.
pub fn file_to_sample_map(metadata_path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
    let path = metadata_path.as_ref();
    if !path.exists() {
        return Err(MirnyxError::MissingInput(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let metadata: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| MirnyxError::Metadata(e.to_string()))?;

    let entries = metadata
        .as_array()
        .ok_or_else(|| MirnyxError::Metadata("metadata root is not an array".to_string()))?;

    let mut mapping = HashMap::new();
    for entry in entries {
        let file_name = entry["file_name"].as_str();
        let submitter_id = entry["associated_entities"]
            .as_array()
            .and_then(|ents| ents.first())
            .and_then(|ent| ent["entity_submitter_id"].as_str());
        if let (Some(file_name), Some(submitter_id)) = (file_name, submitter_id) {
            mapping.insert(file_name.to_string(), canonicalize_sample_id(submitter_id));
        }
    }
    info!("Parsed metadata: {} file-to-sample mappings", mapping.len());
    Ok(mapping)
}

/// Merge every manifest-listed quantification file under `data_dir` into
/// an expression matrix column set.
///
/// The returned matrix is raw: callers apply miRNA row normalisation and
/// zero-row dropping on top (see the `merge-mirna` pipeline step).
pub fn merge_quantifications(
    data_dir: impl AsRef<Path>,
    manifest_path: impl AsRef<Path>,
    metadata_path: impl AsRef<Path>,
) -> Result<(crate::ExpressionMatrix, MergeStats)> {
    let data_dir = data_dir.as_ref();
    let manifest_path = manifest_path.as_ref();
    if !manifest_path.exists() {
        return Err(MirnyxError::MissingInput(manifest_path.to_path_buf()));
    }

    let mapping = file_to_sample_map(metadata_path)?;
    let mut stats = MergeStats::default();
    let mut columns: Vec<(String, HashMap<String, f64>)> = Vec::new();

    let manifest = std::fs::read_to_string(manifest_path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(manifest.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| MirnyxError::Csv(e.to_string()))?
        .clone();
    let filename_idx = headers
        .iter()
        .position(|h| h.trim() == MANIFEST_FILENAME_COLUMN)
        .ok_or_else(|| {
            MirnyxError::Config(format!(
                "manifest column '{}' not found",
                MANIFEST_FILENAME_COLUMN
            ))
        })?;

    for record in reader.records() {
        let record = record.map_err(|e| MirnyxError::Csv(e.to_string()))?;
        let file_name = match record.get(filename_idx) {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => continue,
        };
        let file_path = data_dir.join(&file_name);
        if !file_path.exists() {
            stats.files_missing += 1;
            continue;
        }
        let base_name = Path::new(&file_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());
        let sample_id = match mapping.get(&base_name) {
            Some(id) => id.clone(),
            None => {
                stats.files_unmapped += 1;
                continue;
            }
        };
        match read_quantification(&file_path) {
            Ok(column) => {
                columns.push((sample_id, column));
                stats.files_merged += 1;
            }
            Err(e) => {
                warn!("Skipping unreadable quantification file {:?}: {}", file_path, e);
                stats.files_unreadable += 1;
            }
        }
    }

    if columns.is_empty() {
        return Err(MirnyxError::Metadata(
            "no quantification files could be merged".to_string(),
        ));
    }

    let matrix = crate::ExpressionMatrix::from_sample_columns(columns);
    stats.log_summary();
    Ok((matrix, stats))
}

/// Read one per-sample quantification TSV into a miRNA id → value map.
fn read_quantification(path: &Path) -> Result<HashMap<String, f64>> {
    let content = std::fs::read_to_string(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| MirnyxError::Csv(e.to_string()))?
        .clone();
    let id_idx = headers
        .iter()
        .position(|h| h.trim() == QUANT_ID_COLUMN)
        .ok_or_else(|| MirnyxError::Csv(format!("column '{}' not found", QUANT_ID_COLUMN)))?;
    let value_idx = headers
        .iter()
        .position(|h| h.trim() == QUANT_VALUE_COLUMN)
        .ok_or_else(|| MirnyxError::Csv(format!("column '{}' not found", QUANT_VALUE_COLUMN)))?;

    let mut column = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| MirnyxError::Csv(e.to_string()))?;
        if let (Some(id), Some(value)) = (record.get(id_idx), record.get(value_idx)) {
            if id.trim().is_empty() {
                continue;
            }
            column.insert(
                id.trim().to_string(),
                value.trim().parse::<f64>().unwrap_or(0.0),
            );
        }
    }
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_file_to_sample_map() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "METADATA.json",
            r#"[
                {"file_name": "a.quant.txt",
                 "associated_entities": [{"entity_submitter_id": "TCGA-05-4244-01A-11R"}]},
                {"file_name": "b.quant.txt",
                 "associated_entities": [{"entity_submitter_id": "TCGA-06-0001-01A-22R"}]}
            ]"#,
        );
        let map = file_to_sample_map(dir.path().join("METADATA.json")).unwrap();
        assert_eq!(map["a.quant.txt"], "TCGA-05-4244");
        assert_eq!(map["b.quant.txt"], "TCGA-06-0001");
    }

    #[test]
    fn test_merge_quantifications() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "METADATA.json",
            r#"[
                {"file_name": "a.quant.txt",
                 "associated_entities": [{"entity_submitter_id": "TCGA-05-4244-01A"}]},
                {"file_name": "b.quant.txt",
                 "associated_entities": [{"entity_submitter_id": "TCGA-06-0001-01A"}]}
            ]"#,
        );
        write_file(
            dir.path(),
            "MANIFEST.txt",
            "id\tfilename\n1\ta.quant.txt\n2\tb.quant.txt\n3\tgone.quant.txt\n",
        );
        write_file(
            dir.path(),
            "a.quant.txt",
            "miRNA_ID\tread_count\treads_per_million_miRNA_mapped\nhsa-mir-21-1\t5\t10.0\nhsa-mir-122\t2\t4.0\n",
        );
        write_file(
            dir.path(),
            "b.quant.txt",
            "miRNA_ID\tread_count\treads_per_million_miRNA_mapped\nhsa-mir-21-1\t8\t16.0\n",
        );

        let (matrix, stats) = merge_quantifications(
            dir.path(),
            dir.path().join("MANIFEST.txt"),
            dir.path().join("METADATA.json"),
        )
        .unwrap();

        assert_eq!(stats.files_merged, 2);
        assert_eq!(stats.files_missing, 1);
        assert_eq!(matrix.n_samples(), 2);
        // b.quant.txt carries no hsa-mir-122 row; absent values fill as 0.
        let row = matrix.row("hsa-mir-122").unwrap();
        assert_eq!(row.iter().filter(|&&v| v == 0.0).count(), 1);
    }

    #[test]
    fn test_missing_manifest_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "METADATA.json", "[]");
        let err = merge_quantifications(
            dir.path(),
            dir.path().join("MANIFEST.txt"),
            dir.path().join("METADATA.json"),
        )
        .unwrap_err();
        assert!(matches!(err, MirnyxError::MissingInput(_)));
    }
}
