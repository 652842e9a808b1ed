//! Expression matrix loading and sample alignment.
//!
//! A matrix is rows (gene symbols or miRNA accessions) by sample columns,
//! loaded from the tab-separated dumps produced by cBioPortal/GDC exports.
//! Sample barcodes are canonicalised to their patient portion before
//! anything else, so columns from the same patient (e.g. `-01A`/`-01B`
//! aliquots) collapse into one averaged column.

use std::collections::HashMap;
use std::path::Path;

use mirnyx_common::error::{MirnyxError, Result};
use mirnyx_common::ids::{canonicalize_mirna_id, canonicalize_sample_id};
use tracing::{debug, info, warn};

/// Options controlling how a matrix TSV is interpreted.
#[derive(Debug, Clone, Default)]
pub struct MatrixLoadOptions {
    /// Header name of the row-identifier column. `None` means the first
    /// column.
    pub id_column: Option<String>,
    /// Secondary identifier columns to drop (e.g. `Entrez_Gene_Id`),
    /// matched by header name; absent names are ignored.
    pub drop_columns: Vec<String>,
}

/// A dense row-major expression matrix with unique row labels and unique,
/// canonicalised sample columns.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    row_labels: Vec<String>,
    row_index: HashMap<String, usize>,
    samples: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl ExpressionMatrix {
    /// Build from already-parsed rows. Duplicate row labels are collapsed
    /// by arithmetic mean; first-seen order is preserved.
    pub fn from_rows(samples: Vec<String>, rows: Vec<(String, Vec<f64>)>) -> Self {
        let mut row_labels: Vec<String> = Vec::new();
        let mut row_index: HashMap<String, usize> = HashMap::new();
        let mut sums: Vec<Vec<f64>> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();

        for (label, vals) in rows {
            debug_assert_eq!(vals.len(), samples.len());
            match row_index.get(&label) {
                Some(&i) => {
                    for (acc, v) in sums[i].iter_mut().zip(vals.iter()) {
                        *acc += v;
                    }
                    counts[i] += 1;
                }
                None => {
                    row_index.insert(label.clone(), row_labels.len());
                    row_labels.push(label);
                    sums.push(vals);
                    counts.push(1);
                }
            }
        }

        let values = sums
            .into_iter()
            .zip(counts.iter())
            .map(|(row, &n)| row.into_iter().map(|v| v / n as f64).collect())
            .collect();

        Self { row_labels, row_index, samples, values }
    }

    /// Load a matrix from a TSV file on disk.
    pub fn from_tsv_path(path: impl AsRef<Path>, options: &MatrixLoadOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MirnyxError::MissingInput(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let matrix = Self::from_tsv_str(&content, options)?;
        info!(
            "Loaded expression matrix from {:?}: {} rows x {} samples",
            path,
            matrix.n_rows(),
            matrix.n_samples()
        );
        Ok(matrix)
    }

    /// Load a matrix from TSV text (used by tests and by callers that
    /// already hold the file contents).
    pub fn from_tsv_str(tsv: &str, options: &MatrixLoadOptions) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(tsv.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| MirnyxError::Csv(e.to_string()))?
            .iter()
            .map(|s| s.trim().to_string())
            .collect();

        let id_idx = match &options.id_column {
            Some(name) => headers.iter().position(|h| h == name).ok_or_else(|| {
                MirnyxError::Config(format!("row identifier column '{}' not found", name))
            })?,
            None => 0,
        };

        // Remaining columns are samples; canonicalise each barcode and
        // group duplicates so they can be collapsed by mean.
        let mut group_order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if i == id_idx || options.drop_columns.iter().any(|d| d == header) {
                continue;
            }
            let canonical = canonicalize_sample_id(header);
            groups
                .entry(canonical.clone())
                .or_insert_with(|| {
                    group_order.push(canonical);
                    Vec::new()
                })
                .push(i);
        }

        let mut rows: Vec<(String, Vec<f64>)> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| MirnyxError::Csv(e.to_string()))?;
            let label = match record.get(id_idx) {
                Some(s) if !s.trim().is_empty() => s.trim().to_string(),
                _ => continue,
            };
            let vals: Vec<f64> = group_order
                .iter()
                .map(|g| {
                    let idxs = &groups[g];
                    let sum: f64 = idxs
                        .iter()
                        .map(|&i| parse_value(record.get(i).unwrap_or("")))
                        .sum();
                    sum / idxs.len() as f64
                })
                .collect();
            rows.push((label, vals));
        }

        Ok(Self::from_rows(group_order, rows))
    }

    /// Build a matrix from per-sample columns (row id → value maps).
    /// Row labels are sorted; missing values are filled with 0.0;
    /// duplicate sample columns are collapsed by mean.
    pub fn from_sample_columns(columns: Vec<(String, HashMap<String, f64>)>) -> Self {
        let mut row_labels: Vec<String> = columns
            .iter()
            .flat_map(|(_, col)| col.keys().cloned())
            .collect();
        row_labels.sort();
        row_labels.dedup();

        // Collapse duplicate sample ids first, averaging their columns.
        let mut sample_order: Vec<String> = Vec::new();
        let mut merged: HashMap<String, (HashMap<String, f64>, usize)> = HashMap::new();
        for (sample, col) in columns {
            match merged.get_mut(&sample) {
                Some((acc, n)) => {
                    for label in &row_labels {
                        let v = col.get(label).copied().unwrap_or(0.0);
                        *acc.entry(label.clone()).or_insert(0.0) += v;
                    }
                    *n += 1;
                }
                None => {
                    sample_order.push(sample.clone());
                    let mut acc = HashMap::new();
                    for label in &row_labels {
                        acc.insert(label.clone(), col.get(label).copied().unwrap_or(0.0));
                    }
                    merged.insert(sample, (acc, 1));
                }
            }
        }

        let rows: Vec<(String, Vec<f64>)> = row_labels
            .iter()
            .map(|label| {
                let vals = sample_order
                    .iter()
                    .map(|s| {
                        let (acc, n) = &merged[s];
                        acc[label] / *n as f64
                    })
                    .collect();
                (label.clone(), vals)
            })
            .collect();

        Self::from_rows(sample_order, rows)
    }

    /// Apply miRNA accession canonicalisation to every row label and
    /// collapse newly-colliding rows by mean
    /// (`hsa-mir-21-1` + `hsa-mir-21-2` → one `hsa-miR-21` row).
    pub fn normalise_mirna_rows(self) -> Self {
        let samples = self.samples.clone();
        let rows = self
            .row_labels
            .iter()
            .zip(self.values.iter())
            .map(|(label, vals)| (canonicalize_mirna_id(label), vals.clone()))
            .collect();
        let out = Self::from_rows(samples, rows);
        if out.n_rows() < self.n_rows() {
            debug!(
                "miRNA row normalisation collapsed {} rows into {}",
                self.n_rows(),
                out.n_rows()
            );
        }
        out
    }

    /// Drop rows whose values are all zero (miRNAs never observed in any
    /// retained sample carry no signal).
    pub fn drop_zero_rows(self) -> Self {
        let samples = self.samples.clone();
        let rows = self
            .row_labels
            .into_iter()
            .zip(self.values)
            .filter(|(_, vals)| vals.iter().any(|&v| v != 0.0))
            .collect();
        Self::from_rows(samples, rows)
    }

    /// Restrict the matrix to the given sample columns, in the given order.
    /// Samples not present in the matrix are skipped.
    pub fn restrict_to_samples(&self, samples: &[String]) -> Self {
        let keep: Vec<(String, usize)> = samples
            .iter()
            .filter_map(|s| {
                self.samples
                    .iter()
                    .position(|own| own == s)
                    .map(|i| (s.clone(), i))
            })
            .collect();
        let sample_order: Vec<String> = keep.iter().map(|(s, _)| s.clone()).collect();
        let rows = self
            .row_labels
            .iter()
            .zip(self.values.iter())
            .map(|(label, vals)| {
                (
                    label.clone(),
                    keep.iter().map(|&(_, i)| vals[i]).collect::<Vec<f64>>(),
                )
            })
            .collect();
        Self::from_rows(sample_order, rows)
    }

    /// Align two matrices on their common sample set. Both returned
    /// matrices carry identical columns in identical order (the first
    /// matrix's order, filtered). Zero overlap is an error: there is
    /// nothing correlatable.
    pub fn align(gene: &Self, mirna: &Self) -> Result<(Self, Self)> {
        let common: Vec<String> = gene
            .samples
            .iter()
            .filter(|s| mirna.sample_position(s).is_some())
            .cloned()
            .collect();
        if common.is_empty() {
            warn!("Found 0 common samples between gene and miRNA matrices; check barcode formats in source files");
            return Err(MirnyxError::NoOverlap);
        }
        info!("Found {} common samples between gene and miRNA data", common.len());
        Ok((gene.restrict_to_samples(&common), mirna.restrict_to_samples(&common)))
    }

    fn sample_position(&self, sample: &str) -> Option<usize> {
        self.samples.iter().position(|s| s == sample)
    }

    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn contains_row(&self, label: &str) -> bool {
        self.row_index.contains_key(label)
    }

    /// Expression vector for a row, in sample-column order.
    pub fn row(&self, label: &str) -> Option<&[f64]> {
        self.row_index.get(label).map(|&i| self.values[i].as_slice())
    }

    /// Write the matrix as TSV with the given row-identifier header.
    pub fn write_tsv(&self, path: impl AsRef<Path>, id_header: &str) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(|e| MirnyxError::Csv(e.to_string()))?;

        let mut header = vec![id_header.to_string()];
        header.extend(self.samples.iter().cloned());
        writer
            .write_record(&header)
            .map_err(|e| MirnyxError::Csv(e.to_string()))?;

        for (label, vals) in self.row_labels.iter().zip(self.values.iter()) {
            let mut record = vec![label.clone()];
            record.extend(vals.iter().map(|v| v.to_string()));
            writer
                .write_record(&record)
                .map_err(|e| MirnyxError::Csv(e.to_string()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Empty and unparseable cells read as 0.0, matching the upstream
/// merge step's zero-fill for absent measurements.
fn parse_value(field: &str) -> f64 {
    field.trim().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENE_TSV: &str = "\
Hugo_Symbol\tEntrez_Gene_Id\tTCGA-05-4244-01A\tTCGA-05-4244-01B\tTCGA-06-0001-01\n\
TP53\t7157\t2.0\t4.0\t5.0\n\
KRAS\t3845\t1.0\t1.0\t1.0\n";

    fn gene_options() -> MatrixLoadOptions {
        MatrixLoadOptions {
            id_column: Some("Hugo_Symbol".to_string()),
            drop_columns: vec!["Entrez_Gene_Id".to_string()],
        }
    }

    #[test]
    fn test_duplicate_sample_columns_averaged() {
        let m = ExpressionMatrix::from_tsv_str(GENE_TSV, &gene_options()).unwrap();
        assert_eq!(m.samples(), &["TCGA-05-4244".to_string(), "TCGA-06-0001".to_string()]);
        // -01A (2.0) and -01B (4.0) collapse to 3.0
        assert_eq!(m.row("TP53").unwrap(), &[3.0, 5.0]);
    }

    #[test]
    fn test_secondary_id_column_dropped() {
        let m = ExpressionMatrix::from_tsv_str(GENE_TSV, &gene_options()).unwrap();
        assert!(!m.samples().iter().any(|s| s == "Entrez_Gene_Id"));
    }

    #[test]
    fn test_duplicate_rows_averaged() {
        let tsv = "\
miRNA_ID\tTCGA-05-4244-01\n\
hsa-miR-21\t10.0\n\
hsa-miR-21\t20.0\n";
        let m = ExpressionMatrix::from_tsv_str(tsv, &MatrixLoadOptions::default()).unwrap();
        assert_eq!(m.n_rows(), 1);
        assert_eq!(m.row("hsa-miR-21").unwrap(), &[15.0]);
    }

    #[test]
    fn test_mirna_copy_number_rows_collapse() {
        let tsv = "\
miRNA_ID\tTCGA-05-4244-01\tTCGA-06-0001-01\n\
hsa-mir-21-1\t10.0\t2.0\n\
hsa-mir-21-2\t30.0\t4.0\n";
        let m = ExpressionMatrix::from_tsv_str(tsv, &MatrixLoadOptions::default())
            .unwrap()
            .normalise_mirna_rows();
        assert_eq!(m.n_rows(), 1);
        assert_eq!(m.row("hsa-miR-21").unwrap(), &[20.0, 3.0]);
    }

    #[test]
    fn test_align_restricts_to_common_samples() {
        let gene = ExpressionMatrix::from_rows(
            vec!["P1".into(), "P2".into(), "P3".into()],
            vec![("TP53".into(), vec![1.0, 2.0, 3.0])],
        );
        let mirna = ExpressionMatrix::from_rows(
            vec!["P2".into(), "P3".into(), "P4".into()],
            vec![("hsa-miR-21".into(), vec![5.0, 6.0, 7.0])],
        );
        let (g, m) = ExpressionMatrix::align(&gene, &mirna).unwrap();
        assert_eq!(g.samples(), m.samples());
        assert_eq!(g.samples(), &["P2".to_string(), "P3".to_string()]);
        assert_eq!(g.row("TP53").unwrap(), &[2.0, 3.0]);
        assert_eq!(m.row("hsa-miR-21").unwrap(), &[5.0, 6.0]);
    }

    #[test]
    fn test_align_zero_overlap_is_error() {
        let gene = ExpressionMatrix::from_rows(
            vec!["P1".into()],
            vec![("TP53".into(), vec![1.0])],
        );
        let mirna = ExpressionMatrix::from_rows(
            vec!["P9".into()],
            vec![("hsa-miR-21".into(), vec![5.0])],
        );
        assert!(matches!(
            ExpressionMatrix::align(&gene, &mirna),
            Err(MirnyxError::NoOverlap)
        ));
    }

    #[test]
    fn test_drop_zero_rows() {
        let m = ExpressionMatrix::from_rows(
            vec!["P1".into(), "P2".into()],
            vec![
                ("hsa-miR-21".into(), vec![0.0, 0.0]),
                ("hsa-miR-122".into(), vec![0.0, 1.5]),
            ],
        )
        .drop_zero_rows();
        assert_eq!(m.row_labels(), &["hsa-miR-122".to_string()]);
    }

    #[test]
    fn test_missing_file_is_missing_input() {
        let err = ExpressionMatrix::from_tsv_path(
            "/nonexistent/genes.txt",
            &MatrixLoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MirnyxError::MissingInput(_)));
    }
}
