//! Overlap diagnostics between interaction tables and expression data.
//!
//! When a run produces few or no edges the usual culprit is an
//! identifier-format mismatch between sources. This report shows, per
//! interaction table, how much of it is actually backed by expression
//! rows, before any scoring happens.

use std::collections::HashSet;

use mirnyx_ingestion::{ExpressionMatrix, InteractionRecord};
use tracing::{info, warn};

/// Overlap summary for one interaction source.
#[derive(Debug, Clone)]
pub struct OverlapReport {
    pub source: String,
    pub total_interactions: usize,
    pub unique_mirnas: usize,
    pub unique_genes: usize,
    pub mirnas_with_expression: usize,
    pub genes_with_expression: usize,
}

impl OverlapReport {
    pub fn mirna_coverage(&self) -> f64 {
        fraction(self.mirnas_with_expression, self.unique_mirnas)
    }

    pub fn gene_coverage(&self) -> f64 {
        fraction(self.genes_with_expression, self.unique_genes)
    }
}

fn fraction(found: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        found as f64 / total as f64
    }
}

/// Compute the overlap between one interaction table and the two
/// expression matrices. miRNA identifiers are compared directly against
/// row labels here — the point is to surface format mismatches, so no
/// stem matching is applied.
pub fn check_overlap(
    source: &str,
    interactions: &[InteractionRecord],
    gene_matrix: &ExpressionMatrix,
    mirna_matrix: &ExpressionMatrix,
) -> OverlapReport {
    let mirnas: HashSet<&str> = interactions.iter().map(|r| r.mirna_id.as_str()).collect();
    let genes: HashSet<&str> = interactions.iter().map(|r| r.gene_id.as_str()).collect();

    let mirnas_found = mirnas.iter().filter(|m| mirna_matrix.contains_row(m)).count();
    let genes_found = genes.iter().filter(|g| gene_matrix.contains_row(g)).count();

    let report = OverlapReport {
        source: source.to_string(),
        total_interactions: interactions.len(),
        unique_mirnas: mirnas.len(),
        unique_genes: genes.len(),
        mirnas_with_expression: mirnas_found,
        genes_with_expression: genes_found,
    };

    info!(
        "[{}] {} interactions; miRNAs in expression: {}/{} ({:.1}%); genes in expression: {}/{} ({:.1}%)",
        report.source,
        report.total_interactions,
        report.mirnas_with_expression,
        report.unique_mirnas,
        100.0 * report.mirna_coverage(),
        report.genes_with_expression,
        report.unique_genes,
        100.0 * report.gene_coverage(),
    );

    if report.mirnas_with_expression == 0 {
        if let (Some(example_interaction), Some(example_row)) =
            (mirnas.iter().next(), mirna_matrix.row_labels().first())
        {
            warn!(
                "[{}] no miRNA identifiers match expression rows; example interaction id '{}' vs expression id '{}'",
                report.source, example_interaction, example_row
            );
        }
    }
    if report.genes_with_expression == 0 {
        if let (Some(example_interaction), Some(example_row)) =
            (genes.iter().next(), gene_matrix.row_labels().first())
        {
            warn!(
                "[{}] no gene identifiers match expression rows; example interaction id '{}' vs expression id '{}'",
                report.source, example_interaction, example_row
            );
        }
    }

    report
}
