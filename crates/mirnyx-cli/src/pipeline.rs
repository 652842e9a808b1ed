//! Pipeline orchestration for the mirnyx subcommands.
//!
//! Whole-input failures (missing files, zero sample overlap) abort a run
//! before any output is written; per-candidate drops are tallied inside
//! the stages and summarised here.

use mirnyx_common::error::Result;
use mirnyx_graph::diagnostics;
use mirnyx_graph::edges::{resolve_collisions, write_edges_csv};
use mirnyx_graph::resolve::{resolve_candidates, ResolveStats};
use mirnyx_graph::scorer::{score_pairs, ScoreStats};
use mirnyx_graph::{PrecursorIndex, RegexStemMatcher};
use mirnyx_ingestion::family::{expand_predicted, FamilyMap};
use mirnyx_ingestion::interactions::{
    load_interactions_csv, merge_candidates, preprocess_validated, write_interactions_csv,
};
use mirnyx_ingestion::mirna_merge::merge_quantifications;
use mirnyx_ingestion::{ExpressionMatrix, MatrixLoadOptions};
use tracing::{info, warn};

use crate::config::Config;

/// Outcome counters for a build-edges run.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub candidates: usize,
    pub edges_written: usize,
    pub resolve_stats: ResolveStats,
    pub score_stats: ScoreStats,
}

fn gene_load_options(config: &Config) -> MatrixLoadOptions {
    MatrixLoadOptions {
        id_column: Some(config.inputs.gene_id_column.clone()),
        drop_columns: config.inputs.gene_drop_columns.clone(),
    }
}

/// Load both expression matrices, normalise miRNA rows, and align on the
/// common sample set.
fn load_aligned_matrices(config: &Config) -> Result<(ExpressionMatrix, ExpressionMatrix)> {
    info!("Loading expression data...");
    let gene = ExpressionMatrix::from_tsv_path(
        &config.inputs.gene_expression,
        &gene_load_options(config),
    )?;
    let mirna = ExpressionMatrix::from_tsv_path(
        &config.inputs.mirna_expression,
        &MatrixLoadOptions::default(),
    )?
    .normalise_mirna_rows();
    ExpressionMatrix::align(&gene, &mirna)
}

/// Full pipeline: load, merge, resolve, score, deduplicate, write.
pub fn build_edges(config: &Config) -> Result<BuildSummary> {
    let (gene, mirna) = load_aligned_matrices(config)?;

    info!("Loading and merging candidate interactions...");
    let validated = load_interactions_csv(&config.inputs.validated_interactions)?;
    let predicted = load_interactions_csv(&config.inputs.predicted_interactions)?;
    let candidates = merge_candidates(validated, predicted);

    let matcher = RegexStemMatcher::new();
    let index = PrecursorIndex::build(&mirna, &matcher);
    let (resolved, resolve_stats) = resolve_candidates(&candidates, &index, &matcher, &gene);

    info!("Calculating correlation-based weights for {} resolved pairs...", resolved.len());
    let (edge_candidates, score_stats) = score_pairs(&resolved, &gene, &mirna, &config.scoring);
    let edges = resolve_collisions(edge_candidates);

    if edges.is_empty() {
        warn!("Pipeline finished, but no significant edges were found with the current thresholds");
    }
    write_edges_csv(&config.output.edges, &edges)?;

    Ok(BuildSummary {
        candidates: candidates.len(),
        edges_written: edges.len(),
        resolve_stats,
        score_stats,
    })
}

/// Merge per-sample quantification files into the miRNA matrix TSV.
pub fn merge_mirna(config: &Config) -> Result<()> {
    let (matrix, _stats) = merge_quantifications(
        &config.merge.data_dir,
        &config.merge.manifest,
        &config.merge.metadata,
    )?;
    let matrix = matrix.normalise_mirna_rows().drop_zero_rows();
    matrix.write_tsv(&config.merge.output, "miRNA_ID")?;
    info!(
        "Saved merged miRNA matrix to {:?} ({} miRNAs x {} samples)",
        config.merge.output,
        matrix.n_rows(),
        matrix.n_samples()
    );
    Ok(())
}

/// Preprocess raw interaction dumps into the canonical processed CSVs.
pub fn preprocess(config: &Config) -> Result<()> {
    let validated = preprocess_validated(&config.preprocess.raw_validated)?;
    write_interactions_csv(&config.inputs.validated_interactions, &validated)?;
    info!(
        "Saved {} validated interactions to {:?}",
        validated.len(),
        config.inputs.validated_interactions
    );

    let families = FamilyMap::from_tsv_path(&config.preprocess.family_info)?;
    let predicted = expand_predicted(&config.preprocess.raw_predicted, &families)?;
    write_interactions_csv(&config.inputs.predicted_interactions, &predicted)?;
    info!(
        "Saved {} expanded predicted interactions to {:?}",
        predicted.len(),
        config.inputs.predicted_interactions
    );
    Ok(())
}

/// Diagnostic report: identifier overlap between interaction tables and
/// the expression matrices, without running the scorer.
pub fn check_overlap(config: &Config) -> Result<()> {
    let gene = ExpressionMatrix::from_tsv_path(
        &config.inputs.gene_expression,
        &gene_load_options(config),
    )?;
    let mirna = ExpressionMatrix::from_tsv_path(
        &config.inputs.mirna_expression,
        &MatrixLoadOptions::default(),
    )?
    .normalise_mirna_rows();

    info!("[Expression] miRNAs loaded: {}", mirna.n_rows());
    info!("[Expression] Genes loaded: {}", gene.n_rows());

    for (name, path) in [
        ("validated", &config.inputs.validated_interactions),
        ("predicted", &config.inputs.predicted_interactions),
    ] {
        let interactions = load_interactions_csv(path)?;
        diagnostics::check_overlap(name, &interactions, &gene, &mirna);
    }
    Ok(())
}
