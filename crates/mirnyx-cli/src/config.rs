//! Configuration loading for mirnyx.
//! Reads mirnyx.toml from the current directory or the path given on the
//! command line / MIRNYX_CONFIG env var. Every field has a default, so a
//! missing config file means the stock TCGA data layout.

use std::path::{Path, PathBuf};

use mirnyx_common::error::{MirnyxError, Result};
use mirnyx_common::ScoringConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default = "default_gene_expression")]
    pub gene_expression: PathBuf,
    /// Header of the gene-symbol column in the gene expression TSV.
    #[serde(default = "default_gene_id_column")]
    pub gene_id_column: String,
    /// Secondary identifier columns dropped from the gene TSV.
    #[serde(default = "default_gene_drop_columns")]
    pub gene_drop_columns: Vec<String>,
    #[serde(default = "default_mirna_expression")]
    pub mirna_expression: PathBuf,
    #[serde(default = "default_validated_interactions")]
    pub validated_interactions: PathBuf,
    #[serde(default = "default_predicted_interactions")]
    pub predicted_interactions: PathBuf,
}

fn default_gene_expression()        -> PathBuf { "data/features/genes_expr.txt".into() }
fn default_gene_id_column()         -> String  { "Hugo_Symbol".to_string() }
fn default_gene_drop_columns()      -> Vec<String> { vec!["Entrez_Gene_Id".to_string()] }
fn default_mirna_expression()       -> PathBuf { "data/features/mirnas.tsv".into() }
fn default_validated_interactions() -> PathBuf { "data/processed/mirtarbase_processed.csv".into() }
fn default_predicted_interactions() -> PathBuf { "data/processed/targetscan_processed.csv".into() }

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            gene_expression:        default_gene_expression(),
            gene_id_column:         default_gene_id_column(),
            gene_drop_columns:      default_gene_drop_columns(),
            mirna_expression:       default_mirna_expression(),
            validated_interactions: default_validated_interactions(),
            predicted_interactions: default_predicted_interactions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_edges_output")]
    pub edges: PathBuf,
}

fn default_edges_output() -> PathBuf { "data/edges/gene_mirna.csv".into() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { edges: default_edges_output() }
    }
}

/// Inputs for the per-sample miRNA quantification merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_merge_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_merge_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_merge_metadata")]
    pub metadata: PathBuf,
    /// Where the merged matrix lands; the build step reads it back via
    /// `inputs.mirna_expression`.
    #[serde(default = "default_mirna_expression")]
    pub output: PathBuf,
}

fn default_merge_data_dir() -> PathBuf { "miRNA_expression".into() }
fn default_merge_manifest() -> PathBuf { "miRNA_expression/MANIFEST.txt".into() }
fn default_merge_metadata() -> PathBuf { "miRNA_expression/METADATA.json".into() }

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_merge_data_dir(),
            manifest: default_merge_manifest(),
            metadata: default_merge_metadata(),
            output:   default_mirna_expression(),
        }
    }
}

/// Inputs for raw interaction-dump preprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_raw_validated")]
    pub raw_validated: PathBuf,
    #[serde(default = "default_raw_predicted")]
    pub raw_predicted: PathBuf,
    #[serde(default = "default_family_info")]
    pub family_info: PathBuf,
}

fn default_raw_validated() -> PathBuf { "data/raw/hsa_MTI_homo.csv".into() }
fn default_raw_predicted() -> PathBuf { "data/raw/Predicted_Targets_Info.txt".into() }
fn default_family_info()   -> PathBuf { "data/raw/miR_Family_Info.txt".into() }

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            raw_validated: default_raw_validated(),
            raw_predicted: default_raw_predicted(),
            family_info:   default_family_info(),
        }
    }
}

impl Config {
    /// Load configuration.
    /// An explicitly given path must exist; otherwise ./mirnyx.toml is
    /// used when present, and built-in defaults when not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(MirnyxError::Config(format!(
                        "Config file not found: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => {
                let default_path = PathBuf::from("mirnyx.toml");
                if !default_path.exists() {
                    info!("No mirnyx.toml found; using built-in defaults");
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = std::fs::read_to_string(&path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| MirnyxError::Config(e.to_string()))?;
        info!("Configuration loaded from {:?}", path);
        Ok(config)
    }
}
