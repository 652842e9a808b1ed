//! mirnyx-ingestion — Expression-matrix and interaction-table loading.
//!
//! Everything here produces plain in-memory tables; no component in this
//! crate talks to the network. Inputs are the bulk files an upstream
//! download step has already placed on disk.

pub mod expression;
pub mod mirna_merge;
pub mod interactions;
pub mod family;

pub use expression::{ExpressionMatrix, MatrixLoadOptions};
pub use interactions::{CandidateInteraction, InteractionRecord};
