use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::TaxId;

#[derive(Debug, Error, Diagnostic)]
pub enum ProteomeError {
    #[error("invalid taxonomic id: {0}")]
    InvalidTaxId(String),

    #[error("invalid NCBI group: {0}")]
    InvalidGroup(String),

    #[error("invalid assembly accession: {0}")]
    InvalidAssemblyAccession(String),

    #[error("missing config file fetch-proteome.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    ConfigValue(String),

    #[error("invalid taxid table: {0}")]
    InputTable(String),

    #[error("taxid not found in taxonomy: {0}")]
    UnknownTaxId(TaxId),

    #[error("taxonomy snapshot not found in {0} (run `fetch-proteome taxonomy update`)")]
    TaxonomyMissing(PathBuf),

    #[error("corrupt taxonomy data: {0}")]
    TaxonomyParse(String),

    #[error("taxonomy request failed: {0}")]
    TaxonomyHttp(String),

    #[error("taxonomy server returned status {status}: {message}")]
    TaxonomyStatus { status: u16, message: String },

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("failed to run {program}: {message}")]
    ToolLaunch { program: String, message: String },

    #[error("invalid assembly metadata table: {0}")]
    AssemblyTable(String),

    #[error("invalid FASTA input {path}: {message}")]
    Fasta { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
