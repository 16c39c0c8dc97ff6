pub mod aggregate;
pub mod assembly;
pub mod classify;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod fasta;
pub mod fs_util;
pub mod ncbi;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod taxa;
pub mod taxonomy;
pub mod tsv;
