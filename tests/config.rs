use std::fs;

use assert_matches::assert_matches;

use fetch_proteome::config::{ConfigLoader, RunOverrides};
use fetch_proteome::domain::LineageGroup;
use fetch_proteome::error::ProteomeError;

const FULL: &str = r#"{
    "schema_version": 1,
    "input": "config/taxid.tsv",
    "outputs": {
        "taxid_table": "results/taxid_expanded.tsv",
        "assembly_table": "results/assembly.tsv",
        "proteome_fasta": "results/proteome.faa",
        "protein_table": "results/proteins.tsv"
    },
    "log": "logs/fetch_proteome.log",
    "taxonomy": { "dir": "db/taxonomy", "update": true },
    "download": {
        "program": "/opt/bin/ncbi-genome-download",
        "groups": "protozoa",
        "section": "genbank",
        "assembly_levels": "complete,chromosome",
        "refseq_categories": "reference",
        "threads": 4,
        "output_dir": "db/genomes"
    }
}"#;

#[test]
fn resolve_reads_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fetch-proteome.json");
    fs::write(&path, FULL).unwrap();

    let config = ConfigLoader::resolve(path.to_str(), RunOverrides::default()).unwrap();

    assert_eq!(config.input, "config/taxid.tsv");
    assert_eq!(config.default_group, LineageGroup::Protozoa);
    assert_eq!(config.section, "genbank");
    assert_eq!(config.assembly_levels, "complete,chromosome");
    assert_eq!(config.refseq_categories, "reference");
    assert_eq!(config.threads, 4);
    assert_eq!(config.program, "/opt/bin/ncbi-genome-download");
    assert!(config.update_db);
    assert_eq!(config.taxonomy_dir.as_deref().map(|dir| dir.as_str()), Some("db/taxonomy"));
    assert_eq!(config.metadata_path(), config.outputs.assembly_table);
}

#[test]
fn cli_threads_override_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    fs::write(&path, FULL).unwrap();
    let overrides = RunOverrides {
        threads: Some(16),
        ..RunOverrides::default()
    };

    let config = ConfigLoader::resolve(path.to_str(), overrides).unwrap();
    assert_eq!(config.threads, 16);
}

#[test]
fn explicit_missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str(), RunOverrides::default()).unwrap_err();
    assert_matches!(err, ProteomeError::ConfigRead(_));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"input\": ").unwrap();
    let err = ConfigLoader::resolve(path.to_str(), RunOverrides::default()).unwrap_err();
    assert_matches!(err, ProteomeError::ConfigParse(_));
}

#[test]
fn zero_threads_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");
    fs::write(&path, FULL.replace("\"threads\": 4", "\"threads\": 0")).unwrap();
    let err = ConfigLoader::resolve(path.to_str(), RunOverrides::default()).unwrap_err();
    assert_matches!(err, ProteomeError::ConfigValue(_));
}
