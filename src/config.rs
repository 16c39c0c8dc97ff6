use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::LineageGroup;
use crate::download::DEFAULT_PROGRAM;
use crate::error::ProteomeError;

pub const DEFAULT_CONFIG_FILE: &str = "fetch-proteome.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub input: Utf8PathBuf,
    pub outputs: OutputPaths,
    #[serde(default)]
    pub log: Option<Utf8PathBuf>,
    #[serde(default)]
    pub taxonomy: TaxonomySection,
    pub download: DownloadSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputPaths {
    pub taxid_table: Utf8PathBuf,
    pub assembly_table: Utf8PathBuf,
    pub proteome_fasta: Utf8PathBuf,
    pub protein_table: Utf8PathBuf,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TaxonomySection {
    #[serde(default)]
    pub dir: Option<Utf8PathBuf>,
    #[serde(default)]
    pub update: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DownloadSection {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub groups: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub assembly_levels: Option<String>,
    #[serde(default)]
    pub refseq_categories: Option<String>,
    #[serde(default)]
    pub threads: Option<usize>,
    pub output_dir: Utf8PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub update_db: bool,
    pub threads: Option<usize>,
    pub groups: Option<LineageGroup>,
    pub section: Option<String>,
    pub log: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub schema_version: u32,
    pub input: Utf8PathBuf,
    pub outputs: OutputPaths,
    pub log: Option<Utf8PathBuf>,
    pub taxonomy_dir: Option<Utf8PathBuf>,
    pub update_db: bool,
    pub program: String,
    pub default_group: LineageGroup,
    pub section: String,
    pub assembly_levels: String,
    pub refseq_categories: String,
    pub threads: usize,
    pub output_dir: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>, overrides: RunOverrides) -> Result<RunConfig, ProteomeError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(ProteomeError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ProteomeError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ProteomeError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: RunOverrides,
    ) -> Result<RunConfig, ProteomeError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(ProteomeError::ConfigValue(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        let download = config.download;
        let default_group = match overrides.groups {
            Some(group) => group,
            None => download
                .groups
                .as_deref()
                .map(str::parse::<LineageGroup>)
                .transpose()?
                .unwrap_or(LineageGroup::All),
        };

        let threads = overrides.threads.or(download.threads).unwrap_or(1);
        if threads == 0 {
            return Err(ProteomeError::ConfigValue(
                "threads must be at least 1".to_string(),
            ));
        }

        let section = overrides
            .section
            .or(download.section)
            .unwrap_or_else(|| "refseq".to_string());
        if !matches!(section.as_str(), "refseq" | "genbank") {
            return Err(ProteomeError::ConfigValue(format!(
                "section must be refseq or genbank, got {section}"
            )));
        }

        Ok(RunConfig {
            schema_version,
            input: config.input,
            outputs: config.outputs,
            log: overrides.log.or(config.log),
            taxonomy_dir: config.taxonomy.dir,
            update_db: overrides.update_db || config.taxonomy.update,
            program: download
                .program
                .unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
            default_group,
            section,
            assembly_levels: download
                .assembly_levels
                .unwrap_or_else(|| "all".to_string()),
            refseq_categories: download
                .refseq_categories
                .unwrap_or_else(|| "all".to_string()),
            threads,
            output_dir: download.output_dir,
        })
    }
}

impl RunConfig {
    pub fn metadata_path(&self) -> Utf8PathBuf {
        self.outputs.assembly_table.clone()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const MINIMAL: &str = r#"{
        "input": "config/taxid.tsv",
        "outputs": {
            "taxid_table": "out/taxid_expanded.tsv",
            "assembly_table": "out/assembly.tsv",
            "proteome_fasta": "out/proteome.faa",
            "protein_table": "out/proteins.tsv"
        },
        "download": { "output_dir": "out/genomes" }
    }"#;

    #[test]
    fn defaults_are_filled_in() {
        let config: Config = serde_json::from_str(MINIMAL).unwrap();
        let resolved = ConfigLoader::resolve_config(config, RunOverrides::default()).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.default_group, LineageGroup::All);
        assert_eq!(resolved.section, "refseq");
        assert_eq!(resolved.assembly_levels, "all");
        assert_eq!(resolved.refseq_categories, "all");
        assert_eq!(resolved.threads, 1);
        assert_eq!(resolved.program, "ncbi-genome-download");
        assert!(!resolved.update_db);
        assert!(resolved.log.is_none());
    }

    #[test]
    fn overrides_win() {
        let config: Config = serde_json::from_str(MINIMAL).unwrap();
        let overrides = RunOverrides {
            update_db: true,
            threads: Some(8),
            groups: Some(LineageGroup::Fungi),
            section: Some("genbank".to_string()),
            log: Some(Utf8PathBuf::from("logs/run.log")),
        };
        let resolved = ConfigLoader::resolve_config(config, overrides).unwrap();
        assert!(resolved.update_db);
        assert_eq!(resolved.threads, 8);
        assert_eq!(resolved.default_group, LineageGroup::Fungi);
        assert_eq!(resolved.section, "genbank");
        assert_eq!(resolved.log.as_deref(), Some(camino::Utf8Path::new("logs/run.log")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config: Config = serde_json::from_str(MINIMAL).unwrap();
        config.download.groups = Some("birds".to_string());
        let err = ConfigLoader::resolve_config(config, RunOverrides::default()).unwrap_err();
        assert_matches!(err, ProteomeError::InvalidGroup(_));

        let mut config: Config = serde_json::from_str(MINIMAL).unwrap();
        config.download.section = Some("ensembl".to_string());
        let err = ConfigLoader::resolve_config(config, RunOverrides::default()).unwrap_err();
        assert_matches!(err, ProteomeError::ConfigValue(_));
    }
}
