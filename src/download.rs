use std::fs::File;
use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::assembly::AssemblyTable;
use crate::domain::{LineageGroup, TaxId};
use crate::error::ProteomeError;
use crate::fs_util;

pub const DEFAULT_PROGRAM: &str = "ncbi-genome-download";
const FILE_FORMAT: &str = "protein-fasta";

pub trait GenomeDownloader {
    fn download(
        &self,
        group: LineageGroup,
        taxids: &[TaxId],
    ) -> Result<AssemblyTable, ProteomeError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadOptions {
    pub section: String,
    pub assembly_levels: String,
    pub refseq_categories: String,
    pub parallel: usize,
    pub output_dir: Utf8PathBuf,
    pub metadata_table: Utf8PathBuf,
}

pub struct NcbiGenomeDownload {
    program: PathBuf,
    options: DownloadOptions,
    log: Option<Utf8PathBuf>,
}

impl NcbiGenomeDownload {
    pub fn new(program: &str, options: DownloadOptions) -> Result<Self, ProteomeError> {
        let program = fs_util::find_in_path(program)
            .ok_or_else(|| ProteomeError::MissingTool(program.to_string()))?;
        Ok(Self {
            program,
            options,
            log: None,
        })
    }

    pub fn with_log(mut self, log: Option<Utf8PathBuf>) -> Self {
        self.log = log;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn version(&self) -> Option<String> {
        let output = Command::new(&self.program).arg("--version").output().ok()?;
        if !output.status.success() {
            return None;
        }
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if stdout.is_empty() { None } else { Some(stdout) }
    }

    pub fn build_args(&self, group: LineageGroup, taxids: &[TaxId]) -> Vec<String> {
        let ids = taxids
            .iter()
            .map(|taxid| taxid.to_string())
            .collect::<Vec<_>>()
            .join(",");
        vec![
            "-s".to_string(),
            self.options.section.clone(),
            "-F".to_string(),
            FILE_FORMAT.to_string(),
            "-l".to_string(),
            self.options.assembly_levels.clone(),
            "--flat-output".to_string(),
            "-o".to_string(),
            self.options.output_dir.to_string(),
            "-p".to_string(),
            self.options.parallel.to_string(),
            "-m".to_string(),
            self.options.metadata_table.to_string(),
            "-R".to_string(),
            self.options.refseq_categories.clone(),
            "-t".to_string(),
            ids,
            group.download_name().to_string(),
        ]
    }

    fn output_streams(&self) -> Result<(Stdio, Stdio), ProteomeError> {
        let Some(log) = &self.log else {
            return Ok((Stdio::inherit(), Stdio::inherit()));
        };
        let file = File::options()
            .create(true)
            .append(true)
            .open(log)
            .map_err(|err| ProteomeError::Filesystem(format!("open {log}: {err}")))?;
        let stderr = file
            .try_clone()
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        Ok((Stdio::from(file), Stdio::from(stderr)))
    }
}

impl GenomeDownloader for NcbiGenomeDownload {
    fn download(
        &self,
        group: LineageGroup,
        taxids: &[TaxId],
    ) -> Result<AssemblyTable, ProteomeError> {
        let metadata = &self.options.metadata_table;
        // The metadata path is shared by every group.
        fs_util::remove_if_exists(metadata.as_std_path())?;
        fs_util::ensure_parent(metadata.as_std_path())?;

        let args = self.build_args(group, taxids);
        let (stdout, stderr) = self.output_streams()?;
        tracing::info!(%group, taxids = taxids.len(), "running {}", self.program.display());
        let status = Command::new(&self.program)
            .args(&args)
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|err| ProteomeError::ToolLaunch {
                program: self.program.display().to_string(),
                message: err.to_string(),
            })?;
        if !status.success() {
            tracing::warn!(%group, %status, "genome download exited unsuccessfully");
        }

        if !metadata.exists() {
            return Ok(AssemblyTable::default());
        }
        AssemblyTable::read(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloader() -> NcbiGenomeDownload {
        NcbiGenomeDownload {
            program: PathBuf::from("ncbi-genome-download"),
            options: DownloadOptions {
                section: "refseq".to_string(),
                assembly_levels: "complete,chromosome".to_string(),
                refseq_categories: "reference".to_string(),
                parallel: 4,
                output_dir: Utf8PathBuf::from("db"),
                metadata_table: Utf8PathBuf::from("db/assembly.tsv"),
            },
            log: None,
        }
    }

    #[test]
    fn command_line_shape() {
        let args = downloader().build_args(
            LineageGroup::Bacteria,
            &[TaxId::new(562), TaxId::new(561)],
        );
        assert_eq!(
            args,
            vec![
                "-s",
                "refseq",
                "-F",
                "protein-fasta",
                "-l",
                "complete,chromosome",
                "--flat-output",
                "-o",
                "db",
                "-p",
                "4",
                "-m",
                "db/assembly.tsv",
                "-R",
                "reference",
                "-t",
                "562,561",
                "bacteria",
            ]
        );
    }

    #[test]
    fn protozoa_uses_tool_spelling() {
        let args = downloader().build_args(LineageGroup::Protozoa, &[TaxId::new(5833)]);
        assert_eq!(args.last().map(String::as_str), Some("protozoa"));
    }

    #[test]
    fn missing_program_is_reported() {
        let options = downloader().options;
        let err = NcbiGenomeDownload::new("definitely-not-a-real-tool-xyz", options)
            .err()
            .unwrap();
        assert!(matches!(err, ProteomeError::MissingTool(_)));
    }
}
