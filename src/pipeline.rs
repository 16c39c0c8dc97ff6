use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::aggregate::{self, AggregateSummary};
use crate::assembly::AssemblyTable;
use crate::config::{OutputPaths, RunConfig};
use crate::domain::LineageGroup;
use crate::download::GenomeDownloader;
use crate::error::ProteomeError;
use crate::fs_util;
use crate::taxa;
use crate::taxonomy::TaxonomySource;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input_rows: usize,
    pub taxa: usize,
    pub groups: Vec<GroupSummary>,
    pub assemblies: usize,
    pub genomes: usize,
    pub proteins: usize,
    pub outputs: OutputPaths,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub group: LineageGroup,
    pub taxids: usize,
    pub assemblies: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => {
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message)
            }
            None => tracing::info!("{}", event.message),
        }
    }
}

pub struct Pipeline<T: TaxonomySource, D: GenomeDownloader> {
    taxonomy: T,
    downloader: D,
}

impl<T: TaxonomySource, D: GenomeDownloader> Pipeline<T, D> {
    pub fn new(taxonomy: T, downloader: D) -> Self {
        Self {
            taxonomy,
            downloader,
        }
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    pub fn run(&self, config: &RunConfig, sink: &dyn ProgressSink) -> Result<RunSummary, ProteomeError> {
        let outputs = &config.outputs;

        sink.event(ProgressEvent {
            message: format!("phase=Expand; reading {}", config.input),
            elapsed: None,
        });
        let start = Instant::now();
        let rows = taxa::read_taxon_table(config.input.as_std_path())?;
        let entries = taxa::expand_taxa(&rows, config.default_group, &self.taxonomy)?;
        write_atomic(&outputs.taxid_table, |writer| {
            taxa::write_taxon_table(writer, &entries)
        })?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Expand; {} input rows expanded to {} taxa",
                rows.len(),
                entries.len()
            ),
            elapsed: Some(start.elapsed()),
        });

        let mut assemblies = AssemblyTable::default();
        let mut groups = Vec::new();
        for (group, taxids) in taxa::group_by_lineage(&entries) {
            sink.event(ProgressEvent {
                message: format!("phase=Download; group {group} with {} taxids", taxids.len()),
                elapsed: None,
            });
            let start = Instant::now();
            let table = self.downloader.download(group, &taxids)?;
            sink.event(ProgressEvent {
                message: format!("phase=Download; group {group} returned {} assemblies", table.len()),
                elapsed: Some(start.elapsed()),
            });
            groups.push(GroupSummary {
                group,
                taxids: taxids.len(),
                assemblies: table.len(),
            });
            assemblies.append(table);
        }
        write_atomic(&outputs.assembly_table, |writer| {
            assemblies.write_persisted(writer)
        })?;

        sink.event(ProgressEvent {
            message: format!("phase=Aggregate; folding {} genomes", assemblies.len()),
            elapsed: None,
        });
        let start = Instant::now();
        let (proteins, folded) = aggregate_to(&outputs.proteome_fasta, &assemblies)?;
        write_atomic(&outputs.protein_table, |writer| {
            aggregate::write_protein_table(writer, &proteins)
        })?;
        let removed = aggregate::remove_sources(&assemblies)?;
        tracing::debug!(removed, "removed downloaded genome files");
        sink.event(ProgressEvent {
            message: format!(
                "phase=Aggregate; {} proteins from {} genomes",
                folded.proteins, folded.genomes
            ),
            elapsed: Some(start.elapsed()),
        });

        Ok(RunSummary {
            input_rows: rows.len(),
            taxa: entries.len(),
            groups,
            assemblies: assemblies.len(),
            genomes: folded.genomes,
            proteins: folded.proteins,
            outputs: outputs.clone(),
        })
    }
}

fn aggregate_to(
    path: &Utf8Path,
    assemblies: &AssemblyTable,
) -> Result<(Vec<aggregate::ProteinRecord>, AggregateSummary), ProteomeError> {
    let mut temp = temp_beside(path)?;
    let result = {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let result = aggregate::aggregate_proteomes(assemblies, &mut writer)?;
        writer
            .flush()
            .map_err(|err| ProteomeError::Filesystem(err.to_string()))?;
        result
    };
    persist(temp, path)?;
    Ok(result)
}

fn write_atomic<F>(path: &Utf8Path, write: F) -> Result<(), ProteomeError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> std::io::Result<()>,
{
    let mut temp = temp_beside(path)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|err| ProteomeError::Filesystem(format!("write {path}: {err}")))?;
    }
    persist(temp, path)
}

fn temp_beside(path: &Utf8Path) -> Result<NamedTempFile, ProteomeError> {
    fs_util::ensure_parent(path.as_std_path())?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".fetch-proteome")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|err| ProteomeError::Filesystem(err.to_string()))
}

fn persist(temp: NamedTempFile, path: &Utf8Path) -> Result<(), ProteomeError> {
    temp.persist(path)
        .map(|_| ())
        .map_err(|err| ProteomeError::Filesystem(format!("persist {path}: {}", err.error)))
}
