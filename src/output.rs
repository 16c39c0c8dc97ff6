use std::io::{self, Write};

use serde::Serialize;

use crate::classify::LineageReport;
use crate::pipeline::RunSummary;
use crate::store::SnapshotMetadata;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(result: &RunSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_lineage(result: &LineageReport) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_snapshot(result: &SnapshotMetadata) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_summary(result: &RunSummary) {
        println!("taxa: {} (from {} input rows)", result.taxa, result.input_rows);
        for group in &result.groups {
            println!(
                "  {:<22} {:>6} taxids {:>6} assemblies",
                group.group.label(),
                group.taxids,
                group.assemblies
            );
        }
        println!("genomes: {}", result.genomes);
        println!("proteins: {}", result.proteins);
        println!("proteome: {}", result.outputs.proteome_fasta);
    }

    pub fn print_lineage(result: &LineageReport) {
        if result.resolved != result.taxid {
            println!("{} (merged into {})", result.taxid, result.resolved);
        }
        for step in &result.lineage {
            println!("{:>10}  {:<16} {}", step.taxid.value(), step.rank, step.name);
        }
        println!("group: {}", result.group);
    }

    pub fn print_snapshot(result: &SnapshotMetadata) {
        println!(
            "taxonomy snapshot: {} taxa, {} merged ids (built {} from {})",
            result.taxa, result.merged, result.built_at, result.source
        );
    }
}
