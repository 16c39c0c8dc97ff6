use std::io::{BufRead, Write};

use serde::Serialize;

use crate::assembly::{AssemblyRecord, AssemblyTable};
use crate::error::ProteomeError;
use crate::fasta::{self, FastaReader, FastaRecord};
use crate::fs_util;
use crate::tsv;

pub const PROTEIN_COLUMNS: [&str; 5] = [
    "protein_id",
    "protein_name",
    "genome_name",
    "genome_id",
    "length",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProteinRecord {
    pub protein_id: String,
    pub protein_name: String,
    pub genome_name: String,
    pub genome_id: String,
    pub length: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateSummary {
    pub genomes: usize,
    pub proteins: usize,
}

pub fn protein_name(description: &str) -> String {
    let head = description.split(" [").next().unwrap_or_default();
    head.split(' ').skip(1).collect::<Vec<_>>().join(" ")
}

pub fn tagged_id(protein_id: &str, genome: &AssemblyRecord) -> String {
    format!("{protein_id}--{}", genome.assembly_accession)
}

pub fn fold_genome<R: BufRead, W: Write>(
    genome: &AssemblyRecord,
    reader: R,
    fasta_out: &mut W,
    proteins: &mut Vec<ProteinRecord>,
) -> Result<usize, ProteomeError> {
    let fasta_err = |message: String| ProteomeError::Fasta {
        path: genome.local_filename.to_string(),
        message,
    };

    let mut count = 0;
    for record in FastaReader::new(reader) {
        let record = record.map_err(|err| fasta_err(err.to_string()))?;
        let renamed = FastaRecord {
            id: tagged_id(&record.id, genome),
            description: record.description,
            seq: record.seq,
        };
        proteins.push(ProteinRecord {
            protein_id: renamed.id.clone(),
            protein_name: protein_name(&renamed.description),
            genome_name: genome.organism_name.clone(),
            genome_id: genome.assembly_accession.to_string(),
            length: renamed.seq.len(),
        });
        fasta::write_record(fasta_out, &renamed).map_err(|err| fasta_err(err.to_string()))?;
        count += 1;
    }
    Ok(count)
}

pub fn aggregate_proteomes<W: Write>(
    assemblies: &AssemblyTable,
    fasta_out: &mut W,
) -> Result<(Vec<ProteinRecord>, AggregateSummary), ProteomeError> {
    let mut proteins = Vec::new();
    let mut summary = AggregateSummary::default();

    for genome in &assemblies.records {
        let reader = fasta::open_gz(genome.local_filename.as_std_path())?;
        let count = fold_genome(genome, reader, fasta_out, &mut proteins)?;
        tracing::debug!(genome = %genome.assembly_accession, proteins = count, "folded genome");
        summary.genomes += 1;
        summary.proteins += count;
    }

    Ok((proteins, summary))
}

// Only call once the folded output has been persisted.
pub fn remove_sources(assemblies: &AssemblyTable) -> Result<usize, ProteomeError> {
    let mut removed = 0;
    for genome in &assemblies.records {
        if fs_util::remove_if_exists(genome.local_filename.as_std_path())? {
            removed += 1;
        }
    }
    Ok(removed)
}

pub fn write_protein_table<W: Write>(
    writer: &mut W,
    proteins: &[ProteinRecord],
) -> std::io::Result<()> {
    tsv::write_row(writer, &PROTEIN_COLUMNS)?;
    for protein in proteins {
        tsv::write_row(
            writer,
            &[
                protein.protein_id.as_str(),
                protein.protein_name.as_str(),
                protein.genome_name.as_str(),
                protein.genome_id.as_str(),
                &protein.length.to_string(),
            ],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn genome(accession: &str, organism: &str) -> AssemblyRecord {
        AssemblyRecord {
            assembly_accession: accession.parse().unwrap(),
            organism_name: organism.to_string(),
            local_filename: Utf8PathBuf::from(format!("{accession}_protein.faa.gz")),
            values: Vec::new(),
        }
    }

    #[test]
    fn protein_name_strips_accession_and_organism() {
        assert_eq!(
            protein_name("WP_000001.1 DNA ligase [Escherichia coli]"),
            "DNA ligase"
        );
        assert_eq!(protein_name("WP_000002.1 hypothetical protein"), "hypothetical protein");
        assert_eq!(protein_name("WP_000003.1"), "");
        assert_eq!(
            protein_name("XP_1 subunit [alpha] chain [Homo sapiens]"),
            "subunit"
        );
    }

    #[test]
    fn fold_genome_tags_ids_and_records_rows() {
        let g1 = genome("GCF_000005845.2", "Escherichia coli");
        let input = ">WP_1 DNA ligase [Escherichia coli]\nMKVL\n>WP_2 helicase\nMA\nAT\n";
        let mut fasta_out = Vec::new();
        let mut proteins = Vec::new();

        let count = fold_genome(&g1, input.as_bytes(), &mut fasta_out, &mut proteins).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(fasta_out).unwrap(),
            ">WP_1--GCF_000005845.2 WP_1 DNA ligase [Escherichia coli]\nMKVL\n\
             >WP_2--GCF_000005845.2 WP_2 helicase\nMAAT\n"
        );
        assert_eq!(
            proteins[1],
            ProteinRecord {
                protein_id: "WP_2--GCF_000005845.2".to_string(),
                protein_name: "helicase".to_string(),
                genome_name: "Escherichia coli".to_string(),
                genome_id: "GCF_000005845.2".to_string(),
                length: 4,
            }
        );
        assert!(proteins.iter().all(|p| p.protein_id.ends_with("--GCF_000005845.2")));
    }

    #[test]
    fn protein_table_layout() {
        let proteins = [ProteinRecord {
            protein_id: "WP_1--GCF_000001.1".to_string(),
            protein_name: "DNA ligase".to_string(),
            genome_name: "E. coli".to_string(),
            genome_id: "GCF_000001.1".to_string(),
            length: 12,
        }];
        let mut out = Vec::new();
        write_protein_table(&mut out, &proteins).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "protein_id\tprotein_name\tgenome_name\tgenome_id\tlength\n\
             WP_1--GCF_000001.1\tDNA ligase\tE. coli\tGCF_000001.1\t12\n"
        );
    }
}
