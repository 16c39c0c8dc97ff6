use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::AssemblyAccession;
use crate::error::ProteomeError;
use crate::tsv;

pub const ACCESSION_COLUMN: &str = "assembly_accession";
pub const ORGANISM_COLUMN: &str = "organism_name";
pub const LOCAL_FILE_COLUMN: &str = "local_filename";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyRecord {
    pub assembly_accession: AssemblyAccession,
    pub organism_name: String,
    pub local_filename: Utf8PathBuf,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyTable {
    pub columns: Vec<String>,
    pub records: Vec<AssemblyRecord>,
}

impl AssemblyTable {
    pub fn read(path: &Utf8Path) -> Result<Self, ProteomeError> {
        let file = File::open(path).map_err(|err| {
            ProteomeError::AssemblyTable(format!("open {path}: {err}"))
        })?;
        Self::parse(BufReader::new(file))
    }

    pub fn parse<R: BufRead>(reader: R) -> Result<Self, ProteomeError> {
        let table = tsv::read_table(reader)?;
        if table.columns.is_empty() {
            return Ok(Self::default());
        }
        let column = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| ProteomeError::AssemblyTable(format!("missing {name} column")))
        };
        let accession_idx = column(ACCESSION_COLUMN)?;
        let organism_idx = column(ORGANISM_COLUMN)?;
        let local_idx = column(LOCAL_FILE_COLUMN)?;

        let records = table
            .rows
            .iter()
            .map(|row| {
                Ok(AssemblyRecord {
                    assembly_accession: row[accession_idx].parse()?,
                    organism_name: row[organism_idx].clone(),
                    local_filename: Utf8PathBuf::from(&row[local_idx]),
                    values: row[..table.columns.len()].to_vec(),
                })
            })
            .collect::<Result<Vec<_>, ProteomeError>>()?;

        Ok(Self {
            columns: table.columns.clone(),
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn append(&mut self, other: AssemblyTable) {
        if other.columns.is_empty() {
            return;
        }
        if self.columns.is_empty() {
            *self = other;
            return;
        }
        if self.columns == other.columns {
            self.records.extend(other.records);
            return;
        }
        for mut record in other.records {
            record.values = self
                .columns
                .iter()
                .map(|name| {
                    other
                        .columns
                        .iter()
                        .position(|column| column == name)
                        .map(|idx| record.values[idx].clone())
                        .unwrap_or_default()
                })
                .collect();
            self.records.push(record);
        }
    }

    pub fn write_persisted<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }
        let keep = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.as_str() != LOCAL_FILE_COLUMN)
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        let header = keep.iter().map(|idx| self.columns[*idx].as_str()).collect::<Vec<_>>();
        tsv::write_row(writer, &header)?;
        for record in &self.records {
            let row = keep
                .iter()
                .map(|idx| record.values[*idx].as_str())
                .collect::<Vec<_>>();
            tsv::write_row(writer, &row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const HEADER: &str = "assembly_accession\ttaxid\torganism_name\tlocal_filename\n";

    #[test]
    fn parse_records() {
        let input = format!(
            "{HEADER}GCF_000005845.2\t511145\tEscherichia coli str. K-12\tdb/GCF_000005845.2_protein.faa.gz\n"
        );
        let table = AssemblyTable::parse(input.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        let record = &table.records[0];
        assert_eq!(record.assembly_accession.as_str(), "GCF_000005845.2");
        assert_eq!(record.organism_name, "Escherichia coli str. K-12");
        assert_eq!(
            record.local_filename,
            Utf8PathBuf::from("db/GCF_000005845.2_protein.faa.gz")
        );
    }

    #[test]
    fn empty_file_is_an_empty_table() {
        let table = AssemblyTable::parse("".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn missing_bookkeeping_column_is_rejected() {
        let err = AssemblyTable::parse("assembly_accession\torganism_name\n".as_bytes())
            .unwrap_err();
        assert_matches!(err, ProteomeError::AssemblyTable(_));
    }

    #[test]
    fn persisted_table_drops_local_filename() {
        let input = format!("{HEADER}GCF_000001.1\t1\tA\ta.faa.gz\nGCA_000002.1\t2\tB\tb.faa.gz\n");
        let table = AssemblyTable::parse(input.as_bytes()).unwrap();
        let mut out = Vec::new();
        table.write_persisted(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "assembly_accession\ttaxid\torganism_name\nGCF_000001.1\t1\tA\nGCA_000002.1\t2\tB\n"
        );
    }

    #[test]
    fn append_realigns_columns_by_name() {
        let mut table = AssemblyTable::default();
        table.append(AssemblyTable::parse(
            format!("{HEADER}GCF_000001.1\t1\tA\ta.faa.gz\n").as_bytes(),
        )
        .unwrap());
        table.append(AssemblyTable::default());
        table.append(
            AssemblyTable::parse(
                "organism_name\tlocal_filename\tassembly_accession\nB\tb.faa.gz\tGCF_000002.1\n"
                    .as_bytes(),
            )
            .unwrap(),
        );
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records[1].values,
            vec!["GCF_000002.1", "", "B", "b.faa.gz"]
        );
    }
}
